mod report;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use annogen::spec::EntityBuilder;
use annogen::{Config, GeneratorKind, Pipeline, Runner, emit};

#[derive(Parser)]
#[command(name = "annogen")]
#[command(version)]
#[command(
    about = "Generate datastore, HTTP API and enum code from annotated Rust sources",
    long_about = r#"Generate boilerplate next to annotated Rust sources.

Commands:
  datastore  CRUD, cache and query helpers for a @datastore struct
  api        Route registration and handlers for @api functions
  enum       String conversions for @enum integer newtypes
  all        Every generator over the same directories
"#
)]
#[command(subcommand_required = true, arg_required_else_help = true)]
struct Cli {
    /// Configuration file (default: nearest annogen.toml above each directory)
    #[arg(long, global = true, env = "ANNOGEN_CONFIG")]
    config: Option<PathBuf>,

    /// Print generated code instead of writing it
    #[arg(long, global = true)]
    dry_run: bool,

    /// Show the offending generated code when it fails to parse
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Only report errors
    #[arg(short = 'q', long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate datastore helpers for one @datastore type
    Datastore {
        /// Type carrying the @datastore directive
        #[arg(long = "type")]
        type_name: String,

        /// Kind name stored in the datastore (default: the type name)
        #[arg(long)]
        kind: Option<String>,

        #[command(flatten)]
        dirs: Dirs,
    },

    /// Generate route registration for every @api function
    Api {
        #[command(flatten)]
        dirs: Dirs,
    },

    /// Generate string conversions for one @enum type
    Enum {
        /// Type carrying the @enum directive
        #[arg(long = "type")]
        type_name: String,

        #[command(flatten)]
        dirs: Dirs,
    },

    /// Run every generator
    All {
        #[command(flatten)]
        dirs: Dirs,
    },
}

#[derive(Args)]
struct Dirs {
    /// Package directories to scan
    #[arg(default_value = ".")]
    dirs: Vec<PathBuf>,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if cli.no_color {
        colored::control::set_override(false);
    }

    if let Err(err) = execute(&cli) {
        report::failure(&err, cli.verbose);
        std::process::exit(1);
    }
}

fn execute(cli: &Cli) -> Result<()> {
    let dirs = match &cli.command {
        Commands::Datastore { dirs, .. } | Commands::Api { dirs } | Commands::Enum { dirs, .. } | Commands::All { dirs } => {
            &dirs.dirs
        }
    };

    for dir in dirs {
        let config = match &cli.config {
            Some(path) => Config::load(path)?,
            None => Config::discover(dir)?,
        };
        let runner = runner_for(&cli.command, config);

        let artifacts = runner
            .run(dir)
            .with_context(|| format!("generation failed in {}", dir.display()))?;

        if artifacts.is_empty() {
            if !cli.quiet {
                report::nothing_to_do(dir);
            }
            continue;
        }

        if cli.dry_run {
            for artifact in &artifacts {
                println!("// {}", dir.join(&artifact.filename).display());
                print!("{}", artifact.text);
            }
            continue;
        }

        let written = emit::write_artifacts(dir, &artifacts)?;
        if !cli.quiet {
            for (artifact, emitted) in artifacts.iter().zip(&written) {
                report::written(artifact.kind, &emitted.path, emitted.changed);
            }
        }
    }
    Ok(())
}

fn runner_for(command: &Commands, config: Config) -> Runner {
    let runner = Runner::new(config);
    match command {
        Commands::Datastore { type_name, kind, .. } => {
            let builder = match kind {
                Some(kind) => EntityBuilder::new().with_kind(kind.clone()),
                None => EntityBuilder::new(),
            };
            let pipeline = Pipeline::datastore_with(builder, runner.config()).only_type(type_name.clone());
            runner.with(pipeline)
        }
        Commands::Api { .. } => runner.with_kind(GeneratorKind::Api),
        Commands::Enum { type_name, .. } => {
            let pipeline = Pipeline::enums(runner.config()).only_type(type_name.clone());
            runner.with(pipeline)
        }
        Commands::All { .. } => runner.with_all(),
    }
}
