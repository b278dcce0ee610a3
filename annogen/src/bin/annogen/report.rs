use std::path::Path;

use colored::Colorize;

use annogen::error::{Error, FormatError};
use annogen::GeneratorKind;

pub fn written(kind: GeneratorKind, path: &Path, changed: bool) {
    let status = if changed {
        "✓ generated".green().bold()
    } else {
        "• unchanged".bright_black()
    };
    println!("{status} {} ({kind})", path.display());
}

pub fn nothing_to_do(dir: &Path) {
    println!("{} {}: no annotated declarations", "•".bright_black(), dir.display());
}

pub fn failure(err: &anyhow::Error, verbose: bool) {
    eprintln!("{} {err}", "error:".red().bold());

    match err.chain().find_map(|cause| cause.downcast_ref::<Error>()) {
        Some(Error::Invalid(errors)) => {
            for error in errors.iter() {
                eprintln!("  {} {error}", "✗".red());
            }
        }
        Some(Error::Format(format)) => print_generated(format, verbose),
        _ => {
            for cause in err.chain().skip(1) {
                eprintln!("  {} {cause}", "caused by:".yellow());
            }
        }
    }
}

fn print_generated(err: &FormatError, verbose: bool) {
    eprintln!("  {} {err}", "✗".red());
    if verbose {
        eprintln!();
        eprint!("{}", err.source_with_lines(false));
    } else {
        eprintln!("  {}", "rerun with --verbose to see the generated code".bright_black());
    }
}
