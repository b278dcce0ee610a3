//! Runs generators over a package directory.

mod pipeline;

use std::fmt;
use std::path::Path;

use crate::annotation::Symbol;
use crate::config::Config;
use crate::error::{Error, MultiError, Result};
use crate::package::{self, Package};

pub use pipeline::Pipeline;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GeneratorKind {
    Datastore,
    Api,
    Enum,
}

impl GeneratorKind {
    pub const ALL: [GeneratorKind; 3] = [GeneratorKind::Datastore, GeneratorKind::Api, GeneratorKind::Enum];

    pub fn name(self) -> &'static str {
        match self {
            GeneratorKind::Datastore => "datastore",
            GeneratorKind::Api => "api",
            GeneratorKind::Enum => "enum",
        }
    }

    /// Generator with default settings for this kind.
    pub fn pipeline(self, config: &Config) -> Box<dyn Generator> {
        match self {
            GeneratorKind::Datastore => Box::new(Pipeline::datastore(config)),
            GeneratorKind::Api => Box::new(Pipeline::api(config)),
            GeneratorKind::Enum => Box::new(Pipeline::enums(config)),
        }
    }
}

impl fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One generated file, named relative to the scanned directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifact {
    pub kind: GeneratorKind,
    pub filename: String,
    pub text: String,
}

pub trait Generator {
    fn kind(&self) -> GeneratorKind;

    /// Directive symbol this generator reacts to.
    fn symbol(&self) -> &Symbol;

    fn filename(&self) -> &str;

    /// The single declaration this generator is restricted to, if any.
    fn type_filter(&self) -> Option<&str> {
        None
    }

    /// Produce the artifact for `package`, or `None` when nothing in it is
    /// annotated for this generator.
    fn generate(&self, package: &Package) -> Result<Option<GeneratedArtifact>>;
}

/// The generators of one run, applied to each directory it is given.
pub struct Runner {
    config: Config,
    generators: Vec<Box<dyn Generator>>,
}

impl Runner {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            generators: Vec::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Register a generator built by the caller.
    pub fn with(mut self, generator: impl Generator + 'static) -> Self {
        self.generators.push(Box::new(generator));
        self
    }

    /// Register the default generator of `kind`.
    pub fn with_kind(mut self, kind: GeneratorKind) -> Self {
        let generator = kind.pipeline(&self.config);
        self.generators.push(generator);
        self
    }

    /// Register every bundled generator.
    pub fn with_all(self) -> Self {
        GeneratorKind::ALL.into_iter().fold(self, Runner::with_kind)
    }

    pub fn generators(&self) -> impl Iterator<Item = &dyn Generator> {
        self.generators.iter().map(|generator| generator.as_ref())
    }

    /// Load `dir` once and run every generator over it.
    ///
    /// Validation errors of all generators are reported together, in
    /// generator order. Any other failure stops the run.
    pub fn run(&self, dir: &Path) -> Result<Vec<GeneratedArtifact>> {
        let symbols: Vec<&Symbol> = self.generators.iter().map(|generator| generator.symbol()).collect();
        if !package::may_be_marked_in(dir, &symbols)? {
            if let Some((generator, name)) = self
                .generators
                .iter()
                .find_map(|generator| generator.type_filter().map(|name| (generator, name)))
            {
                return Err(Error::TypeNotFound {
                    symbol: generator.symbol().to_string(),
                    name: name.to_string(),
                });
            }
            log::info!("{}: no directives, skipping", dir.display());
            return Ok(Vec::new());
        }

        let package = package::load(dir)?;
        let mut artifacts = Vec::new();
        let mut invalid = Vec::new();
        for generator in &self.generators {
            log::debug!("running {} generator on {}", generator.kind(), dir.display());
            match generator.generate(&package) {
                Ok(Some(artifact)) => artifacts.push(artifact),
                Ok(None) => {}
                Err(Error::Invalid(errors)) => {
                    log::debug!("{} generator rejected {} declaration(s)", generator.kind(), errors.len());
                    invalid.extend(errors);
                }
                Err(err) => return Err(err),
            }
        }

        if !invalid.is_empty() {
            return Err(Error::Invalid(MultiError::new(invalid)));
        }
        Ok(artifacts)
    }
}
