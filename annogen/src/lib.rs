//! Annotation-driven code generation.
//!
//! Declarations in a source directory are marked with doc comment directives
//! (`@datastore`, `@api`, `@enum`). A run loads the directory, validates every
//! annotated declaration into a spec, renders the specs through a template and
//! checks that the result parses as Rust before it is written next to the
//! sources.
//!
//! ```ignore
//! let runner = annogen::Runner::new(annogen::Config::default()).with_all();
//! let artifacts = runner.run(Path::new("src/models"))?;
//! annogen::emit::write_artifacts(Path::new("src/models"), &artifacts)?;
//! ```

pub mod annotation;
pub mod config;
pub mod dependency;
pub mod driver;
pub mod emit;
pub mod error;
pub mod format;
pub mod package;
pub mod render;
pub mod spec;

pub use config::Config;
pub use driver::{GeneratedArtifact, Generator, GeneratorKind, Pipeline, Runner};
pub use error::{Error, MultiError, Result, SpecError, SpecErrorKind};
pub use package::{Package, load};
