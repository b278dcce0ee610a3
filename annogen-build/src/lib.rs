//! Build-time driver for annogen.
//!
//! Runs the generators over source directories from `build.rs` and writes
//! each artifact next to the sources it was generated from.
//!
//! # Example
//!
//! In your `build.rs`:
//!
//! ```ignore
//! fn main() {
//!     annogen_build::generate()
//!         .scan_path("src/models")
//!         .scan_path("src/handlers")
//!         .run()
//!         .expect("Failed to generate annogen artifacts");
//!
//!     println!("cargo:rerun-if-changed=src/");
//! }
//! ```

mod generator;

pub use annogen::GeneratorKind;
pub use generator::BuildGenerator;

/// Create a new generator with default settings.
pub fn generate() -> BuildGenerator {
    BuildGenerator::new()
}
