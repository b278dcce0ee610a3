//! Build-script driver for the annogen generators.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use annogen::{Config, GeneratorKind, Runner, emit};

/// Builder for configuring and running the generators from `build.rs`.
pub struct BuildGenerator {
    scan_paths: Vec<PathBuf>,
    kinds: Vec<GeneratorKind>,
    config_file: Option<PathBuf>,
    recursive: bool,
}

impl BuildGenerator {
    /// Create a new generator with default settings.
    pub fn new() -> Self {
        Self {
            scan_paths: Vec::new(),
            kinds: Vec::new(),
            config_file: None,
            recursive: false,
        }
    }

    /// Add a package directory to generate into.
    ///
    /// Can be called multiple times.
    pub fn scan_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.scan_paths.push(path.into());
        self
    }

    /// Restrict the run to one generator. Can be called multiple times.
    ///
    /// Default: every generator.
    pub fn generator(mut self, kind: GeneratorKind) -> Self {
        if !self.kinds.contains(&kind) {
            self.kinds.push(kind);
        }
        self
    }

    /// Use an explicit configuration file.
    ///
    /// Default: the nearest `annogen.toml` above each scanned directory.
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Also generate into every subdirectory of the scan paths.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Run the generators.
    ///
    /// Files are only rewritten when their content changes, so an unchanged
    /// run does not trigger recompilation.
    pub fn run(self) -> Result<()> {
        let scan_paths = if self.scan_paths.is_empty() {
            vec![PathBuf::from("src/")]
        } else {
            self.scan_paths.clone()
        };

        let mut dirs = Vec::new();
        for path in &scan_paths {
            if self.recursive {
                dirs.extend(package_dirs(path).with_context(|| format!("Failed to scan {}", path.display()))?);
            } else {
                dirs.push(path.clone());
            }
        }

        for dir in &dirs {
            self.generate_into(dir)?;
        }
        Ok(())
    }

    fn generate_into(&self, dir: &Path) -> Result<()> {
        let config = match &self.config_file {
            Some(path) => Config::load(path)?,
            None => Config::discover(dir)?,
        };

        let mut runner = Runner::new(config);
        if self.kinds.is_empty() {
            runner = runner.with_all();
        } else {
            for kind in &self.kinds {
                runner = runner.with_kind(*kind);
            }
        }

        let artifacts = runner
            .run(dir)
            .with_context(|| format!("Failed to generate code for {}", dir.display()))?;
        let written = emit::write_artifacts(dir, &artifacts)?;

        for emitted in written.iter().filter(|emitted| emitted.changed) {
            eprintln!("annogen-build: Generated {}", emitted.path.display());
        }
        Ok(())
    }
}

impl Default for BuildGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// `root` and every non-hidden directory below it that holds Rust sources.
fn package_dirs(root: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()));

    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_dir() && has_rust_sources(entry.path())? {
            dirs.push(entry.into_path());
        }
    }
    Ok(dirs)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|name| name.starts_with('.') || name == "target")
}

fn has_rust_sources(dir: &Path) -> Result<bool> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "rs") {
            return Ok(true);
        }
    }
    Ok(false)
}
