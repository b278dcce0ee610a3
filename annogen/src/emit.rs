//! Writes generated artifacts next to the sources they were generated from.

use std::fs;
use std::path::{Path, PathBuf};

use crate::driver::GeneratedArtifact;
use crate::error::EmitError;

/// Outcome of writing one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emitted {
    pub path: PathBuf,
    /// False when the file already held the same text and was left alone.
    pub changed: bool,
}

/// Write every artifact into `dir`, skipping files whose content is unchanged
/// so that build tools do not see a spurious modification.
pub fn write_artifacts(dir: &Path, artifacts: &[GeneratedArtifact]) -> Result<Vec<Emitted>, EmitError> {
    artifacts
        .iter()
        .map(|artifact| write_if_changed(&dir.join(&artifact.filename), &artifact.text))
        .collect()
}

fn write_if_changed(path: &Path, text: &str) -> Result<Emitted, EmitError> {
    let changed = match fs::read_to_string(path) {
        Ok(existing) => existing != text,
        Err(_) => true,
    };
    if changed {
        fs::write(path, text).map_err(|source| EmitError {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("wrote {}", path.display());
    }
    Ok(Emitted {
        path: path.to_path_buf(),
        changed,
    })
}
