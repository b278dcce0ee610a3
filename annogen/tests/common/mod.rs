#![allow(dead_code)]

use std::fs;
use std::path::Path;

use annogen::{Config, GeneratedArtifact, GeneratorKind, Runner};

/// A package directory holding the given `(file name, source)` pairs.
pub fn package(files: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("create temp dir");
    for (name, source) in files {
        fs::write(dir.path().join(name), source).expect("write source");
    }
    dir
}

/// Run one bundled generator and return its only artifact.
pub fn generate(kind: GeneratorKind, dir: &Path) -> annogen::Result<Option<GeneratedArtifact>> {
    let mut artifacts = Runner::new(Config::default()).with_kind(kind).run(dir)?;
    assert!(artifacts.len() <= 1, "one generator produces at most one artifact");
    Ok(artifacts.pop())
}

/// The text of the artifact `kind` produces for `dir`, failing the test when
/// there is none.
pub fn generated_text(kind: GeneratorKind, dir: &Path) -> String {
    match generate(kind, dir) {
        Ok(Some(artifact)) => artifact.text,
        Ok(None) => panic!("{kind} generator produced nothing"),
        Err(err) => panic!("{kind} generator failed: {err}"),
    }
}

/// `text` without whitespace or trailing commas, so assertions do not depend
/// on where the pretty printer breaks lines.
pub fn compact(text: &str) -> String {
    text.split_whitespace().collect::<String>().replace(",)", ")").replace(",}", "}").replace(",]", "]")
}
