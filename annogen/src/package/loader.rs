//! Reads a package directory into a [`Package`].

use std::fs;
use std::path::{Path, PathBuf};

use syn::spanned::Spanned;
use walkdir::WalkDir;

use super::{DeclarationKind, Package, SourceDeclaration};
use crate::annotation::Symbol;
use crate::error::LoadError;
use crate::render::GENERATED_MARKER;

/// Module path of the package root as seen from a generated child module.
pub(super) const ROOT_MODULE: &str = "super";

/// Parse every `.rs` file directly inside `dir`.
///
/// Any unreadable or unparsable file aborts the load.
pub fn load(dir: &Path) -> Result<Package, LoadError> {
    let files = rust_files(dir)?;
    if files.is_empty() {
        return Err(LoadError::NoSources(dir.to_path_buf()));
    }

    let mut declarations = Vec::new();
    for path in files {
        let content = read(&path)?;
        if content.starts_with(GENERATED_MARKER) {
            log::debug!("skipping generated file {}", path.display());
            continue;
        }

        let syntax = syn::parse_file(&content).map_err(|err| {
            let start = err.span().start();
            LoadError::Parse {
                path: path.clone(),
                line: start.line,
                column: start.column + 1,
                message: err.to_string(),
            }
        })?;

        let module_path = module_path_for(&path);
        let before = declarations.len();
        declarations.extend(
            syntax
                .items
                .into_iter()
                .filter_map(|item| declaration_of(item, &path, &module_path)),
        );
        log::debug!(
            "loaded {} declarations from {} ({module_path})",
            declarations.len() - before,
            path.display()
        );
    }

    Ok(Package::new(dir, declarations))
}

/// Cheap textual check: does any file mention one of the directive markers?
///
/// Used to skip parsing directories that cannot produce output.
pub fn may_be_marked_in(dir: &Path, symbols: &[&Symbol]) -> Result<bool, LoadError> {
    for path in rust_files(dir)? {
        let content = read(&path)?;
        if content.starts_with(GENERATED_MARKER) {
            continue;
        }
        if symbols.iter().any(|symbol| content.contains(&symbol.marker())) {
            return Ok(true);
        }
    }
    Ok(false)
}

fn read(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// `.rs` files directly inside `dir`, sorted by file name.
fn rust_files(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|err| LoadError::Io {
            path: dir.to_path_buf(),
            source: err.into(),
        })?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "rs") {
            continue;
        }
        if path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().starts_with('.'))
        {
            log::warn!("ignoring hidden file {}", path.display());
            continue;
        }
        files.push(path.to_path_buf());
    }
    Ok(files)
}

/// `lib.rs`, `main.rs` and `mod.rs` are the package root; other files are
/// child modules named after their stem.
fn module_path_for(path: &Path) -> String {
    match path.file_stem().and_then(|stem| stem.to_str()) {
        Some("lib" | "main" | "mod") | None => ROOT_MODULE.to_string(),
        Some(stem) => format!("{ROOT_MODULE}::{stem}"),
    }
}

pub(super) fn declaration_of(item: syn::Item, file: &Path, module_path: &str) -> Option<SourceDeclaration> {
    let (name, kind) = match &item {
        syn::Item::Struct(item) => (item.ident.to_string(), DeclarationKind::Struct),
        syn::Item::Enum(item) => (item.ident.to_string(), DeclarationKind::Enum),
        syn::Item::Fn(item) => (item.sig.ident.to_string(), DeclarationKind::Function),
        syn::Item::Type(item) => (item.ident.to_string(), DeclarationKind::TypeAlias),
        syn::Item::Const(item) => (item.ident.to_string(), DeclarationKind::Const),
        _ => return None,
    };
    let line = item.span().start().line;
    Some(SourceDeclaration {
        name,
        kind,
        item,
        file: file.to_path_buf(),
        module_path: module_path.to_string(),
        line,
    })
}
