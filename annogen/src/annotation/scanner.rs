use syn::{Attribute, Expr, ExprLit, Lit, Meta};

use super::{Params, Symbol};
use crate::error::{AnnotationSyntaxError, SpecError};
use crate::package::{Package, SourceDeclaration};

/// One parsed directive occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationDirective {
    pub symbol: Symbol,
    pub params: Params,
}

/// A declaration carrying a directive for the symbol being scanned.
#[derive(Debug, Clone)]
pub struct AnnotatedNode<'a> {
    pub declaration: &'a SourceDeclaration,
    pub directive: AnnotationDirective,
}

/// Find every declaration of `package` annotated with `symbol`.
///
/// Malformed directives become per-declaration errors; the other
/// declarations are still returned.
pub fn scan<'a>(package: &'a Package, symbol: &Symbol) -> Vec<Result<AnnotatedNode<'a>, SpecError>> {
    let marker = symbol.marker();
    let mut found = Vec::new();

    for declaration in package.declarations() {
        let occurrences: Vec<String> = doc_lines(declaration.attrs())
            .into_iter()
            .filter_map(|line| directive_arguments(&line, &marker).map(str::to_string))
            .collect();

        let result = match occurrences.as_slice() {
            [] => continue,
            [arguments] => Params::parse(arguments).map(|params| AnnotatedNode {
                declaration,
                directive: AnnotationDirective {
                    symbol: symbol.clone(),
                    params,
                },
            }),
            _ => Err(AnnotationSyntaxError::DuplicateDirective {
                symbol: symbol.to_string(),
            }),
        };

        log::debug!("found {marker} on `{}` in {}", declaration.name, declaration.file.display());
        found.push(result.map_err(|err| SpecError::new(declaration, err.into())));
    }

    found
}

/// Text following `marker` when `line` is a directive line for it.
fn directive_arguments<'l>(line: &'l str, marker: &str) -> Option<&'l str> {
    let rest = line.strip_prefix(marker)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

/// Trimmed doc comment lines of an item or field, in order.
pub fn doc_lines(attrs: &[Attribute]) -> Vec<String> {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            Meta::NameValue(meta) => match &meta.value {
                Expr::Lit(ExprLit { lit: Lit::Str(text), .. }) => Some(text.value()),
                _ => None,
            },
            _ => None,
        })
        .flat_map(|text| text.lines().map(|line| line.trim().to_string()).collect::<Vec<_>>())
        .collect()
}
