//! Validated models built from annotated declarations.

pub mod entity;
pub mod enumeration;
pub mod path;
pub mod route;
pub mod values;

use std::collections::HashMap;

use serde::Serialize;

use crate::annotation::{AnnotatedNode, Params};
use crate::dependency::{Dependency, RuntimeAliases};
use crate::error::{DependencyError, MultiError, SpecError, SpecErrorKind};
use crate::package::{Package, SemanticType};
use values::{DefaultError, DefaultValue};

pub use entity::{EntityBuilder, EntitySpec};
pub use enumeration::{EnumBuilder, EnumSpec};
pub use path::PathPattern;
pub use route::{RouteBuilder, RouteSpec};

/// Turns one annotated declaration into a spec of a generator.
///
/// Builders stop at the first problem of a declaration; [`build_all`]
/// collects those problems across declarations.
pub trait SpecBuilder {
    type Spec: Serialize;

    fn build(&self, package: &Package, node: &AnnotatedNode<'_>) -> Result<Self::Spec, SpecErrorKind>;

    /// Stable ordering key of a spec within an artifact.
    fn sort_key(spec: &Self::Spec) -> (String, String);

    /// Names the spec claims in the generated file. Two specs claiming the
    /// same one would not compile together.
    fn claims(_spec: &Self::Spec) -> Vec<String> {
        Vec::new()
    }

    /// Bind every path the spec references to an import alias.
    fn resolve_dependencies(
        &self,
        spec: &mut Self::Spec,
        deps: &mut Dependency,
        runtime: &RuntimeAliases,
    ) -> Result<(), DependencyError>;
}

/// Build every node, returning the sorted specs or one error per failing
/// declaration. A declaration whose claims collide with an earlier one fails.
pub fn build_all<B: SpecBuilder>(
    builder: &B,
    package: &Package,
    nodes: Vec<Result<AnnotatedNode<'_>, SpecError>>,
) -> Result<Vec<B::Spec>, MultiError> {
    let mut specs = Vec::new();
    let mut errors = Vec::new();
    let mut claimed: HashMap<String, String> = HashMap::new();

    for node in nodes {
        let node = match node {
            Ok(node) => node,
            Err(err) => {
                errors.push(err);
                continue;
            }
        };
        let spec = match builder.build(package, &node) {
            Ok(spec) => spec,
            Err(kind) => {
                errors.push(SpecError::new(node.declaration, kind));
                continue;
            }
        };

        let claims = B::claims(&spec);
        if let Some((what, first)) = claims
            .iter()
            .find_map(|claim| claimed.get(claim).map(|first| (claim.clone(), first.clone())))
        {
            errors.push(SpecError::new(node.declaration, SpecErrorKind::Conflict { what, first }));
            continue;
        }
        for claim in claims {
            claimed.insert(claim, node.declaration.name.clone());
        }
        specs.push(spec);
    }

    if !errors.is_empty() {
        return Err(MultiError::new(errors));
    }
    specs.sort_by_cached_key(|spec| B::sort_key(spec));
    Ok(specs)
}

/// Reject directive parameters outside `allowed`.
pub(crate) fn check_params(params: &Params, allowed: &[&str]) -> Result<(), SpecErrorKind> {
    for (key, _) in params.iter() {
        if !allowed.contains(&key) {
            return Err(SpecErrorKind::UnknownParameter(key.to_string()));
        }
    }
    Ok(())
}

/// Value of a parameter that must not be a bare flag when present.
pub(crate) fn param_value<'p>(params: &'p Params, key: &str) -> Result<Option<&'p str>, SpecErrorKind> {
    match params.get(key) {
        Some(value) if !value.trim().is_empty() => Ok(Some(value.trim())),
        _ if params.contains(key) => Err(SpecErrorKind::MissingValue(key.to_string())),
        _ => Ok(None),
    }
}

/// Type-check a `default:"..."` tag of `field`.
pub(crate) fn typed_default(field: &str, semantic: &SemanticType, raw: &str) -> Result<DefaultValue, SpecErrorKind> {
    DefaultValue::parse(semantic, raw).map_err(|err| match err {
        DefaultError::Unsupported => SpecErrorKind::UnsupportedDefault {
            field: field.to_string(),
            category: semantic.to_string(),
        },
        DefaultError::Invalid(reason) => SpecErrorKind::InvalidDefault {
            field: field.to_string(),
            value: raw.to_string(),
            category: semantic.to_string(),
            reason,
        },
    })
}

/// Rust string literal for `text`.
pub(crate) fn string_literal(text: &str) -> String {
    proc_macro2::Literal::string(text).to_string()
}

/// A form parser chosen for a field: a runtime function or a user function
/// named by a `parser:"path::to::func"` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ParserRef {
    Runtime(&'static str),
    Custom { module: String, function: String },
}

impl ParserRef {
    /// Parse a `parser` tag. A bare function name refers to the package root.
    pub(crate) fn custom(path: &str) -> Option<Self> {
        let parsed: syn::Path = syn::parse_str(path).ok()?;
        let segments: Vec<String> = parsed.segments.iter().map(|segment| segment.ident.to_string()).collect();
        let (function, module) = segments.split_last()?;
        let module = if module.is_empty() {
            "super".to_string()
        } else {
            module.join("::")
        };
        Some(ParserRef::Custom {
            module,
            function: function.clone(),
        })
    }

    pub(crate) fn resolve(&self, deps: &mut Dependency, runtime: &RuntimeAliases) -> Result<String, DependencyError> {
        match self {
            ParserRef::Runtime(name) => Ok(runtime.item(crate::dependency::Role::Form, name)),
            ParserRef::Custom { module, function } => Ok(format!("{}::{function}", deps.add(module)?)),
        }
    }
}
