//! Renders validated specs into unformatted Rust source.
//!
//! Templates only iterate and test flags; every name, literal and call path
//! they print was computed by a builder or the dependency resolver.

use minijinja::{AutoEscape, Environment, UndefinedBehavior, context};
use serde::Serialize;

use crate::dependency::{Dependency, RuntimeAliases};
use crate::error::RenderError;

/// First line of every generated file.
pub const GENERATED_MARKER: &str = "//! Code generated by annogen";

/// A bundled template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    pub name: &'static str,
    pub source: &'static str,
}

pub const DATASTORE: Template = Template {
    name: "datastore.rs.j2",
    source: include_str!("templates/datastore.rs.j2"),
};

pub const APIS: Template = Template {
    name: "apis.rs.j2",
    source: include_str!("templates/apis.rs.j2"),
};

pub const ENUMS: Template = Template {
    name: "enums.rs.j2",
    source: include_str!("templates/enums.rs.j2"),
};

/// Header line naming the generator that produced a file.
pub fn header(generator: &str) -> String {
    format!("{GENERATED_MARKER} ({generator}). DO NOT EDIT.")
}

/// Render `specs` with a fresh environment. The output depends only on the
/// arguments.
pub fn render<S: Serialize>(
    template: Template,
    generator: &str,
    specs: &[S],
    deps: &Dependency,
    runtime: &RuntimeAliases,
) -> Result<String, RenderError> {
    let wrap = |source: minijinja::Error| RenderError {
        template: template.name.to_string(),
        source,
    };

    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env.add_template(template.name, template.source).map_err(wrap)?;

    let rendered = env
        .get_template(template.name)
        .and_then(|tmpl| {
            tmpl.render(context! {
                header => header(generator),
                imports => deps.render(),
                rt => runtime,
                specs => specs,
            })
        })
        .map_err(wrap)?;
    Ok(rendered)
}
