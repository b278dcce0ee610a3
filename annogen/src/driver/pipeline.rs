use crate::annotation::{Symbol, scan};
use crate::config::Config;
use crate::dependency::{Dependency, Role, RuntimeAliases};
use crate::error::{Error, Result};
use crate::format::format_source;
use crate::package::Package;
use crate::render::{self, Template};
use crate::spec::{EntityBuilder, EnumBuilder, RouteBuilder, SpecBuilder, build_all, entity, enumeration, route};

use super::{GeneratedArtifact, Generator, GeneratorKind};

/// Scan, build, resolve, render and verify for one builder.
pub struct Pipeline<B> {
    kind: GeneratorKind,
    symbol: Symbol,
    builder: B,
    template: Template,
    roles: &'static [Role],
    config: Config,
    filename: String,
    only_type: Option<String>,
}

impl<B: SpecBuilder> Pipeline<B> {
    /// Restrict generation to the declaration named `name`.
    pub fn only_type(mut self, name: impl Into<String>) -> Self {
        self.only_type = Some(name.into());
        self
    }
}

impl Pipeline<EntityBuilder> {
    pub fn datastore(config: &Config) -> Self {
        Self::datastore_with(EntityBuilder::new(), config)
    }

    pub fn datastore_with(builder: EntityBuilder, config: &Config) -> Self {
        Pipeline {
            kind: GeneratorKind::Datastore,
            symbol: Symbol::builtin(entity::SYMBOL),
            builder,
            template: render::DATASTORE,
            roles: &[Role::Datastore, Role::Cache, Role::Search, Role::Form],
            config: config.clone(),
            filename: config.output.datastore.clone(),
            only_type: None,
        }
    }
}

impl Pipeline<RouteBuilder> {
    pub fn api(config: &Config) -> Self {
        Pipeline {
            kind: GeneratorKind::Api,
            symbol: Symbol::builtin(route::SYMBOL),
            builder: RouteBuilder::new(),
            template: render::APIS,
            roles: &[Role::Web],
            config: config.clone(),
            filename: config.output.apis.clone(),
            only_type: None,
        }
    }
}

impl Pipeline<EnumBuilder> {
    pub fn enums(config: &Config) -> Self {
        Pipeline {
            kind: GeneratorKind::Enum,
            symbol: Symbol::builtin(enumeration::SYMBOL),
            builder: EnumBuilder::new(),
            template: render::ENUMS,
            roles: &[Role::Enums],
            config: config.clone(),
            filename: config.output.enums.clone(),
            only_type: None,
        }
    }
}

impl<B: SpecBuilder> Generator for Pipeline<B> {
    fn kind(&self) -> GeneratorKind {
        self.kind
    }

    fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    fn filename(&self) -> &str {
        &self.filename
    }

    fn type_filter(&self) -> Option<&str> {
        self.only_type.as_deref()
    }

    fn generate(&self, package: &Package) -> Result<Option<GeneratedArtifact>> {
        let mut nodes = scan(package, &self.symbol);
        if let Some(name) = &self.only_type {
            nodes.retain(|node| match node {
                Ok(node) => &node.declaration.name == name,
                Err(err) => &err.declaration == name,
            });
            if nodes.is_empty() {
                return Err(Error::TypeNotFound {
                    symbol: self.symbol.to_string(),
                    name: name.clone(),
                });
            }
        }
        if nodes.is_empty() {
            log::debug!("no {} directives in {}", self.symbol.marker(), package.dir().display());
            return Ok(None);
        }

        let mut specs = build_all(&self.builder, package, nodes)?;

        let mut deps = Dependency::new();
        let runtime = RuntimeAliases::import(self.roles, &self.config.runtime, &mut deps)?;
        for spec in &mut specs {
            self.builder.resolve_dependencies(spec, &mut deps, &runtime)?;
        }

        let text = render::render(self.template, self.kind.name(), &specs, &deps, &runtime)?;
        let text = format_source(&text)?;
        log::info!(
            "{} generated {} from {} declaration(s)",
            self.kind.name(),
            self.filename,
            specs.len()
        );
        Ok(Some(GeneratedArtifact {
            kind: self.kind,
            filename: self.filename.clone(),
            text,
        }))
    }
}
