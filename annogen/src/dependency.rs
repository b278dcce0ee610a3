//! Imports needed by generated code, with collision-free aliases.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::RuntimeModules;
use crate::error::DependencyError;

/// Single-segment paths that are already in scope and never imported.
const SCOPE_KEYWORDS: [&str; 3] = ["super", "self", "crate"];

/// Module or item paths referenced by one artifact, each bound to a unique
/// local alias.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dependency {
    aliases: BTreeMap<String, String>,
    paths: BTreeMap<String, String>,
}

impl Dependency {
    pub fn new() -> Self {
        Self::default()
    }

    /// Import `path` under its last segment, numbering the alias when that
    /// name is taken by another path. Returns the alias to use.
    pub fn add(&mut self, path: &str) -> Result<String, DependencyError> {
        if let Some(alias) = self.aliases.get(path) {
            return Ok(alias.clone());
        }
        let base = default_alias(path)?;
        let mut alias = base.to_string();
        let mut suffix = 1;
        while self.paths.contains_key(&alias) {
            alias = format!("{base}{suffix}");
            suffix += 1;
        }
        log::debug!("import {path} as {alias}");
        self.bind(path, alias.clone());
        Ok(alias)
    }

    /// Import `path` under an explicit alias.
    pub fn add_as(&mut self, path: &str, alias: &str) -> Result<String, DependencyError> {
        default_alias(path)?;
        if let Some(existing) = self.aliases.get(path) {
            if existing == alias {
                return Ok(alias.to_string());
            }
            return Err(DependencyError::PathConflict {
                path: path.to_string(),
                existing: existing.clone(),
                requested: alias.to_string(),
            });
        }
        if let Some(existing) = self.paths.get(alias) {
            return Err(DependencyError::AliasConflict {
                alias: alias.to_string(),
                existing: existing.clone(),
                requested: path.to_string(),
            });
        }
        self.bind(path, alias.to_string());
        Ok(alias.to_string())
    }

    fn bind(&mut self, path: &str, alias: String) {
        self.paths.insert(alias.clone(), path.to_string());
        self.aliases.insert(path.to_string(), alias);
    }

    pub fn alias_of(&self, path: &str) -> Option<&str> {
        self.aliases.get(path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// `(path, alias)` pairs sorted by path.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases
            .iter()
            .map(|(path, alias)| (path.as_str(), alias.as_str()))
    }

    /// One `use` line per import, sorted by path.
    pub fn render(&self) -> String {
        let mut block = String::new();
        for (path, alias) in self.iter() {
            if SCOPE_KEYWORDS.contains(&path) {
                continue;
            }
            let last = path.rsplit("::").next().unwrap_or(path);
            if last == alias {
                block.push_str(&format!("use {path};\n"));
            } else {
                block.push_str(&format!("use {path} as {alias};\n"));
            }
        }
        block
    }
}

/// A runtime collaborator referenced by generated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Role {
    Datastore,
    Cache,
    Search,
    Form,
    Web,
    Enums,
}

impl Role {
    pub fn name(self) -> &'static str {
        match self {
            Role::Datastore => "datastore",
            Role::Cache => "cache",
            Role::Search => "search",
            Role::Form => "form",
            Role::Web => "web",
            Role::Enums => "enums",
        }
    }

    fn module(self, modules: &RuntimeModules) -> &str {
        match self {
            Role::Datastore => &modules.datastore,
            Role::Cache => &modules.cache,
            Role::Search => &modules.search,
            Role::Form => &modules.form,
            Role::Web => &modules.web,
            Role::Enums => &modules.enums,
        }
    }
}

/// Local aliases of the runtime modules one artifact uses, keyed by role
/// name so templates can write `{{ rt.datastore }}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RuntimeAliases {
    aliases: BTreeMap<&'static str, String>,
}

impl RuntimeAliases {
    /// Import the modules behind `roles`, in the given order.
    pub fn import(roles: &[Role], modules: &RuntimeModules, deps: &mut Dependency) -> Result<Self, DependencyError> {
        let mut aliases = BTreeMap::new();
        for role in roles {
            aliases.insert(role.name(), deps.add(role.module(modules))?);
        }
        Ok(Self { aliases })
    }

    /// Alias of `role`; the role name itself when it was not imported.
    pub fn get(&self, role: Role) -> &str {
        self.aliases.get(role.name()).map(String::as_str).unwrap_or(role.name())
    }

    /// `alias::item` for an item of the runtime module.
    pub fn item(&self, role: Role, item: &str) -> String {
        format!("{}::{item}", self.get(role))
    }
}

fn default_alias(path: &str) -> Result<&str, DependencyError> {
    let segments: Vec<&str> = path.trim_start_matches("::").split("::").collect();
    let valid = segments.iter().all(|segment| {
        let mut chars = segment.chars();
        chars
            .next()
            .is_some_and(|first| first.is_alphabetic() || first == '_')
            && chars.all(|c| c.is_alphanumeric() || c == '_')
    });
    match segments.last() {
        Some(last) if valid => Ok(last),
        _ => Err(DependencyError::InvalidPath(path.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_path_keeps_its_alias() {
        let mut deps = Dependency::new();
        assert_eq!(deps.add("annogen_runtime::datastore").unwrap(), "datastore");
        assert_eq!(deps.add("annogen_runtime::datastore").unwrap(), "datastore");
        assert_eq!(deps.len(), 1);
    }

    #[test]
    fn colliding_names_get_numbered_aliases() {
        let mut deps = Dependency::new();
        assert_eq!(deps.add("annogen_runtime::form").unwrap(), "form");
        assert_eq!(deps.add("crate::parsers::form").unwrap(), "form1");
        assert_eq!(deps.add("crate::legacy::form").unwrap(), "form2");
        assert_eq!(deps.add("crate::parsers::form").unwrap(), "form1");
        assert_eq!(deps.alias_of("crate::legacy::form"), Some("form2"));
    }

    #[test]
    fn explicit_aliases_conflict_loudly() {
        let mut deps = Dependency::new();
        deps.add("crate::a::web").unwrap();
        assert_eq!(
            deps.add_as("crate::b::http", "web"),
            Err(DependencyError::AliasConflict {
                alias: "web".into(),
                existing: "crate::a::web".into(),
                requested: "crate::b::http".into(),
            })
        );
        assert!(matches!(
            deps.add_as("crate::a::web", "w"),
            Err(DependencyError::PathConflict { .. })
        ));
        assert_eq!(deps.add_as("crate::b::http", "http_rt").unwrap(), "http_rt");
    }

    #[test]
    fn rendered_block_is_sorted_and_skips_scope_keywords() {
        let mut deps = Dependency::new();
        deps.add("zeta::search").unwrap();
        deps.add("super").unwrap();
        deps.add("alpha::search").unwrap();
        deps.add("super::Config").unwrap();
        assert_eq!(
            deps.render(),
            "use alpha::search as search1;\nuse super::Config;\nuse zeta::search;\n"
        );
    }

    #[test]
    fn runtime_roles_share_the_alias_space() {
        let mut deps = Dependency::new();
        deps.add("crate::helpers::form").unwrap();
        let runtime = RuntimeAliases::import(&[Role::Form, Role::Web], &RuntimeModules::default(), &mut deps).unwrap();
        assert_eq!(runtime.get(Role::Form), "form1");
        assert_eq!(runtime.item(Role::Web, "Router"), "web::Router");
        assert_eq!(runtime.get(Role::Search), "search");
        assert!(deps.render().contains("use annogen_runtime::form as form1;\n"));
    }

    #[test]
    fn invalid_paths_are_rejected() {
        let mut deps = Dependency::new();
        assert!(deps.add("").is_err());
        assert!(deps.add("crate::").is_err());
        assert!(deps.add("a::b-c").is_err());
    }
}
