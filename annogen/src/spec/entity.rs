//! `@datastore` entities: persisted structs with one key and one timestamp.

use serde::Serialize;
use syn::{Fields, Item, Visibility};

use super::values::{self, SearchConversion};
use super::{ParserRef, SpecBuilder, check_params, param_value, string_literal, typed_default};
use crate::annotation::{AnnotatedNode, FieldTags};
use crate::dependency::{Dependency, Role, RuntimeAliases};
use crate::error::{DependencyError, SpecErrorKind};
use crate::package::{Package, SemanticType, type_to_string};

pub const SYMBOL: &str = "datastore";

const COMPARISONS: [(&str, &str); 6] = [
    ("eq", "Eq"),
    ("ne", "Ne"),
    ("lt", "Lt"),
    ("le", "Le"),
    ("gt", "Gt"),
    ("ge", "Ge"),
];

#[derive(Debug, Clone, Serialize)]
pub struct EntitySpec {
    pub struct_name: String,
    pub kind_name: String,
    pub kind_literal: String,
    /// Path of the struct as seen from the generated module.
    pub type_path: String,
    /// Local name of the struct once imports are resolved.
    pub type_ref: String,
    pub key_field: String,
    pub key_is_string: bool,
    pub timestamp_field: String,
    pub fields: Vec<FieldSpec>,
    pub query_fields: Vec<QueryField>,
    pub is_searchable: bool,
}

impl EntitySpec {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn form_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|field| field.is_form)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldSpec {
    pub name: String,
    /// Property name in the store.
    pub stored_name: String,
    pub stored_literal: String,
    pub category: &'static str,
    #[serde(skip)]
    pub semantic: SemanticType,
    pub indexed: bool,
    pub is_key: bool,
    pub is_timestamp: bool,
    pub is_searchable: bool,
    pub is_form: bool,
    pub reset_if_missing: bool,
    /// Expression of the `default` tag.
    pub default: Option<String>,
    /// Call path of the form parser, filled in by dependency resolution.
    pub form_parser: Option<String>,
    #[serde(skip)]
    parser: Option<ParserRef>,
    pub search: Option<SearchField>,
    #[serde(skip)]
    conversion: Option<SearchConversion>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchField {
    pub variant: &'static str,
    pub converter: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryField {
    pub name: String,
    pub stored_literal: String,
    pub parameter: &'static str,
    pub comparisons: Vec<Comparison>,
    pub orderable: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub suffix: &'static str,
    pub operator: &'static str,
}

/// Builds [`EntitySpec`]s from `@datastore kind=<Name>` structs.
#[derive(Debug, Clone, Default)]
pub struct EntityBuilder {
    kind_override: Option<String>,
}

impl EntityBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store every entity under `kind`, ignoring the directive's `kind`.
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind_override = Some(kind.into());
        self
    }
}

impl SpecBuilder for EntityBuilder {
    type Spec = EntitySpec;

    fn build(&self, package: &Package, node: &AnnotatedNode<'_>) -> Result<EntitySpec, SpecErrorKind> {
        let declaration = node.declaration;
        let wrong_item = || SpecErrorKind::WrongItem {
            symbol: SYMBOL.to_string(),
            expected: "a struct with named fields",
        };
        let Item::Struct(item) = &declaration.item else {
            return Err(wrong_item());
        };
        let Fields::Named(named) = &item.fields else {
            return Err(wrong_item());
        };

        let params = &node.directive.params;
        check_params(params, &["kind"])?;
        let kind_name = match &self.kind_override {
            Some(kind) => kind.clone(),
            None => param_value(params, "kind")?
                .map(str::to_string)
                .unwrap_or_else(|| declaration.name.clone()),
        };

        let mut fields: Vec<FieldSpec> = Vec::new();
        for field in named.named.iter().filter(|field| matches!(field.vis, Visibility::Public(_))) {
            let name = field.ident.as_ref().map(ToString::to_string).unwrap_or_default();
            let tags = FieldTags::from_attrs(&field.attrs)?;
            let Some((stored_name, indexed)) = storage(&name, tags.get("datastore"))? else {
                continue;
            };

            let shape = package.shape_of(&field.ty);
            let semantic = package
                .resolve(&shape)
                .map_err(|_| SpecErrorKind::UnsupportedFieldType {
                    field: name.clone(),
                    ty: type_to_string(&field.ty),
                })?;

            let mut spec = FieldSpec {
                name: name.clone(),
                stored_literal: string_literal(&stored_name),
                stored_name,
                category: semantic.category(),
                semantic: semantic.clone(),
                indexed,
                is_key: false,
                is_timestamp: false,
                is_searchable: false,
                is_form: false,
                reset_if_missing: false,
                default: None,
                form_parser: None,
                parser: None,
                search: None,
                conversion: None,
            };
            for option in tags.options("ent") {
                match option {
                    "id" | "key" => spec.is_key = true,
                    "timestamp" => spec.is_timestamp = true,
                    "search" => spec.is_searchable = true,
                    "form" => spec.is_form = true,
                    "resetifmissing" => spec.reset_if_missing = true,
                    other => {
                        return Err(SpecErrorKind::UnknownEntOption {
                            field: name,
                            option: other.to_string(),
                        });
                    }
                }
            }

            if spec.is_key {
                if let Some(first) = fields.iter().find(|field| field.is_key) {
                    return Err(SpecErrorKind::MultipleKeyFields {
                        first: first.name.clone(),
                        second: name,
                    });
                }
                if !matches!(semantic, SemanticType::String | SemanticType::Integer(_)) {
                    return Err(SpecErrorKind::InvalidKeyType {
                        field: name,
                        found: semantic.to_string(),
                    });
                }
            }

            if spec.is_timestamp {
                if let Some(first) = fields.iter().find(|field| field.is_timestamp) {
                    return Err(SpecErrorKind::MultipleTimestampFields {
                        first: first.name.clone(),
                        second: name,
                    });
                }
                if semantic != SemanticType::Time {
                    return Err(SpecErrorKind::InvalidTimestampType {
                        field: name,
                        found: semantic.to_string(),
                    });
                }
            }

            if let Some(raw) = tags.get("default") {
                let value = typed_default(&name, &semantic, raw)?;
                spec.default = Some(value.to_expr());
            }

            if spec.is_form {
                spec.parser = Some(match tags.get("parser") {
                    Some(path) => ParserRef::custom(path).ok_or_else(|| SpecErrorKind::InvalidParser {
                        field: name.clone(),
                        path: path.to_string(),
                    })?,
                    None => values::form_parser(&semantic).map(ParserRef::Runtime).ok_or_else(|| {
                        SpecErrorKind::MissingFormParser {
                            field: name.clone(),
                            category: semantic.to_string(),
                        }
                    })?,
                });
            }

            if spec.is_searchable {
                spec.conversion = Some(values::search_conversion(&semantic).ok_or_else(|| {
                    SpecErrorKind::UnsupportedSearchType {
                        field: name.clone(),
                        category: semantic.to_string(),
                    }
                })?);
            }

            fields.push(spec);
        }

        let key = fields
            .iter()
            .find(|field| field.is_key)
            .ok_or(SpecErrorKind::MissingKeyField)?;
        let timestamp = fields
            .iter()
            .find(|field| field.is_timestamp)
            .ok_or(SpecErrorKind::MissingTimestampField)?;

        let query_fields = fields
            .iter()
            .filter(|field| field.indexed)
            .filter_map(|field| {
                let (parameter, orderable) = values::query_parameter(&field.semantic)?;
                let comparisons = COMPARISONS
                    .iter()
                    .filter(|(suffix, _)| orderable || matches!(*suffix, "eq" | "ne"))
                    .map(|&(suffix, operator)| Comparison { suffix, operator })
                    .collect();
                Some(QueryField {
                    name: field.name.clone(),
                    stored_literal: field.stored_literal.clone(),
                    parameter,
                    comparisons,
                    orderable,
                })
            })
            .collect();

        Ok(EntitySpec {
            struct_name: declaration.name.clone(),
            kind_literal: string_literal(&kind_name),
            kind_name,
            type_path: declaration.qualified_path(),
            type_ref: declaration.name.clone(),
            key_field: key.name.clone(),
            key_is_string: key.semantic == SemanticType::String,
            timestamp_field: timestamp.name.clone(),
            is_searchable: fields.iter().any(|field| field.is_searchable),
            query_fields,
            fields,
        })
    }

    fn sort_key(spec: &EntitySpec) -> (String, String) {
        (spec.struct_name.clone(), String::new())
    }

    fn resolve_dependencies(
        &self,
        spec: &mut EntitySpec,
        deps: &mut Dependency,
        runtime: &RuntimeAliases,
    ) -> Result<(), DependencyError> {
        spec.type_ref = deps.add(&spec.type_path)?;
        for field in &mut spec.fields {
            if let Some(parser) = &field.parser {
                field.form_parser = Some(parser.resolve(deps, runtime)?);
            }
            if let Some(conversion) = field.conversion {
                field.search = Some(SearchField {
                    variant: conversion.field,
                    converter: runtime.item(Role::Search, conversion.converter),
                });
            }
        }
        Ok(())
    }
}

/// Stored property name and index flag from a `datastore` tag; `None` when
/// the field is excluded with `datastore:"-"`.
fn storage(field: &str, tag: Option<&str>) -> Result<Option<(String, bool)>, SpecErrorKind> {
    let Some(tag) = tag else {
        return Ok(Some((field.to_string(), true)));
    };
    if tag.trim() == "-" {
        return Ok(None);
    }

    let invalid = || SpecErrorKind::InvalidDatastoreTag {
        field: field.to_string(),
        tag: tag.to_string(),
    };
    let mut parts = tag.split(',').map(str::trim);
    let name = match parts.next() {
        Some("noindex") => return Err(invalid()),
        Some("") | None => field.to_string(),
        Some(name) => name.to_string(),
    };
    let mut indexed = true;
    for option in parts {
        match option {
            "noindex" => indexed = false,
            "" => {}
            _ => return Err(invalid()),
        }
    }
    Ok(Some((name, indexed)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{Symbol, scan};
    use crate::error::MultiError;
    use crate::spec::build_all;
    use std::fs;

    fn build(code: &str) -> Result<Vec<EntitySpec>, MultiError> {
        build_with(EntityBuilder::new(), code)
    }

    fn build_with(builder: EntityBuilder, code: &str) -> Result<Vec<EntitySpec>, MultiError> {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("lib.rs"), code).unwrap();
        let package = crate::package::load(dir.path()).unwrap();
        let symbol = Symbol::new(SYMBOL).unwrap();
        build_all(&builder, &package, scan(&package, &symbol))
    }

    fn single_error(code: &str) -> SpecErrorKind {
        let errors = build(code).unwrap_err().into_inner();
        assert_eq!(errors.len(), 1, "{errors:?}");
        errors.into_iter().next().unwrap().kind
    }

    #[test]
    fn builds_the_config_example() {
        let specs = build(
            r#"
            use std::time::SystemTime;

            /// @datastore
            pub struct Config {
                /// @tag ent:"id"
                pub key: String,
                /// @tag ent:"form"
                pub value: String,
                /// @tag ent:"timestamp"
                pub updated_at: SystemTime,
            }
            "#,
        )
        .unwrap();

        let spec = &specs[0];
        assert_eq!(spec.kind_name, "Config");
        assert_eq!(spec.key_field, "key");
        assert!(spec.key_is_string);
        assert_eq!(spec.timestamp_field, "updated_at");
        let form: Vec<_> = spec.form_fields().map(|field| field.name.as_str()).collect();
        assert_eq!(form, ["value"]);
        assert!(!spec.is_searchable);
        assert_eq!(spec.type_path, "super::Config");
    }

    #[test]
    fn kind_comes_from_params_or_override() {
        let code = r#"
            /// @datastore kind=Setting
            pub struct Config {
                /// @tag ent:"id"
                pub id: i64,
                /// @tag ent:"timestamp"
                pub at: std::time::SystemTime,
            }
        "#;
        assert_eq!(build(code).unwrap()[0].kind_name, "Setting");
        assert_eq!(
            build_with(EntityBuilder::new().with_kind("Preference"), code).unwrap()[0].kind_literal,
            "\"Preference\""
        );
    }

    #[test]
    fn two_key_fields_are_rejected() {
        let kind = single_error(
            r#"
            /// @datastore
            pub struct Config {
                /// @tag ent:"id"
                pub a: String,
                /// @tag ent:"key"
                pub b: String,
                /// @tag ent:"timestamp"
                pub at: std::time::SystemTime,
            }
            "#,
        );
        assert_eq!(
            kind,
            SpecErrorKind::MultipleKeyFields {
                first: "a".into(),
                second: "b".into()
            }
        );
        assert!(kind.to_string().contains("multiple key fields"));
    }

    #[test]
    fn missing_timestamp_is_rejected() {
        let kind = single_error(
            r#"
            /// @datastore
            pub struct Config {
                /// @tag ent:"id"
                pub key: String,
            }
            "#,
        );
        assert_eq!(kind, SpecErrorKind::MissingTimestampField);
        assert_eq!(kind.to_string(), "missing timestamp field");
    }

    #[test]
    fn missing_key_and_bad_key_type() {
        assert_eq!(
            single_error(
                r#"
                /// @datastore
                pub struct Config {
                    /// @tag ent:"timestamp"
                    pub at: std::time::SystemTime,
                }
                "#
            ),
            SpecErrorKind::MissingKeyField
        );
        assert!(matches!(
            single_error(
                r#"
                /// @datastore
                pub struct Config {
                    /// @tag ent:"id"
                    pub key: f64,
                    /// @tag ent:"timestamp"
                    pub at: std::time::SystemTime,
                }
                "#
            ),
            SpecErrorKind::InvalidKeyType { .. }
        ));
    }

    #[test]
    fn unsupported_field_types_name_the_field() {
        let kind = single_error(
            r#"
            /// @datastore
            pub struct Config {
                /// @tag ent:"id"
                pub key: String,
                pub owner: uuid::Uuid,
                /// @tag ent:"timestamp"
                pub at: std::time::SystemTime,
            }
            "#,
        );
        assert_eq!(
            kind,
            SpecErrorKind::UnsupportedFieldType {
                field: "owner".into(),
                ty: "uuid::Uuid".into()
            }
        );
    }

    #[test]
    fn excluded_and_private_fields_are_ignored() {
        let specs = build(
            r#"
            /// @datastore
            pub struct Config {
                /// @tag ent:"id"
                pub key: String,
                /// @tag datastore:"-"
                pub owner: uuid::Uuid,
                cache: std::collections::HashMap<String, String>,
                /// @tag datastore:"body,noindex"
                pub content: Vec<u8>,
                /// @tag ent:"timestamp"
                pub at: std::time::SystemTime,
            }
            "#,
        )
        .unwrap();
        let spec = &specs[0];
        let names: Vec<_> = spec.fields.iter().map(|field| field.name.as_str()).collect();
        assert_eq!(names, ["key", "content", "at"]);
        let content = spec.field("content").unwrap();
        assert_eq!(content.stored_name, "body");
        assert!(!content.indexed);
        assert!(spec.query_fields.iter().all(|query| query.name != "content"));
    }

    #[test]
    fn defaults_are_type_checked_at_build_time() {
        let kind = single_error(
            r#"
            /// @datastore
            pub struct Config {
                /// @tag ent:"id"
                pub key: String,
                /// @tag default:"ten"
                pub limit: i32,
                /// @tag ent:"timestamp"
                pub at: std::time::SystemTime,
            }
            "#,
        );
        assert!(matches!(kind, SpecErrorKind::InvalidDefault { ref field, .. } if field == "limit"));
    }

    #[test]
    fn defaults_form_and_search_settings() {
        let specs = build(
            r#"
            pub type Tags = Vec<String>;

            /// @datastore
            pub struct Post {
                /// @tag ent:"id"
                pub id: i64,
                /// @tag ent:"form,search" default:"Untitled"
                pub title: String,
                /// @tag ent:"form" default:"news, tech"
                pub tags: Tags,
                /// @tag ent:"form,resetifmissing" default:"1h"
                pub ttl: std::time::Duration,
                /// @tag ent:"form" parser:"crate::levels::parse_level"
                pub level: Level,
                /// @tag ent:"timestamp,search"
                pub updated_at: chrono::DateTime<chrono::Utc>,
            }

            pub struct Level(pub i32);
            "#,
        )
        .unwrap();
        let spec = &specs[0];
        assert!(!spec.key_is_string);
        assert!(spec.is_searchable);

        let title = spec.field("title").unwrap();
        assert_eq!(
            title.default.as_deref().map(|d| d.replace(' ', "")).as_deref(),
            Some(r#"::std::string::String::from("Untitled")"#)
        );
        assert_eq!(spec.field("tags").unwrap().category, "array");
        assert!(spec.field("ttl").unwrap().reset_if_missing);
        assert_eq!(
            spec.field("level").unwrap().parser,
            ParserRef::custom("crate::levels::parse_level")
        );

        let updated = spec.query_fields.iter().find(|query| query.name == "updated_at").unwrap();
        assert_eq!(updated.comparisons.len(), 6);
        assert!(updated.orderable);
    }

    #[test]
    fn search_and_form_need_supported_categories() {
        assert!(matches!(
            single_error(
                r#"
                /// @datastore
                pub struct Job {
                    /// @tag ent:"id"
                    pub id: String,
                    /// @tag ent:"search"
                    pub every: std::time::Duration,
                    /// @tag ent:"timestamp"
                    pub at: std::time::SystemTime,
                }
                "#
            ),
            SpecErrorKind::UnsupportedSearchType { .. }
        ));
        assert!(matches!(
            single_error(
                r#"
                /// @datastore
                pub struct Job {
                    /// @tag ent:"id"
                    pub id: String,
                    /// @tag ent:"form"
                    pub owner: Owner,
                    /// @tag ent:"timestamp"
                    pub at: std::time::SystemTime,
                }
                pub struct Owner { pub name: String }
                "#
            ),
            SpecErrorKind::MissingFormParser { .. }
        ));
    }

    #[test]
    fn dependency_resolution_fills_call_paths() {
        let mut specs = build(
            r#"
            /// @datastore
            pub struct Post {
                /// @tag ent:"id,search"
                pub id: String,
                /// @tag ent:"form" parser:"crate::levels::parse_level"
                pub level: Level,
                /// @tag ent:"form"
                pub views: u32,
                /// @tag ent:"timestamp"
                pub at: std::time::SystemTime,
            }
            pub struct Level(pub i32);
            "#,
        )
        .unwrap();

        let mut deps = Dependency::new();
        let runtime = RuntimeAliases::import(
            &[Role::Form, Role::Search],
            &crate::config::RuntimeModules::default(),
            &mut deps,
        )
        .unwrap();
        let builder = EntityBuilder::new();
        builder.resolve_dependencies(&mut specs[0], &mut deps, &runtime).unwrap();

        let spec = &specs[0];
        assert_eq!(spec.type_ref, "Post");
        assert_eq!(spec.field("level").unwrap().form_parser.as_deref(), Some("levels::parse_level"));
        assert_eq!(spec.field("views").unwrap().form_parser.as_deref(), Some("form::parse_int"));
        let search = spec.field("id").unwrap().search.as_ref().unwrap();
        assert_eq!(search.variant, "Atom");
        assert_eq!(search.converter, "search::atom_from_str");
    }

    #[test]
    fn one_error_per_invalid_struct_and_sorted_output() {
        let code = r#"
            /// @datastore
            pub struct Zeta {
                /// @tag ent:"id"
                pub id: String,
                /// @tag ent:"timestamp"
                pub at: std::time::SystemTime,
            }

            /// @datastore
            pub struct Alpha {
                /// @tag ent:"id"
                pub id: String,
                /// @tag ent:"timestamp"
                pub at: std::time::SystemTime,
            }
        "#;
        let names: Vec<_> = build(code).unwrap().into_iter().map(|spec| spec.struct_name).collect();
        assert_eq!(names, ["Alpha", "Zeta"]);

        let errors = build(
            r#"
            /// @datastore
            pub struct NoKey {
                /// @tag ent:"timestamp"
                pub at: std::time::SystemTime,
            }

            /// @datastore
            pub struct NoStamp {
                /// @tag ent:"id"
                pub id: String,
            }

            /// @datastore
            pub enum NotAStruct { A }
            "#,
        )
        .unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
