//! `@enum` newtypes: integer constants with canonical string names.

use std::collections::HashMap;

use heck::{ToShoutySnakeCase, ToSnakeCase};
use serde::Serialize;
use syn::{Expr, Fields, Item, Lit, UnOp, Visibility};

use super::{SpecBuilder, check_params, string_literal};
use crate::annotation::AnnotatedNode;
use crate::dependency::{Dependency, RuntimeAliases};
use crate::error::{DependencyError, SpecErrorKind};
use crate::package::{Package, PrimitiveKind, TypeShape};

pub const SYMBOL: &str = "enum";

#[derive(Debug, Clone, Serialize)]
pub struct EnumSpec {
    pub name: String,
    pub name_literal: String,
    pub type_path: String,
    pub type_ref: String,
    /// Values in declaration order.
    pub values: Vec<EnumValue>,
}

impl EnumSpec {
    pub fn value_of(&self, text: &str) -> Option<i64> {
        self.values.iter().find(|value| value.text == text).map(|value| value.value)
    }

    pub fn text_of(&self, value: i64) -> Option<&str> {
        self.values
            .iter()
            .find(|candidate| candidate.value == value)
            .map(|candidate| candidate.text.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EnumValue {
    pub constant: String,
    pub value: i64,
    /// Canonical string, the constant name minus its prefix in snake_case.
    pub text: String,
    pub text_literal: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EnumBuilder;

impl EnumBuilder {
    pub fn new() -> Self {
        Self
    }
}

impl SpecBuilder for EnumBuilder {
    type Spec = EnumSpec;

    fn build(&self, package: &Package, node: &AnnotatedNode<'_>) -> Result<EnumSpec, SpecErrorKind> {
        let declaration = node.declaration;
        check_params(&node.directive.params, &[])?;

        let Item::Struct(item) = &declaration.item else {
            return Err(SpecErrorKind::EnumNotIntegerNewtype);
        };
        let Fields::Unnamed(fields) = &item.fields else {
            return Err(SpecErrorKind::EnumNotIntegerNewtype);
        };
        if fields.unnamed.len() != 1 {
            return Err(SpecErrorKind::EnumNotIntegerNewtype);
        }
        let field = &fields.unnamed[0];
        if !matches!(
            package.shape_of(&field.ty),
            TypeShape::Primitive(PrimitiveKind::Integer(_))
        ) {
            return Err(SpecErrorKind::EnumNotIntegerNewtype);
        }
        // generated code is a child of the root, so only the root's private fields are reachable
        if !declaration.is_root() && matches!(field.vis, Visibility::Inherited) {
            return Err(SpecErrorKind::EnumFieldNotVisible);
        }

        let name = &declaration.name;
        let constants = package.constants_of(name);
        if constants.is_empty() {
            return Err(SpecErrorKind::NoEnumConstants);
        }

        let shouty = format!("{}_", name.to_shouty_snake_case());
        let mut values: Vec<EnumValue> = Vec::new();
        let mut by_value: HashMap<i64, usize> = HashMap::new();
        let mut by_text: HashMap<String, usize> = HashMap::new();
        for (constant, item) in constants {
            let remainder = constant
                .name
                .strip_prefix(&shouty)
                .or_else(|| constant.name.strip_prefix(name.as_str()))
                .filter(|rest| !rest.is_empty())
                .ok_or_else(|| SpecErrorKind::MissingPrefix {
                    constant: constant.name.clone(),
                    prefix: if constant.name == constant.name.to_uppercase() {
                        shouty.clone()
                    } else {
                        name.clone()
                    },
                })?;
            let value = integer_value(&item.expr, name)
                .ok_or_else(|| SpecErrorKind::NonIntegerValue(constant.name.clone()))?;
            let text = remainder.to_snake_case();

            if let Some(&first) = by_value.get(&value) {
                return Err(SpecErrorKind::DuplicateEnumValue {
                    value,
                    first: values[first].constant.clone(),
                    second: constant.name.clone(),
                });
            }
            if let Some(&first) = by_text.get(&text) {
                return Err(SpecErrorKind::DuplicateCanonical {
                    text,
                    first: values[first].constant.clone(),
                    second: constant.name.clone(),
                });
            }
            by_value.insert(value, values.len());
            by_text.insert(text.clone(), values.len());
            values.push(EnumValue {
                constant: constant.name.clone(),
                value,
                text_literal: string_literal(&text),
                text,
            });
        }

        log::info!("@enum {name}: {} value(s)", values.len());
        Ok(EnumSpec {
            name: name.clone(),
            name_literal: string_literal(name),
            type_path: declaration.qualified_path(),
            type_ref: name.clone(),
            values,
        })
    }

    fn sort_key(spec: &EnumSpec) -> (String, String) {
        (spec.name.clone(), String::new())
    }

    fn resolve_dependencies(
        &self,
        spec: &mut EnumSpec,
        deps: &mut Dependency,
        _runtime: &RuntimeAliases,
    ) -> Result<(), DependencyError> {
        spec.type_ref = deps.add(&spec.type_path)?;
        Ok(())
    }
}

/// Integer behind `1`, `-1`, `(1)` or `Status(1)`.
fn integer_value(expr: &Expr, type_name: &str) -> Option<i64> {
    match expr {
        Expr::Lit(lit) => match &lit.lit {
            Lit::Int(int) => int.base10_parse::<i64>().ok(),
            _ => None,
        },
        Expr::Unary(unary) if matches!(unary.op, UnOp::Neg(_)) => integer_value(&unary.expr, type_name)?.checked_neg(),
        Expr::Paren(paren) => integer_value(&paren.expr, type_name),
        Expr::Group(group) => integer_value(&group.expr, type_name),
        Expr::Call(call) if call.args.len() == 1 => match call.func.as_ref() {
            Expr::Path(path) if path.path.segments.last().is_some_and(|segment| segment.ident == type_name) => {
                integer_value(&call.args[0], type_name)
            }
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{Symbol, scan};
    use crate::error::MultiError;
    use crate::spec::build_all;
    use std::fs;

    fn build_files(files: &[(&str, &str)]) -> Result<Vec<EnumSpec>, MultiError> {
        let dir = tempfile::tempdir().unwrap();
        for (name, code) in files {
            fs::write(dir.path().join(name), code).unwrap();
        }
        let package = crate::package::load(dir.path()).unwrap();
        let symbol = Symbol::new(SYMBOL).unwrap();
        build_all(&EnumBuilder::new(), &package, scan(&package, &symbol))
    }

    fn build(code: &str) -> Result<Vec<EnumSpec>, MultiError> {
        build_files(&[("lib.rs", code)])
    }

    fn single_error(code: &str) -> SpecErrorKind {
        let errors = build(code).unwrap_err().into_inner();
        assert_eq!(errors.len(), 1, "{errors:?}");
        errors.into_iter().next().unwrap().kind
    }

    #[test]
    fn builds_a_bidirectional_map() {
        let specs = build(
            r#"
            /// @enum
            pub struct Status(pub i32);

            pub const STATUS_ACTIVE: Status = Status(1);
            pub const STATUS_PENDING_REVIEW: Status = Status(2);
            pub const STATUS_DELETED: Status = Status(-1);
            "#,
        )
        .unwrap();
        let spec = &specs[0];
        let texts: Vec<_> = spec.values.iter().map(|value| value.text.as_str()).collect();
        assert_eq!(texts, ["active", "pending_review", "deleted"]);
        assert_eq!(spec.value_of("pending_review"), Some(2));
        assert_eq!(spec.text_of(-1), Some("deleted"));
        for value in &spec.values {
            assert_eq!(spec.value_of(&value.text), Some(value.value));
        }
    }

    #[test]
    fn camel_case_prefixes_and_bare_literals() {
        let specs = build(
            r#"
            /// @enum
            pub struct Level(pub i64);

            #[allow(non_upper_case_globals)]
            pub const LevelInfo: Level = Level((10));
            #[allow(non_upper_case_globals)]
            pub const LevelWarnOnce: Level = Level(20);
            "#,
        )
        .unwrap();
        let texts: Vec<_> = specs[0].values.iter().map(|value| value.text.as_str()).collect();
        assert_eq!(texts, ["info", "warn_once"]);
    }

    #[test]
    fn constants_may_live_in_sibling_files() {
        let specs = build_files(&[
            ("lib.rs", "/// @enum\npub struct Color(pub u8);\n"),
            ("palette.rs", "use super::Color;\npub const COLOR_RED: Color = Color(1);\n"),
        ])
        .unwrap();
        assert_eq!(specs[0].values[0].constant, "COLOR_RED");
        assert_eq!(specs[0].type_path, "super::Color");
    }

    #[test]
    fn duplicates_are_rejected() {
        assert_eq!(
            single_error(
                r#"
                /// @enum
                pub struct Status(pub i32);
                pub const STATUS_A: Status = Status(1);
                pub const STATUS_B: Status = Status(1);
                "#
            ),
            SpecErrorKind::DuplicateEnumValue {
                value: 1,
                first: "STATUS_A".into(),
                second: "STATUS_B".into()
            }
        );
        assert!(matches!(
            single_error(
                r#"
                /// @enum
                pub struct Status(pub i32);
                pub const STATUS_IN_USE: Status = Status(1);
                #[allow(non_upper_case_globals)]
                pub const StatusInUse: Status = Status(2);
                "#
            ),
            SpecErrorKind::DuplicateCanonical { ref text, .. } if text == "in_use"
        ));
    }

    #[test]
    fn shape_and_constant_errors() {
        assert_eq!(
            single_error("/// @enum\npub struct Status(pub String);\npub const STATUS_A: Status = Status(1);"),
            SpecErrorKind::EnumNotIntegerNewtype
        );
        assert_eq!(
            single_error("/// @enum\npub enum Status { A }"),
            SpecErrorKind::EnumNotIntegerNewtype
        );
        assert_eq!(
            single_error("/// @enum\npub struct Status(pub i32);"),
            SpecErrorKind::NoEnumConstants
        );
        assert_eq!(
            single_error("/// @enum\npub struct Status(pub i32);\npub const ACTIVE: Status = Status(1);"),
            SpecErrorKind::MissingPrefix {
                constant: "ACTIVE".into(),
                prefix: "STATUS_".into()
            }
        );
        assert_eq!(
            single_error("/// @enum\npub struct Status(pub i32);\npub const STATUS_A: Status = Status(1 + 1);"),
            SpecErrorKind::NonIntegerValue("STATUS_A".into())
        );
    }

    #[test]
    fn private_fields_outside_the_root_are_invisible() {
        let errors = build_files(&[
            ("lib.rs", "mod models;\n"),
            (
                "models.rs",
                "/// @enum\npub struct Status(i32);\npub const STATUS_A: Status = Status(1);\n",
            ),
        ])
        .unwrap_err();
        assert_eq!(errors.into_inner()[0].kind, SpecErrorKind::EnumFieldNotVisible);

        assert!(build("/// @enum\npub struct Status(i32);\nconst STATUS_A: Status = Status(1);").is_ok());
    }

    #[test]
    fn enums_sort_by_name() {
        let specs = build(
            r#"
            /// @enum
            pub struct Zone(pub i32);
            pub const ZONE_A: Zone = Zone(1);
            /// @enum
            pub struct Area(pub i32);
            pub const AREA_A: Area = Area(1);
            "#,
        )
        .unwrap();
        let names: Vec<_> = specs.iter().map(|spec| spec.name.as_str()).collect();
        assert_eq!(names, ["Area", "Zone"]);
    }
}
