use std::sync::LazyLock;

use regex::Regex;
use syn::{Attribute, LitStr};

use super::scanner::doc_lines;
use crate::error::AnnotationSyntaxError;

/// Doc line prefix carrying field tags.
pub const TAG_MARKER: &str = "@tag";

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([A-Za-z0-9_]+):"([^"]*)""#).expect("tag pattern is valid"));

/// `key:"value"` pairs attached to a struct field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldTags {
    entries: Vec<(String, String)>,
}

impl FieldTags {
    /// Parse a single tag string such as `ent:"id,form" default:"10"`.
    pub fn parse(text: &str) -> Result<Self, AnnotationSyntaxError> {
        let mut tags = FieldTags::default();
        tags.extend_from(text)?;
        Ok(tags)
    }

    /// Collect the `@tag` doc lines of a field. A `#[serde(rename = "..")]`
    /// stands in for a missing `json` tag.
    pub fn from_attrs(attrs: &[Attribute]) -> Result<Self, AnnotationSyntaxError> {
        let mut tags = FieldTags::default();
        for line in doc_lines(attrs) {
            if let Some(rest) = line.strip_prefix(TAG_MARKER)
                && (rest.is_empty() || rest.starts_with(char::is_whitespace))
            {
                tags.extend_from(rest)?;
            }
        }

        if tags.get("json").is_none()
            && let Some(rename) = serde_rename(attrs)?
        {
            tags.entries.push(("json".to_string(), rename));
        }
        Ok(tags)
    }

    fn extend_from(&mut self, text: &str) -> Result<(), AnnotationSyntaxError> {
        for captures in TAG_PATTERN.captures_iter(text) {
            let key = captures[1].to_string();
            if self.get(&key).is_some() {
                return Err(AnnotationSyntaxError::DuplicateKey(key));
            }
            self.entries.push((key, captures[2].to_string()));
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    /// Comma separated options of a tag, e.g. `ent:"id, form"` gives `["id", "form"]`.
    pub fn options(&self, key: &str) -> Vec<&str> {
        self.get(key)
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|option| !option.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn serde_rename(attrs: &[Attribute]) -> Result<Option<String>, AnnotationSyntaxError> {
    let mut rename = None;
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("serde")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") && meta.input.peek(syn::Token![=]) {
                let value: LitStr = meta.value()?.parse()?;
                rename = Some(value.value());
            } else if meta.input.peek(syn::Token![=]) {
                let _: syn::Expr = meta.value()?.parse()?;
            } else if meta.input.peek(syn::token::Paren) {
                let _content;
                syn::parenthesized!(_content in meta.input);
            }
            Ok(())
        })
        .map_err(|err| AnnotationSyntaxError::InvalidSerdeAttribute(err.to_string()))?;
    }
    Ok(rename)
}
