//! Per-category tables shared by the builders: default literals, form
//! parsers, search-document conversions and query parameter types.

use chrono::DateTime;
use proc_macro2::{Literal, Span, TokenStream};
use quote::quote;
use syn::LitInt;

use crate::package::{IntegerType, SemanticType};

/// A `default:"..."` literal checked against the field's category.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    String(String),
    Bool(bool),
    StringList(Vec<String>),
    Bytes(Vec<u8>),
    Int { value: i128, ty: IntegerType },
    Float(f64),
    /// Seconds and nanoseconds relative to the UNIX epoch.
    Time { seconds: i64, nanos: u32 },
    Now,
    Duration(std::time::Duration),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultError {
    Unsupported,
    Invalid(String),
}

impl DefaultValue {
    pub fn parse(semantic: &SemanticType, raw: &str) -> Result<Self, DefaultError> {
        let invalid = |reason: &dyn std::fmt::Display| DefaultError::Invalid(reason.to_string());
        match semantic {
            SemanticType::String => Ok(DefaultValue::String(raw.to_string())),
            SemanticType::Bool => parse_bool(raw)
                .map(DefaultValue::Bool)
                .ok_or_else(|| invalid(&"expected true or false")),
            SemanticType::Bytes => Ok(DefaultValue::Bytes(raw.as_bytes().to_vec())),
            SemanticType::Integer(ty) => {
                let value = raw.trim().parse::<i128>().map_err(|err| invalid(&err))?;
                let (min, max) = ty.range();
                if value < min || value > max {
                    return Err(invalid(&format!("out of range for {ty}")));
                }
                Ok(DefaultValue::Int { value, ty: *ty })
            }
            SemanticType::Float32 | SemanticType::Float64 => match raw.trim().parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(DefaultValue::Float(value)),
                Ok(_) => Err(invalid(&"value is not finite")),
                Err(err) => Err(invalid(&err)),
            },
            SemanticType::Time if raw.trim() == "now" => Ok(DefaultValue::Now),
            SemanticType::Time => DateTime::parse_from_rfc3339(raw.trim())
                .map(|time| DefaultValue::Time {
                    seconds: time.timestamp(),
                    nanos: time.timestamp_subsec_nanos(),
                })
                .map_err(|err| invalid(&format!("{err} (expected RFC 3339 or `now`)"))),
            SemanticType::Duration => humantime::parse_duration(raw.trim())
                .map(DefaultValue::Duration)
                .map_err(|err| invalid(&err)),
            list if list.is_string_list() => Ok(DefaultValue::StringList(
                raw.split(',').map(|item| item.trim().to_string()).collect(),
            )),
            _ => Err(DefaultError::Unsupported),
        }
    }

    /// Rust expression producing the value.
    pub fn to_tokens(&self) -> TokenStream {
        match self {
            DefaultValue::String(value) => {
                let lit = Literal::string(value);
                quote!(::std::string::String::from(#lit))
            }
            DefaultValue::Bool(value) => quote!(#value),
            DefaultValue::StringList(items) => {
                let lits = items.iter().map(|item| Literal::string(item));
                quote!(::std::vec![#(::std::string::String::from(#lits)),*])
            }
            DefaultValue::Bytes(bytes) => {
                let lit = Literal::byte_string(bytes);
                quote!(#lit.to_vec())
            }
            DefaultValue::Int { value, ty } => {
                let lit = LitInt::new(&format!("{}{ty}", value.unsigned_abs()), Span::call_site());
                if *value < 0 { quote!(-#lit) } else { quote!(#lit) }
            }
            DefaultValue::Float(value) => {
                let lit = Literal::f64_unsuffixed(value.abs());
                if value.is_sign_negative() { quote!(-#lit) } else { quote!(#lit) }
            }
            DefaultValue::Time { seconds, nanos } => {
                let secs = Literal::u64_unsuffixed(seconds.unsigned_abs());
                let nanos = Literal::u32_unsuffixed(*nanos);
                if *seconds < 0 {
                    quote!(::std::time::UNIX_EPOCH - ::std::time::Duration::from_secs(#secs) + ::std::time::Duration::from_nanos(#nanos))
                } else {
                    quote!(::std::time::UNIX_EPOCH + ::std::time::Duration::new(#secs, #nanos))
                }
            }
            DefaultValue::Now => quote!(::std::time::SystemTime::now()),
            DefaultValue::Duration(duration) => {
                let secs = Literal::u64_unsuffixed(duration.as_secs());
                let nanos = Literal::u32_unsuffixed(duration.subsec_nanos());
                quote!(::std::time::Duration::new(#secs, #nanos))
            }
        }
    }

    pub fn to_expr(&self) -> String {
        self.to_tokens().to_string()
    }
}

/// Accepts the spellings `1 t T TRUE true True` and their false counterparts.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim() {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Runtime `form` function reading one raw value into the category.
pub fn form_parser(semantic: &SemanticType) -> Option<&'static str> {
    let name = match semantic {
        SemanticType::String => "parse_string",
        SemanticType::Bool => "parse_bool",
        SemanticType::Integer(ty) if ty.is_wide() => "parse_int64",
        SemanticType::Integer(_) => "parse_int",
        SemanticType::Float32 => "parse_float32",
        SemanticType::Float64 => "parse_float64",
        SemanticType::Bytes => "parse_bytes",
        SemanticType::Time => "parse_time",
        SemanticType::Duration => "parse_duration",
        list if list.is_string_list() => "parse_string_list",
        _ => return None,
    };
    Some(name)
}

/// How a value is stored in a search document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConversion {
    /// Variant of the runtime `search::Field` enum.
    pub field: &'static str,
    /// Runtime `search` function turning a field reference into that variant's payload.
    pub converter: &'static str,
}

pub fn search_conversion(semantic: &SemanticType) -> Option<SearchConversion> {
    let (field, converter) = match semantic {
        SemanticType::String => ("Atom", "atom_from_str"),
        SemanticType::Bool => ("Atom", "atom_from_bool"),
        SemanticType::Bytes => ("Html", "html_from_bytes"),
        SemanticType::Integer(_) | SemanticType::Float32 | SemanticType::Float64 => {
            ("Number", "number_from")
        }
        SemanticType::Time => ("Number", "number_from_time"),
        _ => return None,
    };
    Some(SearchConversion { field, converter })
}

/// Parameter type of generated query filters, plus whether the category can
/// be ordered.
pub fn query_parameter(semantic: &SemanticType) -> Option<(&'static str, bool)> {
    let parameter = match semantic {
        SemanticType::String => ("&str", true),
        SemanticType::Bool => ("bool", false),
        SemanticType::Integer(_) => ("i64", true),
        SemanticType::Float32 => ("f32", true),
        SemanticType::Float64 => ("f64", true),
        SemanticType::Time => ("::std::time::SystemTime", true),
        _ => return None,
    };
    Some(parameter)
}
