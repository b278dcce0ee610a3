//! `@api` routes: free functions bound to an HTTP method and path pattern.

use heck::{ToShoutySnakeCase, ToSnakeCase};
use serde::Serialize;
use syn::{FnArg, GenericArgument, Item, ItemFn, Pat, PathArguments, ReturnType, Type, TypeParamBound};

use super::path::PathPattern;
use super::{SpecBuilder, check_params, param_value, string_literal, typed_default};
use crate::annotation::{AnnotatedNode, FieldTags};
use crate::dependency::{Dependency, RuntimeAliases};
use crate::error::{DependencyError, SpecErrorKind};
use crate::package::{Package, PointerKind, PrimitiveKind, SemanticType, TypeShape, type_to_string};

pub const SYMBOL: &str = "api";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn parse(text: &str) -> Option<Self> {
        match text.to_ascii_uppercase().as_str() {
            "GET" => Some(Method::Get),
            "POST" => Some(Method::Post),
            "PUT" => Some(Method::Put),
            "DELETE" => Some(Method::Delete),
            _ => None,
        }
    }

    /// Method implied by the first word of a function name, e.g. `list_items`.
    pub fn infer(function: &str) -> Option<Self> {
        let snake = function.to_snake_case();
        match snake.split('_').next()? {
            "get" | "list" => Some(Method::Get),
            "create" => Some(Method::Post),
            "update" => Some(Method::Put),
            "delete" => Some(Method::Delete),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }

    fn variant(self) -> &'static str {
        match self {
            Method::Get => "Get",
            Method::Post => "Post",
            Method::Put => "Put",
            Method::Delete => "Delete",
        }
    }
}

/// Where the structured parameter is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterFormat {
    Query,
    Form,
    Json,
}

impl ParameterFormat {
    fn parse(text: &str) -> Option<Self> {
        match text.to_ascii_lowercase().as_str() {
            "query" => Some(ParameterFormat::Query),
            "form" => Some(ParameterFormat::Form),
            "json" => Some(ParameterFormat::Json),
            _ => None,
        }
    }

    fn for_method(method: Method) -> Self {
        match method {
            Method::Get | Method::Delete => ParameterFormat::Query,
            Method::Post | Method::Put => ParameterFormat::Json,
        }
    }

    fn variant(self) -> &'static str {
        match self {
            ParameterFormat::Query => "Query",
            ParameterFormat::Form => "Form",
            ParameterFormat::Json => "Json",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnKind {
    None,
    ErrorOnly,
    ObjectOnly,
    ObjectAndError,
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteSpec {
    pub function: String,
    pub handler: String,
    /// Module of the function as seen from the generated module.
    pub module_path: String,
    /// Callee path once imports are resolved.
    pub call: String,
    pub call_arguments: Vec<String>,
    pub is_async: bool,
    pub method: Method,
    pub method_variant: &'static str,
    pub path: String,
    pub path_literal: String,
    pub regex_literal: String,
    pub path_parameters: Vec<PathParameter>,
    pub structured: Option<StructuredParameter>,
    pub return_kind: ReturnKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct PathParameter {
    pub name: String,
    pub literal: String,
    /// Handler local holding the captured segment.
    pub local: String,
}

/// The optional struct argument filled from the query string, form or JSON body.
#[derive(Debug, Clone, Serialize)]
pub struct StructuredParameter {
    pub type_name: String,
    pub type_path: String,
    pub type_ref: String,
    /// Name of the generated parameter table.
    pub table: String,
    pub format: ParameterFormat,
    pub format_variant: &'static str,
    pub fields: Vec<ParameterField>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParameterField {
    pub name: String,
    pub wire_name: String,
    pub wire_literal: String,
    /// Variant of the runtime field kind.
    pub kind: &'static str,
    pub required: bool,
    /// Raw default as a string literal, checked against the field type.
    pub default_literal: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RouteBuilder;

impl RouteBuilder {
    pub fn new() -> Self {
        Self
    }
}

impl SpecBuilder for RouteBuilder {
    type Spec = RouteSpec;

    fn build(&self, package: &Package, node: &AnnotatedNode<'_>) -> Result<RouteSpec, SpecErrorKind> {
        let declaration = node.declaration;
        let Item::Fn(item) = &declaration.item else {
            return Err(SpecErrorKind::WrongItem {
                symbol: SYMBOL.to_string(),
                expected: "a free function",
            });
        };

        let params = &node.directive.params;
        check_params(params, &["path", "method", "format"])?;
        let raw_path = param_value(params, "path")?.ok_or(SpecErrorKind::MissingPath)?;
        let pattern = PathPattern::compile(raw_path).map_err(|reason| SpecErrorKind::InvalidPathPattern {
            pattern: raw_path.to_string(),
            reason,
        })?;

        let function = item.sig.ident.to_string();
        let method = match param_value(params, "method")? {
            Some(text) => Method::parse(text).ok_or_else(|| SpecErrorKind::UnknownMethod(text.to_string()))?,
            None => Method::infer(&function).ok_or_else(|| SpecErrorKind::UnresolvableMethod(function.clone()))?,
        };
        let format = match param_value(params, "format")? {
            Some(text) => ParameterFormat::parse(text).ok_or_else(|| SpecErrorKind::UnknownFormat(text.to_string()))?,
            None => ParameterFormat::for_method(method),
        };

        let arguments = arguments_of(item)?;
        let (context, rest) = arguments.split_first().ok_or(SpecErrorKind::MissingContext)?;
        if !is_context(context.ty) {
            return Err(SpecErrorKind::MissingContext);
        }
        let mut call_arguments = vec![pass_by(context.ty, "ctx")];

        let string_count = rest.iter().take_while(|arg| is_string(package, arg.ty)).count();
        if string_count != pattern.parameters().len() {
            return Err(SpecErrorKind::ArityMismatch {
                expected: pattern.parameters().len(),
                found: string_count,
            });
        }
        let mut path_parameters = Vec::new();
        for (index, (expected, argument)) in pattern.parameters().iter().zip(rest).enumerate() {
            if *expected != argument.name {
                return Err(SpecErrorKind::NameMismatch {
                    position: index + 1,
                    expected: expected.clone(),
                    found: argument.name.clone(),
                });
            }
            let local = format!("path_{expected}");
            call_arguments.push(pass_by(argument.ty, &local));
            path_parameters.push(PathParameter {
                literal: string_literal(expected),
                name: expected.clone(),
                local,
            });
        }

        let structured = match &rest[string_count..] {
            [] => None,
            [argument] => {
                let (parameter, expression) = structured_parameter(package, argument, &function, format)?;
                call_arguments.push(expression);
                Some(parameter)
            }
            [_, extra, ..] => {
                return Err(SpecErrorKind::InvalidArgument {
                    name: extra.name.clone(),
                    reason: "only one structured parameter may follow the path parameters".to_string(),
                });
            }
        };

        let return_kind = return_kind(&item.sig.output)?;
        log::info!("@api {} {} -> {}", method.as_str(), pattern.as_str(), function);

        Ok(RouteSpec {
            handler: format!("handle_{function}"),
            call: function.clone(),
            function,
            module_path: declaration.module_path.clone(),
            call_arguments,
            is_async: item.sig.asyncness.is_some(),
            method,
            method_variant: method.variant(),
            path: pattern.as_str().to_string(),
            path_literal: string_literal(pattern.as_str()),
            regex_literal: string_literal(pattern.regex()),
            path_parameters,
            structured,
            return_kind,
        })
    }

    fn sort_key(spec: &RouteSpec) -> (String, String) {
        (spec.path.clone(), spec.method.as_str().to_string())
    }

    fn claims(spec: &RouteSpec) -> Vec<String> {
        vec![
            format!("route {} {}", spec.method.as_str(), spec.path),
            format!("handler `{}`", spec.handler),
        ]
    }

    fn resolve_dependencies(
        &self,
        spec: &mut RouteSpec,
        deps: &mut Dependency,
        _runtime: &RuntimeAliases,
    ) -> Result<(), DependencyError> {
        spec.call = format!("{}::{}", deps.add(&spec.module_path)?, spec.function);
        if let Some(structured) = &mut spec.structured {
            structured.type_ref = deps.add(&structured.type_path)?;
        }
        Ok(())
    }
}

struct Argument<'a> {
    name: String,
    ty: &'a Type,
}

fn arguments_of(item: &ItemFn) -> Result<Vec<Argument<'_>>, SpecErrorKind> {
    item.sig
        .inputs
        .iter()
        .map(|input| match input {
            FnArg::Receiver(_) => Err(SpecErrorKind::WrongItem {
                symbol: SYMBOL.to_string(),
                expected: "a free function",
            }),
            FnArg::Typed(typed) => match typed.pat.as_ref() {
                Pat::Ident(ident) => Ok(Argument {
                    name: ident.ident.to_string(),
                    ty: typed.ty.as_ref(),
                }),
                other => Err(SpecErrorKind::InvalidArgument {
                    name: quote::ToTokens::to_token_stream(other).to_string(),
                    reason: "arguments must be plain identifiers".to_string(),
                }),
            },
        })
        .collect()
}

fn strip_references(ty: &Type) -> &Type {
    match ty {
        Type::Reference(reference) => strip_references(&reference.elem),
        Type::Paren(inner) => strip_references(&inner.elem),
        other => other,
    }
}

fn is_context(ty: &Type) -> bool {
    matches!(
        strip_references(ty),
        Type::Path(path) if path.path.segments.last().is_some_and(|segment| segment.ident == "Context")
    )
}

fn is_string(package: &Package, ty: &Type) -> bool {
    package.shape_of(strip_references(ty)) == TypeShape::Primitive(PrimitiveKind::String)
}

/// Expression passing the local `name` to an argument of type `ty`.
fn pass_by(ty: &Type, name: &str) -> String {
    match ty {
        Type::Reference(_) => format!("&{name}"),
        _ => name.to_string(),
    }
}

fn structured_parameter(
    package: &Package,
    argument: &Argument<'_>,
    function: &str,
    format: ParameterFormat,
) -> Result<(StructuredParameter, String), SpecErrorKind> {
    let invalid = || SpecErrorKind::InvalidArgument {
        name: argument.name.clone(),
        reason: format!(
            "`{}` must be a struct with named fields declared in this package, passed by value, reference, Box or Option",
            type_to_string(argument.ty)
        ),
    };

    let (type_name, expression) = match package.shape_of(argument.ty) {
        TypeShape::Named(name) => (name, "params".to_string()),
        TypeShape::Pointer(pointer, inner) => {
            let TypeShape::Named(name) = *inner else {
                return Err(invalid());
            };
            let expression = match pointer {
                PointerKind::Ref => "&params",
                PointerKind::Box => "::std::boxed::Box::new(params)",
                PointerKind::Option => "::std::option::Option::Some(params)",
                PointerKind::Shared => return Err(invalid()),
            };
            (name, expression.to_string())
        }
        _ => return Err(invalid()),
    };
    let (declaration, item) = package.struct_named(&type_name).ok_or_else(invalid)?;
    let syn::Fields::Named(named) = &item.fields else {
        return Err(invalid());
    };

    let mut fields = Vec::new();
    for field in &named.named {
        let name = field.ident.as_ref().map(ToString::to_string).unwrap_or_default();
        let tags = FieldTags::from_attrs(&field.attrs)?;
        let wire_name = match tags.get("json").and_then(|json| json.split(',').next()).map(str::trim) {
            Some("-") => continue,
            Some(wire) if !wire.is_empty() => wire.to_string(),
            _ => name.to_snake_case(),
        };

        let semantic = package
            .resolve(&package.shape_of(&field.ty))
            .map_err(|err| SpecErrorKind::UnresolvableType {
                field: name.clone(),
                chain: err.to_string(),
            })?;
        let default_literal = match tags.get("default") {
            Some(raw) => {
                typed_default(&name, &semantic, raw)?;
                Some(string_literal(raw))
            }
            None => None,
        };

        fields.push(ParameterField {
            wire_literal: string_literal(&wire_name),
            wire_name,
            kind: field_kind(&semantic),
            required: tags.options("validate").contains(&"required"),
            default_literal,
            name,
        });
    }

    let parameter = StructuredParameter {
        type_ref: type_name.clone(),
        type_path: declaration.qualified_path(),
        type_name,
        table: format!("{}_PARAMETERS", function.to_shouty_snake_case()),
        format,
        format_variant: format.variant(),
        fields,
    };
    Ok((parameter, expression))
}

fn field_kind(semantic: &SemanticType) -> &'static str {
    match semantic {
        SemanticType::Bool => "Bool",
        SemanticType::Integer(_) => "Int",
        SemanticType::Float32 | SemanticType::Float64 => "Float",
        SemanticType::String | SemanticType::Bytes | SemanticType::Duration => "String",
        SemanticType::Time => "Time",
        SemanticType::Array(_) => "Array",
        SemanticType::Object(_) => "Object",
    }
}

fn return_kind(output: &ReturnType) -> Result<ReturnKind, SpecErrorKind> {
    let ty = match output {
        ReturnType::Default => return Ok(ReturnKind::None),
        ReturnType::Type(_, ty) => ty.as_ref(),
    };
    match ty {
        Type::Tuple(tuple) if tuple.elems.is_empty() => Ok(ReturnKind::None),
        Type::Tuple(tuple) if tuple.elems.len() > 2 => Err(SpecErrorKind::InvalidReturnArity(tuple.elems.len())),
        Type::Path(path) if path.qself.is_none() => {
            let Some(last) = path.path.segments.last().filter(|segment| segment.ident == "Result") else {
                return Ok(ReturnKind::ObjectOnly);
            };
            let arguments = generic_types(&last.arguments);
            let (value, error) = match arguments.as_slice() {
                [value] => (*value, None),
                [value, error] => (*value, Some(*error)),
                _ => return Ok(ReturnKind::ObjectOnly),
            };
            if let Some(error) = error
                && !is_error_type(error)
            {
                return Err(SpecErrorKind::NotAnErrorType(type_to_string(error)));
            }
            match value {
                Type::Tuple(tuple) if tuple.elems.is_empty() => Ok(ReturnKind::ErrorOnly),
                _ => Ok(ReturnKind::ObjectAndError),
            }
        }
        _ => Ok(ReturnKind::ObjectOnly),
    }
}

fn generic_types(arguments: &PathArguments) -> Vec<&Type> {
    match arguments {
        PathArguments::AngleBracketed(args) => args
            .args
            .iter()
            .filter_map(|arg| match arg {
                GenericArgument::Type(ty) => Some(ty),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// `FooError`, `anyhow::Error` or a boxed `dyn Error` trait object.
fn is_error_type(ty: &Type) -> bool {
    match ty {
        Type::Path(path) => {
            let Some(last) = path.path.segments.last() else {
                return false;
            };
            if last.ident.to_string().ends_with("Error") {
                return true;
            }
            last.ident == "Box" && generic_types(&last.arguments).into_iter().any(is_error_type)
        }
        Type::TraitObject(object) => object.bounds.iter().any(|bound| {
            matches!(bound, TypeParamBound::Trait(bound)
                if bound.path.segments.last().is_some_and(|segment| segment.ident == "Error"))
        }),
        Type::Paren(inner) => is_error_type(&inner.elem),
        _ => false,
    }
}
