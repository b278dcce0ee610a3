//! Static type shapes of scanned declarations.

use std::fmt;

use quote::ToTokens;
use syn::{GenericArgument, PathArguments, Type};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    Integer(IntegerType),
    Float32,
    Float64,
    String,
    Bytes,
    Time,
    Duration,
}

/// A built-in integer type, kept so defaults can be checked and written at
/// the field's own width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntegerType {
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
}

impl IntegerType {
    pub fn from_name(name: &str) -> Option<Self> {
        let ty = match name {
            "i8" => IntegerType::I8,
            "i16" => IntegerType::I16,
            "i32" => IntegerType::I32,
            "i64" => IntegerType::I64,
            "isize" => IntegerType::Isize,
            "u8" => IntegerType::U8,
            "u16" => IntegerType::U16,
            "u32" => IntegerType::U32,
            "u64" => IntegerType::U64,
            "usize" => IntegerType::Usize,
            _ => return None,
        };
        Some(ty)
    }

    pub fn name(self) -> &'static str {
        match self {
            IntegerType::I8 => "i8",
            IntegerType::I16 => "i16",
            IntegerType::I32 => "i32",
            IntegerType::I64 => "i64",
            IntegerType::Isize => "isize",
            IntegerType::U8 => "u8",
            IntegerType::U16 => "u16",
            IntegerType::U32 => "u32",
            IntegerType::U64 => "u64",
            IntegerType::Usize => "usize",
        }
    }

    /// 64-bit integers are stored as `int64`; pointer-sized ones as `int`.
    pub fn is_wide(self) -> bool {
        matches!(self, IntegerType::I64 | IntegerType::U64)
    }

    /// Inclusive value range, with pointer-sized types taken as 64 bits.
    pub fn range(self) -> (i128, i128) {
        match self {
            IntegerType::I8 => (i8::MIN.into(), i8::MAX.into()),
            IntegerType::I16 => (i16::MIN.into(), i16::MAX.into()),
            IntegerType::I32 => (i32::MIN.into(), i32::MAX.into()),
            IntegerType::I64 | IntegerType::Isize => (i64::MIN.into(), i64::MAX.into()),
            IntegerType::U8 => (0, u8::MAX.into()),
            IntegerType::U16 => (0, u16::MAX.into()),
            IntegerType::U32 => (0, u32::MAX.into()),
            IntegerType::U64 | IntegerType::Usize => (0, u64::MAX.into()),
        }
    }
}

impl fmt::Display for IntegerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a pointer-like wrapper holds its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerKind {
    /// `&T` or `&mut T`
    Ref,
    Box,
    Option,
    /// `Rc<T>` or `Arc<T>`
    Shared,
}

/// Syntactic shape of a type, with well-known library types mapped to primitives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeShape {
    Primitive(PrimitiveKind),
    Pointer(PointerKind, Box<TypeShape>),
    Array(Box<TypeShape>),
    Map(Box<TypeShape>, Box<TypeShape>),
    /// Unit is the empty tuple.
    Tuple(Vec<TypeShape>),
    /// A type declared in the scanned package.
    Named(String),
    /// A path to a type declared elsewhere.
    External(String),
    Unsupported(String),
}

impl TypeShape {
    /// Classify a `syn` type. `is_local` answers whether a single-segment
    /// name is declared in the scanned package.
    pub fn from_syn(ty: &Type, is_local: &dyn Fn(&str) -> bool) -> TypeShape {
        match ty {
            Type::Paren(inner) => Self::from_syn(&inner.elem, is_local),
            Type::Group(inner) => Self::from_syn(&inner.elem, is_local),
            Type::Reference(reference) => {
                TypeShape::Pointer(PointerKind::Ref, Box::new(Self::from_syn(&reference.elem, is_local)))
            }
            Type::Slice(slice) => sequence_of(&slice.elem, is_local),
            Type::Array(array) => sequence_of(&array.elem, is_local),
            Type::Tuple(tuple) => TypeShape::Tuple(tuple.elems.iter().map(|t| Self::from_syn(t, is_local)).collect()),
            Type::Path(type_path) if type_path.qself.is_none() => {
                let path = &type_path.path;
                let Some(last) = path.segments.last() else {
                    return TypeShape::Unsupported(type_to_string(ty));
                };
                let name = last.ident.to_string();
                let args = type_arguments(&last.arguments);

                if path.segments.len() == 1 && args.is_empty() && is_local(&name) {
                    return TypeShape::Named(name);
                }
                if args.is_empty()
                    && let Some(integer) = IntegerType::from_name(&name)
                {
                    return TypeShape::Primitive(PrimitiveKind::Integer(integer));
                }

                match (name.as_str(), args.as_slice()) {
                    ("bool", []) => TypeShape::Primitive(PrimitiveKind::Bool),
                    ("f32", []) => TypeShape::Primitive(PrimitiveKind::Float32),
                    ("f64", []) => TypeShape::Primitive(PrimitiveKind::Float64),
                    ("String" | "str" | "char", []) => TypeShape::Primitive(PrimitiveKind::String),
                    ("Bytes", []) => TypeShape::Primitive(PrimitiveKind::Bytes),
                    ("SystemTime" | "NaiveDateTime" | "OffsetDateTime", []) | ("DateTime", [_]) => {
                        TypeShape::Primitive(PrimitiveKind::Time)
                    }
                    ("Duration", []) => TypeShape::Primitive(PrimitiveKind::Duration),
                    ("Vec", [inner]) => sequence_of(inner, is_local),
                    ("VecDeque" | "HashSet" | "BTreeSet", [inner]) => {
                        TypeShape::Array(Box::new(Self::from_syn(inner, is_local)))
                    }
                    ("HashMap" | "BTreeMap", [key, value]) => TypeShape::Map(
                        Box::new(Self::from_syn(key, is_local)),
                        Box::new(Self::from_syn(value, is_local)),
                    ),
                    ("Box", [inner]) => TypeShape::Pointer(PointerKind::Box, Box::new(Self::from_syn(inner, is_local))),
                    ("Option", [inner]) => {
                        TypeShape::Pointer(PointerKind::Option, Box::new(Self::from_syn(inner, is_local)))
                    }
                    ("Rc" | "Arc", [inner]) => {
                        TypeShape::Pointer(PointerKind::Shared, Box::new(Self::from_syn(inner, is_local)))
                    }
                    _ => TypeShape::External(type_to_string(ty)),
                }
            }
            _ => TypeShape::Unsupported(type_to_string(ty)),
        }
    }

    /// Strip every pointer layer.
    pub fn pointee(&self) -> &TypeShape {
        match self {
            TypeShape::Pointer(_, inner) => inner.pointee(),
            other => other,
        }
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, TypeShape::Tuple(items) if items.is_empty())
    }
}

/// `u8` sequences are byte strings, anything else is an array.
fn sequence_of(elem: &Type, is_local: &dyn Fn(&str) -> bool) -> TypeShape {
    if is_u8(elem) {
        TypeShape::Primitive(PrimitiveKind::Bytes)
    } else {
        TypeShape::Array(Box::new(TypeShape::from_syn(elem, is_local)))
    }
}

fn is_u8(ty: &Type) -> bool {
    matches!(ty, Type::Path(type_path) if type_path.qself.is_none() && type_path.path.is_ident("u8"))
}

fn type_arguments(arguments: &PathArguments) -> Vec<&Type> {
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

/// Render a type the way it was written, without token spacing.
pub fn type_to_string(ty: &Type) -> String {
    match ty {
        Type::Path(type_path) if type_path.qself.is_none() => type_path
            .path
            .segments
            .iter()
            .map(|seg| {
                let ident = seg.ident.to_string();
                let inner: Vec<String> = type_arguments(&seg.arguments).into_iter().map(type_to_string).collect();
                if inner.is_empty() { ident } else { format!("{}<{}>", ident, inner.join(", ")) }
            })
            .collect::<Vec<_>>()
            .join("::"),
        Type::Reference(reference) => {
            let mutability = if reference.mutability.is_some() { "mut " } else { "" };
            format!("&{}{}", mutability, type_to_string(&reference.elem))
        }
        Type::Slice(slice) => format!("[{}]", type_to_string(&slice.elem)),
        Type::Array(array) => format!("[{}; {}]", type_to_string(&array.elem), array.len.to_token_stream()),
        Type::Tuple(tuple) => {
            let items: Vec<String> = tuple.elems.iter().map(type_to_string).collect();
            format!("({})", items.join(", "))
        }
        Type::Paren(inner) => type_to_string(&inner.elem),
        Type::Group(inner) => type_to_string(&inner.elem),
        other => other.to_token_stream().to_string(),
    }
}

/// The category a value ends up in once pointers, aliases and newtypes are
/// peeled away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SemanticType {
    Bool,
    Integer(IntegerType),
    Float32,
    Float64,
    String,
    Bytes,
    Time,
    Duration,
    /// Element type when it could be resolved.
    Array(Option<Box<SemanticType>>),
    /// A struct or enum, by name.
    Object(String),
}

impl SemanticType {
    pub fn category(&self) -> &'static str {
        match self {
            SemanticType::Bool => "bool",
            SemanticType::Integer(ty) if ty.is_wide() => "int64",
            SemanticType::Integer(_) => "int",
            SemanticType::Float32 => "float32",
            SemanticType::Float64 => "float64",
            SemanticType::String => "string",
            SemanticType::Bytes => "bytes",
            SemanticType::Time => "time",
            SemanticType::Duration => "duration",
            SemanticType::Array(_) => "array",
            SemanticType::Object(_) => "object",
        }
    }

    pub fn is_string_list(&self) -> bool {
        matches!(self, SemanticType::Array(Some(inner)) if **inner == SemanticType::String)
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, SemanticType::Integer(_))
    }
}

impl From<PrimitiveKind> for SemanticType {
    fn from(kind: PrimitiveKind) -> Self {
        match kind {
            PrimitiveKind::Bool => SemanticType::Bool,
            PrimitiveKind::Integer(ty) => SemanticType::Integer(ty),
            PrimitiveKind::Float32 => SemanticType::Float32,
            PrimitiveKind::Float64 => SemanticType::Float64,
            PrimitiveKind::String => SemanticType::String,
            PrimitiveKind::Bytes => SemanticType::Bytes,
            PrimitiveKind::Time => SemanticType::Time,
            PrimitiveKind::Duration => SemanticType::Duration,
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticType::Array(Some(inner)) => write!(f, "array of {inner}"),
            SemanticType::Integer(ty) => write!(f, "{ty}"),
            SemanticType::Object(name) => write!(f, "object `{name}`"),
            other => f.write_str(other.category()),
        }
    }
}
