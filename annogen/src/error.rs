use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

pub use crate::format::FormatError;
use crate::package::SourceDeclaration;

/// Top-level error returned by a generator run.
#[derive(Debug, Error)]
pub enum Error {
    /// The package could not be read or parsed. Nothing was generated.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// One or more annotated declarations failed validation.
    #[error(transparent)]
    Invalid(#[from] MultiError),

    /// A template failed to render the validated specs.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// The rendered text is not valid Rust.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// An explicit import alias clashed with an existing one.
    #[error(transparent)]
    Dependency(#[from] DependencyError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Emit(#[from] EmitError),

    /// A type was requested by name but carries no matching directive.
    #[error("no @{symbol} directive found on type `{name}`")]
    TypeNotFound { symbol: String, name: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Fatal errors raised while loading a package.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}:{line}:{column}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("no Rust sources found in {}", .0.display())]
    NoSources(PathBuf),
}

/// A malformed directive or field tag on a single declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnnotationSyntaxError {
    #[error("invalid directive symbol `{0}`")]
    InvalidSymbol(String),

    #[error("unterminated quoted value starting at offset {offset}")]
    UnterminatedQuote { offset: usize },

    #[error("empty parameter name at offset {offset}")]
    EmptyKey { offset: usize },

    #[error("invalid parameter name `{0}`")]
    InvalidKey(String),

    #[error("parameter `{0}` given more than once")]
    DuplicateKey(String),

    #[error("@{symbol} appears more than once on the same declaration")]
    DuplicateDirective { symbol: String },

    #[error("malformed #[serde] attribute: {0}")]
    InvalidSerdeAttribute(String),
}

/// The reason a single annotated declaration could not become a spec.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpecErrorKind {
    #[error(transparent)]
    Syntax(#[from] AnnotationSyntaxError),

    #[error("@{symbol} must annotate {expected}")]
    WrongItem { symbol: String, expected: &'static str },

    #[error("unknown parameter `{0}`")]
    UnknownParameter(String),

    #[error("{what} is already generated for `{first}`")]
    Conflict { what: String, first: String },

    #[error("parameter `{0}` requires a value")]
    MissingValue(String),

    // entity
    #[error("multiple key fields: `{first}` and `{second}`")]
    MultipleKeyFields { first: String, second: String },

    #[error("missing key field")]
    MissingKeyField,

    #[error("multiple timestamp fields: `{first}` and `{second}`")]
    MultipleTimestampFields { first: String, second: String },

    #[error("missing timestamp field")]
    MissingTimestampField,

    #[error("key field `{field}` must be a string or integer, found {found}")]
    InvalidKeyType { field: String, found: String },

    #[error("timestamp field `{field}` must be a time value, found {found}")]
    InvalidTimestampType { field: String, found: String },

    #[error("field `{field}` has unsupported type `{ty}`")]
    UnsupportedFieldType { field: String, ty: String },

    #[error("field `{field}`: unknown ent option `{option}`")]
    UnknownEntOption { field: String, option: String },

    #[error("field `{field}`: invalid datastore tag `{tag}`")]
    InvalidDatastoreTag { field: String, tag: String },

    #[error("field `{field}`: {category} values cannot be indexed for search")]
    UnsupportedSearchType { field: String, category: String },

    #[error("field `{field}`: {category} values need a parser tag to be read from a form")]
    MissingFormParser { field: String, category: String },

    #[error("field `{field}`: invalid parser path `{path}`")]
    InvalidParser { field: String, path: String },

    #[error("field `{field}`: {category} values cannot have a default")]
    UnsupportedDefault { field: String, category: String },

    #[error("field `{field}`: default `{value}` is not a valid {category}: {reason}")]
    InvalidDefault {
        field: String,
        value: String,
        category: String,
        reason: String,
    },

    // route
    #[error("missing `path` parameter")]
    MissingPath,

    #[error("invalid path pattern `{pattern}`: {reason}")]
    InvalidPathPattern { pattern: String, reason: String },

    #[error("unknown method `{0}`")]
    UnknownMethod(String),

    #[error("cannot infer an HTTP method from function name `{0}`")]
    UnresolvableMethod(String),

    #[error("unknown format `{0}` (expected query, form or json)")]
    UnknownFormat(String),

    #[error("first parameter must be a Context")]
    MissingContext,

    #[error("path has {expected} parameter(s) but the function takes {found} string argument(s)")]
    ArityMismatch { expected: usize, found: usize },

    #[error("path parameter #{position} is `{expected}` but the argument is named `{found}`")]
    NameMismatch {
        position: usize,
        expected: String,
        found: String,
    },

    #[error("argument `{name}`: {reason}")]
    InvalidArgument { name: String, reason: String },

    #[error("function returns {0} values (at most 2 are supported)")]
    InvalidReturnArity(usize),

    #[error("second return value must be an error type, found `{0}`")]
    NotAnErrorType(String),

    #[error("field `{field}`: cannot resolve a terminal type ({chain})")]
    UnresolvableType { field: String, chain: String },

    // enum
    #[error("@enum type must be a tuple struct wrapping one integer")]
    EnumNotIntegerNewtype,

    #[error("the integer field is private to its module and invisible to generated code")]
    EnumFieldNotVisible,

    #[error("no constants of this type were found")]
    NoEnumConstants,

    #[error("constant `{constant}` must start with `{prefix}`")]
    MissingPrefix { constant: String, prefix: String },

    #[error("constant `{0}` must have an integer literal value")]
    NonIntegerValue(String),

    #[error("constants `{first}` and `{second}` share value {value}")]
    DuplicateEnumValue { value: i64, first: String, second: String },

    #[error("constants `{first}` and `{second}` both map to \"{text}\"")]
    DuplicateCanonical { text: String, first: String, second: String },
}

/// A validation failure pinned to the declaration that caused it.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}:{line}: {declaration}: {kind}", file.display())]
pub struct SpecError {
    pub declaration: String,
    pub file: PathBuf,
    pub line: usize,
    pub kind: SpecErrorKind,
}

impl SpecError {
    pub fn new(declaration: &SourceDeclaration, kind: SpecErrorKind) -> Self {
        Self {
            declaration: declaration.name.clone(),
            file: declaration.file.clone(),
            line: declaration.line,
            kind,
        }
    }
}

/// Every validation failure of one generator invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiError {
    errors: Vec<SpecError>,
}

impl MultiError {
    pub fn new<I>(errors: I) -> Self
    where
        I: IntoIterator<Item = SpecError>,
    {
        Self {
            errors: errors.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SpecError> {
        self.errors.iter()
    }

    pub fn into_inner(self) -> Vec<SpecError> {
        self.errors
    }
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.as_slice() {
            [single] => write!(f, "{single}"),
            errors => {
                write!(f, "{} errors occurred:", errors.len())?;
                for (index, error) in errors.iter().enumerate() {
                    write!(f, "\n  {}. {error}", index + 1)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for MultiError {}

impl IntoIterator for MultiError {
    type Item = SpecError;
    type IntoIter = std::vec::IntoIter<SpecError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

/// Template execution failed on already-validated data.
#[derive(Debug, Error)]
#[error("failed to render template `{template}`")]
pub struct RenderError {
    pub template: String,
    #[source]
    pub source: minijinja::Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DependencyError {
    #[error("alias `{alias}` is already bound to `{existing}`, cannot bind it to `{requested}`")]
    AliasConflict {
        alias: String,
        existing: String,
        requested: String,
    },

    #[error("`{path}` is already imported as `{existing}`, cannot import it as `{requested}`")]
    PathConflict {
        path: String,
        existing: String,
        requested: String,
    },

    #[error("invalid import path `{0}`")]
    InvalidPath(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// A generated artifact could not be written.
#[derive(Debug, Error)]
#[error("failed to write {}: {source}", path.display())]
pub struct EmitError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}
