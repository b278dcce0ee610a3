use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::AnnotationSyntaxError;

static SYMBOL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9_]*$").expect("symbol pattern is valid"));

/// Name of a directive, written as `@name` in doc comments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(name: impl Into<String>) -> Result<Self, AnnotationSyntaxError> {
        let name = name.into();
        if SYMBOL_PATTERN.is_match(&name) {
            Ok(Self(name))
        } else {
            Err(AnnotationSyntaxError::InvalidSymbol(name))
        }
    }

    /// Symbols of the bundled generators, which are known to be valid.
    pub(crate) fn builtin(name: &'static str) -> Self {
        debug_assert!(SYMBOL_PATTERN.is_match(name));
        Self(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The text that introduces the directive, e.g. `@datastore`.
    pub fn marker(&self) -> String {
        format!("@{}", self.0)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_identifiers() {
        assert_eq!(Symbol::new("datastore").unwrap().marker(), "@datastore");
        assert!(Symbol::new("api_v2").is_ok());
        assert!(Symbol::new("2fa").is_ok());
    }

    #[test]
    fn rejects_malformed_names() {
        for name in ["", "_hidden", "with space", "dash-ed", "@api"] {
            assert_eq!(
                Symbol::new(name),
                Err(AnnotationSyntaxError::InvalidSymbol(name.to_string())),
                "{name:?} should be rejected"
            );
        }
    }
}
