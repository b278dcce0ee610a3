use std::iter::Peekable;
use std::str::CharIndices;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::AnnotationSyntaxError;

static KEY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("parameter key pattern is valid"));

/// Ordered parameters of one directive: `key=value`, `key="quoted value"`
/// or a bare `flag` without a value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, Option<String>)>,
}

impl Params {
    pub fn parse(input: &str) -> Result<Self, AnnotationSyntaxError> {
        let mut params = Params::default();
        let mut chars = input.char_indices().peekable();

        loop {
            while chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
            let Some(&(start, _)) = chars.peek() else {
                break;
            };

            let mut key = String::new();
            while let Some((_, c)) = chars.next_if(|(_, c)| !c.is_whitespace() && *c != '=') {
                key.push(c);
            }
            if key.is_empty() {
                return Err(AnnotationSyntaxError::EmptyKey { offset: start });
            }
            if !KEY_PATTERN.is_match(&key) {
                return Err(AnnotationSyntaxError::InvalidKey(key));
            }

            let value = if chars.next_if(|(_, c)| *c == '=').is_some() {
                Some(parse_value(&mut chars)?)
            } else {
                None
            };

            if params.contains(&key) {
                return Err(AnnotationSyntaxError::DuplicateKey(key));
            }
            params.entries.push((key, value));
        }

        Ok(params)
    }

    /// Value of `key`; `None` for missing keys and valueless flags.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == key)
            .and_then(|(_, value)| value.as_deref())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(name, _)| name == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_value(chars: &mut Peekable<CharIndices<'_>>) -> Result<String, AnnotationSyntaxError> {
    let mut value = String::new();
    let Some((offset, _)) = chars.next_if(|(_, c)| *c == '"') else {
        while let Some((_, c)) = chars.next_if(|(_, c)| !c.is_whitespace()) {
            value.push(c);
        }
        return Ok(value);
    };

    loop {
        match chars.next() {
            Some((_, '"')) => return Ok(value),
            Some((_, '\\')) => match chars.next() {
                Some((_, escaped)) => value.push(escaped),
                None => return Err(AnnotationSyntaxError::UnterminatedQuote { offset }),
            },
            Some((_, c)) => value.push(c),
            None => return Err(AnnotationSyntaxError::UnterminatedQuote { offset }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_values_quotes_and_flags() {
        let params = Params::parse(r#"path=/items/:id/ title="All items" cached method=GET"#).unwrap();
        assert_eq!(params.len(), 4);
        assert_eq!(params.get("path"), Some("/items/:id/"));
        assert_eq!(params.get("title"), Some("All items"));
        assert_eq!(params.get("cached"), None);
        assert!(params.contains("cached"));
        assert!(!params.contains("format"));

        let keys: Vec<_> = params.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, ["path", "title", "cached", "method"]);
    }

    #[test]
    fn quoted_values_support_escapes() {
        let params = Params::parse(r#"label="say \"hi\" \\ bye""#).unwrap();
        assert_eq!(params.get("label"), Some(r#"say "hi" \ bye"#));
    }

    #[test]
    fn empty_input_has_no_params() {
        assert!(Params::parse("   ").unwrap().is_empty());
    }

    #[test]
    fn explicit_empty_value_is_kept() {
        let params = Params::parse("kind= flag").unwrap();
        assert_eq!(params.get("kind"), Some(""));
        assert!(params.contains("flag"));
    }

    #[test]
    fn malformed_strings_are_rejected() {
        assert_eq!(
            Params::parse(r#"kind="Config"#),
            Err(AnnotationSyntaxError::UnterminatedQuote { offset: 5 })
        );
        assert_eq!(
            Params::parse("a=1 =2"),
            Err(AnnotationSyntaxError::EmptyKey { offset: 4 })
        );
        assert_eq!(
            Params::parse("ki*nd=x"),
            Err(AnnotationSyntaxError::InvalidKey("ki*nd".to_string()))
        );
        assert_eq!(
            Params::parse("kind=A kind=B"),
            Err(AnnotationSyntaxError::DuplicateKey("kind".to_string()))
        );
    }
}
