//! Route path patterns: `/items/:id/` and `/files/*rest`.

use regex::Regex;

/// A compiled route pattern.
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    matcher: Regex,
    parameters: Vec<String>,
}

impl PathPattern {
    /// Compile `raw`. `:name` captures one segment, `*name` captures the
    /// rest of the path and a bare `*` matches it without capturing.
    pub fn compile(raw: &str) -> Result<Self, String> {
        if !raw.starts_with('/') {
            return Err("must start with '/'".to_string());
        }

        let mut expression = String::from("^");
        let mut parameters: Vec<String> = Vec::new();
        let segments: Vec<&str> = raw[1..].split('/').collect();
        for (index, segment) in segments.iter().enumerate() {
            expression.push('/');
            let is_last = index + 1 == segments.len();
            if let Some(name) = segment.strip_prefix(':') {
                check_name(name, &parameters)?;
                expression.push_str(&format!("(?P<{name}>[^/]+)"));
                parameters.push(name.to_string());
            } else if let Some(name) = segment.strip_prefix('*') {
                if !is_last {
                    return Err(format!("wildcard `{segment}` must be the last segment"));
                }
                if name.is_empty() {
                    expression.push_str(".*");
                } else {
                    check_name(name, &parameters)?;
                    expression.push_str(&format!("(?P<{name}>.*)"));
                    parameters.push(name.to_string());
                }
            } else {
                expression.push_str(&regex::escape(segment));
            }
        }
        expression.push('$');

        let matcher = Regex::new(&expression).map_err(|err| err.to_string())?;
        Ok(Self {
            raw: raw.to_string(),
            matcher,
            parameters,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Anchored regular expression equivalent to the pattern.
    pub fn regex(&self) -> &str {
        self.matcher.as_str()
    }

    /// Named segments in order of appearance.
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// Captured parameters when `path` matches.
    pub fn captures(&self, path: &str) -> Option<Vec<(String, String)>> {
        let captures = self.matcher.captures(path)?;
        Some(
            self.parameters
                .iter()
                .map(|name| {
                    let value = captures.name(name).map(|m| m.as_str()).unwrap_or_default();
                    (name.clone(), value.to_string())
                })
                .collect(),
        )
    }
}

fn check_name(name: &str, seen: &[String]) -> Result<(), String> {
    let mut chars = name.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(format!("invalid parameter name `{name}`"));
    }
    if seen.iter().any(|existing| existing == name) {
        return Err(format!("parameter `{name}` appears twice"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_named_segments() {
        let pattern = PathPattern::compile("/a/:x/:y/").unwrap();
        assert_eq!(pattern.parameters(), ["x", "y"]);
        assert_eq!(pattern.regex(), "^/a/(?P<x>[^/]+)/(?P<y>[^/]+)/$");
        assert_eq!(
            pattern.captures("/a/1/two/"),
            Some(vec![("x".into(), "1".into()), ("y".into(), "two".into())])
        );
        assert_eq!(pattern.captures("/a/1/"), None);
        assert_eq!(pattern.captures("/a/1/2/3/"), None);
    }

    #[test]
    fn wildcards_capture_the_rest() {
        let pattern = PathPattern::compile("/files/*path").unwrap();
        assert_eq!(pattern.parameters(), ["path"]);
        assert_eq!(
            pattern.captures("/files/a/b.txt"),
            Some(vec![("path".into(), "a/b.txt".into())])
        );

        let anonymous = PathPattern::compile("/static/*").unwrap();
        assert!(anonymous.parameters().is_empty());
        assert!(anonymous.captures("/static/css/site.css").is_some());
    }

    #[test]
    fn literal_segments_are_escaped() {
        let pattern = PathPattern::compile("/v1.0/items").unwrap();
        assert!(pattern.captures("/v1.0/items").is_some());
        assert!(pattern.captures("/v1x0/items").is_none());
    }

    #[test]
    fn rejects_bad_patterns() {
        assert!(PathPattern::compile("items/:id").is_err());
        assert!(PathPattern::compile("/a/:id/:id").is_err());
        assert!(PathPattern::compile("/a/:1x").is_err());
        assert!(PathPattern::compile("/a/*rest/b").is_err());
    }
}
