//! Verifies rendered text parses as Rust and pretty-prints it.

use std::fmt::Write as _;

use thiserror::Error;

/// Lines shown before and after the failing line in [`FormatError::source_with_lines`].
const CONTEXT_BEFORE: usize = 5;
const CONTEXT_AFTER: usize = 3;
/// Lines shown when the failure has no position.
const HEAD_LINES: usize = 10;

/// Rendered text that is not valid Rust. Never written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("generated code does not parse{}: {message}", position(*line, *column))]
pub struct FormatError {
    pub message: String,
    /// 1-based line of the failure when known.
    pub line: Option<usize>,
    /// 1-based column of the failure when known.
    pub column: Option<usize>,
    /// The unformatted text.
    pub text: String,
}

fn position(line: Option<usize>, column: Option<usize>) -> String {
    match (line, column) {
        (Some(line), Some(column)) => format!(" at {line}:{column}"),
        (Some(line), None) => format!(" at line {line}"),
        _ => String::new(),
    }
}

impl FormatError {
    /// Numbered listing of the text with the failing line marked `!`.
    ///
    /// Unless `full` is set only a window around the failure is shown, or
    /// the first lines when the position is unknown.
    pub fn source_with_lines(&self, full: bool) -> String {
        let lines: Vec<&str> = self.text.lines().collect();
        let width = lines.len().max(1).to_string().len();
        let failing = self.line.filter(|&line| line > 0);

        let (first, last) = if full {
            (1, lines.len())
        } else {
            match failing {
                Some(line) => (
                    line.saturating_sub(CONTEXT_BEFORE).max(1),
                    (line + CONTEXT_AFTER).min(lines.len()),
                ),
                None => (1, HEAD_LINES.min(lines.len())),
            }
        };

        let mut listing = String::new();
        for number in first..=last {
            let Some(text) = lines.get(number - 1) else {
                break;
            };
            let mark = if Some(number) == failing { '!' } else { ' ' };
            let _ = writeln!(listing, "{mark} {number:>width$} | {text}");
        }
        listing
    }
}

/// Parse `text` as a Rust file and return it pretty-printed.
pub fn format_source(text: &str) -> Result<String, FormatError> {
    match syn::parse_file(text) {
        Ok(file) => Ok(prettyplease::unparse(&file)),
        Err(err) => {
            let start = err.span().start();
            let known = start.line > 0;
            Err(FormatError {
                message: err.to_string(),
                line: known.then_some(start.line),
                column: known.then_some(start.column + 1),
                text: text.to_string(),
            })
        }
    }
}
