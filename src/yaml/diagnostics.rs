//! YAML error diagnostics with annotated source spans

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// YAML syntax error with source location
#[derive(Debug, Error, Diagnostic)]
#[error("YAML syntax error: {message}")]
#[diagnostic(code(mct::yaml::syntax))]
pub struct YamlSyntaxError {
    #[source_code]
    src: NamedSource<String>,

    #[label("error here")]
    span: SourceSpan,

    #[help]
    help: Option<String>,

    /// The underlying error message
    message: String,
}

impl YamlSyntaxError {
    /// Create a syntax error from a serde_yml error
    pub fn from_serde_error(err: &serde_yml::Error, source: &str, filename: &str) -> Self {
        let (line, column) = err
            .location()
            .map(|loc| (loc.line(), loc.column()))
            .unwrap_or((1, 1));

        let offset = line_col_to_offset(source, line, column);
        let message = err.to_string();
        let help = generate_help(&message);

        Self {
            src: NamedSource::new(filename, source.to_string()),
            span: SourceSpan::from(offset..offset.saturating_add(1)),
            help,
            message,
        }
    }
}

/// Generic YAML error wrapper
#[derive(Debug, Error, Diagnostic)]
pub enum YamlError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] YamlSyntaxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convert line/column to byte offset
fn line_col_to_offset(source: &str, line: usize, column: usize) -> usize {
    let mut current_line = 1;

    for (i, ch) in source.char_indices() {
        if current_line == line {
            return i + column.saturating_sub(1);
        }
        if ch == '\n' {
            current_line += 1;
        }
    }

    source.len().saturating_sub(1)
}

/// Suggest a fix for common YAML mistakes
fn generate_help(message: &str) -> Option<String> {
    if message.contains("mapping") && message.contains("scalar") {
        return Some("check indentation; a nested field may be mis-indented".to_string());
    }
    if message.contains("did not find expected") {
        return Some("an opening quote, bracket, or block may be unclosed".to_string());
    }
    if message.contains("duplicate") {
        return Some("the same key appears twice in this mapping".to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_carries_location() {
        let source = "id: DOC-1\ntitle: [unclosed\n";
        let err = serde_yml::from_str::<serde_yml::Value>(source).unwrap_err();
        let diag = YamlSyntaxError::from_serde_error(&err, source, "broken.mct.yaml");
        assert!(!diag.message.is_empty());
    }

    #[test]
    fn test_line_col_to_offset() {
        let source = "abc\ndef\n";
        assert_eq!(line_col_to_offset(source, 1, 1), 0);
        assert_eq!(line_col_to_offset(source, 2, 1), 4);
        assert_eq!(line_col_to_offset(source, 2, 3), 6);
    }
}
