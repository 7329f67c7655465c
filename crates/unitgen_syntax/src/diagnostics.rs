//! Diagnostics and error reporting for target modules.
//!
//! [`CompileError`] is the plain error record produced by the lexer and parser. [`SyntaxReport`] bundles the
//! errors of one file with its source so `miette` can render them with source snippets.

use std::fmt;

use miette::{Diagnostic, GraphicalReportHandler, GraphicalTheme, LabeledSpan, NamedSource};

use crate::ast::Span;

/// A syntax-phase error with location information
#[derive(Debug, Clone, PartialEq)]
pub struct CompileError {
    pub message: String,
    pub span: Span,
    pub kind: ErrorKind,
    pub notes: Vec<String>,
    pub hints: Vec<String>,
}

impl CompileError {
    pub fn new(message: String, span: Span) -> Self {
        Self {
            message,
            span,
            kind: ErrorKind::Error,
            notes: Vec::new(),
            hints: Vec::new(),
        }
    }

    pub fn syntax(message: String, span: Span) -> Self {
        Self {
            kind: ErrorKind::Syntax,
            ..Self::new(message, span)
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hints.push(hint.into());
        self
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for CompileError {}

impl Diagnostic for CompileError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(match self.kind {
            ErrorKind::Error => "unitgen::lex",
            ErrorKind::Syntax => "unitgen::syntax",
        }))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        if self.hints.is_empty() && self.notes.is_empty() {
            return None;
        }
        let lines: Vec<String> = self
            .notes
            .iter()
            .map(|n| format!("note: {n}"))
            .chain(self.hints.iter().cloned())
            .collect();
        Some(Box::new(lines.join("\n")))
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let label = LabeledSpan::new_with_span(Some("here".to_string()), (self.span.start, self.span.len()));
        Some(Box::new(std::iter::once(label)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Lexical error (bad character, unterminated string, bad indentation).
    Error,
    Syntax,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Error => write!(f, "error"),
            ErrorKind::Syntax => write!(f, "syntax error"),
        }
    }
}

/// All syntax errors of one source file, renderable by `miette`.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("{file_name}: {} syntax error(s)", .errors.len())]
#[diagnostic(code(unitgen::syntax_report))]
pub struct SyntaxReport {
    file_name: String,
    #[source_code]
    source_code: NamedSource<String>,
    #[related]
    errors: Vec<CompileError>,
}

impl SyntaxReport {
    pub fn new(file_name: &str, source: &str, errors: Vec<CompileError>) -> Self {
        Self {
            file_name: file_name.to_string(),
            source_code: NamedSource::new(file_name, source.to_string()),
            errors,
        }
    }

    pub fn errors(&self) -> &[CompileError] {
        &self.errors
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

/// Render a diagnostic with source snippets and no colour.
pub fn render_report(diagnostic: &dyn Diagnostic) -> String {
    let mut out = String::new();
    let handler = GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor());
    if handler.render_report(&mut out, diagnostic).is_err() {
        // Fall back to the bare message; the formatter only fails on a broken writer.
        return diagnostic.to_string();
    }
    out
}

/// Get line number, column number, and line text for a byte offset
pub fn get_line_info(source: &str, offset: usize) -> (usize, usize, &str) {
    let offset = offset.min(source.len());
    let mut line_num = 1;
    let mut line_start = 0;

    for (i, c) in source.char_indices() {
        if i >= offset {
            break;
        }
        if c == '\n' {
            line_num += 1;
            line_start = i + 1;
        }
    }

    let line_end = source[line_start..]
        .find('\n')
        .map(|i| line_start + i)
        .unwrap_or(source.len());

    let line_text = &source[line_start..line_end];
    let col_num = offset - line_start + 1;

    (line_num, col_num, line_text)
}

/// One-line `file:line:col: message` rendering, used for compact logs.
pub fn format_short(file_name: &str, source: &str, error: &CompileError) -> String {
    let (line, col, _) = get_line_info(source, error.span.start);
    format!("{file_name}:{line}:{col}: {error}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_info() {
        let src = "a = 1\nb = (\n";
        assert_eq!(get_line_info(src, 0), (1, 1, "a = 1"));
        assert_eq!(get_line_info(src, 10), (2, 5, "b = ("));
    }

    #[test]
    fn test_format_short() {
        let err = CompileError::syntax("Expected ')'".to_string(), Span::new(6, 7));
        assert_eq!(
            format_short("m.py", "a = 1\nb = (\n", &err),
            "m.py:2:1: syntax error: Expected ')'"
        );
    }

    #[test]
    fn test_format_short_one_line_per_error() {
        let src = "def f(x)\n    pass\nx = )\n";
        let errors = [
            CompileError::syntax("Expected ':'".to_string(), Span::new(8, 9)),
            CompileError::syntax("Unexpected ')'".to_string(), Span::new(22, 23)),
        ];
        let lines: Vec<String> = errors.iter().map(|e| format_short("bad.py", src, e)).collect();
        insta::assert_snapshot!(lines.join("\n"), @r"
        bad.py:1:9: syntax error: Expected ':'
        bad.py:3:5: syntax error: Unexpected ')'
        ");
    }

    #[test]
    fn test_render_report_mentions_message_and_file() {
        let src = "def f(:\n    pass\n";
        let err = CompileError::syntax("Expected parameter name".to_string(), Span::new(6, 7))
            .with_hint("parameters are plain names");
        let report = SyntaxReport::new("bad.py", src, vec![err]);
        let rendered = render_report(&report);
        assert!(rendered.contains("bad.py"), "{rendered}");
        assert!(rendered.contains("Expected parameter name"), "{rendered}");
    }
}
