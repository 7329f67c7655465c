//! Test-case lines: `name(args)` text into [`ParsedInvocation`]s.
//!
//! A case line starts with an identifier immediately followed by `(`. The closing parenthesis is found by
//! bracket matching over lexer tokens, so parentheses inside string literals never confuse the scan. The
//! text between the parentheses goes to [`eval::evaluate`]; anything after the closing parenthesis (an
//! expected value, a comment) is ignored.
//!
//! ## Notes
//! - Lines that do not parse are skipped, never fatal. [`parse_cases`] keeps the reason for each skip.
//! - A lexer error after the call (`f(1)) # it's`) does not spoil the line: the text before the error is
//!   scanned again.
//!
//! ## Examples
//! ```rust
//! use unitgen::cases;
//!
//! let call = cases::parse("add(1, 'x') -> 2").unwrap();
//! assert_eq!(call.function_name(), "add");
//! assert_eq!(call.to_string(), "add(1, 'x')");
//! assert!(cases::parse("print('hello'").is_none());
//! ```
//!
//! ## See also
//! - [`crate::harness`] – runs parsed invocations against a target module

pub mod eval;

use std::fmt;

use thiserror::Error;
use unitgen_core::lang::punctuation::{self, PunctuationId};
use unitgen_syntax::lexer::{self, Token, TokenKind};

use crate::runtime::Value;

pub use eval::{EvalError, EvalLimits, Namespace};

// ============================================================================
// Types
// ============================================================================

/// One function call recovered from a case line.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedInvocation {
    function_name: String,
    arguments: Vec<Value>,
}

impl ParsedInvocation {
    /// `None` unless `function_name` is an identifier.
    pub fn new(function_name: impl Into<String>, arguments: Vec<Value>) -> Option<Self> {
        let function_name = function_name.into();
        lexer::is_identifier(&function_name).then_some(Self {
            function_name,
            arguments,
        })
    }

    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }
}

/// Renders as the call would be written: `name(repr, repr)`.
impl fmt::Display for ParsedInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.function_name)?;
        for (i, arg) in self.arguments.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(&arg.repr())?;
        }
        f.write_str(")")
    }
}

/// Why a line produced no invocation.
#[derive(Debug, Clone, Error)]
pub enum SkipReason {
    #[error("blank line")]
    Blank,

    /// A Markdown code fence line (```` ``` ```` or ```` ```python ````).
    #[error("code fence")]
    Fence,

    #[error("not a call of the form name(args)")]
    NotACall,

    #[error("no matching ')'")]
    Unbalanced,

    #[error("lex error: {0}")]
    Lex(String),

    #[error("invalid arguments: {0}")]
    InvalidArguments(EvalError),
}

/// Outcome of scanning one line.
#[derive(Debug, Clone)]
pub enum CaseLine {
    Parsed(ParsedInvocation),
    Skipped(SkipReason),
}

/// A skipped line with its 1-based line number.
#[derive(Debug, Clone)]
pub struct SkippedLine {
    pub line_number: usize,
    pub text: String,
    pub reason: SkipReason,
}

/// Every line of a case text, scanned.
#[derive(Debug, Clone, Default)]
pub struct CaseBatch {
    invocations: Vec<ParsedInvocation>,
    skipped: Vec<SkippedLine>,
}

impl CaseBatch {
    /// Invocations in line order.
    pub fn invocations(&self) -> &[ParsedInvocation] {
        &self.invocations
    }

    /// Skipped non-blank lines in line order.
    pub fn skipped(&self) -> &[SkippedLine] {
        &self.skipped
    }

    pub fn into_invocations(self) -> Vec<ParsedInvocation> {
        self.invocations
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse one line with the default `math` namespace; `None` if the line is skipped.
pub fn parse(line: &str) -> Option<ParsedInvocation> {
    match parse_line(line, &Namespace::default()) {
        CaseLine::Parsed(invocation) => Some(invocation),
        CaseLine::Skipped(_) => None,
    }
}

/// Parse one line, reporting why it was skipped.
pub fn parse_line(line: &str, namespace: &Namespace) -> CaseLine {
    match scan_call(line.trim()) {
        Ok((name, arg_text)) => match eval::evaluate(arg_text, namespace) {
            Ok(arguments) => CaseLine::Parsed(ParsedInvocation {
                function_name: name.to_string(),
                arguments,
            }),
            Err(err) => {
                tracing::warn!(line, error = %err, "skipping case with invalid arguments");
                CaseLine::Skipped(SkipReason::InvalidArguments(err))
            }
        },
        Err(reason) => CaseLine::Skipped(reason),
    }
}

/// Parse every line of `text`. Blank and code-fence lines are dropped silently; other skips are logged and kept.
#[tracing::instrument(skip_all, fields(lines = text.lines().count()))]
pub fn parse_cases(text: &str, namespace: &Namespace) -> CaseBatch {
    let mut batch = CaseBatch::default();
    for (index, line) in text.lines().enumerate() {
        match parse_line(line, namespace) {
            CaseLine::Parsed(invocation) => batch.invocations.push(invocation),
            CaseLine::Skipped(SkipReason::Blank | SkipReason::Fence) => {}
            CaseLine::Skipped(reason) => {
                tracing::debug!(line_number = index + 1, %reason, "skipped case line");
                batch.skipped.push(SkippedLine {
                    line_number: index + 1,
                    text: line.to_string(),
                    reason,
                });
            }
        }
    }
    tracing::debug!(
        parsed = batch.invocations.len(),
        skipped = batch.skipped.len(),
        "parsed case lines"
    );
    batch
}

/// Find `name(` at the start of `line` and its matching `)`; returns the name and the text between.
fn scan_call(line: &str) -> Result<(&str, &str), SkipReason> {
    if line.is_empty() {
        return Err(SkipReason::Blank);
    }
    if line.starts_with("```") {
        return Err(SkipReason::Fence);
    }
    if !line.starts_with(lexer::is_ident_continue) {
        return Err(SkipReason::NotACall);
    }
    let errors = match lexer::lex(line) {
        Ok(tokens) => return match_call(line, &tokens),
        Err(errors) => errors,
    };

    // Retry with the text before the first error; if that fails too, the lex error is the reason.
    let first = errors.first();
    let message = first.map(|e| e.message.clone()).unwrap_or_default();
    let cut = first.map_or(0, |e| e.span.start);
    let prefix = line.get(..cut).map(str::trim_end).unwrap_or_default();
    let retried = match lexer::lex(prefix) {
        Ok(tokens) if !prefix.is_empty() => match_call(prefix, &tokens).ok(),
        _ => None,
    };
    retried.ok_or(SkipReason::Lex(message))
}

/// Bracket-match the tokens of `source` from the `(` after the leading identifier.
fn match_call<'s>(source: &'s str, tokens: &[Token]) -> Result<(&'s str, &'s str), SkipReason> {
    let tokens: Vec<&Token> = tokens.iter().filter(|t| !t.kind.is_layout()).collect();

    let name_len = match tokens.first().map(|t| &t.kind) {
        Some(TokenKind::Ident(name)) => name.len(),
        _ => return Err(SkipReason::NotACall),
    };
    let open = match tokens.get(1) {
        Some(t) if t.kind.is_punctuation(PunctuationId::LParen) && t.span.start == name_len => t,
        _ => return Err(SkipReason::NotACall),
    };

    let mut expected: Vec<PunctuationId> = Vec::new();
    for token in &tokens[1..] {
        let TokenKind::Punctuation(id) = token.kind else {
            continue;
        };
        if token.kind.is_open_bracket() {
            expected.extend(punctuation::closing_for(id));
        } else if token.kind.is_close_bracket() {
            if expected.pop() != Some(id) {
                return Err(SkipReason::Unbalanced);
            }
            if expected.is_empty() {
                let trailing = source[token.span.end..].trim();
                if !trailing.is_empty() {
                    tracing::debug!(trailing, "ignoring text after case call");
                }
                return Ok((&source[..name_len], &source[open.span.end..token.span.start]));
            }
        }
    }
    Err(SkipReason::Unbalanced)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skipped(line: &str) -> SkipReason {
        match parse_line(line, &Namespace::default()) {
            CaseLine::Skipped(reason) => reason,
            CaseLine::Parsed(invocation) => panic!("expected a skip, parsed {invocation}"),
        }
    }

    #[test]
    fn test_basic_call() {
        let call = parse("add(1, 2)").unwrap();
        assert_eq!(call.function_name(), "add");
        assert_eq!(call.arguments(), &[Value::Int(1), Value::Int(2)]);
        assert_eq!(call.to_string(), "add(1, 2)");
    }

    #[test]
    fn test_surrounding_whitespace_and_trailing_text() {
        let call = parse("   divide(10, 4)  # expect 2.5").unwrap();
        assert_eq!(call.to_string(), "divide(10, 4)");
        let call = parse("greet('Bob') == 'Hello, Bob!'").unwrap();
        assert_eq!(call.arguments(), &[Value::str("Bob")]);
    }

    #[test]
    fn test_parentheses_inside_strings() {
        let call = parse("count(')(', '(')").unwrap();
        assert_eq!(call.to_string(), "count(')(', '(')");
    }

    #[test]
    fn test_nested_brackets() {
        let call = parse("total([(1, 2), (3, 4)], {'k': [5]})").unwrap();
        assert_eq!(call.to_string(), "total([(1, 2), (3, 4)], {'k': [5]})");
    }

    #[test]
    fn test_no_arguments() {
        let call = parse("now()").unwrap();
        assert!(call.arguments().is_empty());
        assert_eq!(call.to_string(), "now()");
    }

    #[test]
    fn test_skip_reasons() {
        assert!(matches!(skipped(""), SkipReason::Blank));
        assert!(matches!(skipped("   "), SkipReason::Blank));
        assert!(matches!(skipped("Here are some tests:"), SkipReason::NotACall));
        assert!(matches!(skipped("assert add(1, 2) == 3"), SkipReason::NotACall));
        assert!(matches!(skipped("add (1, 2)"), SkipReason::NotACall));
        assert!(matches!(skipped("- add(1, 2)"), SkipReason::NotACall));
        assert!(matches!(skipped("add(1, 2"), SkipReason::Unbalanced));
        assert!(matches!(skipped("add(1, 2]"), SkipReason::Unbalanced));
        assert!(matches!(skipped("add(x)"), SkipReason::InvalidArguments(EvalError::DisallowedName(_))));
        assert!(matches!(skipped("add('unterminated)"), SkipReason::Lex(_)));
        assert!(matches!(skipped("```python"), SkipReason::Fence));
    }

    #[test]
    fn test_unicode_function_names() {
        let call = parse("café(1)").unwrap();
        assert_eq!(call.function_name(), "café");
        assert_eq!(call.to_string(), "café(1)");
        assert!(parse("größe('x') == 5").is_some());
        assert!(ParsedInvocation::new("π", vec![]).is_some());
        assert!(ParsedInvocation::new("1x", vec![]).is_none());
    }

    #[test]
    fn test_fenced_reply_lines_keep_their_numbers() {
        let text = "```python\nadd(1, 2)\noops\n```\n";
        let batch = parse_cases(text, &Namespace::default());
        assert_eq!(batch.invocations().len(), 1);
        let lines: Vec<usize> = batch.skipped().iter().map(|s| s.line_number).collect();
        assert_eq!(lines, [3]);
    }

    #[test]
    fn test_lex_error_after_call_is_ignored() {
        let call = parse("add(1, 2)) # it's fine").unwrap();
        assert_eq!(call.to_string(), "add(1, 2)");
    }

    #[test]
    fn test_parse_cases_keeps_order_and_skips() {
        let text = "Sure! Here are tests:\n\nadd(1, 2)\nadd(-1, x)\n  add(0, 0)\n";
        let batch = parse_cases(text, &Namespace::default());
        let rendered: Vec<String> = batch.invocations().iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["add(1, 2)", "add(0, 0)"]);
        let lines: Vec<usize> = batch.skipped().iter().map(|s| s.line_number).collect();
        assert_eq!(lines, [1, 4]);
    }

    #[test]
    fn test_constructor_validates_name() {
        assert!(ParsedInvocation::new("f_1", vec![]).is_some());
        assert!(ParsedInvocation::new("", vec![]).is_none());
        assert!(ParsedInvocation::new("a.b", vec![]).is_none());
    }
}
