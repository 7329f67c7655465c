//! String scanning for the lexer
//!
//! Handles plain strings, raw strings (`r''`), f-strings (`f''`, `rf''`), single- or triple-quoted.

use super::tokens::{FStringPart, TokenKind};
use super::{Lexer, StringPrefix};

// ============================================================================
// Escape sequence handling
// ============================================================================

/// Result of processing an escape sequence
enum EscapeResult {
    /// Successfully parsed escape character
    Char(char),
    /// Backslash-newline: the line break is dropped
    Continuation,
    /// Unknown escape - preserve as-is (backslash + char)
    Unknown(char),
    /// Malformed `\x`/`\u` escape
    Invalid(String),
    /// End of input during escape
    Eof,
}

impl<'a> Lexer<'a> {
    /// Detect an `r`/`f`/`rf`/`fr` prefix. `first` has already been consumed.
    pub(super) fn string_prefix(&self, first: char) -> Option<StringPrefix> {
        let flag = |c: char| match c {
            'r' | 'R' => Some(StringPrefix {
                raw: true,
                format: false,
            }),
            'f' | 'F' => Some(StringPrefix {
                raw: false,
                format: true,
            }),
            _ => None,
        };
        let is_quote = |c: Option<char>| matches!(c, Some('"' | '\''));

        let one = flag(first)?;
        if is_quote(self.peek_at(0)) {
            return Some(one);
        }
        let two = self.peek_at(0).and_then(flag)?;
        if two.raw != one.raw && is_quote(self.peek_at(1)) {
            return Some(StringPrefix {
                raw: true,
                format: true,
            });
        }
        None
    }

    /// Scan a string whose prefix letters start at `start` (the first letter is already consumed).
    pub(super) fn scan_prefixed_string(&mut self, start: usize, prefix: StringPrefix) {
        // Consume the optional second prefix letter.
        if self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
            self.advance();
        }
        match self.advance() {
            Some(quote @ ('"' | '\'')) => self.scan_string(start, quote, prefix),
            _ => self.error("Expected string after prefix", start),
        }
    }

    /// Process an escape sequence. Called after consuming the backslash.
    fn scan_text_escape(&mut self) -> EscapeResult {
        match self.advance() {
            Some('n') => EscapeResult::Char('\n'),
            Some('t') => EscapeResult::Char('\t'),
            Some('r') => EscapeResult::Char('\r'),
            Some('0') => EscapeResult::Char('\0'),
            Some('a') => EscapeResult::Char('\x07'),
            Some('b') => EscapeResult::Char('\x08'),
            Some('f') => EscapeResult::Char('\x0c'),
            Some('v') => EscapeResult::Char('\x0b'),
            Some('\\') => EscapeResult::Char('\\'),
            Some('\'') => EscapeResult::Char('\''),
            Some('"') => EscapeResult::Char('"'),
            Some('\n') => EscapeResult::Continuation,
            Some('x') => self.scan_hex_escape(2),
            Some('u') => self.scan_hex_escape(4),
            Some('U') => self.scan_hex_escape(8),
            Some(c) => EscapeResult::Unknown(c),
            None => EscapeResult::Eof,
        }
    }

    fn scan_hex_escape(&mut self, digits: usize) -> EscapeResult {
        let mut hex = String::new();
        for _ in 0..digits {
            match self.peek() {
                Some(c) if c.is_ascii_hexdigit() => {
                    hex.push(c);
                    self.advance();
                }
                _ => return EscapeResult::Invalid(hex),
            }
        }
        u32::from_str_radix(&hex, 16)
            .ok()
            .and_then(char::from_u32)
            .map(EscapeResult::Char)
            .unwrap_or(EscapeResult::Invalid(hex))
    }
}

// ============================================================================
// String scanning
// ============================================================================

impl<'a> Lexer<'a> {
    /// Scan a string body. The opening quote has been consumed.
    pub(super) fn scan_string(&mut self, start: usize, quote: char, prefix: StringPrefix) {
        // Check for triple-quoted string
        let triple = if self.peek() == Some(quote) && self.peek_next() == Some(quote) {
            self.advance();
            self.advance();
            true
        } else {
            false
        };

        let mut value = String::new();
        let mut parts = Vec::new();

        loop {
            match self.peek() {
                None => {
                    self.error("Unterminated string", start);
                    break;
                }
                Some(c) if c == quote => {
                    self.advance();
                    if !triple {
                        break;
                    }
                    if self.peek() == Some(quote) && self.peek_next() == Some(quote) {
                        self.advance();
                        self.advance();
                        break;
                    }
                    value.push(quote);
                }
                Some('\n') if !triple => {
                    self.error("Unterminated string (newline in single-quoted string)", start);
                    break;
                }
                Some('\\') => {
                    self.advance();
                    if prefix.raw {
                        // Raw strings keep the backslash; an escaped quote still does not terminate.
                        value.push('\\');
                        if let Some(c) = self.advance() {
                            value.push(c);
                        }
                        continue;
                    }
                    match self.scan_text_escape() {
                        EscapeResult::Char(c) => value.push(c),
                        EscapeResult::Continuation => {}
                        EscapeResult::Unknown(c) => {
                            value.push('\\');
                            value.push(c);
                        }
                        EscapeResult::Invalid(hex) => {
                            self.error(format!("Invalid escape sequence: \\{}", hex), start);
                        }
                        EscapeResult::Eof => {
                            self.error("Unterminated escape sequence", start);
                            break;
                        }
                    }
                }
                Some('{') if prefix.format => {
                    self.advance();
                    if self.match_char('{') {
                        // Escaped brace
                        value.push('{');
                    } else {
                        if !value.is_empty() {
                            parts.push(FStringPart::Literal(std::mem::take(&mut value)));
                        }
                        let offset = self.current_pos;
                        match self.scan_fstring_expr(quote, triple) {
                            Some(text) => parts.push(FStringPart::Expr { text, offset }),
                            None => {
                                self.error("Unterminated expression in f-string", start);
                                break;
                            }
                        }
                    }
                }
                Some('}') if prefix.format => {
                    self.advance();
                    if self.match_char('}') {
                        value.push('}');
                    } else {
                        self.error("Single '}' is not allowed in f-string", start);
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }

        if prefix.format {
            if !value.is_empty() {
                parts.push(FStringPart::Literal(value));
            }
            self.add_token(TokenKind::FString(parts), start);
        } else {
            self.add_token(TokenKind::String(value), start);
        }
    }

    /// Scan the text of an f-string replacement field up to its closing `}`.
    ///
    /// Returns `None` if the field runs into the end of the string.
    fn scan_fstring_expr(&mut self, quote: char, triple: bool) -> Option<String> {
        let mut expr = String::new();
        let mut depth = 0usize;
        let mut in_string: Option<char> = None;

        loop {
            let c = self.peek()?;
            if let Some(q) = in_string {
                if c == q {
                    in_string = None;
                }
                expr.push(c);
                self.advance();
                continue;
            }
            match c {
                '\n' if !triple => return None,
                c if c == quote => return None,
                '\'' | '"' => {
                    in_string = Some(c);
                    expr.push(c);
                }
                '(' | '[' | '{' => {
                    depth += 1;
                    expr.push(c);
                }
                ')' | ']' => {
                    depth = depth.saturating_sub(1);
                    expr.push(c);
                }
                '}' if depth == 0 => {
                    self.advance();
                    return Some(expr);
                }
                '}' => {
                    depth -= 1;
                    expr.push(c);
                }
                _ => expr.push(c),
            }
            self.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::lexer::{FStringPart, TokenKind, lex};

    fn first(src: &str) -> TokenKind {
        lex(src).unwrap().remove(0).kind
    }

    #[test]
    fn test_quotes_and_escapes() {
        assert_eq!(first(r#""a\tb""#), TokenKind::String("a\tb".to_string()));
        assert_eq!(first(r#"'it\'s'"#), TokenKind::String("it's".to_string()));
        assert_eq!(first(r#"'\x41é'"#), TokenKind::String("Aé".to_string()));
        assert_eq!(first(r#"'\d'"#), TokenKind::String("\\d".to_string()));
    }

    #[test]
    fn test_triple_quoted() {
        assert_eq!(
            first("\"\"\"line one\nline \"two\" end\"\"\""),
            TokenKind::String("line one\nline \"two\" end".to_string())
        );
    }

    #[test]
    fn test_raw_string_keeps_backslashes() {
        assert_eq!(first(r#"r'\n\''"#), TokenKind::String("\\n\\'".to_string()));
    }

    #[test]
    fn test_fstring_parts() {
        let TokenKind::FString(parts) = first("f'x={x + 1}, {{ok}} {d[\"k\"]}'") else {
            panic!("expected f-string");
        };
        assert_eq!(parts[0], FStringPart::Literal("x=".to_string()));
        assert_eq!(
            parts[1],
            FStringPart::Expr {
                text: "x + 1".to_string(),
                offset: 5
            }
        );
        assert_eq!(parts[2], FStringPart::Literal(", {ok} ".to_string()));
        assert!(matches!(&parts[3], FStringPart::Expr { text, .. } if text == "d[\"k\"]"));
    }

    #[test]
    fn test_prefix_letters_alone_are_identifiers() {
        assert_eq!(first("rf"), TokenKind::Ident("rf".to_string()));
        assert_eq!(first("f"), TokenKind::Ident("f".to_string()));
    }

    #[test]
    fn test_unterminated() {
        assert!(lex("'abc").is_err());
        assert!(lex("'abc\n'").is_err());
        assert!(lex("f'{x'").is_err());
    }
}
