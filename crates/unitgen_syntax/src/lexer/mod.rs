//! Lexer for unitgen target modules and case lines.
//!
//! Handles tokenization including:
//! - Keywords (def, class, lambda, try, etc.)
//! - Identifiers and literals (int, float, string, raw string, f-string)
//! - Operators and punctuation
//! - Indentation-based blocks (INDENT/DEDENT tokens)
//!
//! ## Module Structure
//!
//! - `tokens` - Token types (TokenKind, Token, FStringPart)
//! - `strings` - String/raw-string/f-string scanning
//! - `numbers` - Numeric literal scanning
//! - `indent` - INDENT/DEDENT handling

mod indent;
mod numbers;
mod strings;
pub mod tokens;

pub use tokens::{FStringPart, Token, TokenKind, keyword_id};

use crate::ast::Span;
use crate::diagnostics::CompileError;
use unitgen_core::lang::operators::OperatorId;
use unitgen_core::lang::punctuation::PunctuationId;
use unicode_xid::UnicodeXID;

// ============================================================================
// LEXER STATE
// ----------------------------------------------------------------------------
// Lexer state diagram (simplified):
//
// [Start of line] → count spaces → [Inside code]
//                                       ↓
//                                      see '(' → [bracket_depth++]
//                                       ↓
//                                      see '\n' → skip (inside brackets)
//                                       ↓
//                                      see ')' → [bracket_depth--]
// ============================================================================

/// Lexer for Python-subset source code.
///
/// Converts source text into a stream of tokens, handling:
/// - Keywords and identifiers
/// - Numeric and string literals (including raw strings and f-strings)
/// - Operators and punctuation
/// - Python-style indentation (INDENT/DEDENT tokens)
/// - Implicit line continuation inside brackets, explicit continuation with `\`
pub struct Lexer<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    current_pos: usize,
    indent_stack: Vec<usize>,
    pending_dedents: usize,
    at_line_start: bool,
    /// Bracket depth for implicit line continuation (parens, brackets, braces)
    bracket_depth: usize,
    tokens: Vec<Token>,
    errors: Vec<CompileError>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source code.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            current_pos: 0,
            indent_stack: vec![0],
            pending_dedents: 0,
            at_line_start: true,
            bracket_depth: 0,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Tokenize the entire source code.
    ///
    /// Returns a vector of tokens on success, or a vector of errors on failure.
    /// The token stream always ends with an `Eof` token, preceded by a `Newline` if the last line had content.
    pub fn tokenize(mut self) -> Result<Vec<Token>, Vec<CompileError>> {
        while !self.is_at_end() || self.pending_dedents > 0 {
            self.scan_token();
        }

        // Terminate a last line that has no trailing newline.
        if !matches!(
            self.tokens.last().map(|t| &t.kind),
            None | Some(TokenKind::Newline) | Some(TokenKind::Dedent) | Some(TokenKind::Indent)
        ) {
            self.tokens.push(Token::new(
                TokenKind::Newline,
                Span::new(self.current_pos, self.current_pos),
            ));
        }

        // Emit remaining dedents at EOF
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            self.tokens.push(Token::new(
                TokenKind::Dedent,
                Span::new(self.current_pos, self.current_pos),
            ));
        }

        self.tokens.push(Token::new(
            TokenKind::Eof,
            Span::new(self.current_pos, self.current_pos),
        ));

        if self.errors.is_empty() {
            Ok(self.tokens)
        } else {
            Err(self.errors)
        }
    }

    // ========================================================================
    // Core character handling
    // ========================================================================

    fn is_at_end(&mut self) -> bool {
        self.chars.peek().is_none()
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn peek_next(&self) -> Option<char> {
        let mut iter = self.source[self.current_pos..].chars();
        iter.next(); // skip current
        iter.next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.source[self.current_pos..].chars().nth(n)
    }

    fn advance(&mut self) -> Option<char> {
        if let Some((pos, c)) = self.chars.next() {
            self.current_pos = pos + c.len_utf8();
            Some(c)
        } else {
            None
        }
    }

    fn error(&mut self, message: impl Into<String>, start: usize) {
        self.errors
            .push(CompileError::new(message.into(), Span::new(start, self.current_pos)));
    }

    // ========================================================================
    // Main scanning dispatch
    // ========================================================================

    fn scan_token(&mut self) {
        // Handle pending dedents first
        if self.pending_dedents > 0 {
            self.pending_dedents -= 1;
            self.tokens.push(Token::new(
                TokenKind::Dedent,
                Span::new(self.current_pos, self.current_pos),
            ));
            return;
        }

        // Handle indentation at line start
        if self.at_line_start && self.bracket_depth == 0 {
            self.handle_indentation();
            return;
        }

        // Skip whitespace (but not newlines)
        while let Some(c) = self.peek() {
            if c == ' ' || c == '\t' || c == '\x0c' {
                self.advance();
            } else {
                break;
            }
        }

        let start = self.current_pos;

        let Some(c) = self.advance() else {
            return;
        };

        match c {
            // Comments
            '#' => {
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
            }

            // Newlines
            '\n' => {
                // Implicit line continuation: skip newlines inside brackets
                if self.bracket_depth > 0 {
                    return;
                }
                self.tokens
                    .push(Token::new(TokenKind::Newline, Span::new(start, self.current_pos)));
                self.at_line_start = true;
            }

            // Skip carriage return
            '\r' => {}

            // Explicit line continuation
            '\\' => {
                if self.peek() == Some('\r') {
                    self.advance();
                }
                if !self.match_char('\n') {
                    self.error("Unexpected character after line continuation character", start);
                }
            }

            // Operators and punctuation
            '+' => self.operator(start, OperatorId::Plus, &[('=', OperatorId::PlusEq)]),
            '-' => {
                if self.match_char('>') {
                    self.add_punct(PunctuationId::Arrow, start);
                } else if self.match_char('=') {
                    self.add_op(OperatorId::MinusEq, start);
                } else {
                    self.add_op(OperatorId::Minus, start);
                }
            }
            '*' => self.operator(
                start,
                OperatorId::Star,
                &[('*', OperatorId::StarStar), ('=', OperatorId::StarEq)],
            ),
            '/' => self.scan_slash(start),
            '%' => self.operator(start, OperatorId::Percent, &[('=', OperatorId::PercentEq)]),
            '@' => self.add_punct(PunctuationId::At, start),
            ',' => self.add_punct(PunctuationId::Comma, start),
            ';' => self.add_punct(PunctuationId::Semicolon, start),
            ':' => self.add_punct(PunctuationId::Colon, start),
            '(' => self.open_bracket(PunctuationId::LParen, start),
            ')' => self.close_bracket(PunctuationId::RParen, start),
            '[' => self.open_bracket(PunctuationId::LBracket, start),
            ']' => self.close_bracket(PunctuationId::RBracket, start),
            '{' => self.open_bracket(PunctuationId::LBrace, start),
            '}' => self.close_bracket(PunctuationId::RBrace, start),
            '=' => self.operator(start, OperatorId::Eq, &[('=', OperatorId::EqEq)]),
            '!' => {
                if self.match_char('=') {
                    self.add_op(OperatorId::NotEq, start);
                } else {
                    self.error("Unexpected character '!'", start);
                }
            }
            '<' => self.operator(start, OperatorId::Lt, &[('=', OperatorId::LtEq)]),
            '>' => self.operator(start, OperatorId::Gt, &[('=', OperatorId::GtEq)]),
            '.' => {
                if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.scan_number(start, c);
                } else if self.peek() == Some('.') && self.peek_next() == Some('.') {
                    self.advance();
                    self.advance();
                    self.add_punct(PunctuationId::Ellipsis, start);
                } else {
                    self.add_punct(PunctuationId::Dot, start);
                }
            }

            // Strings
            '"' | '\'' => self.scan_string(start, c, StringPrefix::default()),

            // Numbers
            '0'..='9' => self.scan_number(start, c),

            // Identifiers, keywords and prefixed strings (r'', f'', rf'')
            _ if is_ident_start(c) => {
                if let Some(prefix) = self.string_prefix(c) {
                    self.scan_prefixed_string(start, prefix);
                } else {
                    self.scan_identifier(start);
                }
            }

            _ => {
                self.error(format!("Unexpected character '{}'", c), start);
            }
        }
    }

    // ========================================================================
    // Operator helpers
    // ========================================================================

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn add_token(&mut self, kind: TokenKind, start: usize) {
        self.tokens.push(Token::new(kind, Span::new(start, self.current_pos)));
    }

    fn add_op(&mut self, id: OperatorId, start: usize) {
        self.add_token(TokenKind::Operator(id), start);
    }

    fn add_punct(&mut self, id: PunctuationId, start: usize) {
        self.add_token(TokenKind::Punctuation(id), start);
    }

    /// Try to match compound operator, fallback to simple.
    fn operator(&mut self, start: usize, simple: OperatorId, compounds: &[(char, OperatorId)]) {
        for (c, id) in compounds {
            if self.match_char(*c) {
                self.add_op(*id, start);
                return;
            }
        }
        self.add_op(simple, start);
    }

    /// Scan slash operators: `/`, `/=`, `//`, `//=`.
    fn scan_slash(&mut self, start: usize) {
        if self.match_char('/') {
            if self.match_char('=') {
                self.add_op(OperatorId::SlashSlashEq, start);
            } else {
                self.add_op(OperatorId::SlashSlash, start);
            }
        } else if self.match_char('=') {
            self.add_op(OperatorId::SlashEq, start);
        } else {
            self.add_op(OperatorId::Slash, start);
        }
    }

    /// Emit a bracket token and track bracket depth.
    fn open_bracket(&mut self, kind: PunctuationId, start: usize) {
        self.bracket_depth += 1;
        self.add_punct(kind, start);
    }

    /// Emit a closing bracket token and decrement bracket depth.
    /// Produces an error if there's no matching opening bracket.
    fn close_bracket(&mut self, kind: PunctuationId, start: usize) {
        if self.bracket_depth == 0 {
            self.error("Unmatched closing bracket", start);
        } else {
            self.bracket_depth -= 1;
        }
        self.add_punct(kind, start);
    }

    // ========================================================================
    // Identifier scanning
    // ========================================================================

    fn scan_identifier(&mut self, start: usize) {
        while let Some(c) = self.peek() {
            if is_ident_continue(c) {
                self.advance();
            } else {
                break;
            }
        }

        let spelling = &self.source[start..self.current_pos];

        // Look up identifier spelling in the reserved-word registry (no allocation for keywords).
        if let Some(id) = keyword_id(spelling) {
            self.add_token(TokenKind::Keyword(id), start);
        } else {
            self.add_token(TokenKind::Ident(spelling.to_string()), start);
        }
    }
}

/// String literal prefix flags (`r`, `f`, or both).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct StringPrefix {
    pub raw: bool,
    pub format: bool,
}

// ============================================================================
// Helper functions
// ============================================================================

/// Check if a character can start an identifier (`_` or Unicode `XID_Start`).
pub fn is_ident_start(c: char) -> bool {
    c == '_' || UnicodeXID::is_xid_start(c)
}

/// Check if a character can continue an identifier (Unicode `XID_Continue`, which includes `_`).
pub fn is_ident_continue(c: char) -> bool {
    UnicodeXID::is_xid_continue(c)
}

/// `true` if all of `text` is one identifier.
pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars.next().is_some_and(is_ident_start) && chars.all(is_ident_continue)
}

/// Convenience function to lex a source string.
///
/// This is a shorthand for `Lexer::new(source).tokenize()`.
#[tracing::instrument(skip_all, fields(source_len = source.len()))]
pub fn lex(source: &str) -> Result<Vec<Token>, Vec<CompileError>> {
    Lexer::new(source).tokenize()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use unitgen_core::lang::keywords::KeywordId;

    fn kinds(src: &str) -> Vec<TokenKind> {
        lex(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_punctuation_registry_parity() {
        use unitgen_core::lang::punctuation::{self, closing_for};

        for p in punctuation::PUNCTUATION {
            if let Some(close) = closing_for(p.id) {
                let src = format!("{}{}", p.canonical, punctuation::as_str(close));
                let tokens = lex(&src).unwrap();
                assert!(tokens[0].kind.is_punctuation(p.id));
                assert!(tokens[1].kind.is_punctuation(close));
                continue;
            }
            if matches!(
                p.id,
                PunctuationId::RParen | PunctuationId::RBracket | PunctuationId::RBrace
            ) {
                // Covered by the opening delimiter above.
                continue;
            }
            let tokens = lex(p.canonical).unwrap_or_else(|errs| panic!("lex({:?}) failed: {:?}", p.canonical, errs));
            assert!(tokens[0].kind.is_punctuation(p.id), "{:?}", tokens);
        }
    }

    #[test]
    fn test_keyword_registry_parity() {
        use unitgen_core::lang::keywords;

        for k in keywords::KEYWORDS {
            let tokens = lex(k.canonical).unwrap_or_else(|errs| panic!("lex({:?}) failed: {:?}", k.canonical, errs));
            // keyword, NEWLINE, EOF
            assert_eq!(tokens.len(), 3, "{:?}", tokens);
            assert!(tokens[0].kind.is_keyword(k.id));
        }
    }

    #[test]
    fn test_operator_registry_parity() {
        use unitgen_core::lang::operators;

        for o in operators::OPERATORS {
            for &sp in o.spellings {
                let tokens = lex(sp).unwrap_or_else(|errs| panic!("lex({:?}) failed: {:?}", sp, errs));
                assert_eq!(tokens.len(), 3, "expected token + NEWLINE + EOF for {:?}, got {:?}", sp, tokens);

                if o.is_keyword_spelling {
                    // Word operators are lexed as keywords.
                    let expected_kw = match o.id {
                        OperatorId::And => KeywordId::And,
                        OperatorId::Or => KeywordId::Or,
                        OperatorId::Not => KeywordId::Not,
                        OperatorId::In => KeywordId::In,
                        OperatorId::Is => KeywordId::Is,
                        _ => panic!("unexpected keyword-spelling operator {:?}", o.id),
                    };
                    assert!(tokens[0].kind.is_keyword(expected_kw));
                } else {
                    assert!(tokens[0].kind.is_operator(o.id));
                }
            }
        }
    }

    #[test]
    fn test_keywords_and_identifiers() {
        let k = kinds("def lambda_ True x1");
        assert!(matches!(k[0], TokenKind::Keyword(KeywordId::Def)));
        assert_eq!(k[1], TokenKind::Ident("lambda_".to_string()));
        assert!(matches!(k[2], TokenKind::Keyword(KeywordId::True)));
        assert_eq!(k[3], TokenKind::Ident("x1".to_string()));
    }

    #[test]
    fn test_unicode_identifiers() {
        let k = kinds("café = naïve_1 + π");
        assert_eq!(k[0], TokenKind::Ident("café".to_string()));
        assert_eq!(k[2], TokenKind::Ident("naïve_1".to_string()));
        assert_eq!(k[4], TokenKind::Ident("π".to_string()));
        assert!(is_identifier("_x9"));
        assert!(!is_identifier("9x"));
        assert!(!is_identifier("a-b"));
        assert!(!is_identifier(""));
        assert!(lex("x = 1 € 2").is_err());
    }

    #[test]
    fn test_compound_operators() {
        let k = kinds("a //= 2 ** 3 != 4");
        assert!(k[1].is_operator(OperatorId::SlashSlashEq));
        assert!(k[3].is_operator(OperatorId::StarStar));
        assert!(k[5].is_operator(OperatorId::NotEq));
    }

    #[test]
    fn test_indentation_tokens() {
        let k = kinds("def f():\n    if x:\n        pass\n    return 1\n");
        let indents = k.iter().filter(|t| matches!(t, TokenKind::Indent)).count();
        let dedents = k.iter().filter(|t| matches!(t, TokenKind::Dedent)).count();
        assert_eq!(indents, 2);
        assert_eq!(dedents, 2);
        assert!(matches!(k.last(), Some(TokenKind::Eof)));
    }

    #[test]
    fn test_newlines_inside_brackets_are_skipped() {
        let k = kinds("x = [1,\n     2]\n");
        assert!(!k.iter().any(|t| matches!(t, TokenKind::Indent)));
        assert_eq!(k.iter().filter(|t| matches!(t, TokenKind::Newline)).count(), 1);
    }

    #[test]
    fn test_blank_and_comment_lines_do_not_indent() {
        let k = kinds("x = 1\n\n    # comment\ny = 2\n");
        assert!(!k.iter().any(|t| matches!(t, TokenKind::Indent)));
    }

    #[test]
    fn test_missing_trailing_newline_still_terminates() {
        let k = kinds("f(1)");
        assert_eq!(k[k.len() - 2], TokenKind::Newline);
    }

    #[test]
    fn test_line_continuation() {
        let k = kinds("x = 1 + \\\n    2\n");
        assert!(!k.iter().any(|t| matches!(t, TokenKind::Indent)));
        assert!(k.contains(&TokenKind::Int(2)));
    }

    #[test]
    fn test_unmatched_close_is_error() {
        let errs = lex(")").unwrap_err();
        assert!(errs[0].message.contains("Unmatched"));
    }

    #[test]
    fn test_bad_character() {
        let errs = lex("x = $").unwrap_err();
        assert_eq!(errs[0].message, "Unexpected character '$'");
    }

    #[test]
    fn test_indentation_depth_is_capped() {
        let max = indent::MAX_INDENT_LEVELS;
        let deep: String = (0..=max).map(|level| format!("{}if x:\n", " ".repeat(level))).collect();
        let source = format!("{deep}{}pass\n", " ".repeat(max + 1));
        let errs = lex(&source).unwrap_err();
        assert!(errs.iter().any(|e| e.message == "too many levels of indentation"), "{errs:?}");

        let shallow: String = (0..50).map(|level| format!("{}if x:\n", " ".repeat(level))).collect();
        assert!(lex(&format!("{shallow}{}pass\n", " ".repeat(50))).is_ok());
    }

    #[test]
    fn test_spans_are_byte_offsets() {
        let tokens = lex("add(1, 'x')").unwrap();
        assert_eq!(tokens[0].span, Span::new(0, 3));
        assert_eq!(tokens[4].span, Span::new(7, 10));
    }
}
