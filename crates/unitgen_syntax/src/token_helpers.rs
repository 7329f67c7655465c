//! Small helper APIs for working with `Token` / `TokenKind`.
//!
//! These helpers keep `matches!(...)` noise out of the parser and the case-line scanner, which both need to ask
//! “is this the `(` punctuation?” or “how do I name this token in an error message?”.

use crate::lexer::TokenKind;
use unitgen_core::lang::keywords::{self, KeywordId};
use unitgen_core::lang::operators::{self, OperatorId};
use unitgen_core::lang::punctuation::{self, PunctuationId};

impl TokenKind {
    /// Return the keyword id, if this is a keyword token.
    pub fn keyword_id(&self) -> Option<KeywordId> {
        match self {
            TokenKind::Keyword(id) => Some(*id),
            _ => None,
        }
    }

    /// Return `true` if this is the given keyword.
    pub fn is_keyword(&self, id: KeywordId) -> bool {
        matches!(self, TokenKind::Keyword(k) if *k == id)
    }

    /// Return `true` if this is the given operator.
    pub fn is_operator(&self, id: OperatorId) -> bool {
        matches!(self, TokenKind::Operator(o) if *o == id)
    }

    /// Return `true` if this is the given punctuation.
    pub fn is_punctuation(&self, id: PunctuationId) -> bool {
        matches!(self, TokenKind::Punctuation(p) if *p == id)
    }

    /// Return `true` for `(`, `[` and `{`.
    pub fn is_open_bracket(&self) -> bool {
        matches!(
            self,
            TokenKind::Punctuation(PunctuationId::LParen | PunctuationId::LBracket | PunctuationId::LBrace)
        )
    }

    /// Return `true` for `)`, `]` and `}`.
    pub fn is_close_bracket(&self) -> bool {
        matches!(
            self,
            TokenKind::Punctuation(PunctuationId::RParen | PunctuationId::RBracket | PunctuationId::RBrace)
        )
    }

    /// Return `true` if this token is trivia/control flow in the token stream.
    pub fn is_layout(&self) -> bool {
        matches!(self, TokenKind::Newline | TokenKind::Indent | TokenKind::Dedent)
    }

    /// Human-readable token description for diagnostics (`'('`, `keyword 'def'`, `identifier 'x'`).
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Keyword(id) => format!("keyword '{}'", keywords::as_str(*id)),
            TokenKind::Operator(id) => format!("'{}'", operators::as_str(*id)),
            TokenKind::Punctuation(id) => format!("'{}'", punctuation::as_str(*id)),
            TokenKind::Ident(name) => format!("identifier '{}'", name),
            TokenKind::Int(_) | TokenKind::BigInt { .. } | TokenKind::Float(_) => "number".to_string(),
            TokenKind::String(_) => "string".to_string(),
            TokenKind::FString(_) => "f-string".to_string(),
            TokenKind::Newline => "newline".to_string(),
            TokenKind::Indent => "indent".to_string(),
            TokenKind::Dedent => "dedent".to_string(),
            TokenKind::Eof => "end of input".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::lexer::lex;

    #[test]
    fn test_describe() {
        let tokens = lex("def x ( 1").unwrap();
        let described: Vec<String> = tokens.iter().map(|t| t.kind.describe()).collect();
        assert_eq!(
            described,
            vec!["keyword 'def'", "identifier 'x'", "'('", "number", "newline", "end of input"]
        );
    }
}
