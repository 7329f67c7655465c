//! Token types for the unitgen lexer.
//!
//! The lexer uses **registry-backed IDs** for language vocabulary:
//! - `Keyword(KeywordId)` for reserved words
//! - `Operator(OperatorId)` for operators (word-operators like `and` are lexed as keywords)
//! - `Punctuation(PunctuationId)` for punctuation tokens
//!
//! ## Notes
//! - ID-bearing tokens avoid stringly-typed checks in the parser and the case-line evaluator.
//! - Use `crate::token_helpers` for ergonomic token matching at call sites.

use crate::ast::Span;
use unitgen_core::lang::keywords::{self, KeywordId};
use unitgen_core::lang::operators::OperatorId;
use unitgen_core::lang::punctuation::PunctuationId;

// ============================================================================
// TOKEN TYPES
// ============================================================================

/// Kind of token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ========== Keyword / operator / punctuation (ID-based) ==========
    Keyword(KeywordId),
    Operator(OperatorId),
    Punctuation(PunctuationId),

    // ========== Identifiers and Literals ==========
    Ident(String),
    Int(i64),
    /// Integer literal outside the 64-bit range, as its digits in `radix`.
    BigInt { digits: String, radix: u32 },
    Float(f64),
    String(String),
    FString(Vec<FStringPart>),

    // ========== Indentation ==========
    Newline,
    Indent,
    Dedent,

    Eof,
}

/// Part of an f-string.
#[derive(Debug, Clone, PartialEq)]
pub enum FStringPart {
    Literal(String),
    /// Raw text between `{` and `}`; `offset` is where that text starts in the source.
    Expr { text: String, offset: usize },
}

/// A token with its kind and source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    /// Construct a new token.
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Resolve an identifier spelling to a keyword id, if reserved.
pub fn keyword_id(name: &str) -> Option<KeywordId> {
    keywords::from_str(name)
}
