//! Parser for target modules.
//!
//! Converts a token stream into a [`Module`]: a flat list of statements covering the Python subset the runtime
//! executes (functions, classes, control flow, exceptions, comprehensions, f-strings).
//!
//! ## Examples
//!
//! ```rust
//! use unitgen_syntax::{lexer, parser};
//!
//! let source = "def square(n):\n    return n * n\n";
//! let tokens = lexer::lex(source).unwrap();
//! let module = parser::parse(&tokens).unwrap();
//! assert_eq!(module.body.len(), 1);
//! ```

use crate::ast::*;
use crate::diagnostics::CompileError;
use crate::lexer::{self, FStringPart as LexFStringPart, Token, TokenKind};
use unitgen_core::lang::keywords::{self, KeywordId};
use unitgen_core::lang::operators::OperatorId;
use unitgen_core::lang::punctuation::PunctuationId;

// NOTE: This module is split across multiple files using `include!` to keep all parser
// methods in the same Rust module (preserving privacy + call patterns) while avoiding
// a single large source file.

include!("parser/core.rs");
include!("parser/helpers.rs");
include!("parser/decl.rs");
include!("parser/stmts.rs");
include!("parser/expr.rs");
include!("parser/util.rs");
include!("parser/api.rs");
include!("parser/tests.rs");
