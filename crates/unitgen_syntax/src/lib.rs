//! Syntax frontend for unitgen target modules: lexer, parser, AST, diagnostics.
//!
//! The same lexer serves two callers: the module loader, which parses whole files into a [`ast::Module`], and the
//! case-line parser, which scans single `name(args)` lines and evaluates their argument tokens.
//!
//! ## Notes
//! - This crate is intentionally “syntax-only”: it does not resolve names or execute anything.
//! - Vocabulary identity (keywords/operators/punctuation) comes from `unitgen_core::lang` registries.
//!
//! ## Examples
//! ```rust
//! use unitgen_syntax::{lexer, parser};
//!
//! let tokens = lexer::lex("def add(a, b):\n    return a + b\n").unwrap();
//! let module = parser::parse(&tokens).unwrap();
//! assert_eq!(module.body.len(), 1);
//! ```

pub mod ast;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod token_helpers;
