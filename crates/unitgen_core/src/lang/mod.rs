//! unitgen language vocabulary registries.
//!
//! This module is the “front door” for language-level vocabulary: reserved keywords, operators, punctuation,
//! builtin functions, builtin exception kinds, and the `math` namespace.
//!
//! The design goal is to avoid stringly-typed checks scattered across the lexer, evaluator and runtime.
//! Instead, callers work with **stable IDs** (e.g. `KeywordId`, `OperatorId`) and look up spellings/metadata via
//! registry tables.
//!
//! ## Notes
//! - Registries are intentionally **pure**: no AST types, no IO, no side effects.
//! - The lexer/parser enforce syntax; registries provide spellings and metadata for shared use (diagnostics,
//!   precedence climbing, builtin dispatch).
//!
//! ## Examples
//! ```rust
//! use unitgen_core::lang::keywords::{self, KeywordId};
//!
//! assert_eq!(keywords::from_str("if"), Some(KeywordId::If));
//! assert_eq!(keywords::as_str(KeywordId::If), "if");
//! ```

pub mod builtins;
pub mod errors;
pub mod keywords;
pub mod math;
pub mod operators;
pub mod punctuation;
pub mod registry;
