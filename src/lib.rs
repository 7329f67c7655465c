#![forbid(unsafe_code)]
//! unitgen: model-generated unit test cases for Python modules
//!
//! A session loads a target module into a sandboxed tree-walking interpreter, asks a chat model for test case lines
//! of the form `name(args)`, parses each line into a function name plus literal arguments, calls the function and
//! records whether it returned or raised.
//!
//! ## Modules
//!
//! - [`cases`] – case-line parsing and restricted argument evaluation
//! - [`runtime`] – the interpreter that executes target modules
//! - [`harness`] – module loading and per-invocation outcomes
//! - [`generate`] – the model adapter producing case text
//! - [`cli`] – the session driver
//!
//! ## Panic Policy
//!
//! This codebase follows explicit error handling:
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli`, `harness` and
//!   `generate` modules enforce `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **Target code**: Anything a target module does wrong is a Python-style exception recorded as a `Failure`,
//!   never a panic in the host.

pub mod cases;
pub mod cli;
pub mod generate;
pub mod harness;
pub mod runtime;
pub mod version;

pub use unitgen_syntax::ast;
pub use unitgen_syntax::diagnostics;
pub use unitgen_syntax::lexer;
pub use unitgen_syntax::parser;

pub use cases::{CaseBatch, ParsedInvocation, parse, parse_cases};
pub use harness::{ExecutionOutcome, OutcomeStatus, TargetModule, run};
