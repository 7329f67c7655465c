//! Execution harness: load a target module once, then run parsed invocations against it.
//!
//! ## Notes
//! - Loading lexes, parses and executes the module's top-level statements. Any failure there is a
//!   [`LoadError`] and no invocation runs.
//! - Each invocation gets a fresh step budget and call frame. A failing invocation (missing function, wrong
//!   arity, raised exception, exceeded limit) becomes an [`OutcomeStatus::Failure`]; the batch continues.
//! - Output is 1:1 with the input, in order.
//!
//! ## Examples
//! ```rust
//! use unitgen::cases;
//! use unitgen::harness::{self, TargetModule};
//!
//! let module = TargetModule::from_source("calc", "def add(a, b):\n    return a + b\n").unwrap();
//! let calls: Vec<_> = ["add(1, 2)", "sub(1, 2)"].iter().filter_map(|l| cases::parse(l)).collect();
//! let lines: Vec<String> = harness::run(&calls, &module).iter().map(|o| o.to_string()).collect();
//! assert_eq!(lines, ["add(1, 2) = 3", "Error executing sub(1, 2): module 'calc' has no attribute 'sub'"]);
//! ```
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod outcome;

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use thiserror::Error;
use unitgen_syntax::diagnostics::{CompileError, SyntaxReport};
use unitgen_syntax::{lexer, parser};

use crate::cases::ParsedInvocation;
use crate::runtime::{ExecutionLimits, Interpreter, RuntimeError, Value};

pub use outcome::{ExecutionOutcome, OutcomeStatus, report_text};

// ============================================================================
// Loading
// ============================================================================

/// Why a target module could not be loaded.
#[derive(Debug, Error, Diagnostic)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    #[diagnostic(code(unitgen::load::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(SyntaxReport),

    #[error("module '{module}' failed to load: {}", error.qualified())]
    #[diagnostic(code(unitgen::load::execution))]
    Execution { module: String, error: RuntimeError },
}

/// A module whose top-level statements have run, ready to be called into.
///
/// Holds a single interpreter and is therefore `!Send`; calls borrow it one at a time.
pub struct TargetModule {
    name: String,
    limits: ExecutionLimits,
    interpreter: RefCell<Interpreter>,
}

impl TargetModule {
    /// Load the module at `path` with default limits. The module name is the file stem.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        Self::load_with(path, ExecutionLimits::default())
    }

    pub fn load_with(path: &Path, limits: ExecutionLimits) -> Result<Self, LoadError> {
        let source = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_source_at(path, &source, limits)
    }

    /// Load source already read from `path`; diagnostics name the path and the module name is its stem.
    #[tracing::instrument(skip_all, fields(path = %path.display()))]
    pub fn from_source_at(path: &Path, source: &str, limits: ExecutionLimits) -> Result<Self, LoadError> {
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "module".to_string());
        Self::build(name, &path.display().to_string(), source, limits)
    }

    /// Load from in-memory source with default limits.
    pub fn from_source(name: &str, source: &str) -> Result<Self, LoadError> {
        Self::from_source_with(name, source, ExecutionLimits::default())
    }

    pub fn from_source_with(name: &str, source: &str, limits: ExecutionLimits) -> Result<Self, LoadError> {
        Self::build(name.to_string(), name, source, limits)
    }

    fn build(name: String, file_name: &str, source: &str, limits: ExecutionLimits) -> Result<Self, LoadError> {
        let syntax = |errors: Vec<CompileError>| LoadError::Syntax(SyntaxReport::new(file_name, source, errors));
        let tokens = lexer::lex(source).map_err(syntax)?;
        let module = parser::parse(&tokens).map_err(syntax)?;

        let mut interpreter = Interpreter::new(&name, limits);
        if let Err(error) = interpreter.run_module(&module) {
            return Err(LoadError::Execution { module: name, error });
        }
        let printed = interpreter.take_output();
        if !printed.is_empty() {
            tracing::debug!(output = %printed, "module printed while loading");
        }
        tracing::debug!(module = %name, steps = interpreter.steps(), "module loaded");
        interpreter.reset_budget();

        Ok(Self {
            name,
            limits,
            interpreter: RefCell::new(interpreter),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The limits the module was loaded with; [`run`] uses them for every invocation.
    pub fn limits(&self) -> ExecutionLimits {
        self.limits
    }

    /// A top-level symbol (function, class or constant).
    pub fn resolve(&self, name: &str) -> Option<Value> {
        self.interpreter.borrow().lookup_global(name)
    }

    /// Top-level symbol names, sorted.
    pub fn symbols(&self) -> Vec<String> {
        self.interpreter.borrow().global_names()
    }
}

impl std::fmt::Debug for TargetModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetModule")
            .field("name", &self.name)
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Execution
// ============================================================================

/// Run every invocation against `module` with the limits it was loaded with.
pub fn run(invocations: &[ParsedInvocation], module: &TargetModule) -> Vec<ExecutionOutcome> {
    run_with(invocations, module, &module.limits)
}

/// Run every invocation against `module` with explicit per-invocation limits.
#[tracing::instrument(skip_all, fields(module = %module.name, cases = invocations.len()))]
pub fn run_with(
    invocations: &[ParsedInvocation],
    module: &TargetModule,
    limits: &ExecutionLimits,
) -> Vec<ExecutionOutcome> {
    let mut interpreter = module.interpreter.borrow_mut();
    let saved = interpreter.limits();
    interpreter.set_limits(*limits);

    let outcomes: Vec<ExecutionOutcome> = invocations
        .iter()
        .map(|invocation| invoke(&mut interpreter, &module.name, invocation))
        .collect();

    interpreter.set_limits(saved);
    let passed = outcomes.iter().filter(|o| o.is_success()).count();
    tracing::info!(passed, failed = outcomes.len() - passed, "executed cases");
    outcomes
}

fn invoke(interpreter: &mut Interpreter, module_name: &str, invocation: &ParsedInvocation) -> ExecutionOutcome {
    interpreter.reset_budget();
    let name = invocation.function_name();

    // The callee may mutate its arguments; the invocation keeps the values it was parsed with.
    let arguments = invocation.arguments().iter().map(Value::deep_copy).collect();
    let result = match interpreter.lookup_global(name) {
        Some(callee) => interpreter
            .call(&callee, arguments, Vec::new())
            .and_then(|value| {
                let rendered = interpreter.to_str(&value)?;
                Ok((value, rendered))
            })
            .map_err(|err| failure_message(&err)),
        None => Err(format!("module '{module_name}' has no attribute '{name}'")),
    };
    let output = interpreter.take_output();

    match result {
        Ok((value, rendered)) => {
            tracing::debug!(call = %invocation, result = %rendered, "case passed");
            ExecutionOutcome::success(invocation.clone(), value, rendered, output)
        }
        Err(message) => {
            tracing::debug!(call = %invocation, %message, "case failed");
            ExecutionOutcome::failure(invocation.clone(), message, output)
        }
    }
}

/// `str(exception)` for raised exceptions; limit violations keep their type prefix.
fn failure_message(err: &RuntimeError) -> String {
    match err {
        RuntimeError::Raise(exc) => exc.to_string(),
        RuntimeError::Limit(limit) => limit.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cases;

    fn invocations(lines: &[&str]) -> Vec<ParsedInvocation> {
        lines.iter().map(|l| cases::parse(l).unwrap()).collect()
    }

    fn report(module: &TargetModule, lines: &[&str]) -> Vec<String> {
        run(&invocations(lines), module).iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_success_and_missing_function() {
        let module = TargetModule::from_source("calc", "def add(a, b):\n    return a + b\n").unwrap();
        assert_eq!(report(&module, &["add(1, 2)", "add(2, 2)", "missing(1)"]), [
            "add(1, 2) = 3",
            "add(2, 2) = 4",
            "Error executing missing(1): module 'calc' has no attribute 'missing'",
        ]);
    }

    #[test]
    fn test_failures_do_not_stop_the_batch() {
        let source = "def div(a, b):\n    return a / b\n\nLIMIT = 3\n";
        let module = TargetModule::from_source("m", source).unwrap();
        assert_eq!(report(&module, &["div(1, 0)", "div(1)", "LIMIT()", "div(1, 4)"]), [
            "Error executing div(1, 0): division by zero",
            "Error executing div(1): div() missing 1 required positional argument: 'b'",
            "Error executing LIMIT(): 'int' object is not callable",
            "div(1, 4) = 0.25",
        ]);
    }

    #[test]
    fn test_success_uses_str_and_none() {
        let source = "def name(s):\n    return s.upper()\n\ndef nothing():\n    pass\n";
        let module = TargetModule::from_source("m", source).unwrap();
        assert_eq!(report(&module, &["name('ab')", "nothing()"]), ["name('ab') = AB", "nothing() = None"]);
    }

    #[test]
    fn test_printed_output_is_captured_per_outcome() {
        let module = TargetModule::from_source("m", "def hi(n):\n    print('hi', n)\n    return n\n").unwrap();
        let outcomes = run(&invocations(&["hi(1)", "hi(2)"]), &module);
        assert_eq!(outcomes[0].output(), "hi 1\n");
        assert_eq!(outcomes[1].output(), "hi 2\n");
        assert_eq!(outcomes[0].to_string(), "hi(1) = 1");
    }

    #[test]
    fn test_limits_are_per_invocation() {
        let source = "def spin():\n    while True:\n        pass\n\ndef one():\n    return 1\n";
        let module = TargetModule::from_source("m", source).unwrap();
        let limits = ExecutionLimits::default().with_max_steps(1_000);
        let outcomes = run_with(&invocations(&["spin()", "one()"]), &module, &limits);
        assert_eq!(
            outcomes[0].to_string(),
            "Error executing spin(): TimeoutError: execution exceeded 1000 steps"
        );
        assert_eq!(outcomes[1].to_string(), "one() = 1");
    }

    #[test]
    fn test_load_errors() {
        assert!(matches!(
            TargetModule::from_source("bad", "def f(:\n    pass\n"),
            Err(LoadError::Syntax(_))
        ));
        let err = TargetModule::from_source("boom", "x = 1 / 0\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "module 'boom' failed to load: ZeroDivisionError: division by zero"
        );
        let err = TargetModule::load(Path::new("/definitely/not/here.py")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn test_resolve_and_symbols() {
        let module = TargetModule::from_source("m", "import math\n\nRATE = 2\n\ndef f():\n    return RATE\n").unwrap();
        assert_eq!(module.resolve("RATE"), Some(Value::Int(2)));
        assert!(module.resolve("g").is_none());
        assert_eq!(module.symbols(), ["RATE", "f", "math"]);
    }
}
