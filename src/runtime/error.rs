//! Exceptions and execution-limit errors raised by the runtime.
//!
//! The runtime has two failure channels:
//! - [`Exception`]: an ordinary Python-like exception. Target code can catch it with `try`/`except`.
//! - [`LimitError`]: a step-budget or call-depth violation. It is **not** catchable by target code and unwinds
//!   straight to the caller of the interpreter.
//!
//! [`RuntimeError`] is the union of both and is what interpreter entry points return.
//!
//! ## Notes
//! - `Exception::message` is the Python `str(exception)` text (`"division by zero"`, `"'k'"` for a `KeyError`).
//! - `Exception::qualified` prefixes the type name (`"ZeroDivisionError: division by zero"`).

use std::fmt;
use std::rc::Rc;

use thiserror::Error;
use unitgen_core::errors::{ErrorKind, INT_OVERFLOW_MSG};

use super::value::{ExceptionObject, Value};

/// A raised Python-like exception.
#[derive(Debug, Clone)]
pub struct Exception {
    kind: ErrorKind,
    message: String,
    /// The exception object as target code sees it (`except E as e`). Built lazily when absent.
    value: Option<Value>,
}

impl Exception {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            value: None,
        }
    }

    /// Exception carrying the object that was raised (a builtin exception object or a user class instance).
    pub fn with_value(kind: ErrorKind, message: impl Into<String>, value: Value) -> Self {
        Self {
            kind,
            message: message.into(),
            value: Some(value),
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeError, message)
    }

    pub fn value_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValueError, message)
    }

    pub fn index_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::IndexError, message)
    }

    pub fn attribute_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AttributeError, message)
    }

    pub fn name_error(name: &str) -> Self {
        Self::new(ErrorKind::NameError, format!("name '{name}' is not defined"))
    }

    pub fn zero_division(message: &str) -> Self {
        Self::new(ErrorKind::ZeroDivisionError, message)
    }

    /// `OverflowError` for integer results outside the 64-bit range.
    pub fn overflow() -> Self {
        Self::new(ErrorKind::OverflowError, INT_OVERFLOW_MSG)
    }

    /// `KeyError` for a missing key; `str(e)` is the key's repr.
    pub fn key_error(key: &Value) -> Self {
        let object = ExceptionObject::new(ErrorKind::KeyError, vec![key.clone()]);
        Self::with_value(ErrorKind::KeyError, key.repr(), Value::Exception(Rc::new(object)))
    }

    /// The nearest builtin exception kind (user exception classes report their builtin base).
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// `str(exception)`.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Type name as Python prints it in a traceback: the user class name, or the builtin kind.
    pub fn type_name(&self) -> String {
        match &self.value {
            Some(Value::Instance(instance)) => instance.class.name.clone(),
            _ => self.kind.as_str().to_string(),
        }
    }

    /// `"Kind: message"`, or just `"Kind"` when the message is empty.
    pub fn qualified(&self) -> String {
        if self.message.is_empty() {
            self.type_name()
        } else {
            format!("{}: {}", self.type_name(), self.message)
        }
    }

    /// The exception object bound by `except ... as name`.
    pub fn to_value(&self) -> Value {
        if let Some(value) = &self.value {
            return value.clone();
        }
        let args = if self.message.is_empty() {
            Vec::new()
        } else {
            vec![Value::str(&self.message)]
        };
        Value::Exception(Rc::new(ExceptionObject::new(self.kind, args)))
    }
}

/// Check a positional argument count against `(min, max)`, phrased like CPython's builtins.
///
/// `qualified` names the callable in the "takes exactly one argument" form (`math.sqrt`); `name` is used
/// for the "expected N arguments" forms.
pub(crate) fn check_arity(qualified: &str, name: &str, given: usize, (min, max): (usize, usize)) -> Result<(), Exception> {
    if (min..=max).contains(&given) {
        return Ok(());
    }
    let message = if min == max && min == 1 {
        format!("{qualified}() takes exactly one argument ({given} given)")
    } else if min == max {
        format!("{name} expected {min} arguments, got {given}")
    } else if given < min {
        let s = if min == 1 { "" } else { "s" };
        format!("{name} expected at least {min} argument{s}, got {given}")
    } else {
        format!("{name} expected at most {max} arguments, got {given}")
    };
    Err(Exception::type_error(message))
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Exception {}

/// Execution-limit violation. Uncatchable by target code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LimitError {
    #[error("TimeoutError: execution exceeded {0} steps")]
    Steps(u64),

    #[error("RecursionError: maximum recursion depth exceeded")]
    Depth(usize),
}

/// Anything that can abort interpretation.
#[derive(Debug, Clone, Error)]
pub enum RuntimeError {
    #[error("{0}")]
    Raise(Exception),

    #[error(transparent)]
    Limit(#[from] LimitError),
}

impl RuntimeError {
    /// Message with the exception type prefixed, for load errors and logs.
    pub fn qualified(&self) -> String {
        match self {
            RuntimeError::Raise(exc) => exc.qualified(),
            RuntimeError::Limit(limit) => limit.to_string(),
        }
    }
}

impl From<Exception> for RuntimeError {
    fn from(exc: Exception) -> Self {
        RuntimeError::Raise(exc)
    }
}

/// Result of an interpreter operation.
pub type ExecResult<T> = Result<T, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_error_message_is_key_repr() {
        let exc = Exception::key_error(&Value::str("missing"));
        assert_eq!(exc.message(), "'missing'");
        assert_eq!(exc.qualified(), "KeyError: 'missing'");
    }

    #[test]
    fn test_limit_errors_render_with_kind() {
        let err: RuntimeError = LimitError::Steps(100).into();
        assert_eq!(err.to_string(), "TimeoutError: execution exceeded 100 steps");
        let err: RuntimeError = LimitError::Depth(200).into();
        assert_eq!(err.qualified(), "RecursionError: maximum recursion depth exceeded");
    }

    #[test]
    fn test_bare_exception_qualified_has_no_colon() {
        let exc = Exception::new(ErrorKind::ValueError, "");
        assert_eq!(exc.qualified(), "ValueError");
        assert_eq!(exc.to_string(), "");
    }
}
