//! Builtin exception vocabulary (Python-like).
//!
//! This registry exists so the runtime can resolve exception names in `except` clauses and `raise` statements
//! the same way it resolves keywords or builtin functions.

use crate::errors::ErrorKind;

use super::registry::{LangItemInfo, lookup};

/// Metadata for a builtin exception kind.
pub type ExceptionInfo = LangItemInfo<ErrorKind>;

/// Registry of builtin exception kinds.
pub const EXCEPTIONS: &[ExceptionInfo] = &[
    info(
        ErrorKind::BaseException,
        "BaseException",
        "Root of the exception hierarchy.",
    ),
    info(ErrorKind::Exception, "Exception", "Base class of all ordinary errors."),
    info(
        ErrorKind::ArithmeticError,
        "ArithmeticError",
        "Base class for numeric failures.",
    ),
    info(
        ErrorKind::ZeroDivisionError,
        "ZeroDivisionError",
        "Raised when dividing or taking modulo by zero.",
    ),
    info(
        ErrorKind::OverflowError,
        "OverflowError",
        "Raised when an integer result does not fit in 64 bits.",
    ),
    info(
        ErrorKind::LookupError,
        "LookupError",
        "Base class for index and key failures.",
    ),
    info(
        ErrorKind::IndexError,
        "IndexError",
        "Raised when a sequence index is out of range.",
    ),
    info(ErrorKind::KeyError, "KeyError", "Raised when a dict key is missing."),
    info(
        ErrorKind::ValueError,
        "ValueError",
        "Raised when an operation receives a value of the right type but an invalid value.",
    ),
    info(
        ErrorKind::TypeError,
        "TypeError",
        "Raised when an operation receives a value of an inappropriate type.",
    ),
    info(
        ErrorKind::AttributeError,
        "AttributeError",
        "Raised when an attribute lookup fails.",
    ),
    info(ErrorKind::NameError, "NameError", "Raised when a name is not defined."),
    info(
        ErrorKind::UnboundLocalError,
        "UnboundLocalError",
        "Raised when a local is read before assignment.",
    ),
    info(
        ErrorKind::AssertionError,
        "AssertionError",
        "Raised when an `assert` statement fails.",
    ),
    info(
        ErrorKind::RuntimeError,
        "RuntimeError",
        "Raised for errors that fit no other category.",
    ),
    info(
        ErrorKind::RecursionError,
        "RecursionError",
        "Raised when the call depth limit is exceeded.",
    ),
    info(
        ErrorKind::NotImplementedError,
        "NotImplementedError",
        "Raised by code that is not implemented yet.",
    ),
    info(
        ErrorKind::ImportError,
        "ImportError",
        "Raised when an import cannot be satisfied.",
    ),
    info(
        ErrorKind::ModuleNotFoundError,
        "ModuleNotFoundError",
        "Raised when an imported module does not exist.",
    ),
    info(
        ErrorKind::StopIteration,
        "StopIteration",
        "Raised when an iterator is exhausted.",
    ),
    info(
        ErrorKind::TimeoutError,
        "TimeoutError",
        "Raised when the execution step budget is exhausted.",
    ),
];

impl ErrorKind {
    /// Return the canonical spelling for this exception kind.
    pub fn as_str(self) -> &'static str {
        info_for(self).canonical
    }

    /// Return the description for this exception kind.
    pub fn description(self) -> &'static str {
        info_for(self).description
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve an exception name to its kind.
///
/// ## Examples
/// ```rust
/// use unitgen_core::errors::ErrorKind;
/// use unitgen_core::lang::errors;
///
/// assert_eq!(errors::from_str("KeyError"), Some(ErrorKind::KeyError));
/// assert_eq!(errors::from_str("keyerror"), None);
/// ```
pub fn from_str(name: &str) -> Option<ErrorKind> {
    lookup(EXCEPTIONS, name)
}

/// Return the full metadata entry for an exception kind.
///
/// ## Panics
/// - If the registry is missing an entry for `id` (this indicates a programming error).
pub fn info_for(id: ErrorKind) -> &'static ExceptionInfo {
    EXCEPTIONS.iter().find(|e| e.id == id).expect("exception info missing")
}

const fn info(id: ErrorKind, canonical: &'static str, description: &'static str) -> ExceptionInfo {
    LangItemInfo {
        id,
        canonical,
        aliases: &[],
        description,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_uses_canonical_name() {
        assert_eq!(ErrorKind::ZeroDivisionError.to_string(), "ZeroDivisionError");
    }

    #[test]
    fn test_roundtrip_every_exception() {
        for e in EXCEPTIONS {
            assert_eq!(from_str(e.canonical), Some(e.id));
        }
    }
}
