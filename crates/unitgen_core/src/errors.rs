//! Builtin exception kinds and shared user-facing error messages.
//!
//! Both the argument evaluator and the module runtime raise these kinds so a failure reads the same no matter
//! which layer produced it. Spellings and descriptions live in [`crate::lang::errors`].

/// Builtin exception kinds (Python-like).
///
/// ## Notes
/// - The hierarchy is flattened into [`ErrorKind::parent`]; `except` matching walks it.
/// - `RecursionError` and `TimeoutError` are also used for execution-limit violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BaseException,
    Exception,
    ArithmeticError,
    ZeroDivisionError,
    OverflowError,
    LookupError,
    IndexError,
    KeyError,
    ValueError,
    TypeError,
    AttributeError,
    NameError,
    UnboundLocalError,
    AssertionError,
    RuntimeError,
    RecursionError,
    NotImplementedError,
    ImportError,
    ModuleNotFoundError,
    StopIteration,
    TimeoutError,
}

impl ErrorKind {
    /// Return the direct base class of this exception kind, if any.
    pub fn parent(self) -> Option<ErrorKind> {
        use ErrorKind::*;
        match self {
            BaseException => None,
            Exception => Some(BaseException),
            ArithmeticError | LookupError | ValueError | TypeError | AttributeError | NameError | AssertionError
            | RuntimeError | ImportError | StopIteration | TimeoutError => Some(Exception),
            ZeroDivisionError | OverflowError => Some(ArithmeticError),
            IndexError | KeyError => Some(LookupError),
            UnboundLocalError => Some(NameError),
            RecursionError | NotImplementedError => Some(RuntimeError),
            ModuleNotFoundError => Some(ImportError),
        }
    }

    /// Return `true` if `self` is `ancestor` or derives from it.
    ///
    /// ## Examples
    /// ```rust
    /// use unitgen_core::errors::ErrorKind;
    ///
    /// assert!(ErrorKind::ZeroDivisionError.is_subclass_of(ErrorKind::ArithmeticError));
    /// assert!(ErrorKind::KeyError.is_subclass_of(ErrorKind::Exception));
    /// assert!(!ErrorKind::KeyError.is_subclass_of(ErrorKind::IndexError));
    /// ```
    pub fn is_subclass_of(self, ancestor: ErrorKind) -> bool {
        let mut current = Some(self);
        while let Some(kind) = current {
            if kind == ancestor {
                return true;
            }
            current = kind.parent();
        }
        false
    }
}

pub use crate::strings::{INDEX_OUT_OF_RANGE_MSG, SLICE_STEP_ZERO_MSG};

/// Message for `int / int` by zero.
pub const DIVISION_BY_ZERO_MSG: &str = "division by zero";

/// Message for `int // int` or `int % int` by zero.
pub const INT_DIVMOD_BY_ZERO_MSG: &str = "integer division or modulo by zero";

/// Message for float division, floor division or modulo by zero.
pub const FLOAT_DIVISION_BY_ZERO_MSG: &str = "float division by zero";

/// Message for integer results that do not fit the runtime's 64-bit integers.
pub const INT_OVERFLOW_MSG: &str = "integer result too large";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_reaches_base_exception() {
        use crate::lang::errors::EXCEPTIONS;

        for info in EXCEPTIONS {
            assert!(
                info.id.is_subclass_of(ErrorKind::BaseException),
                "{:?} does not reach BaseException",
                info.id
            );
        }
    }

    #[test]
    fn test_module_not_found_is_import_error() {
        assert!(ErrorKind::ModuleNotFoundError.is_subclass_of(ErrorKind::ImportError));
        assert!(!ErrorKind::ImportError.is_subclass_of(ErrorKind::ModuleNotFoundError));
    }
}
