//! Builtin function vocabulary.
//!
//! This module defines the canonical set of builtin functions available to target modules.
//! Callers should use the stable identifier [`BuiltinFnId`] for identity and query spellings and other metadata
//! through [`BuiltinFnInfo`] / [`BUILTIN_FUNCTIONS`].
//!
//! ## Notes
//! - Lookup via [`from_str`] is **case-sensitive**.
//! - Builtins are not visible to case lines; argument evaluation only sees the `math` namespace.
//!
//! ## Examples
//! ```rust
//! use unitgen_core::lang::builtins::{self, BuiltinFnId};
//!
//! assert_eq!(builtins::from_str("print"), Some(BuiltinFnId::Print));
//! assert_eq!(builtins::as_str(BuiltinFnId::Sorted), "sorted");
//! ```

use super::registry::{LangItemInfo, lookup};

/// Stable identifier for a builtin function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinFnId {
    Print,
    Len,
    Abs,
    Min,
    Max,
    Sum,
    Range,
    Sorted,
    Reversed,
    Enumerate,
    Zip,
    Isinstance,
    Round,
    Any,
    All,
    Int,
    Float,
    Str,
    Bool,
    List,
    Tuple,
    Dict,
    Set,
    Type,
    Repr,
    StaticMethod,
    ClassMethod,
    Property,
}

/// Metadata for a builtin function.
pub type BuiltinFnInfo = LangItemInfo<BuiltinFnId>;

/// Registry of all builtin functions.
pub const BUILTIN_FUNCTIONS: &[BuiltinFnInfo] = &[
    info(BuiltinFnId::Print, "print", "Write values to the captured output."),
    info(BuiltinFnId::Len, "len", "Return the length of a collection/string."),
    info(BuiltinFnId::Abs, "abs", "Absolute value (numeric)."),
    info(BuiltinFnId::Min, "min", "Smallest argument or smallest item of an iterable."),
    info(BuiltinFnId::Max, "max", "Largest argument or largest item of an iterable."),
    info(BuiltinFnId::Sum, "sum", "Sum a numeric iterable."),
    info(BuiltinFnId::Range, "range", "Create a range of integers."),
    info(BuiltinFnId::Sorted, "sorted", "Return a new sorted list."),
    info(BuiltinFnId::Reversed, "reversed", "Return the items of a sequence in reverse order."),
    info(
        BuiltinFnId::Enumerate,
        "enumerate",
        "Enumerate an iterable into (index, value) pairs.",
    ),
    info(BuiltinFnId::Zip, "zip", "Zip iterables element-wise into tuples."),
    info(
        BuiltinFnId::Isinstance,
        "isinstance",
        "Check a value against a builtin type or class.",
    ),
    info(BuiltinFnId::Round, "round", "Round half to even, optionally to n digits."),
    info(BuiltinFnId::Any, "any", "True if any item is truthy."),
    info(BuiltinFnId::All, "all", "True if every item is truthy."),
    info(BuiltinFnId::Int, "int", "Convert a value to an integer."),
    info(BuiltinFnId::Float, "float", "Convert a value to a float."),
    info(BuiltinFnId::Str, "str", "Convert a value to a string."),
    info(BuiltinFnId::Bool, "bool", "Truthiness of a value."),
    info(BuiltinFnId::List, "list", "Build a list from an iterable."),
    info(BuiltinFnId::Tuple, "tuple", "Build a tuple from an iterable."),
    info(BuiltinFnId::Dict, "dict", "Build a dict from pairs or keyword arguments."),
    info(BuiltinFnId::Set, "set", "Build a set from an iterable."),
    info(BuiltinFnId::Type, "type", "Return the type name of a value."),
    info(BuiltinFnId::Repr, "repr", "Return the printable representation of a value."),
    info(BuiltinFnId::StaticMethod, "staticmethod", "Method decorator: call without a receiver."),
    info(BuiltinFnId::ClassMethod, "classmethod", "Method decorator: receive the class as the first argument."),
    info(BuiltinFnId::Property, "property", "Method decorator: compute an attribute on read."),
];

/// Return the canonical spelling for a builtin.
pub fn as_str(id: BuiltinFnId) -> &'static str {
    info_for(id).canonical
}

/// Resolve a builtin spelling (canonical or alias).
pub fn from_str(name: &str) -> Option<BuiltinFnId> {
    lookup(BUILTIN_FUNCTIONS, name)
}

/// Return the full metadata entry for a builtin.
///
/// ## Panics
/// - If the registry is missing an entry for `id` (this indicates a programming error).
pub fn info_for(id: BuiltinFnId) -> &'static BuiltinFnInfo {
    BUILTIN_FUNCTIONS
        .iter()
        .find(|b| b.id == id)
        .expect("builtin info missing")
}

const fn info(id: BuiltinFnId, canonical: &'static str, description: &'static str) -> BuiltinFnInfo {
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
    fn test_builtins_do_not_shadow_keywords() {
        for b in BUILTIN_FUNCTIONS {
            assert!(crate::lang::keywords::from_str(b.canonical).is_none(), "{}", b.canonical);
        }
    }
}
