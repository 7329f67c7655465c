//! `math` namespace vocabulary.
//!
//! The `math` module is the only name visible to case-line arguments, and the only module target code may
//! import. Both the argument evaluator's namespace and the runtime's `import math` are built from this table so
//! the two cannot disagree about what `math.<name>` means.
//!
//! ## Examples
//! ```rust
//! use unitgen_core::lang::math::{self, MathConstId, MathFnId};
//!
//! assert_eq!(math::fn_from_str("sqrt"), Some(MathFnId::Sqrt));
//! assert_eq!(math::const_from_str("pi"), Some(MathConstId::Pi));
//! assert_eq!(math::fn_info(MathFnId::Log).arity, (1, 2));
//! ```

use super::registry::{LangItemInfo, lookup};

/// Name under which the namespace is exposed.
pub const MATH_MODULE_NAME: &str = "math";

/// Stable identifier for a `math` function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MathFnId {
    Sqrt,
    Pow,
    Floor,
    Ceil,
    Trunc,
    Fabs,
    Factorial,
    Gcd,
    Exp,
    Log,
    Log10,
    Log2,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Atan2,
    Hypot,
    Degrees,
    Radians,
    Isclose,
    Isfinite,
    Isinf,
    Isnan,
    Copysign,
    Fmod,
}

/// Stable identifier for a `math` constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MathConstId {
    Pi,
    E,
    Tau,
    Inf,
    Nan,
}

/// Metadata for a `math` function.
///
/// ## Notes
/// - `arity` is the inclusive `(min, max)` count of positional arguments.
#[derive(Debug, Clone, Copy)]
pub struct MathFnInfo {
    pub item: LangItemInfo<MathFnId>,
    pub arity: (usize, usize),
}

/// Metadata for a `math` constant.
#[derive(Debug, Clone, Copy)]
pub struct MathConstInfo {
    pub item: LangItemInfo<MathConstId>,
    pub value: f64,
}

/// Registry of `math` functions.
pub const MATH_FUNCTIONS: &[MathFnInfo] = &[
    func(MathFnId::Sqrt, "sqrt", (1, 1), "Square root."),
    func(MathFnId::Pow, "pow", (2, 2), "`x` raised to `y`, always as a float."),
    func(MathFnId::Floor, "floor", (1, 1), "Largest integer not greater than `x`."),
    func(MathFnId::Ceil, "ceil", (1, 1), "Smallest integer not less than `x`."),
    func(MathFnId::Trunc, "trunc", (1, 1), "Integer part of `x`."),
    func(MathFnId::Fabs, "fabs", (1, 1), "Absolute value as a float."),
    func(MathFnId::Factorial, "factorial", (1, 1), "`n!` for a non-negative integer."),
    func(MathFnId::Gcd, "gcd", (2, 2), "Greatest common divisor of two integers."),
    func(MathFnId::Exp, "exp", (1, 1), "`e` raised to `x`."),
    func(MathFnId::Log, "log", (1, 2), "Natural logarithm, or logarithm to a base."),
    func(MathFnId::Log10, "log10", (1, 1), "Base-10 logarithm."),
    func(MathFnId::Log2, "log2", (1, 1), "Base-2 logarithm."),
    func(MathFnId::Sin, "sin", (1, 1), "Sine of `x` radians."),
    func(MathFnId::Cos, "cos", (1, 1), "Cosine of `x` radians."),
    func(MathFnId::Tan, "tan", (1, 1), "Tangent of `x` radians."),
    func(MathFnId::Asin, "asin", (1, 1), "Arc sine, in radians."),
    func(MathFnId::Acos, "acos", (1, 1), "Arc cosine, in radians."),
    func(MathFnId::Atan, "atan", (1, 1), "Arc tangent, in radians."),
    func(MathFnId::Atan2, "atan2", (2, 2), "Arc tangent of `y / x`, quadrant aware."),
    func(MathFnId::Hypot, "hypot", (2, 2), "Euclidean norm `sqrt(x*x + y*y)`."),
    func(MathFnId::Degrees, "degrees", (1, 1), "Radians to degrees."),
    func(MathFnId::Radians, "radians", (1, 1), "Degrees to radians."),
    func(MathFnId::Isclose, "isclose", (2, 2), "Relative closeness with `rel_tol=1e-09`."),
    func(MathFnId::Isfinite, "isfinite", (1, 1), "True unless `x` is infinite or NaN."),
    func(MathFnId::Isinf, "isinf", (1, 1), "True if `x` is infinite."),
    func(MathFnId::Isnan, "isnan", (1, 1), "True if `x` is NaN."),
    func(MathFnId::Copysign, "copysign", (2, 2), "Magnitude of `x` with the sign of `y`."),
    func(MathFnId::Fmod, "fmod", (2, 2), "C-style remainder (sign of the dividend)."),
];

/// Registry of `math` constants.
pub const MATH_CONSTANTS: &[MathConstInfo] = &[
    constant(MathConstId::Pi, "pi", std::f64::consts::PI, "Ratio of circumference to diameter."),
    constant(MathConstId::E, "e", std::f64::consts::E, "Euler's number."),
    constant(MathConstId::Tau, "tau", std::f64::consts::TAU, "Two pi."),
    constant(MathConstId::Inf, "inf", f64::INFINITY, "Positive infinity."),
    constant(MathConstId::Nan, "nan", f64::NAN, "Not a number."),
];

/// Resolve a `math` function name.
pub fn fn_from_str(name: &str) -> Option<MathFnId> {
    MATH_FUNCTIONS.iter().find(|f| f.item.matches(name)).map(|f| f.item.id)
}

/// Resolve a `math` constant name.
pub fn const_from_str(name: &str) -> Option<MathConstId> {
    let items: Vec<LangItemInfo<MathConstId>> = MATH_CONSTANTS.iter().map(|c| c.item).collect();
    lookup(&items, name)
}

/// Return the metadata entry for a function.
///
/// ## Panics
/// - If the registry is missing an entry for `id` (this indicates a programming error).
pub fn fn_info(id: MathFnId) -> &'static MathFnInfo {
    MATH_FUNCTIONS
        .iter()
        .find(|f| f.item.id == id)
        .expect("math function info missing")
}

/// Return the metadata entry for a constant.
///
/// ## Panics
/// - If the registry is missing an entry for `id` (this indicates a programming error).
pub fn const_info(id: MathConstId) -> &'static MathConstInfo {
    MATH_CONSTANTS
        .iter()
        .find(|c| c.item.id == id)
        .expect("math constant info missing")
}

/// Canonical spelling of a function.
pub fn fn_name(id: MathFnId) -> &'static str {
    fn_info(id).item.canonical
}

const fn func(id: MathFnId, canonical: &'static str, arity: (usize, usize), description: &'static str) -> MathFnInfo {
    MathFnInfo {
        item: LangItemInfo {
            id,
            canonical,
            aliases: &[],
            description,
        },
        arity,
    }
}

const fn constant(id: MathConstId, canonical: &'static str, value: f64, description: &'static str) -> MathConstInfo {
    MathConstInfo {
        item: LangItemInfo {
            id,
            canonical,
            aliases: &[],
            description,
        },
        value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_functions_and_constants_do_not_collide() {
        for f in MATH_FUNCTIONS {
            assert!(const_from_str(f.item.canonical).is_none(), "{}", f.item.canonical);
            assert!(f.arity.0 <= f.arity.1);
        }
    }

    #[test]
    fn test_constant_values() {
        assert_eq!(const_info(MathConstId::Pi).value, std::f64::consts::PI);
        assert!(const_info(MathConstId::Nan).value.is_nan());
    }
}
