//! Provide shared, pure semantic helpers and canonical language vocabulary for unitgen.
//!
//! This crate is intentionally small and dependency-free. It contains deterministic helpers that both:
//! - the case-line argument evaluator uses to build literal values, and
//! - the module runtime uses to enforce the same semantics when target code runs.
//!
//! ## Notes
//!
//! - This is a “semantic core” crate: **no IO**, no global state, and no interpreter types.
//! - Current scope: numeric policy (Python-like semantics), string/sequence semantics (scalar indexing, slicing,
//!   `repr` quoting), builtin exception kinds, and canonical language vocabulary.

pub mod errors;
pub mod lang;
pub mod strings;

/// Represent the numeric category used by semantic policy.
///
/// This is not a concrete runtime type. It exists to describe “int-like” and “float-like” behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericTy {
    Int,
    Float,
}

/// Represent a numeric operator subject to promotion rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericOp {
    Add,
    Sub,
    Mul,
    Div,
    /// `//` (Python-style floor division): returns `Int` for `Int // Int`, otherwise `Float`.
    FloorDiv,
    Mod,
    Pow,
}

/// Classify the exponent for `**` so policy can decide `Int` vs `Float` results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowExponentKind {
    /// A non-negative integer (e.g., `2`, `0`)
    NonNegativeInt,
    /// A negative integer (e.g., `-1`)
    NegativeInt,
    /// A float exponent
    Float,
}

impl PowExponentKind {
    /// Classify a `**` exponent from its runtime value.
    ///
    /// ## Parameters
    /// - `rhs_is_float`: whether the exponent is a float.
    /// - `rhs_int`: the exponent value when it is an integer.
    pub fn classify(rhs_is_float: bool, rhs_int: Option<i64>) -> Self {
        match (rhs_is_float, rhs_int) {
            (true, _) | (false, None) => PowExponentKind::Float,
            (false, Some(v)) if v >= 0 => PowExponentKind::NonNegativeInt,
            (false, Some(_)) => PowExponentKind::NegativeInt,
        }
    }
}

/// Determine the numeric result category for a binary operation.
///
/// ## Parameters
/// - `op`: the numeric operator.
/// - `lhs`: numeric category of the left operand.
/// - `rhs`: numeric category of the right operand.
/// - `pow_exp_kind`: exponent classification for `Pow` (`**`) operations.
///
/// ## Returns
/// - (`NumericTy`): `Int` or `Float` per Python's numeric tower (restricted to `int`/`float`).
///
/// ## Notes
/// - `/` always yields `Float` (even `Int / Int`).
/// - `//`, `%`, `+`, `-`, `*` yield `Float` if either operand is `Float`, otherwise `Int`.
/// - `**` yields `Int` only for `Int ** Int` with a non-negative exponent; otherwise `Float`.
///
/// ## Examples
/// ```rust
/// use unitgen_core::{result_numeric_type, NumericOp, NumericTy, PowExponentKind};
/// assert_eq!(result_numeric_type(NumericOp::Div, NumericTy::Int, NumericTy::Int, None), NumericTy::Float);
/// assert_eq!(
///     result_numeric_type(NumericOp::Pow, NumericTy::Int, NumericTy::Int, Some(PowExponentKind::NonNegativeInt)),
///     NumericTy::Int
/// );
/// ```
pub fn result_numeric_type(
    op: NumericOp,
    lhs: NumericTy,
    rhs: NumericTy,
    pow_exp_kind: Option<PowExponentKind>,
) -> NumericTy {
    match op {
        NumericOp::Div => NumericTy::Float,

        NumericOp::FloorDiv | NumericOp::Mod | NumericOp::Add | NumericOp::Sub | NumericOp::Mul => {
            if lhs == NumericTy::Float || rhs == NumericTy::Float {
                NumericTy::Float
            } else {
                NumericTy::Int
            }
        }

        NumericOp::Pow => {
            if lhs == NumericTy::Int && rhs == NumericTy::Int {
                match pow_exp_kind {
                    Some(PowExponentKind::NonNegativeInt) => NumericTy::Int,
                    _ => NumericTy::Float,
                }
            } else {
                NumericTy::Float
            }
        }
    }
}

// =====================================================================
// Runtime-facing numeric helpers (pure)
// =====================================================================

/// Python-like modulo for integers (sign of divisor).
///
/// ## Parameters
/// - `a`: dividend
/// - `b`: divisor (must be non-zero)
///
/// ## Returns
/// - (`i64`): remainder with the sign of the divisor.
#[inline]
pub fn py_mod_i64_impl(a: i64, b: i64) -> i64 {
    debug_assert!(b != 0);
    // `wrapping_rem` keeps `i64::MIN % -1` at 0 instead of overflowing.
    let r = a.wrapping_rem(b);
    if (r > 0 && b < 0) || (r < 0 && b > 0) { r + b } else { r }
}

/// Python-like floor division for integers (rounds toward negative infinity).
///
/// ## Parameters
/// - `a`: dividend
/// - `b`: divisor (must be non-zero)
///
/// ## Returns
/// - `Some(i64)`: quotient rounded toward negative infinity.
/// - `None`: if the quotient overflows (`i64::MIN // -1`).
#[inline]
pub fn py_floor_div_i64_impl(a: i64, b: i64) -> Option<i64> {
    debug_assert!(b != 0);
    let q = a.checked_div(b)?;
    let r = a % b;
    if (r > 0 && b < 0) || (r < 0 && b > 0) { Some(q - 1) } else { Some(q) }
}

/// Python-like modulo for floats (sign of divisor).
///
/// ## Parameters
/// - `a`: dividend
/// - `b`: divisor (must be non-zero)
///
/// ## Returns
/// - (`f64`): remainder with the sign of the divisor.
#[inline]
pub fn py_mod_f64_impl(a: f64, b: f64) -> f64 {
    debug_assert!(b != 0.0);
    let r = a % b;
    if (r > 0.0 && b < 0.0) || (r < 0.0 && b > 0.0) {
        r + b
    } else {
        r
    }
}

/// Python-like floor division for floats.
#[inline]
pub fn py_floor_div_f64_impl(a: f64, b: f64) -> f64 {
    debug_assert!(b != 0.0);
    (a / b).floor()
}

/// Python-like round-half-to-even for floats (`round(x)` with no digits).
pub fn py_round_half_even(value: f64) -> f64 {
    let rounded = value.round();
    if (value - value.trunc()).abs() == 0.5 {
        // Ties go to the even neighbour.
        2.0 * (value / 2.0).round()
    } else {
        rounded
    }
}

/// Format a float the way Python's `repr(float)` does.
///
/// ## Notes
/// - Uses the shortest round-trip digits (Rust's `{:e}` formatting).
/// - Positional notation is used for decimal exponents in `-4..16`, scientific notation otherwise
///   (`1e+20`, `1e-05`).
/// - Integral floats keep a trailing `.0`.
///
/// ## Examples
/// ```rust
/// use unitgen_core::format_float_repr;
///
/// assert_eq!(format_float_repr(3.0), "3.0");
/// assert_eq!(format_float_repr(0.1), "0.1");
/// assert_eq!(format_float_repr(1e20), "1e+20");
/// assert_eq!(format_float_repr(0.00001), "1e-05");
/// ```
pub fn format_float_repr(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }

    let sci = format!("{:e}", value.abs());
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let sign = if value < 0.0 { "-" } else { "" };

    if (-4..16).contains(&exp) {
        if exp >= 0 {
            let int_len = exp as usize + 1;
            if digits.len() <= int_len {
                format!("{sign}{}{}.0", digits, "0".repeat(int_len - digits.len()))
            } else {
                format!("{sign}{}.{}", &digits[..int_len], &digits[int_len..])
            }
        } else {
            format!("{sign}0.{}{}", "0".repeat((-exp - 1) as usize), digits)
        }
    } else {
        let head = &digits[..1];
        let tail = &digits[1..];
        let exp_sign = if exp < 0 { '-' } else { '+' };
        if tail.is_empty() {
            format!("{sign}{head}e{exp_sign}{:02}", exp.abs())
        } else {
            format!("{sign}{head}.{tail}e{exp_sign}{:02}", exp.abs())
        }
    }
}
