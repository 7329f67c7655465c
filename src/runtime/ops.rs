//! Operator semantics shared by the module runtime and the case-argument evaluator.
//!
//! Everything here is **pure**: no interpreter state, no dunder dispatch. The interpreter consults user-defined
//! `__add__`/`__eq__`/... first and falls back to these functions; the argument evaluator only ever sees
//! literals and calls them directly, which keeps `1/2`, `-7 // 2` and `"a" * 3` identical in both places.
//!
//! Numeric semantics follow Python:
//!
//! - `/` always yields `float`
//! - `//` and `%` floor toward negative infinity; `%` takes the sign of the divisor
//! - `**` yields `int` only for an `int` base with a non-negative `int` exponent
//! - `bool` participates as `0`/`1`
//! - `int` results that leave the 64-bit range continue as arbitrary-precision integers ([`super::bigint`])

use std::cmp::Ordering;

use num_bigint::BigInt;
use num_traits::{FromPrimitive, Signed};

use unitgen_core::errors::{DIVISION_BY_ZERO_MSG, ErrorKind, FLOAT_DIVISION_BY_ZERO_MSG, INT_DIVMOD_BY_ZERO_MSG};
use unitgen_core::strings::{self, SequenceError};
use unitgen_core::{
    NumericOp, NumericTy, PowExponentKind, py_floor_div_f64_impl, py_floor_div_i64_impl, py_mod_f64_impl,
    py_mod_i64_impl, result_numeric_type,
};
use unitgen_syntax::ast::{BinaryOp, CompareOp, UnaryOp};

use super::bigint;
use super::error::Exception;
use super::format;
use super::value::{MAX_REPEAT_LEN, Value};

// ============================================================================
// Arithmetic
// ============================================================================

/// Apply a binary operator to two evaluated operands.
///
/// `and`/`or` are accepted for completeness and return the deciding operand, but callers that need
/// short-circuiting must handle them before evaluating the right side.
pub fn binary_op(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, Exception> {
    match op {
        BinaryOp::And => return Ok(if lhs.is_truthy() { rhs.clone() } else { lhs.clone() }),
        BinaryOp::Or => return Ok(if lhs.is_truthy() { lhs.clone() } else { rhs.clone() }),
        _ => {}
    }

    if lhs.is_number() && rhs.is_number() {
        return arith(op, lhs, rhs);
    }

    match (op, lhs, rhs) {
        (BinaryOp::Add, Value::Str(a), Value::Str(b)) => {
            let mut s = String::with_capacity(a.len() + b.len());
            s.push_str(a);
            s.push_str(b);
            Ok(Value::string(s))
        }
        (BinaryOp::Add, Value::List(a), Value::List(b)) => {
            let mut items = a.borrow().clone();
            items.extend(b.borrow().iter().cloned());
            Ok(Value::list(items))
        }
        (BinaryOp::Add, Value::Tuple(a), Value::Tuple(b)) => {
            Ok(Value::tuple(a.iter().chain(b.iter()).cloned().collect()))
        }
        (BinaryOp::Add, Value::Str(_) | Value::List(_) | Value::Tuple(_), _) => Err(Exception::type_error(format!(
            "can only concatenate {} (not \"{}\") to {}",
            lhs.type_name(),
            rhs.type_name(),
            lhs.type_name()
        ))),
        (BinaryOp::Mul, Value::Str(_) | Value::List(_) | Value::Tuple(_), _) => repeat(lhs, rhs),
        (BinaryOp::Mul, _, Value::Str(_) | Value::List(_) | Value::Tuple(_)) => repeat(rhs, lhs),
        (BinaryOp::Mod, Value::Str(template), _) => format::percent_format(template, rhs).map(Value::string),
        _ => Err(unsupported(op, lhs, rhs)),
    }
}

fn unsupported(op: BinaryOp, lhs: &Value, rhs: &Value) -> Exception {
    let symbol = if op == BinaryOp::Pow {
        "** or pow()".to_string()
    } else {
        op.to_string()
    };
    Exception::type_error(format!(
        "unsupported operand type(s) for {symbol}: '{}' and '{}'",
        lhs.type_name(),
        rhs.type_name()
    ))
}

fn num_ty(v: &Value) -> NumericTy {
    if v.is_int() {
        NumericTy::Int
    } else {
        NumericTy::Float
    }
}

fn numeric_op(op: BinaryOp) -> Option<NumericOp> {
    Some(match op {
        BinaryOp::Add => NumericOp::Add,
        BinaryOp::Sub => NumericOp::Sub,
        BinaryOp::Mul => NumericOp::Mul,
        BinaryOp::Div => NumericOp::Div,
        BinaryOp::FloorDiv => NumericOp::FloorDiv,
        BinaryOp::Mod => NumericOp::Mod,
        BinaryOp::Pow => NumericOp::Pow,
        BinaryOp::And | BinaryOp::Or => return None,
    })
}

fn arith(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, Exception> {
    let Some(nop) = numeric_op(op) else {
        return Err(unsupported(op, lhs, rhs));
    };
    let (lt, rt) = (num_ty(lhs), num_ty(rhs));
    let exponent = match rhs {
        Value::BigInt(n) => Some(if n.is_negative() { -1 } else { 1 }),
        other => other.as_int(),
    };
    let pow_kind = (nop == NumericOp::Pow).then(|| PowExponentKind::classify(rt == NumericTy::Float, exponent));
    let both_int = lt == NumericTy::Int && rt == NumericTy::Int;

    if result_numeric_type(nop, lt, rt, pow_kind) == NumericTy::Int {
        if let (Some(a), Some(b)) = (lhs.as_int(), rhs.as_int()) {
            if let Some(n) = int_arith(nop, a, b)? {
                return Ok(Value::Int(n));
            }
        }
        return match (lhs.as_bigint(), rhs.as_bigint()) {
            (Some(a), Some(b)) => bigint::big_arith(nop, &a, &b),
            _ => Err(unsupported(op, lhs, rhs)),
        };
    }

    let wide = matches!(lhs, Value::BigInt(_)) || matches!(rhs, Value::BigInt(_));
    if both_int && wide && nop == NumericOp::Div {
        if let (Some(a), Some(b)) = (lhs.as_bigint(), rhs.as_bigint()) {
            return bigint::big_arith(nop, &a, &b);
        }
    }
    float_arith(nop, float_operand(lhs)?, float_operand(rhs)?, both_int).map(Value::Float)
}

fn float_operand(value: &Value) -> Result<f64, Exception> {
    match value {
        Value::BigInt(n) => bigint::to_f64(n),
        other => other
            .as_float()
            .ok_or_else(|| Exception::type_error(format!("must be real number, not {}", other.type_name()))),
    }
}

/// 64-bit fast path; `Ok(None)` when the result needs a wider integer.
fn int_arith(op: NumericOp, a: i64, b: i64) -> Result<Option<i64>, Exception> {
    let result = match op {
        NumericOp::Add => a.checked_add(b),
        NumericOp::Sub => a.checked_sub(b),
        NumericOp::Mul => a.checked_mul(b),
        NumericOp::FloorDiv => {
            if b == 0 {
                return Err(Exception::zero_division(INT_DIVMOD_BY_ZERO_MSG));
            }
            py_floor_div_i64_impl(a, b)
        }
        NumericOp::Mod => {
            if b == 0 {
                return Err(Exception::zero_division(INT_DIVMOD_BY_ZERO_MSG));
            }
            Some(py_mod_i64_impl(a, b))
        }
        NumericOp::Pow => u32::try_from(b).ok().and_then(|exp| a.checked_pow(exp)),
        // `/` never yields an int.
        NumericOp::Div => None,
    };
    Ok(result)
}

fn float_arith(op: NumericOp, a: f64, b: f64, both_int: bool) -> Result<f64, Exception> {
    match op {
        NumericOp::Add => Ok(a + b),
        NumericOp::Sub => Ok(a - b),
        NumericOp::Mul => Ok(a * b),
        NumericOp::Div => {
            if b == 0.0 {
                let msg = if both_int { DIVISION_BY_ZERO_MSG } else { FLOAT_DIVISION_BY_ZERO_MSG };
                return Err(Exception::zero_division(msg));
            }
            Ok(a / b)
        }
        NumericOp::FloorDiv => {
            if b == 0.0 {
                return Err(Exception::zero_division("float floor division by zero"));
            }
            Ok(py_floor_div_f64_impl(a, b))
        }
        NumericOp::Mod => {
            if b == 0.0 {
                return Err(Exception::zero_division("float modulo"));
            }
            Ok(py_mod_f64_impl(a, b))
        }
        NumericOp::Pow => {
            if a == 0.0 && b < 0.0 {
                return Err(Exception::zero_division("0.0 cannot be raised to a negative power"));
            }
            if a < 0.0 && b.fract() != 0.0 && b.is_finite() {
                return Err(Exception::value_error(
                    "negative number cannot be raised to a fractional power",
                ));
            }
            let result = a.powf(b);
            if result.is_infinite() && a.is_finite() && b.is_finite() {
                return Err(Exception::new(ErrorKind::OverflowError, "numerical result out of range"));
            }
            Ok(result)
        }
    }
}

/// Length of `seq * n` if the operands form a sequence repetition.
///
/// Lets callers with tighter limits than [`MAX_REPEAT_LEN`] refuse before anything is allocated.
pub fn repeat_len(lhs: &Value, rhs: &Value) -> Option<usize> {
    let (seq, count) = match (lhs, rhs) {
        (Value::Str(_) | Value::List(_) | Value::Tuple(_), n) => (lhs, n.as_int()?),
        (n, Value::Str(_) | Value::List(_) | Value::Tuple(_)) => (rhs, n.as_int()?),
        _ => return None,
    };
    let len = match seq {
        Value::Str(s) => s.len(),
        Value::List(items) => items.borrow().len(),
        Value::Tuple(items) => items.len(),
        _ => return None,
    };
    Some(len.saturating_mul(usize::try_from(count.max(0)).unwrap_or(usize::MAX)))
}

fn repeat(seq: &Value, count: &Value) -> Result<Value, Exception> {
    if let Value::BigInt(n) = count {
        if n.is_negative() {
            return Ok(match seq {
                Value::Str(_) => Value::str(""),
                Value::List(_) => Value::list(Vec::new()),
                _ => Value::tuple(Vec::new()),
            });
        }
        return Err(Exception::new(
            ErrorKind::OverflowError,
            "cannot fit 'int' into an index-sized integer",
        ));
    }
    let Some(n) = count.as_int() else {
        return Err(Exception::type_error(format!(
            "can't multiply sequence by non-int of type '{}'",
            count.type_name()
        )));
    };
    let total = repeat_len(seq, count).unwrap_or(0);
    if total > MAX_REPEAT_LEN {
        return Err(Exception::new(
            ErrorKind::OverflowError,
            format!("repeated sequence of {total} items is too long"),
        ));
    }
    let n = usize::try_from(n.max(0)).unwrap_or(0);
    Ok(match seq {
        Value::Str(s) => Value::string(s.repeat(n)),
        Value::List(items) => {
            let items = items.borrow();
            Value::list(items.iter().cloned().cycle().take(items.len() * n).collect())
        }
        Value::Tuple(items) => Value::tuple(items.iter().cloned().cycle().take(items.len() * n).collect()),
        _ => return Err(unsupported(BinaryOp::Mul, seq, count)),
    })
}

/// Apply a unary operator.
pub fn unary_op(op: UnaryOp, operand: &Value) -> Result<Value, Exception> {
    match (op, operand) {
        (UnaryOp::Not, v) => Ok(Value::Bool(!v.is_truthy())),
        (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
        (UnaryOp::Pos, Value::Float(f)) => Ok(Value::Float(*f)),
        (UnaryOp::Neg, Value::BigInt(n)) => Ok(bigint::int_value(-BigInt::clone(n))),
        (UnaryOp::Pos, Value::BigInt(_)) => Ok(operand.clone()),
        (UnaryOp::Neg, v) if v.as_int().is_some() => {
            let n = v.as_int().unwrap_or_default();
            Ok(match n.checked_neg() {
                Some(negated) => Value::Int(negated),
                None => bigint::int_value(-BigInt::from(n)),
            })
        }
        (UnaryOp::Pos, v) if v.as_int().is_some() => Ok(Value::Int(v.as_int().unwrap_or_default())),
        (op, v) => Err(Exception::type_error(format!(
            "bad operand type for unary {op}: '{}'",
            v.type_name()
        ))),
    }
}

// ============================================================================
// Comparison
// ============================================================================

/// Evaluate one link of a comparison chain.
pub fn compare_op(op: CompareOp, lhs: &Value, rhs: &Value) -> Result<bool, Exception> {
    match op {
        CompareOp::Eq => Ok(values_equal(lhs, rhs)),
        CompareOp::NotEq => Ok(!values_equal(lhs, rhs)),
        CompareOp::In => contains(rhs, lhs),
        CompareOp::NotIn => contains(rhs, lhs).map(|found| !found),
        CompareOp::Is => Ok(lhs.is_same(rhs)),
        CompareOp::IsNot => Ok(!lhs.is_same(rhs)),
        CompareOp::Lt | CompareOp::LtEq | CompareOp::Gt | CompareOp::GtEq => {
            let Some(ordering) = ordering(op, lhs, rhs)? else {
                // NaN is unordered against everything.
                return Ok(false);
            };
            Ok(match op {
                CompareOp::Lt => ordering == Ordering::Less,
                CompareOp::LtEq => ordering != Ordering::Greater,
                CompareOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            })
        }
    }
}

/// Python ordering between two values, `None` when unordered (NaN).
pub fn ordering(op: CompareOp, lhs: &Value, rhs: &Value) -> Result<Option<Ordering>, Exception> {
    if let (Some(a), Some(b)) = (lhs.as_int(), rhs.as_int()) {
        return Ok(Some(a.cmp(&b)));
    }
    if lhs.is_number() && rhs.is_number() && (wide_int(lhs) || wide_int(rhs)) {
        return Ok(wide_ordering(lhs, rhs));
    }
    if let (Some(a), Some(b)) = (lhs.as_float(), rhs.as_float()) {
        return Ok(a.partial_cmp(&b));
    }
    match (lhs, rhs) {
        (Value::Str(a), Value::Str(b)) => Ok(Some(a.cmp(b))),
        (Value::List(a), Value::List(b)) => {
            let (a, b) = (a.borrow().clone(), b.borrow().clone());
            sequence_ordering(op, &a, &b)
        }
        (Value::Tuple(a), Value::Tuple(b)) => sequence_ordering(op, a, b),
        _ => Err(Exception::type_error(format!(
            "'{op}' not supported between instances of '{}' and '{}'",
            lhs.type_name(),
            rhs.type_name()
        ))),
    }
}

fn wide_int(value: &Value) -> bool {
    matches!(value, Value::BigInt(_))
}

/// Exact ordering between numbers when at least one is an arbitrary-precision `int`.
fn wide_ordering(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (exact_int(lhs), exact_int(rhs)) {
        (Some(a), Some(b)) => Some(a.cmp(&b)),
        // A non-integral or infinite float against a wide int: the float's magnitude decides.
        _ => {
            let (a, b) = (lhs.as_float().unwrap_or_else(|| saturate(lhs)), rhs.as_float().unwrap_or_else(|| saturate(rhs)));
            a.partial_cmp(&b)
        }
    }
}

/// The integer a number equals exactly, if any.
fn exact_int(value: &Value) -> Option<BigInt> {
    match value {
        Value::Float(f) if f.fract() == 0.0 => BigInt::from_f64(*f),
        Value::Float(_) => None,
        other => other.as_bigint(),
    }
}

/// Infinity with the sign of an `int` too wide for a float.
fn saturate(value: &Value) -> f64 {
    match value {
        Value::BigInt(n) if n.is_negative() => f64::NEG_INFINITY,
        _ => f64::INFINITY,
    }
}

fn sequence_ordering(op: CompareOp, a: &[Value], b: &[Value]) -> Result<Option<Ordering>, Exception> {
    for (x, y) in a.iter().zip(b.iter()) {
        if !values_equal(x, y) {
            return ordering(op, x, y);
        }
    }
    Ok(Some(a.len().cmp(&b.len())))
}

/// Python `==`.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    if let (Some(x), Some(y)) = (a.as_int(), b.as_int()) {
        return x == y;
    }
    if a.is_number() && b.is_number() && (wide_int(a) || wide_int(b)) {
        return wide_ordering(a, b) == Some(Ordering::Equal);
    }
    if let (Some(x), Some(y)) = (a.as_float(), b.as_float()) {
        return x == y;
    }
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::List(x), Value::List(y)) => {
            std::rc::Rc::ptr_eq(x, y) || slices_equal(&x.borrow(), &y.borrow())
        }
        (Value::Tuple(x), Value::Tuple(y)) => slices_equal(x, y),
        (Value::Dict(x), Value::Dict(y)) => {
            if std::rc::Rc::ptr_eq(x, y) {
                return true;
            }
            let (x, y) = (x.borrow(), y.borrow());
            x.len() == y.len()
                && x.iter().all(|(k, v)| match y.get(k) {
                    Ok(Some(other)) => values_equal(v, &other),
                    _ => false,
                })
        }
        (Value::Set(x), Value::Set(y)) => {
            if std::rc::Rc::ptr_eq(x, y) {
                return true;
            }
            let (x, y) = (x.borrow(), y.borrow());
            x.len() == y.len() && x.iter().all(|item| y.contains(item).unwrap_or(false))
        }
        (Value::Range(x), Value::Range(y)) => {
            let (lx, ly) = (x.len(), y.len());
            lx == ly && (lx == 0 || (x.start == y.start && (lx == 1 || x.step == y.step)))
        }
        _ => a.is_same(b),
    }
}

fn slices_equal(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| values_equal(x, y))
}

/// Python `item in container`.
pub fn contains(container: &Value, item: &Value) -> Result<bool, Exception> {
    match container {
        Value::Str(haystack) => match item {
            Value::Str(needle) => Ok(haystack.contains(&**needle)),
            other => Err(Exception::type_error(format!(
                "'in <string>' requires string as left operand, not {}",
                other.type_name()
            ))),
        },
        Value::List(items) => Ok(items.borrow().iter().any(|v| values_equal(v, item))),
        Value::Tuple(items) => Ok(items.iter().any(|v| values_equal(v, item))),
        Value::Dict(d) => d.borrow().contains_key(item),
        Value::Set(s) => s.borrow().contains(item),
        Value::Range(r) => Ok(match (item.as_int(), item.as_float()) {
            (Some(n), _) => r.contains(n),
            (None, Some(f)) if f.fract() == 0.0 => r.contains(f as i64),
            _ => false,
        }),
        other => Err(Exception::type_error(format!(
            "argument of type '{}' is not iterable",
            other.type_name()
        ))),
    }
}

// ============================================================================
// Sequences
// ============================================================================

/// `len(value)` for builtin containers.
pub fn len_of(value: &Value) -> Result<usize, Exception> {
    match value {
        Value::Str(s) => Ok(s.chars().count()),
        Value::List(items) => Ok(items.borrow().len()),
        Value::Tuple(items) => Ok(items.len()),
        Value::Dict(d) => Ok(d.borrow().len()),
        Value::Set(s) => Ok(s.borrow().len()),
        Value::Range(r) => Ok(r.len()),
        other => Err(Exception::type_error(format!(
            "object of type '{}' has no len()",
            other.type_name()
        ))),
    }
}

/// `container[index]` for builtin containers.
pub fn get_index(container: &Value, index: &Value) -> Result<Value, Exception> {
    match container {
        Value::Dict(d) => d.borrow().get(index)?.ok_or_else(|| Exception::key_error(index)),
        Value::List(items) => {
            let items = items.borrow();
            let pos = sequence_position(container, index, items.len())?;
            Ok(items[pos].clone())
        }
        Value::Tuple(items) => {
            let pos = sequence_position(container, index, items.len())?;
            Ok(items[pos].clone())
        }
        Value::Range(r) => {
            let pos = sequence_position(container, index, r.len())?;
            Ok(Value::Int(r.nth(pos)))
        }
        Value::Str(s) => {
            let Some(i) = index.as_int() else {
                return Err(Exception::type_error(format!(
                    "string indices must be integers, not '{}'",
                    index.type_name()
                )));
            };
            strings::str_char_at(s, i)
                .map(Value::string)
                .map_err(|_| Exception::index_error("string index out of range"))
        }
        other => Err(Exception::type_error(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

/// Validate and normalize a sequence index (negative indices count from the end).
pub fn sequence_position(container: &Value, index: &Value, len: usize) -> Result<usize, Exception> {
    let type_name = match container {
        Value::Range(_) => "range object".to_string(),
        other => other.type_name(),
    };
    if let Value::BigInt(_) = index {
        return Err(Exception::index_error("cannot fit 'int' into an index-sized integer"));
    }
    let Some(i) = index.as_int() else {
        return Err(Exception::type_error(format!(
            "{type_name} indices must be integers or slices, not {}",
            index.type_name()
        )));
    };
    strings::normalize_index(len, i).ok_or_else(|| Exception::index_error(format!("{type_name} index out of range")))
}

/// `container[start:end:step]` for `str`, `list`, `tuple` and `range`.
pub fn get_slice(
    container: &Value,
    start: Option<i64>,
    end: Option<i64>,
    step: Option<i64>,
) -> Result<Value, Exception> {
    let seq_err = |e: SequenceError| Exception::value_error(e.message());
    match container {
        Value::Str(s) => strings::str_slice(s, start, end, step).map(Value::string).map_err(seq_err),
        Value::List(items) => {
            let items = items.borrow();
            let positions = strings::slice_indices(items.len(), start, end, step).map_err(seq_err)?;
            Ok(Value::list(positions.into_iter().map(|i| items[i].clone()).collect()))
        }
        Value::Tuple(items) => {
            let positions = strings::slice_indices(items.len(), start, end, step).map_err(seq_err)?;
            Ok(Value::tuple(positions.into_iter().map(|i| items[i].clone()).collect()))
        }
        Value::Range(_) => {
            let items = container.to_vec()?;
            let positions = strings::slice_indices(items.len(), start, end, step).map_err(seq_err)?;
            Ok(Value::list(positions.into_iter().map(|i| items[i].clone()).collect()))
        }
        other => Err(Exception::type_error(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bin(op: BinaryOp, a: impl Into<Value>, b: impl Into<Value>) -> Result<Value, Exception> {
        binary_op(op, &a.into(), &b.into())
    }

    #[test]
    fn test_true_division_is_float() {
        assert_eq!(bin(BinaryOp::Div, 1i64, 2i64).unwrap().repr(), "0.5");
        assert_eq!(bin(BinaryOp::Div, 4i64, 2i64).unwrap().repr(), "2.0");
    }

    #[test]
    fn test_floor_division_and_modulo_floor() {
        assert_eq!(bin(BinaryOp::FloorDiv, -7i64, 2i64).unwrap().repr(), "-4");
        assert_eq!(bin(BinaryOp::Mod, -7i64, 2i64).unwrap().repr(), "1");
        assert_eq!(bin(BinaryOp::FloorDiv, 7.5, 2i64).unwrap().repr(), "3.0");
    }

    #[test]
    fn test_zero_division_messages() {
        assert_eq!(bin(BinaryOp::Div, 1i64, 0i64).unwrap_err().message(), "division by zero");
        assert_eq!(
            bin(BinaryOp::FloorDiv, 1i64, 0i64).unwrap_err().message(),
            "integer division or modulo by zero"
        );
        assert_eq!(bin(BinaryOp::Div, 1.0, 0i64).unwrap_err().message(), "float division by zero");
        assert_eq!(bin(BinaryOp::Mod, 1i64, 0i64).unwrap_err().kind(), ErrorKind::ZeroDivisionError);
    }

    #[test]
    fn test_pow_result_types() {
        assert_eq!(bin(BinaryOp::Pow, 2i64, 10i64).unwrap().repr(), "1024");
        assert_eq!(bin(BinaryOp::Pow, 2i64, -1i64).unwrap().repr(), "0.5");
        assert_eq!(bin(BinaryOp::Pow, 2i64, 64i64).unwrap().repr(), "18446744073709551616");
    }

    #[test]
    fn test_int_results_widen_past_64_bits() {
        let wide = bin(BinaryOp::Add, i64::MAX, 1i64).unwrap();
        assert_eq!(wide.repr(), "9223372036854775808");
        assert_eq!(wide.type_name(), "int");
        assert_eq!(unary_op(UnaryOp::Neg, &Value::Int(i64::MIN)).unwrap().repr(), "9223372036854775808");
        let back = binary_op(BinaryOp::Sub, &wide, &Value::Int(1)).unwrap();
        assert!(matches!(back, Value::Int(i64::MAX)));
        assert_eq!(binary_op(BinaryOp::Div, &wide, &Value::Int(2)).unwrap().repr(), "4.611686018427388e+18");
        assert_eq!(binary_op(BinaryOp::Mod, &wide, &Value::Int(10)).unwrap().repr(), "8");
    }

    #[test]
    fn test_wide_int_comparisons_and_hashing() {
        let wide = bin(BinaryOp::Pow, 2i64, 64i64).unwrap();
        assert!(compare_op(CompareOp::Gt, &wide, &Value::Int(i64::MAX)).unwrap());
        assert!(compare_op(CompareOp::Lt, &wide, &Value::Float(f64::INFINITY)).unwrap());
        assert!(values_equal(&wide, &Value::Float(18446744073709551616.0)));
        assert!(!values_equal(&wide, &Value::Float(18446744073709551615.5)));
        assert_eq!(wide.hash_key().unwrap(), Value::Float(18446744073709551616.0).hash_key().unwrap());
        assert_eq!(
            get_index(&Value::list(vec![]), &wide).unwrap_err().message(),
            "cannot fit 'int' into an index-sized integer"
        );
        assert_eq!(binary_op(BinaryOp::Mul, &Value::str("ab"), &wide).unwrap_err().kind(), ErrorKind::OverflowError);
    }

    #[test]
    fn test_bool_is_numeric() {
        assert_eq!(bin(BinaryOp::Add, true, true).unwrap().repr(), "2");
        assert!(values_equal(&Value::Bool(true), &Value::Float(1.0)));
    }

    #[test]
    fn test_sequence_concat_and_repeat() {
        assert_eq!(bin(BinaryOp::Add, "ab", "cd").unwrap().repr(), "'abcd'");
        assert_eq!(bin(BinaryOp::Mul, "ab", 3i64).unwrap().repr(), "'ababab'");
        assert_eq!(bin(BinaryOp::Mul, 2i64, Value::list(vec![Value::Int(0)])).unwrap().repr(), "[0, 0]");
        assert_eq!(bin(BinaryOp::Mul, "ab", -1i64).unwrap().repr(), "''");
        assert_eq!(
            bin(BinaryOp::Add, "a", 1i64).unwrap_err().message(),
            "can only concatenate str (not \"int\") to str"
        );
    }

    #[test]
    fn test_huge_repeat_is_refused() {
        let err = bin(BinaryOp::Mul, "ab", 1i64 << 40).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OverflowError);
        assert_eq!(repeat_len(&Value::str("ab"), &Value::Int(3)), Some(6));
    }

    #[test]
    fn test_unsupported_operands() {
        let err = bin(BinaryOp::Sub, "a", 1i64).unwrap_err();
        assert_eq!(err.message(), "unsupported operand type(s) for -: 'str' and 'int'");
    }

    #[test]
    fn test_comparisons() {
        let lt = |a: Value, b: Value| compare_op(CompareOp::Lt, &a, &b);
        assert!(lt(Value::Int(1), Value::Float(1.5)).unwrap());
        assert!(lt(Value::str("abc"), Value::str("abd")).unwrap());
        let a = Value::tuple(vec![Value::Int(1), Value::Int(2)]);
        let b = Value::tuple(vec![Value::Int(1), Value::Int(3)]);
        assert!(lt(a, b).unwrap());
        assert!(!lt(Value::Float(f64::NAN), Value::Int(1)).unwrap());
        let err = lt(Value::Int(1), Value::str("a")).unwrap_err();
        assert_eq!(err.message(), "'<' not supported between instances of 'int' and 'str'");
    }

    #[test]
    fn test_membership() {
        assert!(contains(&Value::str("hello"), &Value::str("ell")).unwrap());
        assert!(contains(&Value::list(vec![Value::Int(1)]), &Value::Float(1.0)).unwrap());
        assert!(contains(&Value::str("a"), &Value::Int(1)).is_err());
    }

    #[test]
    fn test_indexing_errors() {
        let list = Value::list(vec![Value::Int(1)]);
        assert_eq!(get_index(&list, &Value::Int(-1)).unwrap().repr(), "1");
        assert_eq!(get_index(&list, &Value::Int(5)).unwrap_err().message(), "list index out of range");
        assert_eq!(
            get_index(&list, &Value::str("x")).unwrap_err().message(),
            "list indices must be integers or slices, not str"
        );
        assert_eq!(
            get_index(&Value::Int(3), &Value::Int(0)).unwrap_err().message(),
            "'int' object is not subscriptable"
        );
    }

    #[test]
    fn test_slicing() {
        let s = Value::str("hello");
        assert_eq!(get_slice(&s, None, None, Some(-1)).unwrap().repr(), "'olleh'");
        let t = Value::tuple(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(get_slice(&t, Some(1), None, None).unwrap().repr(), "(2, 3)");
        assert_eq!(
            get_slice(&t, None, None, Some(0)).unwrap_err().message(),
            "slice step cannot be zero"
        );
    }
}
