//! Arbitrary-precision `int` arithmetic.
//!
//! [`Value::Int`] holds every integer that fits in 64 bits. Results outside that range are promoted to
//! [`Value::BigInt`] and demoted again as soon as they fit; a `BigInt` value is never in the 64-bit range.
//!
//! Integers are capped at [`MAX_INT_BITS`]; anything wider raises `OverflowError` instead of exhausting memory.

use std::rc::Rc;

use num_bigint::BigInt;
use num_traits::{FromPrimitive, One, Signed, ToPrimitive, Zero};
use unitgen_core::NumericOp;
use unitgen_core::errors::{DIVISION_BY_ZERO_MSG, ErrorKind, INT_DIVMOD_BY_ZERO_MSG};

use super::error::Exception;
use super::value::Value;

/// Widest integer a computation may produce (about 30 000 decimal digits).
pub const MAX_INT_BITS: u64 = 100_000;

/// Operands are shifted down to this many bits before a true division.
const DIVISION_BITS: u64 = 1_000;

/// `n` as an `int` value, in its 64-bit form when it fits.
pub fn int_value(n: BigInt) -> Value {
    match n.to_i64() {
        Some(small) => Value::Int(small),
        None => Value::BigInt(Rc::new(n)),
    }
}

/// Parse literal digits in `radix` (no sign, no separators).
pub fn parse_digits(digits: &str, radix: u32) -> Option<Value> {
    let n = BigInt::parse_bytes(digits.as_bytes(), radix)?;
    (n.bits() <= MAX_INT_BITS).then(|| int_value(n))
}

/// An integer literal too wide for 64 bits.
pub fn literal(digits: &str, radix: u32) -> Result<Value, Exception> {
    parse_digits(digits, radix).ok_or_else(|| Exception::new(ErrorKind::OverflowError, "integer literal too large"))
}

/// The integer value of an integral float (`int(1e20)`).
pub fn from_integral_float(f: f64) -> Result<Value, Exception> {
    BigInt::from_f64(f.trunc())
        .map(int_value)
        .ok_or_else(|| Exception::new(ErrorKind::OverflowError, "cannot convert float infinity to integer"))
}

/// `float(n)`; `OverflowError` when `n` is beyond the float range.
pub fn to_f64(n: &BigInt) -> Result<f64, Exception> {
    n.to_f64()
        .filter(|f| f.is_finite())
        .ok_or_else(|| Exception::new(ErrorKind::OverflowError, "int too large to convert to float"))
}

fn too_large() -> Exception {
    Exception::overflow()
}

/// `a op b` on arbitrary-precision operands.
///
/// Integer operators return an `int`; `/` returns the correctly scaled `float`.
pub fn big_arith(op: NumericOp, a: &BigInt, b: &BigInt) -> Result<Value, Exception> {
    let result = match op {
        NumericOp::Add => a + b,
        NumericOp::Sub => a - b,
        NumericOp::Mul => {
            if a.bits() + b.bits() > MAX_INT_BITS + 1 {
                return Err(too_large());
            }
            a * b
        }
        NumericOp::FloorDiv => floor_divmod(a, b)?.0,
        NumericOp::Mod => floor_divmod(a, b)?.1,
        NumericOp::Pow => pow(a, b)?,
        NumericOp::Div => return true_div(a, b).map(Value::Float),
    };
    if result.bits() > MAX_INT_BITS {
        return Err(too_large());
    }
    Ok(int_value(result))
}

/// Quotient and remainder rounded toward negative infinity; the remainder takes the divisor's sign.
fn floor_divmod(a: &BigInt, b: &BigInt) -> Result<(BigInt, BigInt), Exception> {
    if b.is_zero() {
        return Err(Exception::zero_division(INT_DIVMOD_BY_ZERO_MSG));
    }
    let (mut quotient, mut remainder) = (a / b, a % b);
    if !remainder.is_zero() && remainder.sign() != b.sign() {
        quotient -= BigInt::one();
        remainder += b;
    }
    Ok((quotient, remainder))
}

/// `base ** exponent` for a non-negative exponent.
fn pow(base: &BigInt, exponent: &BigInt) -> Result<BigInt, Exception> {
    if exponent.is_negative() {
        return Err(Exception::value_error("negative exponent has no integer result"));
    }
    if base.is_zero() {
        return Ok(if exponent.is_zero() { BigInt::one() } else { BigInt::zero() });
    }
    if base.abs().is_one() {
        let odd = !(exponent % BigInt::from(2)).is_zero();
        return Ok(if base.is_negative() && odd { -BigInt::one() } else { BigInt::one() });
    }
    let Some(exp) = exponent.to_u32() else {
        return Err(too_large());
    };
    if (base.bits() - 1).saturating_mul(u64::from(exp)) > MAX_INT_BITS {
        return Err(too_large());
    }
    Ok(base.pow(exp))
}

/// `a / b` as a float for operands of any width.
fn true_div(a: &BigInt, b: &BigInt) -> Result<f64, Exception> {
    if b.is_zero() {
        return Err(Exception::zero_division(DIVISION_BY_ZERO_MSG));
    }
    let shift = a.bits().max(b.bits()).saturating_sub(DIVISION_BITS);
    let (a, b) = (a >> shift, b >> shift);
    if b.is_zero() {
        return Err(Exception::new(
            ErrorKind::OverflowError,
            "integer division result too large for a float",
        ));
    }
    let quotient = to_f64(&a)? / to_f64(&b)?;
    if !quotient.is_finite() {
        return Err(Exception::new(
            ErrorKind::OverflowError,
            "integer division result too large for a float",
        ));
    }
    Ok(quotient)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn big(text: &str) -> BigInt {
        BigInt::parse_bytes(text.as_bytes(), 10).unwrap()
    }

    #[test]
    fn test_results_demote_when_they_fit() {
        let sum = big_arith(NumericOp::Sub, &big("18446744073709551616"), &big("18446744073709551615")).unwrap();
        assert!(matches!(sum, Value::Int(1)));
        assert!(matches!(int_value(big("9223372036854775808")), Value::BigInt(_)));
    }

    #[test]
    fn test_floor_semantics_match_small_ints() {
        let a = big("-100000000000000000000");
        let b = BigInt::from(7);
        assert_eq!(big_arith(NumericOp::FloorDiv, &a, &b).unwrap().repr(), "-14285714285714285715");
        assert_eq!(big_arith(NumericOp::Mod, &a, &b).unwrap().repr(), "5");
        assert_eq!(
            big_arith(NumericOp::Mod, &a, &BigInt::zero()).unwrap_err().kind(),
            ErrorKind::ZeroDivisionError
        );
    }

    #[test]
    fn test_pow_and_width_cap() {
        let two = BigInt::from(2);
        let power = big_arith(NumericOp::Pow, &two, &BigInt::from(100)).unwrap();
        assert_eq!(power.repr(), "1267650600228229401496703205376");
        let sign = big_arith(NumericOp::Pow, &BigInt::from(-1), &big("100000000000000000001")).unwrap();
        assert_eq!(sign.repr(), "-1");
        let err = big_arith(NumericOp::Pow, &two, &BigInt::from(1_000_000)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OverflowError);
    }

    #[test]
    fn test_true_division_of_wide_operands() {
        let a = BigInt::one() << 1100u32;
        let b = BigInt::one() << 1099u32;
        assert_eq!(big_arith(NumericOp::Div, &a, &b).unwrap().repr(), "2.0");
        assert_eq!(to_f64(&a).unwrap_err().message(), "int too large to convert to float");
    }

    #[test]
    fn test_parse_digits_and_floats() {
        assert_eq!(parse_digits("ffffffffffffffff", 16).unwrap().repr(), "18446744073709551615");
        assert!(matches!(parse_digits("42", 10), Some(Value::Int(42))));
        assert_eq!(from_integral_float(1e20).unwrap().repr(), "100000000000000000000");
    }
}
