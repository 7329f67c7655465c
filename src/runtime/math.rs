//! The `math` module: native implementations behind the `unitgen_core::lang::math` registry.
//!
//! Both `import math` inside target code and the `math.` namespace of case-line arguments dispatch here, so a
//! case such as `area(math.pi * 2)` sees the same constant the module does.

use std::collections::HashMap;
use std::rc::Rc;

use num_bigint::BigInt;
use unitgen_core::errors::ErrorKind;
use unitgen_core::lang::math::{self, MATH_CONSTANTS, MATH_FUNCTIONS, MATH_MODULE_NAME, MathFnId};

use super::bigint::{self, MAX_INT_BITS};
use super::error::{Exception, check_arity};
use super::value::{Builtin, ModuleObject, Value};

fn domain_error() -> Exception {
    Exception::value_error("math domain error")
}

fn range_error() -> Exception {
    Exception::new(ErrorKind::OverflowError, "math range error")
}

/// Build the module object bound by `import math`.
pub fn math_module() -> Value {
    let mut attrs = HashMap::new();
    for f in MATH_FUNCTIONS {
        attrs.insert(f.item.canonical.to_string(), Value::Builtin(Builtin::Math(f.item.id)));
    }
    for c in MATH_CONSTANTS {
        attrs.insert(c.item.canonical.to_string(), Value::Float(c.value));
    }
    Value::Module(Rc::new(ModuleObject {
        name: MATH_MODULE_NAME.to_string(),
        attrs,
    }))
}

fn float_arg(value: &Value) -> Result<f64, Exception> {
    if let Value::BigInt(n) = value {
        return bigint::to_f64(n);
    }
    value.as_float().ok_or_else(|| {
        Exception::type_error(format!("must be real number, not {}", value.type_name()))
    })
}

fn int_arg(id: MathFnId, value: &Value) -> Result<i64, Exception> {
    match value {
        Value::Float(_) if id == MathFnId::Factorial => Err(Exception::type_error(
            "'float' object cannot be interpreted as an integer",
        )),
        other => other.as_int().ok_or_else(|| {
            Exception::type_error(format!(
                "'{}' object cannot be interpreted as an integer",
                other.type_name()
            ))
        }),
    }
}

/// Convert an integral float back to `int` (`floor`, `ceil`, `trunc`, `round`, `int()`).
pub(crate) fn float_to_int(f: f64) -> Result<Value, Exception> {
    if f.is_nan() {
        return Err(Exception::value_error("cannot convert float NaN to integer"));
    }
    if f.is_infinite() {
        return Err(Exception::new(
            ErrorKind::OverflowError,
            "cannot convert float infinity to integer",
        ));
    }
    if f < i64::MIN as f64 || f >= i64::MAX as f64 {
        return bigint::from_integral_float(f);
    }
    Ok(Value::Int(f as i64))
}

/// Reject NaN results produced from non-NaN inputs and infinite results from finite inputs.
fn checked(result: f64, inputs: &[f64]) -> Result<Value, Exception> {
    if result.is_nan() && !inputs.iter().any(|x| x.is_nan()) {
        return Err(domain_error());
    }
    if result.is_infinite() && inputs.iter().all(|x| x.is_finite()) {
        return Err(range_error());
    }
    Ok(Value::Float(result))
}

/// Call a `math` function with positional arguments.
pub fn call_math(id: MathFnId, args: &[Value]) -> Result<Value, Exception> {
    let name = math::fn_name(id);
    check_arity(&format!("math.{name}"), name, args.len(), math::fn_info(id).arity)?;

    match id {
        MathFnId::Floor | MathFnId::Ceil | MathFnId::Trunc => {
            if let Some(n) = args[0].as_int() {
                return Ok(Value::Int(n));
            }
            if let Value::BigInt(_) = &args[0] {
                return Ok(args[0].clone());
            }
        }
        MathFnId::Factorial => {
            let n = int_arg(id, &args[0])?;
            if n < 0 {
                return Err(Exception::value_error(
                    "factorial() not defined for negative values",
                ));
            }
            let mut acc = BigInt::from(1);
            for k in 2..=n {
                acc *= k;
                if acc.bits() > MAX_INT_BITS {
                    return Err(Exception::overflow());
                }
            }
            return Ok(bigint::int_value(acc));
        }
        MathFnId::Gcd => {
            let (mut a, mut b) = (
                int_arg(id, &args[0])?.unsigned_abs(),
                int_arg(id, &args[1])?.unsigned_abs(),
            );
            while b != 0 {
                (a, b) = (b, a % b);
            }
            return Ok(bigint::int_value(BigInt::from(a)));
        }
        _ => {}
    }

    let xs = args.iter().map(float_arg).collect::<Result<Vec<f64>, _>>()?;
    let x = xs[0];
    match id {
        MathFnId::Sqrt if x < 0.0 => Err(domain_error()),
        MathFnId::Sqrt => checked(x.sqrt(), &xs),
        MathFnId::Pow => {
            let y = xs[1];
            if x == 0.0 && y < 0.0 {
                return Err(domain_error());
            }
            checked(x.powf(y), &xs)
        }
        MathFnId::Fabs => Ok(Value::Float(x.abs())),
        MathFnId::Exp => checked(x.exp(), &xs),
        MathFnId::Log => {
            if x <= 0.0 {
                return Err(domain_error());
            }
            match xs.get(1) {
                None => checked(x.ln(), &xs),
                Some(&base) if base <= 0.0 => Err(domain_error()),
                Some(&base) if base == 1.0 => Err(Exception::zero_division("float division by zero")),
                Some(&base) => checked(x.ln() / base.ln(), &xs),
            }
        }
        MathFnId::Log10 | MathFnId::Log2 if x <= 0.0 => Err(domain_error()),
        MathFnId::Log10 => checked(x.log10(), &xs),
        MathFnId::Log2 => checked(x.log2(), &xs),
        MathFnId::Sin | MathFnId::Cos | MathFnId::Tan if x.is_infinite() => Err(domain_error()),
        MathFnId::Sin => checked(x.sin(), &xs),
        MathFnId::Cos => checked(x.cos(), &xs),
        MathFnId::Tan => checked(x.tan(), &xs),
        MathFnId::Asin | MathFnId::Acos if !(-1.0..=1.0).contains(&x) => Err(domain_error()),
        MathFnId::Asin => checked(x.asin(), &xs),
        MathFnId::Acos => checked(x.acos(), &xs),
        MathFnId::Atan => checked(x.atan(), &xs),
        MathFnId::Atan2 => checked(x.atan2(xs[1]), &xs),
        MathFnId::Hypot => Ok(Value::Float(x.hypot(xs[1]))),
        MathFnId::Degrees => Ok(Value::Float(x.to_degrees())),
        MathFnId::Radians => Ok(Value::Float(x.to_radians())),
        MathFnId::Copysign => Ok(Value::Float(x.copysign(xs[1]))),
        MathFnId::Fmod => {
            if xs[1] == 0.0 || x.is_infinite() {
                return Err(domain_error());
            }
            Ok(Value::Float(x % xs[1]))
        }
        MathFnId::Floor => float_to_int(x.floor()),
        MathFnId::Ceil => float_to_int(x.ceil()),
        MathFnId::Trunc => float_to_int(x.trunc()),
        MathFnId::Factorial | MathFnId::Gcd => Err(Exception::type_error(
            "'float' object cannot be interpreted as an integer",
        )),
        MathFnId::Isfinite => Ok(Value::Bool(x.is_finite())),
        MathFnId::Isinf => Ok(Value::Bool(x.is_infinite())),
        MathFnId::Isnan => Ok(Value::Bool(x.is_nan())),
        MathFnId::Isclose => {
            let y = xs[1];
            if x == y {
                return Ok(Value::Bool(true));
            }
            if x.is_infinite() || y.is_infinite() {
                return Ok(Value::Bool(false));
            }
            Ok(Value::Bool((x - y).abs() <= 1e-9 * x.abs().max(y.abs())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: &[Value]) -> Result<Value, Exception> {
        call_math(math::fn_from_str(name).unwrap(), args)
    }

    #[test]
    fn test_integer_results() {
        assert_eq!(call("floor", &[Value::Float(-2.5)]).unwrap(), Value::Int(-3));
        assert!(matches!(call("ceil", &[Value::Float(2.1)]).unwrap(), Value::Int(3)));
        assert_eq!(call("factorial", &[Value::Int(5)]).unwrap(), Value::Int(120));
        assert_eq!(call("gcd", &[Value::Int(12), Value::Int(-18)]).unwrap(), Value::Int(6));
    }

    #[test]
    fn test_integer_results_beyond_64_bits() {
        assert_eq!(call("factorial", &[Value::Int(25)]).unwrap().repr(), "15511210043330985984000000");
        assert_eq!(call("gcd", &[Value::Int(i64::MIN), Value::Int(0)]).unwrap().repr(), "9223372036854775808");
        assert_eq!(call("floor", &[Value::Float(1e20)]).unwrap().repr(), "100000000000000000000");
        let wide = call("factorial", &[Value::Int(21)]).unwrap();
        assert_eq!(call("trunc", &[wide.clone()]).unwrap(), wide);
        assert_eq!(call("sqrt", &[wide]).unwrap().repr(), "7147792818.185865");
        assert_eq!(call("factorial", &[Value::Int(100_000)]).unwrap_err().kind(), ErrorKind::OverflowError);
    }

    #[test]
    fn test_float_results() {
        assert_eq!(call("sqrt", &[Value::Int(16)]).unwrap(), Value::Float(4.0));
        assert_eq!(call("pow", &[Value::Int(2), Value::Int(10)]).unwrap().repr(), "1024.0");
        assert_eq!(call("log", &[Value::Int(8), Value::Int(2)]).unwrap(), Value::Float(3.0));
        assert_eq!(call("isclose", &[Value::Float(0.1 + 0.2), Value::Float(0.3)]).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_domain_and_arity_errors() {
        let err = call("sqrt", &[Value::Int(-1)]).unwrap_err();
        assert_eq!(err.qualified(), "ValueError: math domain error");
        let err = call("sqrt", &[Value::Int(1), Value::Int(2)]).unwrap_err();
        assert_eq!(err.message(), "math.sqrt() takes exactly one argument (2 given)");
        let err = call("pow", &[Value::Int(1)]).unwrap_err();
        assert_eq!(err.message(), "pow expected 2 arguments, got 1");
        let err = call("factorial", &[Value::Int(-1)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueError);
        let err = call("exp", &[Value::Int(1000)]).unwrap_err();
        assert_eq!(err.qualified(), "OverflowError: math range error");
        let err = call("sqrt", &[Value::str("4")]).unwrap_err();
        assert_eq!(err.message(), "must be real number, not str");
    }

    #[test]
    fn test_module_exposes_registry() {
        let Value::Module(module) = math_module() else {
            panic!("math_module must build a module");
        };
        assert_eq!(module.attrs.len(), MATH_FUNCTIONS.len() + MATH_CONSTANTS.len());
        assert_eq!(module.attrs["pi"], Value::Float(std::f64::consts::PI));
    }
}
