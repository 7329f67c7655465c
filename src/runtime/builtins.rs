//! Builtin functions (`len`, `sorted`, `isinstance`, the type constructors, ...).
//!
//! Names resolve here after the scope chain misses, so a module that defines its own `len` shadows the builtin.
//! The vocabulary comes from the `unitgen_core::lang::builtins` registry; exception class names come from
//! `unitgen_core::lang::errors`.
//!
//! ## Notes
//! - `reversed`, `enumerate` and `zip` return lists rather than lazy iterators. Target code can only observe
//!   the difference through `type()` or identity.
//! - Iteration goes through [`Interpreter::drain`], so every consumed item is charged against the step budget.

use num_bigint::BigInt;
use num_traits::{Signed, Zero};
use unitgen_core::lang::builtins::{self, BuiltinFnId};
use unitgen_core::lang::errors;
use unitgen_core::py_round_half_even;
use std::num::IntErrorKind;
use std::rc::Rc;

use unitgen_core::errors::ErrorKind;
use unitgen_syntax::ast::{BinaryOp, CompareOp, UnaryOp};

use super::bigint;
use super::dict::{PyDict, PySet};
use super::error::{Exception, ExecResult, check_arity};
use super::math::float_to_int;
use super::ops;
use super::value::{Builtin, Class, MethodWrapper, Range, Value, WrapperKind};
use super::Interpreter;

/// Resolve a builtin name: a registry function, an exception class or `object`.
pub(crate) fn builtin_value(name: &str) -> Option<Value> {
    if let Some(id) = builtins::from_str(name) {
        return Some(Value::Builtin(Builtin::Function(id)));
    }
    if let Some(kind) = errors::from_str(name) {
        return Some(Value::ExceptionClass(kind));
    }
    (name == "object").then_some(Value::Builtin(Builtin::Type("object")))
}

type Kwargs = Vec<(String, Value)>;

impl Interpreter {
    pub(crate) fn call_builtin(&mut self, id: BuiltinFnId, args: Vec<Value>, mut kwargs: Kwargs) -> ExecResult<Value> {
        let name = builtins::as_str(id);
        match id {
            BuiltinFnId::Print => {
                let sep = separator(take_kwarg(&mut kwargs, "sep"), " ", "sep")?;
                let end = separator(take_kwarg(&mut kwargs, "end"), "\n", "end")?;
                reject_extra(name, &kwargs)?;
                let parts = args.iter().map(|a| self.to_str(a)).collect::<ExecResult<Vec<_>>>()?;
                self.output.push_str(&parts.join(&sep));
                self.output.push_str(&end);
                Ok(Value::None)
            }
            BuiltinFnId::Len => {
                reject_extra(name, &kwargs)?;
                let [value] = exact(name, args)?;
                if let Some(result) = self.call_dunder(&value, "__len__", Vec::new())? {
                    return match result {
                        Value::Int(n) if n >= 0 => Ok(Value::Int(n)),
                        Value::Int(_) => Err(Exception::value_error("__len__() should return >= 0").into()),
                        other => Err(not_an_integer(&other).into()),
                    };
                }
                Ok(Value::Int(ops::len_of(&value)? as i64))
            }
            BuiltinFnId::Abs => {
                reject_extra(name, &kwargs)?;
                let [value] = exact(name, args)?;
                match value {
                    Value::Int(n) => Ok(bigint::int_value(BigInt::from(n).abs())),
                    Value::BigInt(n) => Ok(bigint::int_value(n.abs())),
                    Value::Bool(b) => Ok(Value::Int(b as i64)),
                    Value::Float(f) => Ok(Value::Float(f.abs())),
                    other => match self.call_dunder(&other, "__abs__", Vec::new())? {
                        Some(result) => Ok(result),
                        None => Err(Exception::type_error(format!(
                            "bad operand type for abs(): '{}'",
                            other.type_name()
                        ))
                        .into()),
                    },
                }
            }
            BuiltinFnId::Min | BuiltinFnId::Max => self.min_max(id, args, kwargs),
            BuiltinFnId::Sum => {
                let start = take_kwarg(&mut kwargs, "start");
                reject_extra(name, &kwargs)?;
                let args = between(name, args, 1, 2)?;
                let mut acc = args.get(1).cloned().or(start).unwrap_or(Value::Int(0));
                if let Value::Str(_) = acc {
                    return Err(Exception::type_error("sum() can't sum strings [use ''.join(seq) instead]").into());
                }
                for item in self.drain(&args[0])? {
                    acc = self.binary(BinaryOp::Add, &acc, &item)?;
                }
                Ok(acc)
            }
            BuiltinFnId::Range => {
                reject_extra(name, &kwargs)?;
                let args = between(name, args, 1, 3)?;
                let ints = args.iter().map(integer_arg).collect::<Result<Vec<i64>, _>>()?;
                let (start, stop, step) = match *ints.as_slice() {
                    [stop] => (0, stop, 1),
                    [start, stop] => (start, stop, 1),
                    [start, stop, step] => (start, stop, step),
                    _ => return Err(Exception::type_error("range expected at most 3 arguments").into()),
                };
                if step == 0 {
                    return Err(Exception::value_error("range() arg 3 must not be zero").into());
                }
                Ok(Value::Range(Range { start, stop, step }))
            }
            BuiltinFnId::Sorted => {
                let key = take_kwarg(&mut kwargs, "key").filter(|k| !matches!(k, Value::None));
                let reverse = take_kwarg(&mut kwargs, "reverse");
                reject_extra(name, &kwargs)?;
                let [iterable] = exact(name, args)?;
                let reverse = match reverse {
                    Some(flag) => self.is_truthy(&flag)?,
                    None => false,
                };
                let items = self.drain(&iterable)?;
                Ok(Value::list(self.sort_values(items, key.as_ref(), reverse)?))
            }
            BuiltinFnId::Reversed => {
                reject_extra(name, &kwargs)?;
                let [sequence] = exact(name, args)?;
                let mut items = match &sequence {
                    Value::Str(_) | Value::List(_) | Value::Tuple(_) | Value::Dict(_) | Value::Range(_) => {
                        self.drain(&sequence)?
                    }
                    other => {
                        return Err(
                            Exception::type_error(format!("'{}' object is not reversible", other.type_name())).into()
                        );
                    }
                };
                items.reverse();
                Ok(Value::list(items))
            }
            BuiltinFnId::Enumerate => {
                let start = take_kwarg(&mut kwargs, "start");
                reject_extra(name, &kwargs)?;
                let args = between(name, args, 1, 2)?;
                let mut index = match args.get(1).or(start.as_ref()) {
                    Some(value) => integer_arg(value)?,
                    None => 0,
                };
                let mut pairs = Vec::new();
                for item in self.drain(&args[0])? {
                    pairs.push(Value::tuple(vec![Value::Int(index), item]));
                    index = index.checked_add(1).ok_or_else(Exception::overflow)?;
                }
                Ok(Value::list(pairs))
            }
            BuiltinFnId::Zip => {
                reject_extra(name, &kwargs)?;
                let columns = args.iter().map(|a| self.drain(a)).collect::<ExecResult<Vec<_>>>()?;
                let rows = columns.iter().map(Vec::len).min().unwrap_or(0);
                let zipped = (0..rows)
                    .map(|row| Value::tuple(columns.iter().map(|column| column[row].clone()).collect()))
                    .collect();
                Ok(Value::list(zipped))
            }
            BuiltinFnId::Isinstance => {
                reject_extra(name, &kwargs)?;
                let [value, classinfo] = exact(name, args)?;
                Ok(Value::Bool(is_instance(&value, &classinfo)?))
            }
            BuiltinFnId::Round => {
                let ndigits = take_kwarg(&mut kwargs, "ndigits");
                reject_extra(name, &kwargs)?;
                let args = between(name, args, 1, 2)?;
                let ndigits = args.get(1).cloned().or(ndigits).filter(|n| !matches!(n, Value::None));
                let ndigits = ndigits.as_ref().map(integer_arg).transpose()?;
                Ok(round(&args[0], ndigits)?)
            }
            BuiltinFnId::Any | BuiltinFnId::All => {
                reject_extra(name, &kwargs)?;
                let [iterable] = exact(name, args)?;
                let want = id == BuiltinFnId::Any;
                for item in self.drain(&iterable)? {
                    if self.is_truthy(&item)? == want {
                        return Ok(Value::Bool(want));
                    }
                }
                Ok(Value::Bool(!want))
            }
            BuiltinFnId::Int => {
                let base = take_kwarg(&mut kwargs, "base");
                reject_extra(name, &kwargs)?;
                let args = between(name, args, 0, 2)?;
                let base = args.get(1).cloned().or(base);
                self.to_int(args.first(), base)
            }
            BuiltinFnId::Float => {
                reject_extra(name, &kwargs)?;
                let args = between(name, args, 0, 1)?;
                match args.first() {
                    None => Ok(Value::Float(0.0)),
                    Some(Value::Str(s)) => Ok(Value::Float(parse_float(s)?)),
                    Some(Value::BigInt(n)) => Ok(Value::Float(bigint::to_f64(n)?)),
                    Some(value) => match value.as_float() {
                        Some(f) => Ok(Value::Float(f)),
                        None => match self.call_dunder(value, "__float__", Vec::new())? {
                            Some(result) => Ok(result),
                            None => Err(Exception::type_error(format!(
                                "float() argument must be a string or a real number, not '{}'",
                                value.type_name()
                            ))
                            .into()),
                        },
                    },
                }
            }
            BuiltinFnId::Str => {
                reject_extra(name, &kwargs)?;
                let args = between(name, args, 0, 1)?;
                match args.first() {
                    Some(value) => Ok(Value::string(self.to_str(value)?)),
                    None => Ok(Value::str("")),
                }
            }
            BuiltinFnId::Bool => {
                reject_extra(name, &kwargs)?;
                let args = between(name, args, 0, 1)?;
                match args.first() {
                    Some(value) => Ok(Value::Bool(self.is_truthy(value)?)),
                    None => Ok(Value::Bool(false)),
                }
            }
            BuiltinFnId::List | BuiltinFnId::Tuple | BuiltinFnId::Set => {
                reject_extra(name, &kwargs)?;
                let args = between(name, args, 0, 1)?;
                let items = match args.first() {
                    Some(iterable) => self.drain(iterable)?,
                    None => Vec::new(),
                };
                Ok(match id {
                    BuiltinFnId::List => Value::list(items),
                    BuiltinFnId::Tuple => Value::tuple(items),
                    _ => {
                        let mut set = PySet::new();
                        for item in items {
                            set.insert(item)?;
                        }
                        Value::set(set)
                    }
                })
            }
            BuiltinFnId::Dict => {
                let args = between(name, args, 0, 1)?;
                let mut dict = PyDict::new();
                if let Some(source) = args.first() {
                    self.dict_update(&mut dict, source)?;
                }
                for (key, value) in kwargs {
                    dict.insert(Value::string(key), value)?;
                }
                Ok(Value::dict(dict))
            }
            BuiltinFnId::Type => {
                reject_extra(name, &kwargs)?;
                let [value] = exact(name, args)?;
                Ok(type_of(&value))
            }
            BuiltinFnId::Repr => {
                reject_extra(name, &kwargs)?;
                let [value] = exact(name, args)?;
                Ok(Value::string(self.to_repr(&value)?))
            }
            BuiltinFnId::StaticMethod | BuiltinFnId::ClassMethod | BuiltinFnId::Property => {
                reject_extra(name, &kwargs)?;
                let [function] = exact(name, args)?;
                Ok(wrap_method(id, function)?)
            }
        }
    }

    fn min_max(&mut self, id: BuiltinFnId, args: Vec<Value>, mut kwargs: Kwargs) -> ExecResult<Value> {
        let name = builtins::as_str(id);
        let key = take_kwarg(&mut kwargs, "key").filter(|k| !matches!(k, Value::None));
        let default = take_kwarg(&mut kwargs, "default");
        reject_extra(name, &kwargs)?;
        let items = match args.len() {
            0 => return Err(Exception::type_error(format!("{name} expected at least 1 argument, got 0")).into()),
            1 => self.drain(&args[0])?,
            _ if default.is_some() => {
                return Err(Exception::type_error(format!(
                    "Cannot specify a default for {name}() with multiple positional arguments"
                ))
                .into());
            }
            _ => args,
        };
        let op = if id == BuiltinFnId::Min { CompareOp::Lt } else { CompareOp::Gt };
        let mut best: Option<(Value, Value)> = None;
        for item in items {
            let rank = match &key {
                Some(f) => self.call(f, vec![item.clone()], Vec::new())?,
                None => item.clone(),
            };
            let better = match &best {
                Some((_, best_rank)) => self.compare(op, &rank, best_rank)?,
                None => true,
            };
            if better {
                best = Some((item, rank));
            }
        }
        match best {
            Some((item, _)) => Ok(item),
            None => default.ok_or_else(|| Exception::value_error(format!("{name}() arg is an empty sequence")).into()),
        }
    }

    fn to_int(&mut self, value: Option<&Value>, base: Option<Value>) -> ExecResult<Value> {
        let Some(value) = value else {
            return Ok(Value::Int(0));
        };
        match (value, base) {
            (Value::Str(s), base) => {
                let base = match base {
                    Some(b) => integer_arg(&b)?,
                    None => 10,
                };
                Ok(parse_int(s, base)?)
            }
            (_, Some(_)) => Err(Exception::type_error("int() can't convert non-string with explicit base").into()),
            (Value::Int(_) | Value::Bool(_), None) => Ok(Value::Int(value.as_int().unwrap_or_default())),
            (Value::BigInt(_), None) => Ok(value.clone()),
            (Value::Float(f), None) => Ok(float_to_int(f.trunc())?),
            (other, None) => match self.call_dunder(other, "__int__", Vec::new())? {
                Some(result) => Ok(result),
                None => Err(Exception::type_error(format!(
                    "int() argument must be a string, a bytes-like object or a real number, not '{}'",
                    other.type_name()
                ))
                .into()),
            },
        }
    }

    /// Insert the pairs of a mapping or of an iterable of 2-item sequences (`dict(x)`, `d.update(x)`).
    pub(crate) fn dict_update(&mut self, dict: &mut PyDict, source: &Value) -> ExecResult<()> {
        if let Value::Dict(other) = source {
            let pairs: Vec<(Value, Value)> = other.borrow().iter().map(|(k, v)| (k.clone(), v.clone())).collect();
            for (key, value) in pairs {
                dict.insert(key, value)?;
            }
            return Ok(());
        }
        for (index, item) in self.drain(source)?.into_iter().enumerate() {
            let pair = match &item {
                Value::List(_) | Value::Tuple(_) | Value::Str(_) => item.to_vec()?,
                _ => {
                    return Err(Exception::type_error(format!(
                        "cannot convert dictionary update sequence element #{index} to a sequence"
                    ))
                    .into());
                }
            };
            match <[Value; 2]>::try_from(pair) {
                Ok([key, value]) => dict.insert(key, value)?,
                Err(pair) => {
                    return Err(Exception::value_error(format!(
                        "dictionary update sequence element #{index} has length {}; 2 is required",
                        pair.len()
                    ))
                    .into());
                }
            }
        }
        Ok(())
    }

    /// Stable sort by `key(item)` (or the items themselves) using `<` with dunder dispatch.
    pub(crate) fn sort_values(&mut self, items: Vec<Value>, key: Option<&Value>, reverse: bool) -> ExecResult<Vec<Value>> {
        let mut keyed = Vec::with_capacity(items.len());
        for item in items {
            let rank = match key {
                Some(f) => self.call(f, vec![item.clone()], Vec::new())?,
                None => item.clone(),
            };
            keyed.push((rank, item));
        }
        let sorted = self.merge_sort(keyed, reverse)?;
        Ok(sorted.into_iter().map(|(_, item)| item).collect())
    }

    fn merge_sort(&mut self, mut items: Vec<(Value, Value)>, reverse: bool) -> ExecResult<Vec<(Value, Value)>> {
        if items.len() <= 1 {
            return Ok(items);
        }
        let right = items.split_off(items.len() / 2);
        let left = self.merge_sort(items, reverse)?;
        let right = self.merge_sort(right, reverse)?;

        let mut merged = Vec::with_capacity(left.len() + right.len());
        let mut left = left.into_iter().peekable();
        let mut right = right.into_iter().peekable();
        while let (Some(l), Some(r)) = (left.peek(), right.peek()) {
            // Equal ranks keep their input order in both directions.
            let right_first = if reverse {
                self.compare(CompareOp::Lt, &l.0, &r.0)?
            } else {
                self.compare(CompareOp::Lt, &r.0, &l.0)?
            };
            merged.extend(if right_first { right.next() } else { left.next() });
        }
        merged.extend(left);
        merged.extend(right);
        Ok(merged)
    }
}

// ============================================================================
// Argument helpers
// ============================================================================

fn take_kwarg(kwargs: &mut Kwargs, name: &str) -> Option<Value> {
    let pos = kwargs.iter().position(|(k, _)| k == name)?;
    Some(kwargs.remove(pos).1)
}

fn reject_extra(name: &str, kwargs: &Kwargs) -> Result<(), Exception> {
    match kwargs.first() {
        None => Ok(()),
        Some((key, _)) => Err(Exception::type_error(format!(
            "'{key}' is an invalid keyword argument for {name}()"
        ))),
    }
}

fn exact<const N: usize>(name: &str, args: Vec<Value>) -> Result<[Value; N], Exception> {
    check_arity(name, name, args.len(), (N, N))?;
    args.try_into()
        .map_err(|_| Exception::type_error(format!("{name} expected {N} arguments")))
}

fn between(name: &str, args: Vec<Value>, min: usize, max: usize) -> Result<Vec<Value>, Exception> {
    check_arity(name, name, args.len(), (min, max))?;
    Ok(args)
}

fn separator(value: Option<Value>, default: &str, which: &str) -> Result<String, Exception> {
    match value {
        None | Some(Value::None) => Ok(default.to_string()),
        Some(Value::Str(s)) => Ok(s.to_string()),
        Some(other) => Err(Exception::type_error(format!(
            "{which} must be None or a string, not {}",
            other.type_name()
        ))),
    }
}

fn not_an_integer(value: &Value) -> Exception {
    Exception::type_error(format!(
        "'{}' object cannot be interpreted as an integer",
        value.type_name()
    ))
}

fn integer_arg(value: &Value) -> Result<i64, Exception> {
    match value {
        Value::BigInt(_) => Err(Exception::new(
            ErrorKind::OverflowError,
            "Python int too large to convert to C ssize_t",
        )),
        other => other.as_int().ok_or_else(|| not_an_integer(other)),
    }
}

// ============================================================================
// Conversions
// ============================================================================

/// `int(text, base)`: optional sign, optional `0x`/`0o`/`0b` prefix and single underscores between digits.
fn parse_int(text: &str, base: i64) -> Result<Value, Exception> {
    if base != 0 && !(2..=36).contains(&base) {
        return Err(Exception::value_error("int() base must be >= 2 and <= 36, or 0"));
    }
    let invalid = || {
        Exception::value_error(format!(
            "invalid literal for int() with base {base}: {}",
            unitgen_core::strings::str_repr(text)
        ))
    };
    let trimmed = text.trim();
    let (sign, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let lower = unsigned.to_ascii_lowercase();
    let prefixed = [("0x", 16), ("0o", 8), ("0b", 2)]
        .into_iter()
        .find(|(prefix, radix)| lower.starts_with(prefix) && (base == 0 || base == *radix));
    let (radix, digits) = match prefixed {
        Some((prefix, radix)) => (radix, &unsigned[prefix.len()..]),
        None if base == 0 => {
            if unsigned.len() > 1 && unsigned.starts_with('0') && unsigned.chars().any(|c| c != '0' && c != '_') {
                return Err(invalid());
            }
            (10, unsigned)
        }
        None => (base, unsigned),
    };
    let digits = strip_underscores(digits, prefixed.is_some()).ok_or_else(invalid)?;
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return Err(invalid());
    }
    match i64::from_str_radix(&format!("{sign}{digits}"), radix as u32) {
        Ok(n) => Ok(Value::Int(n)),
        Err(err) if matches!(err.kind(), IntErrorKind::PosOverflow | IntErrorKind::NegOverflow) => {
            let magnitude = bigint::literal(&digits, radix as u32)?;
            if sign == "-" {
                Ok(ops::unary_op(UnaryOp::Neg, &magnitude)?)
            } else {
                Ok(magnitude)
            }
        }
        Err(_) => Err(invalid()),
    }
}

/// Remove digit-separating underscores; `None` when one is leading, trailing or doubled.
fn strip_underscores(digits: &str, after_prefix: bool) -> Option<String> {
    let body = if after_prefix { digits.strip_prefix('_').unwrap_or(digits) } else { digits };
    if body.starts_with('_') || body.ends_with('_') || body.contains("__") {
        return None;
    }
    Some(body.replace('_', ""))
}

fn parse_float(text: &str) -> Result<f64, Exception> {
    let invalid = || {
        Exception::value_error(format!(
            "could not convert string to float: {}",
            unitgen_core::strings::str_repr(text)
        ))
    };
    let trimmed = text.trim();
    let lower = trimmed.to_ascii_lowercase();
    let unsigned = lower.trim_start_matches(['+', '-']);
    if unsigned.len() + 1 < lower.len() {
        return Err(invalid());
    }
    let negative = lower.starts_with('-');
    let special = match unsigned {
        "inf" | "infinity" => Some(f64::INFINITY),
        "nan" => Some(f64::NAN),
        _ => None,
    };
    if let Some(f) = special {
        return Ok(if negative { -f } else { f });
    }
    if !unsigned.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return Err(invalid());
    }
    let cleaned = if trimmed.contains('_') {
        let ok = trimmed
            .split('_')
            .collect::<Vec<_>>()
            .windows(2)
            .all(|w| w[0].ends_with(|c: char| c.is_ascii_digit()) && w[1].starts_with(|c: char| c.is_ascii_digit()));
        if !ok {
            return Err(invalid());
        }
        trimmed.replace('_', "")
    } else {
        trimmed.to_string()
    };
    cleaned.parse::<f64>().map_err(|_| invalid())
}

fn round(value: &Value, ndigits: Option<i64>) -> Result<Value, Exception> {
    match (value, ndigits) {
        (Value::Int(_) | Value::Bool(_) | Value::BigInt(_), None) => {
            Ok(value.as_bigint().map(bigint::int_value).unwrap_or(Value::Int(0)))
        }
        (Value::Int(_) | Value::Bool(_) | Value::BigInt(_), Some(n)) => {
            let x = value.as_bigint().unwrap_or_default();
            Ok(bigint::int_value(round_int(x, n)))
        }
        (Value::Float(f), None) => float_to_int(py_round_half_even(*f)),
        (Value::Float(f), Some(n)) => {
            if !f.is_finite() {
                return Ok(Value::Float(*f));
            }
            if n >= 0 {
                return Ok(Value::Float(round_decimal(*f, usize::try_from(n).unwrap_or(usize::MAX))));
            }
            let scale = 10f64.powi(n.max(-400) as i32);
            let rounded = py_round_half_even(f * scale) / scale;
            Ok(Value::Float(if rounded.is_finite() { rounded } else { *f }))
        }
        (other, _) => Err(Exception::type_error(format!(
            "type {} doesn't define __round__ method",
            other.type_name()
        ))),
    }
}

/// `round(x, ndigits)` for an `int`: a no-op unless `ndigits` is negative.
fn round_int(x: BigInt, ndigits: i64) -> BigInt {
    if ndigits >= 0 {
        return x;
    }
    let places = ndigits.unsigned_abs();
    // 10**places already exceeds 2 * |x|.
    if places > x.bits() / 3 + 2 {
        return BigInt::zero();
    }
    let factor = BigInt::from(10u32).pow(places as u32);
    let remainder = ((&x % &factor) + &factor) % &factor;
    let base = &x - &remainder;
    let round_up = match (&remainder * 2u32).cmp(&factor) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Equal => !((&base / &factor) % 2u32).is_zero(),
        std::cmp::Ordering::Less => false,
    };
    if round_up { base + factor } else { base }
}

/// Round `f` to `ndigits` decimals, half to even on its exact binary value.
///
/// `round(2.675, 2)` is `2.67` because the stored double is slightly below `2.675`.
fn round_decimal(f: f64, ndigits: usize) -> f64 {
    // Every finite double has at most 1074 fractional decimal digits.
    let exact = format!("{:.1074}", f.abs());
    let (whole, fraction) = exact.split_once('.').unwrap_or((exact.as_str(), ""));
    if ndigits >= fraction.len() {
        return f;
    }
    let (kept, dropped) = fraction.split_at(ndigits);
    let mut digits: Vec<u8> = format!("{whole}{kept}").into_bytes();
    let dropped = dropped.as_bytes();
    let round_up = match dropped[0] {
        b'6'..=b'9' => true,
        b'5' => {
            dropped[1..].iter().any(|&d| d != b'0') || digits.last().is_some_and(|&d| (d - b'0') % 2 == 1)
        }
        _ => false,
    };
    if round_up {
        let mut carry = true;
        for d in digits.iter_mut().rev() {
            if *d == b'9' {
                *d = b'0';
            } else {
                *d += 1;
                carry = false;
                break;
            }
        }
        if carry {
            digits.insert(0, b'1');
        }
    }
    let split = digits.len() - ndigits;
    let text = format!(
        "{}.{}",
        String::from_utf8_lossy(&digits[..split]),
        String::from_utf8_lossy(&digits[split..])
    );
    let rounded: f64 = text.parse().unwrap_or(f);
    if f.is_sign_negative() { -rounded } else { rounded }
}

// ============================================================================
// Types
// ============================================================================

/// `staticmethod(f)`, `classmethod(f)` or `property(f)`.
fn wrap_method(id: BuiltinFnId, function: Value) -> Result<Value, Exception> {
    let kind = match id {
        BuiltinFnId::StaticMethod => WrapperKind::StaticMethod,
        BuiltinFnId::ClassMethod => WrapperKind::ClassMethod,
        _ => WrapperKind::Property,
    };
    let accepted = match kind {
        WrapperKind::ClassMethod => matches!(function, Value::Function(_)),
        _ => matches!(
            function,
            Value::Function(_) | Value::Builtin(_) | Value::BoundMethod(_) | Value::Class(_)
        ),
    };
    if !accepted {
        return Err(Exception::type_error(format!(
            "{}() expects a function, not '{}'",
            kind.name(),
            function.type_name()
        )));
    }
    Ok(Value::Wrapper(Rc::new(MethodWrapper { kind, function })))
}

/// `type(value)`.
fn type_of(value: &Value) -> Value {
    let builtin = |id| Value::Builtin(Builtin::Function(id));
    match value {
        Value::None => Value::Builtin(Builtin::Type("NoneType")),
        Value::Bool(_) => builtin(BuiltinFnId::Bool),
        Value::Int(_) | Value::BigInt(_) => builtin(BuiltinFnId::Int),
        Value::Float(_) => builtin(BuiltinFnId::Float),
        Value::Str(_) => builtin(BuiltinFnId::Str),
        Value::List(_) => builtin(BuiltinFnId::List),
        Value::Tuple(_) => builtin(BuiltinFnId::Tuple),
        Value::Dict(_) => builtin(BuiltinFnId::Dict),
        Value::Set(_) => builtin(BuiltinFnId::Set),
        Value::Range(_) => builtin(BuiltinFnId::Range),
        Value::Function(_) => Value::Builtin(Builtin::Type("function")),
        Value::Builtin(b) if b.is_type() => builtin(BuiltinFnId::Type),
        Value::Builtin(_) => Value::Builtin(Builtin::Type("builtin_function_or_method")),
        Value::BoundMethod(_) => Value::Builtin(Builtin::Type("method")),
        Value::Class(_) | Value::ExceptionClass(_) => builtin(BuiltinFnId::Type),
        Value::Instance(instance) => Value::Class(instance.class.clone()),
        Value::Module(_) => Value::Builtin(Builtin::Type("module")),
        Value::Exception(e) => Value::ExceptionClass(e.kind),
        Value::Wrapper(w) => builtin(match w.kind {
            WrapperKind::StaticMethod => BuiltinFnId::StaticMethod,
            WrapperKind::ClassMethod => BuiltinFnId::ClassMethod,
            WrapperKind::Property => BuiltinFnId::Property,
        }),
    }
}

/// `isinstance(value, classinfo)`; `bool` counts as an `int` and everything is an `object`.
fn is_instance(value: &Value, classinfo: &Value) -> Result<bool, Exception> {
    match classinfo {
        Value::Tuple(options) => {
            for option in options.iter() {
                if is_instance(value, option)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Value::Class(class) => Ok(matches!(value, Value::Instance(i) if Class::is_subclass(&i.class, class))),
        Value::ExceptionClass(kind) => Ok(match value {
            Value::Exception(e) => e.kind.is_subclass_of(*kind),
            Value::Instance(i) => i.class.exception_base.is_some_and(|base| base.is_subclass_of(*kind)),
            _ => false,
        }),
        Value::Builtin(Builtin::Type("object")) => Ok(true),
        Value::Builtin(b) if b.is_type() => Ok(type_of(value).is_same(classinfo)
            || (matches!(value, Value::Bool(_)) && *b == Builtin::Function(BuiltinFnId::Int))
            || (matches!(value, Value::Class(_) | Value::ExceptionClass(_))
                && *b == Builtin::Function(BuiltinFnId::Type))),
        _ => Err(Exception::type_error(
            "isinstance() arg 2 must be a type, a tuple of types, or a union",
        )),
    }
}

#[cfg(test)]
mod tests {
    use unitgen_core::errors::ErrorKind;

    use super::*;

    #[test]
    fn test_parse_int_accepts_python_spellings() {
        assert_eq!(parse_int(" 42 ", 10).unwrap(), Value::Int(42));
        assert_eq!(parse_int("-1_000", 10).unwrap(), Value::Int(-1000));
        assert_eq!(parse_int("ff", 16).unwrap(), Value::Int(255));
        assert_eq!(parse_int("0x_ff", 0).unwrap(), Value::Int(255));
        assert_eq!(parse_int("0b101", 2).unwrap(), Value::Int(5));
        assert_eq!(parse_int("0", 0).unwrap(), Value::Int(0));
    }

    #[test]
    fn test_parse_int_rejects_malformed_text() {
        let err = parse_int("4.5", 10).unwrap_err();
        assert_eq!(err.qualified(), "ValueError: invalid literal for int() with base 10: '4.5'");
        assert!(parse_int("1__0", 10).is_err());
        assert!(parse_int("010", 0).is_err());
        assert!(parse_int("--1", 10).is_err());
        assert_eq!(parse_int("99999999999999999999", 10).unwrap().repr(), "99999999999999999999");
        assert_eq!(parse_int("-0x1_0000_0000_0000_0000", 0).unwrap().repr(), "-18446744073709551616");
    }

    #[test]
    fn test_parse_float_special_values() {
        assert_eq!(parse_float("1e3").unwrap(), 1000.0);
        assert_eq!(parse_float(" -2.5 ").unwrap(), -2.5);
        assert!(parse_float("-inf").unwrap().is_infinite());
        assert!(parse_float("NaN").unwrap().is_nan());
        assert_eq!(
            parse_float("abc").unwrap_err().message(),
            "could not convert string to float: 'abc'"
        );
    }

    #[test]
    fn test_round_half_even() {
        assert_eq!(round(&Value::Float(2.5), None).unwrap(), Value::Int(2));
        assert_eq!(round(&Value::Float(3.5), None).unwrap(), Value::Int(4));
        assert_eq!(round(&Value::Int(1250), Some(-2)).unwrap(), Value::Int(1200));
        assert_eq!(round(&Value::Int(1350), Some(-2)).unwrap(), Value::Int(1400));
        assert_eq!(round(&Value::Float(1.2345), Some(2)).unwrap(), Value::Float(1.23));
    }

    #[test]
    fn test_round_uses_the_stored_binary_value() {
        assert_eq!(round(&Value::Float(2.675), Some(2)).unwrap().repr(), "2.67");
        assert_eq!(round(&Value::Float(0.125), Some(2)).unwrap().repr(), "0.12");
        assert_eq!(round(&Value::Float(0.375), Some(2)).unwrap().repr(), "0.38");
        assert_eq!(round(&Value::Float(-1.005), Some(2)).unwrap().repr(), "-1.0");
        assert_eq!(round(&Value::Float(9.995), Some(2)).unwrap().repr(), "9.99");
        assert_eq!(round(&Value::Float(99.96), Some(1)).unwrap().repr(), "100.0");
        assert_eq!(round(&Value::Float(0.1), Some(400)).unwrap().repr(), "0.1");
    }

    #[test]
    fn test_round_and_abs_on_wide_ints() {
        let wide = parse_int("123456789012345678901", 10).unwrap();
        assert_eq!(round(&wide, Some(-5)).unwrap().repr(), "123456789012345700000");
        assert_eq!(round(&wide, Some(-40)).unwrap(), Value::Int(0));
        assert_eq!(round(&Value::Int(i64::MAX), Some(-1)).unwrap().repr(), "9223372036854775810");
        assert_eq!(round(&Value::Float(1e20), None).unwrap().repr(), "100000000000000000000");
        assert!(type_of(&wide).is_same(&Value::Builtin(Builtin::Function(BuiltinFnId::Int))));
        assert!(is_instance(&wide, &Value::Builtin(Builtin::Function(BuiltinFnId::Int))).unwrap());
        assert_eq!(integer_arg(&wide).unwrap_err().kind(), ErrorKind::OverflowError);
    }

    #[test]
    fn test_isinstance_rules() {
        let int_type = Value::Builtin(Builtin::Function(BuiltinFnId::Int));
        assert!(is_instance(&Value::Bool(true), &int_type).unwrap());
        assert!(!is_instance(&Value::Float(1.0), &int_type).unwrap());
        let either = Value::tuple(vec![Value::Builtin(Builtin::Function(BuiltinFnId::Str)), int_type]);
        assert!(is_instance(&Value::str("x"), &either).unwrap());
        assert!(is_instance(&Value::None, &Value::Builtin(Builtin::Type("object"))).unwrap());
        assert!(is_instance(&Value::Int(1), &Value::Int(1)).is_err());
    }
}
