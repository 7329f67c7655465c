//! Native methods of `str`, `list`, `tuple`, `dict` and `set`.
//!
//! Attribute lookup on a builtin value yields a bound [`MethodKind::Native`](super::value::MethodKind) carrying
//! the method name; calling it lands in [`Interpreter::call_method`].
//!
//! ## Notes
//! - String positions (`find`, `index`) are counted in Unicode scalars, matching indexing and slicing.
//! - `dict.keys()`, `values()` and `items()` return list snapshots, not live views.
//! - Methods that call back into target code (`list.remove` comparing via `__eq__`, `sort` with a `key`) work
//!   on a snapshot, so the callback may mutate the list without a borrow conflict.

use std::cell::RefCell;
use std::rc::Rc;

use unitgen_core::errors::ErrorKind;
use unitgen_core::strings::{normalize_index, str_capitalize, str_split, str_title};

use super::dict::{PyDict, PySet};
use super::error::{Exception, ExecResult, check_arity};
use super::format::{parse_template, render_template};
use super::value::{Instance, MAX_REPEAT_LEN, Value};
use super::Interpreter;

const STR_METHODS: &[&str] = &[
    "upper", "lower", "strip", "lstrip", "rstrip", "split", "splitlines", "join", "replace", "startswith",
    "endswith", "find", "rfind", "count", "index", "isdigit", "isalpha", "isalnum", "isspace", "isupper", "islower",
    "title", "capitalize", "zfill", "center", "ljust", "rjust", "format",
];
const LIST_METHODS: &[&str] = &[
    "append", "extend", "insert", "pop", "remove", "index", "count", "sort", "reverse", "copy", "clear",
];
const TUPLE_METHODS: &[&str] = &["index", "count"];
const DICT_METHODS: &[&str] = &["get", "keys", "values", "items", "pop", "setdefault", "update", "copy", "clear"];
const SET_METHODS: &[&str] = &[
    "add", "remove", "discard", "copy", "clear", "union", "intersection", "difference",
];

/// The native method `name` of `value`, if its type has one.
pub(crate) fn native_method(value: &Value, name: &str) -> Option<&'static str> {
    let table = match value {
        Value::Str(_) => STR_METHODS,
        Value::List(_) => LIST_METHODS,
        Value::Tuple(_) => TUPLE_METHODS,
        Value::Dict(_) => DICT_METHODS,
        Value::Set(_) => SET_METHODS,
        _ => return None,
    };
    table.iter().copied().find(|m| *m == name)
}

type Kwargs = Vec<(String, Value)>;

/// Arity check phrased like CPython's method errors (`str.upper() takes no arguments (1 given)`).
fn arity(type_name: &str, method: &str, args: &[Value], min: usize, max: usize) -> Result<(), Exception> {
    if max == 0 && !args.is_empty() {
        return Err(Exception::type_error(format!(
            "{type_name}.{method}() takes no arguments ({} given)",
            args.len()
        )));
    }
    check_arity(method, method, args.len(), (min, max))
}

fn no_kwargs(type_name: &str, method: &str, kwargs: &Kwargs) -> Result<(), Exception> {
    if kwargs.is_empty() {
        Ok(())
    } else {
        Err(Exception::type_error(format!("{type_name}.{method}() takes no keyword arguments")))
    }
}

fn str_arg<'a>(value: &'a Value, method: &str) -> Result<&'a str, Exception> {
    match value {
        Value::Str(s) => Ok(&**s),
        other => Err(Exception::type_error(format!(
            "{method}() argument must be str, not {}",
            other.type_name()
        ))),
    }
}

fn int_arg(value: &Value) -> Result<i64, Exception> {
    value.as_int().ok_or_else(|| {
        Exception::type_error(format!(
            "'{}' object cannot be interpreted as an integer",
            value.type_name()
        ))
    })
}

fn char_count(s: &str) -> i64 {
    s.chars().count() as i64
}

/// Padding needed to bring `s` up to `width` characters.
fn pad_to(width: i64, s: &str) -> Result<usize, Exception> {
    let pad = usize::try_from(width.saturating_sub(char_count(s))).unwrap_or(0);
    if pad > MAX_REPEAT_LEN {
        return Err(Exception::new(
            ErrorKind::OverflowError,
            format!("padded string of {width} characters is too long"),
        ));
    }
    Ok(pad)
}

impl Interpreter {
    /// Call the native method `name` on `receiver`.
    pub(crate) fn call_method(&mut self, receiver: &Value, name: &str, args: Vec<Value>, kwargs: Kwargs) -> ExecResult<Value> {
        match receiver {
            Value::Str(s) => self.str_method(s, name, args, kwargs),
            Value::List(items) => self.list_method(items, name, args, kwargs),
            Value::Tuple(items) => {
                no_kwargs("tuple", name, &kwargs)?;
                self.sequence_search("tuple", items, name, &args)
            }
            Value::Dict(dict) => self.dict_method(dict, name, args, kwargs),
            Value::Set(set) => self.set_method(set, name, args, kwargs),
            Value::Instance(instance) if name == "__init__" => {
                object_init(instance, args, &kwargs)?;
                Ok(Value::None)
            }
            other => Err(Exception::attribute_error(format!(
                "'{}' object has no attribute '{name}'",
                other.type_name()
            ))
            .into()),
        }
    }

    // ========================================================================
    // str
    // ========================================================================

    fn str_method(&mut self, s: &Rc<str>, name: &str, args: Vec<Value>, kwargs: Kwargs) -> ExecResult<Value> {
        if name == "format" {
            let parts = parse_template(s)?;
            let rendered = render_template(&parts, &args, &kwargs, &mut |value, conversion, spec| {
                self.format_field(value, conversion, spec)
            })?;
            return Ok(Value::string(rendered));
        }
        no_kwargs("str", name, &kwargs)?;
        let s: &str = s;
        let result = match name {
            "upper" | "lower" | "title" | "capitalize" | "splitlines" => {
                arity("str", name, &args, 0, 0)?;
                match name {
                    "upper" => Value::string(s.to_uppercase()),
                    "lower" => Value::string(s.to_lowercase()),
                    "title" => Value::string(str_title(s)),
                    "capitalize" => Value::string(str_capitalize(s)),
                    _ => Value::list(s.lines().map(Value::str).collect()),
                }
            }
            "strip" | "lstrip" | "rstrip" => {
                arity("str", name, &args, 0, 1)?;
                let chars = match args.first() {
                    None | Some(Value::None) => None,
                    Some(value) => Some(str_arg(value, name)?.to_string()),
                };
                let strip = |c: char| match &chars {
                    Some(set) => set.contains(c),
                    None => c.is_whitespace(),
                };
                Value::str(match name {
                    "strip" => s.trim_matches(strip),
                    "lstrip" => s.trim_start_matches(strip),
                    _ => s.trim_end_matches(strip),
                })
            }
            "split" => {
                arity("str", name, &args, 0, 2)?;
                let sep = match args.first() {
                    None | Some(Value::None) => None,
                    Some(value) => Some(str_arg(value, name)?),
                };
                if sep == Some("") {
                    return Err(Exception::value_error("empty separator").into());
                }
                let maxsplit = match args.get(1) {
                    Some(value) => int_arg(value)?,
                    None => -1,
                };
                Value::list(split(s, sep, maxsplit).into_iter().map(Value::string).collect())
            }
            "join" => {
                arity("str", name, &args, 1, 1)?;
                let mut parts = Vec::new();
                for (i, item) in self.drain(&args[0])?.into_iter().enumerate() {
                    match item {
                        Value::Str(part) => parts.push(part.to_string()),
                        other => {
                            return Err(Exception::type_error(format!(
                                "sequence item {i}: expected str instance, {} found",
                                other.type_name()
                            ))
                            .into());
                        }
                    }
                }
                Value::string(parts.join(s))
            }
            "replace" => {
                arity("str", name, &args, 2, 3)?;
                let (old, new) = (str_arg(&args[0], name)?, str_arg(&args[1], name)?);
                match args.get(2).map(int_arg).transpose()? {
                    Some(count) if count >= 0 => Value::string(s.replacen(old, new, count as usize)),
                    _ => Value::string(s.replace(old, new)),
                }
            }
            "startswith" | "endswith" => {
                arity("str", name, &args, 1, 1)?;
                let candidates = match &args[0] {
                    Value::Tuple(items) => items.to_vec(),
                    other => vec![other.clone()],
                };
                let mut hit = false;
                for candidate in &candidates {
                    let affix = match candidate {
                        Value::Str(affix) => affix,
                        other => {
                            return Err(Exception::type_error(format!(
                                "{name} first arg must be str or a tuple of str, not {}",
                                other.type_name()
                            ))
                            .into());
                        }
                    };
                    hit |= if name == "startswith" { s.starts_with(&**affix) } else { s.ends_with(&**affix) };
                }
                Value::Bool(hit)
            }
            "find" | "rfind" | "index" => {
                arity("str", name, &args, 1, 1)?;
                let needle = str_arg(&args[0], name)?;
                let found = if name == "rfind" { s.rfind(needle) } else { s.find(needle) };
                match found {
                    Some(byte) => Value::Int(char_count(&s[..byte])),
                    None if name == "index" => return Err(Exception::value_error("substring not found").into()),
                    None => Value::Int(-1),
                }
            }
            "count" => {
                arity("str", name, &args, 1, 1)?;
                let needle = str_arg(&args[0], name)?;
                if needle.is_empty() {
                    Value::Int(char_count(s) + 1)
                } else {
                    Value::Int(s.matches(needle).count() as i64)
                }
            }
            "isdigit" | "isalpha" | "isalnum" | "isspace" => {
                arity("str", name, &args, 0, 0)?;
                let test: fn(char) -> bool = match name {
                    "isdigit" => |c| c.is_ascii_digit(),
                    "isalpha" => char::is_alphabetic,
                    "isalnum" => char::is_alphanumeric,
                    _ => char::is_whitespace,
                };
                Value::Bool(!s.is_empty() && s.chars().all(test))
            }
            "isupper" | "islower" => {
                arity("str", name, &args, 0, 0)?;
                let cased = s.chars().any(|c| c.is_uppercase() || c.is_lowercase());
                let conflicting = if name == "isupper" {
                    s.chars().any(char::is_lowercase)
                } else {
                    s.chars().any(char::is_uppercase)
                };
                Value::Bool(cased && !conflicting)
            }
            "zfill" => {
                arity("str", name, &args, 1, 1)?;
                let pad = pad_to(int_arg(&args[0])?, s)?;
                let (sign, digits) = match s.strip_prefix(['+', '-']) {
                    Some(rest) => (&s[..1], rest),
                    None => ("", s),
                };
                Value::string(format!("{sign}{}{digits}", "0".repeat(pad)))
            }
            "center" | "ljust" | "rjust" => {
                arity("str", name, &args, 1, 2)?;
                let width = int_arg(&args[0])?;
                let fill = match args.get(1) {
                    Some(value) => {
                        let fill = str_arg(value, name)?;
                        let mut chars = fill.chars();
                        match (chars.next(), chars.next()) {
                            (Some(c), None) => c,
                            _ => {
                                return Err(Exception::type_error(
                                    "The fill character must be exactly one character long",
                                )
                                .into());
                            }
                        }
                    }
                    None => ' ',
                };
                let pad = pad_to(width, s)?;
                let (left, right) = match name {
                    "ljust" => (0, pad),
                    "rjust" => (pad, 0),
                    _ => {
                        let left = pad / 2 + (pad & (width & 1) as usize);
                        (left, pad - left)
                    }
                };
                let fill = fill.to_string();
                Value::string(format!("{}{s}{}", fill.repeat(left), fill.repeat(right)))
            }
            other => return Err(no_method("str", other).into()),
        };
        Ok(result)
    }

    // ========================================================================
    // list and tuple
    // ========================================================================

    fn list_method(
        &mut self,
        items: &Rc<RefCell<Vec<Value>>>,
        name: &str,
        args: Vec<Value>,
        mut kwargs: Kwargs,
    ) -> ExecResult<Value> {
        if name == "sort" {
            arity("list", name, &args, 0, 0)?;
            let key = take_kwarg(&mut kwargs, "key").filter(|k| !matches!(k, Value::None));
            let reverse = take_kwarg(&mut kwargs, "reverse");
            if let Some((key, _)) = kwargs.first() {
                return Err(Exception::type_error(format!("'{key}' is an invalid keyword argument for sort()")).into());
            }
            let reverse = match reverse {
                Some(flag) => self.is_truthy(&flag)?,
                None => false,
            };
            let snapshot = items.borrow().clone();
            let sorted = self.sort_values(snapshot, key.as_ref(), reverse)?;
            *items.borrow_mut() = sorted;
            return Ok(Value::None);
        }
        no_kwargs("list", name, &kwargs)?;
        match name {
            "append" => {
                arity("list", name, &args, 1, 1)?;
                items.borrow_mut().extend(args);
            }
            "extend" => {
                arity("list", name, &args, 1, 1)?;
                let extra = self.drain(&args[0])?;
                items.borrow_mut().extend(extra);
            }
            "insert" => {
                arity("list", name, &args, 2, 2)?;
                let mut list = items.borrow_mut();
                let len = list.len() as i64;
                let index = int_arg(&args[0])?;
                let pos = if index < 0 { (index + len).max(0) } else { index.min(len) };
                list.insert(pos as usize, args[1].clone());
            }
            "pop" => {
                arity("list", name, &args, 0, 1)?;
                let mut list = items.borrow_mut();
                if list.is_empty() {
                    return Err(Exception::index_error("pop from empty list").into());
                }
                let index = match args.first() {
                    Some(value) => int_arg(value)?,
                    None => -1,
                };
                let pos = normalize_index(list.len(), index)
                    .ok_or_else(|| Exception::index_error("pop index out of range"))?;
                return Ok(list.remove(pos));
            }
            "remove" => {
                arity("list", name, &args, 1, 1)?;
                let snapshot = items.borrow().clone();
                let mut found = None;
                for (pos, item) in snapshot.iter().enumerate() {
                    if self.equals(item, &args[0])? {
                        found = Some(pos);
                        break;
                    }
                }
                let pos = found.ok_or_else(|| Exception::value_error("list.remove(x): x not in list"))?;
                let mut list = items.borrow_mut();
                if pos < list.len() {
                    list.remove(pos);
                }
            }
            "reverse" => {
                arity("list", name, &args, 0, 0)?;
                items.borrow_mut().reverse();
            }
            "copy" => {
                arity("list", name, &args, 0, 0)?;
                return Ok(Value::list(items.borrow().clone()));
            }
            "clear" => {
                arity("list", name, &args, 0, 0)?;
                items.borrow_mut().clear();
            }
            "index" | "count" => {
                let snapshot = items.borrow().clone();
                return self.sequence_search("list", &snapshot, name, &args);
            }
            other => return Err(no_method("list", other).into()),
        }
        Ok(Value::None)
    }

    /// `index` and `count`, shared by lists and tuples.
    fn sequence_search(&mut self, type_name: &str, items: &[Value], name: &str, args: &[Value]) -> ExecResult<Value> {
        arity(type_name, name, args, 1, 1)?;
        let needle = &args[0];
        match name {
            "index" => {
                for (pos, item) in items.iter().enumerate() {
                    if self.equals(item, needle)? {
                        return Ok(Value::Int(pos as i64));
                    }
                }
                if type_name == "tuple" {
                    return Err(Exception::value_error("tuple.index(x): x not in tuple").into());
                }
                let shown = self.to_repr(needle)?;
                Err(Exception::value_error(format!("{shown} is not in list")).into())
            }
            "count" => {
                let mut count = 0;
                for item in items {
                    if self.equals(item, needle)? {
                        count += 1;
                    }
                }
                Ok(Value::Int(count))
            }
            other => Err(no_method(type_name, other).into()),
        }
    }

    // ========================================================================
    // dict
    // ========================================================================

    fn dict_method(&mut self, dict: &Rc<RefCell<PyDict>>, name: &str, args: Vec<Value>, kwargs: Kwargs) -> ExecResult<Value> {
        if name == "update" {
            arity("dict", name, &args, 0, 1)?;
            let mut incoming = PyDict::new();
            if let Some(source) = args.first() {
                self.dict_update(&mut incoming, source)?;
            }
            for (key, value) in kwargs {
                incoming.insert(Value::string(key), value)?;
            }
            let mut target = dict.borrow_mut();
            for (key, value) in incoming.iter() {
                target.insert(key.clone(), value.clone())?;
            }
            return Ok(Value::None);
        }
        no_kwargs("dict", name, &kwargs)?;
        let result = match name {
            "get" => {
                arity("dict", name, &args, 1, 2)?;
                let found = dict.borrow().get(&args[0])?;
                found.unwrap_or_else(|| args.get(1).cloned().unwrap_or(Value::None))
            }
            "keys" => {
                arity("dict", name, &args, 0, 0)?;
                Value::list(dict.borrow().keys())
            }
            "values" => {
                arity("dict", name, &args, 0, 0)?;
                Value::list(dict.borrow().values())
            }
            "items" => {
                arity("dict", name, &args, 0, 0)?;
                let pairs = dict.borrow().iter().map(|(k, v)| Value::tuple(vec![k.clone(), v.clone()])).collect();
                Value::list(pairs)
            }
            "pop" => {
                arity("dict", name, &args, 1, 2)?;
                let removed = dict.borrow_mut().remove(&args[0])?;
                match (removed, args.get(1)) {
                    (Some(value), _) => value,
                    (None, Some(default)) => default.clone(),
                    (None, None) => return Err(Exception::key_error(&args[0]).into()),
                }
            }
            "setdefault" => {
                arity("dict", name, &args, 1, 2)?;
                let existing = dict.borrow().get(&args[0])?;
                match existing {
                    Some(value) => value,
                    None => {
                        let default = args.get(1).cloned().unwrap_or(Value::None);
                        dict.borrow_mut().insert(args[0].clone(), default.clone())?;
                        default
                    }
                }
            }
            "copy" => {
                arity("dict", name, &args, 0, 0)?;
                Value::dict(dict.borrow().clone())
            }
            "clear" => {
                arity("dict", name, &args, 0, 0)?;
                dict.borrow_mut().clear();
                Value::None
            }
            other => return Err(no_method("dict", other).into()),
        };
        Ok(result)
    }

    // ========================================================================
    // set
    // ========================================================================

    fn set_method(&mut self, set: &Rc<RefCell<PySet>>, name: &str, args: Vec<Value>, kwargs: Kwargs) -> ExecResult<Value> {
        no_kwargs("set", name, &kwargs)?;
        let result = match name {
            "add" => {
                arity("set", name, &args, 1, 1)?;
                set.borrow_mut().insert(args[0].clone())?;
                Value::None
            }
            "remove" => {
                arity("set", name, &args, 1, 1)?;
                if !set.borrow_mut().remove(&args[0])? {
                    return Err(Exception::key_error(&args[0]).into());
                }
                Value::None
            }
            "discard" => {
                arity("set", name, &args, 1, 1)?;
                set.borrow_mut().remove(&args[0])?;
                Value::None
            }
            "copy" => {
                arity("set", name, &args, 0, 0)?;
                Value::set(set.borrow().clone())
            }
            "clear" => {
                arity("set", name, &args, 0, 0)?;
                *set.borrow_mut() = PySet::new();
                Value::None
            }
            "union" | "intersection" | "difference" => {
                let mut out = if name == "union" { set.borrow().clone() } else { PySet::new() };
                let mut others = Vec::with_capacity(args.len());
                for other in &args {
                    let mut members = PySet::new();
                    for item in self.drain(other)? {
                        members.insert(item)?;
                    }
                    others.push(members);
                }
                match name {
                    "union" => {
                        for other in &others {
                            for item in other.iter() {
                                out.insert(item.clone())?;
                            }
                        }
                    }
                    _ => {
                        let keep_common = name == "intersection";
                        for item in set.borrow().iter() {
                            let mut keep = true;
                            for other in &others {
                                if other.contains(item)? != keep_common {
                                    keep = false;
                                    break;
                                }
                            }
                            if keep {
                                out.insert(item.clone())?;
                            }
                        }
                    }
                }
                Value::set(out)
            }
            other => return Err(no_method("set", other).into()),
        };
        Ok(result)
    }
}

/// `object.__init__` reached through `super().__init__(...)`: exception subclasses record their `args`.
fn object_init(instance: &Rc<Instance>, args: Vec<Value>, kwargs: &Kwargs) -> Result<(), Exception> {
    if instance.class.exception_base.is_some() {
        no_kwargs(&instance.class.name, "__init__", kwargs)?;
        instance.attrs.borrow_mut().insert("args".to_string(), Value::tuple(args));
        return Ok(());
    }
    if !args.is_empty() || !kwargs.is_empty() {
        return Err(Exception::type_error(
            "object.__init__() takes exactly one argument (the instance to initialize)",
        ));
    }
    Ok(())
}

fn take_kwarg(kwargs: &mut Kwargs, name: &str) -> Option<Value> {
    let pos = kwargs.iter().position(|(k, _)| k == name)?;
    Some(kwargs.remove(pos).1)
}

fn no_method(type_name: &str, name: &str) -> Exception {
    Exception::attribute_error(format!("'{type_name}' object has no attribute '{name}'"))
}

/// `str.split(sep, maxsplit)`; a negative `maxsplit` means no limit.
fn split(s: &str, sep: Option<&str>, maxsplit: i64) -> Vec<String> {
    if maxsplit < 0 {
        return str_split(s, sep);
    }
    let limit = maxsplit as usize;
    match sep {
        Some(sep) => s.splitn(limit + 1, sep).map(str::to_string).collect(),
        None => {
            let mut parts = Vec::new();
            let mut rest = s.trim_start();
            while !rest.is_empty() {
                if parts.len() == limit {
                    parts.push(rest.to_string());
                    break;
                }
                let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
                parts.push(rest[..end].to_string());
                rest = rest[end..].trim_start();
            }
            parts
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_method_lookup_is_per_type() {
        assert_eq!(native_method(&Value::str("x"), "upper"), Some("upper"));
        assert_eq!(native_method(&Value::list(vec![]), "upper"), None);
        assert_eq!(native_method(&Value::tuple(vec![]), "count"), Some("count"));
        assert_eq!(native_method(&Value::Int(1), "count"), None);
    }

    #[test]
    fn test_split_with_maxsplit() {
        assert_eq!(split("a,b,c", Some(","), 1), vec!["a", "b,c"]);
        assert_eq!(split("  a  b c ", None, 1), vec!["a", "b c "]);
        assert_eq!(split("a b", None, -1), vec!["a", "b"]);
        assert_eq!(split("", None, 0), Vec::<String>::new());
    }

    #[test]
    fn test_arity_messages() {
        let err = arity("str", "upper", &[Value::Int(1)], 0, 0).unwrap_err();
        assert_eq!(err.message(), "str.upper() takes no arguments (1 given)");
        let err = arity("list", "append", &[], 1, 1).unwrap_err();
        assert_eq!(err.message(), "append() takes exactly one argument (0 given)");
    }
}
