//! Runtime value model.
//!
//! [`Value`] is a cheap-to-clone handle: scalars are stored inline, everything mutable or shared lives behind an
//! `Rc` (with `RefCell` for the mutable containers). Identity (`is`) is pointer identity on those `Rc`s.
//!
//! This module only knows the **pure** renderings: [`Value::repr`] and [`Value::to_str`] never run target code.
//! The interpreter layers `__repr__`/`__str__` dispatch on top through [`render_container`].

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::convert::Infallible;
use std::fmt;
use std::rc::{Rc, Weak};

use num_bigint::BigInt;
use num_traits::{FromPrimitive, ToPrimitive};

use unitgen_core::errors::ErrorKind;
use unitgen_core::format_float_repr;
use unitgen_core::lang::builtins::{self, BuiltinFnId};
use unitgen_core::lang::math::{self, MathFnId};
use unitgen_core::strings::str_repr;
use unitgen_syntax::ast::{Expr, Spanned, Statement};

use super::dict::{PyDict, PySet};
use super::error::Exception;

/// Largest sequence a repetition (`"ab" * n`, `[0] * n`) or range materialization may produce.
pub const MAX_REPEAT_LEN: usize = 10_000_000;

/// A runtime value.
#[derive(Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    /// An `int` outside the 64-bit range; see [`super::bigint`].
    BigInt(Rc<BigInt>),
    Float(f64),
    Str(Rc<str>),
    List(Rc<RefCell<Vec<Value>>>),
    Tuple(Rc<[Value]>),
    Dict(Rc<RefCell<PyDict>>),
    Set(Rc<RefCell<PySet>>),
    Range(Range),
    Function(Rc<Function>),
    Builtin(Builtin),
    BoundMethod(Rc<BoundMethod>),
    Class(Rc<Class>),
    Instance(Rc<Instance>),
    Module(Rc<ModuleObject>),
    ExceptionClass(ErrorKind),
    Exception(Rc<ExceptionObject>),
    Wrapper(Rc<MethodWrapper>),
}

/// `range(start, stop, step)`; never materialized unless asked to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: i64,
    pub stop: i64,
    pub step: i64,
}

impl Range {
    pub fn len(&self) -> usize {
        let (start, stop, step) = (self.start as i128, self.stop as i128, self.step as i128);
        let n = if step > 0 && start < stop {
            (stop - start - 1) / step + 1
        } else if step < 0 && start > stop {
            (start - stop - 1) / (-step) + 1
        } else {
            0
        };
        usize::try_from(n).unwrap_or(usize::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at a non-negative position (caller checks bounds).
    pub fn nth(&self, pos: usize) -> i64 {
        (self.start as i128 + pos as i128 * self.step as i128) as i64
    }

    pub fn contains(&self, n: i64) -> bool {
        let in_bounds = if self.step > 0 {
            self.start <= n && n < self.stop
        } else {
            self.stop < n && n <= self.start
        };
        in_bounds && (n as i128 - self.start as i128) % self.step as i128 == 0
    }
}

/// Natively implemented callables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Function(BuiltinFnId),
    Math(MathFnId),
    /// A type object with no constructor (`type(None)`, `type(len)`).
    Type(&'static str),
}

impl Builtin {
    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Function(id) => builtins::as_str(*id),
            Builtin::Math(id) => math::fn_name(*id),
            Builtin::Type(name) => name,
        }
    }

    /// `true` for builtins that are also types (`int`, `list`, ...).
    pub fn is_type(&self) -> bool {
        match self {
            Builtin::Function(id) => matches!(
                id,
                BuiltinFnId::Int
                    | BuiltinFnId::Float
                    | BuiltinFnId::Str
                    | BuiltinFnId::Bool
                    | BuiltinFnId::List
                    | BuiltinFnId::Tuple
                    | BuiltinFnId::Dict
                    | BuiltinFnId::Set
                    | BuiltinFnId::Range
                    | BuiltinFnId::Type
                    | BuiltinFnId::StaticMethod
                    | BuiltinFnId::ClassMethod
                    | BuiltinFnId::Property
            ),
            Builtin::Math(_) => false,
            Builtin::Type(_) => true,
        }
    }
}

/// Body of a user function: a `def` block or a `lambda` expression.
#[derive(Debug)]
pub enum FunctionBody {
    Block(Vec<Spanned<Statement>>),
    Expr(Spanned<Expr>),
}

/// A user-defined function or lambda.
pub struct Function {
    pub name: String,
    /// `Class.method` for methods, otherwise the plain name.
    pub qualname: String,
    /// Positional-or-keyword parameters.
    pub params: Vec<String>,
    /// Default values, evaluated once at definition time; aligned with `params`.
    pub defaults: Vec<Option<Value>>,
    /// Name of the `*args` parameter.
    pub var_positional: Option<String>,
    /// Parameters after `*` or `*args`, with their defaults.
    pub keyword_only: Vec<(String, Option<Value>)>,
    /// Name of the `**kwargs` parameter.
    pub var_keyword: Option<String>,
    pub body: FunctionBody,
    /// Scope the function was defined in.
    pub closure: Rc<Scope>,
    /// Names declared `global` in the body.
    pub globals: Rc<HashSet<String>>,
    /// Names the body binds (parameters included); reading one before assignment is an `UnboundLocalError`.
    pub locals: HashSet<String>,
    /// Class whose body defined this function; set once the class object exists. Used by `super()`.
    pub owner: RefCell<Weak<Class>>,
}

impl Function {
    /// Every parameter name, in declaration order.
    pub fn param_names(&self) -> impl Iterator<Item = &String> {
        self.params
            .iter()
            .chain(&self.var_positional)
            .chain(self.keyword_only.iter().map(|(name, _)| name))
            .chain(&self.var_keyword)
    }
}

/// What `staticmethod`, `classmethod` or `property` made of a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapperKind {
    StaticMethod,
    ClassMethod,
    Property,
}

impl WrapperKind {
    pub fn name(self) -> &'static str {
        match self {
            WrapperKind::StaticMethod => "staticmethod",
            WrapperKind::ClassMethod => "classmethod",
            WrapperKind::Property => "property",
        }
    }
}

/// A function wrapped by a method decorator; class attribute lookup unwraps it.
pub struct MethodWrapper {
    pub kind: WrapperKind,
    pub function: Value,
}

/// Method of a bound method.
pub enum MethodKind {
    User(Rc<Function>),
    /// A `str`/`list`/`dict`/`set` method, by name.
    Native(&'static str),
}

pub struct BoundMethod {
    pub receiver: Value,
    pub method: MethodKind,
}

/// A user-defined class.
pub struct Class {
    pub name: String,
    pub module: Rc<str>,
    pub bases: Vec<Rc<Class>>,
    /// Builtin exception kind this class derives from, if any.
    pub exception_base: Option<ErrorKind>,
    pub attrs: RefCell<HashMap<String, Value>>,
}

impl Class {
    /// Look `name` up on the class and then its bases, depth-first left to right.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(v) = self.attrs.borrow().get(name) {
            return Some(v.clone());
        }
        self.bases.iter().find_map(|base| base.lookup(name))
    }

    /// `true` if `class` is `ancestor` or derives from it.
    pub fn is_subclass(class: &Rc<Class>, ancestor: &Rc<Class>) -> bool {
        Rc::ptr_eq(class, ancestor) || class.bases.iter().any(|base| Class::is_subclass(base, ancestor))
    }
}

pub struct Instance {
    pub class: Rc<Class>,
    pub attrs: RefCell<HashMap<String, Value>>,
}

/// An importable module (only `math` exists).
pub struct ModuleObject {
    pub name: String,
    pub attrs: HashMap<String, Value>,
}

/// An instance of a builtin exception class.
#[derive(Debug)]
pub struct ExceptionObject {
    pub kind: ErrorKind,
    pub args: Vec<Value>,
}

impl ExceptionObject {
    pub fn new(kind: ErrorKind, args: Vec<Value>) -> Self {
        Self { kind, args }
    }

    /// `str(e)`: empty for no args, the argument for one, the args tuple otherwise.
    pub fn message(&self) -> String {
        exception_args_str(self.kind, &self.args, &mut |v| Ok::<_, Infallible>(v.to_str()), &mut |v| {
            Ok::<_, Infallible>(v.repr())
        })
        .unwrap_or_else(|never| match never {})
    }
}

/// Shared `str(exception)` rule, parameterized over the renderers so the interpreter can honour dunders.
pub(crate) fn exception_args_str<E>(
    kind: ErrorKind,
    args: &[Value],
    to_str: &mut dyn FnMut(&Value) -> Result<String, E>,
    to_repr: &mut dyn FnMut(&Value) -> Result<String, E>,
) -> Result<String, E> {
    match args {
        [] => Ok(String::new()),
        [single] if kind == ErrorKind::KeyError => to_repr(single),
        [single] => to_str(single),
        many => {
            let parts = many.iter().map(|v| to_repr(v)).collect::<Result<Vec<_>, E>>()?;
            Ok(format!("({})", parts.join(", ")))
        }
    }
}

/// A lexical scope: module globals, a call frame's locals, a class body or a comprehension.
#[derive(Default)]
pub struct Scope {
    vars: RefCell<HashMap<String, Value>>,
    parent: Option<Rc<Scope>>,
}

impl Scope {
    pub fn new_root() -> Rc<Scope> {
        Rc::new(Scope::default())
    }

    pub fn child(parent: &Rc<Scope>) -> Rc<Scope> {
        Rc::new(Scope {
            vars: RefCell::new(HashMap::new()),
            parent: Some(Rc::clone(parent)),
        })
    }

    pub fn parent(&self) -> Option<&Rc<Scope>> {
        self.parent.as_ref()
    }

    /// Resolve through this scope and its ancestors.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(v) = self.vars.borrow().get(name) {
            return Some(v.clone());
        }
        self.parent.as_ref().and_then(|p| p.get(name))
    }

    /// Resolve through this scope and its ancestors, stopping before `boundary`.
    pub fn get_within(&self, name: &str, boundary: &Rc<Scope>) -> Option<Value> {
        if std::ptr::eq(self, Rc::as_ptr(boundary)) {
            return None;
        }
        self.get_local(name).or_else(|| self.parent()?.get_within(name, boundary))
    }

    pub fn get_local(&self, name: &str) -> Option<Value> {
        self.vars.borrow().get(name).cloned()
    }

    pub fn set(&self, name: &str, value: Value) {
        self.vars.borrow_mut().insert(name.to_string(), value);
    }

    /// Snapshot of this scope's own bindings.
    pub fn locals(&self) -> Vec<(String, Value)> {
        self.vars.borrow().iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

/// Hash identity of a value, consistent with Python equality for hashable values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HashKey {
    None,
    Int(i64),
    BigInt(BigInt),
    /// Bits of a non-integral float.
    Float(u64),
    Str(Rc<str>),
    Tuple(Vec<HashKey>),
    Range(i64, i64, i64),
    Builtin(Builtin),
    ExceptionClass(ErrorKind),
    /// Pointer identity for objects hashed by identity.
    Identity(usize),
}

/// Lazy iteration over a value's items.
pub enum ValueIter {
    Items(std::vec::IntoIter<Value>),
    Range { next: i64, remaining: usize, step: i64 },
}

impl Iterator for ValueIter {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        match self {
            ValueIter::Items(items) => items.next(),
            ValueIter::Range { next, remaining, step } => {
                if *remaining == 0 {
                    return None;
                }
                let current = *next;
                *remaining -= 1;
                *next = next.wrapping_add(*step);
                Some(Value::Int(current))
            }
        }
    }
}

fn identity<T: ?Sized>(rc: &Rc<T>) -> usize {
    Rc::as_ptr(rc) as *const () as usize
}

impl Value {
    pub fn str(s: &str) -> Value {
        Value::Str(Rc::from(s))
    }

    pub fn string(s: String) -> Value {
        Value::Str(Rc::from(s))
    }

    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn tuple(items: Vec<Value>) -> Value {
        Value::Tuple(Rc::from(items))
    }

    pub fn dict(dict: PyDict) -> Value {
        Value::Dict(Rc::new(RefCell::new(dict)))
    }

    pub fn set(set: PySet) -> Value {
        Value::Set(Rc::new(RefCell::new(set)))
    }

    /// A copy with fresh `list`, `dict` and `set` containers at every level; other values are shared.
    pub fn deep_copy(&self) -> Value {
        match self {
            Value::List(items) => Value::list(items.borrow().iter().map(Value::deep_copy).collect()),
            Value::Tuple(items) => Value::tuple(items.iter().map(Value::deep_copy).collect()),
            Value::Dict(dict) => Value::dict(dict.borrow().map_values(Value::deep_copy)),
            Value::Set(set) => Value::set(set.borrow().clone()),
            other => other.clone(),
        }
    }

    /// Python type name (`int`, `NoneType`, the class name of an instance).
    pub fn type_name(&self) -> String {
        match self {
            Value::None => "NoneType".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Int(_) | Value::BigInt(_) => "int".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::Str(_) => "str".to_string(),
            Value::List(_) => "list".to_string(),
            Value::Tuple(_) => "tuple".to_string(),
            Value::Dict(_) => "dict".to_string(),
            Value::Set(_) => "set".to_string(),
            Value::Range(_) => "range".to_string(),
            Value::Function(_) => "function".to_string(),
            Value::Builtin(b) if b.is_type() => "type".to_string(),
            Value::Builtin(_) => "builtin_function_or_method".to_string(),
            Value::BoundMethod(m) => match m.method {
                MethodKind::User(_) => "method".to_string(),
                MethodKind::Native(_) => "builtin_function_or_method".to_string(),
            },
            Value::Class(_) | Value::ExceptionClass(_) => "type".to_string(),
            Value::Instance(i) => i.class.name.clone(),
            Value::Module(_) => "module".to_string(),
            Value::Exception(e) => e.kind.as_str().to_string(),
            Value::Wrapper(w) => w.kind.name().to_string(),
        }
    }

    /// Truthiness without dunder dispatch.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.borrow().is_empty(),
            Value::Tuple(items) => !items.is_empty(),
            Value::Dict(d) => !d.borrow().is_empty(),
            Value::Set(s) => !s.borrow().is_empty(),
            Value::Range(r) => !r.is_empty(),
            _ => true,
        }
    }

    /// Integer view of `int` and `bool`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }

    /// Arbitrary-precision view of `int` and `bool`.
    pub fn as_bigint(&self) -> Option<BigInt> {
        match self {
            Value::BigInt(n) => Some(BigInt::clone(n)),
            other => other.as_int().map(BigInt::from),
        }
    }

    /// `true` for `int` (of either width) and `bool`.
    pub fn is_int(&self) -> bool {
        matches!(self, Value::Int(_) | Value::BigInt(_) | Value::Bool(_))
    }

    /// `true` for any real number.
    pub fn is_number(&self) -> bool {
        self.is_int() || matches!(self, Value::Float(_))
    }

    /// Float view of any real number; `None` for an `int` beyond the float range.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(n) => Some(*n as f64),
            Value::BigInt(n) => n.to_f64().filter(|f| f.is_finite()),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn is_callable(&self) -> bool {
        match self {
            Value::Function(_)
            | Value::Builtin(_)
            | Value::BoundMethod(_)
            | Value::Class(_)
            | Value::ExceptionClass(_) => true,
            Value::Instance(i) => i.class.lookup("__call__").is_some(),
            _ => false,
        }
    }

    /// `true` for values that compare by identity under `is` (heap objects).
    pub fn is_same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => Rc::ptr_eq(a, b) || a == b,
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Tuple(a), Value::Tuple(b)) => Rc::ptr_eq(a, b),
            (Value::Dict(a), Value::Dict(b)) => Rc::ptr_eq(a, b),
            (Value::Set(a), Value::Set(b)) => Rc::ptr_eq(a, b),
            (Value::Range(a), Value::Range(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            (Value::BoundMethod(a), Value::BoundMethod(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            (Value::Module(a), Value::Module(b)) => Rc::ptr_eq(a, b),
            (Value::ExceptionClass(a), Value::ExceptionClass(b)) => a == b,
            (Value::Exception(a), Value::Exception(b)) => Rc::ptr_eq(a, b),
            (Value::Wrapper(a), Value::Wrapper(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Hash identity; `TypeError` for mutable containers.
    pub fn hash_key(&self) -> Result<HashKey, Exception> {
        Ok(match self {
            Value::None => HashKey::None,
            Value::Bool(b) => HashKey::Int(*b as i64),
            Value::Int(n) => HashKey::Int(*n),
            Value::BigInt(n) => HashKey::BigInt(BigInt::clone(n)),
            Value::Float(f) => {
                if f.fract() == 0.0 && f.abs() < 9.2e18 {
                    HashKey::Int(*f as i64)
                } else if f.fract() == 0.0 && f.is_finite() {
                    // Integral floats beyond 64 bits hash like the equal `int`.
                    match BigInt::from_f64(*f) {
                        Some(n) => match n.to_i64() {
                            Some(small) => HashKey::Int(small),
                            None => HashKey::BigInt(n),
                        },
                        None => HashKey::Float(f.to_bits()),
                    }
                } else {
                    HashKey::Float(f.to_bits())
                }
            }
            Value::Str(s) => HashKey::Str(Rc::clone(s)),
            Value::Tuple(items) => HashKey::Tuple(items.iter().map(Value::hash_key).collect::<Result<_, _>>()?),
            Value::Range(r) => HashKey::Range(r.start, r.stop, r.step),
            Value::Builtin(b) => HashKey::Builtin(*b),
            Value::ExceptionClass(k) => HashKey::ExceptionClass(*k),
            Value::Function(f) => HashKey::Identity(identity(f)),
            Value::BoundMethod(m) => HashKey::Identity(identity(m)),
            Value::Class(c) => HashKey::Identity(identity(c)),
            Value::Instance(i) => HashKey::Identity(identity(i)),
            Value::Module(m) => HashKey::Identity(identity(m)),
            Value::Exception(e) => HashKey::Identity(identity(e)),
            Value::Wrapper(w) => HashKey::Identity(identity(w)),
            Value::List(_) | Value::Dict(_) | Value::Set(_) => {
                return Err(Exception::type_error(format!("unhashable type: '{}'", self.type_name())));
            }
        })
    }

    /// Iterate the items of an iterable (strings yield characters, dicts yield keys).
    pub fn iter(&self) -> Result<ValueIter, Exception> {
        let items = match self {
            Value::Str(s) => s.chars().map(|c| Value::string(c.to_string())).collect(),
            Value::List(items) => items.borrow().clone(),
            Value::Tuple(items) => items.to_vec(),
            Value::Dict(d) => d.borrow().keys(),
            Value::Set(s) => s.borrow().to_vec(),
            Value::Range(r) => {
                return Ok(ValueIter::Range {
                    next: r.start,
                    remaining: r.len(),
                    step: r.step,
                });
            }
            _ => {
                return Err(Exception::type_error(format!(
                    "'{}' object is not iterable",
                    self.type_name()
                )));
            }
        };
        Ok(ValueIter::Items(items.into_iter()))
    }

    /// Collect an iterable into a vector, refusing ranges longer than [`MAX_REPEAT_LEN`].
    pub fn to_vec(&self) -> Result<Vec<Value>, Exception> {
        if let Value::Range(r) = self {
            if r.len() > MAX_REPEAT_LEN {
                return Err(Exception::new(
                    ErrorKind::OverflowError,
                    format!("range of {} items is too large to materialize", r.len()),
                ));
            }
        }
        Ok(self.iter()?.collect())
    }

    /// `repr(value)` without dunder dispatch.
    pub fn repr(&self) -> String {
        render_pure(self, true)
    }

    /// `str(value)` without dunder dispatch.
    pub fn to_str(&self) -> String {
        render_pure(self, false)
    }
}

fn render_pure(value: &Value, repr: bool) -> String {
    let rendered = render_container(value, &mut |item| Ok::<_, Infallible>(super::grow_stack(|| render_pure(item, true))))
        .unwrap_or_else(|never| match never {});
    if let Some(text) = rendered {
        return text;
    }
    match value {
        Value::Str(s) if repr => str_repr(s),
        Value::Str(s) => s.to_string(),
        Value::Exception(e) if !repr => e.message(),
        Value::Exception(e) => {
            let args: Vec<String> = e.args.iter().map(Value::repr).collect();
            format!("{}({})", e.kind, args.join(", "))
        }
        Value::BoundMethod(m) => match &m.method {
            MethodKind::User(f) => format!("<bound method {} of {}>", f.qualname, m.receiver.repr()),
            MethodKind::Native(name) => format!(
                "<built-in method {name} of {} object at {:#x}>",
                m.receiver.type_name(),
                identity(m)
            ),
        },
        Value::Instance(i) => format!("<{}.{} object at {:#x}>", i.class.module, i.class.name, identity(i)),
        other => scalar_repr(other),
    }
}

/// Rendering for values whose `str` and `repr` agree and contain no other values.
pub(crate) fn scalar_repr(value: &Value) -> String {
    match value {
        Value::None => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Int(n) => n.to_string(),
        Value::BigInt(n) => n.to_string(),
        Value::Float(f) => format_float_repr(*f),
        Value::Str(s) => str_repr(s),
        Value::Range(r) if r.step == 1 => format!("range({}, {})", r.start, r.stop),
        Value::Range(r) => format!("range({}, {}, {})", r.start, r.stop, r.step),
        Value::Function(f) => format!("<function {} at {:#x}>", f.qualname, identity(f)),
        Value::Builtin(b) if b.is_type() => format!("<class '{}'>", b.name()),
        Value::Builtin(b) => format!("<built-in function {}>", b.name()),
        Value::Class(c) => format!("<class '{}.{}'>", c.module, c.name),
        Value::Module(m) => format!("<module '{}' (built-in)>", m.name),
        Value::ExceptionClass(k) => format!("<class '{k}'>"),
        Value::Instance(i) => format!("<{}.{} object at {:#x}>", i.class.module, i.class.name, identity(i)),
        Value::Exception(e) => format!("{}()", e.kind),
        Value::BoundMethod(m) => format!("<method at {:#x}>", identity(m)),
        Value::Wrapper(w) => format!("<{} object at {:#x}>", w.kind.name(), identity(w)),
        Value::List(_) | Value::Tuple(_) | Value::Dict(_) | Value::Set(_) => String::new(),
    }
}

/// Render a container with `item` as the element renderer; `None` for non-containers.
///
/// Elements are always rendered in `repr` form, as in Python.
pub(crate) fn render_container<E>(
    value: &Value,
    item: &mut dyn FnMut(&Value) -> Result<String, E>,
) -> Result<Option<String>, E> {
    let text = match value {
        Value::List(items) => {
            let items = items.borrow().clone();
            format!("[{}]", join(&items, item)?)
        }
        Value::Tuple(items) if items.len() == 1 => format!("({},)", item(&items[0])?),
        Value::Tuple(items) => format!("({})", join(items, item)?),
        Value::Set(s) => {
            let items = s.borrow().to_vec();
            if items.is_empty() {
                "set()".to_string()
            } else {
                format!("{{{}}}", join(&items, item)?)
            }
        }
        Value::Dict(d) => {
            let pairs: Vec<(Value, Value)> = d.borrow().iter().map(|(k, v)| (k.clone(), v.clone())).collect();
            let mut parts = Vec::with_capacity(pairs.len());
            for (k, v) in &pairs {
                parts.push(format!("{}: {}", item(k)?, item(v)?));
            }
            format!("{{{}}}", parts.join(", "))
        }
        _ => return Ok(None),
    };
    Ok(Some(text))
}

fn join<E>(items: &[Value], item: &mut dyn FnMut(&Value) -> Result<String, E>) -> Result<String, E> {
    let parts = items.iter().map(|v| item(v)).collect::<Result<Vec<_>, E>>()?;
    Ok(parts.join(", "))
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_str())
    }
}

impl PartialEq for Value {
    /// Python `==` (numeric types compare across `bool`/`int`/`float`).
    fn eq(&self, other: &Value) -> bool {
        super::ops::values_equal(self, other)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<BigInt> for Value {
    fn from(n: BigInt) -> Self {
        super::bigint::int_value(n)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deep_copy_detaches_nested_containers() {
        let inner = Value::list(vec![Value::Int(1)]);
        let mut dict = PyDict::new();
        dict.insert(Value::str("k"), inner.clone()).unwrap();
        let original = Value::tuple(vec![inner.clone(), Value::dict(dict)]);

        let copy = original.deep_copy();
        if let Value::List(items) = &inner {
            items.borrow_mut().push(Value::Int(2));
        }
        assert_eq!(original.repr(), "([1, 2], {'k': [1, 2]})");
        assert_eq!(copy.repr(), "([1], {'k': [1]})");
    }

    #[test]
    fn test_repr_and_str_of_scalars() {
        assert_eq!(Value::None.repr(), "None");
        assert_eq!(Value::Bool(true).to_str(), "True");
        assert_eq!(Value::Float(2.0).repr(), "2.0");
        assert_eq!(Value::str("hi").repr(), "'hi'");
        assert_eq!(Value::str("hi").to_str(), "hi");
    }

    #[test]
    fn test_container_repr_uses_item_repr() {
        let v = Value::list(vec![Value::str("a"), Value::tuple(vec![Value::Int(1)]), Value::None]);
        assert_eq!(v.to_str(), "['a', (1,), None]");
        assert_eq!(Value::tuple(vec![]).repr(), "()");
        assert_eq!(Value::set(PySet::new()).repr(), "set()");
    }

    #[test]
    fn test_range_len_and_contains() {
        let r = Range { start: 0, stop: 10, step: 3 };
        assert_eq!(r.len(), 4);
        assert!(r.contains(9));
        assert!(!r.contains(10));
        let back = Range { start: 5, stop: 0, step: -2 };
        assert_eq!(Value::Range(back).to_vec().unwrap(), vec![Value::Int(5), Value::Int(3), Value::Int(1)]);
        assert_eq!(Value::Range(back).repr(), "range(5, 0, -2)");
    }

    #[test]
    fn test_huge_range_refuses_to_materialize() {
        let r = Value::Range(Range { start: 0, stop: i64::MAX, step: 1 });
        assert_eq!(r.to_vec().unwrap_err().kind(), ErrorKind::OverflowError);
        assert_eq!(r.iter().unwrap().take(3).count(), 3);
    }

    #[test]
    fn test_exception_object_str() {
        let e = ExceptionObject::new(ErrorKind::ValueError, vec![Value::str("bad")]);
        assert_eq!(e.message(), "bad");
        let e = ExceptionObject::new(ErrorKind::ValueError, vec![Value::str("a"), Value::Int(1)]);
        assert_eq!(e.message(), "('a', 1)");
        let v = Value::Exception(Rc::new(ExceptionObject::new(ErrorKind::KeyError, vec![Value::str("k")])));
        assert_eq!(v.to_str(), "'k'");
        assert_eq!(v.repr(), "KeyError('k')");
    }

    #[test]
    fn test_scope_chain_lookup() {
        let root = Scope::new_root();
        root.set("x", Value::Int(1));
        let child = Scope::child(&root);
        child.set("y", Value::Int(2));
        assert_eq!(child.get("x"), Some(Value::Int(1)));
        assert!(root.get("y").is_none());
        assert!(child.get_local("x").is_none());
    }
}
