//! Calls, argument binding, attribute access and subscripting.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use unitgen_core::errors::ErrorKind;
use unitgen_core::strings::normalize_index;

use super::error::{Exception, ExecResult, LimitError};
use super::math::call_math;
use super::methods::native_method;
use super::ops;
use super::dict::PyDict;
use super::value::{
    BoundMethod, Builtin, Class, ExceptionObject, Function, FunctionBody, Instance, MethodKind, Scope, Value,
    WrapperKind,
};
use super::{Flow, Frame, Interpreter, RuntimeError};

impl Interpreter {
    /// Call `callee` with positional and keyword arguments.
    ///
    /// Functions, lambdas, builtins, bound methods, classes (construction), exception classes and instances
    /// defining `__call__` are callable; anything else raises `TypeError`.
    pub fn call(&mut self, callee: &Value, args: Vec<Value>, kwargs: Vec<(String, Value)>) -> ExecResult<Value> {
        self.tick()?;
        match callee {
            Value::Function(function) => self.call_function(function, args, kwargs),
            Value::Builtin(Builtin::Function(id)) => self.call_builtin(*id, args, kwargs),
            Value::Builtin(Builtin::Math(id)) => {
                reject_kwargs(callee, &kwargs)?;
                Ok(call_math(*id, &args)?)
            }
            Value::Builtin(Builtin::Type(name)) => {
                Err(Exception::type_error(format!("cannot create '{name}' instances")).into())
            }
            Value::BoundMethod(method) => match &method.method {
                MethodKind::User(function) => {
                    let mut full = Vec::with_capacity(args.len() + 1);
                    full.push(method.receiver.clone());
                    full.extend(args);
                    self.call_function(function, full, kwargs)
                }
                MethodKind::Native(name) => self.call_method(&method.receiver, name, args, kwargs),
            },
            Value::Class(class) => self.instantiate(class, args, kwargs),
            Value::Wrapper(wrapper) if wrapper.kind == WrapperKind::StaticMethod => {
                let function = wrapper.function.clone();
                self.call(&function, args, kwargs)
            }
            Value::ExceptionClass(kind) => {
                reject_kwargs(callee, &kwargs)?;
                Ok(Value::Exception(Rc::new(ExceptionObject::new(*kind, args))))
            }
            Value::Instance(instance) => match instance.class.lookup("__call__") {
                Some(method) => {
                    let mut full = Vec::with_capacity(args.len() + 1);
                    full.push(callee.clone());
                    full.extend(args);
                    self.call(&method, full, kwargs)
                }
                None => Err(not_callable(callee)),
            },
            other => Err(not_callable(other)),
        }
    }

    fn call_function(
        &mut self,
        function: &Rc<Function>,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
    ) -> ExecResult<Value> {
        if self.depth >= self.limits.max_call_depth {
            return Err(LimitError::Depth(self.limits.max_call_depth).into());
        }
        let scope = bind_arguments(function, args, kwargs)?;
        let frame = Frame {
            scope,
            globals_declared: Rc::clone(&function.globals),
            class_name: None,
            function: Some(Rc::clone(function)),
        };

        self.depth += 1;
        let result = match &function.body {
            FunctionBody::Block(body) => self.exec_block(body, &frame).map(|flow| match flow {
                Flow::Return(value) => value,
                Flow::Normal | Flow::Break | Flow::Continue => Value::None,
            }),
            FunctionBody::Expr(expr) => self.eval(expr, &frame),
        };
        self.depth -= 1;
        result
    }

    /// Construct an instance of a user class, running `__init__` when defined.
    pub(crate) fn instantiate(
        &mut self,
        class: &Rc<Class>,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
    ) -> ExecResult<Value> {
        let instance = Rc::new(Instance {
            class: Rc::clone(class),
            attrs: RefCell::new(HashMap::new()),
        });
        let value = Value::Instance(Rc::clone(&instance));
        if class.exception_base.is_some() {
            instance
                .attrs
                .borrow_mut()
                .insert("args".to_string(), Value::tuple(args.clone()));
        }

        match class.lookup("__init__") {
            Some(init) => {
                let mut full = Vec::with_capacity(args.len() + 1);
                full.push(value.clone());
                full.extend(args);
                match self.call(&init, full, kwargs)? {
                    Value::None => {}
                    other => {
                        return Err(Exception::type_error(format!(
                            "__init__() should return None, not '{}'",
                            other.type_name()
                        ))
                        .into());
                    }
                }
            }
            None if class.exception_base.is_none() && !(args.is_empty() && kwargs.is_empty()) => {
                return Err(Exception::type_error(format!("{}() takes no arguments", class.name)).into());
            }
            None => {}
        }
        Ok(value)
    }

    /// Call `receiver.<name>(*args)` if the receiver is an instance whose class defines `name`.
    pub(crate) fn call_dunder(&mut self, receiver: &Value, name: &str, args: Vec<Value>) -> ExecResult<Option<Value>> {
        let Value::Instance(instance) = receiver else {
            return Ok(None);
        };
        let Some(method) = instance.class.lookup(name) else {
            return Ok(None);
        };
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push(receiver.clone());
        full.extend(args);
        self.call(&method, full, Vec::new()).map(Some)
    }

    // ========================================================================
    // Attributes
    // ========================================================================

    pub(crate) fn get_attr(&mut self, object: &Value, name: &str) -> ExecResult<Value> {
        let found = match object {
            Value::Instance(instance) => {
                if let Some(getter) = property_getter(&instance.class, name) {
                    return self.call(&getter, vec![object.clone()], Vec::new());
                }
                let own = instance.attrs.borrow().get(name).cloned();
                match own {
                    Some(value) => Some(value),
                    None if name == "__class__" => Some(Value::Class(Rc::clone(&instance.class))),
                    None => instance.class.lookup(name).map(|attr| bind_method(object, attr)),
                }
            }
            Value::Class(class) => match name {
                "__name__" => Some(Value::str(&class.name)),
                _ => class.lookup(name).map(|attr| match attr {
                    Value::Wrapper(_) => bind_method(object, attr),
                    plain => plain,
                }),
            },
            Value::Module(module) => match name {
                "__name__" => Some(Value::str(&module.name)),
                _ => module.attrs.get(name).cloned(),
            },
            Value::Function(function) if name == "__name__" => Some(Value::str(&function.name)),
            Value::Builtin(builtin) if name == "__name__" => Some(Value::str(builtin.name())),
            Value::ExceptionClass(kind) if name == "__name__" => Some(Value::str(kind.as_str())),
            Value::Exception(exception) if name == "args" => Some(Value::tuple(exception.args.clone())),
            other => native_method(other, name).map(|method| {
                Value::BoundMethod(Rc::new(BoundMethod {
                    receiver: other.clone(),
                    method: MethodKind::Native(method),
                }))
            }),
        };
        found.ok_or_else(|| no_attribute(object, name).into())
    }

    pub(crate) fn set_attr(&mut self, object: &Value, name: &str, value: Value) -> ExecResult<()> {
        match object {
            Value::Instance(instance) => {
                if property_getter(&instance.class, name).is_some() {
                    return Err(Exception::attribute_error(format!(
                        "property '{name}' of '{}' object has no setter",
                        instance.class.name
                    ))
                    .into());
                }
                instance.attrs.borrow_mut().insert(name.to_string(), value);
                Ok(())
            }
            Value::Class(class) => {
                class.attrs.borrow_mut().insert(name.to_string(), value);
                Ok(())
            }
            other => Err(no_attribute(other, name).into()),
        }
    }

    /// `super().<name>` inside a method: look `name` up on the bases of the method's class.
    pub(crate) fn super_attr(&mut self, name: &str, frame: &Frame) -> ExecResult<Value> {
        let not_available = || Exception::new(ErrorKind::RuntimeError, "super(): no arguments");
        let function = frame.function.as_ref().ok_or_else(not_available)?;
        let owner = function.owner.borrow().upgrade().ok_or_else(not_available)?;
        let receiver = function
            .param_names()
            .next()
            .and_then(|param| frame.scope.get_local(param))
            .ok_or_else(not_available)?;

        if let Some(attr) = owner.bases.iter().find_map(|base| base.lookup(name)) {
            if let Value::Wrapper(wrapper) = &attr {
                if wrapper.kind == WrapperKind::Property {
                    return self.call(&wrapper.function, vec![receiver], Vec::new());
                }
            }
            return Ok(bind_method(&receiver, attr));
        }
        if name == "__init__" {
            return Ok(Value::BoundMethod(Rc::new(BoundMethod {
                receiver,
                method: MethodKind::Native("__init__"),
            })));
        }
        Err(Exception::attribute_error(format!("'super' object has no attribute '{name}'")).into())
    }

    // ========================================================================
    // Subscripts
    // ========================================================================

    pub(crate) fn get_item(&mut self, container: &Value, index: &Value) -> ExecResult<Value> {
        if let Value::Instance(_) = container {
            return match self.call_dunder(container, "__getitem__", vec![index.clone()])? {
                Some(value) => Ok(value),
                None => Err(Exception::type_error(format!(
                    "'{}' object is not subscriptable",
                    container.type_name()
                ))
                .into()),
            };
        }
        Ok(ops::get_index(container, index)?)
    }

    pub(crate) fn set_item(&mut self, container: &Value, index: Value, value: Value) -> ExecResult<()> {
        match container {
            Value::List(items) => {
                let Some(i) = index.as_int() else {
                    return Err(Exception::type_error(format!(
                        "list indices must be integers or slices, not {}",
                        index.type_name()
                    ))
                    .into());
                };
                let mut items = items.borrow_mut();
                let pos = normalize_index(items.len(), i)
                    .ok_or_else(|| Exception::index_error("list assignment index out of range"))?;
                items[pos] = value;
                Ok(())
            }
            Value::Dict(dict) => Ok(dict.borrow_mut().insert(index, value)?),
            Value::Instance(_) => match self.call_dunder(container, "__setitem__", vec![index, value])? {
                Some(_) => Ok(()),
                None => Err(no_item_assignment(container)),
            },
            other => Err(no_item_assignment(other)),
        }
    }
}

/// Bind positional and keyword arguments to a fresh scope over the function's closure.
///
/// Surplus positional arguments go to `*args` and unmatched keywords to `**kwargs` when the function declares them.
fn bind_arguments(
    function: &Function,
    mut args: Vec<Value>,
    kwargs: Vec<(String, Value)>,
) -> Result<Rc<Scope>, Exception> {
    let name = &function.qualname;
    let count = function.params.len();
    let surplus = args.split_off(count.min(args.len()));
    if !surplus.is_empty() && function.var_positional.is_none() {
        let required = function.defaults.iter().filter(|d| d.is_none()).count();
        let takes = if required == count {
            format!("{count} positional argument{}", plural(count))
        } else {
            format!("from {required} to {count} positional arguments")
        };
        let given = count + surplus.len();
        let verb = if given == 1 { "was" } else { "were" };
        return Err(Exception::type_error(format!(
            "{name}() takes {takes} but {given} {verb} given"
        )));
    }

    let mut slots: Vec<Option<Value>> = args.into_iter().map(Some).collect();
    slots.resize(count, None);
    let mut keyword_slots: Vec<Option<Value>> = vec![None; function.keyword_only.len()];
    let mut extra = PyDict::new();
    for (key, value) in kwargs {
        let slot = match function.params.iter().position(|p| *p == key) {
            Some(i) => &mut slots[i],
            None => match function.keyword_only.iter().position(|(p, _)| *p == key) {
                Some(i) => &mut keyword_slots[i],
                None if function.var_keyword.is_some() => {
                    let key = Value::string(key);
                    if extra.contains_key(&key)? {
                        return Err(Exception::type_error(format!(
                            "{name}() got multiple values for keyword argument {}",
                            key.repr()
                        )));
                    }
                    extra.insert(key, value)?;
                    continue;
                }
                None => {
                    return Err(Exception::type_error(format!(
                        "{name}() got an unexpected keyword argument '{key}'"
                    )));
                }
            },
        };
        if slot.is_some() {
            return Err(Exception::type_error(format!(
                "{name}() got multiple values for argument '{key}'"
            )));
        }
        *slot = Some(value);
    }

    let mut missing = Vec::new();
    for ((slot, default), param) in slots.iter_mut().zip(&function.defaults).zip(&function.params) {
        if slot.is_none() {
            match default {
                Some(default) => *slot = Some(default.clone()),
                None => missing.push(format!("'{param}'")),
            }
        }
    }
    if !missing.is_empty() {
        return Err(missing_arguments(name, "positional", &missing));
    }
    for (slot, (param, default)) in keyword_slots.iter_mut().zip(&function.keyword_only) {
        if slot.is_none() {
            match default {
                Some(default) => *slot = Some(default.clone()),
                None => missing.push(format!("'{param}'")),
            }
        }
    }
    if !missing.is_empty() {
        return Err(missing_arguments(name, "keyword-only", &missing));
    }

    let scope = Scope::child(&function.closure);
    for (param, slot) in function.params.iter().zip(slots) {
        scope.set(param, slot.unwrap_or(Value::None));
    }
    if let Some(param) = &function.var_positional {
        scope.set(param, Value::tuple(surplus));
    }
    for ((param, _), slot) in function.keyword_only.iter().zip(keyword_slots) {
        scope.set(param, slot.unwrap_or(Value::None));
    }
    if let Some(param) = &function.var_keyword {
        scope.set(param, Value::dict(extra));
    }
    Ok(scope)
}

fn missing_arguments(name: &str, which: &str, missing: &[String]) -> Exception {
    Exception::type_error(format!(
        "{name}() missing {} required {which} argument{}: {}",
        missing.len(),
        plural(missing.len()),
        join_names(missing)
    ))
}

/// `'a'`, `'a' and 'b'`, `'a', 'b', and 'c'`.
fn join_names(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [one] => one.clone(),
        [a, b] => format!("{a} and {b}"),
        [rest @ .., last] => format!("{}, and {last}", rest.join(", ")),
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

/// Bind a class attribute fetched through an instance: functions become bound methods.
///
/// Static methods unwrap to their function and class methods bind the receiver's class.
fn bind_method(receiver: &Value, attr: Value) -> Value {
    let bound = |receiver: Value, function: Rc<Function>| {
        Value::BoundMethod(Rc::new(BoundMethod {
            receiver,
            method: MethodKind::User(function),
        }))
    };
    match attr {
        Value::Function(function) => bound(receiver.clone(), function),
        Value::Wrapper(wrapper) => match (wrapper.kind, &wrapper.function) {
            (WrapperKind::StaticMethod, function) => function.clone(),
            (WrapperKind::ClassMethod, Value::Function(function)) => {
                let class = match receiver {
                    Value::Instance(instance) => Value::Class(Rc::clone(&instance.class)),
                    other => other.clone(),
                };
                bound(class, Rc::clone(function))
            }
            _ => Value::Wrapper(wrapper),
        },
        other => other,
    }
}

/// Getter of the `property` `name` resolves to on `class`.
fn property_getter(class: &Class, name: &str) -> Option<Value> {
    match class.lookup(name)? {
        Value::Wrapper(wrapper) if wrapper.kind == WrapperKind::Property => Some(wrapper.function.clone()),
        _ => None,
    }
}

fn reject_kwargs(callee: &Value, kwargs: &[(String, Value)]) -> Result<(), Exception> {
    match kwargs.first() {
        None => Ok(()),
        Some(_) => Err(Exception::type_error(format!(
            "{}() takes no keyword arguments",
            callee_name(callee)
        ))),
    }
}

fn callee_name(callee: &Value) -> String {
    match callee {
        Value::Builtin(builtin) => builtin.name().to_string(),
        Value::ExceptionClass(kind) => kind.as_str().to_string(),
        other => other.type_name(),
    }
}

fn not_callable(value: &Value) -> RuntimeError {
    Exception::type_error(format!("'{}' object is not callable", value.type_name())).into()
}

fn no_item_assignment(value: &Value) -> RuntimeError {
    Exception::type_error(format!(
        "'{}' object does not support item assignment",
        value.type_name()
    ))
    .into()
}

fn no_attribute(object: &Value, name: &str) -> Exception {
    match object {
        Value::Class(class) => {
            Exception::attribute_error(format!("type object '{}' has no attribute '{name}'", class.name))
        }
        Value::Module(module) => {
            Exception::attribute_error(format!("module '{}' has no attribute '{name}'", module.name))
        }
        other => Exception::attribute_error(format!(
            "'{}' object has no attribute '{name}'",
            other.type_name()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_names_matches_python_phrasing() {
        let names: Vec<String> = ["'a'", "'b'", "'c'"].iter().map(|s| s.to_string()).collect();
        assert_eq!(join_names(&names[..1]), "'a'");
        assert_eq!(join_names(&names[..2]), "'a' and 'b'");
        assert_eq!(join_names(&names), "'a', 'b', and 'c'");
    }
}
