//! Expression evaluation and operator dispatch.

use std::collections::HashSet;
use std::rc::Rc;

use unitgen_core::errors::ErrorKind;
use unitgen_syntax::ast::{
    BinaryOp, CallArg, CompClause, CompareOp, DictComp, Expr, FStringPart, ListComp, Literal, SliceExpr, Spanned, UnaryOp,
};

use super::bigint;
use super::builtins::builtin_value;
use super::dict::{PyDict, PySet};
use super::error::{Exception, ExecResult};
use super::exec::BodyNames;
use super::format::format_value;
use super::ops;
use super::value::{FunctionBody, Scope, Value};
use super::{Frame, Interpreter, grow_stack};

impl Interpreter {
    pub(crate) fn eval(&mut self, expr: &Spanned<Expr>, frame: &Frame) -> ExecResult<Value> {
        grow_stack(|| self.eval_node(expr, frame))
    }

    fn eval_node(&mut self, expr: &Spanned<Expr>, frame: &Frame) -> ExecResult<Value> {
        match &expr.node {
            Expr::Name(name) => self.lookup_name(name, frame),
            Expr::Literal(literal) => Ok(literal_value(literal)?),
            Expr::Binary(lhs, BinaryOp::And, rhs) => {
                let left = self.eval(lhs, frame)?;
                if !self.is_truthy(&left)? {
                    return Ok(left);
                }
                self.eval(rhs, frame)
            }
            Expr::Binary(lhs, BinaryOp::Or, rhs) => {
                let left = self.eval(lhs, frame)?;
                if self.is_truthy(&left)? {
                    return Ok(left);
                }
                self.eval(rhs, frame)
            }
            Expr::Binary(lhs, op, rhs) => {
                let left = self.eval(lhs, frame)?;
                let right = self.eval(rhs, frame)?;
                self.binary(*op, &left, &right)
            }
            Expr::Unary(op, operand) => {
                let value = self.eval(operand, frame)?;
                self.unary(*op, &value)
            }
            Expr::Compare(first, rest) => {
                let mut left = self.eval(first, frame)?;
                for (op, expr) in rest {
                    let right = self.eval(expr, frame)?;
                    if !self.compare(*op, &left, &right)? {
                        return Ok(Value::Bool(false));
                    }
                    left = right;
                }
                Ok(Value::Bool(true))
            }
            Expr::Call(callee, args) => self.eval_call(callee, args, frame),
            Expr::Attribute(object, name) => {
                if is_super_call(object) {
                    return self.super_attr(name, frame);
                }
                let object = self.eval(object, frame)?;
                self.get_attr(&object, name)
            }
            Expr::Index(object, index) => {
                let object = self.eval(object, frame)?;
                let index = self.eval(index, frame)?;
                self.get_item(&object, &index)
            }
            Expr::Slice(object, slice) => {
                let object = self.eval(object, frame)?;
                self.eval_slice(&object, slice, frame)
            }
            Expr::IfExp(ifexp) => {
                if self.eval_truthy(&ifexp.condition, frame)? {
                    self.eval(&ifexp.body, frame)
                } else {
                    self.eval(&ifexp.orelse, frame)
                }
            }
            Expr::Lambda(params, body) => {
                let body = FunctionBody::Expr((**body).clone());
                let function = self.make_function("<lambda>", params, body, BodyNames::default(), frame)?;
                Ok(Value::Function(function))
            }
            Expr::Tuple(items) => Ok(Value::tuple(self.eval_all(items, frame)?)),
            Expr::List(items) => Ok(Value::list(self.eval_all(items, frame)?)),
            Expr::Set(items) => {
                let mut set = PySet::new();
                for item in self.eval_all(items, frame)? {
                    set.insert(item)?;
                }
                Ok(Value::set(set))
            }
            Expr::Dict(pairs) => {
                let mut dict = PyDict::new();
                for (key, value) in pairs {
                    let key = self.eval(key, frame)?;
                    let value = self.eval(value, frame)?;
                    dict.insert(key, value)?;
                }
                Ok(Value::dict(dict))
            }
            Expr::ListComp(comp) => Ok(Value::list(self.eval_list_comp(comp, frame)?)),
            Expr::SetComp(comp) => {
                let mut set = PySet::new();
                for item in self.eval_list_comp(comp, frame)? {
                    set.insert(item)?;
                }
                Ok(Value::set(set))
            }
            Expr::DictComp(comp) => self.eval_dict_comp(comp, frame),
            Expr::FString(parts) => self.eval_fstring(parts, frame),
        }
    }

    pub(crate) fn eval_truthy(&mut self, expr: &Spanned<Expr>, frame: &Frame) -> ExecResult<bool> {
        let value = self.eval(expr, frame)?;
        self.is_truthy(&value)
    }

    fn eval_all(&mut self, items: &[Spanned<Expr>], frame: &Frame) -> ExecResult<Vec<Value>> {
        items.iter().map(|item| self.eval(item, frame)).collect()
    }

    /// Resolve a name: frame scopes, then builtins.
    pub(crate) fn lookup_name(&mut self, name: &str, frame: &Frame) -> ExecResult<Value> {
        let found = if frame.globals_declared.contains(name) {
            self.globals.get_local(name)
        } else if let Some(function) = frame.function.as_ref().filter(|f| f.locals.contains(name)) {
            let local = frame.scope.get_within(name, &function.closure);
            if local.is_none() {
                return Err(Exception::new(
                    ErrorKind::UnboundLocalError,
                    format!("cannot access local variable '{name}' where it is not associated with a value"),
                )
                .into());
            }
            local
        } else {
            frame.scope.get(name)
        };
        found
            .or_else(|| builtin_value(name))
            .ok_or_else(|| Exception::name_error(name).into())
    }

    fn eval_call(&mut self, callee: &Spanned<Expr>, args: &[CallArg], frame: &Frame) -> ExecResult<Value> {
        let callee = self.eval(callee, frame)?;
        let mut positional = Vec::with_capacity(args.len());
        let mut keywords = Vec::new();
        for arg in args {
            match arg {
                CallArg::Positional(expr) => positional.push(self.eval(expr, frame)?),
                CallArg::Named(name, expr) => {
                    let value = self.eval(expr, frame)?;
                    keywords.push((name.clone(), value));
                }
                CallArg::Unpack(expr) => {
                    let value = self.eval(expr, frame)?;
                    positional.extend(self.drain(&value)?);
                }
                CallArg::UnpackMapping(expr) => {
                    let value = self.eval(expr, frame)?;
                    let Value::Dict(dict) = &value else {
                        return Err(Exception::type_error(format!(
                            "argument after ** must be a mapping, not {}",
                            value.type_name()
                        ))
                        .into());
                    };
                    let entries: Vec<(Value, Value)> =
                        dict.borrow().iter().map(|(k, v)| (k.clone(), v.clone())).collect();
                    for (key, value) in entries {
                        let Value::Str(key) = key else {
                            return Err(Exception::type_error("keywords must be strings").into());
                        };
                        if keywords.iter().any(|(k, _)| k.as_str() == &*key) {
                            return Err(Exception::type_error(format!(
                                "got multiple values for keyword argument '{key}'"
                            ))
                            .into());
                        }
                        keywords.push((key.to_string(), value));
                    }
                }
            }
        }
        self.call(&callee, positional, keywords)
    }

    fn eval_slice(&mut self, object: &Value, slice: &SliceExpr, frame: &Frame) -> ExecResult<Value> {
        let mut bound = |part: &Option<Box<Spanned<Expr>>>| -> ExecResult<Option<i64>> {
            let Some(expr) = part else {
                return Ok(None);
            };
            match self.eval(expr, frame)? {
                Value::None => Ok(None),
                value => value.as_int().map(Some).ok_or_else(|| {
                    Exception::type_error("slice indices must be integers or None or have an __index__ method").into()
                }),
            }
        };
        let start = bound(&slice.start)?;
        let end = bound(&slice.end)?;
        let step = bound(&slice.step)?;
        Ok(ops::get_slice(object, start, end, step)?)
    }

    fn comprehension_frame(frame: &Frame) -> Frame {
        Frame {
            scope: Scope::child(&frame.scope),
            globals_declared: Rc::new(HashSet::new()),
            class_name: None,
            function: frame.function.clone(),
        }
    }

    /// Run comprehension clauses left to right, calling `emit` once per binding that passes every filter.
    fn run_clauses(
        &mut self,
        clauses: &[CompClause],
        frame: &Frame,
        emit: &mut dyn FnMut(&mut Self) -> ExecResult<()>,
    ) -> ExecResult<()> {
        let Some((clause, rest)) = clauses.split_first() else {
            return emit(self);
        };
        let iterable = self.eval(&clause.iter, frame)?;
        for item in self.iterate(&iterable)? {
            self.tick()?;
            self.assign(&clause.target, item, frame)?;
            if let Some(filter) = &clause.filter {
                if !self.eval_truthy(filter, frame)? {
                    continue;
                }
            }
            self.run_clauses(rest, frame, emit)?;
        }
        Ok(())
    }

    /// Items of a list or set comprehension, in production order.
    fn eval_list_comp(&mut self, comp: &ListComp, frame: &Frame) -> ExecResult<Vec<Value>> {
        let inner = Self::comprehension_frame(frame);
        let mut out = Vec::new();
        self.run_clauses(&comp.clauses, &inner, &mut |this: &mut Self| {
            out.push(this.eval(&comp.expr, &inner)?);
            Ok(())
        })?;
        Ok(out)
    }

    fn eval_dict_comp(&mut self, comp: &DictComp, frame: &Frame) -> ExecResult<Value> {
        let inner = Self::comprehension_frame(frame);
        let mut out = PyDict::new();
        self.run_clauses(&comp.clauses, &inner, &mut |this: &mut Self| {
            let key = this.eval(&comp.key, &inner)?;
            let value = this.eval(&comp.value, &inner)?;
            Ok(out.insert(key, value)?)
        })?;
        Ok(Value::dict(out))
    }

    fn eval_fstring(&mut self, parts: &[FStringPart], frame: &Frame) -> ExecResult<Value> {
        let mut out = String::new();
        for part in parts {
            match part {
                FStringPart::Literal(text) => out.push_str(text),
                FStringPart::Expr { expr, conversion, spec } => {
                    let value = self.eval(expr, frame)?;
                    out.push_str(&self.format_field(&value, *conversion, spec.as_deref().unwrap_or(""))?);
                }
            }
        }
        Ok(Value::string(out))
    }

    /// Render one replacement field (`{value!conversion:spec}`) of an f-string or `str.format`.
    pub(crate) fn format_field(&mut self, value: &Value, conversion: Option<char>, spec: &str) -> ExecResult<String> {
        let text = match conversion {
            Some('r' | 'a') => self.to_repr(value)?,
            _ => self.to_str(value)?,
        };
        if conversion.is_some() {
            return Ok(format_value(&Value::str(&text), spec, &text)?);
        }
        Ok(format_value(value, spec, &text)?)
    }

    // ========================================================================
    // Operators
    // ========================================================================

    /// Binary arithmetic with `__op__`/`__rop__` dispatch before the builtin semantics.
    pub(crate) fn binary(&mut self, op: BinaryOp, lhs: &Value, rhs: &Value) -> ExecResult<Value> {
        if let Some((method, reflected)) = arithmetic_dunders(op) {
            if let Some(result) = self.call_dunder(lhs, method, vec![rhs.clone()])? {
                return Ok(result);
            }
            if let Some(result) = self.call_dunder(rhs, reflected, vec![lhs.clone()])? {
                return Ok(result);
            }
        }
        Ok(ops::binary_op(op, lhs, rhs)?)
    }

    fn unary(&mut self, op: UnaryOp, value: &Value) -> ExecResult<Value> {
        match op {
            UnaryOp::Not => Ok(Value::Bool(!self.is_truthy(value)?)),
            UnaryOp::Neg | UnaryOp::Pos => {
                let method = if op == UnaryOp::Neg { "__neg__" } else { "__pos__" };
                if let Some(result) = self.call_dunder(value, method, Vec::new())? {
                    return Ok(result);
                }
                Ok(ops::unary_op(op, value)?)
            }
        }
    }

    pub(crate) fn compare(&mut self, op: CompareOp, lhs: &Value, rhs: &Value) -> ExecResult<bool> {
        match op {
            CompareOp::Is => Ok(lhs.is_same(rhs)),
            CompareOp::IsNot => Ok(!lhs.is_same(rhs)),
            CompareOp::In => self.contains(rhs, lhs),
            CompareOp::NotIn => Ok(!self.contains(rhs, lhs)?),
            CompareOp::Eq => self.equals(lhs, rhs),
            CompareOp::NotEq => {
                if let Some(result) = self.call_dunder(lhs, "__ne__", vec![rhs.clone()])? {
                    return self.is_truthy(&result);
                }
                Ok(!self.equals(lhs, rhs)?)
            }
            CompareOp::Lt | CompareOp::LtEq | CompareOp::Gt | CompareOp::GtEq => {
                let (method, reflected) = ordering_dunders(op);
                if let Some(result) = self.call_dunder(lhs, method, vec![rhs.clone()])? {
                    return self.is_truthy(&result);
                }
                if let Some(result) = self.call_dunder(rhs, reflected, vec![lhs.clone()])? {
                    return self.is_truthy(&result);
                }
                Ok(ops::compare_op(op, lhs, rhs)?)
            }
        }
    }

    /// `lhs == rhs`, honouring `__eq__` on either side.
    pub(crate) fn equals(&mut self, lhs: &Value, rhs: &Value) -> ExecResult<bool> {
        if let Some(result) = self.call_dunder(lhs, "__eq__", vec![rhs.clone()])? {
            return self.is_truthy(&result);
        }
        if let Some(result) = self.call_dunder(rhs, "__eq__", vec![lhs.clone()])? {
            return self.is_truthy(&result);
        }
        Ok(ops::values_equal(lhs, rhs))
    }

    /// `item in container`, honouring `__contains__` and `__eq__`.
    pub(crate) fn contains(&mut self, container: &Value, item: &Value) -> ExecResult<bool> {
        if let Some(result) = self.call_dunder(container, "__contains__", vec![item.clone()])? {
            return self.is_truthy(&result);
        }
        let scan = match container {
            Value::List(_) | Value::Tuple(_) => matches!(item, Value::Instance(_)),
            Value::Instance(instance) => instance.class.lookup("__iter__").is_some(),
            _ => false,
        };
        if !scan {
            return Ok(ops::contains(container, item)?);
        }
        for candidate in self.drain(container)? {
            if self.equals(&candidate, item)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

fn is_super_call(expr: &Spanned<Expr>) -> bool {
    matches!(&expr.node, Expr::Call(callee, args)
        if args.is_empty() && matches!(&callee.node, Expr::Name(name) if name == "super"))
}

pub(crate) fn literal_value(literal: &Literal) -> Result<Value, Exception> {
    Ok(match literal {
        Literal::Int(n) => Value::Int(*n),
        Literal::BigInt { digits, radix } => bigint::literal(digits, *radix)?,
        Literal::Float(f) => Value::Float(*f),
        Literal::Str(s) => Value::str(s),
        Literal::Bool(b) => Value::Bool(*b),
        Literal::None => Value::None,
    })
}

fn arithmetic_dunders(op: BinaryOp) -> Option<(&'static str, &'static str)> {
    Some(match op {
        BinaryOp::Add => ("__add__", "__radd__"),
        BinaryOp::Sub => ("__sub__", "__rsub__"),
        BinaryOp::Mul => ("__mul__", "__rmul__"),
        BinaryOp::Div => ("__truediv__", "__rtruediv__"),
        BinaryOp::FloorDiv => ("__floordiv__", "__rfloordiv__"),
        BinaryOp::Mod => ("__mod__", "__rmod__"),
        BinaryOp::Pow => ("__pow__", "__rpow__"),
        BinaryOp::And | BinaryOp::Or => return None,
    })
}

fn ordering_dunders(op: CompareOp) -> (&'static str, &'static str) {
    match op {
        CompareOp::Lt => ("__lt__", "__gt__"),
        CompareOp::LtEq => ("__le__", "__ge__"),
        CompareOp::Gt => ("__gt__", "__lt__"),
        _ => ("__ge__", "__le__"),
    }
}
