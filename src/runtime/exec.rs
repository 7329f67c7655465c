//! Statement execution.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::{Rc, Weak};

use unitgen_core::errors::ErrorKind;
use unitgen_core::lang::math::MATH_MODULE_NAME;
use unitgen_syntax::ast::{
    AssertStmt, AugAssignStmt, BinaryOp, ClassDef, ExceptHandler, Expr, FromImportStmt, ImportStmt, Param, ParamKind,
    Spanned, Statement, Target, TryStmt, WithItem,
};

use super::error::{Exception, ExecResult, RuntimeError};
use super::math::math_module;
use super::value::{Builtin, Class, Function, FunctionBody, ModuleObject, Scope, Value};
use super::{Flow, Frame, Interpreter, grow_stack};

/// Modules whose imports are accepted and bind nothing useful (annotations only).
const ANNOTATION_MODULES: &[&str] = &["typing", "__future__"];

impl Interpreter {
    pub(crate) fn exec_block(&mut self, body: &[Spanned<Statement>], frame: &Frame) -> ExecResult<Flow> {
        for stmt in body {
            match self.exec_stmt(stmt, frame)? {
                Flow::Normal => {}
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, stmt: &Spanned<Statement>, frame: &Frame) -> ExecResult<Flow> {
        grow_stack(|| self.exec_node(stmt, frame))
    }

    fn exec_node(&mut self, stmt: &Spanned<Statement>, frame: &Frame) -> ExecResult<Flow> {
        self.tick()?;
        match &stmt.node {
            Statement::Expr(expr) => {
                self.eval(expr, frame)?;
            }
            Statement::Assign(assign) => {
                let value = self.eval(&assign.value, frame)?;
                for target in &assign.targets {
                    self.assign(target, value.clone(), frame)?;
                }
            }
            Statement::AugAssign(aug) => self.exec_aug_assign(aug, frame)?,
            Statement::FunctionDef(def) => {
                let decorators = self.eval_decorators(&def.decorators, frame)?;
                let names = BodyNames::scan(&def.body);
                let body = FunctionBody::Block(def.body.clone());
                let function = self.make_function(&def.name, &def.params, body, names, frame)?;
                let value = self.decorate(decorators, Value::Function(function))?;
                self.bind(&def.name, value, frame);
            }
            Statement::ClassDef(def) => self.exec_class_def(def, frame)?,
            Statement::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval(expr, frame)?,
                    None => Value::None,
                };
                return Ok(Flow::Return(value));
            }
            Statement::If(stmt) => {
                if self.eval_truthy(&stmt.condition, frame)? {
                    return self.exec_block(&stmt.then_body, frame);
                }
                for (condition, body) in &stmt.elif_branches {
                    if self.eval_truthy(condition, frame)? {
                        return self.exec_block(body, frame);
                    }
                }
                if let Some(body) = &stmt.else_body {
                    return self.exec_block(body, frame);
                }
            }
            Statement::While(stmt) => {
                loop {
                    self.tick()?;
                    if !self.eval_truthy(&stmt.condition, frame)? {
                        break;
                    }
                    match self.exec_block(&stmt.body, frame)? {
                        Flow::Break => return Ok(Flow::Normal),
                        Flow::Normal | Flow::Continue => {}
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                }
                if let Some(body) = &stmt.else_body {
                    return self.exec_block(body, frame);
                }
            }
            Statement::For(stmt) => {
                let iterable = self.eval(&stmt.iter, frame)?;
                for item in self.iterate(&iterable)? {
                    self.tick()?;
                    self.assign(&stmt.target, item, frame)?;
                    match self.exec_block(&stmt.body, frame)? {
                        Flow::Break => return Ok(Flow::Normal),
                        Flow::Normal | Flow::Continue => {}
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                }
                if let Some(body) = &stmt.else_body {
                    return self.exec_block(body, frame);
                }
            }
            Statement::Break => return Ok(Flow::Break),
            Statement::Continue => return Ok(Flow::Continue),
            Statement::Pass | Statement::Global(_) => {}
            Statement::Raise(None) => {
                let active = self.handling.last().cloned().ok_or_else(|| {
                    Exception::new(ErrorKind::RuntimeError, "No active exception to reraise")
                })?;
                return Err(active.into());
            }
            Statement::Raise(Some(expr)) => {
                let value = self.eval(expr, frame)?;
                return Err(self.make_exception(&value)?.into());
            }
            Statement::Try(stmt) => return self.exec_try(stmt, frame),
            Statement::With(stmt) => return self.exec_with(&stmt.items, &stmt.body, frame),
            Statement::Assert(stmt) => self.exec_assert(stmt, frame)?,
            Statement::Import(stmt) => self.exec_import(stmt, frame)?,
            Statement::FromImport(stmt) => self.exec_from_import(stmt, frame)?,
        }
        Ok(Flow::Normal)
    }

    // ========================================================================
    // Bindings
    // ========================================================================

    /// Bind `name` in the frame's scope, or in globals when declared `global`.
    pub(crate) fn bind(&mut self, name: &str, value: Value, frame: &Frame) {
        if frame.globals_declared.contains(name) {
            self.globals.set(name, value);
        } else {
            frame.scope.set(name, value);
        }
    }

    pub(crate) fn assign(&mut self, target: &Spanned<Target>, value: Value, frame: &Frame) -> ExecResult<()> {
        match &target.node {
            Target::Name(name) => self.bind(name, value, frame),
            Target::Attribute(object, name) => {
                let object = self.eval(object, frame)?;
                self.set_attr(&object, name, value)?;
            }
            Target::Index(object, index) => {
                let object = self.eval(object, frame)?;
                let index = self.eval(index, frame)?;
                self.set_item(&object, index, value)?;
            }
            Target::Tuple(targets) => {
                let items = self.drain(&value)?;
                if items.len() < targets.len() {
                    return Err(Exception::value_error(format!(
                        "not enough values to unpack (expected {}, got {})",
                        targets.len(),
                        items.len()
                    ))
                    .into());
                }
                if items.len() > targets.len() {
                    return Err(Exception::value_error(format!(
                        "too many values to unpack (expected {})",
                        targets.len()
                    ))
                    .into());
                }
                for (target, item) in targets.iter().zip(items) {
                    self.assign(target, item, frame)?;
                }
            }
        }
        Ok(())
    }

    fn exec_aug_assign(&mut self, aug: &AugAssignStmt, frame: &Frame) -> ExecResult<()> {
        match &aug.target.node {
            Target::Name(name) => {
                let current = self.lookup_name(name, frame)?;
                let rhs = self.eval(&aug.value, frame)?;
                let result = self.in_place(aug.op, &current, &rhs)?;
                self.bind(name, result, frame);
            }
            Target::Attribute(object, name) => {
                let object = self.eval(object, frame)?;
                let current = self.get_attr(&object, name)?;
                let rhs = self.eval(&aug.value, frame)?;
                let result = self.in_place(aug.op, &current, &rhs)?;
                self.set_attr(&object, name, result)?;
            }
            Target::Index(object, index) => {
                let object = self.eval(object, frame)?;
                let index = self.eval(index, frame)?;
                let current = self.get_item(&object, &index)?;
                let rhs = self.eval(&aug.value, frame)?;
                let result = self.in_place(aug.op, &current, &rhs)?;
                self.set_item(&object, index, result)?;
            }
            Target::Tuple(_) => {
                return Err(Exception::type_error("illegal expression for augmented assignment").into());
            }
        }
        Ok(())
    }

    /// `lhs op= rhs`; `list += iterable` extends in place so aliases observe the change.
    fn in_place(&mut self, op: BinaryOp, lhs: &Value, rhs: &Value) -> ExecResult<Value> {
        if let (BinaryOp::Add, Value::List(items)) = (op, lhs) {
            let extra = self.drain(rhs)?;
            items.borrow_mut().extend(extra);
            return Ok(lhs.clone());
        }
        self.binary(op, lhs, rhs)
    }

    // ========================================================================
    // Definitions
    // ========================================================================

    pub(crate) fn make_function(
        &mut self,
        name: &str,
        params: &[Spanned<Param>],
        body: FunctionBody,
        names: BodyNames,
        frame: &Frame,
    ) -> ExecResult<Rc<Function>> {
        let mut positional = Vec::new();
        let mut defaults = Vec::new();
        let mut var_positional = None;
        let mut keyword_only = Vec::new();
        let mut var_keyword = None;
        for param in params {
            let default = match &param.node.default {
                Some(expr) => Some(self.eval(expr, frame)?),
                None => None,
            };
            let name = param.node.name.clone();
            match param.node.kind {
                ParamKind::Positional => {
                    positional.push(name);
                    defaults.push(default);
                }
                ParamKind::VarPositional => var_positional = Some(name),
                ParamKind::KeywordOnly => keyword_only.push((name, default)),
                ParamKind::VarKeyword => var_keyword = Some(name),
            }
        }
        let qualname = match &frame.class_name {
            Some(class) => format!("{class}.{name}"),
            None => name.to_string(),
        };
        // Methods see the scope around the class, not the class body.
        let closure = match (&frame.class_name, frame.scope.parent()) {
            (Some(_), Some(parent)) => Rc::clone(parent),
            _ => Rc::clone(&frame.scope),
        };
        let BodyNames { globals, mut locals } = names;
        locals.extend(params.iter().map(|p| &p.node.name).filter(|p| !globals.contains(*p)).cloned());
        Ok(Rc::new(Function {
            name: name.to_string(),
            qualname,
            params: positional,
            defaults,
            var_positional,
            keyword_only,
            var_keyword,
            body,
            closure,
            globals: Rc::new(globals),
            locals,
            owner: RefCell::new(Weak::new()),
        }))
    }

    /// Evaluate `@` expressions top to bottom, before the definition they wrap.
    fn eval_decorators(&mut self, decorators: &[Spanned<Expr>], frame: &Frame) -> ExecResult<Vec<Value>> {
        decorators.iter().map(|expr| self.eval(expr, frame)).collect()
    }

    /// Apply decorators innermost (last listed) first.
    fn decorate(&mut self, decorators: Vec<Value>, mut value: Value) -> ExecResult<Value> {
        for decorator in decorators.iter().rev() {
            value = self.call(decorator, vec![value], Vec::new())?;
        }
        Ok(value)
    }

    fn exec_class_def(&mut self, def: &ClassDef, frame: &Frame) -> ExecResult<()> {
        let decorators = self.eval_decorators(&def.decorators, frame)?;
        let mut bases = Vec::new();
        let mut exception_base = None;
        for base in &def.bases {
            match self.eval(base, frame)? {
                Value::Class(class) => {
                    exception_base = exception_base.or(class.exception_base);
                    bases.push(class);
                }
                Value::ExceptionClass(kind) => exception_base = exception_base.or(Some(kind)),
                Value::Builtin(Builtin::Type("object")) => {}
                other => {
                    return Err(Exception::type_error(format!(
                        "bases must be classes, not '{}'",
                        other.type_name()
                    ))
                    .into());
                }
            }
        }

        let qualname: Rc<str> = match &frame.class_name {
            Some(outer) => Rc::from(format!("{outer}.{}", def.name)),
            None => Rc::from(def.name.as_str()),
        };
        let body_frame = Frame {
            scope: Scope::child(&frame.scope),
            globals_declared: Rc::clone(&frame.globals_declared),
            class_name: Some(qualname),
            function: None,
        };
        match self.exec_block(&def.body, &body_frame)? {
            Flow::Normal => {}
            _ => return Err(Exception::new(ErrorKind::RuntimeError, "'return' outside function").into()),
        }

        let attrs: HashMap<String, Value> = body_frame.scope.locals().into_iter().collect();
        let class = Rc::new(Class {
            name: def.name.clone(),
            module: Rc::clone(&self.module_name),
            bases,
            exception_base,
            attrs: RefCell::new(attrs),
        });
        for value in class.attrs.borrow().values() {
            let function = match value {
                Value::Function(function) => function,
                Value::Wrapper(wrapper) => match &wrapper.function {
                    Value::Function(function) => function,
                    _ => continue,
                },
                _ => continue,
            };
            *function.owner.borrow_mut() = Rc::downgrade(&class);
        }
        let value = self.decorate(decorators, Value::Class(class))?;
        self.bind(&def.name, value, frame);
        Ok(())
    }

    // ========================================================================
    // Exceptions
    // ========================================================================

    /// Turn the operand of `raise` into an exception.
    pub(crate) fn make_exception(&mut self, value: &Value) -> ExecResult<Exception> {
        match value {
            Value::ExceptionClass(kind) => Ok(Exception::new(*kind, "")),
            Value::Exception(object) => {
                let message = self.to_str(value)?;
                Ok(Exception::with_value(object.kind, message, value.clone()))
            }
            Value::Class(class) if class.exception_base.is_some() => {
                let instance = self.instantiate(class, Vec::new(), Vec::new())?;
                self.make_exception(&instance)
            }
            Value::Instance(instance) => match instance.class.exception_base {
                Some(kind) => {
                    let message = self.to_str(value)?;
                    Ok(Exception::with_value(kind, message, value.clone()))
                }
                None => Err(Exception::type_error("exceptions must derive from BaseException").into()),
            },
            _ => Err(Exception::type_error("exceptions must derive from BaseException").into()),
        }
    }

    fn exec_try(&mut self, stmt: &TryStmt, frame: &Frame) -> ExecResult<Flow> {
        let outcome = match self.exec_block(&stmt.body, frame) {
            Ok(Flow::Normal) => match &stmt.else_body {
                Some(body) => self.exec_block(body, frame),
                None => Ok(Flow::Normal),
            },
            Ok(flow) => Ok(flow),
            Err(RuntimeError::Raise(exc)) => self.handle_exception(exc, &stmt.handlers, frame),
            Err(limit @ RuntimeError::Limit(_)) => return Err(limit),
        };

        let Some(finally) = &stmt.finally_body else {
            return outcome;
        };
        if let Err(RuntimeError::Limit(_)) = outcome {
            return outcome;
        }
        match self.exec_block(finally, frame)? {
            Flow::Normal => outcome,
            overriding => Ok(overriding),
        }
    }

    /// `with a as x, b:` runs as nested single-item blocks.
    ///
    /// `__exit__` gets `(None, None, None)` on normal exit and `(type, value, None)` when the body raised; a
    /// truthy result swallows the exception. Limit errors bypass `__exit__`.
    fn exec_with(&mut self, items: &[WithItem], body: &[Spanned<Statement>], frame: &Frame) -> ExecResult<Flow> {
        let Some((item, rest)) = items.split_first() else {
            return self.exec_block(body, frame);
        };
        let manager = self.eval(&item.context, frame)?;
        let supported = match &manager {
            Value::Instance(instance) => {
                instance.class.lookup("__enter__").is_some() && instance.class.lookup("__exit__").is_some()
            }
            _ => false,
        };
        if !supported {
            return Err(Exception::type_error(format!(
                "'{}' object does not support the context manager protocol",
                manager.type_name()
            ))
            .into());
        }

        let entered = self.call_dunder(&manager, "__enter__", Vec::new())?.unwrap_or(Value::None);
        let outcome = match &item.target {
            Some(target) => self
                .assign(target, entered, frame)
                .and_then(|()| self.exec_with(rest, body, frame)),
            None => self.exec_with(rest, body, frame),
        };
        match outcome {
            Ok(flow) => {
                self.call_dunder(&manager, "__exit__", vec![Value::None, Value::None, Value::None])?;
                Ok(flow)
            }
            Err(RuntimeError::Raise(exc)) => {
                let class = match exc.value() {
                    Some(Value::Instance(instance)) => Value::Class(Rc::clone(&instance.class)),
                    _ => Value::ExceptionClass(exc.kind()),
                };
                let details = vec![class, exc.to_value(), Value::None];
                let suppress = self.call_dunder(&manager, "__exit__", details)?.unwrap_or(Value::None);
                if self.is_truthy(&suppress)? {
                    Ok(Flow::Normal)
                } else {
                    Err(exc.into())
                }
            }
            Err(limit) => Err(limit),
        }
    }

    fn handle_exception(
        &mut self,
        exc: Exception,
        handlers: &[Spanned<ExceptHandler>],
        frame: &Frame,
    ) -> ExecResult<Flow> {
        for handler in handlers {
            let handler = &handler.node;
            let matches = match &handler.class {
                None => true,
                Some(class) => {
                    let class = self.eval(class, frame)?;
                    exception_matches(&class, &exc)?
                }
            };
            if !matches {
                continue;
            }
            if let Some(name) = &handler.name {
                self.bind(name, exc.to_value(), frame);
            }
            self.handling.push(exc);
            let result = self.exec_block(&handler.body, frame);
            self.handling.pop();
            return result;
        }
        Err(exc.into())
    }

    fn exec_assert(&mut self, stmt: &AssertStmt, frame: &Frame) -> ExecResult<()> {
        if self.eval_truthy(&stmt.test, frame)? {
            return Ok(());
        }
        let message = match &stmt.message {
            Some(expr) => {
                let value = self.eval(expr, frame)?;
                self.to_str(&value)?
            }
            None => String::new(),
        };
        Err(Exception::new(ErrorKind::AssertionError, message).into())
    }

    // ========================================================================
    // Imports
    // ========================================================================

    fn import_module(&mut self, name: &str) -> Result<Value, Exception> {
        if name == MATH_MODULE_NAME {
            return Ok(math_module());
        }
        if ANNOTATION_MODULES.contains(&name) {
            return Ok(Value::Module(Rc::new(ModuleObject {
                name: name.to_string(),
                attrs: HashMap::new(),
            })));
        }
        Err(Exception::new(
            ErrorKind::ModuleNotFoundError,
            format!("No module named '{name}'"),
        ))
    }

    fn exec_import(&mut self, stmt: &ImportStmt, frame: &Frame) -> ExecResult<()> {
        let module = self.import_module(&stmt.module)?;
        let name = stmt.alias.as_deref().unwrap_or(&stmt.module);
        self.bind(name, module, frame);
        Ok(())
    }

    fn exec_from_import(&mut self, stmt: &FromImportStmt, frame: &Frame) -> ExecResult<()> {
        let module = self.import_module(&stmt.module)?;
        let annotations_only = ANNOTATION_MODULES.contains(&stmt.module.as_str());
        for (name, alias) in &stmt.names {
            let value = match &module {
                _ if annotations_only => Value::None,
                Value::Module(m) => m.attrs.get(name).cloned().ok_or_else(|| {
                    Exception::new(
                        ErrorKind::ImportError,
                        format!("cannot import name '{name}' from '{}' (unknown location)", stmt.module),
                    )
                })?,
                _ => Value::None,
            };
            self.bind(alias.as_deref().unwrap_or(name), value, frame);
        }
        Ok(())
    }
}

/// Does `except <class>` catch `exc`? `class` may be a tuple of classes.
fn exception_matches(class: &Value, exc: &Exception) -> Result<bool, Exception> {
    match class {
        Value::ExceptionClass(kind) => Ok(exc.kind().is_subclass_of(*kind)),
        Value::Class(class) => Ok(match exc.value() {
            Some(Value::Instance(instance)) => Class::is_subclass(&instance.class, class),
            _ => false,
        }),
        Value::Tuple(classes) => {
            for class in classes.iter() {
                if exception_matches(class, exc)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        _ => Err(Exception::type_error(
            "catching classes that do not inherit from BaseException is not allowed",
        )),
    }
}

/// Names a function body declares `global` and names it binds locally, not looking into nested definitions.
#[derive(Debug, Default)]
pub(crate) struct BodyNames {
    pub globals: HashSet<String>,
    pub locals: HashSet<String>,
}

impl BodyNames {
    pub(crate) fn scan(body: &[Spanned<Statement>]) -> Self {
        let mut names = BodyNames::default();
        names.visit(body);
        let BodyNames { globals, locals } = &mut names;
        locals.retain(|name| !globals.contains(name));
        names
    }

    fn visit(&mut self, body: &[Spanned<Statement>]) {
        for stmt in body {
            match &stmt.node {
                Statement::Global(declared) => self.globals.extend(declared.iter().cloned()),
                Statement::Assign(s) => s.targets.iter().for_each(|t| self.bind_target(&t.node)),
                Statement::AugAssign(s) => self.bind_target(&s.target.node),
                Statement::FunctionDef(def) => {
                    self.locals.insert(def.name.clone());
                }
                Statement::ClassDef(def) => {
                    self.locals.insert(def.name.clone());
                }
                Statement::Import(import) => {
                    let bound = import.alias.as_ref().unwrap_or(&import.module);
                    self.locals.insert(bound.clone());
                }
                Statement::FromImport(import) => {
                    for (name, alias) in &import.names {
                        self.locals.insert(alias.as_ref().unwrap_or(name).clone());
                    }
                }
                Statement::If(s) => {
                    self.visit(&s.then_body);
                    for (_, branch) in &s.elif_branches {
                        self.visit(branch);
                    }
                    if let Some(body) = &s.else_body {
                        self.visit(body);
                    }
                }
                Statement::While(s) => {
                    self.visit(&s.body);
                    if let Some(body) = &s.else_body {
                        self.visit(body);
                    }
                }
                Statement::For(s) => {
                    self.bind_target(&s.target.node);
                    self.visit(&s.body);
                    if let Some(body) = &s.else_body {
                        self.visit(body);
                    }
                }
                Statement::With(s) => {
                    for item in &s.items {
                        if let Some(target) = &item.target {
                            self.bind_target(&target.node);
                        }
                    }
                    self.visit(&s.body);
                }
                Statement::Try(s) => {
                    self.visit(&s.body);
                    for handler in &s.handlers {
                        if let Some(name) = &handler.node.name {
                            self.locals.insert(name.clone());
                        }
                        self.visit(&handler.node.body);
                    }
                    for body in [&s.else_body, &s.finally_body].into_iter().flatten() {
                        self.visit(body);
                    }
                }
                _ => {}
            }
        }
    }

    fn bind_target(&mut self, target: &Target) {
        match target {
            Target::Name(name) => {
                self.locals.insert(name.clone());
            }
            Target::Tuple(items) => items.iter().for_each(|item| self.bind_target(&item.node)),
            Target::Attribute(..) | Target::Index(..) => {}
        }
    }
}
