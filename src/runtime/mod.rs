//! Tree-walking interpreter for target modules.
//!
//! A target module is executed once (its top-level statements bind functions, classes and constants into a
//! globals scope); afterwards the harness calls individual symbols through [`Interpreter::call`]. Each call runs
//! in a fresh frame over those globals.
//!
//! ## Notes
//!
//! - **Value model**: [`Value`] is an `Rc` handle; mutable containers sit behind `RefCell`. The interpreter is
//!   therefore single-threaded (`!Send`).
//! - **Budgets**: every statement, loop iteration, call and consumed iterator item costs one step. Exceeding
//!   [`ExecutionLimits::max_steps`] or [`ExecutionLimits::max_call_depth`] raises a [`LimitError`], which target
//!   code cannot catch and which skips `finally` blocks.
//! - **Native stack**: evaluation grows the stack on demand (`stacker`), so any depth up to the call limit runs
//!   on whatever thread hosts the interpreter.
//! - **Dunders**: user classes may define `__init__`, `__str__`, `__repr__`, `__eq__`, the ordering and
//!   arithmetic operators, `__len__`, `__bool__`, `__iter__`, `__getitem__`, `__setitem__`, `__contains__`
//!   and `__call__`. Everything else falls back to the pure semantics in [`ops`].
//!
//! ## Examples
//!
//! ```rust
//! use unitgen::runtime::{ExecutionLimits, Interpreter, Value};
//! use unitgen_syntax::{lexer, parser};
//!
//! let tokens = lexer::lex("def add(a, b):\n    return a + b\n").unwrap();
//! let module = parser::parse(&tokens).unwrap();
//! let mut interp = Interpreter::new("calc", ExecutionLimits::default());
//! interp.run_module(&module).unwrap();
//! let add = interp.lookup_global("add").unwrap();
//! let sum = interp.call(&add, vec![Value::Int(1), Value::Int(2)], Vec::new()).unwrap();
//! assert_eq!(sum, Value::Int(3));
//! ```
//!
//! ## See also
//!
//! - [`crate::harness`] – loads modules and records outcomes
//! - [`crate::cases::eval`] – literal argument evaluation over the same [`ops`]

pub mod bigint;
mod builtins;
mod call;
pub mod dict;
pub mod error;
mod eval;
mod exec;
pub mod format;
pub mod math;
mod methods;
pub mod ops;
pub mod value;

#[cfg(test)]
mod tests;

use std::collections::HashSet;
use std::rc::Rc;

use unitgen_core::errors::ErrorKind;
use unitgen_syntax::ast::Module;

pub use dict::{PyDict, PySet};
pub use error::{Exception, ExecResult, LimitError, RuntimeError};
pub use value::{Scope, Value};

use value::render_container;

/// Native stack that must remain before another nested evaluation starts.
const STACK_RED_ZONE: usize = 256 * 1024;
/// Size of each extra stack segment.
const STACK_SEGMENT: usize = 4 * 1024 * 1024;

/// Run `f`, switching to a fresh heap-allocated stack segment when the current one is nearly exhausted.
///
/// Target recursion is bounded by [`ExecutionLimits::max_call_depth`] rather than by the native stack of the
/// calling thread.
pub(crate) fn grow_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, f)
}

/// Per-invocation resource budget.
///
/// ## Examples
/// ```rust
/// use unitgen::runtime::ExecutionLimits;
///
/// let limits = ExecutionLimits::default().with_max_steps(1_000).with_max_call_depth(50);
/// assert_eq!(limits.max_steps, 1_000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionLimits {
    /// Interpreter steps allowed per invocation (and for loading the module).
    pub max_steps: u64,
    /// Nested user-function calls allowed.
    pub max_call_depth: usize,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            max_steps: 10_000_000,
            max_call_depth: 200,
        }
    }
}

impl ExecutionLimits {
    pub fn with_max_steps(mut self, max_steps: u64) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_max_call_depth(mut self, max_call_depth: usize) -> Self {
        self.max_call_depth = max_call_depth;
        self
    }
}

/// Where the statements currently executing bind their names.
#[derive(Clone)]
pub(crate) struct Frame {
    pub(crate) scope: Rc<Scope>,
    /// Names declared `global` by the enclosing function.
    pub(crate) globals_declared: Rc<HashSet<String>>,
    /// Set while executing a class body; used for method qualnames and closures.
    pub(crate) class_name: Option<Rc<str>>,
    /// The user function whose body is executing; `super()` resolves through its owner class.
    pub(crate) function: Option<Rc<value::Function>>,
}

/// Control-flow signal produced by statement execution.
#[derive(Debug)]
pub(crate) enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

/// Interpreter state for one loaded module.
pub struct Interpreter {
    globals: Rc<Scope>,
    module_name: Rc<str>,
    limits: ExecutionLimits,
    steps: u64,
    depth: usize,
    /// Text written by `print` since the last [`Interpreter::take_output`].
    output: String,
    /// Exceptions being handled by enclosing `except` blocks (innermost last), for bare `raise`.
    handling: Vec<Exception>,
    /// Identities of containers currently being rendered, to print cycles as `[...]`.
    rendering: Vec<usize>,
}

impl Interpreter {
    pub fn new(module_name: &str, limits: ExecutionLimits) -> Self {
        Self {
            globals: Scope::new_root(),
            module_name: Rc::from(module_name),
            limits,
            steps: 0,
            depth: 0,
            output: String::new(),
            handling: Vec::new(),
            rendering: Vec::new(),
        }
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn limits(&self) -> ExecutionLimits {
        self.limits
    }

    pub fn set_limits(&mut self, limits: ExecutionLimits) {
        self.limits = limits;
    }

    /// Steps consumed since the last [`reset_budget`](Self::reset_budget).
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Start a fresh budget for the next invocation.
    pub fn reset_budget(&mut self) {
        self.steps = 0;
        self.depth = 0;
        self.handling.clear();
        self.rendering.clear();
    }

    /// Drain captured `print` output.
    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    /// Execute a module's top-level statements into the globals scope.
    pub fn run_module(&mut self, module: &Module) -> ExecResult<()> {
        let frame = self.module_frame();
        match self.exec_block(&module.body, &frame)? {
            Flow::Normal => Ok(()),
            Flow::Return(_) => Err(syntax_error("'return' outside function")),
            Flow::Break | Flow::Continue => Err(syntax_error("'break' or 'continue' outside loop")),
        }
    }

    /// A top-level binding of the module, if any.
    pub fn lookup_global(&self, name: &str) -> Option<Value> {
        self.globals.get_local(name)
    }

    /// Names bound at module top level, sorted.
    pub fn global_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.globals.locals().into_iter().map(|(k, _)| k).collect();
        names.sort();
        names
    }

    fn module_frame(&self) -> Frame {
        Frame {
            scope: Rc::clone(&self.globals),
            globals_declared: Rc::new(HashSet::new()),
            class_name: None,
            function: None,
        }
    }

    /// Consume one step of the budget.
    pub(crate) fn tick(&mut self) -> Result<(), LimitError> {
        self.steps += 1;
        if self.steps > self.limits.max_steps {
            return Err(LimitError::Steps(self.limits.max_steps));
        }
        Ok(())
    }

    /// Iterate `value`, charging one step per item.
    pub(crate) fn drain(&mut self, value: &Value) -> ExecResult<Vec<Value>> {
        let iter = self.iterate(value)?;
        let mut items = Vec::new();
        for item in iter {
            self.tick()?;
            items.push(item);
        }
        Ok(items)
    }

    /// `iter(value)`; an instance iterates over whatever its `__iter__` returns.
    pub(crate) fn iterate(&mut self, value: &Value) -> ExecResult<value::ValueIter> {
        if let Value::Instance(_) = value {
            if let Some(items) = self.call_dunder(value, "__iter__", Vec::new())? {
                return Ok(value::ValueIter::Items(items.to_vec()?.into_iter()));
            }
        }
        Ok(value.iter()?)
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// `str(value)`, dispatching to `__str__` on instances.
    pub fn to_str(&mut self, value: &Value) -> ExecResult<String> {
        match value {
            Value::Str(s) => Ok(s.to_string()),
            Value::Instance(instance) => {
                if let Some(text) = self.call_dunder(value, "__str__", Vec::new())? {
                    return expect_str(text, "__str__");
                }
                if let Some(kind) = instance.class.exception_base {
                    let args = self.exception_args(value);
                    return self.exception_message(kind, &args);
                }
                self.to_repr(value)
            }
            Value::Exception(e) => self.exception_message(e.kind, &e.args),
            Value::List(_) | Value::Tuple(_) | Value::Dict(_) | Value::Set(_) => self.to_repr(value),
            other => Ok(other.to_str()),
        }
    }

    /// `repr(value)`, dispatching to `__repr__` on instances and rendering cycles as `[...]`.
    pub fn to_repr(&mut self, value: &Value) -> ExecResult<String> {
        match value {
            Value::Instance(instance) => {
                if let Some(text) = self.call_dunder(value, "__repr__", Vec::new())? {
                    return expect_str(text, "__repr__");
                }
                if instance.class.exception_base.is_some() {
                    let args = self.exception_args(value);
                    let parts = args.iter().map(|a| self.to_repr(a)).collect::<ExecResult<Vec<_>>>()?;
                    return Ok(format!("{}({})", instance.class.name, parts.join(", ")));
                }
                Ok(value.repr())
            }
            Value::Exception(e) => {
                let parts = e.args.iter().map(|a| self.to_repr(a)).collect::<ExecResult<Vec<_>>>()?;
                Ok(format!("{}({})", e.kind, parts.join(", ")))
            }
            Value::List(items) => self.render_guarded(value, items.as_ptr() as usize, "[...]"),
            Value::Dict(d) => self.render_guarded(value, d.as_ptr() as usize, "{...}"),
            Value::Set(s) => self.render_guarded(value, s.as_ptr() as usize, "{...}"),
            Value::Tuple(_) => {
                let rendered = render_container(value, &mut |item| grow_stack(|| self.to_repr(item)))?;
                Ok(rendered.unwrap_or_default())
            }
            other => Ok(other.repr()),
        }
    }

    fn render_guarded(&mut self, value: &Value, identity: usize, placeholder: &str) -> ExecResult<String> {
        if self.rendering.contains(&identity) {
            return Ok(placeholder.to_string());
        }
        self.rendering.push(identity);
        let rendered = render_container(value, &mut |item| grow_stack(|| self.to_repr(item)));
        self.rendering.pop();
        Ok(rendered?.unwrap_or_default())
    }

    fn exception_message(&mut self, kind: ErrorKind, args: &[Value]) -> ExecResult<String> {
        match args {
            [] => Ok(String::new()),
            [single] if kind == ErrorKind::KeyError => self.to_repr(single),
            [single] => self.to_str(single),
            many => {
                let parts = many.iter().map(|a| self.to_repr(a)).collect::<ExecResult<Vec<_>>>()?;
                Ok(format!("({})", parts.join(", ")))
            }
        }
    }

    /// The `args` tuple stored on an exception instance.
    pub(crate) fn exception_args(&self, value: &Value) -> Vec<Value> {
        match value {
            Value::Exception(e) => e.args.clone(),
            Value::Instance(instance) => match instance.attrs.borrow().get("args") {
                Some(Value::Tuple(items)) => items.to_vec(),
                Some(other) => vec![other.clone()],
                None => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    /// Truthiness, dispatching to `__bool__` and then `__len__` on instances.
    pub fn is_truthy(&mut self, value: &Value) -> ExecResult<bool> {
        if let Value::Instance(_) = value {
            if let Some(result) = self.call_dunder(value, "__bool__", Vec::new())? {
                return match result {
                    Value::Bool(b) => Ok(b),
                    other => Err(Exception::type_error(format!(
                        "__bool__ should return bool, returned {}",
                        other.type_name()
                    ))
                    .into()),
                };
            }
            if let Some(result) = self.call_dunder(value, "__len__", Vec::new())? {
                return Ok(result.as_int().unwrap_or_default() != 0);
            }
        }
        Ok(value.is_truthy())
    }
}

fn expect_str(value: Value, method: &str) -> ExecResult<String> {
    match value {
        Value::Str(s) => Ok(s.to_string()),
        other => Err(Exception::type_error(format!(
            "{method} returned non-string (type {})",
            other.type_name()
        ))
        .into()),
    }
}

fn syntax_error(message: &str) -> RuntimeError {
    Exception::new(ErrorKind::RuntimeError, message).into()
}
