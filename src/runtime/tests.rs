//! Interpreter tests: whole modules are lexed, parsed and executed, then functions are called directly.

use unitgen_core::errors::ErrorKind;
use unitgen_syntax::{lexer, parser};

use super::*;

/// Shallow call depth so the recursion-limit tests fail fast.
fn limits() -> ExecutionLimits {
    ExecutionLimits::default().with_max_call_depth(40)
}

fn load(source: &str) -> Interpreter {
    let tokens = lexer::lex(source).expect("source should lex");
    let module = parser::parse(&tokens).expect("source should parse");
    let mut interp = Interpreter::new("sample", limits());
    interp.run_module(&module).expect("module body should run");
    interp
}

fn call(interp: &mut Interpreter, name: &str, args: Vec<Value>) -> ExecResult<Value> {
    let function = interp.lookup_global(name).expect("function should be defined");
    interp.call(&function, args, Vec::new())
}

fn call_repr(interp: &mut Interpreter, name: &str, args: Vec<Value>) -> String {
    let value = call(interp, name, args).expect("call should succeed");
    interp.to_repr(&value).expect("repr should render")
}

fn raised(result: ExecResult<Value>) -> Exception {
    match result {
        Err(RuntimeError::Raise(exc)) => exc,
        other => panic!("expected an exception, got {other:?}"),
    }
}

#[test]
fn test_arithmetic_and_defaults() {
    let mut interp = load("def add(a, b=10):\n    return a + b\n");
    assert_eq!(call(&mut interp, "add", vec![Value::Int(1), Value::Int(2)]).unwrap(), Value::Int(3));
    assert_eq!(call(&mut interp, "add", vec![Value::Int(1)]).unwrap(), Value::Int(11));
    assert_eq!(call_repr(&mut interp, "add", vec![Value::Float(0.1), Value::Float(0.2)]), "0.30000000000000004");
}

#[test]
fn test_python_division_semantics() {
    let source = "\
def ops(a, b):
    return (a // b, a % b, a / b)
";
    let mut interp = load(source);
    assert_eq!(call_repr(&mut interp, "ops", vec![Value::Int(-7), Value::Int(2)]), "(-4, 1, -3.5)");
    let err = raised(call(&mut interp, "ops", vec![Value::Int(1), Value::Int(0)]));
    assert_eq!(err.qualified(), "ZeroDivisionError: integer division or modulo by zero");
}

#[test]
fn test_control_flow_and_loops() {
    let source = "\
def classify(n):
    if n < 0:
        return 'negative'
    elif n == 0:
        return 'zero'
    else:
        return 'positive'

def first_even(items):
    for item in items:
        if item % 2 == 0:
            break
    else:
        return None
    return item

def countdown(n):
    out = []
    while n > 0:
        out.append(n)
        n -= 1
    return out
";
    let mut interp = load(source);
    assert_eq!(call_repr(&mut interp, "classify", vec![Value::Int(-3)]), "'negative'");
    assert_eq!(call_repr(&mut interp, "classify", vec![Value::Int(0)]), "'zero'");
    let items = Value::list(vec![Value::Int(1), Value::Int(4), Value::Int(6)]);
    assert_eq!(call_repr(&mut interp, "first_even", vec![items]), "4");
    let odd = Value::list(vec![Value::Int(1), Value::Int(3)]);
    assert_eq!(call_repr(&mut interp, "first_even", vec![odd]), "None");
    assert_eq!(call_repr(&mut interp, "countdown", vec![Value::Int(3)]), "[3, 2, 1]");
}

#[test]
fn test_exceptions_are_catchable_and_reported() {
    let source = "\
def safe_div(a, b):
    try:
        return a / b
    except ZeroDivisionError as e:
        return 'error: ' + str(e)
    finally:
        pass

def check(n):
    if n < 0:
        raise ValueError('negative input')
    return n

def lookup(d, k):
    return d[k]
";
    let mut interp = load(source);
    assert_eq!(
        call_repr(&mut interp, "safe_div", vec![Value::Int(1), Value::Int(0)]),
        "'error: division by zero'"
    );
    let err = raised(call(&mut interp, "check", vec![Value::Int(-1)]));
    assert_eq!(err.kind(), ErrorKind::ValueError);
    assert_eq!(err.qualified(), "ValueError: negative input");

    let err = raised(call(&mut interp, "lookup", vec![Value::dict(PyDict::new()), Value::str("k")]));
    assert_eq!(err.qualified(), "KeyError: 'k'");
}

#[test]
fn test_custom_exception_classes() {
    let source = "\
class InsufficientFunds(Exception):
    pass

class Account:
    def __init__(self, balance):
        self.balance = balance

    def withdraw(self, amount):
        if amount > self.balance:
            raise InsufficientFunds('balance too low')
        self.balance -= amount
        return self.balance

def run(amount):
    acct = Account(100)
    try:
        return acct.withdraw(amount)
    except Exception as e:
        return type(e).__name__ + ': ' + str(e)

def unhandled():
    Account(10).withdraw(50)
";
    let mut interp = load(source);
    assert_eq!(call_repr(&mut interp, "run", vec![Value::Int(30)]), "70");
    assert_eq!(
        call_repr(&mut interp, "run", vec![Value::Int(300)]),
        "'InsufficientFunds: balance too low'"
    );
    let err = raised(call(&mut interp, "unhandled", vec![]));
    assert_eq!(err.qualified(), "InsufficientFunds: balance too low");
}

#[test]
fn test_classes_inheritance_and_super() {
    let source = "\
class Shape:
    def __init__(self, name):
        self.name = name

    def describe(self):
        return self.name + ' with area ' + str(self.area())

class Square(Shape):
    def __init__(self, side):
        super().__init__('square')
        self.side = side

    def area(self):
        return self.side ** 2

    def __repr__(self):
        return f'Square({self.side})'

def make(side):
    return Square(side)

def describe(side):
    return Square(side).describe()
";
    let mut interp = load(source);
    assert_eq!(call_repr(&mut interp, "describe", vec![Value::Int(3)]), "'square with area 9'");
    assert_eq!(call_repr(&mut interp, "make", vec![Value::Int(2)]), "Square(2)");
}

#[test]
fn test_comprehensions_lambdas_and_builtins() {
    let source = "\
def squares(n):
    return [i * i for i in range(n) if i % 2 == 0]

def index(words):
    return {w: len(w) for w in words}

def by_length(words):
    return sorted(words, key=lambda w: (len(w), w), reverse=True)

def stats(xs):
    return (min(xs), max(xs), sum(xs), round(sum(xs) / len(xs), 2))
";
    let mut interp = load(source);
    assert_eq!(call_repr(&mut interp, "squares", vec![Value::Int(7)]), "[0, 4, 16, 36]");
    let words = Value::list(vec![Value::str("bb"), Value::str("a"), Value::str("ccc")]);
    assert_eq!(call_repr(&mut interp, "index", vec![words.clone()]), "{'bb': 2, 'a': 1, 'ccc': 3}");
    assert_eq!(call_repr(&mut interp, "by_length", vec![words]), "['ccc', 'bb', 'a']");
    let xs = Value::list(vec![Value::Int(3), Value::Int(1), Value::Int(2)]);
    assert_eq!(call_repr(&mut interp, "stats", vec![xs]), "(1, 3, 6, 2.0)");
}

#[test]
fn test_string_methods_and_formatting() {
    let source = "\
def greet(name):
    return 'Hello, {}!'.format(name.strip().title())

def money(x):
    return f'{x:>10,.2f}|{x!r}'

def words(s):
    return '-'.join(s.split())

def pct(a, b):
    return '%s is %d%%' % (a, b)
";
    let mut interp = load(source);
    assert_eq!(call_repr(&mut interp, "greet", vec![Value::str("  ada lovelace ")]), "'Hello, Ada Lovelace!'");
    assert_eq!(call_repr(&mut interp, "money", vec![Value::Float(1234.5)]), "'  1,234.50|1234.5'");
    assert_eq!(call_repr(&mut interp, "words", vec![Value::str(" a  b c ")]), "'a-b-c'");
    assert_eq!(call_repr(&mut interp, "pct", vec![Value::str("rate"), Value::Int(5)]), "'rate is 5%'");
}

#[test]
fn test_print_is_captured() {
    let mut interp = load("def shout(x):\n    print('value:', x, sep=' ')\n    return x\n");
    call(&mut interp, "shout", vec![Value::Int(5)]).unwrap();
    assert_eq!(interp.take_output(), "value: 5\n");
    assert_eq!(interp.take_output(), "");
}

#[test]
fn test_math_import() {
    let source = "\
import math
from math import sqrt as root

def hyp(a, b):
    return root(a * a + b * b)

def circle(r):
    return math.pi * r ** 2
";
    let mut interp = load(source);
    assert_eq!(call_repr(&mut interp, "hyp", vec![Value::Int(3), Value::Int(4)]), "5.0");
    assert_eq!(call_repr(&mut interp, "circle", vec![Value::Int(1)]), "3.141592653589793");
}

#[test]
fn test_unknown_import_fails_module_load() {
    let tokens = lexer::lex("import numpy\n").unwrap();
    let module = parser::parse(&tokens).unwrap();
    let mut interp = Interpreter::new("sample", limits());
    let err = interp.run_module(&module).unwrap_err();
    assert_eq!(err.qualified(), "ModuleNotFoundError: No module named 'numpy'");
}

#[test]
fn test_argument_binding_errors() {
    let mut interp = load("def f(a, b):\n    return a\n");
    let err = raised(call(&mut interp, "f", vec![Value::Int(1)]));
    assert_eq!(err.qualified(), "TypeError: f() missing 1 required positional argument: 'b'");
    let err = raised(call(&mut interp, "f", vec![Value::Int(1), Value::Int(2), Value::Int(3)]));
    assert_eq!(err.qualified(), "TypeError: f() takes 2 positional arguments but 3 were given");
}

#[test]
fn test_runaway_loop_hits_step_budget() {
    let mut interp = load("def spin():\n    while True:\n        pass\n");
    interp.set_limits(limits().with_max_steps(10_000));
    interp.reset_budget();
    let err = call(&mut interp, "spin", vec![]).unwrap_err();
    assert!(matches!(err, RuntimeError::Limit(LimitError::Steps(10_000))));
}

#[test]
fn test_unbounded_recursion_hits_depth_limit() {
    let mut interp = load("def down(n):\n    return down(n + 1)\n");
    let err = call(&mut interp, "down", vec![Value::Int(0)]).unwrap_err();
    assert_eq!(err.qualified(), "RecursionError: maximum recursion depth exceeded");
}

#[test]
fn test_limit_errors_bypass_except_blocks() {
    let source = "\
def guarded():
    try:
        while True:
            pass
    except Exception:
        return 'caught'
";
    let mut interp = load(source);
    interp.set_limits(limits().with_max_steps(5_000));
    interp.reset_budget();
    assert!(matches!(call(&mut interp, "guarded", vec![]), Err(RuntimeError::Limit(_))));
}

#[test]
fn test_self_referencing_list_renders_with_ellipsis() {
    let mut interp = load("def loop():\n    xs = [1]\n    xs.append(xs)\n    return xs\n");
    assert_eq!(call_repr(&mut interp, "loop", vec![]), "[1, [...]]");
}

#[test]
fn test_global_declaration_and_module_state() {
    let source = "\
counter = 0

def bump():
    global counter
    counter += 1
    return counter
";
    let mut interp = load(source);
    call(&mut interp, "bump", vec![]).unwrap();
    assert_eq!(call(&mut interp, "bump", vec![]).unwrap(), Value::Int(2));
    assert_eq!(interp.lookup_global("counter"), Some(Value::Int(2)));
    assert!(interp.global_names().contains(&"bump".to_string()));
}

#[test]
fn test_unbound_local_is_reported() {
    let source = "\
total = 1

def broken():
    total += 1
    return total
";
    let mut interp = load(source);
    let err = raised(call(&mut interp, "broken", vec![]));
    assert_eq!(err.kind(), ErrorKind::UnboundLocalError);
}

#[test]
fn test_padding_methods_reject_extreme_widths() {
    let source = "\
def pad(s, width):
    return (s.zfill(width), s.rjust(width, '*'), s.center(width))
";
    let mut interp = load(source);
    assert_eq!(call_repr(&mut interp, "pad", vec![Value::str("-7"), Value::Int(4)]), "('-007', '**-7', ' -7 ')");
    assert_eq!(call_repr(&mut interp, "pad", vec![Value::str("ab"), Value::Int(i64::MIN)]), "('ab', 'ab', 'ab')");
    let err = raised(call(&mut interp, "pad", vec![Value::str("7"), Value::Int(1_000_000_000_000_000)]));
    assert_eq!(err.kind(), ErrorKind::OverflowError);
}

#[test]
fn test_recursion_up_to_the_call_limit_does_not_exhaust_the_native_stack() {
    let source = "\
def count(n):
    if n == 0:
        return 0
    return 1 + count(n - 1)


def nest(n):
    out = []
    for _ in range(n):
        out = [out]
    return out
";
    let mut interp = load(source);
    interp.set_limits(ExecutionLimits::default());
    assert_eq!(call(&mut interp, "count", vec![Value::Int(199)]).unwrap(), Value::Int(199));
    let err = call(&mut interp, "count", vec![Value::Int(200)]).unwrap_err();
    assert!(matches!(err, RuntimeError::Limit(LimitError::Depth(200))));

    interp.set_limits(ExecutionLimits::default().with_max_call_depth(20_000));
    interp.reset_budget();
    assert_eq!(call(&mut interp, "count", vec![Value::Int(15_000)]).unwrap(), Value::Int(15_000));

    let nested = call(&mut interp, "nest", vec![Value::Int(2_000)]).unwrap();
    let rendered = interp.to_repr(&nested).unwrap();
    assert_eq!(rendered.len(), 4_002);
    assert!(rendered.starts_with("[[[") && rendered.ends_with("]]]"));
}

#[test]
fn test_variadic_and_keyword_only_parameters() {
    let source = "\
def total(*args):
    return sum(args)

def kw(a, b=2, **rest):
    return (a, b, rest)

def only(x, *, scale=2, offset):
    return x * scale + offset

def forward(*args, **kwargs):
    return kw(*args, **kwargs)

def check():
    return (total(), total(1, 2, 3), kw(1), kw(1, c=3, b=5), only(1, offset=10), forward(1, 2, d=4))
";
    let mut interp = load(source);
    assert_eq!(
        call_repr(&mut interp, "check", vec![]),
        "(0, 6, (1, 2, {}), (1, 5, {'c': 3}), 12, (1, 2, {'d': 4}))"
    );

    let err = raised(call(&mut interp, "only", vec![Value::Int(1)]));
    assert_eq!(err.qualified(), "TypeError: only() missing 1 required keyword-only argument: 'offset'");
    let err = raised(call(&mut interp, "kw", vec![Value::Int(1), Value::Int(2), Value::Int(3)]));
    assert_eq!(err.qualified(), "TypeError: kw() takes from 1 to 2 positional arguments but 3 were given");
    let err = raised(call(&mut interp, "forward", vec![Value::Int(1), Value::Int(2), Value::Int(3)]));
    assert_eq!(err.qualified(), "TypeError: kw() takes from 1 to 2 positional arguments but 3 were given");
}

#[test]
fn test_method_decorators_and_function_decorators() {
    let source = "\
class Temp:
    def __init__(self, degrees):
        self.degrees = degrees

    @staticmethod
    def parse(text):
        return Temp(float(text))

    @classmethod
    def freezing(cls):
        return cls(0.0)

    @property
    def fahrenheit(self):
        return self.degrees * 9 / 5 + 32

def twice(f):
    def wrapper(*args, **kwargs):
        return f(f(*args, **kwargs))
    return wrapper

@twice
@twice
def inc(n):
    return n + 1

def check():
    t = Temp.parse('100')
    return (t.fahrenheit, Temp.freezing().fahrenheit, t.parse('5').degrees, inc(1))

def overwrite():
    t = Temp(1.0)
    t.fahrenheit = 3
";
    let mut interp = load(source);
    assert_eq!(call_repr(&mut interp, "check", vec![]), "(212.0, 32.0, 5.0, 5)");
    let err = raised(call(&mut interp, "overwrite", vec![]));
    assert_eq!(
        err.qualified(),
        "AttributeError: property 'fahrenheit' of 'Temp' object has no setter"
    );
}

#[test]
fn test_with_statement_calls_enter_and_exit() {
    let source = "\
log = []

class Tracked:
    def __init__(self, name, swallow=False):
        self.name = name
        self.swallow = swallow

    def __enter__(self):
        log.append('enter ' + self.name)
        return self.name.upper()

    def __exit__(self, kind, value, tb):
        log.append('exit ' + self.name + ' ' + repr(kind is None))
        return self.swallow

def run():
    with Tracked('a') as first, Tracked('b') as second:
        log.append(first + second)
    with Tracked('c', True):
        raise ValueError('boom')
    try:
        with Tracked('d'):
            1 / 0
    except ZeroDivisionError as e:
        log.append('caught ' + str(e))
    return log

def not_a_manager():
    with 5:
        pass
";
    let mut interp = load(source);
    assert_eq!(
        call_repr(&mut interp, "run", vec![]),
        "['enter a', 'enter b', 'AB', 'exit b True', 'exit a True', 'enter c', 'exit c False', \
         'enter d', 'exit d False', 'caught division by zero']"
    );
    let err = raised(call(&mut interp, "not_a_manager", vec![]));
    assert_eq!(
        err.qualified(),
        "TypeError: 'int' object does not support the context manager protocol"
    );
}

#[test]
fn test_comprehensions_with_several_clauses() {
    let source = "\
def pairs():
    return [(i, j) for i in range(3) for j in range(i)]

def flat():
    return [i for i in range(3) for j in range(2)]

def residues():
    return {x * x % 3 for x in range(6)}

def table():
    return {(i, j): i * j for i in range(2) for j in range(2) if i != j}
";
    let mut interp = load(source);
    assert_eq!(call_repr(&mut interp, "pairs", vec![]), "[(1, 0), (2, 0), (2, 1)]");
    assert_eq!(call_repr(&mut interp, "flat", vec![]), "[0, 0, 1, 1, 2, 2]");
    assert_eq!(call_repr(&mut interp, "residues", vec![]), "{0, 1}");
    assert_eq!(call_repr(&mut interp, "table", vec![]), "{(0, 1): 0, (1, 0): 0}");
}
