//! Interpreter behaviour seen through module loading and case execution.

use unitgen::cases;
use unitgen::harness::{self, TargetModule};
use unitgen::runtime::{ExecutionLimits, Interpreter, Value};
use unitgen_syntax::{lexer, parser};

fn report(source: &str, lines: &[&str]) -> Vec<String> {
    let limits = ExecutionLimits::default().with_max_call_depth(40);
    let module = TargetModule::from_source_with("target", source, limits).expect("module should load");
    let calls: Vec<_> = lines.iter().map(|l| cases::parse(l).expect("case should parse")).collect();
    harness::run(&calls, &module).iter().map(ToString::to_string).collect()
}

#[test]
fn test_annotated_module_loads() {
    let source = "\
from __future__ import annotations
from typing import List, Optional


def total(xs: List[int], start: Optional[int] = None) -> int:
    result = start if start is not None else 0
    for x in xs:
        result += x
    return result
";
    assert_eq!(report(source, &["total([1, 2, 3])", "total([1], 10)", "total(5)"]), [
        "total([1, 2, 3]) = 6",
        "total([1], 10) = 11",
        "Error executing total(5): 'int' object is not iterable",
    ]);
}

#[test]
fn test_classes_are_callable_targets() {
    let source = "\
class Account:
    def __init__(self, balance):
        if balance < 0:
            raise ValueError('balance must be non-negative')
        self.balance = balance

    def __str__(self):
        return 'Account(' + str(self.balance) + ')'
";
    assert_eq!(report(source, &["Account(10)", "Account(-1)", "Account()"]), [
        "Account(10) = Account(10)",
        "Error executing Account(-1): balance must be non-negative",
        "Error executing Account(): Account.__init__() missing 1 required positional argument: 'balance'",
    ]);
}

#[test]
fn test_module_state_persists_between_cases() {
    let source = "\
count = 0


def bump():
    global count
    count += 1
    return count
";
    assert_eq!(report(source, &["bump()", "bump()"]), ["bump() = 1", "bump() = 2"]);
}

#[test]
fn test_recursion_limit_is_a_failure() {
    let source = "\
def fact(n):
    return 1 if n <= 1 else n * fact(n - 1)


def forever(n):
    return forever(n + 1)
";
    assert_eq!(report(source, &["fact(10)", "forever(0)", "fact(5)"]), [
        "fact(10) = 3628800",
        "Error executing forever(0): RecursionError: maximum recursion depth exceeded",
        "fact(5) = 120",
    ]);
}

#[test]
fn test_interpreter_directly() {
    let tokens = lexer::lex("def pair(a, b=2):\n    return (a, b)\n").unwrap();
    let module = parser::parse(&tokens).unwrap();
    let mut interp = Interpreter::new("direct", ExecutionLimits::default());
    interp.run_module(&module).unwrap();

    let pair = interp.lookup_global("pair").unwrap();
    let value = interp.call(&pair, vec![Value::str("x")], Vec::new()).unwrap();
    assert_eq!(interp.to_repr(&value).unwrap(), "('x', 2)");
    assert_eq!(interp.to_str(&Value::str("x")).unwrap(), "x");
    assert!(interp.steps() > 0);
}

#[test]
fn test_integers_grow_past_64_bits() {
    let source = "\
def fact(n):
    return 1 if n <= 1 else n * fact(n - 1)


def halves(n):
    return n // 2, n / 2


def last_digit(n):
    return n % 10, int(str(n)) + 1
";
    assert_eq!(
        report(source, &["fact(21)", "halves(2**64)", "last_digit(-9223372036854775809)"]),
        [
            "fact(21) = 51090942171709440000",
            "halves(18446744073709551616) = (9223372036854775808, 9.223372036854776e+18)",
            "last_digit(-9223372036854775809) = (1, -9223372036854775808)",
        ]
    );
}
