//! End-to-end: load the fixture module, parse the fixture cases, run them.

use std::fs;
use std::path::Path;

use unitgen::cases::{self, Namespace};
use unitgen::harness::{self, LoadError, OutcomeStatus, TargetModule};
use unitgen::runtime::{ExecutionLimits, Value};

fn fixture(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn sample() -> TargetModule {
    TargetModule::load(&fixture("sample.py")).expect("sample fixture should load")
}

#[test]
fn test_fixture_cases_report() {
    let module = sample();
    let text = fs::read_to_string(fixture("cases.txt")).unwrap();
    let batch = cases::parse_cases(&text, &Namespace::default());
    assert_eq!(batch.skipped().len(), 2);

    let outcomes = harness::run(batch.invocations(), &module);
    insta::assert_snapshot!(harness::report_text(&outcomes).trim_end(), @r"
    add(1, 2) = 3
    add('a', 'b') = ab
    Error executing add(1, 'x'): unsupported operand type(s) for +: 'int' and 'str'
    Error executing divide(1, 0): division by zero
    divide(7, 2) = 3.5
    is_palindrome('A man, a plan, a canal: Panama') = True
    hypotenuse(3, 4) = 5.0
    greet('Ada') = Hello, Ada
    Error executing missing(1): module 'sample' has no attribute 'missing'
    ");
}

#[test]
fn test_outcome_details() {
    let module = sample();
    let calls: Vec<_> = ["greet('Bo')", "divide(1, 4)"].iter().filter_map(|l| cases::parse(l)).collect();
    let outcomes = harness::run(&calls, &module);

    assert_eq!(outcomes[0].output(), "greeting Bo\n");
    assert!(matches!(outcomes[0].status(), OutcomeStatus::Success(Value::Str(s)) if &**s == "Hello, Bo"));
    assert!(matches!(outcomes[1].status(), OutcomeStatus::Success(Value::Float(f)) if *f == 0.25));
    assert_eq!(outcomes[1].function_name(), "divide");
}

#[test]
fn test_runaway_case_does_not_stop_the_batch() {
    let limits = ExecutionLimits::default().with_max_steps(10_000);
    let module = TargetModule::load_with(&fixture("sample.py"), limits).unwrap();
    let calls: Vec<_> = ["spin()", "add(2, 3)"].iter().filter_map(|l| cases::parse(l)).collect();
    let lines: Vec<String> = harness::run(&calls, &module).iter().map(ToString::to_string).collect();
    assert_eq!(lines, [
        "Error executing spin(): TimeoutError: execution exceeded 10000 steps",
        "add(2, 3) = 5",
    ]);
}

#[test]
fn test_run_with_overrides_limits_for_one_batch() {
    let module = sample();
    let calls = vec![cases::parse("spin()").unwrap()];
    let tight = ExecutionLimits::default().with_max_steps(500);
    let outcomes = harness::run_with(&calls, &module, &tight);
    assert!(!outcomes[0].is_success());
    assert_eq!(module.limits(), ExecutionLimits::default());
}

#[test]
fn test_module_symbols() {
    let module = sample();
    assert_eq!(module.name(), "sample");
    let symbols = module.symbols();
    for name in ["RATE", "add", "divide", "greet", "hypotenuse", "is_palindrome", "math", "spin"] {
        assert!(symbols.iter().any(|s| s == name), "missing {name} in {symbols:?}");
    }
    assert_eq!(module.resolve("RATE"), Some(Value::Float(0.5)));
}

#[test]
fn test_load_errors() {
    let err = TargetModule::load(&fixture("broken.py")).unwrap_err();
    assert!(matches!(err, LoadError::Syntax(_)));
    assert!(unitgen::diagnostics::render_report(&err).contains("broken.py"));

    let err = TargetModule::load(&fixture("does_not_exist.py")).unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }));

    let err = TargetModule::from_source("bad", "import numpy\n").unwrap_err();
    assert!(matches!(err, LoadError::Execution { .. }));
    assert!(err.to_string().starts_with("module 'bad' failed to load: ModuleNotFoundError"), "{err}");
}

#[test]
fn test_deeply_nested_source_is_a_syntax_error() {
    let source = format!("x = {}1{}\n", "(".repeat(5_000), ")".repeat(5_000));
    let err = TargetModule::from_source("deep", &source).unwrap_err();
    assert!(
        matches!(&err, LoadError::Syntax(report) if report.errors()[0].message == "too many nested parentheses"),
        "{err:?}"
    );

    let source = format!("def f(x):\n    return {}\n", vec!["x"; 50_000].join(" - "));
    let err = TargetModule::from_source("long", &source).unwrap_err();
    assert!(
        matches!(&err, LoadError::Syntax(report) if report.errors()[0].message == "expression too deeply nested"),
        "{err:?}"
    );
}

#[test]
fn test_running_a_batch_twice_gives_identical_outcomes() {
    let source = "\
def pop_first(xs):
    return xs.pop(0)

def tag(d):
    d['seen'] = True
    d['a'].append(2)
    return len(d)
";
    let module = TargetModule::from_source("mutating", source).unwrap();
    let calls: Vec<_> = ["pop_first([1, 2, 3])", "tag({'a': [1]})"]
        .iter()
        .filter_map(|l| cases::parse(l))
        .collect();
    let first: Vec<String> = harness::run(&calls, &module).iter().map(ToString::to_string).collect();
    let second: Vec<String> = harness::run(&calls, &module).iter().map(ToString::to_string).collect();

    assert_eq!(first, ["pop_first([1, 2, 3]) = 1", "tag({'a': [1]}) = 2"]);
    assert_eq!(first, second);
    assert_eq!(calls[0].to_string(), "pop_first([1, 2, 3])");
    assert_eq!(calls[1].to_string(), "tag({'a': [1]})");
}
