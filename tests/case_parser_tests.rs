//! Case-line parsing over realistic model output.

use unitgen::cases::{self, CaseLine, EvalError, Namespace, ParsedInvocation, SkipReason};
use unitgen::runtime::Value;

const MODEL_OUTPUT: &str = "\
Here are the test cases:

add(1, 2)
add(-1, 1)
add(1.5, math.pi)
concat(['a'], ['b', 'c'])
lookup({'k': 1}, 'k')
add(1,
1 + 2
    scale(2, factor)
";

#[test]
fn test_model_output_batch() {
    let batch = cases::parse_cases(MODEL_OUTPUT, &Namespace::math());

    let rendered: Vec<String> = batch.invocations().iter().map(ToString::to_string).collect();
    assert_eq!(rendered, [
        "add(1, 2)",
        "add(-1, 1)",
        "add(1.5, 3.141592653589793)",
        "concat(['a'], ['b', 'c'])",
        "lookup({'k': 1}, 'k')",
    ]);

    let skipped: Vec<usize> = batch.skipped().iter().map(|s| s.line_number).collect();
    assert_eq!(skipped, [1, 8, 9, 10]);
    assert!(matches!(batch.skipped()[2].reason, SkipReason::NotACall));
    assert!(matches!(
        batch.skipped()[3].reason,
        SkipReason::InvalidArguments(EvalError::DisallowedName(ref name)) if name == "factor"
    ));
    assert_eq!(batch.skipped()[3].text, "    scale(2, factor)");
}

#[test]
fn test_invocation_values() {
    let invocation = cases::parse("pair('x', (1, 2.5), None, True)").unwrap();
    assert_eq!(invocation.function_name(), "pair");
    assert_eq!(invocation.arguments()[0], Value::str("x"));
    assert_eq!(invocation.arguments()[2], Value::None);
    assert_eq!(invocation.arguments()[3], Value::Bool(true));
    assert_eq!(invocation.arguments()[1].repr(), "(1, 2.5)");
}

#[test]
fn test_no_math_namespace() {
    let line = cases::parse_line("root(math.sqrt(4))", &Namespace::none());
    assert!(matches!(
        line,
        CaseLine::Skipped(SkipReason::InvalidArguments(EvalError::DisallowedName(ref name))) if name == "math"
    ));
    assert!(matches!(
        cases::parse_line("root(math.sqrt(4))", &Namespace::math()),
        CaseLine::Parsed(_)
    ));
}

#[test]
fn test_arguments_are_never_executed_as_code() {
    for line in [
        "f(__import__('os'))",
        "f(open('/etc/passwd'))",
        "f(x := 1)",
        "f(lambda: 1)",
        "f([i for i in range(3)])",
    ] {
        assert!(cases::parse(line).is_none(), "{line} should be skipped");
    }
}

#[test]
fn test_constructed_invocation_matches_parsed() {
    let built = ParsedInvocation::new("add", vec![Value::Int(1), Value::Int(2)]).unwrap();
    assert_eq!(cases::parse("add(1, 2)").unwrap(), built);
    assert!(ParsedInvocation::new("not a name", Vec::new()).is_none());
}
