#[cfg(test)]
/// Parser unit tests.
///
/// These tests focus on correctness of specific syntactic forms and on the parser’s
/// error recovery behavior (avoiding cascaded errors).
mod tests {
    use super::*;
    use crate::lexer;

    fn parse_str(source: &str) -> Result<Module, Vec<CompileError>> {
        let tokens = lexer::lex(source).map_err(|_| vec![])?;
        parse(&tokens)
    }

    fn parse_ok(source: &str) -> Module {
        match parse_str(source) {
            Ok(module) => module,
            Err(errors) => panic!("parse failed: {:?}", errors),
        }
    }

    /// Parse a single expression statement and return the expression.
    fn expr(source: &str) -> Expr {
        let module = parse_ok(source);
        match &module.body[0].node {
            Statement::Expr(e) => e.node.clone(),
            other => panic!("Expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_unexpected_indent_at_toplevel_is_single_clear_error() {
        let err = parse_str("  x = 1\n").expect_err("top-level indentation should be rejected");
        assert_eq!(err.len(), 1, "Parser should return exactly one error (no cascade)");
        assert!(err[0].message.contains("Unexpected indent"), "got: {}", err[0].message);
    }

    #[test]
    fn test_parse_function() {
        let source = r#"
def add(a: int, b: int = 2) -> int:
    """Add two numbers."""
    return a + b
"#;
        let module = parse_ok(source);
        assert_eq!(module.body.len(), 1);
        match &module.body[0].node {
            Statement::FunctionDef(f) => {
                assert_eq!(f.name, "add");
                assert_eq!(f.params.len(), 2);
                assert!(f.params[0].node.default.is_none());
                assert!(f.params[1].node.default.is_some());
                assert_eq!(f.body.len(), 2);
            }
            other => panic!("Expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_class_with_methods() {
        let source = r#"
class Stack(object):
    def __init__(self):
        self.items = []

    def push(self, x):
        self.items.append(x)
"#;
        let module = parse_ok(source);
        match &module.body[0].node {
            Statement::ClassDef(c) => {
                assert_eq!(c.name, "Stack");
                assert_eq!(c.bases.len(), 1);
                assert_eq!(c.body.len(), 2);
            }
            other => panic!("Expected class, got {:?}", other),
        }
    }

    #[test]
    fn test_power_binds_tighter_than_unary_minus() {
        match expr("-2 ** 2\n") {
            Expr::Unary(UnaryOp::Neg, inner) => {
                assert!(matches!(inner.node, Expr::Binary(_, BinaryOp::Pow, _)));
            }
            other => panic!("Expected negated power, got {:?}", other),
        }
    }

    #[test]
    fn test_power_is_right_associative() {
        match expr("2 ** 3 ** 2\n") {
            Expr::Binary(left, BinaryOp::Pow, right) => {
                assert_eq!(left.node, Expr::Literal(Literal::Int(2)));
                assert!(matches!(right.node, Expr::Binary(_, BinaryOp::Pow, _)));
            }
            other => panic!("Expected power, got {:?}", other),
        }
    }

    #[test]
    fn test_chained_comparison() {
        match expr("0 <= x < 10\n") {
            Expr::Compare(_, rest) => {
                let ops: Vec<CompareOp> = rest.iter().map(|(op, _)| *op).collect();
                assert_eq!(ops, vec![CompareOp::LtEq, CompareOp::Lt]);
            }
            other => panic!("Expected comparison, got {:?}", other),
        }
    }

    #[test]
    fn test_not_in_and_is_not() {
        match expr("a not in b\n") {
            Expr::Compare(_, rest) => assert_eq!(rest[0].0, CompareOp::NotIn),
            other => panic!("Expected comparison, got {:?}", other),
        }
        match expr("a is not None\n") {
            Expr::Compare(_, rest) => assert_eq!(rest[0].0, CompareOp::IsNot),
            other => panic!("Expected comparison, got {:?}", other),
        }
    }

    #[test]
    fn test_conditional_expression_and_lambda() {
        assert!(matches!(expr("a if c else b\n"), Expr::IfExp(_)));
        match expr("lambda x, y=1: x + y\n") {
            Expr::Lambda(params, _) => assert_eq!(params.len(), 2),
            other => panic!("Expected lambda, got {:?}", other),
        }
    }

    #[test]
    fn test_assignment_forms() {
        let module = parse_ok("a = b = 1\nx, y = y, x\nn += 1\nitems[0] = 5\ncount: int = 0\n");
        match &module.body[0].node {
            Statement::Assign(a) => assert_eq!(a.targets.len(), 2),
            other => panic!("Expected assignment, got {:?}", other),
        }
        match &module.body[1].node {
            Statement::Assign(a) => {
                assert!(matches!(a.targets[0].node, Target::Tuple(ref t) if t.len() == 2));
                assert!(matches!(a.value.node, Expr::Tuple(_)));
            }
            other => panic!("Expected assignment, got {:?}", other),
        }
        assert!(matches!(
            module.body[2].node,
            Statement::AugAssign(AugAssignStmt { op: BinaryOp::Add, .. })
        ));
        match &module.body[3].node {
            Statement::Assign(a) => assert!(matches!(a.targets[0].node, Target::Index(..))),
            other => panic!("Expected assignment, got {:?}", other),
        }
        assert!(matches!(module.body[4].node, Statement::Assign(_)));
    }

    #[test]
    fn test_invalid_assignment_target() {
        let err = parse_str("f() = 1\n").unwrap_err();
        assert!(err[0].message.contains("Cannot assign"));
    }

    #[test]
    fn test_control_flow() {
        let source = r#"
for i, x in enumerate(xs):
    if x > 0:
        continue
    elif x == 0:
        break
    else:
        pass
else:
    done = True
while n > 1: n //= 2
"#;
        let module = parse_ok(source);
        match &module.body[0].node {
            Statement::For(f) => {
                assert!(matches!(f.target.node, Target::Tuple(_)));
                assert!(f.else_body.is_some());
                match &f.body[0].node {
                    Statement::If(i) => {
                        assert_eq!(i.elif_branches.len(), 1);
                        assert!(i.else_body.is_some());
                    }
                    other => panic!("Expected if, got {:?}", other),
                }
            }
            other => panic!("Expected for, got {:?}", other),
        }
        assert!(matches!(module.body[1].node, Statement::While(_)));
    }

    #[test]
    fn test_try_except_finally() {
        let source = r#"
try:
    risky()
except (ValueError, TypeError) as e:
    handle(e)
except:
    raise
else:
    ok()
finally:
    cleanup()
"#;
        let module = parse_ok(source);
        match &module.body[0].node {
            Statement::Try(t) => {
                assert_eq!(t.handlers.len(), 2);
                assert_eq!(t.handlers[0].node.name.as_deref(), Some("e"));
                assert!(t.handlers[1].node.class.is_none());
                assert!(t.else_body.is_some());
                assert!(t.finally_body.is_some());
            }
            other => panic!("Expected try, got {:?}", other),
        }
    }

    #[test]
    fn test_try_without_handlers_is_error() {
        let err = parse_str("try:\n    x = 1\ny = 2\n").unwrap_err();
        assert!(err[0].message.contains("'except' or 'finally'"));
    }

    #[test]
    fn test_imports_and_global() {
        let module = parse_ok("import math\nimport math as m\nfrom math import sqrt, pi as PI\nglobal a, b\n");
        assert!(matches!(&module.body[0].node, Statement::Import(i) if i.module == "math" && i.alias.is_none()));
        assert!(matches!(&module.body[1].node, Statement::Import(i) if i.alias.as_deref() == Some("m")));
        match &module.body[2].node {
            Statement::FromImport(f) => {
                assert_eq!(f.names[0], ("sqrt".to_string(), None));
                assert_eq!(f.names[1], ("pi".to_string(), Some("PI".to_string())));
            }
            other => panic!("Expected from-import, got {:?}", other),
        }
        assert!(matches!(&module.body[3].node, Statement::Global(names) if names.len() == 2));
    }

    #[test]
    fn test_collections_and_comprehensions() {
        assert!(matches!(expr("[]\n"), Expr::List(ref v) if v.is_empty()));
        assert!(matches!(expr("{}\n"), Expr::Dict(ref v) if v.is_empty()));
        assert!(matches!(expr("{1, 2}\n"), Expr::Set(ref v) if v.len() == 2));
        assert!(matches!(expr("(1,)\n"), Expr::Tuple(ref v) if v.len() == 1));
        assert!(matches!(expr("{'a': 1, 'b': 2,}\n"), Expr::Dict(ref v) if v.len() == 2));
        match expr("[x * x for x in range(10) if x % 2 if x > 3]\n") {
            Expr::ListComp(c) => {
                let filter = c.clauses[0].filter.as_ref().map(|f| &f.node);
                assert!(matches!(filter, Some(Expr::Binary(_, BinaryOp::And, _))));
            }
            other => panic!("Expected list comprehension, got {:?}", other),
        }
        assert!(matches!(expr("{k: v for k, v in pairs}\n"), Expr::DictComp(_)));
        assert!(matches!(expr("{x % 3 for x in xs}\n"), Expr::SetComp(_)));
    }

    #[test]
    fn test_comprehension_with_several_for_clauses() {
        match expr("[(i, j) for i in range(3) if i for j in range(i)]\n") {
            Expr::ListComp(c) => {
                assert_eq!(c.clauses.len(), 2);
                assert!(c.clauses[0].filter.is_some());
                assert!(matches!(c.clauses[1].target.node, Target::Name(ref n) if n == "j"));
            }
            other => panic!("Expected list comprehension, got {:?}", other),
        }
    }

    #[test]
    fn test_variadic_and_keyword_only_parameters() {
        let module = parse_ok("def f(a, b=2, *args, key, flag=False, **kwargs):\n    pass\ndef g(x, *, y):\n    pass\n");
        let kinds = |i: usize| match &module.body[i].node {
            Statement::FunctionDef(f) => f.params.iter().map(|p| (p.node.name.clone(), p.node.kind)).collect::<Vec<_>>(),
            other => panic!("Expected function, got {:?}", other),
        };
        assert_eq!(kinds(0), vec![
            ("a".to_string(), ParamKind::Positional),
            ("b".to_string(), ParamKind::Positional),
            ("args".to_string(), ParamKind::VarPositional),
            ("key".to_string(), ParamKind::KeywordOnly),
            ("flag".to_string(), ParamKind::KeywordOnly),
            ("kwargs".to_string(), ParamKind::VarKeyword),
        ]);
        assert_eq!(kinds(1), vec![
            ("x".to_string(), ParamKind::Positional),
            ("y".to_string(), ParamKind::KeywordOnly),
        ]);

        let err = parse_str("def f(**kw, a):\n    pass\n").unwrap_err();
        assert!(err[0].message.contains("follows **kwargs"));
        let err = parse_str("def f(a, *):\n    pass\n").unwrap_err();
        assert!(!err.is_empty());
        let err = parse_str("def f(*, a, *b):\n    pass\n").unwrap_err();
        assert!(err[0].message.contains("only once"));
    }

    #[test]
    fn test_call_site_unpacking() {
        match expr("f(1, *rest, key=2, **options)\n") {
            Expr::Call(_, args) => {
                assert!(matches!(&args[1], CallArg::Unpack(_)));
                assert!(matches!(&args[2], CallArg::Named(..)));
                assert!(matches!(&args[3], CallArg::UnpackMapping(_)));
            }
            other => panic!("Expected call, got {:?}", other),
        }
        let err = parse_str("f(**a, *b)\n").unwrap_err();
        assert!(err[0].message.contains("Iterable argument unpacking"));
    }

    #[test]
    fn test_decorators_attach_to_definitions() {
        let source = "class C:\n    @staticmethod\n    @cache(size=2)\n    def f():\n        pass\n\n@register\nclass D:\n    pass\n";
        let module = parse_ok(source);
        match &module.body[0].node {
            Statement::ClassDef(c) => match &c.body[0].node {
                Statement::FunctionDef(f) => {
                    assert_eq!(f.decorators.len(), 2);
                    assert!(matches!(&f.decorators[0].node, Expr::Name(n) if n == "staticmethod"));
                    assert!(matches!(&f.decorators[1].node, Expr::Call(..)));
                }
                other => panic!("Expected method, got {:?}", other),
            },
            other => panic!("Expected class, got {:?}", other),
        }
        assert!(matches!(&module.body[1].node, Statement::ClassDef(d) if d.decorators.len() == 1));

        let err = parse_str("@wrap\nx = 1\n").unwrap_err();
        assert!(err[0].message.contains("'def' or 'class' after decorators"));
    }

    #[test]
    fn test_with_statement() {
        let module = parse_ok("with open(p) as f, lock:\n    pass\n");
        match &module.body[0].node {
            Statement::With(w) => {
                assert_eq!(w.items.len(), 2);
                assert!(matches!(&w.items[0].target, Some(t) if matches!(&t.node, Target::Name(n) if n == "f")));
                assert!(w.items[1].target.is_none());
            }
            other => panic!("Expected with, got {:?}", other),
        }
    }

    #[test]
    fn test_deep_nesting_is_a_syntax_error() {
        let source = format!("x = {}1{}\n", "(".repeat(3000), ")".repeat(3000));
        let err = parse_str(&source).unwrap_err();
        assert!(err.iter().any(|e| e.message == "too many nested parentheses"), "{err:?}");

        let source = format!("x = {}1\n", "not ".repeat(3000));
        assert!(parse_str(&source).is_err());
        let source = format!("x = {}1\n", "-".repeat(3000));
        assert!(parse_str(&source).is_err());

        let nested = format!("x = {}1{}\n", "(".repeat(150), ")".repeat(150));
        parse_ok(&nested);
    }

    #[test]
    fn test_long_operator_chain_is_a_syntax_error() {
        let source = format!("def f(x):\n    return {}\n", vec!["x"; 20_000].join(" + "));
        let err = parse_str(&source).unwrap_err();
        assert_eq!(err[0].message, "expression too deeply nested");

        let source = format!("y = {}\n", vec!["1"; 500].join(" * "));
        parse_ok(&source);
    }

    #[test]
    fn test_generator_argument_becomes_comprehension() {
        match expr("sum(x for x in xs)\n") {
            Expr::Call(_, args) => {
                assert!(matches!(&args[0], CallArg::Positional(a) if matches!(a.node, Expr::ListComp(_))));
            }
            other => panic!("Expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_call_keyword_arguments() {
        match expr("f(1, key=2)\n") {
            Expr::Call(_, args) => {
                assert!(matches!(&args[1], CallArg::Named(name, _) if name == "key"));
            }
            other => panic!("Expected call, got {:?}", other),
        }
        let err = parse_str("f(key=2, 1)\n").unwrap_err();
        assert!(err[0].message.contains("Positional argument follows keyword argument"));
    }

    #[test]
    fn test_slices() {
        match expr("s[::-1]\n") {
            Expr::Slice(_, slice) => {
                assert!(slice.start.is_none());
                assert!(slice.end.is_none());
                assert!(slice.step.is_some());
            }
            other => panic!("Expected slice, got {:?}", other),
        }
        assert!(matches!(expr("s[1:]\n"), Expr::Slice(..)));
        assert!(matches!(expr("s[i]\n"), Expr::Index(..)));
    }

    #[test]
    fn test_fstring_fields() {
        match expr("f'{name!r:>10} = {a + b:.2f} {x}'\n") {
            Expr::FString(parts) => {
                let fields: Vec<(Option<char>, Option<String>)> = parts
                    .iter()
                    .filter_map(|p| match p {
                        FStringPart::Expr { conversion, spec, .. } => Some((*conversion, spec.clone())),
                        FStringPart::Literal(_) => None,
                    })
                    .collect();
                assert_eq!(
                    fields,
                    vec![
                        (Some('r'), Some(">10".to_string())),
                        (None, Some(".2f".to_string())),
                        (None, None),
                    ]
                );
            }
            other => panic!("Expected f-string, got {:?}", other),
        }
    }

    #[test]
    fn test_fstring_expression_spans_point_into_source() {
        let source = "f'ab{value}'\n";
        match expr(source) {
            Expr::FString(parts) => match &parts[1] {
                FStringPart::Expr { expr, .. } => {
                    assert_eq!(&source[expr.span.start..expr.span.end], "value");
                }
                other => panic!("Expected field, got {:?}", other),
            },
            other => panic!("Expected f-string, got {:?}", other),
        }
    }

    #[test]
    fn test_fstring_not_equal_is_not_conversion() {
        match expr("f'{a != b}'\n") {
            Expr::FString(parts) => {
                assert!(matches!(&parts[0], FStringPart::Expr { conversion: None, expr, .. }
                    if matches!(expr.node, Expr::Compare(..))));
            }
            other => panic!("Expected f-string, got {:?}", other),
        }
    }

    #[test]
    fn test_adjacent_strings_concatenate() {
        assert_eq!(expr("'ab' \"cd\"\n"), Expr::Literal(Literal::Str("abcd".to_string())));
    }

    #[test]
    fn test_semicolon_separated_statements() {
        let module = parse_ok("a = 1; b = 2\nif a: x = 1; y = 2\n");
        assert_eq!(module.body.len(), 3);
        match &module.body[2].node {
            Statement::If(i) => assert_eq!(i.then_body.len(), 2),
            other => panic!("Expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_syntax_is_reported() {
        let err = parse_str("def f():\n    yield 1\n").unwrap_err();
        assert!(err[0].message.contains("'yield' is not supported"));

        let err = parse_str("def f(*args=()):\n    pass\n").unwrap_err();
        assert!(err[0].message.contains("Variadic"));
    }

    #[test]
    fn test_recovers_and_reports_multiple_errors() {
        let source = "x = = 1\ny = 2\nz = *\n";
        let err = parse_str(source).unwrap_err();
        assert_eq!(err.len(), 2);
    }

    #[test]
    fn test_error_inside_function_does_not_hide_later_definitions() {
        let source = "def f():\n    return +\ndef g():\n    return 1\n";
        let err = parse_str(source).unwrap_err();
        assert_eq!(err.len(), 1);
        assert!(err[0].message.contains("Expected expression"));
    }
}
