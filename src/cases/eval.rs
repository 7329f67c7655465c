//! Argument evaluation for case lines.
//!
//! The text between a case line's parentheses is a comma-separated list of literal expressions. It is lexed
//! with the module lexer, parsed into a small expression tree and folded into [`Value`]s. Target code is never
//! involved: the only names an argument may use are the members of an explicit [`Namespace`].
//!
//! ## Notes
//! - Arithmetic, comparison and membership go through [`crate::runtime::ops`], so `1/2`, `-7 // 2` and
//!   `0.1 + 0.2` produce the same values they would inside the module.
//! - Keyword arguments (`x=1`) are rejected; the harness calls positionally.
//! - Sequence repetition and concatenation are capped by [`EvalLimits::max_sequence_len`].
//!
//! ## Examples
//! ```rust
//! use unitgen::cases::eval::{Namespace, evaluate};
//!
//! let args = evaluate("1, 'two', [3.0], math.sqrt(16)", &Namespace::math()).unwrap();
//! let rendered: Vec<String> = args.iter().map(|v| v.repr()).collect();
//! assert_eq!(rendered, ["1", "'two'", "[3.0]", "4.0"]);
//! ```

use std::collections::BTreeMap;

use thiserror::Error;
use unitgen_core::lang::keywords::KeywordId;
use unitgen_core::lang::math::{MATH_CONSTANTS, MATH_FUNCTIONS, MATH_MODULE_NAME, MathFnId};
use unitgen_core::lang::operators::{self, OperatorId, UNARY_PRECEDENCE};
use unitgen_core::lang::punctuation::PunctuationId;
use unitgen_syntax::ast::{BinaryOp, CompareOp, UnaryOp};
use unitgen_syntax::lexer::{self, Token, TokenKind};

use crate::runtime::bigint;
use crate::runtime::math::call_math;
use crate::runtime::{Exception, PyDict, Value, ops};

/// Brackets deeper than this are rejected instead of recursing further.
const MAX_NESTING: usize = 100;

// ============================================================================
// Configuration
// ============================================================================

/// Resource bounds for argument evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalLimits {
    /// Longest sequence a single `*` or `+` may produce.
    pub max_sequence_len: usize,
}

impl Default for EvalLimits {
    fn default() -> Self {
        Self {
            max_sequence_len: 1_000_000,
        }
    }
}

impl EvalLimits {
    pub fn with_max_sequence_len(mut self, max_sequence_len: usize) -> Self {
        self.max_sequence_len = max_sequence_len;
        self
    }
}

#[derive(Debug, Clone, Copy)]
enum Member {
    Function(MathFnId),
    Constant(f64),
}

/// The names a case argument may reference: at most one namespace of functions and constants.
///
/// The default is the `math` namespace built from the `unitgen_core::lang::math` registry.
#[derive(Debug, Clone)]
pub struct Namespace {
    name: Option<&'static str>,
    members: BTreeMap<&'static str, Member>,
    limits: EvalLimits,
}

impl Namespace {
    /// `math.<function>(...)` and `math.<constant>`.
    pub fn math() -> Self {
        let mut members = BTreeMap::new();
        for f in MATH_FUNCTIONS {
            members.insert(f.item.canonical, Member::Function(f.item.id));
        }
        for c in MATH_CONSTANTS {
            members.insert(c.item.canonical, Member::Constant(c.value));
        }
        Self {
            name: Some(MATH_MODULE_NAME),
            members,
            limits: EvalLimits::default(),
        }
    }

    /// Literals only; every name is disallowed.
    pub fn none() -> Self {
        Self {
            name: None,
            members: BTreeMap::new(),
            limits: EvalLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: EvalLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> EvalLimits {
        self.limits
    }

    /// The namespace's name (`math`), if any.
    pub fn name(&self) -> Option<&'static str> {
        self.name
    }

    /// Member names in sorted order.
    pub fn members(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.members.keys().copied()
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Self::math()
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Why an argument list could not be evaluated.
#[derive(Debug, Clone, Error)]
pub enum EvalError {
    #[error("invalid syntax: {0}")]
    Syntax(String),

    #[error("name '{0}' is not allowed in case arguments")]
    DisallowedName(String),

    #[error("namespace '{namespace}' has no attribute '{name}'")]
    UnknownAttribute { namespace: String, name: String },

    #[error("'{0}' is not callable")]
    NotCallable(String),

    #[error("{}", .0.qualified())]
    Runtime(Exception),

    #[error("sequence of {len} items exceeds the limit of {limit}")]
    TooLarge { len: usize, limit: usize },
}

impl From<Exception> for EvalError {
    fn from(exc: Exception) -> Self {
        EvalError::Runtime(exc)
    }
}

type EvalResult<T> = Result<T, EvalError>;

// ============================================================================
// Entry point
// ============================================================================

/// Evaluate the comma-separated argument text of a case line.
///
/// Empty or whitespace-only text yields no arguments; a single trailing comma is accepted.
pub fn evaluate(arg_text: &str, namespace: &Namespace) -> EvalResult<Vec<Value>> {
    let text = arg_text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }
    let tokens = lexer::lex(text).map_err(|errors| {
        let message = errors.first().map(|e| e.message.clone()).unwrap_or_default();
        EvalError::Syntax(message)
    })?;
    let tokens: Vec<Token> = tokens
        .into_iter()
        .filter(|t| !t.kind.is_layout() && t.kind != TokenKind::Eof)
        .collect();

    let mut parser = ArgParser {
        tokens,
        pos: 0,
        depth: 0,
        namespace,
    };
    let nodes = parser.arguments()?;
    let folder = Folder {
        limits: namespace.limits,
    };
    nodes.iter().map(|node| folder.fold(node)).collect()
}

// ============================================================================
// Expression tree
// ============================================================================

#[derive(Debug)]
enum Node {
    Const(Value),
    List(Vec<Node>),
    Tuple(Vec<Node>),
    Dict(Vec<(Node, Node)>),
    Unary(UnaryOp, Box<Node>),
    Binary(BinaryOp, Box<Node>, Box<Node>),
    Compare(Box<Node>, Vec<(CompareOp, Node)>),
    Call(MathFnId, Vec<Node>),
}

struct ArgParser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    namespace: &'a Namespace,
}

impl ArgParser<'_> {
    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn peek_at(&self, offset: usize) -> Option<&TokenKind> {
        self.tokens.get(self.pos + offset).map(|t| &t.kind)
    }

    fn advance(&mut self) -> Option<TokenKind> {
        let kind = self.tokens.get(self.pos).map(|t| t.kind.clone());
        self.pos += 1;
        kind
    }

    fn check_punct(&self, id: PunctuationId) -> bool {
        self.peek().is_some_and(|k| k.is_punctuation(id))
    }

    fn eat_punct(&mut self, id: PunctuationId) -> bool {
        let found = self.check_punct(id);
        if found {
            self.pos += 1;
        }
        found
    }

    fn check_keyword(&self, id: KeywordId) -> bool {
        self.peek().is_some_and(|k| k.is_keyword(id))
    }

    fn unexpected(&self, expected: &str) -> EvalError {
        match self.peek() {
            Some(kind) => EvalError::Syntax(format!("expected {expected}, found {}", kind.describe())),
            None => EvalError::Syntax(format!("expected {expected}, found end of arguments")),
        }
    }

    fn expect_punct(&mut self, id: PunctuationId, expected: &str) -> EvalResult<()> {
        if self.eat_punct(id) {
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    /// `expr (',' expr)* [',']` up to the end of input.
    fn arguments(&mut self) -> EvalResult<Vec<Node>> {
        let mut nodes = Vec::new();
        while self.peek().is_some() {
            self.reject_keyword_argument()?;
            nodes.push(self.expr()?);
            if self.peek().is_none() {
                break;
            }
            self.expect_punct(PunctuationId::Comma, "',' or end of arguments")?;
        }
        Ok(nodes)
    }

    /// Items up to `close`, allowing a trailing comma.
    fn items(&mut self, close: PunctuationId, what: &str) -> EvalResult<Vec<Node>> {
        let mut items = Vec::new();
        while !self.check_punct(close) {
            self.reject_keyword_argument()?;
            items.push(self.expr()?);
            if !self.eat_punct(PunctuationId::Comma) {
                break;
            }
        }
        self.expect_punct(close, what)?;
        Ok(items)
    }

    fn reject_keyword_argument(&self) -> EvalResult<()> {
        let is_keyword_arg = matches!(self.peek(), Some(TokenKind::Ident(_)))
            && self.peek_at(1).is_some_and(|k| k.is_operator(OperatorId::Eq));
        if is_keyword_arg {
            return Err(EvalError::Syntax("keyword arguments are not supported".to_string()));
        }
        Ok(())
    }

    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> EvalResult<T>) -> EvalResult<T> {
        if self.depth >= MAX_NESTING {
            return Err(EvalError::Syntax("expression nested too deeply".to_string()));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn expr(&mut self) -> EvalResult<Node> {
        self.nested(Self::or_expr)
    }

    fn or_expr(&mut self) -> EvalResult<Node> {
        let mut lhs = self.and_expr()?;
        while self.check_keyword(KeywordId::Or) {
            self.pos += 1;
            let rhs = self.and_expr()?;
            lhs = Node::Binary(BinaryOp::Or, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> EvalResult<Node> {
        let mut lhs = self.not_expr()?;
        while self.check_keyword(KeywordId::And) {
            self.pos += 1;
            let rhs = self.not_expr()?;
            lhs = Node::Binary(BinaryOp::And, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn not_expr(&mut self) -> EvalResult<Node> {
        if self.check_keyword(KeywordId::Not) {
            self.pos += 1;
            let operand = self.nested(Self::not_expr)?;
            return Ok(Node::Unary(UnaryOp::Not, Box::new(operand)));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> EvalResult<Node> {
        let first = self.arith(0)?;
        let mut links = Vec::new();
        while let Some(op) = self.compare_op() {
            let rhs = self.arith(0)?;
            links.push((op, rhs));
        }
        if links.is_empty() {
            Ok(first)
        } else {
            Ok(Node::Compare(Box::new(first), links))
        }
    }

    /// Consume a comparison operator, if one is next.
    fn compare_op(&mut self) -> Option<CompareOp> {
        let op = match self.peek()? {
            TokenKind::Operator(OperatorId::EqEq) => CompareOp::Eq,
            TokenKind::Operator(OperatorId::NotEq) => CompareOp::NotEq,
            TokenKind::Operator(OperatorId::Lt) => CompareOp::Lt,
            TokenKind::Operator(OperatorId::LtEq) => CompareOp::LtEq,
            TokenKind::Operator(OperatorId::Gt) => CompareOp::Gt,
            TokenKind::Operator(OperatorId::GtEq) => CompareOp::GtEq,
            TokenKind::Keyword(KeywordId::In) => CompareOp::In,
            TokenKind::Keyword(KeywordId::Not) if self.peek_at(1).is_some_and(|k| k.is_keyword(KeywordId::In)) => {
                self.pos += 1;
                CompareOp::NotIn
            }
            _ => return None,
        };
        self.pos += 1;
        Some(op)
    }

    /// Precedence climbing over the arithmetic operators, using the registry's binding powers.
    fn arith(&mut self, min_precedence: u8) -> EvalResult<Node> {
        let mut lhs = self.unary()?;
        while let Some((op, precedence)) = self.arith_op() {
            if precedence < min_precedence {
                break;
            }
            self.pos += 1;
            let rhs = self.arith(precedence + 1)?;
            lhs = Node::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn arith_op(&self) -> Option<(BinaryOp, u8)> {
        let TokenKind::Operator(id) = self.peek()? else {
            return None;
        };
        let op = match id {
            OperatorId::Plus => BinaryOp::Add,
            OperatorId::Minus => BinaryOp::Sub,
            OperatorId::Star => BinaryOp::Mul,
            OperatorId::Slash => BinaryOp::Div,
            OperatorId::SlashSlash => BinaryOp::FloorDiv,
            OperatorId::Percent => BinaryOp::Mod,
            _ => return None,
        };
        Some((op, operators::info_for(*id).precedence))
    }

    fn unary(&mut self) -> EvalResult<Node> {
        let op = match self.peek() {
            Some(TokenKind::Operator(OperatorId::Minus)) => UnaryOp::Neg,
            Some(TokenKind::Operator(OperatorId::Plus)) => UnaryOp::Pos,
            _ => return self.power(),
        };
        self.pos += 1;
        let operand = self.nested(Self::unary)?;
        Ok(Node::Unary(op, Box::new(operand)))
    }

    /// `atom ['**' unary]`; `**` binds tighter than a unary minus on its left and is right-associative.
    fn power(&mut self) -> EvalResult<Node> {
        let base = self.atom()?;
        let binds_tighter = operators::info_for(OperatorId::StarStar).precedence > UNARY_PRECEDENCE;
        if binds_tighter && self.peek().is_some_and(|k| k.is_operator(OperatorId::StarStar)) {
            self.pos += 1;
            let exponent = self.nested(Self::unary)?;
            return Ok(Node::Binary(BinaryOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn atom(&mut self) -> EvalResult<Node> {
        let Some(kind) = self.advance() else {
            self.pos -= 1;
            return Err(self.unexpected("an expression"));
        };
        match kind {
            TokenKind::Int(n) => Ok(Node::Const(Value::Int(n))),
            TokenKind::BigInt { digits, radix } => Ok(Node::Const(bigint::literal(&digits, radix)?)),
            TokenKind::Float(f) => Ok(Node::Const(Value::Float(f))),
            TokenKind::String(first) => {
                let mut text = first;
                while let Some(TokenKind::String(next)) = self.peek() {
                    text.push_str(next);
                    self.pos += 1;
                }
                Ok(Node::Const(Value::string(text)))
            }
            TokenKind::FString(_) => Err(EvalError::Syntax(
                "f-strings are not allowed in case arguments".to_string(),
            )),
            TokenKind::Keyword(KeywordId::True) => Ok(Node::Const(Value::Bool(true))),
            TokenKind::Keyword(KeywordId::False) => Ok(Node::Const(Value::Bool(false))),
            TokenKind::Keyword(KeywordId::None) => Ok(Node::Const(Value::None)),
            TokenKind::Punctuation(PunctuationId::LParen) => self.nested(Self::parenthesized),
            TokenKind::Punctuation(PunctuationId::LBracket) => {
                let items = self.nested(|p| p.items(PunctuationId::RBracket, "']'"))?;
                Ok(Node::List(items))
            }
            TokenKind::Punctuation(PunctuationId::LBrace) => self.nested(Self::dict),
            TokenKind::Ident(name) => self.name(name),
            other => {
                self.pos -= 1;
                Err(EvalError::Syntax(format!("unexpected {}", other.describe())))
            }
        }
    }

    /// After `(`: `()`, `(x)`, `(x,)` or `(x, y, ...)`.
    fn parenthesized(&mut self) -> EvalResult<Node> {
        if self.eat_punct(PunctuationId::RParen) {
            return Ok(Node::Tuple(Vec::new()));
        }
        let first = self.expr()?;
        if !self.eat_punct(PunctuationId::Comma) {
            self.expect_punct(PunctuationId::RParen, "')'")?;
            return Ok(first);
        }
        let mut items = vec![first];
        items.extend(self.items(PunctuationId::RParen, "')'")?);
        Ok(Node::Tuple(items))
    }

    /// After `{`: `{}` or `{k: v, ...}`.
    fn dict(&mut self) -> EvalResult<Node> {
        let mut entries = Vec::new();
        while !self.check_punct(PunctuationId::RBrace) {
            let key = self.expr()?;
            if !self.eat_punct(PunctuationId::Colon) {
                if self.check_punct(PunctuationId::Comma) || self.check_punct(PunctuationId::RBrace) {
                    return Err(EvalError::Syntax("set literals are not allowed in case arguments".to_string()));
                }
                return Err(self.unexpected("':'"));
            }
            let value = self.expr()?;
            entries.push((key, value));
            if !self.eat_punct(PunctuationId::Comma) {
                break;
            }
        }
        self.expect_punct(PunctuationId::RBrace, "'}'")?;
        Ok(Node::Dict(entries))
    }

    /// A name: only `<namespace>.<member>` is allowed.
    fn name(&mut self, name: String) -> EvalResult<Node> {
        let Some(namespace) = self.namespace.name.filter(|ns| *ns == name) else {
            return Err(EvalError::DisallowedName(name));
        };
        if !self.eat_punct(PunctuationId::Dot) {
            return Err(EvalError::Syntax(format!(
                "namespace '{namespace}' cannot be used as a value"
            )));
        }
        let attr = match self.advance() {
            Some(TokenKind::Ident(attr)) => attr,
            _ => {
                self.pos -= 1;
                return Err(self.unexpected("an attribute name"));
            }
        };
        let member = self
            .namespace
            .members
            .get(attr.as_str())
            .copied()
            .ok_or_else(|| EvalError::UnknownAttribute {
                namespace: namespace.to_string(),
                name: attr.clone(),
            })?;
        let called = self.eat_punct(PunctuationId::LParen);
        match (member, called) {
            (Member::Function(id), true) => {
                let args = self.nested(|p| p.items(PunctuationId::RParen, "')'"))?;
                Ok(Node::Call(id, args))
            }
            (Member::Function(_), false) => Err(EvalError::Syntax(format!(
                "'{namespace}.{attr}' must be called"
            ))),
            (Member::Constant(_), true) => Err(EvalError::NotCallable(format!("{namespace}.{attr}"))),
            (Member::Constant(value), false) => Ok(Node::Const(Value::Float(value))),
        }
    }
}

// ============================================================================
// Folding
// ============================================================================

struct Folder {
    limits: EvalLimits,
}

impl Folder {
    fn fold(&self, node: &Node) -> EvalResult<Value> {
        match node {
            Node::Const(value) => Ok(value.clone()),
            Node::List(items) => Ok(Value::list(self.fold_all(items)?)),
            Node::Tuple(items) => Ok(Value::tuple(self.fold_all(items)?)),
            Node::Dict(entries) => {
                let mut dict = PyDict::new();
                for (key, value) in entries {
                    dict.insert(self.fold(key)?, self.fold(value)?)?;
                }
                Ok(Value::dict(dict))
            }
            Node::Unary(op, operand) => Ok(ops::unary_op(*op, &self.fold(operand)?)?),
            Node::Binary(BinaryOp::And, lhs, rhs) => {
                let left = self.fold(lhs)?;
                if left.is_truthy() { self.fold(rhs) } else { Ok(left) }
            }
            Node::Binary(BinaryOp::Or, lhs, rhs) => {
                let left = self.fold(lhs)?;
                if left.is_truthy() { Ok(left) } else { self.fold(rhs) }
            }
            Node::Binary(op, lhs, rhs) => {
                let (left, right) = (self.fold(lhs)?, self.fold(rhs)?);
                self.check_size(*op, &left, &right)?;
                Ok(ops::binary_op(*op, &left, &right)?)
            }
            Node::Compare(first, links) => {
                let mut left = self.fold(first)?;
                for (op, rhs) in links {
                    let right = self.fold(rhs)?;
                    if !ops::compare_op(*op, &left, &right)? {
                        return Ok(Value::Bool(false));
                    }
                    left = right;
                }
                Ok(Value::Bool(true))
            }
            Node::Call(id, args) => Ok(call_math(*id, &self.fold_all(args)?)?),
        }
    }

    fn fold_all(&self, nodes: &[Node]) -> EvalResult<Vec<Value>> {
        nodes.iter().map(|node| self.fold(node)).collect()
    }

    /// Refuse a repetition or concatenation whose result would exceed the sequence limit.
    fn check_size(&self, op: BinaryOp, left: &Value, right: &Value) -> EvalResult<()> {
        let len = match op {
            BinaryOp::Mul => ops::repeat_len(left, right),
            BinaryOp::Add => match (sequence_len(left), sequence_len(right)) {
                (Some(a), Some(b)) => Some(a.saturating_add(b)),
                _ => None,
            },
            _ => None,
        };
        match len {
            Some(len) if len > self.limits.max_sequence_len => Err(EvalError::TooLarge {
                len,
                limit: self.limits.max_sequence_len,
            }),
            _ => Ok(()),
        }
    }
}

fn sequence_len(value: &Value) -> Option<usize> {
    match value {
        Value::Str(s) => Some(s.len()),
        Value::List(items) => Some(items.borrow().len()),
        Value::Tuple(items) => Some(items.len()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use unitgen_core::errors::ErrorKind;

    use super::*;

    fn eval(text: &str) -> EvalResult<Vec<Value>> {
        evaluate(text, &Namespace::math())
    }

    fn reprs(text: &str) -> Vec<String> {
        eval(text).unwrap().iter().map(Value::repr).collect()
    }

    #[test]
    fn test_literals() {
        assert_eq!(reprs("1, -2, 3.5, 'a', \"b\", True, None"), [
            "1", "-2", "3.5", "'a'", "'b'", "True", "None"
        ]);
        assert_eq!(reprs("'ab' 'cd'"), ["'abcd'"]);
        assert_eq!(reprs("[1, [2, 3]], (1,), (), {'k': (1, 2)}"), [
            "[1, [2, 3]]", "(1,)", "()", "{'k': (1, 2)}"
        ]);
    }

    #[test]
    fn test_empty_and_trailing_comma() {
        assert!(eval("").unwrap().is_empty());
        assert!(eval("   ").unwrap().is_empty());
        assert_eq!(reprs("1,"), ["1"]);
        assert_eq!(reprs("[1, 2,]"), ["[1, 2]"]);
    }

    #[test]
    fn test_arithmetic_matches_module_semantics() {
        assert_eq!(reprs("1/2, -7 // 2, -7 % 2, 2 ** -1, -2 ** 2"), ["0.5", "-4", "1", "0.5", "-4"]);
        assert_eq!(reprs("1 + 2 * 3, (1 + 2) * 3"), ["7", "9"]);
        assert_eq!(reprs("'ab' * 2, [0] * 3"), ["'abab'", "[0, 0, 0]"]);
    }

    #[test]
    fn test_comparisons_and_boolean_operators() {
        assert_eq!(reprs("1 < 2 < 3, 3 in [1, 2], 3 not in [1, 2]"), ["True", "False", "True"]);
        assert_eq!(reprs("0 or 'x', 1 and 0, not 1"), ["'x'", "0", "False"]);
    }

    #[test]
    fn test_math_namespace() {
        assert_eq!(reprs("math.pi, math.sqrt(9), math.floor(2.7)"), [
            "3.141592653589793", "3.0", "2"
        ]);
    }

    #[test]
    fn test_name_errors() {
        assert!(matches!(eval("x"), Err(EvalError::DisallowedName(n)) if n == "x"));
        assert!(matches!(eval("open('f')"), Err(EvalError::DisallowedName(n)) if n == "open"));
        assert!(matches!(
            eval("math.nope"),
            Err(EvalError::UnknownAttribute { namespace, name }) if namespace == "math" && name == "nope"
        ));
        assert!(matches!(eval("math.pi(1)"), Err(EvalError::NotCallable(n)) if n == "math.pi"));
        assert!(matches!(
            evaluate("math.pi", &Namespace::none()),
            Err(EvalError::DisallowedName(n)) if n == "math"
        ));
    }

    #[test]
    fn test_syntax_errors() {
        assert!(matches!(eval("x=1"), Err(EvalError::Syntax(_))));
        assert!(matches!(eval("1 2"), Err(EvalError::Syntax(_))));
        assert!(matches!(eval("[1, 2"), Err(EvalError::Syntax(_))));
        assert!(matches!(eval("{1, 2}"), Err(EvalError::Syntax(_))));
        assert!(matches!(eval("f'{1}'"), Err(EvalError::Syntax(_))));
        assert!(matches!(eval("(1)(2)"), Err(EvalError::Syntax(_))));
    }

    #[test]
    fn test_runtime_errors_are_wrapped() {
        match eval("1 / 0") {
            Err(EvalError::Runtime(exc)) => assert_eq!(exc.kind(), ErrorKind::ZeroDivisionError),
            other => panic!("expected a runtime error, got {other:?}"),
        }
        assert!(matches!(eval("{[1]: 2}"), Err(EvalError::Runtime(_))));
        assert!(matches!(eval("math.sqrt(-1)"), Err(EvalError::Runtime(_))));
    }

    #[test]
    fn test_sequence_limit() {
        let namespace = Namespace::math().with_limits(EvalLimits::default().with_max_sequence_len(10));
        assert!(matches!(
            evaluate("'a' * 11", &namespace),
            Err(EvalError::TooLarge { len: 11, limit: 10 })
        ));
        assert!(matches!(
            evaluate("[0] * 6 + [0] * 6", &namespace),
            Err(EvalError::TooLarge { len: 12, limit: 10 })
        ));
        assert_eq!(evaluate("'a' * 10", &namespace).unwrap().len(), 1);
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let text = format!("{}1{}", "[".repeat(500), "]".repeat(500));
        assert!(matches!(eval(&text), Err(EvalError::Syntax(_))));
    }
}
