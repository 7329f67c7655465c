//! Abstract Syntax Tree definitions for target modules.
//!
//! The tree mirrors the Python subset the runtime executes: a module is a flat list of statements, and
//! definitions (`def`, `class`) are ordinary statements that bind names when executed.

use std::fmt;

/// Source location span (byte offsets)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A node with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

pub type Ident = String;

/// A parsed module is a sequence of top-level statements.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub body: Vec<Spanned<Statement>>,
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Expression statement (includes docstrings)
    Expr(Spanned<Expr>),
    /// `a = b = value`, `x, y = pair`, `obj.f = v`, `xs[i] = v`
    Assign(AssignStmt),
    /// `x += 1`
    AugAssign(AugAssignStmt),
    FunctionDef(FunctionDef),
    ClassDef(ClassDef),
    Return(Option<Spanned<Expr>>),
    If(IfStmt),
    While(WhileStmt),
    For(ForStmt),
    Break,
    Continue,
    Pass,
    /// `raise` or `raise expr`
    Raise(Option<Spanned<Expr>>),
    Try(TryStmt),
    Assert(AssertStmt),
    /// `import name [as alias]`
    Import(ImportStmt),
    /// `from name import a [as b], ...`
    FromImport(FromImportStmt),
    /// `global a, b`
    Global(Vec<Ident>),
    /// `with ctx as name, other:`
    With(WithStmt),
}

/// Assignment target.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Name(Ident),
    Attribute(Box<Spanned<Expr>>, Ident),
    Index(Box<Spanned<Expr>>, Box<Spanned<Expr>>),
    /// `a, b` or `(a, b)` or `[a, b]` (unpacking)
    Tuple(Vec<Spanned<Target>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignStmt {
    /// One entry per `=`; `a = b = 1` has two targets.
    pub targets: Vec<Spanned<Target>>,
    pub value: Spanned<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AugAssignStmt {
    pub target: Spanned<Target>,
    pub op: BinaryOp,
    pub value: Spanned<Expr>,
}

/// How a parameter receives its argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamKind {
    /// `a` or `a=1`: by position or by name
    #[default]
    Positional,
    /// `*args`
    VarPositional,
    /// After `*` or `*args`: by name only
    KeywordOnly,
    /// `**kwargs`
    VarKeyword,
}

/// Function parameter. Annotations are parsed and dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Ident,
    pub default: Option<Spanned<Expr>>,
    pub kind: ParamKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: Ident,
    pub params: Vec<Spanned<Param>>,
    pub body: Vec<Spanned<Statement>>,
    /// `@expr` lines above the `def`, outermost first.
    pub decorators: Vec<Spanned<Expr>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: Ident,
    pub bases: Vec<Spanned<Expr>>,
    pub body: Vec<Spanned<Statement>>,
    pub decorators: Vec<Spanned<Expr>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub condition: Spanned<Expr>,
    pub then_body: Vec<Spanned<Statement>>,
    pub elif_branches: Vec<(Spanned<Expr>, Vec<Spanned<Statement>>)>,
    pub else_body: Option<Vec<Spanned<Statement>>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub condition: Spanned<Expr>,
    pub body: Vec<Spanned<Statement>>,
    pub else_body: Option<Vec<Spanned<Statement>>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    pub target: Spanned<Target>,
    pub iter: Spanned<Expr>,
    pub body: Vec<Spanned<Statement>>,
    pub else_body: Option<Vec<Spanned<Statement>>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExceptHandler {
    /// `None` for a bare `except:`
    pub class: Option<Spanned<Expr>>,
    /// `except E as name`
    pub name: Option<Ident>,
    pub body: Vec<Spanned<Statement>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TryStmt {
    pub body: Vec<Spanned<Statement>>,
    pub handlers: Vec<Spanned<ExceptHandler>>,
    pub else_body: Option<Vec<Spanned<Statement>>>,
    pub finally_body: Option<Vec<Spanned<Statement>>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssertStmt {
    pub test: Spanned<Expr>,
    pub message: Option<Spanned<Expr>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportStmt {
    pub module: Ident,
    pub alias: Option<Ident>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FromImportStmt {
    pub module: Ident,
    pub names: Vec<(Ident, Option<Ident>)>,
}

/// One `ctx [as target]` of a `with` header.
#[derive(Debug, Clone, PartialEq)]
pub struct WithItem {
    pub context: Spanned<Expr>,
    pub target: Option<Spanned<Target>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WithStmt {
    pub items: Vec<WithItem>,
    pub body: Vec<Spanned<Statement>>,
}

// ============================================================================
// Expressions
// ============================================================================

/// Slice expression: represents `start:end` or `start:end:step`
/// All components are optional, e.g., `[:5]`, `[2:]`, `[::2]`
#[derive(Debug, Clone, PartialEq)]
pub struct SliceExpr {
    pub start: Option<Box<Spanned<Expr>>>,
    pub end: Option<Box<Spanned<Expr>>>,
    pub step: Option<Box<Spanned<Expr>>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Name(Ident),
    Literal(Literal),
    /// Arithmetic and short-circuit boolean operators: `a + b`, `a and b`
    Binary(Box<Spanned<Expr>>, BinaryOp, Box<Spanned<Expr>>),
    /// `-x`, `+x`, `not x`
    Unary(UnaryOp, Box<Spanned<Expr>>),
    /// Comparison chain: `a < b <= c` is `Compare(a, [(Lt, b), (LtEq, c)])`
    Compare(Box<Spanned<Expr>>, Vec<(CompareOp, Spanned<Expr>)>),
    /// Call: `f(a, b=1)`
    Call(Box<Spanned<Expr>>, Vec<CallArg>),
    /// Attribute access: `x.name`
    Attribute(Box<Spanned<Expr>>, Ident),
    /// Index: `x[i]`
    Index(Box<Spanned<Expr>>, Box<Spanned<Expr>>),
    /// Slice: `x[start:end:step]`
    Slice(Box<Spanned<Expr>>, SliceExpr),
    /// `body if condition else orelse`
    IfExp(Box<IfExp>),
    /// `lambda a, b=1: expr`
    Lambda(Vec<Spanned<Param>>, Box<Spanned<Expr>>),
    Tuple(Vec<Spanned<Expr>>),
    List(Vec<Spanned<Expr>>),
    Dict(Vec<(Spanned<Expr>, Spanned<Expr>)>),
    Set(Vec<Spanned<Expr>>),
    /// `[expr for x in iter if cond]`
    ListComp(Box<ListComp>),
    /// `{expr for x in iter if cond}`
    SetComp(Box<ListComp>),
    /// `{k: v for x in iter if cond}`
    DictComp(Box<DictComp>),
    /// f-string: `f"Hello {name}"`
    FString(Vec<FStringPart>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FStringPart {
    Literal(String),
    /// `{expr!conv:spec}`
    Expr {
        expr: Spanned<Expr>,
        conversion: Option<char>,
        spec: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    /// Integer outside the 64-bit range, as its digits in `radix`.
    BigInt { digits: String, radix: u32 },
    Float(f64),
    Str(String),
    Bool(bool),
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv, // // (Python-style floor division)
    Mod,
    Pow,
    And,
    Or,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryOp::Add => write!(f, "+"),
            BinaryOp::Sub => write!(f, "-"),
            BinaryOp::Mul => write!(f, "*"),
            BinaryOp::Div => write!(f, "/"),
            BinaryOp::FloorDiv => write!(f, "//"),
            BinaryOp::Mod => write!(f, "%"),
            BinaryOp::Pow => write!(f, "**"),
            BinaryOp::And => write!(f, "and"),
            BinaryOp::Or => write!(f, "or"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    In,
    NotIn,
    Is,
    IsNot,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Eq => write!(f, "=="),
            CompareOp::NotEq => write!(f, "!="),
            CompareOp::Lt => write!(f, "<"),
            CompareOp::LtEq => write!(f, "<="),
            CompareOp::Gt => write!(f, ">"),
            CompareOp::GtEq => write!(f, ">="),
            CompareOp::In => write!(f, "in"),
            CompareOp::NotIn => write!(f, "not in"),
            CompareOp::Is => write!(f, "is"),
            CompareOp::IsNot => write!(f, "is not"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Neg => write!(f, "-"),
            UnaryOp::Pos => write!(f, "+"),
            UnaryOp::Not => write!(f, "not"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CallArg {
    /// Positional argument
    Positional(Spanned<Expr>),
    /// Named argument: `name=value`
    Named(Ident, Spanned<Expr>),
    /// `*iterable`
    Unpack(Spanned<Expr>),
    /// `**mapping`
    UnpackMapping(Spanned<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfExp {
    pub body: Spanned<Expr>,
    pub condition: Spanned<Expr>,
    pub orelse: Spanned<Expr>,
}

/// `for target in iter [if cond]...`; several `if`s are joined with `and`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompClause {
    pub target: Spanned<Target>,
    pub iter: Spanned<Expr>,
    pub filter: Option<Spanned<Expr>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListComp {
    pub expr: Spanned<Expr>,
    /// Outermost loop first.
    pub clauses: Vec<CompClause>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DictComp {
    pub key: Spanned<Expr>,
    pub value: Spanned<Expr>,
    pub clauses: Vec<CompClause>,
}
