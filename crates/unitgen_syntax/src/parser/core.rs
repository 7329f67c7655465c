/// Parser core types and entrypoint.
///
/// This chunk defines the [`Parser`] type and its top-level `parse()` entrypoint.
///
/// ## Notes
/// - This file is `include!`'d into `crate::parser` to keep all parser methods in a
///   single module while avoiding a single “god file”.

/// Nested `expression()` calls (brackets, calls, conditionals, lambdas, unary chains) allowed in one statement.
const MAX_NESTING: usize = 200;

/// Deepest expression tree accepted from a module.
const MAX_EXPR_DEPTH: usize = 1_000;

/// Native stack kept free before the parser descends one more level.
const STACK_RED_ZONE: usize = 128 * 1024;
const STACK_SEGMENT: usize = 2 * 1024 * 1024;

/// Result of parsing `[...]` postfix syntax: either a single index or a slice.
enum IndexOrSlice {
    Index(Spanned<Expr>),
    Slice(SliceExpr),
}

/// Parser state.
///
/// ## Notes
/// - The parser is single-pass and recovers from errors by synchronizing at statement boundaries, so one run
///   reports every broken line of a module.
pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    errors: Vec<CompileError>,
    /// Current `expression()` nesting; see [`MAX_NESTING`].
    nesting: usize,
}

impl<'a> Parser<'a> {
    /// Create a new parser for a token stream.
    ///
    /// ## Parameters
    /// - `tokens`: Token stream produced by `unitgen_syntax::lexer`. It must end with [`TokenKind::Eof`].
    pub fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
            nesting: 0,
        }
    }

    /// Parse the entire token stream into a [`Module`].
    ///
    /// ## Errors
    /// Returns every [`CompileError`] collected while parsing.
    pub fn parse(mut self) -> Result<Module, Vec<CompileError>> {
        let mut body = Vec::new();

        self.skip_newlines();
        // Stray top-level DEDENT can appear after error recovery (e.g. unexpected indentation).
        self.skip_dedents();

        while !self.is_at_end() {
            match self.statement() {
                Ok(stmt) => body.push(stmt),
                Err(e) => {
                    self.errors.push(e);
                    self.synchronize();
                }
            }
            self.skip_newlines();
            self.skip_dedents();
        }

        if self.errors.is_empty() {
            Ok(Module { body })
        } else {
            Err(self.errors)
        }
    }
}
