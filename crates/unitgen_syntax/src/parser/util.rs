/// Miscellaneous parser utilities.
///
/// Identifier parsing, assignment-target conversion and the rejection of reserved syntax.
impl<'a> Parser<'a> {
    // ========================================================================
    // Utilities
    // ========================================================================

    fn identifier(&mut self) -> Result<Ident, CompileError> {
        match &self.peek().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    fn identifier_list(&mut self) -> Result<Vec<Ident>, CompileError> {
        let mut idents = vec![self.identifier()?];
        while self.match_punct(PunctuationId::Comma) {
            idents.push(self.identifier()?);
        }
        Ok(idents)
    }

    /// Dotted module path (`os.path`), joined back with `.`.
    fn dotted_name(&mut self) -> Result<Ident, CompileError> {
        let mut name = self.identifier()?;
        while self.match_punct(PunctuationId::Dot) {
            name.push('.');
            name.push_str(&self.identifier()?);
        }
        Ok(name)
    }

    /// Convert a parsed expression into an assignment target.
    fn to_target(&self, expr: Spanned<Expr>) -> Result<Spanned<Target>, CompileError> {
        let span = expr.span;
        let target = match expr.node {
            Expr::Name(name) => Target::Name(name),
            Expr::Attribute(obj, name) => Target::Attribute(obj, name),
            Expr::Index(obj, index) => Target::Index(obj, index),
            Expr::Tuple(items) | Expr::List(items) => Target::Tuple(
                items
                    .into_iter()
                    .map(|item| self.to_target(item))
                    .collect::<Result<_, _>>()?,
            ),
            Expr::Slice(..) => {
                return Err(CompileError::syntax("Slice assignment is not supported".to_string(), span));
            }
            Expr::Literal(_) => {
                return Err(CompileError::syntax("Cannot assign to literal".to_string(), span));
            }
            _ => {
                return Err(CompileError::syntax("Cannot assign to expression".to_string(), span));
            }
        };
        Ok(Spanned::new(target, span))
    }

    /// Error for a keyword that is reserved but has no statement form in the supported subset.
    fn unsupported_keyword(&self, id: KeywordId) -> CompileError {
        CompileError::syntax(
            format!("'{}' is not supported", keywords::as_str(id)),
            self.current_span(),
        )
        .with_note("target modules may use functions, classes, control flow and exceptions")
    }
}
