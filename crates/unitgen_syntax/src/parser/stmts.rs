/// Statement parsing.
///
/// `statement()` dispatches on the leading token: compound statements own an indented block, simple statements
/// end at `;`, NEWLINE, DEDENT or EOF.
impl<'a> Parser<'a> {
    // ========================================================================
    // Statements
    // ========================================================================

    fn statement(&mut self) -> Result<Spanned<Statement>, CompileError> {
        let start = self.current_span().start;

        let compound = match &self.peek().kind {
            TokenKind::Keyword(KeywordId::If) => Some(self.if_stmt()?),
            TokenKind::Keyword(KeywordId::While) => Some(self.while_stmt()?),
            TokenKind::Keyword(KeywordId::For) => Some(self.for_stmt()?),
            TokenKind::Keyword(KeywordId::Try) => Some(self.try_stmt()?),
            TokenKind::Keyword(KeywordId::Def) => Some(self.function_def()?),
            TokenKind::Keyword(KeywordId::Class) => Some(self.class_def()?),
            TokenKind::Keyword(KeywordId::With) => Some(self.with_stmt()?),
            TokenKind::Punctuation(PunctuationId::At) => Some(self.decorated()?),
            TokenKind::Indent => {
                return Err(CompileError::syntax("Unexpected indent".to_string(), self.current_span()));
            }
            _ => None,
        };
        if let Some(stmt) = compound {
            let end = self.previous_end();
            return Ok(Spanned::new(stmt, Span::new(start, end)));
        }

        let stmt = self.simple_statement()?;
        self.end_statement()?;
        Ok(stmt)
    }

    /// Parse one simple (single-line) statement without its terminator.
    fn simple_statement(&mut self) -> Result<Spanned<Statement>, CompileError> {
        let start = self.current_span().start;

        let stmt = match &self.peek().kind {
            TokenKind::Keyword(KeywordId::Pass) => {
                self.advance();
                Statement::Pass
            }
            TokenKind::Keyword(KeywordId::Break) => {
                self.advance();
                Statement::Break
            }
            TokenKind::Keyword(KeywordId::Continue) => {
                self.advance();
                Statement::Continue
            }
            TokenKind::Keyword(KeywordId::Return) => {
                self.advance();
                let value = if self.is_at_expr_start() {
                    Some(self.expression_list()?)
                } else {
                    None
                };
                Statement::Return(value)
            }
            TokenKind::Keyword(KeywordId::Raise) => self.raise_stmt()?,
            TokenKind::Keyword(KeywordId::Assert) => {
                self.advance();
                let test = self.expression()?;
                let message = if self.match_punct(PunctuationId::Comma) {
                    Some(self.expression()?)
                } else {
                    None
                };
                Statement::Assert(AssertStmt { test, message })
            }
            TokenKind::Keyword(KeywordId::Import) => self.import_stmt()?,
            TokenKind::Keyword(KeywordId::From) => self.from_import_stmt()?,
            TokenKind::Keyword(KeywordId::Global) => {
                self.advance();
                Statement::Global(self.identifier_list()?)
            }
            TokenKind::Keyword(
                id @ (KeywordId::Yield
                | KeywordId::Async
                | KeywordId::Await
                | KeywordId::Del
                | KeywordId::Nonlocal),
            ) => return Err(self.unsupported_keyword(*id)),
            _ => return self.expr_or_assign(),
        };

        let end = self.previous_end();
        Ok(Spanned::new(stmt, Span::new(start, end)))
    }

    /// Parse the body after a `:`.
    ///
    /// Either an indented block (NEWLINE INDENT ... DEDENT) or simple statements on the same line (`if x: return 1`).
    fn block(&mut self) -> Result<Vec<Spanned<Statement>>, CompileError> {
        if !self.match_token(&TokenKind::Newline) {
            return self.inline_block();
        }
        self.skip_newlines();
        self.expect(&TokenKind::Indent, "an indented block")?;

        let mut body = Vec::new();
        self.skip_newlines();
        while !self.check(&TokenKind::Dedent) && !self.is_at_end() {
            match self.statement() {
                Ok(stmt) => body.push(stmt),
                Err(e) => {
                    self.errors.push(e);
                    self.synchronize();
                }
            }
            self.skip_newlines();
        }
        self.match_token(&TokenKind::Dedent);
        Ok(body)
    }

    /// `with a [as x], b [as y]: body`
    fn with_stmt(&mut self) -> Result<Statement, CompileError> {
        self.advance(); // with
        let mut items = Vec::new();
        loop {
            let context = self.expression()?;
            let target = if self.match_keyword(KeywordId::As) {
                let expr = self.postfix()?;
                Some(self.to_target(expr)?)
            } else {
                None
            };
            items.push(WithItem { context, target });
            if !self.match_punct(PunctuationId::Comma) {
                break;
            }
        }
        self.expect_punct(PunctuationId::Colon, "':' after with items")?;
        let body = self.block()?;
        Ok(Statement::With(WithStmt { items, body }))
    }

    fn inline_block(&mut self) -> Result<Vec<Spanned<Statement>>, CompileError> {
        let mut body = vec![self.simple_statement()?];
        while self.match_punct(PunctuationId::Semicolon) {
            if self.check(&TokenKind::Newline) || self.is_at_end() {
                break;
            }
            body.push(self.simple_statement()?);
        }
        if !self.is_at_end() && !self.check(&TokenKind::Dedent) {
            self.expect(&TokenKind::Newline, "newline after statement")?;
        }
        Ok(body)
    }

    fn if_stmt(&mut self) -> Result<Statement, CompileError> {
        self.advance(); // if
        let condition = self.expression()?;
        self.expect_punct(PunctuationId::Colon, "':' after if condition")?;
        let then_body = self.block()?;

        let mut elif_branches = Vec::new();
        while self.match_keyword(KeywordId::Elif) {
            let cond = self.expression()?;
            self.expect_punct(PunctuationId::Colon, "':' after elif condition")?;
            elif_branches.push((cond, self.block()?));
        }

        let else_body = self.else_clause()?;
        Ok(Statement::If(IfStmt {
            condition,
            then_body,
            elif_branches,
            else_body,
        }))
    }

    /// Optional `else:` block (shared by `if`, `while`, `for` and `try`).
    fn else_clause(&mut self) -> Result<Option<Vec<Spanned<Statement>>>, CompileError> {
        if self.match_keyword(KeywordId::Else) {
            self.expect_punct(PunctuationId::Colon, "':' after else")?;
            Ok(Some(self.block()?))
        } else {
            Ok(None)
        }
    }

    fn while_stmt(&mut self) -> Result<Statement, CompileError> {
        self.advance(); // while
        let condition = self.expression()?;
        self.expect_punct(PunctuationId::Colon, "':' after while condition")?;
        let body = self.block()?;
        let else_body = self.else_clause()?;
        Ok(Statement::While(WhileStmt {
            condition,
            body,
            else_body,
        }))
    }

    fn for_stmt(&mut self) -> Result<Statement, CompileError> {
        self.advance(); // for
        let target = self.target_list()?;
        self.expect_keyword(KeywordId::In, "'in' after for target")?;
        let iter = self.expression_list()?;
        self.expect_punct(PunctuationId::Colon, "':' after for clause")?;
        let body = self.block()?;
        let else_body = self.else_clause()?;
        Ok(Statement::For(ForStmt {
            target,
            iter,
            body,
            else_body,
        }))
    }

    fn try_stmt(&mut self) -> Result<Statement, CompileError> {
        let try_span = self.current_span();
        self.advance(); // try
        self.expect_punct(PunctuationId::Colon, "':' after try")?;
        let body = self.block()?;

        let mut handlers = Vec::new();
        while self.check_keyword(KeywordId::Except) {
            let start = self.current_span().start;
            self.advance();
            let (class, name) = if self.check_punct(PunctuationId::Colon) {
                (None, None)
            } else {
                let class = self.expression()?;
                let name = if self.match_keyword(KeywordId::As) {
                    Some(self.identifier()?)
                } else {
                    None
                };
                (Some(class), name)
            };
            self.expect_punct(PunctuationId::Colon, "':' after except clause")?;
            let handler_body = self.block()?;
            let end = self.previous_end();
            handlers.push(Spanned::new(
                ExceptHandler {
                    class,
                    name,
                    body: handler_body,
                },
                Span::new(start, end),
            ));
        }

        let else_body = if handlers.is_empty() { None } else { self.else_clause()? };
        let finally_body = if self.match_keyword(KeywordId::Finally) {
            self.expect_punct(PunctuationId::Colon, "':' after finally")?;
            Some(self.block()?)
        } else {
            None
        };

        if handlers.is_empty() && finally_body.is_none() {
            return Err(CompileError::syntax(
                "'try' needs at least one 'except' or 'finally' clause".to_string(),
                try_span,
            ));
        }

        Ok(Statement::Try(TryStmt {
            body,
            handlers,
            else_body,
            finally_body,
        }))
    }

    fn raise_stmt(&mut self) -> Result<Statement, CompileError> {
        self.advance(); // raise
        if !self.is_at_expr_start() {
            return Ok(Statement::Raise(None));
        }
        let exc = self.expression()?;
        // `raise E from cause`: the cause is evaluated for syntax only.
        if self.match_keyword(KeywordId::From) {
            self.expression()?;
        }
        Ok(Statement::Raise(Some(exc)))
    }

    /// Expression statement, assignment (`a = b = v`, `x, y = p`), annotated assignment or augmented assignment.
    fn expr_or_assign(&mut self) -> Result<Spanned<Statement>, CompileError> {
        let start = self.current_span().start;
        let first = self.expression_list()?;

        // `name: annotation [= value]`
        if self.check_punct(PunctuationId::Colon) && matches!(first.node, Expr::Name(_) | Expr::Attribute(..)) {
            self.advance();
            self.expression()?;
            if !self.match_op(OperatorId::Eq) {
                return Ok(Spanned::new(Statement::Pass, Span::new(start, self.previous_end())));
            }
            let target = self.to_target(first)?;
            let value = self.expression_list()?;
            let end = value.span.end;
            return Ok(Spanned::new(
                Statement::Assign(AssignStmt {
                    targets: vec![target],
                    value,
                }),
                Span::new(start, end),
            ));
        }

        if self.check_op(OperatorId::Eq) {
            let mut targets = vec![self.to_target(first)?];
            let mut value;
            loop {
                self.advance(); // =
                value = self.expression_list()?;
                if !self.check_op(OperatorId::Eq) {
                    break;
                }
                targets.push(self.to_target(value)?);
            }
            let end = value.span.end;
            return Ok(Spanned::new(
                Statement::Assign(AssignStmt { targets, value }),
                Span::new(start, end),
            ));
        }

        if let Some(op) = self.aug_assign_op() {
            self.advance();
            if matches!(first.node, Expr::Tuple(_)) {
                return Err(CompileError::syntax(
                    "Illegal target for augmented assignment".to_string(),
                    first.span,
                ));
            }
            let target = self.to_target(first)?;
            let value = self.expression_list()?;
            let end = value.span.end;
            return Ok(Spanned::new(
                Statement::AugAssign(AugAssignStmt { target, op, value }),
                Span::new(start, end),
            ));
        }

        let span = first.span;
        Ok(Spanned::new(Statement::Expr(first), span))
    }

    fn aug_assign_op(&self) -> Option<BinaryOp> {
        match &self.peek().kind {
            TokenKind::Operator(OperatorId::PlusEq) => Some(BinaryOp::Add),
            TokenKind::Operator(OperatorId::MinusEq) => Some(BinaryOp::Sub),
            TokenKind::Operator(OperatorId::StarEq) => Some(BinaryOp::Mul),
            TokenKind::Operator(OperatorId::SlashEq) => Some(BinaryOp::Div),
            TokenKind::Operator(OperatorId::SlashSlashEq) => Some(BinaryOp::FloorDiv),
            TokenKind::Operator(OperatorId::PercentEq) => Some(BinaryOp::Mod),
            _ => None,
        }
    }

    /// Targets of `for` loops and comprehensions: `x`, `i, x`, `(k, v)`.
    ///
    /// Parsed at postfix level so the following `in` is not taken as a comparison.
    fn target_list(&mut self) -> Result<Spanned<Target>, CompileError> {
        let first = self.postfix()?;
        if !self.check_punct(PunctuationId::Comma) {
            return self.to_target(first);
        }
        let start = first.span.start;
        let mut items = vec![first];
        while self.match_punct(PunctuationId::Comma) {
            if self.check_keyword(KeywordId::In) {
                break;
            }
            items.push(self.postfix()?);
        }
        let end = self.previous_end();
        self.to_target(Spanned::new(Expr::Tuple(items), Span::new(start, end)))
    }
}
