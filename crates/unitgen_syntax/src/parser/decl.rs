/// Definition and import parsing.
///
/// `def` and `class` are statements here: they bind a name when executed, like any assignment.
/// Type annotations on parameters and return values are parsed and dropped. Decorators are kept as expressions
/// and applied by the runtime.
impl<'a> Parser<'a> {
    // ========================================================================
    // Definitions
    // ========================================================================

    fn function_def(&mut self) -> Result<Statement, CompileError> {
        self.advance(); // def
        let name = self.identifier()?;
        self.expect_punct(PunctuationId::LParen, "'(' after function name")?;
        let params = self.params(PunctuationId::RParen)?;
        self.expect_punct(PunctuationId::RParen, "')' after parameters")?;
        if self.match_punct(PunctuationId::Arrow) {
            self.expression()?;
        }
        self.expect_punct(PunctuationId::Colon, "':' after function signature")?;
        let body = self.block()?;
        Ok(Statement::FunctionDef(FunctionDef {
            name,
            params,
            body,
            decorators: Vec::new(),
        }))
    }

    /// `@expr` lines followed by the `def` or `class` they wrap.
    fn decorated(&mut self) -> Result<Statement, CompileError> {
        let mut decorators = Vec::new();
        while self.match_punct(PunctuationId::At) {
            decorators.push(self.expression()?);
            self.expect(&TokenKind::Newline, "a newline after the decorator")?;
            self.skip_newlines();
        }
        let mut stmt = match &self.peek().kind {
            TokenKind::Keyword(KeywordId::Def) => self.function_def()?,
            TokenKind::Keyword(KeywordId::Class) => self.class_def()?,
            _ => return Err(self.unexpected("'def' or 'class' after decorators")),
        };
        match &mut stmt {
            Statement::FunctionDef(def) => def.decorators = decorators,
            Statement::ClassDef(def) => def.decorators = decorators,
            _ => {}
        }
        Ok(stmt)
    }

    /// Parameter list up to (not including) `close`.
    ///
    /// Shared by `def` (closed by `)`, annotations allowed) and `lambda` (closed by `:`). Accepts `*args`,
    /// a bare `*` separator, keyword-only parameters and a trailing `**kwargs`.
    fn params(&mut self, close: PunctuationId) -> Result<Vec<Spanned<Param>>, CompileError> {
        let allow_annotations = close == PunctuationId::RParen;
        let mut params: Vec<Spanned<Param>> = Vec::new();
        let mut keyword_only = false;
        let mut bare_star: Option<Span> = None;

        while !self.check_punct(close) {
            let start = self.current_span().start;
            if params.last().is_some_and(|p| p.node.kind == ParamKind::VarKeyword) {
                return Err(CompileError::syntax(
                    "Parameter follows **kwargs".to_string(),
                    self.current_span(),
                ));
            }
            let kind = if self.match_op(OperatorId::StarStar) {
                ParamKind::VarKeyword
            } else if self.match_op(OperatorId::Star) {
                if keyword_only {
                    return Err(CompileError::syntax(
                        "* argument may appear only once".to_string(),
                        Span::new(start, self.previous_end()),
                    ));
                }
                keyword_only = true;
                if self.match_punct(PunctuationId::Comma) {
                    bare_star = Some(Span::new(start, start + 1));
                    continue;
                }
                ParamKind::VarPositional
            } else if keyword_only {
                ParamKind::KeywordOnly
            } else {
                ParamKind::Positional
            };
            let name = self.identifier()?;
            if params.iter().any(|p| p.node.name == name) {
                return Err(CompileError::syntax(
                    format!("Duplicate argument '{}' in function definition", name),
                    Span::new(start, self.previous_end()),
                ));
            }
            if allow_annotations && self.match_punct(PunctuationId::Colon) {
                self.expression()?;
            }
            let default = if self.match_op(OperatorId::Eq) {
                if matches!(kind, ParamKind::VarPositional | ParamKind::VarKeyword) {
                    return Err(CompileError::syntax(
                        "Variadic parameter cannot have a default value".to_string(),
                        Span::new(start, self.previous_end()),
                    ));
                }
                Some(self.expression()?)
            } else {
                None
            };
            let defaulted_before = params
                .iter()
                .any(|p| p.node.kind == ParamKind::Positional && p.node.default.is_some());
            if kind == ParamKind::Positional && default.is_none() && defaulted_before {
                return Err(CompileError::syntax(
                    "Parameter without a default follows parameter with a default".to_string(),
                    Span::new(start, self.previous_end()),
                ));
            }
            if kind == ParamKind::KeywordOnly {
                bare_star = None;
            }
            let end = self.previous_end();
            params.push(Spanned::new(Param { name, default, kind }, Span::new(start, end)));

            if !self.match_punct(PunctuationId::Comma) {
                break;
            }
        }
        if let Some(span) = bare_star {
            return Err(CompileError::syntax("Named arguments must follow bare *".to_string(), span));
        }
        Ok(params)
    }

    fn class_def(&mut self) -> Result<Statement, CompileError> {
        self.advance(); // class
        let name = self.identifier()?;
        let mut bases = Vec::new();
        if self.match_punct(PunctuationId::LParen) {
            while !self.check_punct(PunctuationId::RParen) {
                bases.push(self.expression()?);
                if !self.match_punct(PunctuationId::Comma) {
                    break;
                }
            }
            self.expect_punct(PunctuationId::RParen, "')' after base classes")?;
        }
        self.expect_punct(PunctuationId::Colon, "':' after class header")?;
        let body = self.block()?;
        Ok(Statement::ClassDef(ClassDef {
            name,
            bases,
            body,
            decorators: Vec::new(),
        }))
    }

    // ========================================================================
    // Imports
    // ========================================================================

    fn import_stmt(&mut self) -> Result<Statement, CompileError> {
        self.advance(); // import
        let module = self.dotted_name()?;
        let alias = if self.match_keyword(KeywordId::As) {
            Some(self.identifier()?)
        } else {
            None
        };
        if self.check_punct(PunctuationId::Comma) {
            return Err(CompileError::syntax(
                "Import one module per statement".to_string(),
                self.current_span(),
            ));
        }
        Ok(Statement::Import(ImportStmt { module, alias }))
    }

    fn from_import_stmt(&mut self) -> Result<Statement, CompileError> {
        self.advance(); // from
        let module = self.dotted_name()?;
        self.expect_keyword(KeywordId::Import, "'import' after module name")?;
        if self.check_op(OperatorId::Star) {
            return Err(CompileError::syntax(
                "Wildcard imports are not supported".to_string(),
                self.current_span(),
            ));
        }

        let parenthesized = self.match_punct(PunctuationId::LParen);
        let mut names = Vec::new();
        loop {
            let name = self.identifier()?;
            let alias = if self.match_keyword(KeywordId::As) {
                Some(self.identifier()?)
            } else {
                None
            };
            names.push((name, alias));
            if !self.match_punct(PunctuationId::Comma) {
                break;
            }
            if parenthesized && self.check_punct(PunctuationId::RParen) {
                break;
            }
        }
        if parenthesized {
            self.expect_punct(PunctuationId::RParen, "')' after imported names")?;
        }
        Ok(Statement::FromImport(FromImportStmt { module, names }))
    }
}
