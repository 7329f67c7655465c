/// Expression parsing.
///
/// Precedence ladder, loosest first:
/// `lambda` / conditional → `or` → `and` → `not` → comparisons (chained) → `+ -` → `* / // %` → unary `- +` →
/// `**` → postfix (call, attribute, index, slice) → primary.
impl<'a> Parser<'a> {
    // ========================================================================
    // Expressions
    // ========================================================================

    fn expression(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let outermost = self.nesting == 0;
        let expr = self.nested(Self::conditional)?;
        if outermost {
            check_depth(expr)
        } else {
            Ok(expr)
        }
    }

    /// Run one level of recursive descent, failing once [`MAX_NESTING`] levels are open.
    fn nested(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<Spanned<Expr>, CompileError>,
    ) -> Result<Spanned<Expr>, CompileError> {
        if self.nesting >= MAX_NESTING {
            return Err(CompileError::syntax(
                "too many nested parentheses".to_string(),
                self.current_span(),
            ));
        }
        self.nesting += 1;
        let result = stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, || parse(self));
        self.nesting -= 1;
        result
    }

    /// `lambda`, or an `or` expression with an optional `if ... else ...` suffix.
    fn conditional(&mut self) -> Result<Spanned<Expr>, CompileError> {
        if self.check_keyword(KeywordId::Lambda) {
            return self.lambda();
        }
        let body = self.or_expr()?;
        if !self.check_keyword(KeywordId::If) {
            return Ok(body);
        }
        self.advance(); // if
        let condition = self.or_expr()?;
        self.expect_keyword(KeywordId::Else, "'else' in conditional expression")?;
        let orelse = self.expression()?;
        let span = Span::new(body.span.start, orelse.span.end);
        Ok(Spanned::new(
            Expr::IfExp(Box::new(IfExp {
                body,
                condition,
                orelse,
            })),
            span,
        ))
    }

    /// `a, b, c` as a tuple; a single expression without a comma is returned as-is.
    fn expression_list(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let first = self.expression()?;
        if !self.check_punct(PunctuationId::Comma) {
            return Ok(first);
        }
        let start = first.span.start;
        let mut items = vec![first];
        while self.match_punct(PunctuationId::Comma) {
            if !self.is_at_expr_start() {
                break;
            }
            items.push(self.expression()?);
        }
        let end = self.previous_end();
        Ok(Spanned::new(Expr::Tuple(items), Span::new(start, end)))
    }

    fn lambda(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let start = self.current_span().start;
        self.advance(); // lambda
        let params = self.params(PunctuationId::Colon)?;
        self.expect_punct(PunctuationId::Colon, "':' after lambda parameters")?;
        let body = self.expression()?;
        let end = body.span.end;
        Ok(Spanned::new(Expr::Lambda(params, Box::new(body)), Span::new(start, end)))
    }

    fn or_expr(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let mut left = self.and_expr()?;
        while self.match_keyword(KeywordId::Or) {
            let right = self.and_expr()?;
            left = binary(left, BinaryOp::Or, right);
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let mut left = self.not_expr()?;
        while self.match_keyword(KeywordId::And) {
            let right = self.not_expr()?;
            left = binary(left, BinaryOp::And, right);
        }
        Ok(left)
    }

    fn not_expr(&mut self) -> Result<Spanned<Expr>, CompileError> {
        if self.check_keyword(KeywordId::Not) {
            let start = self.current_span().start;
            self.advance();
            let operand = self.nested(Self::not_expr)?;
            let span = Span::new(start, operand.span.end);
            return Ok(Spanned::new(Expr::Unary(UnaryOp::Not, Box::new(operand)), span));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let left = self.additive()?;
        let mut rest = Vec::new();
        while let Some(op) = self.compare_op() {
            let right = self.additive()?;
            rest.push((op, right));
        }
        if rest.is_empty() {
            return Ok(left);
        }
        let span = Span::new(left.span.start, self.previous_end());
        Ok(Spanned::new(Expr::Compare(Box::new(left), rest), span))
    }

    /// Consume a comparison operator (including `not in` / `is not`) if one is next.
    fn compare_op(&mut self) -> Option<CompareOp> {
        let op = match &self.peek().kind {
            TokenKind::Operator(OperatorId::EqEq) => CompareOp::Eq,
            TokenKind::Operator(OperatorId::NotEq) => CompareOp::NotEq,
            TokenKind::Operator(OperatorId::Lt) => CompareOp::Lt,
            TokenKind::Operator(OperatorId::LtEq) => CompareOp::LtEq,
            TokenKind::Operator(OperatorId::Gt) => CompareOp::Gt,
            TokenKind::Operator(OperatorId::GtEq) => CompareOp::GtEq,
            TokenKind::Keyword(KeywordId::In) => CompareOp::In,
            TokenKind::Keyword(KeywordId::Is) => {
                self.advance();
                return Some(if self.match_keyword(KeywordId::Not) {
                    CompareOp::IsNot
                } else {
                    CompareOp::Is
                });
            }
            TokenKind::Keyword(KeywordId::Not) if self.peek_next().kind.is_keyword(KeywordId::In) => {
                self.advance();
                CompareOp::NotIn
            }
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    fn additive(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let mut left = self.multiplicative()?;
        loop {
            let op = match &self.peek().kind {
                TokenKind::Operator(OperatorId::Plus) => BinaryOp::Add,
                TokenKind::Operator(OperatorId::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.multiplicative()?;
            left = binary(left, op, right);
        }
        Ok(left)
    }

    fn multiplicative(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let mut left = self.unary()?;
        loop {
            let op = match &self.peek().kind {
                TokenKind::Operator(OperatorId::Star) => BinaryOp::Mul,
                TokenKind::Operator(OperatorId::Slash) => BinaryOp::Div,
                TokenKind::Operator(OperatorId::SlashSlash) => BinaryOp::FloorDiv,
                TokenKind::Operator(OperatorId::Percent) => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.unary()?;
            left = binary(left, op, right);
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let op = match &self.peek().kind {
            TokenKind::Operator(OperatorId::Minus) => UnaryOp::Neg,
            TokenKind::Operator(OperatorId::Plus) => UnaryOp::Pos,
            _ => return self.power(),
        };
        let start = self.current_span().start;
        self.advance();
        let operand = self.nested(Self::unary)?;
        let span = Span::new(start, operand.span.end);
        Ok(Spanned::new(Expr::Unary(op, Box::new(operand)), span))
    }

    /// `**` binds tighter than a unary minus on its left (`-2 ** 2 == -4`) and is right-associative.
    fn power(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let base = self.postfix()?;
        if self.match_op(OperatorId::StarStar) {
            let exponent = self.nested(Self::unary)?;
            return Ok(binary(base, BinaryOp::Pow, exponent));
        }
        Ok(base)
    }

    fn postfix(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let mut expr = self.primary()?;

        loop {
            if self.match_punct(PunctuationId::Dot) {
                let name = self.identifier()?;
                let span = Span::new(expr.span.start, self.previous_end());
                expr = Spanned::new(Expr::Attribute(Box::new(expr), name), span);
            } else if self.match_punct(PunctuationId::LBracket) {
                let result = self.index_or_slice()?;
                self.expect_punct(PunctuationId::RBracket, "']' after index/slice")?;
                let span = Span::new(expr.span.start, self.previous_end());
                expr = match result {
                    IndexOrSlice::Index(index) => Spanned::new(Expr::Index(Box::new(expr), Box::new(index)), span),
                    IndexOrSlice::Slice(slice) => Spanned::new(Expr::Slice(Box::new(expr), slice), span),
                };
            } else if self.match_punct(PunctuationId::LParen) {
                let args = self.call_args()?;
                self.expect_punct(PunctuationId::RParen, "')' after arguments")?;
                let span = Span::new(expr.span.start, self.previous_end());
                expr = Spanned::new(Expr::Call(Box::new(expr), args), span);
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// Call arguments up to (not including) `)`.
    ///
    /// A lone comprehension argument (`sum(x * x for x in xs)`) is collected into a list.
    fn call_args(&mut self) -> Result<Vec<CallArg>, CompileError> {
        let mut args = Vec::new();
        while !self.check_punct(PunctuationId::RParen) {
            if self.match_op(OperatorId::StarStar) {
                args.push(CallArg::UnpackMapping(self.expression()?));
            } else if self.check_op(OperatorId::Star) {
                if args.iter().any(|a| matches!(a, CallArg::UnpackMapping(_))) {
                    return Err(CompileError::syntax(
                        "Iterable argument unpacking follows keyword argument unpacking".to_string(),
                        self.current_span(),
                    ));
                }
                self.advance(); // *
                args.push(CallArg::Unpack(self.expression()?));
            } else if matches!(self.peek().kind, TokenKind::Ident(_)) && self.peek_next().kind.is_operator(OperatorId::Eq) {
                let name = self.identifier()?;
                self.advance(); // =
                args.push(CallArg::Named(name, self.expression()?));
            } else {
                if args.iter().any(|a| matches!(a, CallArg::Named(..) | CallArg::UnpackMapping(_))) {
                    return Err(CompileError::syntax(
                        "Positional argument follows keyword argument".to_string(),
                        self.current_span(),
                    ));
                }
                let arg = self.expression()?;
                if self.check_keyword(KeywordId::For) {
                    let start = arg.span.start;
                    let comp = self.comprehension(arg, start)?;
                    args.push(CallArg::Positional(comp));
                } else {
                    args.push(CallArg::Positional(arg));
                }
            }

            if !self.match_punct(PunctuationId::Comma) {
                break;
            }
        }
        Ok(args)
    }

    /// Parse index or slice expression inside brackets
    /// Handles: [expr], [start:end], [start:end:step], [:end], [start:], [::step]
    fn index_or_slice(&mut self) -> Result<IndexOrSlice, CompileError> {
        if self.check_punct(PunctuationId::Colon) {
            return self.parse_slice(None);
        }

        if self.check_punct(PunctuationId::RBracket) {
            return Err(CompileError::syntax(
                "Empty index is not allowed".to_string(),
                self.current_span(),
            ));
        }

        let first = self.expression_list()?;

        if self.check_punct(PunctuationId::Colon) {
            return self.parse_slice(Some(first));
        }

        Ok(IndexOrSlice::Index(first))
    }

    /// Parse slice syntax after optional start expression
    /// start is already parsed, now parse [:end[:step]]
    fn parse_slice(&mut self, start: Option<Spanned<Expr>>) -> Result<IndexOrSlice, CompileError> {
        self.expect_punct(PunctuationId::Colon, "':' in slice")?;

        let end = if !self.check_punct(PunctuationId::RBracket) && !self.check_punct(PunctuationId::Colon) {
            Some(Box::new(self.expression()?))
        } else {
            None
        };

        let step = if self.match_punct(PunctuationId::Colon) && !self.check_punct(PunctuationId::RBracket) {
            Some(Box::new(self.expression()?))
        } else {
            None
        };

        Ok(IndexOrSlice::Slice(SliceExpr {
            start: start.map(Box::new),
            end,
            step,
        }))
    }

    fn primary(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let start = self.current_span().start;

        if let Some(lit) = self.try_literal() {
            let end = self.previous_end();
            return Ok(Spanned::new(Expr::Literal(lit), Span::new(start, end)));
        }

        if let TokenKind::FString(parts) = &self.peek().kind {
            let parts = parts.clone();
            self.advance();
            let fparts = self.convert_fstring_parts(&parts)?;
            let end = self.previous_end();
            return Ok(Spanned::new(Expr::FString(fparts), Span::new(start, end)));
        }

        if self.match_punct(PunctuationId::LBracket) {
            return self.list_or_comp(start);
        }

        if self.match_punct(PunctuationId::LBrace) {
            return self.dict_or_set(start);
        }

        if self.match_punct(PunctuationId::LParen) {
            return self.paren_or_tuple(start);
        }

        if let TokenKind::Ident(name) = &self.peek().kind {
            let name = name.clone();
            self.advance();
            let end = self.previous_end();
            return Ok(Spanned::new(Expr::Name(name), Span::new(start, end)));
        }

        if let TokenKind::Keyword(
            id @ (KeywordId::Yield | KeywordId::Await | KeywordId::Async | KeywordId::Del | KeywordId::With),
        ) = &self.peek().kind
        {
            return Err(self.unsupported_keyword(*id));
        }

        Err(self.unexpected("expression"))
    }

    fn try_literal(&mut self) -> Option<Literal> {
        let lit = match &self.peek().kind {
            TokenKind::Int(n) => Literal::Int(*n),
            TokenKind::BigInt { digits, radix } => Literal::BigInt {
                digits: digits.clone(),
                radix: *radix,
            },
            TokenKind::Float(f) => Literal::Float(*f),
            TokenKind::String(s) => {
                // Adjacent string literals concatenate: `"a" "b"`.
                let mut value = s.clone();
                self.advance();
                while let TokenKind::String(next) = &self.peek().kind {
                    value.push_str(next);
                    self.advance();
                }
                return Some(Literal::Str(value));
            }
            TokenKind::Keyword(KeywordId::True) => Literal::Bool(true),
            TokenKind::Keyword(KeywordId::False) => Literal::Bool(false),
            // `...` only appears as a placeholder body; it evaluates to nothing useful.
            TokenKind::Keyword(KeywordId::None) | TokenKind::Punctuation(PunctuationId::Ellipsis) => Literal::None,
            _ => return None,
        };
        self.advance();
        Some(lit)
    }

    fn list_or_comp(&mut self, start: usize) -> Result<Spanned<Expr>, CompileError> {
        if self.match_punct(PunctuationId::RBracket) {
            return Ok(Spanned::new(Expr::List(Vec::new()), Span::new(start, self.previous_end())));
        }

        let first = self.expression()?;
        if self.check_keyword(KeywordId::For) {
            let comp = self.comprehension(first, start)?;
            self.expect_punct(PunctuationId::RBracket, "']' after list comprehension")?;
            return Ok(Spanned::new(comp.node, Span::new(start, self.previous_end())));
        }

        let mut items = vec![first];
        while self.match_punct(PunctuationId::Comma) {
            if self.check_punct(PunctuationId::RBracket) {
                break;
            }
            items.push(self.expression()?);
        }
        self.expect_punct(PunctuationId::RBracket, "']' after list elements")?;
        Ok(Spanned::new(Expr::List(items), Span::new(start, self.previous_end())))
    }

    /// `for target in iter [if cond]...` after the element expression of a list comprehension.
    fn comprehension(&mut self, expr: Spanned<Expr>, start: usize) -> Result<Spanned<Expr>, CompileError> {
        let clauses = self.comp_clauses()?;
        let end = self.previous_end();
        Ok(Spanned::new(
            Expr::ListComp(Box::new(ListComp { expr, clauses })),
            Span::new(start, end),
        ))
    }

    /// One or more `for` clauses, outermost first.
    fn comp_clauses(&mut self) -> Result<Vec<CompClause>, CompileError> {
        let mut clauses = vec![self.comp_clause()?];
        while self.check_keyword(KeywordId::For) {
            clauses.push(self.comp_clause()?);
        }
        Ok(clauses)
    }

    /// Shared `for ... in ... if ...` clause. Several `if`s are joined with `and`.
    fn comp_clause(&mut self) -> Result<CompClause, CompileError> {
        self.expect_keyword(KeywordId::For, "'for' in comprehension")?;
        let target = self.target_list()?;
        self.expect_keyword(KeywordId::In, "'in' in comprehension")?;
        let iter = self.or_expr()?;

        let mut filter: Option<Spanned<Expr>> = None;
        while self.match_keyword(KeywordId::If) {
            let cond = self.or_expr()?;
            filter = Some(match filter {
                Some(prev) => binary(prev, BinaryOp::And, cond),
                None => cond,
            });
        }

        Ok(CompClause { target, iter, filter })
    }

    fn dict_or_set(&mut self, start: usize) -> Result<Spanned<Expr>, CompileError> {
        if self.match_punct(PunctuationId::RBrace) {
            return Ok(Spanned::new(Expr::Dict(Vec::new()), Span::new(start, self.previous_end())));
        }

        let first = self.expression()?;

        if !self.match_punct(PunctuationId::Colon) {
            if self.check_keyword(KeywordId::For) {
                let clauses = self.comp_clauses()?;
                self.expect_punct(PunctuationId::RBrace, "'}' after set comprehension")?;
                return Ok(Spanned::new(
                    Expr::SetComp(Box::new(ListComp { expr: first, clauses })),
                    Span::new(start, self.previous_end()),
                ));
            }
            let mut items = vec![first];
            while self.match_punct(PunctuationId::Comma) {
                if self.check_punct(PunctuationId::RBrace) {
                    break;
                }
                items.push(self.expression()?);
            }
            self.expect_punct(PunctuationId::RBrace, "'}' after set elements")?;
            return Ok(Spanned::new(Expr::Set(items), Span::new(start, self.previous_end())));
        }

        let value = self.expression()?;
        if self.check_keyword(KeywordId::For) {
            let clauses = self.comp_clauses()?;
            self.expect_punct(PunctuationId::RBrace, "'}' after dict comprehension")?;
            return Ok(Spanned::new(
                Expr::DictComp(Box::new(DictComp {
                    key: first,
                    value,
                    clauses,
                })),
                Span::new(start, self.previous_end()),
            ));
        }

        let mut entries = vec![(first, value)];
        while self.match_punct(PunctuationId::Comma) {
            if self.check_punct(PunctuationId::RBrace) {
                break;
            }
            let key = self.expression()?;
            self.expect_punct(PunctuationId::Colon, "':' after dict key")?;
            let value = self.expression()?;
            entries.push((key, value));
        }
        self.expect_punct(PunctuationId::RBrace, "'}' after dict entries")?;
        Ok(Spanned::new(Expr::Dict(entries), Span::new(start, self.previous_end())))
    }

    fn paren_or_tuple(&mut self, start: usize) -> Result<Spanned<Expr>, CompileError> {
        if self.match_punct(PunctuationId::RParen) {
            return Ok(Spanned::new(Expr::Tuple(Vec::new()), Span::new(start, self.previous_end())));
        }

        let first = self.expression()?;

        if self.check_keyword(KeywordId::For) {
            let comp = self.comprehension(first, start)?;
            self.expect_punct(PunctuationId::RParen, "')' after generator expression")?;
            return Ok(Spanned::new(comp.node, Span::new(start, self.previous_end())));
        }

        if !self.check_punct(PunctuationId::Comma) {
            self.expect_punct(PunctuationId::RParen, "')' after expression")?;
            // Keep the inner node but widen the span to cover the parentheses.
            return Ok(Spanned::new(first.node, Span::new(start, self.previous_end())));
        }

        let mut items = vec![first];
        while self.match_punct(PunctuationId::Comma) {
            if self.check_punct(PunctuationId::RParen) {
                break;
            }
            items.push(self.expression()?);
        }
        self.expect_punct(PunctuationId::RParen, "')' after tuple elements")?;
        Ok(Spanned::new(Expr::Tuple(items), Span::new(start, self.previous_end())))
    }

    // ========================================================================
    // f-strings
    // ========================================================================

    fn convert_fstring_parts(&self, parts: &[LexFStringPart]) -> Result<Vec<FStringPart>, CompileError> {
        parts
            .iter()
            .map(|p| match p {
                LexFStringPart::Literal(s) => Ok(FStringPart::Literal(s.clone())),
                LexFStringPart::Expr { text, offset } => parse_fstring_field(text, *offset),
            })
            .collect()
    }
}

/// Reject trees deeper than [`MAX_EXPR_DEPTH`] (long operator chains such as `1 + 1 + ... + 1`).
fn check_depth(expr: Spanned<Expr>) -> Result<Spanned<Expr>, CompileError> {
    let depth = expr_depth(&expr);
    if depth <= MAX_EXPR_DEPTH {
        return Ok(expr);
    }
    let span = expr.span;
    // Dropping the tree recurses once per level.
    stacker::grow(depth.saturating_mul(1024).max(STACK_SEGMENT), move || drop(expr));
    Err(CompileError::syntax("expression too deeply nested".to_string(), span)
        .with_hint("split the expression over several statements"))
}

/// Height of an expression tree, computed without recursion.
fn expr_depth(root: &Spanned<Expr>) -> usize {
    let mut deepest = 0;
    let mut pending = vec![(root, 1usize)];
    while let Some((expr, depth)) = pending.pop() {
        deepest = deepest.max(depth);
        visit_children(&expr.node, &mut |child| pending.push((child, depth + 1)));
    }
    deepest
}

/// Call `f` on every direct sub-expression of `expr`.
fn visit_children<'e>(expr: &'e Expr, f: &mut impl FnMut(&'e Spanned<Expr>)) {
    match expr {
        Expr::Name(_) | Expr::Literal(_) => {}
        Expr::Binary(left, _, right) | Expr::Index(left, right) => {
            f(left);
            f(right);
        }
        Expr::Unary(_, operand) | Expr::Attribute(operand, _) => f(operand),
        Expr::Compare(left, rest) => {
            f(left);
            rest.iter().for_each(|(_, e)| f(e));
        }
        Expr::Call(callee, args) => {
            f(callee);
            for arg in args {
                match arg {
                    CallArg::Positional(e) | CallArg::Named(_, e) | CallArg::Unpack(e) | CallArg::UnpackMapping(e) => f(e),
                }
            }
        }
        Expr::Slice(value, slice) => {
            f(value);
            [&slice.start, &slice.end, &slice.step].into_iter().flatten().for_each(|e| f(e));
        }
        Expr::IfExp(ifexp) => {
            f(&ifexp.body);
            f(&ifexp.condition);
            f(&ifexp.orelse);
        }
        Expr::Lambda(params, body) => {
            params.iter().filter_map(|p| p.node.default.as_ref()).for_each(|e| f(e));
            f(body);
        }
        Expr::Tuple(items) | Expr::List(items) | Expr::Set(items) => items.iter().for_each(|e| f(e)),
        Expr::Dict(entries) => entries.iter().for_each(|(k, v)| {
            f(k);
            f(v);
        }),
        Expr::ListComp(comp) | Expr::SetComp(comp) => {
            f(&comp.expr);
            visit_clauses(&comp.clauses, f);
        }
        Expr::DictComp(comp) => {
            f(&comp.key);
            f(&comp.value);
            visit_clauses(&comp.clauses, f);
        }
        Expr::FString(parts) => parts.iter().for_each(|part| {
            if let FStringPart::Expr { expr, .. } = part {
                f(expr);
            }
        }),
    }
}

fn visit_clauses<'e>(clauses: &'e [CompClause], f: &mut impl FnMut(&'e Spanned<Expr>)) {
    for clause in clauses {
        f(&clause.iter);
        if let Some(filter) = &clause.filter {
            f(filter);
        }
    }
}

/// Build a binary node spanning both operands.
fn binary(left: Spanned<Expr>, op: BinaryOp, right: Spanned<Expr>) -> Spanned<Expr> {
    let span = left.span.merge(right.span);
    Spanned::new(Expr::Binary(Box::new(left), op, Box::new(right)), span)
}

/// Parse one `{expr!conv:spec}` replacement field. `offset` is the byte offset of `expr` in the module source.
fn parse_fstring_field(text: &str, offset: usize) -> Result<FStringPart, CompileError> {
    let (expr_text, conversion, spec) = split_fstring_field(text);
    let field_span = Span::new(offset, offset + text.len());

    let trimmed = expr_text.trim_start();
    let shift = offset + (expr_text.len() - trimmed.len());
    let trimmed = trimmed.trim_end();
    if trimmed.is_empty() {
        return Err(CompileError::syntax(
            "f-string: empty expression not allowed".to_string(),
            field_span,
        ));
    }

    let shift_span = |span: Span| Span::new(span.start + shift, span.end + shift);
    let mut tokens = lexer::lex(trimmed).map_err(|mut errors| {
        let mut err = errors.remove(0);
        err.span = shift_span(err.span);
        err
    })?;
    for token in &mut tokens {
        token.span = shift_span(token.span);
    }

    let mut parser = Parser::new(&tokens);
    let expr = parser.expression()?;
    parser.skip_newlines();
    if !parser.is_at_end() {
        return Err(parser.unexpected("'}' after f-string expression"));
    }

    if let Some(c) = conversion.filter(|c| !matches!(c, 'r' | 's' | 'a')) {
        return Err(CompileError::syntax(
            format!("f-string: invalid conversion character '{}'", c),
            field_span,
        )
        .with_hint("expected 'r', 's' or 'a'"));
    }

    Ok(FStringPart::Expr { expr, conversion, spec })
}

/// Split `expr!r:>10` into the expression text, conversion and format spec.
///
/// Only top-level `!` and `:` count; brackets and nested string literals are skipped. `!=` is an operator.
fn split_fstring_field(text: &str) -> (&str, Option<char>, Option<String>) {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string: Option<u8> = None;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = in_string {
            if b == q {
                in_string = None;
            }
            i += 1;
            continue;
        }
        match b {
            b'\'' | b'"' => in_string = Some(b),
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b'!' if depth == 0 && bytes.get(i + 1) != Some(&b'=') => {
                let rest = &text[i + 1..];
                let mut chars = rest.chars();
                let conversion = chars.next();
                let after = chars.as_str();
                let spec = after.strip_prefix(':').map(str::to_string);
                return (&text[..i], conversion, spec);
            }
            b':' if depth == 0 => {
                return (&text[..i], None, Some(text[i + 1..].to_string()));
            }
            _ => {}
        }
        i += 1;
    }
    (text, None, None)
}
