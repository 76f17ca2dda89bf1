//! Expression and pattern parsing.
//!
//! Precedence tiers, lowest to highest: pipe `|>`, `||`, `&&`, equality,
//! ordering, additive, multiplicative, unary, call/field access. All
//! binary tiers are left-associative.

use crate::ast::*;
use crate::Parser;
use mkc_lex::TokenKind;
use mkc_util::Symbol;

impl<'a> Parser<'a> {
    pub(crate) fn parse_expr(&mut self) -> Option<Expr> {
        self.parse_pipe()
    }

    /// `a |> f |> g` desugars structurally; lowering turns it into `g(f(a))`.
    fn parse_pipe(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_or()?;
        while self.match_token(&TokenKind::PipeGt) {
            let rhs = self.parse_or()?;
            let span = lhs.span().merge(rhs.span());
            lhs = Expr::Pipe(PipeExpr {
                value: Box::new(lhs),
                func: Box::new(rhs),
                span,
            });
        }
        Some(lhs)
    }

    fn parse_or(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_and()?;
        while self.match_token(&TokenKind::OrOr) {
            let rhs = self.parse_and()?;
            lhs = Self::binary(BinOp::Or, lhs, rhs);
        }
        Some(lhs)
    }

    fn parse_and(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_equality()?;
        while self.match_token(&TokenKind::AndAnd) {
            let rhs = self.parse_equality()?;
            lhs = Self::binary(BinOp::And, lhs, rhs);
        }
        Some(lhs)
    }

    fn parse_equality(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_comparison()?;
        loop {
            let op = match self.current_kind() {
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::NotEq => BinOp::Ne,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_comparison()?;
            lhs = Self::binary(op, lhs, rhs);
        }
        Some(lhs)
    }

    fn parse_comparison(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.current_kind() {
                TokenKind::Lt => BinOp::Lt,
                TokenKind::LtEq => BinOp::LtEq,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::GtEq => BinOp::GtEq,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_additive()?;
            lhs = Self::binary(op, lhs, rhs);
        }
        Some(lhs)
    }

    fn parse_additive(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.current_kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_multiplicative()?;
            lhs = Self::binary(op, lhs, rhs);
        }
        Some(lhs)
    }

    fn parse_multiplicative(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.current_kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Rem,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = Self::binary(op, lhs, rhs);
        }
        Some(lhs)
    }

    fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
        let span = lhs.span().merge(rhs.span());
        Expr::Binary(BinaryExpr {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            span,
        })
    }

    fn parse_unary(&mut self) -> Option<Expr> {
        let op = match self.current_kind() {
            TokenKind::Minus => UnOp::Neg,
            TokenKind::Bang => UnOp::Not,
            _ => return self.parse_postfix(),
        };
        let start = self.current_span();
        self.advance();
        let operand = self.parse_unary()?;
        let span = start.merge(operand.span());
        Some(Expr::Unary(UnaryExpr {
            op,
            operand: Box::new(operand),
            span,
        }))
    }

    /// Calls and field access bind tightest: `a.b.c(x)(y)`.
    fn parse_postfix(&mut self) -> Option<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.current_kind() {
                TokenKind::LParen => {
                    self.advance();
                    let mut args = Vec::new();
                    if !self.check(&TokenKind::RParen) {
                        loop {
                            args.push(self.parse_expr()?);
                            if !self.match_token(&TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    let end = self.expect(TokenKind::RParen)?;
                    let span = expr.span().merge(end);
                    expr = Expr::Call(CallExpr {
                        callee: Box::new(expr),
                        args,
                        span,
                    });
                }
                TokenKind::Dot => {
                    self.advance();
                    let (field, field_span) = self.parse_ident()?;
                    let span = expr.span().merge(field_span);
                    expr = Expr::Field(FieldExpr {
                        object: Box::new(expr),
                        field,
                        span,
                    });
                }
                _ => break,
            }
        }
        Some(expr)
    }

    fn parse_primary(&mut self) -> Option<Expr> {
        let span = self.current_span();
        match self.current_kind().clone() {
            TokenKind::Int(value) => {
                self.advance();
                Some(Expr::Literal(Literal {
                    kind: LiteralKind::Int(value),
                    span,
                }))
            }
            TokenKind::Str(value) => {
                self.advance();
                Some(Expr::Literal(Literal {
                    kind: LiteralKind::Str(value),
                    span,
                }))
            }
            TokenKind::Bool(value) => {
                self.advance();
                Some(Expr::Literal(Literal {
                    kind: LiteralKind::Bool(value),
                    span,
                }))
            }
            TokenKind::Ident(name) => {
                self.advance();
                Some(Expr::Ident(IdentExpr { name, span }))
            }
            // Prelude constructor keywords act as ordinary names in
            // expression position.
            TokenKind::SomeKw | TokenKind::NoneKw | TokenKind::OkKw | TokenKind::ErrKw => {
                let name = Symbol::intern(&self.current().text);
                self.advance();
                Some(Expr::Ident(IdentExpr { name, span }))
            }
            TokenKind::If => self.parse_if_expr().map(Expr::If),
            TokenKind::Match => self.parse_match_expr().map(Expr::Match),
            TokenKind::Pipe | TokenKind::OrOr => self.parse_lambda().map(Expr::Lambda),
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Some(inner)
            }
            _ => {
                self.error_unexpected("an expression");
                None
            }
        }
    }

    /// `if cond { ... }` with optional `else { ... }`.
    pub(crate) fn parse_if_expr(&mut self) -> Option<IfExpr> {
        let start = self.current_span();
        self.expect(TokenKind::If)?;

        let cond = self.parse_expr()?;
        let then_block = self.parse_block()?;

        let else_block = if self.match_token(&TokenKind::Else) {
            Some(self.parse_block()?)
        } else {
            None
        };

        let end = else_block
            .as_ref()
            .map_or(then_block.span, |block| block.span);
        Some(IfExpr {
            cond: Box::new(cond),
            then_block,
            else_block,
            span: start.merge(end),
        })
    }

    /// `match scrutinee { pattern -> expr ... }` - arms may optionally be
    /// separated by commas.
    pub(crate) fn parse_match_expr(&mut self) -> Option<MatchExpr> {
        let start = self.current_span();
        self.expect(TokenKind::Match)?;

        let scrutinee = self.parse_expr()?;
        self.expect(TokenKind::LBrace)?;

        let mut arms = Vec::new();
        while !self.at_eof() && !self.check(&TokenKind::RBrace) {
            let before = self.position_marker();
            if let Some(arm) = self.parse_match_arm() {
                arms.push(arm);
            } else {
                self.recover_to_sync_point();
            }
            self.match_token(&TokenKind::Comma);
            if self.position_marker() == before {
                self.advance();
            }
        }
        let end = self.expect(TokenKind::RBrace)?;

        Some(MatchExpr {
            scrutinee: Box::new(scrutinee),
            arms,
            span: start.merge(end),
        })
    }

    fn parse_match_arm(&mut self) -> Option<MatchArm> {
        let pattern = self.parse_pattern()?;
        self.expect(TokenKind::Arrow)?;
        let body = self.parse_expr()?;
        let span = pattern.span().merge(body.span());
        Some(MatchArm {
            pattern,
            body,
            span,
        })
    }

    /// `name`, `name(sub, patterns)`, or `_`.
    pub(crate) fn parse_pattern(&mut self) -> Option<Pattern> {
        let span = self.current_span();
        let name = match self.current_kind() {
            TokenKind::Underscore => {
                self.advance();
                return Some(Pattern::Wildcard(span));
            }
            TokenKind::Ident(name) => *name,
            TokenKind::SomeKw | TokenKind::NoneKw | TokenKind::OkKw | TokenKind::ErrKw => {
                Symbol::intern(&self.current().text)
            }
            _ => {
                self.error_unexpected("a pattern");
                return None;
            }
        };
        self.advance();

        let mut fields = Vec::new();
        let mut end = span;
        if self.match_token(&TokenKind::LParen) {
            if !self.check(&TokenKind::RParen) {
                loop {
                    fields.push(self.parse_pattern()?);
                    if !self.match_token(&TokenKind::Comma) {
                        break;
                    }
                }
            }
            end = self.expect(TokenKind::RParen)?;
        }

        Some(Pattern::Ctor(CtorPattern {
            name,
            fields,
            span: span.merge(end),
        }))
    }

    /// `|a, b| body` or `|| body`. Lambdas are always pure.
    fn parse_lambda(&mut self) -> Option<LambdaExpr> {
        let start = self.current_span();

        let mut params = Vec::new();
        if self.match_token(&TokenKind::OrOr) {
            // `||` lexes as logical-or; in primary position it is an empty
            // parameter list.
        } else {
            self.expect(TokenKind::Pipe)?;
            if !self.check(&TokenKind::Pipe) {
                loop {
                    let (param, _) = self.parse_ident()?;
                    params.push(param);
                    if !self.match_token(&TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.expect(TokenKind::Pipe)?;
        }

        let body = self.parse_expr()?;
        let span = start.merge(body.span());
        Some(LambdaExpr {
            params,
            body: Box::new(body),
            span,
        })
    }
}
