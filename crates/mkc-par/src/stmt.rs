//! Block and statement parsing.
//!
//! A block is `{ stmt* expr? }`. Each element is parsed as a statement
//! unless it is the last thing before the closing brace, in which case it
//! becomes the block's tail expression (`if`/`match` included). `let`
//! can never be a tail.

use crate::ast::*;
use crate::Parser;
use mkc_lex::TokenKind;

impl<'a> Parser<'a> {
    pub(crate) fn parse_block(&mut self) -> Option<Block> {
        let start = self.expect(TokenKind::LBrace)?;

        let mut stmts = Vec::new();
        let mut tail = None;

        while !self.at_eof() && !self.check(&TokenKind::RBrace) {
            let before = self.position_marker();

            match self.current_kind() {
                TokenKind::Let => match self.parse_let_stmt() {
                    Some(stmt) => stmts.push(Stmt::Let(stmt)),
                    None => self.recover_to_sync_point(),
                },
                TokenKind::If => match self.parse_if_expr() {
                    Some(if_expr) => {
                        if self.check(&TokenKind::RBrace) {
                            tail = Some(Box::new(Expr::If(if_expr)));
                        } else {
                            stmts.push(Stmt::If(if_expr));
                        }
                    }
                    None => self.recover_to_sync_point(),
                },
                TokenKind::Match => match self.parse_match_expr() {
                    Some(match_expr) => {
                        if self.check(&TokenKind::RBrace) {
                            tail = Some(Box::new(Expr::Match(match_expr)));
                        } else {
                            stmts.push(Stmt::Match(match_expr));
                        }
                    }
                    None => self.recover_to_sync_point(),
                },
                _ => match self.parse_expr() {
                    Some(expr) => {
                        if self.check(&TokenKind::RBrace) {
                            tail = Some(Box::new(expr));
                        } else {
                            stmts.push(Stmt::Expr(expr));
                        }
                    }
                    None => self.recover_to_sync_point(),
                },
            }

            // Stray separators between statements are tolerated.
            self.match_token(&TokenKind::Semicolon);

            if self.position_marker() == before {
                self.advance();
            }
        }

        let end = self.expect(TokenKind::RBrace)?;
        Some(Block {
            stmts,
            tail,
            span: start.merge(end),
        })
    }

    /// `let name = expr` - immutable; redeclaration is rejected during
    /// semantic analysis, not here.
    fn parse_let_stmt(&mut self) -> Option<LetStmt> {
        let start = self.current_span();
        self.expect(TokenKind::Let)?;

        let (name, _) = self.parse_ident()?;
        self.expect(TokenKind::Eq)?;
        let value = self.parse_expr()?;

        let span = start.merge(value.span());
        Some(LetStmt { name, value, span })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Parser;
    use mkc_lex::Lexer;
    use mkc_util::{FileId, Handler, Symbol};

    fn parse_fn_body(body: &str) -> (Block, Handler) {
        let src = format!("fn f() -> Int {body}");
        let handler = Handler::new();
        let tokens = Lexer::new(&src, FileId::DUMMY, &handler).tokenize();
        let program = Parser::new(tokens, &handler).parse();
        let Decl::Function(func) = &program.decls[0] else {
            panic!("expected function");
        };
        (func.body.clone(), handler)
    }

    #[test]
    fn tail_expression_is_separated_from_statements() {
        let (block, handler) = parse_fn_body("{ let x = 1 f(x) x + 1 }");
        assert!(!handler.has_errors(), "{:?}", handler.diagnostics());
        assert_eq!(block.stmts.len(), 2);
        assert!(matches!(block.stmts[0], Stmt::Let(_)));
        assert!(matches!(block.stmts[1], Stmt::Expr(Expr::Call(_))));
        assert!(matches!(block.tail.as_deref(), Some(Expr::Binary(_))));
    }

    #[test]
    fn block_without_tail_has_none() {
        let (block, handler) = parse_fn_body("{ let x = 1 }");
        assert!(!handler.has_errors());
        assert_eq!(block.stmts.len(), 1);
        assert!(block.tail.is_none());
    }

    #[test]
    fn if_in_tail_position_becomes_tail_expression() {
        let (block, handler) = parse_fn_body("{ if true { 1 } else { 2 } }");
        assert!(!handler.has_errors(), "{:?}", handler.diagnostics());
        assert!(block.stmts.is_empty());
        assert!(matches!(block.tail.as_deref(), Some(Expr::If(_))));
    }

    #[test]
    fn if_before_other_statements_is_a_statement() {
        let (block, handler) = parse_fn_body("{ if c { f() } 42 }");
        assert!(!handler.has_errors(), "{:?}", handler.diagnostics());
        assert_eq!(block.stmts.len(), 1);
        assert!(matches!(block.stmts[0], Stmt::If(_)));
        assert!(block.tail.is_some());
    }

    #[test]
    fn match_in_tail_position_becomes_tail_expression() {
        let (block, handler) = parse_fn_body("{ match x { a -> 1 _ -> 2 } }");
        assert!(!handler.has_errors(), "{:?}", handler.diagnostics());
        assert!(matches!(block.tail.as_deref(), Some(Expr::Match(_))));
    }

    #[test]
    fn let_binds_name_to_expression() {
        let (block, _) = parse_fn_body("{ let total = a + b total }");
        let Stmt::Let(stmt) = &block.stmts[0] else {
            panic!("expected let");
        };
        assert_eq!(stmt.name, Symbol::intern("total"));
        assert!(matches!(stmt.value, Expr::Binary(_)));
    }
}
