//! Type expression parsing.

use crate::ast::*;
use crate::Parser;
use mkc_lex::TokenKind;

impl<'a> Parser<'a> {
    /// `Int` | `Name` | `Name<args>` | `fn(params) -> ret uses { ... }`
    pub(crate) fn parse_type(&mut self) -> Option<TypeExpr> {
        let span = self.current_span();
        match self.current_kind() {
            TokenKind::Fn => self.parse_fn_type(),
            TokenKind::Ident(name) => {
                let name = *name;
                self.advance();

                if let Some(prim) = PrimitiveType::parse(name.as_str()) {
                    return Some(TypeExpr::Primitive(prim, span));
                }

                if self.match_token(&TokenKind::Lt) {
                    let mut args = Vec::new();
                    loop {
                        args.push(self.parse_type()?);
                        if !self.match_token(&TokenKind::Comma) {
                            break;
                        }
                    }
                    let end = self.expect(TokenKind::Gt)?;
                    return Some(TypeExpr::Generic {
                        name,
                        args,
                        span: span.merge(end),
                    });
                }

                Some(TypeExpr::Named { name, span })
            }
            _ => {
                self.error_expected("a type");
                None
            }
        }
    }

    /// `fn(Int, String) -> Bool uses { http }`
    fn parse_fn_type(&mut self) -> Option<TypeExpr> {
        let start = self.current_span();
        self.expect(TokenKind::Fn)?;
        self.expect(TokenKind::LParen)?;

        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                params.push(self.parse_type()?);
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::Arrow)?;
        let ret = self.parse_type()?;
        let effects = self.parse_uses_clause()?;

        let span = start.merge(ret.span());
        Some(TypeExpr::Function {
            params,
            ret: Box::new(ret),
            effects,
            span,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Decl, Parser};
    use mkc_lex::Lexer;
    use mkc_util::{FileId, Handler};

    fn parse_return_type(ty: &str) -> (TypeExpr, Handler) {
        let src = format!("fn f() -> {ty} {{ x }}");
        let handler = Handler::new();
        let tokens = Lexer::new(&src, FileId::DUMMY, &handler).tokenize();
        let program = Parser::new(tokens, &handler).parse();
        let Some(Decl::Function(func)) = program.decls.first() else {
            panic!("expected function, got errors: {:?}", handler.diagnostics());
        };
        (func.ret_type.clone(), handler)
    }

    #[test]
    fn primitives_parse_to_primitive_types() {
        for (name, prim) in [
            ("Int", PrimitiveType::Int),
            ("Bool", PrimitiveType::Bool),
            ("String", PrimitiveType::String),
            ("Unit", PrimitiveType::Unit),
        ] {
            let (ty, handler) = parse_return_type(name);
            assert!(!handler.has_errors());
            assert!(matches!(ty, TypeExpr::Primitive(p, _) if p == prim));
        }
    }

    #[test]
    fn named_type_parses() {
        let (ty, handler) = parse_return_type("Response");
        assert!(!handler.has_errors());
        assert!(matches!(ty, TypeExpr::Named { name, .. } if name.as_str() == "Response"));
    }

    #[test]
    fn generic_instantiations_parse_with_nested_args() {
        let (ty, handler) = parse_return_type("Map<String, List<Int>>");
        assert!(!handler.has_errors(), "{:?}", handler.diagnostics());
        let TypeExpr::Generic { name, args, .. } = ty else {
            panic!("expected generic");
        };
        assert_eq!(name.as_str(), "Map");
        assert_eq!(args.len(), 2);
        assert!(matches!(&args[1], TypeExpr::Generic { name, args, .. }
            if name.as_str() == "List" && args.len() == 1));
    }

    #[test]
    fn function_types_carry_effect_annotations() {
        let (ty, handler) = parse_return_type("fn(Int) -> String uses { http }");
        assert!(!handler.has_errors(), "{:?}", handler.diagnostics());
        let TypeExpr::Function {
            params,
            ret,
            effects,
            ..
        } = ty
        else {
            panic!("expected function type");
        };
        assert_eq!(params.len(), 1);
        assert!(matches!(*ret, TypeExpr::Primitive(PrimitiveType::String, _)));
        assert_eq!(effects.len(), 1);
        assert_eq!(effects[0].name.as_str(), "http");
    }
}
