//! mkc-par - Recursive-descent parser for `.mk` source.
//!
//! Consumes the token stream produced by `mkc-lex` and builds the AST
//! defined in [`ast`]. One token of lookahead; operator precedence is
//! handled by one function per precedence tier (lowest to highest: pipe,
//! logical or, logical and, equality, ordering, additive, multiplicative,
//! unary, call/field access).
//!
//! # Error strategy
//!
//! The parser never raises: on an unexpected token it reports exactly what
//! was expected and what was found, then skips to a synchronization token
//! (`;`, a closing `}`, or a top-level keyword) and resumes. Productions
//! return `Option`; `None` means the production gave up and the caller
//! should recover. Later phases treat the presence of parser errors as a
//! signal to skip semantic work.
//!
//! # Examples
//!
//! ```
//! use mkc_lex::Lexer;
//! use mkc_par::Parser;
//! use mkc_util::{FileId, Handler};
//!
//! let handler = Handler::new();
//! let tokens = Lexer::new("fn main() -> Int { 0 }", FileId::DUMMY, &handler).tokenize();
//! let program = Parser::new(tokens, &handler).parse();
//!
//! assert!(!handler.has_errors());
//! assert_eq!(program.decls.len(), 1);
//! ```

pub mod ast;
mod expr;
mod stmt;
mod types;

pub use ast::*;

use mkc_lex::{Token, TokenKind};
use mkc_util::{Diagnostic, DiagnosticCode, Handler, Span, Symbol};

pub struct Parser<'a> {
    /// Token stream ending with EOF
    tokens: Vec<Token>,
    /// Current position in the token stream
    position: usize,
    /// Error handler
    handler: &'a Handler,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token>, handler: &'a Handler) -> Self {
        debug_assert!(tokens.last().is_some_and(Token::is_eof));
        Self {
            tokens,
            position: 0,
            handler,
        }
    }

    /// Parse a complete translation unit.
    pub fn parse(&mut self) -> Program {
        let mut program = Program::default();

        while !self.at_eof() {
            let before = self.position;
            match self.current_kind() {
                TokenKind::Module => {
                    if let Some(module) = self.parse_module() {
                        program.modules.push(module);
                    }
                }
                TokenKind::Api => {
                    if let Some(route) = self.parse_api_route() {
                        program.routes.push(route);
                    }
                }
                TokenKind::Fn | TokenKind::Type | TokenKind::Effect | TokenKind::Import => {
                    if let Some(decl) = self.parse_decl() {
                        program.decls.push(decl);
                    }
                }
                _ => {
                    self.error_unexpected("a `module`, `api`, or declaration");
                    self.advance();
                    self.recover_to_sync_point();
                }
            }
            if self.position == before {
                // A production consumed nothing; force progress.
                self.advance();
            }
        }

        program
    }

    // ------------------------------------------------------------------
    // Top-level declarations
    // ------------------------------------------------------------------

    /// `module a.b { decl* }`
    fn parse_module(&mut self) -> Option<ModuleDecl> {
        let start = self.current_span();
        self.expect(TokenKind::Module)?;

        let name = self.parse_dotted_name()?;
        self.expect(TokenKind::LBrace)?;

        let mut decls = Vec::new();
        while !self.at_eof() && !self.check(&TokenKind::RBrace) {
            let before = self.position;
            match self.parse_decl() {
                Some(decl) => decls.push(decl),
                None => self.recover_to_sync_point(),
            }
            if self.position == before {
                self.advance();
            }
        }

        let end = self.current_span();
        self.expect(TokenKind::RBrace)?;

        Some(ModuleDecl {
            name,
            decls,
            span: start.merge(end),
        })
    }

    /// A declaration inside a module (or at top level).
    fn parse_decl(&mut self) -> Option<Decl> {
        match self.current_kind() {
            TokenKind::Fn => self.parse_function().map(Decl::Function),
            TokenKind::Type => self.parse_type_decl().map(Decl::Type),
            TokenKind::Effect => self.parse_effect_decl().map(Decl::Effect),
            TokenKind::Import => self.parse_import_decl().map(Decl::Import),
            _ => {
                self.error_unexpected("a declaration (`fn`, `type`, `effect`, or `import`)");
                None
            }
        }
    }

    /// `fn name(params) -> type uses { effects } block`
    fn parse_function(&mut self) -> Option<FunctionDecl> {
        let start = self.current_span();
        self.expect(TokenKind::Fn)?;

        let (name, _) = self.parse_ident()?;
        let params = self.parse_params()?;
        self.expect(TokenKind::Arrow)?;
        let ret_type = self.parse_type()?;
        let effects = self.parse_uses_clause()?;
        let body = self.parse_block()?;

        Some(FunctionDecl {
            name,
            params,
            ret_type,
            effects,
            span: start.merge(body.span),
            body,
        })
    }

    /// `(name: Type, ...)` - possibly empty.
    fn parse_params(&mut self) -> Option<Vec<Param>> {
        self.expect(TokenKind::LParen)?;

        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                let (name, name_span) = self.parse_ident()?;
                self.expect(TokenKind::Colon)?;
                let ty = self.parse_type()?;
                params.push(Param {
                    name,
                    span: name_span.merge(ty.span()),
                    ty,
                });
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;

        Some(params)
    }

    /// `uses { name, ... }` - absent means pure.
    fn parse_uses_clause(&mut self) -> Option<Vec<EffectRef>> {
        if !self.match_token(&TokenKind::Uses) {
            return Some(Vec::new());
        }
        self.expect(TokenKind::LBrace)?;

        let mut effects = Vec::new();
        if !self.check(&TokenKind::RBrace) {
            loop {
                let (name, span) = self.parse_ident()?;
                effects.push(EffectRef { name, span });
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RBrace)?;

        Some(effects)
    }

    /// `type Name<T> = { fields }` or `type Name = A | B(...)`.
    fn parse_type_decl(&mut self) -> Option<TypeDecl> {
        let start = self.current_span();
        self.expect(TokenKind::Type)?;

        let (name, _) = self.parse_ident()?;

        let mut type_params = Vec::new();
        if self.match_token(&TokenKind::Lt) {
            loop {
                let (param, _) = self.parse_ident()?;
                type_params.push(param);
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::Gt)?;
        }

        self.expect(TokenKind::Eq)?;

        let body = if self.check(&TokenKind::LBrace) {
            TypeBody::Record(self.parse_record_fields()?)
        } else {
            TypeBody::Union(self.parse_union_constructors()?)
        };

        let end = self.previous_span();
        Some(TypeDecl {
            name,
            type_params,
            body,
            span: start.merge(end),
        })
    }

    /// `{ name: Type, ... }`
    fn parse_record_fields(&mut self) -> Option<Vec<FieldDef>> {
        self.expect(TokenKind::LBrace)?;

        let mut fields = Vec::new();
        while !self.at_eof() && !self.check(&TokenKind::RBrace) {
            let (name, name_span) = self.parse_ident()?;
            self.expect(TokenKind::Colon)?;
            let ty = self.parse_type()?;
            fields.push(FieldDef {
                name,
                span: name_span.merge(ty.span()),
                ty,
            });
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace)?;

        Some(fields)
    }

    /// `A | B(value: Int) | C`
    fn parse_union_constructors(&mut self) -> Option<Vec<Constructor>> {
        let mut constructors = Vec::new();
        loop {
            let (name, name_span) = self.parse_ident()?;

            let mut fields = Vec::new();
            if self.match_token(&TokenKind::LParen) {
                if !self.check(&TokenKind::RParen) {
                    loop {
                        let (field_name, field_span) = self.parse_ident()?;
                        self.expect(TokenKind::Colon)?;
                        let ty = self.parse_type()?;
                        fields.push(FieldDef {
                            name: field_name,
                            span: field_span.merge(ty.span()),
                            ty,
                        });
                        if !self.match_token(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RParen)?;
            }

            constructors.push(Constructor {
                name,
                fields,
                span: name_span.merge(self.previous_span()),
            });

            if !self.match_token(&TokenKind::Pipe) {
                break;
            }
        }
        Some(constructors)
    }

    /// `effect Name`
    fn parse_effect_decl(&mut self) -> Option<EffectDecl> {
        let start = self.current_span();
        self.expect(TokenKind::Effect)?;
        let (name, name_span) = self.parse_ident()?;
        Some(EffectDecl {
            name,
            span: start.merge(name_span),
        })
    }

    /// `import a.b.c` / `import a.b.c as alias`
    fn parse_import_decl(&mut self) -> Option<ImportDecl> {
        let start = self.current_span();
        self.expect(TokenKind::Import)?;
        let path = self.parse_dotted_name()?;

        let alias = if self.match_token(&TokenKind::As) {
            Some(self.parse_ident()?.0)
        } else {
            None
        };

        Some(ImportDecl {
            span: start.merge(path.span),
            path,
            alias,
        })
    }

    /// `api get "/path" (params) -> type uses { ... } block`
    fn parse_api_route(&mut self) -> Option<ApiRoute> {
        let start = self.current_span();
        self.expect(TokenKind::Api)?;

        let method = self.parse_http_method()?;
        let path = self.parse_route_path()?;
        let params = self.parse_params()?;
        self.expect(TokenKind::Arrow)?;
        let ret_type = self.parse_type()?;
        let effects = self.parse_uses_clause()?;
        let body = self.parse_block()?;

        Some(ApiRoute {
            method,
            path,
            params,
            ret_type,
            effects,
            span: start.merge(body.span),
            body,
        })
    }

    /// Method word, validated case-insensitively and canonicalized to
    /// uppercase in the AST.
    fn parse_http_method(&mut self) -> Option<HttpMethod> {
        let span = self.current_span();
        let word = match self.current_kind() {
            TokenKind::Ident(name) => name.as_str(),
            _ => {
                self.error_unexpected("an HTTP method");
                return None;
            }
        };

        match HttpMethod::parse(word) {
            Some(method) => {
                self.advance();
                Some(method)
            }
            None => {
                self.handler.emit(Diagnostic::error(
                    DiagnosticCode::E6001,
                    format!("invalid HTTP method `{word}`"),
                    span,
                ));
                self.advance();
                None
            }
        }
    }

    /// Route path string; must begin with `/`.
    fn parse_route_path(&mut self) -> Option<String> {
        let span = self.current_span();
        let path = match self.current_kind() {
            TokenKind::Str(path) => path.clone(),
            _ => {
                self.error_unexpected("a route path string");
                return None;
            }
        };
        self.advance();

        if !path.starts_with('/') {
            self.handler.emit(Diagnostic::error(
                DiagnosticCode::E6002,
                format!("route path `{path}` must start with `/`"),
                span,
            ));
        }
        Some(path)
    }

    // ------------------------------------------------------------------
    // Shared helpers
    // ------------------------------------------------------------------

    /// `a.b.c`
    fn parse_dotted_name(&mut self) -> Option<DottedName> {
        let (first, first_span) = self.parse_ident()?;
        let mut segments = vec![first];
        let mut span = first_span;

        while self.match_token(&TokenKind::Dot) {
            let (segment, segment_span) = self.parse_ident()?;
            segments.push(segment);
            span = span.merge(segment_span);
        }

        Some(DottedName { segments, span })
    }

    pub(crate) fn parse_ident(&mut self) -> Option<(Symbol, Span)> {
        let span = self.current_span();
        match self.current_kind() {
            TokenKind::Ident(name) => {
                let name = *name;
                self.advance();
                Some((name, span))
            }
            _ => {
                self.error_expected("an identifier");
                None
            }
        }
    }

    pub(crate) fn current(&self) -> &Token {
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    pub(crate) fn current_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    pub(crate) fn current_span(&self) -> Span {
        self.current().span
    }

    pub(crate) fn previous_span(&self) -> Span {
        let index = self.position.saturating_sub(1);
        self.tokens[index].span
    }

    pub(crate) fn at_eof(&self) -> bool {
        self.current().is_eof()
    }

    /// Opaque progress marker for loops that must guarantee advancement.
    pub(crate) fn position_marker(&self) -> usize {
        self.position
    }

    pub(crate) fn advance(&mut self) {
        if !self.at_eof() {
            self.position += 1;
        }
    }

    /// Compare against the current token without consuming it. Only
    /// meaningful for payload-free kinds.
    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        self.current_kind() == kind
    }

    /// Consume the current token if it matches.
    pub(crate) fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume a specific token or report exactly what was expected and
    /// what was found.
    pub(crate) fn expect(&mut self, kind: TokenKind) -> Option<Span> {
        if self.check(&kind) {
            let span = self.current_span();
            self.advance();
            Some(span)
        } else {
            let code = if self.at_eof() {
                DiagnosticCode::E1006
            } else {
                DiagnosticCode::E1002
            };
            self.handler.emit(Diagnostic::error(
                code,
                format!("expected {}, found {}", kind, self.current_kind()),
                self.current_span(),
            ));
            None
        }
    }

    /// Report an unexpected token (E1001) naming what the production
    /// wanted.
    pub(crate) fn error_unexpected(&self, wanted: &str) {
        let code = if self.at_eof() {
            DiagnosticCode::E1006
        } else {
            DiagnosticCode::E1001
        };
        self.handler.emit(Diagnostic::error(
            code,
            format!("expected {wanted}, found {}", self.current_kind()),
            self.current_span(),
        ));
    }

    /// Report a missing-token style error (E1002).
    pub(crate) fn error_expected(&self, wanted: &str) {
        let code = if self.at_eof() {
            DiagnosticCode::E1006
        } else {
            DiagnosticCode::E1002
        };
        self.handler.emit(Diagnostic::error(
            code,
            format!("expected {wanted}, found {}", self.current_kind()),
            self.current_span(),
        ));
    }

    /// Skip tokens until a synchronization point: `;` (consumed), a
    /// closing `}`, or a keyword that can begin a declaration.
    pub(crate) fn recover_to_sync_point(&mut self) {
        while !self.at_eof() {
            match self.current_kind() {
                TokenKind::Semicolon => {
                    self.advance();
                    return;
                }
                TokenKind::RBrace
                | TokenKind::Module
                | TokenKind::Api
                | TokenKind::Fn
                | TokenKind::Type
                | TokenKind::Effect
                | TokenKind::Import
                | TokenKind::Let => return,
                _ => self.advance(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mkc_lex::Lexer;
    use mkc_util::FileId;

    fn parse(src: &str) -> (Program, Handler) {
        let handler = Handler::new();
        let tokens = Lexer::new(src, FileId::DUMMY, &handler).tokenize();
        let program = Parser::new(tokens, &handler).parse();
        (program, handler)
    }

    #[test]
    fn parses_bare_top_level_function() {
        let (program, handler) = parse(r#"fn main() -> String { "hello" }"#);
        assert!(!handler.has_errors(), "{:?}", handler.diagnostics());
        assert_eq!(program.decls.len(), 1);
        let Decl::Function(func) = &program.decls[0] else {
            panic!("expected a function");
        };
        assert_eq!(func.name.as_str(), "main");
        assert!(func.is_pure());
        assert!(func.body.tail.is_some());
    }

    #[test]
    fn parses_module_with_declarations() {
        let (program, handler) = parse(
            r#"
            module auth.session {
                effect audit
                import auth.user as users
                type Token = { value: String, expires: Int }
                fn issue(id: Int) -> String uses { audit, log } {
                    "token"
                }
            }
            "#,
        );
        assert!(!handler.has_errors(), "{:?}", handler.diagnostics());
        assert_eq!(program.modules.len(), 1);

        let module = &program.modules[0];
        assert_eq!(module.name.joined(), "auth.session");
        assert_eq!(module.decls.len(), 4);

        let Decl::Import(import) = &module.decls[1] else {
            panic!("expected import");
        };
        assert_eq!(import.path.joined(), "auth.user");
        assert_eq!(import.alias.map(|a| a.as_str()), Some("users"));

        let Decl::Function(func) = &module.decls[3] else {
            panic!("expected function");
        };
        let effects: Vec<_> = func.effects.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(effects, vec!["audit", "log"]);
    }

    #[test]
    fn parses_union_and_record_type_decls() {
        let (program, handler) = parse(
            r#"
            type Shape = Circle(radius: Int) | Square(side: Int) | Point
            type User = { id: Int, name: String }
            type Wrapper<T> = Wrapped(value: T)
            "#,
        );
        assert!(!handler.has_errors(), "{:?}", handler.diagnostics());
        assert_eq!(program.decls.len(), 3);

        let Decl::Type(shape) = &program.decls[0] else {
            panic!("expected type decl");
        };
        let TypeBody::Union(ctors) = &shape.body else {
            panic!("expected union");
        };
        assert_eq!(ctors.len(), 3);
        assert_eq!(ctors[0].name.as_str(), "Circle");
        assert_eq!(ctors[0].fields.len(), 1);
        assert!(ctors[2].fields.is_empty());

        let Decl::Type(user) = &program.decls[1] else {
            panic!("expected type decl");
        };
        assert!(matches!(&user.body, TypeBody::Record(fields) if fields.len() == 2));

        let Decl::Type(wrapper) = &program.decls[2] else {
            panic!("expected type decl");
        };
        assert_eq!(wrapper.type_params.len(), 1);
    }

    #[test]
    fn parses_api_route_and_canonicalizes_method() {
        let (program, handler) = parse(
            r#"
            api GET "/users/:id" (id: Int) -> String uses { http } {
                "user"
            }
            "#,
        );
        assert!(!handler.has_errors(), "{:?}", handler.diagnostics());
        assert_eq!(program.routes.len(), 1);

        let route = &program.routes[0];
        assert_eq!(route.method, HttpMethod::Get);
        assert_eq!(route.method.as_str(), "GET");
        assert_eq!(route.path, "/users/:id");
        assert_eq!(route.path_params(), vec!["id"]);
        assert_eq!(route.params.len(), 1);
    }

    #[test]
    fn invalid_http_method_is_e6001() {
        let (_, handler) = parse(r#"api fetch "/x" () -> String { "x" }"#);
        assert!(!handler.with_code(DiagnosticCode::E6001).is_empty());
    }

    #[test]
    fn route_path_must_start_with_slash() {
        let (_, handler) = parse(r#"api get "ping" () -> String { "pong" }"#);
        assert_eq!(handler.with_code(DiagnosticCode::E6002).len(), 1);
    }

    #[test]
    fn unexpected_token_reports_expected_and_found() {
        let (_, handler) = parse("fn f( -> Int { 1 }");
        assert!(handler.has_errors());
        let message = &handler.diagnostics()[0].message;
        assert!(message.contains("expected"), "{message}");
        assert!(message.contains("found"), "{message}");
    }

    #[test]
    fn parser_recovers_and_keeps_later_declarations() {
        let (program, handler) = parse(
            r#"
            fn broken( -> Int { 1 }
            fn fine() -> Int { 2 }
            "#,
        );
        assert!(handler.has_errors());
        assert!(program.find_function(Symbol::intern("fine")).is_some());
    }

    #[test]
    fn stray_top_level_token_is_reported_once_per_token() {
        let (_, handler) = parse("42");
        assert!(handler.has_errors());
    }

    #[test]
    fn eof_inside_module_reports_e1006() {
        let (_, handler) = parse("module app { fn f() -> Int { 1 }");
        assert!(!handler.with_code(DiagnosticCode::E1006).is_empty());
    }
}
