//! Formatter: AST back to canonical source text.
//!
//! Layout rules: 4-space indentation, braces on the same line as their
//! introducing keyword, one blank line between declarations, match arms
//! aligned one level inside the `match`. Comments were dropped by the
//! lexer, so formatting discards them (a known limitation); program
//! meaning is otherwise preserved, and formatting is idempotent.

use crate::escape_string;
use mkc_par::ast::*;

const INDENT: &str = "    ";

/// Pretty-print a whole translation unit.
pub fn format_program(program: &Program) -> String {
    let mut f = Formatter::new();
    f.program(program);
    f.finish()
}

struct Formatter {
    buf: String,
    indent: usize,
}

/// Precedence tiers for deciding where parentheses are required when
/// re-emitting expressions. Mirrors the parser, lowest to highest;
/// lambdas are 0 because their body extends as far right as possible.
fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Lambda(_) => 0,
        Expr::Pipe(_) => 1,
        Expr::Binary(binary) => match binary.op {
            BinOp::Or => 2,
            BinOp::And => 3,
            BinOp::Eq | BinOp::Ne => 4,
            BinOp::Lt | BinOp::LtEq | BinOp::Gt | BinOp::GtEq => 5,
            BinOp::Add | BinOp::Sub => 6,
            BinOp::Mul | BinOp::Div | BinOp::Rem => 7,
        },
        Expr::Unary(_) => 8,
        Expr::Call(_) | Expr::Field(_) => 9,
        Expr::Literal(_) | Expr::Ident(_) | Expr::If(_) | Expr::Match(_) => 10,
    }
}

fn binop_precedence(op: BinOp) -> u8 {
    match op {
        BinOp::Or => 2,
        BinOp::And => 3,
        BinOp::Eq | BinOp::Ne => 4,
        BinOp::Lt | BinOp::LtEq | BinOp::Gt | BinOp::GtEq => 5,
        BinOp::Add | BinOp::Sub => 6,
        BinOp::Mul | BinOp::Div | BinOp::Rem => 7,
    }
}

impl Formatter {
    fn new() -> Self {
        Self {
            buf: String::new(),
            indent: 0,
        }
    }

    fn finish(self) -> String {
        self.buf
    }

    fn push(&mut self, text: &str) {
        self.buf.push_str(text);
    }

    fn newline(&mut self) {
        self.buf.push('\n');
        for _ in 0..self.indent {
            self.buf.push_str(INDENT);
        }
    }

    fn program(&mut self, program: &Program) {
        let mut first = true;
        for decl in &program.decls {
            self.separate(&mut first);
            self.decl(decl);
        }
        for module in &program.modules {
            self.separate(&mut first);
            self.module(module);
        }
        for route in &program.routes {
            self.separate(&mut first);
            self.route(route);
        }
        self.buf.push('\n');
    }

    /// One blank line between top-level items.
    fn separate(&mut self, first: &mut bool) {
        if *first {
            *first = false;
        } else {
            self.buf.push('\n');
            self.newline();
        }
    }

    fn module(&mut self, module: &ModuleDecl) {
        self.push("module ");
        self.push(&module.name.joined());
        self.push(" {");
        self.indent += 1;

        let mut first = true;
        for decl in &module.decls {
            if first {
                first = false;
                self.newline();
            } else {
                self.buf.push('\n');
                self.newline();
            }
            self.decl(decl);
        }

        self.indent -= 1;
        self.newline();
        self.push("}");
    }

    fn decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Function(func) => self.function(func),
            Decl::Type(type_decl) => self.type_decl(type_decl),
            Decl::Effect(effect) => {
                self.push("effect ");
                self.push(effect.name.as_str());
            }
            Decl::Import(import) => {
                self.push("import ");
                self.push(&import.path.joined());
                if let Some(alias) = import.alias {
                    self.push(" as ");
                    self.push(alias.as_str());
                }
            }
        }
    }

    fn function(&mut self, func: &FunctionDecl) {
        self.push("fn ");
        self.push(func.name.as_str());
        self.push("(");
        self.params(&func.params);
        self.push(") -> ");
        self.type_expr(&func.ret_type);
        self.uses_clause(&func.effects);
        self.push(" ");
        self.block(&func.body);
    }

    fn route(&mut self, route: &ApiRoute) {
        self.push("api ");
        self.push(route.method.as_lower());
        self.push(" \"");
        self.push(&escape_string(&route.path));
        self.push("\" (");
        self.params(&route.params);
        self.push(") -> ");
        self.type_expr(&route.ret_type);
        self.uses_clause(&route.effects);
        self.push(" ");
        self.block(&route.body);
    }

    fn params(&mut self, params: &[Param]) {
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.push(param.name.as_str());
            self.push(": ");
            self.type_expr(&param.ty);
        }
    }

    fn uses_clause(&mut self, effects: &[EffectRef]) {
        if effects.is_empty() {
            return;
        }
        self.push(" uses { ");
        for (i, effect) in effects.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.push(effect.name.as_str());
        }
        self.push(" }");
    }

    fn type_decl(&mut self, type_decl: &TypeDecl) {
        self.push("type ");
        self.push(type_decl.name.as_str());
        if !type_decl.type_params.is_empty() {
            self.push("<");
            for (i, param) in type_decl.type_params.iter().enumerate() {
                if i > 0 {
                    self.push(", ");
                }
                self.push(param.as_str());
            }
            self.push(">");
        }
        self.push(" = ");
        match &type_decl.body {
            TypeBody::Record(fields) => {
                self.push("{ ");
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.push(field.name.as_str());
                    self.push(": ");
                    self.type_expr(&field.ty);
                }
                self.push(" }");
            }
            TypeBody::Union(ctors) => {
                for (i, ctor) in ctors.iter().enumerate() {
                    if i > 0 {
                        self.push(" | ");
                    }
                    self.push(ctor.name.as_str());
                    if !ctor.fields.is_empty() {
                        self.push("(");
                        for (j, field) in ctor.fields.iter().enumerate() {
                            if j > 0 {
                                self.push(", ");
                            }
                            self.push(field.name.as_str());
                            self.push(": ");
                            self.type_expr(&field.ty);
                        }
                        self.push(")");
                    }
                }
            }
        }
    }

    fn type_expr(&mut self, ty: &TypeExpr) {
        match ty {
            TypeExpr::Primitive(prim, _) => self.push(prim.as_str()),
            TypeExpr::Named { name, .. } => self.push(name.as_str()),
            TypeExpr::Generic { name, args, .. } => {
                self.push(name.as_str());
                self.push("<");
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.type_expr(arg);
                }
                self.push(">");
            }
            TypeExpr::Function {
                params,
                ret,
                effects,
                ..
            } => {
                self.push("fn(");
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.type_expr(param);
                }
                self.push(") -> ");
                self.type_expr(ret);
                self.uses_clause(effects);
            }
        }
    }

    fn block(&mut self, block: &Block) {
        self.push("{");
        self.indent += 1;

        for stmt in &block.stmts {
            self.newline();
            self.stmt(stmt);
        }
        if let Some(tail) = block.tail.as_deref() {
            self.newline();
            self.expr(tail, 0);
        }

        self.indent -= 1;
        self.newline();
        self.push("}");
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Let(let_stmt) => {
                self.push("let ");
                self.push(let_stmt.name.as_str());
                self.push(" = ");
                self.expr(&let_stmt.value, 0);
            }
            Stmt::Expr(expr) => self.expr(expr, 0),
            Stmt::If(if_expr) => self.if_expr(if_expr),
            Stmt::Match(match_expr) => self.match_expr(match_expr),
        }
    }

    /// Emit an expression, parenthesizing when its precedence is below
    /// what the context requires.
    fn expr(&mut self, expr: &Expr, min_prec: u8) {
        let needs_parens = precedence(expr) < min_prec;
        if needs_parens {
            self.push("(");
        }
        match expr {
            Expr::Literal(literal) => match &literal.kind {
                LiteralKind::Int(value) => self.push(&value.to_string()),
                LiteralKind::Str(value) => {
                    self.push("\"");
                    self.push(&escape_string(value));
                    self.push("\"");
                }
                LiteralKind::Bool(value) => self.push(if *value { "true" } else { "false" }),
            },
            Expr::Ident(ident) => self.push(ident.name.as_str()),
            Expr::Pipe(pipe) => {
                self.expr(&pipe.value, 1);
                self.push(" |> ");
                self.expr(&pipe.func, 2);
            }
            Expr::Binary(binary) => {
                let prec = binop_precedence(binary.op);
                self.expr(&binary.lhs, prec);
                self.push(" ");
                self.push(binary.op.as_str());
                self.push(" ");
                self.expr(&binary.rhs, prec + 1);
            }
            Expr::Unary(unary) => {
                self.push(unary.op.as_str());
                self.expr(&unary.operand, 8);
            }
            Expr::Call(call) => {
                self.expr(&call.callee, 9);
                self.push("(");
                for (i, arg) in call.args.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.expr(arg, 0);
                }
                self.push(")");
            }
            Expr::Field(field) => {
                self.expr(&field.object, 9);
                self.push(".");
                self.push(field.field.as_str());
            }
            Expr::Lambda(lambda) => {
                if lambda.params.is_empty() {
                    self.push("||");
                } else {
                    self.push("|");
                    for (i, param) in lambda.params.iter().enumerate() {
                        if i > 0 {
                            self.push(", ");
                        }
                        self.push(param.as_str());
                    }
                    self.push("|");
                }
                self.push(" ");
                self.expr(&lambda.body, 0);
            }
            Expr::If(if_expr) => self.if_expr(if_expr),
            Expr::Match(match_expr) => self.match_expr(match_expr),
        }
        if needs_parens {
            self.push(")");
        }
    }

    fn if_expr(&mut self, if_expr: &IfExpr) {
        self.push("if ");
        self.expr(&if_expr.cond, 1);
        self.push(" ");
        self.block(&if_expr.then_block);
        if let Some(else_block) = &if_expr.else_block {
            self.push(" else ");
            self.block(else_block);
        }
    }

    fn match_expr(&mut self, match_expr: &MatchExpr) {
        self.push("match ");
        self.expr(&match_expr.scrutinee, 1);
        self.push(" {");
        self.indent += 1;
        for arm in &match_expr.arms {
            self.newline();
            self.pattern(&arm.pattern);
            self.push(" -> ");
            self.expr(&arm.body, 0);
        }
        self.indent -= 1;
        self.newline();
        self.push("}");
    }

    fn pattern(&mut self, pattern: &Pattern) {
        match pattern {
            Pattern::Wildcard(_) => self.push("_"),
            Pattern::Ctor(ctor) => {
                self.push(ctor.name.as_str());
                if !ctor.fields.is_empty() {
                    self.push("(");
                    for (i, field) in ctor.fields.iter().enumerate() {
                        if i > 0 {
                            self.push(", ");
                        }
                        self.pattern(field);
                    }
                    self.push(")");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mkc_lex::Lexer;
    use mkc_par::Parser;
    use mkc_util::{FileId, Handler};

    fn parse(src: &str) -> Program {
        let handler = Handler::new();
        let tokens = Lexer::new(src, FileId::DUMMY, &handler).tokenize();
        let program = Parser::new(tokens, &handler).parse();
        assert!(
            !handler.has_errors(),
            "fixture failed to parse: {:?}",
            handler.diagnostics()
        );
        program
    }

    #[test]
    fn formats_a_simple_function() {
        let program = parse(r#"fn main()->String{"hello"}"#);
        let formatted = format_program(&program);
        assert_eq!(formatted, "fn main() -> String {\n    \"hello\"\n}\n");
    }

    #[test]
    fn formats_effects_and_params() {
        let program = parse("fn f(a:Int,b:Int)->Int uses{log,http}{a+b}");
        let formatted = format_program(&program);
        assert_eq!(
            formatted,
            "fn f(a: Int, b: Int) -> Int uses { log, http } {\n    a + b\n}\n"
        );
    }

    #[test]
    fn formats_match_with_aligned_arms() {
        let program = parse(
            "type T = A | B fn f(x: T) -> Int { match x { A -> 1 B -> 2 } }",
        );
        let formatted = format_program(&program);
        assert!(
            formatted.contains("match x {\n        A -> 1\n        B -> 2\n    }"),
            "{formatted}"
        );
    }

    #[test]
    fn preserves_operator_structure_with_parens() {
        // (1 + 2) * 3 must keep its parentheses; 1 + 2 * 3 must not gain
        // any.
        let program = parse("fn f() -> Int { (1 + 2) * 3 }");
        assert!(format_program(&program).contains("(1 + 2) * 3"));

        let program = parse("fn f() -> Int { 1 + 2 * 3 }");
        assert!(format_program(&program).contains("1 + 2 * 3"));
    }

    /// Property: format(format(p)) == format(p).
    #[test]
    fn formatting_is_idempotent() {
        let sources = [
            r#"fn main() -> String { "hello" }"#,
            "module app { effect audit\nfn f(x: Int) -> Int uses { audit } { x + 1 } }",
            "type Shape = Circle(radius: Int) | Point\nfn area(s: Shape) -> Int { match s { Circle(r) -> r * r Point -> 0 } }",
            r#"api get "/ping" () -> String { "pong" }"#,
            "fn f(c: Bool) -> Int { if c { 1 } else { 2 } }",
            "fn g(x: Int) -> Int { let y = x |> h h(y) }\nfn h(x: Int) -> Int { x }",
            "fn k() -> Int { let f = |a, b| a + b f(1, 2) }",
        ];
        for src in sources {
            let once = format_program(&parse(src));
            let twice = format_program(&parse(&once));
            assert_eq!(once, twice, "not idempotent for {src}");
        }
    }

    /// Property: parse(format(p)) is structurally equal to parse(p).
    /// Structural equality is approximated through a third format pass,
    /// which is exact given idempotence.
    #[test]
    fn parse_format_parse_is_a_fixpoint() {
        let src = r#"
            module app {
                type User = { id: Int, name: String }
                fn find(id: Int) -> Option<User> uses { fs } {
                    none
                }
            }
            api get "/users/:id" (id: Int) -> String uses { fs } {
                "user"
            }
        "#;
        let original = parse(src);
        let formatted = format_program(&original);
        let reparsed = parse(&formatted);
        assert_eq!(formatted, format_program(&reparsed));
    }
}
