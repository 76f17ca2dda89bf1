//! JS emitter: the validated AST to an executable program for the host
//! runtime.
//!
//! Lowering rules:
//!
//! - Effects compile away: an effectful call-site becomes a call on the
//!   runtime's global `__effects` object (`log.info(x)` becomes
//!   `__effects.log.info(x)`)
//! - Tagged-union values are records with a `tag` string field plus
//!   per-constructor fields; `Option`/`Result` use `value`/`error`
//! - `a |> f` lowers to `f(a)`; `let` lowers to `const`
//! - `if`/`match` expressions lower to ternaries or a series of tag tests
//!   inside an immediately-invoked arrow
//! - API routes register on the runtime's `__router` object
//! - The program ends by calling `main()` when the source defines one,
//!   otherwise it prints a fixed no-main notice
//!
//! The emitter builds text in a growing buffer and never performs I/O.

use mkc_par::ast::*;
use mkc_sem::HOST_EFFECTS;
use mkc_util::Symbol;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::escape_string;

const INDENT: &str = "    ";

/// Emit a complete program. `source_name` appears in the preamble comment.
pub fn emit_js(program: &Program, source_name: &str) -> String {
    let mut emitter = JsEmitter::new(program);
    emitter.program(program, source_name);
    emitter.buf
}

/// Field names of one constructor, used to lay out and destructure
/// tagged values.
struct CtorShape {
    fields: Vec<Symbol>,
}

struct JsEmitter {
    buf: String,
    indent: usize,
    /// Constructor name -> field layout (prelude + user unions)
    ctors: FxHashMap<Symbol, CtorShape>,
    /// Names that route through the `__effects` object
    effects: FxHashSet<Symbol>,
    /// Fresh-name counter for match scrutinee temporaries
    tmp: usize,
}

impl JsEmitter {
    fn new(program: &Program) -> Self {
        let mut ctors = FxHashMap::default();
        ctors.insert(
            Symbol::intern("some"),
            CtorShape {
                fields: vec![Symbol::intern("value")],
            },
        );
        ctors.insert(Symbol::intern("none"), CtorShape { fields: vec![] });
        ctors.insert(
            Symbol::intern("ok"),
            CtorShape {
                fields: vec![Symbol::intern("value")],
            },
        );
        ctors.insert(
            Symbol::intern("err"),
            CtorShape {
                fields: vec![Symbol::intern("error")],
            },
        );

        let mut effects: FxHashSet<Symbol> =
            HOST_EFFECTS.iter().map(|name| Symbol::intern(name)).collect();

        for decl in program.all_decls() {
            match decl {
                Decl::Type(type_decl) => {
                    if let TypeBody::Union(union_ctors) = &type_decl.body {
                        for ctor in union_ctors {
                            ctors.insert(
                                ctor.name,
                                CtorShape {
                                    fields: ctor.fields.iter().map(|f| f.name).collect(),
                                },
                            );
                        }
                    }
                }
                Decl::Effect(effect) => {
                    effects.insert(effect.name);
                }
                _ => {}
            }
        }

        Self {
            buf: String::new(),
            indent: 0,
            ctors,
            effects,
            tmp: 0,
        }
    }

    fn program(&mut self, program: &Program, source_name: &str) {
        debug!(source = source_name, "emitting JS");

        self.push("\"use strict\";\n");
        self.push(&format!("// Generated by mkc from {source_name}\n\n"));

        for decl in program.all_decls() {
            if let Decl::Function(func) = decl {
                self.function(func);
                self.push("\n");
            }
        }

        for route in &program.routes {
            self.route(route);
            self.push("\n");
        }

        if program.find_function(Symbol::intern("main")).is_some() {
            self.push("console.log(main());\n");
        } else {
            self.push("console.log(\"No main function defined\");\n");
        }
    }

    fn function(&mut self, func: &FunctionDecl) {
        self.push(&format!("function {}(", func.name));
        for (i, param) in func.params.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.push(param.name.as_str());
        }
        self.push(") ");
        self.fn_body(&func.body);
        self.push("\n");
    }

    fn route(&mut self, route: &ApiRoute) {
        self.push(&format!(
            "__router.register(\"{}\", \"{}\", function (",
            route.method.as_str(),
            escape_string(&route.path)
        ));
        for (i, param) in route.params.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.push(param.name.as_str());
        }
        self.push(") ");
        self.fn_body(&route.body);
        self.push(");\n");
    }

    /// A function body: statements, then `return <tail>` when a tail
    /// expression exists.
    fn fn_body(&mut self, block: &Block) {
        self.push("{\n");
        self.indent += 1;
        for stmt in &block.stmts {
            self.stmt(stmt);
        }
        if let Some(tail) = block.tail.as_deref() {
            self.line_start();
            self.push("return ");
            let tail_js = self.expr(tail);
            self.push(&tail_js);
            self.push(";\n");
        }
        self.indent -= 1;
        self.line_start();
        self.push("}");
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Let(let_stmt) => {
                let value = self.expr(&let_stmt.value);
                self.line_start();
                self.push(&format!("const {} = {};\n", let_stmt.name, value));
            }
            Stmt::Expr(expr) => {
                let text = self.expr(expr);
                self.line_start();
                self.push(&text);
                self.push(";\n");
            }
            Stmt::If(if_expr) => self.if_stmt(if_expr),
            Stmt::Match(match_expr) => {
                let text = self.match_value(match_expr);
                self.line_start();
                self.push(&text);
                self.push(";\n");
            }
        }
    }

    fn if_stmt(&mut self, if_expr: &IfExpr) {
        let cond = self.expr(&if_expr.cond);
        self.line_start();
        self.push(&format!("if ({cond}) {{\n"));
        self.indent += 1;
        self.stmt_block(&if_expr.then_block);
        self.indent -= 1;
        self.line_start();
        if let Some(else_block) = &if_expr.else_block {
            self.push("} else {\n");
            self.indent += 1;
            self.stmt_block(else_block);
            self.indent -= 1;
            self.line_start();
        }
        self.push("}\n");
    }

    /// A block in statement position: its tail value is discarded.
    fn stmt_block(&mut self, block: &Block) {
        for stmt in &block.stmts {
            self.stmt(stmt);
        }
        if let Some(tail) = block.tail.as_deref() {
            let text = self.expr(tail);
            self.line_start();
            self.push(&text);
            self.push(";\n");
        }
    }

    // ------------------------------------------------------------------
    // Expressions (rendered to strings; statements own the buffer)
    // ------------------------------------------------------------------

    fn expr(&mut self, expr: &Expr) -> String {
        match expr {
            Expr::Literal(literal) => match &literal.kind {
                LiteralKind::Int(value) => value.to_string(),
                LiteralKind::Str(value) => format!("\"{}\"", escape_string(value)),
                LiteralKind::Bool(value) => value.to_string(),
            },
            Expr::Ident(ident) => {
                // A bare zero-field constructor is a tagged value.
                match self.ctors.get(&ident.name) {
                    Some(shape) if shape.fields.is_empty() => {
                        format!("{{ tag: \"{}\" }}", ident.name)
                    }
                    _ => ident.name.to_string(),
                }
            }
            Expr::Field(field) => {
                if let Expr::Ident(object) = field.object.as_ref() {
                    if self.effects.contains(&object.name) {
                        return format!("__effects.{}.{}", object.name, field.field);
                    }
                }
                let object = self.expr(&field.object);
                format!("{object}.{}", field.field)
            }
            Expr::Call(call) => self.call(&call.callee, &call.args),
            Expr::Pipe(pipe) => {
                let args = std::slice::from_ref(pipe.value.as_ref());
                self.call(&pipe.func, args)
            }
            Expr::Lambda(lambda) => {
                let params: Vec<&str> = lambda.params.iter().map(|p| p.as_str()).collect();
                let body = self.expr(&lambda.body);
                format!("({}) => {body}", params.join(", "))
            }
            Expr::Unary(unary) => {
                let operand = self.expr(&unary.operand);
                format!("({}{operand})", unary.op.as_str())
            }
            Expr::Binary(binary) => {
                let lhs = self.expr(&binary.lhs);
                let rhs = self.expr(&binary.rhs);
                let op = match binary.op {
                    BinOp::Eq => "===",
                    BinOp::Ne => "!==",
                    other => other.as_str(),
                };
                format!("({lhs} {op} {rhs})")
            }
            Expr::If(if_expr) => {
                let cond = self.expr(&if_expr.cond);
                let then = self.block_value(&if_expr.then_block);
                let otherwise = match &if_expr.else_block {
                    Some(block) => self.block_value(block),
                    None => "undefined".to_string(),
                };
                format!("({cond} ? {then} : {otherwise})")
            }
            Expr::Match(match_expr) => self.match_value(match_expr),
        }
    }

    /// Calls: constructors become object literals, everything else a
    /// plain invocation.
    fn call(&mut self, callee: &Expr, args: &[Expr]) -> String {
        if let Expr::Ident(ident) = callee {
            if let Some(shape) = self.ctors.get(&ident.name) {
                let fields: Vec<Symbol> = shape.fields.clone();
                let mut parts = vec![format!("tag: \"{}\"", ident.name)];
                for (field, arg) in fields.iter().zip(args) {
                    let value = self.expr(arg);
                    parts.push(format!("{field}: {value}"));
                }
                return format!("{{ {} }}", parts.join(", "));
            }
        }

        let callee_js = self.expr(callee);
        let args_js: Vec<String> = args.iter().map(|arg| self.expr(arg)).collect();
        format!("{callee_js}({})", args_js.join(", "))
    }

    /// A block used for its value: just the tail when there are no
    /// statements, an immediately-invoked arrow otherwise.
    fn block_value(&mut self, block: &Block) -> String {
        if block.stmts.is_empty() {
            return match block.tail.as_deref() {
                Some(tail) => self.expr(tail),
                None => "undefined".to_string(),
            };
        }

        let mut out = String::from("(() => {\n");
        self.indent += 1;
        let mut inner = std::mem::take(&mut self.buf);
        for stmt in &block.stmts {
            self.stmt(stmt);
        }
        if let Some(tail) = block.tail.as_deref() {
            let text = self.expr(tail);
            self.line_start();
            self.push("return ");
            self.push(&text);
            self.push(";\n");
        }
        std::mem::swap(&mut self.buf, &mut inner);
        out.push_str(&inner);
        self.indent -= 1;
        out.push_str(&self.indent_text());
        out.push_str("})()");
        out
    }

    /// Lower a match to a series of tag tests inside an immediately-
    /// invoked arrow. Each arm contributes its pattern's conditions and
    /// bindings; a binding or wildcard arm is unconditional.
    fn match_value(&mut self, match_expr: &MatchExpr) -> String {
        let scrutinee = self.expr(&match_expr.scrutinee);
        let tmp = self.fresh_tmp();

        let mut out = String::from("(() => {\n");
        self.indent += 1;

        let mut inner = std::mem::take(&mut self.buf);
        self.line_start();
        self.push(&format!("const {tmp} = {scrutinee};\n"));

        for arm in &match_expr.arms {
            let mut conds = Vec::new();
            let mut binds = Vec::new();
            self.pattern_plan(&arm.pattern, &tmp, &mut conds, &mut binds);

            if conds.is_empty() {
                for (name, path) in &binds {
                    self.line_start();
                    self.push(&format!("const {name} = {path};\n"));
                }
                let body = self.expr(&arm.body);
                self.line_start();
                self.push(&format!("return {body};\n"));
                // Later arms are unreachable after an unconditional one.
                break;
            }

            self.line_start();
            self.push(&format!("if ({}) {{\n", conds.join(" && ")));
            self.indent += 1;
            for (name, path) in &binds {
                self.line_start();
                self.push(&format!("const {name} = {path};\n"));
            }
            let body = self.expr(&arm.body);
            self.line_start();
            self.push(&format!("return {body};\n"));
            self.indent -= 1;
            self.line_start();
            self.push("}\n");
        }

        self.line_start();
        self.push("return undefined;\n");
        std::mem::swap(&mut self.buf, &mut inner);
        out.push_str(&inner);

        self.indent -= 1;
        out.push_str(&self.indent_text());
        out.push_str("})()");
        out
    }

    /// Walk a pattern, collecting tag-test conditions and `const`
    /// bindings relative to an access path.
    fn pattern_plan(
        &self,
        pattern: &Pattern,
        path: &str,
        conds: &mut Vec<String>,
        binds: &mut Vec<(String, String)>,
    ) {
        let Pattern::Ctor(ctor) = pattern else {
            return;
        };

        match self.ctors.get(&ctor.name) {
            Some(shape) => {
                conds.push(format!("{path}.tag === \"{}\"", ctor.name));
                for (sub, field) in ctor.fields.iter().zip(&shape.fields) {
                    self.pattern_plan(sub, &format!("{path}.{field}"), conds, binds);
                }
            }
            None => {
                // Not a known constructor: an identifier pattern binding
                // the value at this path.
                binds.push((ctor.name.to_string(), path.to_string()));
            }
        }
    }

    // ------------------------------------------------------------------
    // Buffer helpers
    // ------------------------------------------------------------------

    fn push(&mut self, text: &str) {
        self.buf.push_str(text);
    }

    fn line_start(&mut self) {
        let text = self.indent_text();
        self.buf.push_str(&text);
    }

    fn indent_text(&self) -> String {
        INDENT.repeat(self.indent)
    }

    fn fresh_tmp(&mut self) -> String {
        self.tmp += 1;
        format!("__m{}", self.tmp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mkc_lex::Lexer;
    use mkc_par::Parser;
    use mkc_util::{FileId, Handler};

    fn emit(src: &str) -> String {
        let handler = Handler::new();
        let tokens = Lexer::new(src, FileId::DUMMY, &handler).tokenize();
        let program = Parser::new(tokens, &handler).parse();
        assert!(
            !handler.has_errors(),
            "fixture failed to parse: {:?}",
            handler.diagnostics()
        );
        emit_js(&program, "test.mk")
    }

    #[test]
    fn emits_strict_header_and_source_comment() {
        let js = emit(r#"fn main() -> String { "hello" }"#);
        assert!(js.starts_with("\"use strict\";\n"), "{js}");
        assert!(js.contains("// Generated by mkc from test.mk"), "{js}");
    }

    /// The emitted program executes `main` and prints its result.
    #[test]
    fn main_is_called_and_printed() {
        let js = emit(r#"fn main() -> String { "hello" }"#);
        assert!(js.contains("function main() {"), "{js}");
        assert!(js.contains("return \"hello\";"), "{js}");
        assert!(js.trim_end().ends_with("console.log(main());"), "{js}");
    }

    #[test]
    fn missing_main_prints_notice() {
        let js = emit("fn helper() -> Int { 1 }");
        assert!(
            js.trim_end()
                .ends_with("console.log(\"No main function defined\");"),
            "{js}"
        );
    }

    /// Routes register on the runtime router.
    #[test]
    fn routes_register_method_path_and_handler() {
        let js = emit(r#"api get "/ping" () -> String { "pong" }"#);
        assert!(
            js.contains("__router.register(\"GET\", \"/ping\", function () {"),
            "{js}"
        );
        assert!(js.contains("return \"pong\";"), "{js}");
    }

    #[test]
    fn let_lowers_to_const() {
        let js = emit("fn f() -> Int { let x = 2 x + 1 }");
        assert!(js.contains("const x = 2;"), "{js}");
        assert!(js.contains("return (x + 1);"), "{js}");
    }

    #[test]
    fn effect_calls_route_through_the_effects_object() {
        let js = emit("fn f() -> Unit uses { log } { log.info(\"x\") }");
        assert!(js.contains("__effects.log.info(\"x\")"), "{js}");
    }

    #[test]
    fn declared_effects_also_route_through_the_effects_object() {
        let js = emit(
            "module app { effect audit fn f() -> Unit uses { audit } { audit.record(1) } }",
        );
        assert!(js.contains("__effects.audit.record(1)"), "{js}");
    }

    #[test]
    fn pipe_lowers_to_a_call() {
        let js = emit(
            "fn double(x: Int) -> Int { x * 2 } fn f() -> Int { 21 |> double }",
        );
        assert!(js.contains("return double(21);"), "{js}");
    }

    #[test]
    fn option_constructors_lower_to_tagged_records() {
        let js = emit("fn f() -> Option<Int> { some(5) }");
        assert!(js.contains("return { tag: \"some\", value: 5 };"), "{js}");

        let js = emit("fn f() -> Option<Int> { none }");
        assert!(js.contains("return { tag: \"none\" };"), "{js}");
    }

    #[test]
    fn result_constructors_use_value_and_error_fields() {
        let js = emit(r#"fn f() -> Result<Int, String> { err("nope") }"#);
        assert!(js.contains("{ tag: \"err\", error: \"nope\" }"), "{js}");
    }

    #[test]
    fn user_constructors_use_declared_field_names() {
        let js = emit(
            "type Shape = Circle(radius: Int) | Point \
             fn c() -> Shape { Circle(3) }",
        );
        assert!(js.contains("{ tag: \"Circle\", radius: 3 }"), "{js}");
    }

    #[test]
    fn if_expression_lowers_to_ternary() {
        let js = emit("fn f(c: Bool) -> Int { if c { 1 } else { 2 } }");
        assert!(js.contains("return (c ? 1 : 2);"), "{js}");
    }

    #[test]
    fn match_lowers_to_tag_tests() {
        let js = emit(
            "type T = A | B \
             fn f(x: T) -> Int { match x { A -> 1 B -> 2 } }",
        );
        assert!(js.contains(".tag === \"A\""), "{js}");
        assert!(js.contains(".tag === \"B\""), "{js}");
        assert!(js.contains("return undefined;"), "{js}");
    }

    #[test]
    fn match_bindings_destructure_constructor_fields() {
        let js = emit(
            "fn f(x: Option<Int>) -> Int { match x { some(v) -> v none -> 0 } }",
        );
        assert!(js.contains("const v = __m1.value;"), "{js}");
        assert!(js.contains("__m1.tag === \"some\""), "{js}");
    }

    #[test]
    fn binding_arm_is_unconditional() {
        let js = emit("fn f(x: Int) -> Int { match x { y -> y + 1 } }");
        assert!(js.contains("const y = __m1;"), "{js}");
    }

    #[test]
    fn lambdas_lower_to_arrows() {
        let js = emit("fn f() -> Int { let g = |a, b| a + b g(1, 2) }");
        assert!(js.contains("const g = (a, b) => (a + b);"), "{js}");
    }

    #[test]
    fn equality_uses_strict_operators() {
        let js = emit("fn f(a: Int, b: Int) -> Bool { a == b }");
        assert!(js.contains("(a === b)"), "{js}");
    }
}
