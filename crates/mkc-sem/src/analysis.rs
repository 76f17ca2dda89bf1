//! The semantic analyzer: symbol resolution, type checking, effect
//! checking, pattern exhaustiveness, and totality.
//!
//! Analysis runs as a two-pass traversal over each module. Pass 1 hoists
//! every function, type, and effect into the module's scope before any
//! body is examined, which is what makes mutual recursion and forward
//! references work. Pass 2 checks bodies.
//!
//! All findings are accumulated into the shared diagnostic handler with
//! source positions; analysis never throws.

use crate::context::{CtorInfo, RecordInfo, TypeContext, UnionInfo};
use crate::prelude::load_prelude;
use crate::scope::{SymbolKind, SymbolTable};
use crate::types::{EffectSet, FnType, Type};
use indexmap::IndexSet;
use mkc_par::ast::*;
use mkc_util::{Diagnostic, DiagnosticCode, Handler, Span, Symbol};
use tracing::debug;

/// What kind of body the checker is inside. Routes report effect
/// violations as E6005; ordinary functions split them between E3001 and
/// E3002.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EffectOrigin {
    Function,
    Route,
}

/// Per-body checking context. Copied (cheaply) on entry into lambdas.
#[derive(Clone, Copy)]
struct BodyCtx<'x> {
    /// The declared effect set of the enclosing function or route
    effects: &'x EffectSet,
    origin: EffectOrigin,
    /// Lambdas are always pure; any effect inside is E3004
    in_lambda: bool,
}

pub struct SemanticAnalyzer<'a> {
    table: SymbolTable,
    context: TypeContext,
    handler: &'a Handler,
}

impl<'a> SemanticAnalyzer<'a> {
    pub fn new(handler: &'a Handler) -> Self {
        let mut table = SymbolTable::new();
        let mut context = TypeContext::new();
        load_prelude(&mut table, &mut context);
        Self {
            table,
            context,
            handler,
        }
    }

    /// Analyze a whole translation unit. Returns the clean flag: true when
    /// no error was reported by this phase (or any earlier one sharing the
    /// handler).
    pub fn analyze(&mut self, program: &Program) -> bool {
        debug!(
            modules = program.modules.len(),
            routes = program.routes.len(),
            "semantic analysis"
        );

        // Top-level declarations live in a scope shared with the routes.
        self.table.enter("unit");
        self.hoist_decls(&program.decls);
        self.check_decls(&program.decls);

        for module in &program.modules {
            debug!(module = %module.name, "checking module");
            self.table.enter(module.name.joined());
            self.hoist_decls(&module.decls);
            self.check_decls(&module.decls);
            self.table.leave();
        }

        self.check_routes(&program.routes);
        self.table.leave();

        !self.handler.has_errors()
    }

    /// Expose the collected type context (consumed by the generators).
    pub fn into_context(self) -> TypeContext {
        self.context
    }

    // ------------------------------------------------------------------
    // Pass 1: hoisting
    // ------------------------------------------------------------------

    /// Insert every declaration into the current scope before any body is
    /// examined. Types and effects land first so function signatures can
    /// reference them; unions also declare their constructors.
    fn hoist_decls(&mut self, decls: &[Decl]) {
        for decl in decls {
            match decl {
                Decl::Type(type_decl) => {
                    self.declare_or_shadow_error(
                        type_decl.name,
                        SymbolKind::Type,
                        None,
                        type_decl.span,
                    );
                }
                Decl::Effect(effect_decl) => {
                    self.declare_or_shadow_error(
                        effect_decl.name,
                        SymbolKind::Effect,
                        None,
                        effect_decl.span,
                    );
                }
                Decl::Import(import) => {
                    let local = import
                        .alias
                        .unwrap_or_else(|| *import.path.segments.last().expect("nonempty path"));
                    self.declare_or_shadow_error(local, SymbolKind::Module, None, import.span);
                }
                Decl::Function(_) => {}
            }
        }

        // Type bodies next: they may reference any hoisted type name.
        for decl in decls {
            if let Decl::Type(type_decl) = decl {
                self.register_type_body(type_decl);
            }
        }

        // Function signatures last: they may reference types and effects.
        for decl in decls {
            if let Decl::Function(func) = decl {
                let fn_type = self.lower_signature(func);
                self.declare_or_shadow_error(
                    func.name,
                    SymbolKind::Function,
                    Some(Type::Function(fn_type)),
                    func.span,
                );
            }
        }
    }

    /// Record a type declaration's shape and declare union constructors.
    fn register_type_body(&mut self, type_decl: &TypeDecl) {
        let params = &type_decl.type_params;
        match &type_decl.body {
            TypeBody::Record(fields) => {
                let info = RecordInfo {
                    fields: fields
                        .iter()
                        .map(|f| (f.name, self.lower_type(&f.ty, params)))
                        .collect(),
                };
                self.context.insert_record(type_decl.name, info);
            }
            TypeBody::Union(ctors) => {
                let result_ty = if params.is_empty() {
                    Type::Named(type_decl.name)
                } else {
                    Type::Generic {
                        name: type_decl.name,
                        args: vec![Type::Unknown; params.len()],
                    }
                };

                let mut infos = Vec::new();
                for ctor in ctors {
                    let fields: Vec<(Symbol, Type)> = ctor
                        .fields
                        .iter()
                        .map(|f| (f.name, self.lower_type(&f.ty, params)))
                        .collect();

                    let ctor_ty = if fields.is_empty() {
                        result_ty.clone()
                    } else {
                        Type::Function(FnType {
                            params: fields.iter().map(|(_, t)| t.clone()).collect(),
                            ret: Box::new(result_ty.clone()),
                            effects: EffectSet::new(),
                        })
                    };
                    self.declare_or_shadow_error(
                        ctor.name,
                        SymbolKind::Constructor,
                        Some(ctor_ty),
                        ctor.span,
                    );

                    infos.push(CtorInfo {
                        name: ctor.name,
                        fields,
                    });
                }
                self.context
                    .insert_union(type_decl.name, UnionInfo { ctors: infos });
            }
        }
    }

    /// Lower a function declaration's signature. Unknown types in the
    /// signature are reported here, once.
    fn lower_signature(&mut self, func: &FunctionDecl) -> FnType {
        FnType {
            params: func
                .params
                .iter()
                .map(|p| self.lower_type(&p.ty, &[]))
                .collect(),
            ret: Box::new(self.lower_type(&func.ret_type, &[])),
            effects: EffectSet::from_names(func.effects.iter().map(|e| e.name)),
        }
    }

    // ------------------------------------------------------------------
    // Pass 2: bodies
    // ------------------------------------------------------------------

    fn check_decls(&mut self, decls: &[Decl]) {
        for decl in decls {
            if let Decl::Function(func) = decl {
                self.check_function(func);
            }
        }
    }

    fn check_function(&mut self, func: &FunctionDecl) {
        debug!(function = %func.name, "checking function body");

        let effects = self.validate_uses(&func.effects);

        // The hoisted signature carries the already-lowered types.
        let fn_type = match self.table.resolve(func.name).and_then(|e| e.ty.clone()) {
            Some(Type::Function(fn_type)) => fn_type,
            _ => self.lower_signature(func),
        };
        let expected = (*fn_type.ret).clone();

        self.table.enter(format!("fn {}", func.name));
        for (param, ty) in func.params.iter().zip(fn_type.params.iter()) {
            self.declare_or_shadow_error(
                param.name,
                SymbolKind::Variable,
                Some(ty.clone()),
                param.span,
            );
        }

        let ctx = BodyCtx {
            effects: &effects,
            origin: EffectOrigin::Function,
            in_lambda: false,
        };
        let body_ty = self.check_block_in_current_scope(&func.body, ctx);
        self.check_result(&func.body, &body_ty, &expected, func.span, func.name.as_str());

        self.table.leave();
    }

    fn check_routes(&mut self, routes: &[ApiRoute]) {
        let mut seen: IndexSet<(HttpMethod, String)> = IndexSet::new();

        for route in routes {
            debug!(method = route.method.as_str(), path = %route.path, "checking route");

            if !seen.insert((route.method, route.path.clone())) {
                self.error(
                    DiagnosticCode::E6003,
                    format!("duplicate route {} {}", route.method.as_str(), route.path),
                    route.span,
                );
            }

            // Every `:name` in the path needs a matching handler parameter.
            for path_param in route.path_params() {
                if !route.params.iter().any(|p| p.name.as_str() == path_param) {
                    self.error(
                        DiagnosticCode::E6004,
                        format!("route parameter `:{path_param}` has no matching handler parameter"),
                        route.span,
                    );
                }
            }

            let effects = self.validate_uses(&route.effects);
            let expected = self.lower_type(&route.ret_type, &[]);

            self.table
                .enter(format!("route {} {}", route.method.as_str(), route.path));
            for param in &route.params {
                let ty = self.lower_type(&param.ty, &[]);
                self.declare_or_shadow_error(param.name, SymbolKind::Variable, Some(ty), param.span);
            }

            let ctx = BodyCtx {
                effects: &effects,
                origin: EffectOrigin::Route,
                in_lambda: false,
            };
            let body_ty = self.check_block_in_current_scope(&route.body, ctx);
            let label = format!("{} {}", route.method.as_str(), route.path);
            self.check_result(&route.body, &body_ty, &expected, route.span, &label);

            self.table.leave();
        }
    }

    /// Enforce the totality rules on a function or route result.
    ///
    /// A non-Unit result requires every control-flow path to end in a
    /// value-producing expression: a missing tail, or an `if` without
    /// `else` in tail position, is E2005; any other disagreement is a
    /// plain type mismatch.
    fn check_result(
        &mut self,
        body: &Block,
        body_ty: &Type,
        expected: &Type,
        span: Span,
        label: &str,
    ) {
        if !expected.is_unit() {
            match body.tail.as_deref() {
                None => {
                    self.error(
                        DiagnosticCode::E2005,
                        format!("`{label}` must produce a value of type {expected} on every path"),
                        span,
                    );
                    return;
                }
                Some(Expr::If(if_expr)) if if_expr.else_block.is_none() => {
                    self.error(
                        DiagnosticCode::E2005,
                        format!(
                            "`{label}` must produce a value of type {expected}; `if` without `else` cannot be its result"
                        ),
                        if_expr.span,
                    );
                    return;
                }
                Some(_) => {}
            }
        }
        if !body_ty.equals(expected) {
            let at = body.tail.as_deref().map_or(span, |t| t.span());
            self.error(
                DiagnosticCode::E2002,
                format!("`{label}` declares result type {expected}, but its body has type {body_ty}"),
                at,
            );
        }
    }

    // ------------------------------------------------------------------
    // Statements and blocks
    // ------------------------------------------------------------------

    /// Check a block that introduces its own scope.
    fn check_block(&mut self, block: &Block, ctx: BodyCtx<'_>) -> Type {
        self.table.enter("block");
        let ty = self.check_block_in_current_scope(block, ctx);
        self.table.leave();
        ty
    }

    /// Check a block whose bindings land in the scope already entered by
    /// the caller (function and route bodies share the parameter scope).
    fn check_block_in_current_scope(&mut self, block: &Block, ctx: BodyCtx<'_>) -> Type {
        for stmt in &block.stmts {
            self.check_stmt(stmt, ctx);
        }
        match block.tail.as_deref() {
            Some(tail) => self.check_expr(tail, ctx),
            None => Type::UNIT,
        }
    }

    fn check_stmt(&mut self, stmt: &Stmt, ctx: BodyCtx<'_>) {
        match stmt {
            Stmt::Let(let_stmt) => {
                let ty = self.check_expr(&let_stmt.value, ctx);
                self.declare_or_shadow_error(
                    let_stmt.name,
                    SymbolKind::Variable,
                    Some(ty),
                    let_stmt.span,
                );
            }
            Stmt::Expr(expr) => {
                self.check_expr(expr, ctx);
            }
            Stmt::If(if_expr) => {
                self.check_if(if_expr, ctx, false);
            }
            Stmt::Match(match_expr) => {
                self.check_match(match_expr, ctx, false);
            }
        }
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn check_expr(&mut self, expr: &Expr, ctx: BodyCtx<'_>) -> Type {
        match expr {
            Expr::Literal(literal) => match &literal.kind {
                LiteralKind::Int(_) => Type::INT,
                LiteralKind::Str(_) => Type::STRING,
                LiteralKind::Bool(_) => Type::BOOL,
            },
            Expr::Ident(ident) => self.check_ident(ident),
            Expr::Field(field) => self.check_field(field, ctx),
            Expr::Call(call) => self.check_invocation(&call.callee, &call.args, call.span, ctx),
            Expr::Pipe(pipe) => {
                let args = std::slice::from_ref(pipe.value.as_ref());
                self.check_invocation(&pipe.func, args, pipe.span, ctx)
            }
            Expr::Lambda(lambda) => self.check_lambda(lambda, ctx),
            Expr::If(if_expr) => self.check_if(if_expr, ctx, true),
            Expr::Match(match_expr) => self.check_match(match_expr, ctx, true),
            Expr::Binary(binary) => self.check_binary(binary, ctx),
            Expr::Unary(unary) => self.check_unary(unary, ctx),
        }
    }

    fn check_ident(&mut self, ident: &IdentExpr) -> Type {
        let Some(entry) = self.table.resolve(ident.name) else {
            self.error(
                DiagnosticCode::E2001,
                format!("undefined symbol `{}`", ident.name),
                ident.span,
            );
            return Type::Unknown;
        };

        match entry.kind {
            SymbolKind::Variable | SymbolKind::Function | SymbolKind::Constructor => {
                entry.ty.clone().unwrap_or(Type::Unknown)
            }
            SymbolKind::Type => {
                self.error(
                    DiagnosticCode::E2004,
                    format!("type `{}` cannot be used as a value", ident.name),
                    ident.span,
                );
                Type::Unknown
            }
            SymbolKind::Effect => {
                self.error(
                    DiagnosticCode::E2004,
                    format!("effect `{}` cannot be used as a value", ident.name),
                    ident.span,
                );
                Type::Unknown
            }
            SymbolKind::Module => Type::Unknown,
        }
    }

    fn check_field(&mut self, field: &FieldExpr, ctx: BodyCtx<'_>) -> Type {
        // `log.info` style effect operations and `mod.item` module members
        // are resolved on the object name, not on a value.
        if let Expr::Ident(object) = field.object.as_ref() {
            match self.table.resolve(object.name).map(|e| e.kind) {
                Some(SymbolKind::Effect) => {
                    self.effect_use(object.name, field.span, ctx);
                    return Type::Unknown;
                }
                Some(SymbolKind::Module) => return Type::Unknown,
                _ => {}
            }
        }

        let object_ty = self.check_expr(&field.object, ctx);
        if object_ty.is_unknown() {
            return Type::Unknown;
        }
        if let Some(name) = object_ty.head_name() {
            if let Some(record) = self.context.record(name) {
                if let Some(field_ty) = record.field(field.field) {
                    return field_ty.clone();
                }
                self.error(
                    DiagnosticCode::E2004,
                    format!("no field `{}` on type `{object_ty}`", field.field),
                    field.span,
                );
                return Type::Unknown;
            }
        }
        self.error(
            DiagnosticCode::E2004,
            format!("type `{object_ty}` has no fields"),
            field.span,
        );
        Type::Unknown
    }

    /// Shared checking for calls and pipes (`a |> f` type-checks exactly
    /// as `f(a)`).
    fn check_invocation(
        &mut self,
        callee: &Expr,
        args: &[Expr],
        span: Span,
        ctx: BodyCtx<'_>,
    ) -> Type {
        let callee_ty = self.check_expr(callee, ctx);
        let arg_tys: Vec<(Type, Span)> = args
            .iter()
            .map(|arg| (self.check_expr(arg, ctx), arg.span()))
            .collect();

        match callee_ty {
            Type::Function(fn_type) => {
                if arg_tys.len() != fn_type.params.len() {
                    self.error(
                        DiagnosticCode::E2003,
                        format!(
                            "{} expects {} argument(s), found {}",
                            Self::callee_label(callee),
                            fn_type.params.len(),
                            arg_tys.len()
                        ),
                        span,
                    );
                } else {
                    for ((arg_ty, arg_span), param_ty) in arg_tys.iter().zip(&fn_type.params) {
                        if !arg_ty.equals(param_ty) {
                            self.error(
                                DiagnosticCode::E2002,
                                format!("argument type mismatch: expected {param_ty}, found {arg_ty}"),
                                *arg_span,
                            );
                        }
                    }
                }

                if !fn_type.effects.is_empty() {
                    self.effect_call(callee, &fn_type.effects, span, ctx);
                }
                (*fn_type.ret).clone()
            }
            Type::Unknown => Type::Unknown,
            other => {
                self.error(
                    DiagnosticCode::E2003,
                    format!("cannot call a value of type `{other}`"),
                    span,
                );
                Type::Unknown
            }
        }
    }

    fn callee_label(callee: &Expr) -> String {
        match callee {
            Expr::Ident(ident) => format!("`{}`", ident.name),
            _ => "callee".to_string(),
        }
    }

    fn check_lambda(&mut self, lambda: &LambdaExpr, ctx: BodyCtx<'_>) -> Type {
        self.table.enter("lambda");
        for param in &lambda.params {
            // Lambda parameters are unannotated; no unifier exists, so
            // they check as Unknown.
            self.declare_or_shadow_error(*param, SymbolKind::Variable, Some(Type::Unknown), lambda.span);
        }

        let inner = BodyCtx {
            in_lambda: true,
            ..ctx
        };
        let body_ty = self.check_expr(&lambda.body, inner);
        self.table.leave();

        Type::Function(FnType {
            params: vec![Type::Unknown; lambda.params.len()],
            ret: Box::new(body_ty),
            effects: EffectSet::new(),
        })
    }

    fn check_if(&mut self, if_expr: &IfExpr, ctx: BodyCtx<'_>, as_value: bool) -> Type {
        let cond_ty = self.check_expr(&if_expr.cond, ctx);
        if !cond_ty.equals(&Type::BOOL) {
            self.error(
                DiagnosticCode::E2007,
                format!("`if` condition must be Bool, found {cond_ty}"),
                if_expr.cond.span(),
            );
        }

        let then_ty = self.check_block(&if_expr.then_block, ctx);
        match &if_expr.else_block {
            Some(else_block) => {
                let else_ty = self.check_block(else_block, ctx);
                if as_value && !then_ty.equals(&else_ty) {
                    self.error(
                        DiagnosticCode::E2002,
                        format!("`if` branches have different types: {then_ty} and {else_ty}"),
                        if_expr.span,
                    );
                }
                if then_ty.is_unknown() {
                    else_ty
                } else {
                    then_ty
                }
            }
            // Without an else branch the expression can only be Unit.
            None => Type::UNIT,
        }
    }

    fn check_match(&mut self, match_expr: &MatchExpr, ctx: BodyCtx<'_>, as_value: bool) -> Type {
        let scrutinee_ty = self.check_expr(&match_expr.scrutinee, ctx);
        let union_info = self.context.union_of(&scrutinee_ty).cloned();

        let mut covered: IndexSet<Symbol> = IndexSet::new();
        let mut has_default = false;
        let mut result_ty = Type::Unknown;
        let mut reported_arm_mismatch = false;

        for arm in &match_expr.arms {
            // Coverage bookkeeping happens before binding so duplicate
            // arms are reported even when their bodies are broken.
            match &arm.pattern {
                Pattern::Wildcard(span) => {
                    if has_default {
                        self.error(
                            DiagnosticCode::E4003,
                            "duplicate wildcard arm".to_string(),
                            *span,
                        );
                    }
                    has_default = true;
                }
                Pattern::Ctor(ctor) => {
                    let is_ctor_of_union = union_info
                        .as_ref()
                        .is_some_and(|info| info.ctor(ctor.name).is_some());
                    if is_ctor_of_union {
                        if !covered.insert(ctor.name) {
                            self.error(
                                DiagnosticCode::E4003,
                                format!("duplicate match arm for constructor `{}`", ctor.name),
                                ctor.span,
                            );
                        }
                    } else if ctor.fields.is_empty() && !self.is_constructor_name(ctor.name) {
                        // An identifier pattern binds the scrutinee and
                        // covers everything.
                        if has_default {
                            self.error(
                                DiagnosticCode::E4003,
                                format!("duplicate catch-all arm `{}`", ctor.name),
                                ctor.span,
                            );
                        }
                        has_default = true;
                    } else if union_info.is_some() {
                        self.error(
                            DiagnosticCode::E2001,
                            format!(
                                "`{}` is not a constructor of type {scrutinee_ty}",
                                ctor.name
                            ),
                            ctor.span,
                        );
                    }
                    // A constructor pattern against a non-union scrutinee
                    // falls through to the E4002 report below.
                }
            }

            self.table.enter("match arm");
            self.bind_pattern(&arm.pattern, &scrutinee_ty, union_info.as_ref());
            let body_ty = self.check_expr(&arm.body, ctx);
            self.table.leave();

            if as_value {
                if result_ty.is_unknown() {
                    result_ty = body_ty;
                } else if !body_ty.equals(&result_ty) && !reported_arm_mismatch {
                    self.error(
                        DiagnosticCode::E4004,
                        format!("match arms have different types: {result_ty} and {body_ty}"),
                        arm.body.span(),
                    );
                    reported_arm_mismatch = true;
                }
            }
        }

        match &union_info {
            Some(info) => {
                if !has_default {
                    let missing: Vec<String> = info
                        .ctor_names()
                        .filter(|name| !covered.contains(name))
                        .map(|name| format!("`{name}`"))
                        .collect();
                    if !missing.is_empty() {
                        self.error(
                            DiagnosticCode::E4001,
                            format!(
                                "non-exhaustive match on {scrutinee_ty}: {} not covered",
                                missing.join(", ")
                            ),
                            match_expr.span,
                        );
                    }
                }
            }
            None => {
                if !scrutinee_ty.is_unknown() && !has_default {
                    self.error(
                        DiagnosticCode::E4002,
                        format!("match on non-union type {scrutinee_ty} requires a wildcard arm"),
                        match_expr.span,
                    );
                }
            }
        }

        if as_value {
            result_ty
        } else {
            Type::UNIT
        }
    }

    /// Declare the names a pattern binds, checking constructor shapes
    /// along the way.
    fn bind_pattern(&mut self, pattern: &Pattern, scrutinee_ty: &Type, union_info: Option<&UnionInfo>) {
        let Pattern::Ctor(ctor) = pattern else {
            return;
        };

        let ctor_info = union_info.and_then(|info| info.ctor(ctor.name)).cloned();
        match ctor_info {
            Some(info) => {
                if !ctor.fields.is_empty() && ctor.fields.len() != info.fields.len() {
                    self.error(
                        DiagnosticCode::E2002,
                        format!(
                            "constructor `{}` has {} field(s), pattern names {}",
                            ctor.name,
                            info.fields.len(),
                            ctor.fields.len()
                        ),
                        ctor.span,
                    );
                    return;
                }
                for (sub, (_, field_ty)) in ctor.fields.iter().zip(info.fields.iter()) {
                    let sub_union = self.context.union_of(field_ty).cloned();
                    match sub {
                        Pattern::Wildcard(_) => {}
                        Pattern::Ctor(sub_ctor) => {
                            let nested_is_ctor = sub_union
                                .as_ref()
                                .is_some_and(|u| u.ctor(sub_ctor.name).is_some());
                            if nested_is_ctor {
                                self.bind_pattern(sub, field_ty, sub_union.as_ref());
                            } else if sub_ctor.fields.is_empty()
                                && !self.is_constructor_name(sub_ctor.name)
                            {
                                self.declare_or_shadow_error(
                                    sub_ctor.name,
                                    SymbolKind::Variable,
                                    Some(field_ty.clone()),
                                    sub_ctor.span,
                                );
                            } else {
                                self.error(
                                    DiagnosticCode::E2001,
                                    format!(
                                        "`{}` is not a constructor of type {field_ty}",
                                        sub_ctor.name
                                    ),
                                    sub_ctor.span,
                                );
                            }
                        }
                    }
                }
            }
            None if ctor.fields.is_empty() && !self.is_constructor_name(ctor.name) => {
                // Identifier pattern: bind the whole scrutinee.
                self.declare_or_shadow_error(
                    ctor.name,
                    SymbolKind::Variable,
                    Some(scrutinee_ty.clone()),
                    ctor.span,
                );
            }
            // Already reported in coverage bookkeeping.
            None => {}
        }
    }

    fn check_binary(&mut self, binary: &BinaryExpr, ctx: BodyCtx<'_>) -> Type {
        let lhs = self.check_expr(&binary.lhs, ctx);
        let rhs = self.check_expr(&binary.rhs, ctx);
        let op = binary.op;

        match op {
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Rem => {
                for (side, ty) in [("left", &lhs), ("right", &rhs)] {
                    if !ty.equals(&Type::INT) {
                        self.error(
                            DiagnosticCode::E2004,
                            format!(
                                "operator `{}` requires Int operands; {side} operand is {ty}",
                                op.as_str()
                            ),
                            binary.span,
                        );
                    }
                }
                Type::INT
            }
            BinOp::Lt | BinOp::LtEq | BinOp::Gt | BinOp::GtEq => {
                let comparable = |ty: &Type| {
                    ty.is_unknown() || ty.equals(&Type::INT) || ty.equals(&Type::STRING)
                };
                if !lhs.equals(&rhs) || !comparable(&lhs) || !comparable(&rhs) {
                    self.error(
                        DiagnosticCode::E2004,
                        format!(
                            "operator `{}` cannot compare {lhs} with {rhs}",
                            op.as_str()
                        ),
                        binary.span,
                    );
                }
                Type::BOOL
            }
            BinOp::Eq | BinOp::Ne => {
                if !lhs.equals(&rhs) {
                    self.error(
                        DiagnosticCode::E2004,
                        format!("cannot compare {lhs} with {rhs} for equality"),
                        binary.span,
                    );
                }
                Type::BOOL
            }
            BinOp::And | BinOp::Or => {
                for (side, ty) in [("left", &lhs), ("right", &rhs)] {
                    if !ty.equals(&Type::BOOL) {
                        self.error(
                            DiagnosticCode::E2004,
                            format!(
                                "operator `{}` requires Bool operands; {side} operand is {ty}",
                                op.as_str()
                            ),
                            binary.span,
                        );
                    }
                }
                Type::BOOL
            }
        }
    }

    fn check_unary(&mut self, unary: &UnaryExpr, ctx: BodyCtx<'_>) -> Type {
        let operand = self.check_expr(&unary.operand, ctx);
        match unary.op {
            UnOp::Neg => {
                if !operand.equals(&Type::INT) {
                    self.error(
                        DiagnosticCode::E2004,
                        format!("unary `-` requires an Int operand, found {operand}"),
                        unary.span,
                    );
                }
                Type::INT
            }
            UnOp::Not => {
                if !operand.equals(&Type::BOOL) {
                    self.error(
                        DiagnosticCode::E2004,
                        format!("unary `!` requires a Bool operand, found {operand}"),
                        unary.span,
                    );
                }
                Type::BOOL
            }
        }
    }

    // ------------------------------------------------------------------
    // Effects
    // ------------------------------------------------------------------

    /// Direct use of an effect capability (`log.info(...)`).
    fn effect_use(&mut self, name: Symbol, span: Span, ctx: BodyCtx<'_>) {
        if ctx.in_lambda {
            self.error(
                DiagnosticCode::E3004,
                format!("lambdas are pure; effect `{name}` cannot be used here"),
                span,
            );
            return;
        }
        if ctx.effects.contains(name) {
            return;
        }
        match ctx.origin {
            EffectOrigin::Route => self.error(
                DiagnosticCode::E6005,
                format!("handler uses effect `{name}` but does not declare it"),
                span,
            ),
            EffectOrigin::Function => self.error(
                DiagnosticCode::E3001,
                format!("effect `{name}` is not in the function's declared effect set"),
                span,
            ),
        }
    }

    /// A call to a function whose declared effect set is non-empty.
    fn effect_call(&mut self, callee: &Expr, effects: &EffectSet, span: Span, ctx: BodyCtx<'_>) {
        if ctx.in_lambda {
            self.error(
                DiagnosticCode::E3004,
                format!(
                    "lambdas are pure; cannot call {} which uses {effects}",
                    Self::callee_label(callee)
                ),
                span,
            );
            return;
        }
        if effects.is_subset(ctx.effects) {
            return;
        }
        match ctx.origin {
            EffectOrigin::Route => self.error(
                DiagnosticCode::E6005,
                format!(
                    "handler calls {} which uses {effects}, not all of which are declared",
                    Self::callee_label(callee)
                ),
                span,
            ),
            EffectOrigin::Function => {
                if ctx.effects.is_empty() {
                    self.error(
                        DiagnosticCode::E3002,
                        format!(
                            "pure function cannot call {}, which uses {effects}",
                            Self::callee_label(callee)
                        ),
                        span,
                    );
                } else {
                    self.error(
                        DiagnosticCode::E3001,
                        format!(
                            "call to {} uses {effects}, which exceeds the declared effect set {}",
                            Self::callee_label(callee),
                            ctx.effects
                        ),
                        span,
                    );
                }
            }
        }
    }

    /// Validate a `uses { ... }` clause and build its effect set. Unknown
    /// names are still inserted so the body does not cascade.
    fn validate_uses(&mut self, refs: &[EffectRef]) -> EffectSet {
        let mut set = EffectSet::new();
        for effect_ref in refs {
            if !set.insert(effect_ref.name) {
                self.error(
                    DiagnosticCode::E3005,
                    format!("duplicate effect `{}` in uses clause", effect_ref.name),
                    effect_ref.span,
                );
                continue;
            }
            match self.table.resolve(effect_ref.name) {
                Some(entry) if entry.kind == SymbolKind::Effect => {}
                Some(_) => self.error(
                    DiagnosticCode::E3003,
                    format!("`{}` is not an effect", effect_ref.name),
                    effect_ref.span,
                ),
                None => self.error(
                    DiagnosticCode::E3003,
                    format!("unknown effect `{}`", effect_ref.name),
                    effect_ref.span,
                ),
            }
        }
        set
    }

    // ------------------------------------------------------------------
    // Types and helpers
    // ------------------------------------------------------------------

    /// Lower a syntactic type to a semantic one. `type_params` are the
    /// generic parameters in scope for the enclosing type declaration;
    /// they lower to `Unknown` (no unifier, nominal equality only).
    fn lower_type(&mut self, ty: &TypeExpr, type_params: &[Symbol]) -> Type {
        match ty {
            TypeExpr::Primitive(prim, _) => Type::Primitive(*prim),
            TypeExpr::Named { name, span } => {
                if type_params.contains(name) {
                    return Type::Unknown;
                }
                match self.table.resolve(*name) {
                    Some(entry) if entry.kind == SymbolKind::Type => match &entry.ty {
                        Some(ty) => ty.clone(),
                        None => Type::Named(*name),
                    },
                    _ => {
                        self.error(
                            DiagnosticCode::E2001,
                            format!("unknown type `{name}`"),
                            *span,
                        );
                        Type::Unknown
                    }
                }
            }
            TypeExpr::Generic { name, args, span } => {
                match self.table.resolve(*name) {
                    Some(entry) if entry.kind == SymbolKind::Type => {}
                    _ => {
                        self.error(
                            DiagnosticCode::E2001,
                            format!("unknown type `{name}`"),
                            *span,
                        );
                        return Type::Unknown;
                    }
                }
                Type::Generic {
                    name: *name,
                    args: args
                        .iter()
                        .map(|arg| self.lower_type(arg, type_params))
                        .collect(),
                }
            }
            TypeExpr::Function {
                params,
                ret,
                effects,
                ..
            } => Type::Function(FnType {
                params: params
                    .iter()
                    .map(|p| self.lower_type(p, type_params))
                    .collect(),
                ret: Box::new(self.lower_type(ret, type_params)),
                effects: EffectSet::from_names(effects.iter().map(|e| e.name)),
            }),
        }
    }

    /// Declare a symbol, reporting E2006 when the name is already visible.
    fn declare_or_shadow_error(
        &mut self,
        name: Symbol,
        kind: SymbolKind,
        ty: Option<Type>,
        span: Span,
    ) {
        if let Err(previous) = self.table.declare(name, kind, ty, span) {
            let mut diag = Diagnostic::error(
                DiagnosticCode::E2006,
                format!("`{name}` is already declared; shadowing is forbidden"),
                span,
            );
            if previous != Span::DUMMY {
                diag = diag.with_note(format!(
                    "previous declaration at line {}, column {}",
                    previous.line, previous.column
                ));
            }
            self.handler.emit(diag);
        }
    }

    /// True if the name is bound to a union constructor anywhere in scope.
    /// Bare names in patterns that pass this test are constructor
    /// patterns, never bindings.
    fn is_constructor_name(&self, name: Symbol) -> bool {
        self.table
            .resolve(name)
            .is_some_and(|entry| entry.kind == SymbolKind::Constructor)
    }

    fn error(&self, code: DiagnosticCode, message: String, span: Span) {
        self.handler.emit(Diagnostic::error(code, message, span));
    }
}
