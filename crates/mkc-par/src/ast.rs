//! mkc-par - AST node definitions.
//!
//! One sum type per syntactic category ([`Decl`], [`Stmt`], [`Expr`],
//! [`Pattern`], [`TypeExpr`]) with one variant per node kind; payload
//! structs keep the fields named. Every node carries its [`Span`].
//!
//! The tree is strictly owned: parents own children, there are no cycles,
//! and names stay textual until semantic analysis resolves them.

use mkc_util::{Span, Symbol};
use std::fmt;

/// AST root - one tree per translation unit.
#[derive(Debug, Clone, Default)]
pub struct Program {
    /// Declarations outside any `module` block, in source order
    pub decls: Vec<Decl>,
    /// `module X { ... }` blocks, in source order
    pub modules: Vec<ModuleDecl>,
    /// Top-level API routes, in source order
    pub routes: Vec<ApiRoute>,
}

impl Program {
    /// Iterate top-level declarations followed by every module's
    /// declarations, in source order.
    pub fn all_decls(&self) -> impl Iterator<Item = &Decl> {
        self.decls
            .iter()
            .chain(self.modules.iter().flat_map(|m| m.decls.iter()))
    }

    /// Iterate all import declarations in the translation unit.
    pub fn imports(&self) -> impl Iterator<Item = &ImportDecl> {
        self.all_decls().filter_map(|d| match d {
            Decl::Import(import) => Some(import),
            _ => None,
        })
    }

    /// Look up a function by name anywhere in the translation unit.
    pub fn find_function(&self, name: Symbol) -> Option<&FunctionDecl> {
        self.all_decls().find_map(|d| match d {
            Decl::Function(f) if f.name == name => Some(f),
            _ => None,
        })
    }
}

/// `module a.b { decl* }`
#[derive(Debug, Clone)]
pub struct ModuleDecl {
    /// Dotted module name, e.g. `auth.user`
    pub name: DottedName,
    pub decls: Vec<Decl>,
    pub span: Span,
}

/// A dotted identifier (`a.b.c`) with its position.
#[derive(Debug, Clone)]
pub struct DottedName {
    pub segments: Vec<Symbol>,
    pub span: Span,
}

impl DottedName {
    /// Join the segments with dots.
    pub fn joined(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for DottedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.joined())
    }
}

/// Top-level declaration inside a module.
#[derive(Debug, Clone)]
pub enum Decl {
    Function(FunctionDecl),
    Type(TypeDecl),
    Effect(EffectDecl),
    Import(ImportDecl),
}

impl Decl {
    pub fn span(&self) -> Span {
        match self {
            Decl::Function(d) => d.span,
            Decl::Type(d) => d.span,
            Decl::Effect(d) => d.span,
            Decl::Import(d) => d.span,
        }
    }
}

/// `fn name(params) -> ret uses { effects } { body }`
///
/// The declared effect set is the exact upper bound of effects the body
/// may use; an empty set means the function is pure.
#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: Symbol,
    pub params: Vec<Param>,
    pub ret_type: TypeExpr,
    /// Declared effect set; empty means pure
    pub effects: Vec<EffectRef>,
    pub body: Block,
    pub span: Span,
}

impl FunctionDecl {
    /// True if the declared effect set is empty.
    pub fn is_pure(&self) -> bool {
        self.effects.is_empty()
    }
}

/// A function or route parameter: `name: Type`.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: Symbol,
    pub ty: TypeExpr,
    pub span: Span,
}

/// One name inside a `uses { ... }` clause.
#[derive(Debug, Clone, Copy)]
pub struct EffectRef {
    pub name: Symbol,
    pub span: Span,
}

/// `type Name<T> = { fields }` or `type Name = A | B(...)`.
#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub name: Symbol,
    pub type_params: Vec<Symbol>,
    pub body: TypeBody,
    pub span: Span,
}

/// Body of a type declaration.
#[derive(Debug, Clone)]
pub enum TypeBody {
    /// Labeled fields: `{ id: Int, name: String }`
    Record(Vec<FieldDef>),
    /// Ordered constructors: `A | B(value: Int)`
    Union(Vec<Constructor>),
}

/// A labeled field in a record or constructor.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: Symbol,
    pub ty: TypeExpr,
    pub span: Span,
}

/// One constructor of a tagged union.
#[derive(Debug, Clone)]
pub struct Constructor {
    pub name: Symbol,
    pub fields: Vec<FieldDef>,
    pub span: Span,
}

/// `effect Name` - declares a named capability. The operations it carries
/// are defined by the host's effect object; the compiler only tracks the
/// name.
#[derive(Debug, Clone)]
pub struct EffectDecl {
    pub name: Symbol,
    pub span: Span,
}

/// `import a.b.c` or `import a.b.c as alias`
#[derive(Debug, Clone)]
pub struct ImportDecl {
    pub path: DottedName,
    pub alias: Option<Symbol>,
    pub span: Span,
}

/// HTTP method of an API route, canonicalized to uppercase in the AST.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl HttpMethod {
    /// Parse a method word case-insensitively.
    pub fn parse(word: &str) -> Option<Self> {
        match word.to_ascii_uppercase().as_str() {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "DELETE" => Some(HttpMethod::Delete),
            "PATCH" => Some(HttpMethod::Patch),
            "HEAD" => Some(HttpMethod::Head),
            "OPTIONS" => Some(HttpMethod::Options),
            _ => None,
        }
    }

    /// Canonical uppercase spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }

    /// Lowercase spelling used in source text and OpenAPI documents.
    pub fn as_lower(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Delete => "delete",
            HttpMethod::Patch => "patch",
            HttpMethod::Head => "head",
            HttpMethod::Options => "options",
        }
    }
}

/// `api get "/users/:id" (params) -> Type uses { ... } { body }`
#[derive(Debug, Clone)]
pub struct ApiRoute {
    pub method: HttpMethod,
    /// Route path; may contain `:name` parameters
    pub path: String,
    pub params: Vec<Param>,
    pub ret_type: TypeExpr,
    pub effects: Vec<EffectRef>,
    pub body: Block,
    pub span: Span,
}

impl ApiRoute {
    /// The `:name` parameters appearing in the path, in order.
    pub fn path_params(&self) -> Vec<&str> {
        self.path
            .split('/')
            .filter_map(|seg| seg.strip_prefix(':'))
            .collect()
    }
}

/// `{ stmt* expr? }` - the block's value is the tail expression, or unit
/// if absent.
#[derive(Debug, Clone)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub tail: Option<Box<Expr>>,
    pub span: Span,
}

/// Statement.
#[derive(Debug, Clone)]
pub enum Stmt {
    /// `let name = expr` - immutable binding
    Let(LetStmt),
    /// Expression evaluated for its effects; value discarded
    Expr(Expr),
    /// `if` in statement position (shares the expression payload)
    If(IfExpr),
    /// `match` in statement position (shares the expression payload)
    Match(MatchExpr),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Let(s) => s.span,
            Stmt::Expr(e) => e.span(),
            Stmt::If(e) => e.span,
            Stmt::Match(e) => e.span,
        }
    }
}

/// `let name = value`
#[derive(Debug, Clone)]
pub struct LetStmt {
    pub name: Symbol,
    pub value: Expr,
    pub span: Span,
}

/// Expression.
#[derive(Debug, Clone)]
pub enum Expr {
    Literal(Literal),
    Ident(IdentExpr),
    Call(CallExpr),
    Lambda(LambdaExpr),
    If(IfExpr),
    Match(MatchExpr),
    Pipe(PipeExpr),
    Binary(BinaryExpr),
    Unary(UnaryExpr),
    Field(FieldExpr),
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal(e) => e.span,
            Expr::Ident(e) => e.span,
            Expr::Call(e) => e.span,
            Expr::Lambda(e) => e.span,
            Expr::If(e) => e.span,
            Expr::Match(e) => e.span,
            Expr::Pipe(e) => e.span,
            Expr::Binary(e) => e.span,
            Expr::Unary(e) => e.span,
            Expr::Field(e) => e.span,
        }
    }
}

/// Literal value, already decoded by the lexer.
#[derive(Debug, Clone)]
pub struct Literal {
    pub kind: LiteralKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralKind {
    Int(i64),
    Str(String),
    Bool(bool),
}

/// A name in expression position.
#[derive(Debug, Clone, Copy)]
pub struct IdentExpr {
    pub name: Symbol,
    pub span: Span,
}

/// `callee(args)`
#[derive(Debug, Clone)]
pub struct CallExpr {
    pub callee: Box<Expr>,
    pub args: Vec<Expr>,
    pub span: Span,
}

/// `|a, b| body` - lambdas are always pure.
#[derive(Debug, Clone)]
pub struct LambdaExpr {
    pub params: Vec<Symbol>,
    pub body: Box<Expr>,
    pub span: Span,
}

/// `if cond { ... } else { ... }` - usable in expression and statement
/// position; the `else` block is required for the expression to have a
/// non-unit type.
#[derive(Debug, Clone)]
pub struct IfExpr {
    pub cond: Box<Expr>,
    pub then_block: Block,
    pub else_block: Option<Block>,
    pub span: Span,
}

/// `match scrutinee { pattern -> expr ... }`
#[derive(Debug, Clone)]
pub struct MatchExpr {
    pub scrutinee: Box<Expr>,
    pub arms: Vec<MatchArm>,
    pub span: Span,
}

/// One `pattern -> expr` arm.
#[derive(Debug, Clone)]
pub struct MatchArm {
    pub pattern: Pattern,
    pub body: Expr,
    pub span: Span,
}

/// `value |> func` - equivalent to `func(value)`, left-associative.
#[derive(Debug, Clone)]
pub struct PipeExpr {
    pub value: Box<Expr>,
    pub func: Box<Expr>,
    pub span: Span,
}

/// `lhs op rhs`
#[derive(Debug, Clone)]
pub struct BinaryExpr {
    pub op: BinOp,
    pub lhs: Box<Expr>,
    pub rhs: Box<Expr>,
    pub span: Span,
}

/// Binary operators, lowest-to-highest precedence tier noted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinOp {
    /// Source spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Or => "||",
            BinOp::And => "&&",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::LtEq => "<=",
            BinOp::Gt => ">",
            BinOp::GtEq => ">=",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
        }
    }
}

/// `-expr` / `!expr`
#[derive(Debug, Clone)]
pub struct UnaryExpr {
    pub op: UnOp,
    pub operand: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
}

impl UnOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnOp::Neg => "-",
            UnOp::Not => "!",
        }
    }
}

/// `object.field` - also the form effect calls take (`log.info`).
#[derive(Debug, Clone)]
pub struct FieldExpr {
    pub object: Box<Expr>,
    pub field: Symbol,
    pub span: Span,
}

/// Pattern in a match arm.
///
/// A bare lowercase name parses as a zero-field [`Pattern::Ctor`]; semantic
/// analysis decides whether it names a constructor or binds the value.
#[derive(Debug, Clone)]
pub enum Pattern {
    Ctor(CtorPattern),
    Wildcard(Span),
}

impl Pattern {
    pub fn span(&self) -> Span {
        match self {
            Pattern::Ctor(p) => p.span,
            Pattern::Wildcard(span) => *span,
        }
    }
}

/// `name` or `name(sub, patterns)`
#[derive(Debug, Clone)]
pub struct CtorPattern {
    pub name: Symbol,
    pub fields: Vec<Pattern>,
    pub span: Span,
}

/// Type expression.
#[derive(Debug, Clone)]
pub enum TypeExpr {
    Primitive(PrimitiveType, Span),
    /// A named (possibly alias) type; resolved during semantic analysis
    Named { name: Symbol, span: Span },
    /// `Name<args>` - e.g. `Option<Int>`, `Map<String, Int>`
    Generic {
        name: Symbol,
        args: Vec<TypeExpr>,
        span: Span,
    },
    /// `fn(params) -> ret uses { effects }`
    Function {
        params: Vec<TypeExpr>,
        ret: Box<TypeExpr>,
        effects: Vec<EffectRef>,
        span: Span,
    },
}

impl TypeExpr {
    pub fn span(&self) -> Span {
        match self {
            TypeExpr::Primitive(_, span) => *span,
            TypeExpr::Named { span, .. } => *span,
            TypeExpr::Generic { span, .. } => *span,
            TypeExpr::Function { span, .. } => *span,
        }
    }
}

/// The built-in primitive types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Int,
    Bool,
    String,
    Unit,
}

impl PrimitiveType {
    /// Recognize a primitive type name.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "Int" => Some(PrimitiveType::Int),
            "Bool" => Some(PrimitiveType::Bool),
            "String" => Some(PrimitiveType::String),
            "Unit" => Some(PrimitiveType::Unit),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveType::Int => "Int",
            PrimitiveType::Bool => "Bool",
            PrimitiveType::String => "String",
            PrimitiveType::Unit => "Unit",
        }
    }
}
