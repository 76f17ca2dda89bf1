//! Token definitions for the `.mk` language.

use mkc_util::{Span, Symbol};
use std::fmt;

/// Token kind, including decoded literal payloads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// End-of-file sentinel; always the last token in a stream
    Eof,
    /// Produced for malformed input; a diagnostic has already been reported
    Error,

    /// Identifier (not a keyword)
    Ident(Symbol),
    /// Decimal integer literal, decoded
    Int(i64),
    /// String literal, quote-stripped and with escapes processed
    Str(String),
    /// `true` / `false`
    Bool(bool),

    // Keywords
    Fn,
    Let,
    If,
    Else,
    Match,
    Type,
    Effect,
    Import,
    Api,
    Module,
    Uses,
    As,
    SomeKw,
    NoneKw,
    OkKw,
    ErrKw,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Semicolon,
    Dot,
    Underscore,

    // Operators
    Eq,
    EqEq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    /// `->`
    Arrow,
    /// `|>`
    PipeGt,
    /// `|`
    Pipe,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
}

impl TokenKind {
    /// Reclassify an identifier lexeme that matches a keyword.
    pub fn keyword(lexeme: &str) -> Option<TokenKind> {
        let kind = match lexeme {
            "fn" => TokenKind::Fn,
            "let" => TokenKind::Let,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "match" => TokenKind::Match,
            "type" => TokenKind::Type,
            "effect" => TokenKind::Effect,
            "import" => TokenKind::Import,
            "api" => TokenKind::Api,
            "module" => TokenKind::Module,
            "uses" => TokenKind::Uses,
            "as" => TokenKind::As,
            "some" => TokenKind::SomeKw,
            "none" => TokenKind::NoneKw,
            "ok" => TokenKind::OkKw,
            "err" => TokenKind::ErrKw,
            "true" => TokenKind::Bool(true),
            "false" => TokenKind::Bool(false),
            _ => return None,
        };
        Some(kind)
    }

    /// Human-readable name used in diagnostics (`expected `)`, found `,``).
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Eof => "end of file",
            TokenKind::Error => "invalid token",
            TokenKind::Ident(_) => "identifier",
            TokenKind::Int(_) => "integer literal",
            TokenKind::Str(_) => "string literal",
            TokenKind::Bool(_) => "boolean literal",
            TokenKind::Fn => "`fn`",
            TokenKind::Let => "`let`",
            TokenKind::If => "`if`",
            TokenKind::Else => "`else`",
            TokenKind::Match => "`match`",
            TokenKind::Type => "`type`",
            TokenKind::Effect => "`effect`",
            TokenKind::Import => "`import`",
            TokenKind::Api => "`api`",
            TokenKind::Module => "`module`",
            TokenKind::Uses => "`uses`",
            TokenKind::As => "`as`",
            TokenKind::SomeKw => "`some`",
            TokenKind::NoneKw => "`none`",
            TokenKind::OkKw => "`ok`",
            TokenKind::ErrKw => "`err`",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::LBrace => "`{`",
            TokenKind::RBrace => "`}`",
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::Comma => "`,`",
            TokenKind::Colon => "`:`",
            TokenKind::Semicolon => "`;`",
            TokenKind::Dot => "`.`",
            TokenKind::Underscore => "`_`",
            TokenKind::Eq => "`=`",
            TokenKind::EqEq => "`==`",
            TokenKind::NotEq => "`!=`",
            TokenKind::Lt => "`<`",
            TokenKind::Gt => "`>`",
            TokenKind::LtEq => "`<=`",
            TokenKind::GtEq => "`>=`",
            TokenKind::Plus => "`+`",
            TokenKind::Minus => "`-`",
            TokenKind::Star => "`*`",
            TokenKind::Slash => "`/`",
            TokenKind::Percent => "`%`",
            TokenKind::Bang => "`!`",
            TokenKind::Arrow => "`->`",
            TokenKind::PipeGt => "`|>`",
            TokenKind::Pipe => "`|`",
            TokenKind::AndAnd => "`&&`",
            TokenKind::OrOr => "`||`",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

/// A lexed token: kind, originating source slice, and position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Exact source slice this token was produced from
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }

    /// True for the end-of-file sentinel.
    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_are_reclassified() {
        assert_eq!(TokenKind::keyword("fn"), Some(TokenKind::Fn));
        assert_eq!(TokenKind::keyword("uses"), Some(TokenKind::Uses));
        assert_eq!(TokenKind::keyword("true"), Some(TokenKind::Bool(true)));
        assert_eq!(TokenKind::keyword("none"), Some(TokenKind::NoneKw));
        assert_eq!(TokenKind::keyword("handler"), None);
    }

    #[test]
    fn describe_quotes_punctuation() {
        assert_eq!(TokenKind::Arrow.describe(), "`->`");
        assert_eq!(TokenKind::PipeGt.describe(), "`|>`");
        assert_eq!(TokenKind::Ident(Symbol::intern("x")).describe(), "identifier");
    }
}
