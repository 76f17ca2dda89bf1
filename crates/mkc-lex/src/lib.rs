//! mkc-lex - Lexical analyzer for `.mk` source files.
//!
//! Transforms UTF-8 source text into a stream of [`Token`]s. Each token
//! records its kind, the exact source slice that produced it, and the
//! 1-based line/column of its first character. Literal tokens additionally
//! carry their decoded value (`Int` as `i64`, `String` with escapes
//! processed, `Bool` as `bool`).
//!
//! The lexer never fails: malformed input (unterminated strings,
//! unrecognized characters, out-of-range integers) produces
//! [`TokenKind::Error`] tokens plus diagnostics in the shared handler, and
//! scanning continues. The stream always ends with a single
//! [`TokenKind::Eof`] sentinel.
//!
//! # Examples
//!
//! ```
//! use mkc_lex::{Lexer, TokenKind};
//! use mkc_util::{FileId, Handler};
//!
//! let handler = Handler::new();
//! let tokens = Lexer::new("fn main() -> Int { 42 }", FileId::DUMMY, &handler).tokenize();
//!
//! assert_eq!(tokens.first().map(|t| t.kind.clone()), Some(TokenKind::Fn));
//! assert_eq!(tokens.last().map(|t| t.kind.clone()), Some(TokenKind::Eof));
//! assert!(!handler.has_errors());
//! ```

mod lexer;
mod token;

pub use lexer::Lexer;
pub use token::{Token, TokenKind};
