//! mkc-util - Shared infrastructure for the mkc compiler.
//!
//! This crate sits at the bottom of the workspace dependency graph and
//! provides the pieces every phase needs:
//!
//! - [`span`]: source locations ([`Span`], [`FileId`]) and the [`SourceMap`]
//!   that maps file ids back to names and contents
//! - [`diagnostic`]: categorized error codes, [`Diagnostic`] records, and the
//!   append-only [`Handler`] each phase reports into
//! - [`symbol`]: interned strings ([`Symbol`]) for identifiers, effect names
//!   and constructor names
//!
//! Diagnostics are collected, never thrown: a phase reports into a `Handler`
//! and its caller checks `has_errors()` before running the next phase.

pub mod diagnostic;
pub mod span;
pub mod symbol;

pub use diagnostic::{Category, Diagnostic, DiagnosticCode, Handler, Level};
pub use span::{FileId, SourceFile, SourceMap, Span};
pub use symbol::Symbol;

/// Largest source file the compiler will attempt. Bigger inputs are
/// rejected with E8001 before lexing.
pub const MAX_SOURCE_BYTES: usize = 16 * 1024 * 1024;
