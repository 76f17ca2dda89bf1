//! Diagnostic module - error collection and reporting.
//!
//! Compiler phases never raise errors to their callers; they report into a
//! shared [`Handler`] and keep going. The driver checks `has_errors()`
//! between phases and only runs a phase when everything upstream came back
//! clean.
//!
//! # Examples
//!
//! ```
//! use mkc_util::diagnostic::{Diagnostic, DiagnosticCode, Handler};
//! use mkc_util::span::Span;
//!
//! let handler = Handler::new();
//! handler.emit(
//!     Diagnostic::error(DiagnosticCode::E1001, "unexpected token `}`", Span::DUMMY),
//! );
//!
//! assert!(handler.has_errors());
//! assert_eq!(handler.error_count(), 1);
//! ```

mod codes;

pub use codes::{Category, DiagnosticCode};

use crate::span::{SourceMap, Span};
use std::cell::RefCell;
use std::fmt;

/// Diagnostic severity level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    /// An error that prevents compilation
    Error,
    /// A warning that does not prevent compilation
    Warning,
    /// Additional information attached to another diagnostic
    Note,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => write!(f, "error"),
            Level::Warning => write!(f, "warning"),
            Level::Note => write!(f, "note"),
        }
    }
}

/// A single diagnostic record.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    /// Severity
    pub level: Level,
    /// Error code; also determines the category
    pub code: DiagnosticCode,
    /// Main message
    pub message: String,
    /// Source location
    pub span: Span,
    /// Additional context lines
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn new(level: Level, code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self {
            level,
            code,
            message: message.into(),
            span,
            notes: Vec::new(),
        }
    }

    /// Create an error diagnostic.
    pub fn error(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self::new(Level::Error, code, message, span)
    }

    /// Create a warning diagnostic.
    pub fn warning(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self::new(Level::Warning, code, message, span)
    }

    /// Attach a note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Category of the diagnostic (derived from the code).
    pub fn category(&self) -> Category {
        self.code.category()
    }

    /// Render as `[E2006] file.mk:3:5: message`.
    pub fn render(&self, sources: &SourceMap) -> String {
        let mut out = format!(
            "[{}] {}:{}:{}: {}",
            self.code,
            sources.name(self.span.file_id),
            self.span.line,
            self.span.column,
            self.message
        );
        for note in &self.notes {
            out.push_str("\n  note: ");
            out.push_str(note);
        }
        out
    }
}

/// Handler that collects diagnostics for one compiler invocation.
///
/// Uses interior mutability so phases holding `&Handler` can report while
/// traversing shared structures. The buffer is append-only during a phase;
/// it is only read between phases.
#[derive(Default)]
pub struct Handler {
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl Handler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a diagnostic.
    pub fn emit(&self, diagnostic: Diagnostic) {
        self.diagnostics.borrow_mut().push(diagnostic);
    }

    /// True if any error-level diagnostic has been reported.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .borrow()
            .iter()
            .any(|d| d.level == Level::Error)
    }

    /// Number of error-level diagnostics.
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.level == Level::Error)
            .count()
    }

    /// Snapshot of all collected diagnostics.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    /// Diagnostics carrying a specific code.
    pub fn with_code(&self, code: DiagnosticCode) -> Vec<Diagnostic> {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.code == code)
            .cloned()
            .collect()
    }

    /// Drop all collected diagnostics.
    pub fn clear(&self) {
        self.diagnostics.borrow_mut().clear();
    }
}
