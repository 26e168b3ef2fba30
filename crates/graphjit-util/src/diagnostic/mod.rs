//! Diagnostic module - Error and warning reporting infrastructure.
//!
//! This module provides types for creating, reporting, and counting
//! diagnostics (errors and warnings) raised while lexing and parsing.
//!
//! # Examples
//!
//! ```
//! use graphjit_util::diagnostic::{DiagnosticBuilder, Handler};
//! use graphjit_util::Span;
//!
//! let handler = Handler::new();
//! DiagnosticBuilder::error("unexpected token")
//!     .span(Span::DUMMY)
//!     .emit(&handler);
//!
//! if handler.has_errors() {
//!     eprintln!("compilation failed with {} errors", handler.error_count());
//! }
//! ```

mod builder;

pub use builder::DiagnosticBuilder;

use crate::Span;
use std::cell::RefCell;
use std::fmt;

/// Diagnostic severity level
///
/// # Examples
///
/// ```
/// use graphjit_util::diagnostic::Level;
///
/// assert_eq!(format!("{}", Level::Error), "error");
/// assert_eq!(format!("{}", Level::Warning), "warning");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    /// An error that prevents compilation
    Error,
    /// A warning that doesn't prevent compilation
    Warning,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => write!(f, "error"),
            Level::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic message with severity and location
///
/// # Examples
///
/// ```
/// use graphjit_util::diagnostic::{Diagnostic, Level};
/// use graphjit_util::Span;
///
/// let diag = Diagnostic::error("something went wrong", Span::DUMMY);
/// assert_eq!(diag.level, Level::Error);
/// ```
#[derive(Clone, Debug)]
pub struct Diagnostic {
    /// Diagnostic severity level
    pub level: Level,
    /// Main diagnostic message
    pub message: String,
    /// Source location
    pub span: Span,
}

impl Diagnostic {
    /// Create an error diagnostic
    ///
    /// # Examples
    ///
    /// ```
    /// use graphjit_util::diagnostic::Diagnostic;
    /// use graphjit_util::Span;
    ///
    /// let diag = Diagnostic::error("something went wrong", Span::DUMMY);
    /// ```
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
            span,
        }
    }
}

/// Handler for collecting and reporting diagnostics
///
/// The `Handler` collects diagnostics raised over a compile and answers
/// whether any of them were errors.
///
/// # Examples
///
/// ```
/// use graphjit_util::diagnostic::{DiagnosticBuilder, Handler};
/// use graphjit_util::Span;
///
/// let handler = Handler::new();
/// DiagnosticBuilder::error("unexpected token").span(Span::DUMMY).emit(&handler);
///
/// if handler.has_errors() {
///     eprintln!("compilation failed with {} errors", handler.error_count());
/// }
/// ```
pub struct Handler {
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl Handler {
    /// Create a new handler
    ///
    /// # Examples
    ///
    /// ```
    /// use graphjit_util::diagnostic::Handler;
    ///
    /// let handler = Handler::new();
    /// ```
    pub fn new() -> Self {
        Self {
            diagnostics: RefCell::new(Vec::new()),
        }
    }

    /// Emit a pre-built diagnostic
    pub fn emit_diagnostic(&self, diagnostic: Diagnostic) {
        self.diagnostics.borrow_mut().push(diagnostic);
    }

    /// Check if any errors have been reported
    ///
    /// # Examples
    ///
    /// ```
    /// use graphjit_util::diagnostic::Handler;
    ///
    /// let handler = Handler::new();
    /// assert!(!handler.has_errors());
    /// ```
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .borrow()
            .iter()
            .any(|d| d.level == Level::Error)
    }

    /// Get the number of errors
    ///
    /// # Examples
    ///
    /// ```
    /// use graphjit_util::diagnostic::Handler;
    ///
    /// let handler = Handler::new();
    /// assert_eq!(handler.error_count(), 0);
    /// ```
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.level == Level::Error)
            .count()
    }
}

impl Default for Handler {
    fn default() -> Self {
        Self::new()
    }
}
