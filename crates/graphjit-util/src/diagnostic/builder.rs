//! Diagnostic builder for fluent diagnostic construction.
//!
//! This module provides the [`DiagnosticBuilder`] type for constructing
//! diagnostics with a fluent API.

use super::{Diagnostic, Level, Span};

/// Builder for constructing diagnostics with a fluent API
///
/// # Examples
///
/// ```
/// use graphjit_util::diagnostic::{DiagnosticBuilder, Handler};
/// use graphjit_util::Span;
///
/// let handler = Handler::new();
/// DiagnosticBuilder::error("unexpected token")
///     .span(Span::DUMMY)
///     .emit(&handler);
///
/// assert!(handler.has_errors());
/// ```
pub struct DiagnosticBuilder {
    level: Level,
    message: String,
    span: Span,
}

impl DiagnosticBuilder {
    fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            span: Span::DUMMY,
        }
    }

    /// Create an error builder
    ///
    /// # Examples
    ///
    /// ```
    /// use graphjit_util::diagnostic::DiagnosticBuilder;
    ///
    /// let builder = DiagnosticBuilder::error("unexpected token");
    /// ```
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Level::Error, message)
    }

    /// Set the source span
    ///
    /// # Examples
    ///
    /// ```
    /// use graphjit_util::diagnostic::DiagnosticBuilder;
    /// use graphjit_util::Span;
    ///
    /// let span = Span::new(10, 20, 1, 5);
    /// let builder = DiagnosticBuilder::error("error here").span(span);
    /// ```
    pub fn span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    fn build(self) -> Diagnostic {
        Diagnostic {
            level: self.level,
            message: self.message,
            span: self.span,
        }
    }

    /// Build and emit the diagnostic to the given handler
    ///
    /// # Examples
    ///
    /// ```
    /// use graphjit_util::diagnostic::{DiagnosticBuilder, Handler};
    /// use graphjit_util::Span;
    ///
    /// let handler = Handler::new();
    /// DiagnosticBuilder::error("something went wrong")
    ///     .span(Span::DUMMY)
    ///     .emit(&handler);
    ///
    /// assert!(handler.has_errors());
    /// ```
    pub fn emit(self, handler: &super::Handler) {
        handler.emit_diagnostic(self.build());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_error() {
        let diag = DiagnosticBuilder::error("test error").span(Span::DUMMY).build();

        assert_eq!(diag.level, Level::Error);
        assert_eq!(diag.message, "test error");
    }

    #[test]
    fn test_builder_span() {
        let span = Span::new(0, 2, 1, 1);
        let diag = DiagnosticBuilder::error("unexpected token").span(span).build();

        assert_eq!(diag.span, span);
    }

    #[test]
    fn test_builder_emit() {
        use super::super::Handler;

        let handler = Handler::new();
        DiagnosticBuilder::error("test error")
            .span(Span::DUMMY)
            .emit(&handler);

        assert!(handler.has_errors());
        assert_eq!(handler.error_count(), 1);
    }
}
