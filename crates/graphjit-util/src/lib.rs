//! graphjit-util - Shared foundation types for the graphjit pipeline.
//!
//! This crate holds the pieces every other stage depends on: source spans,
//! the diagnostic/error-reporting machinery, and string interning.

pub mod diagnostic;
pub mod span;
pub mod symbol;

pub use diagnostic::{Diagnostic, DiagnosticBuilder, Handler, Level};
pub use span::Span;
pub use symbol::Symbol;
