//! Error types for JIT code generation.

use thiserror::Error;

/// Error type for the lowering and JIT-compilation stages.
#[derive(Debug, Error)]
pub enum CodeGenError {
    /// The AST handed to the code generator contained an `Error` node.
    #[error("cannot compile an expression tree containing an error node")]
    InvalidExpression,

    /// An LLVM IR builder call failed.
    #[error("LLVM operation failed: {0}")]
    LlvmOperationFailed(String),

    /// A named function (user-facing or a math intrinsic) was not found.
    #[error("function '{0}' not found")]
    FunctionNotFound(String),

    /// Building the JIT execution engine for a module failed.
    #[error("failed to create JIT execution engine: {0}")]
    JitCreationFailed(String),

    /// The JIT could not resolve the address of a compiled function.
    #[error("failed to locate compiled function '{0}' in the JIT")]
    SymbolLookupFailed(String),

    /// Internal error - indicates a bug.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias for code generation operations.
pub type Result<T> = std::result::Result<T, CodeGenError>;
