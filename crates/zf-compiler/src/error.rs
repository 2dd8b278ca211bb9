//! Error types for zf-compiler

use thiserror::Error;
use zf_circuit::CircuitError;
use zf_ir::{ErrorKind, IrError};

/// Compilation error
#[derive(Error, Debug)]
pub enum CompileError {
    /// CP001: Relational construct the compiler cannot translate
    #[error("[CP001] Unsupported construct: {construct}")]
    Unimplemented { construct: String },

    /// CP002: Statement refers to a table that was never created
    #[error("[CP002] Unknown table: {name}")]
    UnknownTable { name: String },

    /// CP003: Table created twice
    #[error("[CP003] Duplicate table: {name}")]
    DuplicateTable { name: String },

    /// CP004: View created twice
    #[error("[CP004] Duplicate view: {name}")]
    DuplicateView { name: String },

    /// CP005: Join condition yielded neither equalities nor a residual
    #[error("[CP005] Empty join condition")]
    EmptyJoinCondition,

    /// CP006: Relational node violates its own schema
    #[error("[CP006] Malformed {node}: {message}")]
    Malformed { node: String, message: String },

    /// CP007: Configuration file not found
    #[error("[CP007] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// CP008: Invalid configuration value
    #[error("[CP008] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// CP009: IO error with file path context
    #[error("[CP009] IO error at {path}: {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// CP010: Configuration could not be parsed
    #[error("[CP010] Failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// CP011: Expression IR error
    #[error("[CP011] {0}")]
    Ir(#[from] IrError),

    /// CP012: Circuit construction error
    #[error("[CP012] {0}")]
    Circuit(#[from] CircuitError),
}

impl CompileError {
    pub(crate) fn unimplemented(construct: impl Into<String>) -> Self {
        CompileError::Unimplemented {
            construct: construct.into(),
        }
    }

    pub(crate) fn malformed(node: impl Into<String>, message: impl Into<String>) -> Self {
        CompileError::Malformed {
            node: node.into(),
            message: message.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            CompileError::Unimplemented { .. } => ErrorKind::Unimplemented,
            CompileError::Ir(e) => e.kind(),
            CompileError::Circuit(e) => e.kind(),
            _ => ErrorKind::Malformed,
        }
    }

    /// Whether the input is outside what the compiler translates, as
    /// opposed to a translator bug or malformed input
    pub fn is_unsupported(&self) -> bool {
        self.kind() == ErrorKind::Unimplemented
    }
}

/// Result type alias for CompileError
pub type CompileResult<T> = Result<T, CompileError>;
