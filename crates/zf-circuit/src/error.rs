//! Error types for zf-circuit

use thiserror::Error;
use zf_ir::{ErrorKind, IrError};

/// Circuit construction and rewrite error
#[derive(Error, Debug)]
pub enum CircuitError {
    /// CE001: Operator input count does not match its kind
    #[error("[CE001] Operator '{operator}' expects {expected} input(s), got {actual}")]
    Arity {
        operator: String,
        expected: String,
        actual: usize,
    },

    /// CE002: Input refers to an operator that does not precede this one
    #[error("[CE002] Operator '{operator}' refers to unknown input {input}")]
    UnknownInput { operator: String, input: usize },

    /// CE003: Declared and derived types disagree
    #[error("[CE003] Type mismatch in '{operator}': expected {expected}, found {found}")]
    TypeMismatch {
        operator: String,
        expected: String,
        found: String,
    },

    /// CE004: Operator violates a structural invariant
    #[error("[CE004] Malformed operator '{operator}': {message}")]
    Malformed { operator: String, message: String },

    /// CE005: Operator id not present in the circuit
    #[error("[CE005] No operator with id {0}")]
    NoSuchOperator(usize),

    /// CE006: Source table declared twice
    #[error("[CE006] Duplicate source '{0}'")]
    DuplicateSource(String),

    /// CE007: The operator graph has a cycle
    #[error("[CE007] Circuit '{0}' contains a cycle")]
    Cycle(String),

    /// CE008: Expression IR error
    #[error("[CE008] {0}")]
    Ir(#[from] IrError),

    /// CE009: Serialization failed
    #[error("[CE009] Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// CE010: Reference evaluation failed
    #[error("[CE010] Evaluation failed: {0}")]
    Evaluation(String),
}

impl CircuitError {
    pub(crate) fn mismatch(
        operator: &str,
        expected: impl std::fmt::Display,
        found: impl std::fmt::Display,
    ) -> Self {
        CircuitError::TypeMismatch {
            operator: operator.to_string(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    pub(crate) fn malformed(operator: &str, message: impl Into<String>) -> Self {
        CircuitError::Malformed {
            operator: operator.to_string(),
            message: message.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            CircuitError::Ir(e) => e.kind(),
            CircuitError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            _ => ErrorKind::Malformed,
        }
    }

    pub fn is_unsupported(&self) -> bool {
        self.kind() == ErrorKind::Unimplemented
    }
}

/// Result type alias for CircuitError
pub type CircuitResult<T> = Result<T, CircuitError>;
