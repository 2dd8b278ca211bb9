//! Error types for zf-ir

use thiserror::Error;

/// Broad classification shared by every error in the workspace.
///
/// `Unimplemented` means the input uses a construct that is not supported and
/// should be rejected. The other two mean an IR node was built incorrectly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Construct is valid but not supported
    Unimplemented,
    /// Declared and actual types disagree
    TypeMismatch,
    /// A node violates a structural invariant
    Malformed,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Unimplemented => write!(f, "unimplemented"),
            ErrorKind::TypeMismatch => write!(f, "type mismatch"),
            ErrorKind::Malformed => write!(f, "malformed"),
        }
    }
}

/// IR construction error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IrError {
    /// IR001: Operation has no meaning for the given node
    #[error("[IR001] Unimplemented: {construct}")]
    Unimplemented { construct: String },

    /// IR002: Types disagree
    #[error("[IR002] Type mismatch in {context}: expected {expected}, found {found}")]
    TypeMismatch {
        context: String,
        expected: String,
        found: String,
    },

    /// IR003: Structural invariant violated
    #[error("[IR003] Malformed {node}: {message}")]
    Malformed { node: String, message: String },

    /// IR004: Z-set weight left the representable range
    #[error("[IR004] Weight overflow while combining {element}")]
    WeightOverflow { element: String },
}

impl IrError {
    pub(crate) fn unimplemented(construct: impl Into<String>) -> Self {
        IrError::Unimplemented {
            construct: construct.into(),
        }
    }

    pub(crate) fn mismatch(
        context: impl Into<String>,
        expected: impl std::fmt::Display,
        found: impl std::fmt::Display,
    ) -> Self {
        IrError::TypeMismatch {
            context: context.into(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    pub(crate) fn malformed(node: impl Into<String>, message: impl Into<String>) -> Self {
        IrError::Malformed {
            node: node.into(),
            message: message.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            IrError::Unimplemented { .. } => ErrorKind::Unimplemented,
            IrError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            IrError::Malformed { .. } | IrError::WeightOverflow { .. } => ErrorKind::Malformed,
        }
    }

    /// True when the error rejects an unsupported construct rather than
    /// reporting a broken IR node
    pub fn is_unsupported(&self) -> bool {
        self.kind() == ErrorKind::Unimplemented
    }
}

/// Result type alias for IrError
pub type IrResult<T> = Result<T, IrError>;
