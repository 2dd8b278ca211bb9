//! Compilation context threaded through translation

use crate::config::CompilerOptions;
use serde::{Deserialize, Serialize};

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational, no action required
    Info,
    /// Potential issue worth reviewing
    Warning,
    /// The query was not compiled as written
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A non-fatal observation made while compiling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Diagnostic code (e.g. "Z001")
    pub code: String,
    pub severity: Severity,
    /// Human-readable message
    pub message: String,
    /// Relational node or view the diagnostic is about
    pub node: Option<String>,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}] {}", self.severity, self.code, self.message)?;
        if let Some(node) = &self.node {
            write!(f, " ({node})")?;
        }
        Ok(())
    }
}

/// Per-compilation state: options plus collected diagnostics
#[derive(Debug, Default)]
pub struct CompilationContext {
    options: CompilerOptions,
    diagnostics: Vec<Diagnostic>,
}

impl CompilationContext {
    pub fn new(options: CompilerOptions) -> Self {
        Self {
            options,
            diagnostics: Vec::new(),
        }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Record a diagnostic
    pub fn report(
        &mut self,
        code: &str,
        severity: Severity,
        message: impl Into<String>,
        node: Option<String>,
    ) {
        let diagnostic = Diagnostic {
            code: code.to_string(),
            severity,
            message: message.into(),
            node,
        };
        log::debug!("{diagnostic}");
        self.diagnostics.push(diagnostic);
    }

    pub(crate) fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
