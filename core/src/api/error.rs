//! Compilation errors.
//!
//! A caveat that fails to compile reports every problem found, each as a
//! [`Diagnostic`] pointing at the offending part of the source.

use thiserror::Error;

use crate::parser::{ParseError, Span};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    /// The source does not parse. Parsing stops at the first error.
    #[error("caveat '{name}' has a syntax error: {error}")]
    Parse { name: String, error: ParseError },

    /// The source parses but refers to names that cannot be resolved.
    #[error("caveat '{name}' failed to compile with {} error(s)", .diagnostics.len())]
    Invalid {
        name: String,
        diagnostics: Vec<Diagnostic>,
    },
}

impl CompileError {
    /// Every problem as a diagnostic, in source order.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            CompileError::Parse { error, .. } => vec![Diagnostic {
                message: error.kind.to_string(),
                span: error.span.clone(),
                help: None,
            }],
            CompileError::Invalid { diagnostics, .. } => diagnostics.clone(),
        }
    }
}

/// A single problem with a source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    pub span: Span,
    /// Optional text suggesting how to fix the issue.
    pub help: Option<String>,
}
