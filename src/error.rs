use caveats_core::{api::CompileError, evaluator::EvaluationError};
use thiserror::Error;

/// Errors surfaced by the top-level API.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The caveat did not compile. `code` is the source it was compiled from.
    #[error("{error}")]
    Compilation { code: String, error: CompileError },

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}
