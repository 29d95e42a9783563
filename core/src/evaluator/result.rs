//! Outcome of a caveat evaluation.

use std::sync::Arc;

use crate::{
    api::CompiledExpression,
    evaluator::{ContextValues, NotPartial},
    parser::UnparseError,
};

/// Whether the caveat was decided, and if not, what is left to decide.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Decided(bool),
    Partial {
        /// The caveat simplified against the supplied context. It keeps the
        /// parent's name and only the parameters it still references.
        residual: CompiledExpression,
        /// Unbound parameters the residual depends on, in first-read order.
        /// Empty when the undecided result could not be attributed.
        missing_var_names: Vec<String>,
    },
}

/// Result of evaluating a caveat against a context.
///
/// Besides the [`Outcome`] it carries provenance: the full context the
/// caller supplied and the expression that was evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct CaveatResult {
    parent: Arc<CompiledExpression>,
    context_values: ContextValues,
    outcome: Outcome,
}

impl CaveatResult {
    pub(crate) fn new(
        parent: Arc<CompiledExpression>,
        context_values: ContextValues,
        outcome: Outcome,
    ) -> Self {
        Self {
            parent,
            context_values,
            outcome,
        }
    }

    /// The decided value. Always `false` for a partial result; check
    /// [`CaveatResult::is_partial`] first.
    pub fn value(&self) -> bool {
        match self.outcome {
            Outcome::Decided(value) => value,
            Outcome::Partial { .. } => false,
        }
    }

    pub fn is_partial(&self) -> bool {
        matches!(self.outcome, Outcome::Partial { .. })
    }

    /// The residual expression of a partial result.
    pub fn partial_value(&self) -> Result<&CompiledExpression, NotPartial> {
        match &self.outcome {
            Outcome::Partial { residual, .. } => Ok(residual),
            Outcome::Decided(_) => Err(NotPartial),
        }
    }

    pub fn missing_var_names(&self) -> Result<&[String], NotPartial> {
        match &self.outcome {
            Outcome::Partial {
                missing_var_names, ..
            } => Ok(missing_var_names),
            Outcome::Decided(_) => Err(NotPartial),
        }
    }

    /// The context supplied to the evaluation, unpruned.
    pub fn context_values(&self) -> &ContextValues {
        &self.context_values
    }

    /// Source form of the evaluated expression (not of the residual).
    pub fn expression_string(&self) -> Result<String, UnparseError> {
        self.parent.unparse()
    }

    pub fn parent(&self) -> &Arc<CompiledExpression> {
        &self.parent
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn into_outcome(self) -> Outcome {
        self.outcome
    }
}
