//! Compiled caveat expressions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    evaluator::ParameterDeclarations,
    parser::{Expr, UnparseError},
};

/// A compiled caveat: its name, expression tree and declared parameters.
///
/// Compiled expressions are immutable and own all of their data, so one
/// instance can be shared through an `Arc` by any number of concurrent
/// evaluations. The residual of a partial evaluation is itself a compiled
/// expression and can be persisted with [`CompiledExpression::serialize`]
/// and evaluated again later.
///
/// # Example
///
/// ```
/// use caveats_core::api::CompiledExpression;
/// use caveats_core::parser::{Expr, Literal};
///
/// let expr = CompiledExpression::new("always", Expr::from(Literal::Bool(true)), Default::default());
/// assert_eq!(expr.name(), "always");
/// assert_eq!(expr.unparse().unwrap(), "true");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledExpression {
    name: String,
    ast: Expr,
    parameters: ParameterDeclarations,
}

#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("failed to encode compiled expression: {0}")]
    Encode(postcard::Error),

    #[error("failed to decode compiled expression: {0}")]
    Decode(postcard::Error),
}

impl CompiledExpression {
    /// Wrap an already built expression tree.
    ///
    /// No validation happens here; references to undeclared names surface
    /// as errors when the expression is evaluated.
    pub fn new(name: impl Into<String>, ast: Expr, parameters: ParameterDeclarations) -> Self {
        Self {
            name: name.into(),
            ast,
            parameters,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ast(&self) -> &Expr {
        &self.ast
    }

    pub fn parameters(&self) -> &ParameterDeclarations {
        &self.parameters
    }

    /// Source form of the expression.
    pub fn unparse(&self) -> Result<String, UnparseError> {
        self.ast.unparse()
    }

    pub fn serialize(&self) -> Result<Vec<u8>, SerializationError> {
        postcard::to_allocvec(self).map_err(SerializationError::Encode)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, SerializationError> {
        postcard::from_bytes(bytes).map_err(SerializationError::Decode)
    }
}
