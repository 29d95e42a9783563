//! Partial evaluation of compiled caveats.
//!
//! Evaluation binds the caller's context, walks the expression with
//! three-valued logic under a cost budget, and either decides the caveat or
//! prunes it down to a residual over the parameters that are still missing.
//!
//! ## Design Principles
//!
//! - **Missing context is not an error**: unbound parameters evaluate to an
//!   unknown value, and an unknown root yields a partial result
//! - **Bounded**: every call charges a cost counter and tracks its depth
//! - **Stateless**: each call owns its activation, trace and cost counter, so
//!   a compiled expression can be evaluated concurrently from many threads
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use caveats_core::api::compile;
//! use caveats_core::evaluator::{evaluate_caveat, ContextValues, ParameterDeclarations};
//! use caveats_core::types::Type;
//! use caveats_core::values::Value;
//!
//! let parameters = ParameterDeclarations::from([("a".to_string(), Type::Bool), ("b".to_string(), Type::Bool)]);
//! let expr = Arc::new(compile("either", "a || b", parameters).unwrap());
//!
//! let result = evaluate_caveat(&expr, ContextValues::from([("a".to_string(), Value::from(true))])).unwrap();
//! assert!(!result.is_partial());
//! assert!(result.value());
//! ```

mod binder;
mod error;
mod eval;
mod operators;
mod prune;
mod result;
mod trace;

#[cfg(test)]
mod eval_test;

pub use binder::{ContextValues, ParameterDeclarations};
pub use error::{EvaluationError, NotPartial, RuntimeError, TypeError};
pub use result::{CaveatResult, Outcome};
pub use trace::{PartialValue, UnknownAttribute};

use std::sync::Arc;

use tracing::{debug, warn};

use crate::api::{CompiledExpression, EvaluationConfig, UnattributedPartial};

/// Evaluate a caveat against `context` with default limits.
///
/// Uses an unbounded cost budget and a depth limit of 1000.
pub fn evaluate_caveat(
    expr: &Arc<CompiledExpression>,
    context: ContextValues,
) -> Result<CaveatResult, EvaluationError> {
    evaluate_caveat_with_config(expr, context, &EvaluationConfig::default())
}

/// Evaluate a caveat against `context`.
///
/// ## Returns
///
/// - a decided result when the expression reduces to a boolean
/// - a partial result when it is blocked on unbound parameters
/// - an error for type mismatches, exhausted budgets and runtime failures
///
/// ## Example
///
/// ```ignore
/// let config = EvaluationConfig::with_max_cost(100);
/// let result = evaluate_caveat_with_config(&expr, context, &config)?;
/// ```
pub fn evaluate_caveat_with_config(
    expr: &Arc<CompiledExpression>,
    context: ContextValues,
    config: &EvaluationConfig,
) -> Result<CaveatResult, EvaluationError> {
    debug!(
        caveat = expr.name(),
        bound = context.len(),
        declared = expr.parameters().len(),
        "evaluating caveat"
    );

    let outcome = evaluate(expr, &context, config)?;
    Ok(CaveatResult::new(Arc::clone(expr), context, outcome))
}

fn evaluate(
    expr: &CompiledExpression,
    context: &ContextValues,
    config: &EvaluationConfig,
) -> Result<Outcome, EvaluationError> {
    let activation = binder::Activation::bind(expr.parameters(), context)?;
    let mut evaluator = eval::Evaluator::new(expr.name(), &activation, config);
    let root = evaluator.eval(expr.ast())?;
    let cost = evaluator.cost();

    match eval::truth(&root)? {
        Some(value) => {
            debug!(caveat = expr.name(), value, cost, "caveat decided");
            Ok(Outcome::Decided(value))
        }
        None => {
            let trace = evaluator.into_trace();
            let residual = prune::prune(expr.ast(), &trace);
            check_attribution(expr.name(), &residual.missing, config.unattributed_partial)?;
            debug!(
                caveat = expr.name(),
                missing = ?residual.missing,
                cost,
                traced = trace.len(),
                "caveat partially evaluated"
            );

            let referenced = residual.expr.referenced_names();
            let parameters: ParameterDeclarations = expr
                .parameters()
                .iter()
                .filter(|(name, _)| referenced.contains(&name.as_str()))
                .map(|(name, ty)| (name.clone(), ty.clone()))
                .collect();
            Ok(Outcome::Partial {
                residual: CompiledExpression::new(expr.name(), residual.expr, parameters),
                missing_var_names: residual.missing,
            })
        }
    }
}

/// Apply the unattributed-partial policy to an undecided result.
fn check_attribution(
    caveat: &str,
    missing: &[String],
    policy: UnattributedPartial,
) -> Result<(), EvaluationError> {
    if !missing.is_empty() {
        return Ok(());
    }
    match policy {
        UnattributedPartial::Allow => {
            warn!(caveat, "undecided caveat with no attributable missing parameters");
            Ok(())
        }
        UnattributedPartial::Reject => Err(EvaluationError::Internal(format!(
            "caveat '{}' is undecided but no parameter is missing",
            caveat
        ))),
    }
}
