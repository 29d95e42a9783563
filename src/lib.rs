//! Caveats - partial evaluation of authorization conditions
//!
//! # Overview
//!
//! A caveat is a boolean expression attached to a relationship: the
//! relationship only holds when the caveat evaluates to `true` for the
//! context supplied at check time. Context often arrives in pieces, so
//! evaluation is three-valued:
//!
//! - every parameter the caveat needs is bound: the result is **decided**
//! - some are missing: the result is **partial**, carrying a residual
//!   caveat over just the missing parameters, which can be stored and
//!   evaluated later
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use caveats::{ContextValues, ParameterDeclarations, Type, Value, compile, evaluate_caveat};
//!
//! let parameters = ParameterDeclarations::from([
//!     ("age".to_string(), Type::Int),
//!     ("country".to_string(), Type::String),
//! ]);
//! let source = r#"age >= 18 && country == "US""#;
//! let expr = Arc::new(compile("adult_in_us", source, parameters).unwrap());
//!
//! // Only part of the context is known.
//! let context = ContextValues::from([("age".to_string(), Value::from(20))]);
//! let result = evaluate_caveat(&expr, context).unwrap();
//! assert!(result.is_partial());
//! assert_eq!(result.missing_var_names().unwrap(), ["country"]);
//!
//! // The residual needs nothing but the missing parameter.
//! let residual = Arc::new(result.partial_value().unwrap().clone());
//! let context = ContextValues::from([("country".to_string(), Value::from("US"))]);
//! assert!(evaluate_caveat(&residual, context).unwrap().value());
//! ```
//!
//! # Errors
//!
//! [`compile`] keeps the source text alongside the diagnostics, so failures
//! can be rendered with [`render_error`] and friends.

mod error;
mod error_renderer;

pub use error::Error;
pub use error_renderer::{
    render_error, render_error_to, render_error_to_string, render_error_to_string_no_color,
};

// Re-export public API from caveats_core
pub use caveats_core::api::{
    CompileError, CompileOptions, CompiledExpression, Diagnostic, EvaluationConfig,
    SerializationError, UnattributedPartial,
};
pub use caveats_core::evaluator::{
    CaveatResult, ContextValues, EvaluationError, NotPartial, Outcome, ParameterDeclarations,
    PartialValue, evaluate_caveat, evaluate_caveat_with_config,
};
pub use caveats_core::types::{self, Type};
pub use caveats_core::values::{self, Value};

/// Compile `source` into a caveat named `name`.
///
/// Same as [`caveats_core::api::compile`], except that a failure keeps the
/// source text so it can be rendered.
pub fn compile(
    name: &str,
    source: &str,
    parameters: ParameterDeclarations,
) -> Result<CompiledExpression, Error> {
    compile_with_options(name, source, parameters, &CompileOptions::default())
}

pub fn compile_with_options(
    name: &str,
    source: &str,
    parameters: ParameterDeclarations,
    options: &CompileOptions,
) -> Result<CompiledExpression, Error> {
    caveats_core::api::compile_with_options(name, source, parameters, options).map_err(|error| {
        Error::Compilation {
            code: source.to_string(),
            error,
        }
    })
}
