//! Public API for compiling and evaluating caveats.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use caveats_core::api::compile;
//! use caveats_core::evaluator::{evaluate_caveat, ContextValues, ParameterDeclarations};
//! use caveats_core::types::Type;
//! use caveats_core::values::Value;
//!
//! let parameters = ParameterDeclarations::from([
//!     ("age".to_string(), Type::Int),
//!     ("country".to_string(), Type::String),
//! ]);
//! let expr = Arc::new(compile("adult_in_us", r#"age >= 18 && country == "US""#, parameters).unwrap());
//!
//! let context = ContextValues::from([("age".to_string(), Value::from(20))]);
//! let result = evaluate_caveat(&expr, context).unwrap();
//! assert!(result.is_partial());
//! assert_eq!(result.missing_var_names().unwrap(), ["country"]);
//! ```

pub mod compiler;
pub mod error;
pub mod expression;
pub mod options;

pub use compiler::{compile, compile_with_options};
pub use error::{CompileError, Diagnostic};
pub use expression::{CompiledExpression, SerializationError};
pub use options::{CompileOptions, EvaluationConfig, UnattributedPartial};
