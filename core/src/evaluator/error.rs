//! Evaluation errors.
//!
//! Missing context is never an error: an expression blocked on unbound
//! parameters produces a partial result instead. Everything here is a hard
//! failure for the evaluation call that raised it.
//!
//! # Error Categories
//!
//! - **Type errors**: a context value does not fit its declared parameter
//!   type, the expression references an undeclared name, or an operator is
//!   applied to operands it is not defined for.
//!
//! - **Resource exceeded errors**: the cost budget or the recursion depth
//!   limit was hit. The caller may retry with a larger budget.
//!
//! - **Runtime errors**: well-typed operations that still fail on specific
//!   values (division by zero, overflow, missing map key, ...).
//!
//! - **Internal errors**: a broken invariant between the compiler and the
//!   engine. These are logged and surfaced, never swallowed.

use thiserror::Error;

use crate::types::Type;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    #[error(transparent)]
    Type(#[from] TypeError),

    #[error("caveat '{caveat}' exceeded its cost limit of {limit}")]
    CostLimitExceeded { caveat: String, limit: u64 },

    #[error("evaluation stack overflow: depth {depth} exceeds maximum of {max_depth}")]
    DepthLimitExceeded { depth: usize, max_depth: usize },

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TypeError {
    #[error("parameter '{name}' expects {expected}, got {found}")]
    ParameterMismatch {
        name: String,
        expected: Type,
        found: &'static str,
    },

    #[error("reference to undeclared name '{name}'")]
    UndeclaredReference { name: String },

    #[error("operator '{op}' cannot be applied to {left} and {right}")]
    OperandMismatch {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },

    #[error("operator '{op}' cannot be applied to {operand}")]
    UnaryOperandMismatch {
        op: &'static str,
        operand: &'static str,
    },

    #[error("expected bool, got {found}")]
    NotABoolean { found: &'static str },

    #[error("unknown function '{name}'")]
    UnknownFunction { name: String },

    #[error("function '{name}' expects {expected} argument(s), got {found}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("function '{name}' is not defined for {receiver}")]
    NoSuchOverload {
        name: &'static str,
        receiver: &'static str,
    },

    #[error("cannot select field '{field}' from {found}")]
    NotSelectable { field: String, found: &'static str },

    #[error("cannot index {container} with {index}")]
    NotIndexable {
        container: &'static str,
        index: &'static str,
    },

    #[error("map keys must be strings, got {found}")]
    InvalidMapKey { found: &'static str },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow in '{op}'")]
    Overflow { op: &'static str },

    #[error("no such key: '{key}'")]
    NoSuchKey { key: String },

    #[error("index {index} out of bounds (length: {len})")]
    IndexOutOfBounds { index: i64, len: usize },

    #[error("cannot convert '{value}' to {target}")]
    InvalidConversion { value: String, target: &'static str },

    #[error("duplicate map key '{key}'")]
    DuplicateKey { key: String },
}

/// Returned when partial-only data is requested from a decided result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("result is fully evaluated")]
pub struct NotPartial;
