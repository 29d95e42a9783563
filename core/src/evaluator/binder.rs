//! Context binder.
//!
//! Merges the caller's context into the variable environment an evaluation
//! reads from. Declared parameters missing from the context are *unbound*:
//! reading them yields an unknown value rather than an error.

use std::collections::BTreeMap;

use hashbrown::HashMap;
use tracing::trace;

use crate::{
    evaluator::{EvaluationError, TypeError},
    types::Type,
    values::Value,
};

/// Runtime values supplied by the caller, keyed by parameter name.
pub type ContextValues = BTreeMap<String, Value>;

/// Declared parameters of a caveat and their types.
pub type ParameterDeclarations = BTreeMap<String, Type>;

/// Result of looking a name up in an [`Activation`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Binding<'a> {
    Bound(&'a Value),
    Unbound,
    Undeclared,
}

/// Partial variable environment for one evaluation call.
#[derive(Debug)]
pub(crate) struct Activation<'a> {
    declarations: &'a ParameterDeclarations,
    bound: HashMap<&'a str, Value>,
}

impl<'a> Activation<'a> {
    /// Bind `context` against `declarations`.
    ///
    /// Declared values are coerced to their declared type. Context keys that
    /// are not declared pass through unchanged.
    pub(crate) fn bind(
        declarations: &'a ParameterDeclarations,
        context: &'a ContextValues,
    ) -> Result<Self, EvaluationError> {
        let mut bound = HashMap::with_capacity(context.len());
        for (name, value) in context {
            let value = match declarations.get(name) {
                Some(ty) => ty.coerce(value).ok_or_else(|| TypeError::ParameterMismatch {
                    name: name.clone(),
                    expected: ty.clone(),
                    found: value.kind(),
                })?,
                None => {
                    trace!(name = name.as_str(), "binding undeclared context value");
                    value.clone()
                }
            };
            bound.insert(name.as_str(), value);
        }
        Ok(Self {
            declarations,
            bound,
        })
    }

    pub(crate) fn lookup(&self, name: &str) -> Binding<'_> {
        match self.bound.get(name) {
            Some(value) => Binding::Bound(value),
            None if self.declarations.contains_key(name) => Binding::Unbound,
            None => Binding::Undeclared,
        }
    }

    /// Names of all declared parameters, sorted.
    pub(crate) fn declared_names(&self) -> Vec<String> {
        self.declarations.keys().cloned().collect()
    }
}
