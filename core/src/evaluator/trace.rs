//! Evaluation trace.
//!
//! Records the outcome of every node the evaluator visits, keyed by node
//! address. The pruner reads it back while walking the same tree, so the
//! tree must not be moved or mutated between evaluation and pruning.

use hashbrown::HashMap;

use crate::{parser::Expr, values::Value};

/// Three-valued evaluation result.
#[derive(Debug, Clone, PartialEq)]
pub enum PartialValue {
    Known(Value),
    Unknown,
}

impl PartialValue {
    pub fn is_known(&self) -> bool {
        matches!(self, PartialValue::Known(_))
    }
}

/// Raised when evaluation reads a declared parameter the context does not
/// bind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAttribute {
    pub name: String,
    /// Every parameter declared next to `name`.
    pub declared: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TraceEntry {
    Known(Value),
    /// `Some` for reads of an unbound parameter.
    Unknown(Option<UnknownAttribute>),
}

#[derive(Debug, Default)]
pub(crate) struct EvaluationTrace {
    entries: HashMap<*const Expr, TraceEntry>,
}

impl EvaluationTrace {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&self, expr: &Expr) -> Option<&TraceEntry> {
        self.entries.get(&expr.as_ptr())
    }

    /// Record the outcome of `expr`. An attributed unknown recorded earlier
    /// for the same node is kept.
    pub(crate) fn record(&mut self, expr: &Expr, value: &PartialValue) {
        match value {
            PartialValue::Known(value) => {
                self.entries
                    .insert(expr.as_ptr(), TraceEntry::Known(value.clone()));
            }
            PartialValue::Unknown => {
                self.entries
                    .entry(expr.as_ptr())
                    .or_insert(TraceEntry::Unknown(None));
            }
        }
    }

    pub(crate) fn record_unknown_attribute(&mut self, expr: &Expr, attribute: UnknownAttribute) {
        self.entries
            .insert(expr.as_ptr(), TraceEntry::Unknown(Some(attribute)));
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
