//! Standard functions available to caveat expressions.
//!
//! The table below is shared by the compiler, which rejects unknown
//! functions and wrong arities up front, and by the evaluator, which
//! dispatches calls once every operand is known.
//!
//! Functions may be callable globally (`size(x)`), as a method on their
//! first operand (`x.size()`), or both. In method form the receiver is
//! passed as the first operand.

mod conversions;
mod string;

use crate::{
    evaluator::{EvaluationError, TypeError},
    values::Value,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStyle {
    Global,
    Method,
}

/// Declaration of a standard function.
///
/// Arities count explicit arguments only, never the method receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionDecl {
    pub name: &'static str,
    pub global_arity: Option<usize>,
    pub method_arity: Option<usize>,
}

impl FunctionDecl {
    pub fn arity(&self, style: CallStyle) -> Option<usize> {
        match style {
            CallStyle::Global => self.global_arity,
            CallStyle::Method => self.method_arity,
        }
    }
}

pub static FUNCTIONS: &[FunctionDecl] = &[
    FunctionDecl {
        name: "size",
        global_arity: Some(1),
        method_arity: Some(0),
    },
    FunctionDecl {
        name: "contains",
        global_arity: None,
        method_arity: Some(1),
    },
    FunctionDecl {
        name: "startsWith",
        global_arity: None,
        method_arity: Some(1),
    },
    FunctionDecl {
        name: "endsWith",
        global_arity: None,
        method_arity: Some(1),
    },
    FunctionDecl {
        name: "int",
        global_arity: Some(1),
        method_arity: None,
    },
    FunctionDecl {
        name: "uint",
        global_arity: Some(1),
        method_arity: None,
    },
    FunctionDecl {
        name: "double",
        global_arity: Some(1),
        method_arity: None,
    },
    FunctionDecl {
        name: "string",
        global_arity: Some(1),
        method_arity: None,
    },
];

pub fn lookup(name: &str) -> Option<&'static FunctionDecl> {
    FUNCTIONS.iter().find(|decl| decl.name == name)
}

/// Invoke a standard function on fully known operands.
pub(crate) fn call(
    name: &str,
    receiver: Option<Value>,
    args: Vec<Value>,
) -> Result<Value, EvaluationError> {
    let style = if receiver.is_some() {
        CallStyle::Method
    } else {
        CallStyle::Global
    };
    let (decl, expected) = lookup(name)
        .and_then(|decl| Some((decl, decl.arity(style)?)))
        .ok_or_else(|| TypeError::UnknownFunction {
            name: name.to_string(),
        })?;
    if args.len() != expected {
        return Err(TypeError::ArityMismatch {
            name: name.to_string(),
            expected,
            found: args.len(),
        }
        .into());
    }

    let operands: Vec<Value> = receiver.into_iter().chain(args).collect();
    match (decl.name, operands.as_slice()) {
        ("size", [value]) => string::size(value),
        ("contains", [haystack, needle]) => string::contains(haystack, needle),
        ("startsWith", [value, prefix]) => string::starts_with(value, prefix),
        ("endsWith", [value, suffix]) => string::ends_with(value, suffix),
        ("int", [value]) => conversions::to_int(value),
        ("uint", [value]) => conversions::to_uint(value),
        ("double", [value]) => conversions::to_double(value),
        ("string", [value]) => conversions::to_string(value),
        (name, operands) => Err(EvaluationError::Internal(format!(
            "no implementation for '{}' with {} operand(s)",
            name,
            operands.len()
        ))),
    }
}
