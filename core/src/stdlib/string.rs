//! String and collection inspection functions.
//!
//! `size` counts UTF-8 codepoints for strings and bytes for byte strings.

use crate::{
    evaluator::{EvaluationError, RuntimeError, TypeError},
    values::Value,
};

// ============================================================================
// Inspection Functions
// ============================================================================

pub(super) fn size(value: &Value) -> Result<Value, EvaluationError> {
    let len = match value {
        Value::Str(s) => s.chars().count(),
        Value::Bytes(b) => b.len(),
        Value::List(items) => items.len(),
        Value::Map(entries) => entries.len(),
        other => {
            return Err(TypeError::NoSuchOverload {
                name: "size",
                receiver: other.kind(),
            }
            .into());
        }
    };
    i64::try_from(len)
        .map(Value::Int)
        .map_err(|_| RuntimeError::Overflow { op: "size" }.into())
}

// ============================================================================
// Matching Functions
// ============================================================================

pub(super) fn contains(haystack: &Value, needle: &Value) -> Result<Value, EvaluationError> {
    let (haystack, needle) = string_operands("contains", haystack, needle)?;
    Ok(Value::Bool(haystack.contains(needle)))
}

pub(super) fn starts_with(value: &Value, prefix: &Value) -> Result<Value, EvaluationError> {
    let (value, prefix) = string_operands("startsWith", value, prefix)?;
    Ok(Value::Bool(value.starts_with(prefix)))
}

pub(super) fn ends_with(value: &Value, suffix: &Value) -> Result<Value, EvaluationError> {
    let (value, suffix) = string_operands("endsWith", value, suffix)?;
    Ok(Value::Bool(value.ends_with(suffix)))
}

fn string_operands<'a>(
    name: &'static str,
    receiver: &'a Value,
    argument: &'a Value,
) -> Result<(&'a str, &'a str), EvaluationError> {
    match (receiver, argument) {
        (Value::Str(receiver), Value::Str(argument)) => Ok((receiver.as_str(), argument.as_str())),
        (Value::Str(_), other) | (other, _) => Err(TypeError::NoSuchOverload {
            name,
            receiver: other.kind(),
        }
        .into()),
    }
}
