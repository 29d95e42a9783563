//! Conversion functions: `int`, `uint`, `double` and `string`.
//!
//! Doubles truncate toward zero when converted to integers and fail when
//! out of range. Strings are parsed with Rust's standard number syntax.

use crate::{
    evaluator::{EvaluationError, RuntimeError, TypeError},
    values::Value,
};

pub(super) fn to_int(value: &Value) -> Result<Value, EvaluationError> {
    match value {
        Value::Int(i) => Ok(Value::Int(*i)),
        Value::UInt(u) => i64::try_from(*u)
            .map(Value::Int)
            .map_err(|_| invalid(value, "int")),
        // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
        Value::Double(d) if *d >= i64::MIN as f64 && *d < i64::MAX as f64 => {
            Ok(Value::Int(d.trunc() as i64))
        }
        Value::Double(_) => Err(invalid(value, "int")),
        Value::Str(s) => s
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| invalid(value, "int")),
        other => Err(no_overload("int", other)),
    }
}

pub(super) fn to_uint(value: &Value) -> Result<Value, EvaluationError> {
    match value {
        Value::UInt(u) => Ok(Value::UInt(*u)),
        Value::Int(i) => u64::try_from(*i)
            .map(Value::UInt)
            .map_err(|_| invalid(value, "uint")),
        Value::Double(d) if *d > -1.0 && *d < u64::MAX as f64 => {
            Ok(Value::UInt(d.trunc() as u64))
        }
        Value::Double(_) => Err(invalid(value, "uint")),
        Value::Str(s) => s
            .parse::<u64>()
            .map(Value::UInt)
            .map_err(|_| invalid(value, "uint")),
        other => Err(no_overload("uint", other)),
    }
}

pub(super) fn to_double(value: &Value) -> Result<Value, EvaluationError> {
    match value {
        Value::Double(d) => Ok(Value::Double(*d)),
        Value::Int(i) => Ok(Value::Double(*i as f64)),
        Value::UInt(u) => Ok(Value::Double(*u as f64)),
        Value::Str(s) => s
            .parse::<f64>()
            .map(Value::Double)
            .map_err(|_| invalid(value, "double")),
        other => Err(no_overload("double", other)),
    }
}

pub(super) fn to_string(value: &Value) -> Result<Value, EvaluationError> {
    match value {
        Value::Str(s) => Ok(Value::Str(s.clone())),
        Value::Bool(b) => Ok(Value::Str(b.to_string())),
        Value::Int(i) => Ok(Value::Str(i.to_string())),
        Value::UInt(u) => Ok(Value::Str(u.to_string())),
        Value::Double(d) => Ok(Value::Str(d.to_string())),
        Value::Bytes(b) => String::from_utf8(b.clone())
            .map(Value::Str)
            .map_err(|_| invalid(value, "string")),
        other => Err(no_overload("string", other)),
    }
}

fn invalid(value: &Value, target: &'static str) -> EvaluationError {
    let value = match value {
        Value::Str(s) => s.clone(),
        Value::Int(i) => i.to_string(),
        Value::UInt(u) => u.to_string(),
        Value::Double(d) => d.to_string(),
        other => format!("{:?}", other),
    };
    RuntimeError::InvalidConversion { value, target }.into()
}

fn no_overload(name: &'static str, value: &Value) -> EvaluationError {
    TypeError::NoSuchOverload {
        name,
        receiver: value.kind(),
    }
    .into()
}
