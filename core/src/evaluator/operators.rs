//! Binary, comparison and unary operator implementations.
//!
//! Integer arithmetic is checked: overflow is a runtime error rather than
//! wrapping. Doubles follow IEEE 754. Numbers of different kinds compare by
//! value but never mix in arithmetic.

use core::cmp::Ordering;

use crate::{
    evaluator::{EvaluationError, RuntimeError, TypeError},
    parser::{BinaryOp, ComparisonOp, UnaryOp},
    values::Value,
};

pub(super) fn eval_binary(
    op: BinaryOp,
    left: &Value,
    right: &Value,
) -> Result<Value, EvaluationError> {
    match (left, right) {
        (Value::Int(l), Value::Int(r)) => eval_binary_int(op, *l, *r).map(Value::Int),
        (Value::UInt(l), Value::UInt(r)) => eval_binary_uint(op, *l, *r).map(Value::UInt),
        (Value::Double(l), Value::Double(r)) => Ok(Value::Double(eval_binary_double(op, *l, *r))),
        (Value::Str(l), Value::Str(r)) if op == BinaryOp::Add => {
            Ok(Value::Str(format!("{}{}", l, r)))
        }
        (Value::Bytes(l), Value::Bytes(r)) if op == BinaryOp::Add => {
            Ok(Value::Bytes([l.as_slice(), r.as_slice()].concat()))
        }
        (Value::List(l), Value::List(r)) if op == BinaryOp::Add => {
            Ok(Value::List(l.iter().chain(r).cloned().collect()))
        }
        _ => Err(mismatch(op.symbol(), left, right)),
    }
}

pub(super) fn eval_binary_int(op: BinaryOp, left: i64, right: i64) -> Result<i64, EvaluationError> {
    let result = match op {
        BinaryOp::Add => left.checked_add(right),
        BinaryOp::Sub => left.checked_sub(right),
        BinaryOp::Mul => left.checked_mul(right),
        BinaryOp::Div | BinaryOp::Rem if right == 0 => {
            return Err(RuntimeError::DivisionByZero.into());
        }
        // i64::MIN / -1 overflows.
        BinaryOp::Div => left.checked_div(right),
        BinaryOp::Rem => left.checked_rem(right),
    };
    result.ok_or_else(|| RuntimeError::Overflow { op: op.symbol() }.into())
}

pub(super) fn eval_binary_uint(
    op: BinaryOp,
    left: u64,
    right: u64,
) -> Result<u64, EvaluationError> {
    let result = match op {
        BinaryOp::Add => left.checked_add(right),
        BinaryOp::Sub => left.checked_sub(right),
        BinaryOp::Mul => left.checked_mul(right),
        BinaryOp::Div | BinaryOp::Rem if right == 0 => {
            return Err(RuntimeError::DivisionByZero.into());
        }
        BinaryOp::Div => left.checked_div(right),
        BinaryOp::Rem => left.checked_rem(right),
    };
    result.ok_or_else(|| RuntimeError::Overflow { op: op.symbol() }.into())
}

/// Division by zero produces infinity or NaN.
pub(super) fn eval_binary_double(op: BinaryOp, left: f64, right: f64) -> f64 {
    match op {
        BinaryOp::Add => left + right,
        BinaryOp::Sub => left - right,
        BinaryOp::Mul => left * right,
        BinaryOp::Div => left / right,
        BinaryOp::Rem => left % right,
    }
}

pub(super) fn eval_unary(op: UnaryOp, operand: &Value) -> Result<Value, EvaluationError> {
    match (op, operand) {
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::Neg, Value::Int(i)) => i
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| RuntimeError::Overflow { op: "-" }.into()),
        (UnaryOp::Neg, Value::Double(d)) => Ok(Value::Double(-d)),
        _ => Err(TypeError::UnaryOperandMismatch {
            op: op.symbol(),
            operand: operand.kind(),
        }
        .into()),
    }
}

pub(super) fn eval_comparison(
    op: ComparisonOp,
    left: &Value,
    right: &Value,
) -> Result<bool, EvaluationError> {
    let ordering = match op {
        ComparisonOp::Eq => return Ok(values_equal(left, right)),
        ComparisonOp::Neq => return Ok(!values_equal(left, right)),
        ComparisonOp::In => return eval_membership(left, right),
        _ => compare(op, left, right)?,
    };
    // NaN is unordered: every ordering comparison involving it is false.
    let Some(ordering) = ordering else {
        return Ok(false);
    };
    Ok(match op {
        ComparisonOp::Lt => ordering == Ordering::Less,
        ComparisonOp::Le => ordering != Ordering::Greater,
        ComparisonOp::Gt => ordering == Ordering::Greater,
        ComparisonOp::Ge => ordering != Ordering::Less,
        ComparisonOp::Eq | ComparisonOp::Neq | ComparisonOp::In => {
            return Err(EvaluationError::Internal(format!(
                "'{}' is not an ordering comparison",
                op
            )));
        }
    })
}

fn compare(
    op: ComparisonOp,
    left: &Value,
    right: &Value,
) -> Result<Option<Ordering>, EvaluationError> {
    match (left, right) {
        (Value::Bool(l), Value::Bool(r)) => Ok(Some(l.cmp(r))),
        (Value::Str(l), Value::Str(r)) => Ok(Some(l.cmp(r))),
        (Value::Bytes(l), Value::Bytes(r)) => Ok(Some(l.cmp(r))),
        _ => match compare_numbers(left, right) {
            Some(ordering) => Ok(ordering),
            None => Err(mismatch(op.symbol(), left, right)),
        },
    }
}

/// Compare two numbers of any kind by value.
///
/// Returns `None` when either side is not a number, and `Some(None)` when
/// the pair is unordered (NaN).
fn compare_numbers(left: &Value, right: &Value) -> Option<Option<Ordering>> {
    let ordering = match (left, right) {
        (Value::Int(l), Value::Int(r)) => Some(l.cmp(r)),
        (Value::UInt(l), Value::UInt(r)) => Some(l.cmp(r)),
        (Value::Double(l), Value::Double(r)) => l.partial_cmp(r),
        (Value::Int(l), Value::UInt(r)) => Some(compare_int_uint(*l, *r)),
        (Value::UInt(l), Value::Int(r)) => Some(compare_int_uint(*r, *l).reverse()),
        (Value::Int(l), Value::Double(r)) => (*l as f64).partial_cmp(r),
        (Value::Double(l), Value::Int(r)) => l.partial_cmp(&(*r as f64)),
        (Value::UInt(l), Value::Double(r)) => (*l as f64).partial_cmp(r),
        (Value::Double(l), Value::UInt(r)) => l.partial_cmp(&(*r as f64)),
        _ => return None,
    };
    Some(ordering)
}

fn compare_int_uint(left: i64, right: u64) -> Ordering {
    match u64::try_from(left) {
        Ok(left) => left.cmp(&right),
        Err(_) => Ordering::Less,
    }
}

/// Structural equality with numeric values compared across kinds.
///
/// Values of unrelated kinds are simply unequal.
pub(super) fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::List(l), Value::List(r)) => {
            l.len() == r.len() && l.iter().zip(r).all(|(l, r)| values_equal(l, r))
        }
        (Value::Map(l), Value::Map(r)) => {
            l.len() == r.len()
                && l.iter().all(|(key, l)| r.get(key).is_some_and(|r| values_equal(l, r)))
        }
        _ => match compare_numbers(left, right) {
            Some(ordering) => ordering == Some(Ordering::Equal),
            None => left == right,
        },
    }
}

fn eval_membership(element: &Value, container: &Value) -> Result<bool, EvaluationError> {
    match container {
        Value::List(items) => Ok(items.iter().any(|item| values_equal(element, item))),
        Value::Map(entries) => match element {
            Value::Str(key) => Ok(entries.contains_key(key)),
            // Map keys are strings; nothing else can be a member.
            _ => Ok(false),
        },
        _ => Err(mismatch("in", element, container)),
    }
}

fn mismatch(op: &'static str, left: &Value, right: &Value) -> EvaluationError {
    TypeError::OperandMismatch {
        op,
        left: left.kind(),
        right: right.kind(),
    }
    .into()
}
