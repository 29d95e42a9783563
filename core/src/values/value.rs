use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::parser::{Expr, Literal};

/// Runtime value supplied through the evaluation context or produced while
/// evaluating an expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Double(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn list(items: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    pub fn map<K: Into<String>, V: Into<Value>>(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        Value::Map(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    /// Short name of the value's kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::UInt(_) => "uint",
            Value::Double(_) => "double",
            Value::Str(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The literal expression that evaluates back to this value.
    ///
    /// Returns `None` when the value (or anything nested in it) is a
    /// non-finite double, which has no source form.
    pub fn to_expr(&self) -> Option<Expr> {
        let expr = match self {
            Value::Bool(b) => Expr::Literal(Literal::Bool(*b)),
            Value::Int(i) => Expr::Literal(Literal::Int(*i)),
            Value::UInt(u) => Expr::Literal(Literal::UInt(*u)),
            Value::Double(d) if d.is_finite() => Expr::Literal(Literal::Double(*d)),
            Value::Double(_) => return None,
            Value::Str(s) => Expr::Literal(Literal::Str(s.clone())),
            Value::Bytes(b) => Expr::Literal(Literal::Bytes(b.clone())),
            Value::List(items) => {
                Expr::List(items.iter().map(Value::to_expr).collect::<Option<_>>()?)
            }
            Value::Map(entries) => Expr::Map(
                entries
                    .iter()
                    .map(|(key, value)| {
                        Some((Expr::Literal(Literal::Str(key.clone())), value.to_expr()?))
                    })
                    .collect::<Option<_>>()?,
            ),
        };
        Some(expr)
    }
}

impl From<&Literal> for Value {
    fn from(literal: &Literal) -> Self {
        match literal {
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Int(i) => Value::Int(*i),
            Literal::UInt(u) => Value::UInt(*u),
            Literal::Double(d) => Value::Double(*d),
            Literal::Str(s) => Value::Str(s.clone()),
            Literal::Bytes(b) => Value::Bytes(b.clone()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::UInt(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}
