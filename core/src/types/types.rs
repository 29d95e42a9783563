use core::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::values::Value;

/// Declared type of a caveat parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Any,

    // Primitives.
    Bool,
    Int,
    UInt,
    Double,
    String,
    Bytes,

    // Collections. Map keys are always strings.
    List(Box<Type>),
    Map(Box<Type>),
}

impl Type {
    pub fn list(element: Type) -> Self {
        Type::List(Box::new(element))
    }

    pub fn map(value: Type) -> Self {
        Type::Map(Box::new(value))
    }

    /// Convert `value` into this type, if a lossless conversion exists.
    ///
    /// `int` and `uint` convert into each other when in range, both convert
    /// into `double`, and collections convert element by element.
    pub fn coerce(&self, value: &Value) -> Option<Value> {
        match (self, value) {
            (Type::Any, value) => Some(value.clone()),
            (Type::Bool, Value::Bool(b)) => Some(Value::Bool(*b)),
            (Type::Int, Value::Int(i)) => Some(Value::Int(*i)),
            (Type::Int, Value::UInt(u)) => i64::try_from(*u).ok().map(Value::Int),
            (Type::UInt, Value::UInt(u)) => Some(Value::UInt(*u)),
            (Type::UInt, Value::Int(i)) => u64::try_from(*i).ok().map(Value::UInt),
            (Type::Double, Value::Double(d)) => Some(Value::Double(*d)),
            (Type::Double, Value::Int(i)) => Some(Value::Double(*i as f64)),
            (Type::Double, Value::UInt(u)) => Some(Value::Double(*u as f64)),
            (Type::String, Value::Str(s)) => Some(Value::Str(s.clone())),
            (Type::Bytes, Value::Bytes(b)) => Some(Value::Bytes(b.clone())),
            (Type::List(element), Value::List(items)) => items
                .iter()
                .map(|item| element.coerce(item))
                .collect::<Option<Vec<_>>>()
                .map(Value::List),
            (Type::Map(element), Value::Map(entries)) => entries
                .iter()
                .map(|(key, item)| Some((key.clone(), element.coerce(item)?)))
                .collect::<Option<_>>()
                .map(Value::Map),
            _ => None,
        }
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Type::Any => write!(f, "any"),
            Type::Bool => write!(f, "bool"),
            Type::Int => write!(f, "int"),
            Type::UInt => write!(f, "uint"),
            Type::Double => write!(f, "double"),
            Type::String => write!(f, "string"),
            Type::Bytes => write!(f, "bytes"),
            Type::List(element) => write!(f, "list<{}>", element),
            Type::Map(value) => write!(f, "map<{}>", value),
        }
    }
}
