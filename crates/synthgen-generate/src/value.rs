use std::fmt;

use serde_json::{Number, Value};

/// Result of evaluating one template leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratedValue {
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    /// Literal integers above `i64::MAX`.
    UnsignedLong(u64),
    Double(f64),
    Text(String),
    /// A value with no serialized form; logged and skipped by the walker.
    Unsupported(String),
}

impl GeneratedValue {
    pub fn kind(&self) -> &'static str {
        match self {
            GeneratedValue::Null => "null",
            GeneratedValue::Bool(_) => "bool",
            GeneratedValue::Int(_) => "int",
            GeneratedValue::Long(_) => "long",
            GeneratedValue::UnsignedLong(_) => "unsigned long",
            GeneratedValue::Double(_) => "double",
            GeneratedValue::Text(_) => "string",
            GeneratedValue::Unsupported(_) => "unsupported",
        }
    }

    /// JSON form of the value, `None` when it cannot be represented.
    pub fn to_json(&self) -> Option<Value> {
        match self {
            GeneratedValue::Null => Some(Value::Null),
            GeneratedValue::Bool(value) => Some(Value::Bool(*value)),
            GeneratedValue::Int(value) => Some(Value::from(*value)),
            GeneratedValue::Long(value) => Some(Value::from(*value)),
            GeneratedValue::UnsignedLong(value) => Some(Value::from(*value)),
            GeneratedValue::Double(value) => Number::from_f64(*value).map(Value::Number),
            GeneratedValue::Text(value) => Some(Value::String(value.clone())),
            GeneratedValue::Unsupported(_) => None,
        }
    }
}

/// Text form used when a value is spliced into another string (`cat`, `qs`,
/// `upper`, ...).
impl fmt::Display for GeneratedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneratedValue::Null => f.write_str("null"),
            GeneratedValue::Bool(value) => write!(f, "{value}"),
            GeneratedValue::Int(value) => write!(f, "{value}"),
            GeneratedValue::Long(value) => write!(f, "{value}"),
            GeneratedValue::UnsignedLong(value) => write!(f, "{value}"),
            GeneratedValue::Double(value) => write!(f, "{value}"),
            GeneratedValue::Text(value) => f.write_str(value),
            GeneratedValue::Unsupported(reason) => write!(f, "<unsupported: {reason}>"),
        }
    }
}
