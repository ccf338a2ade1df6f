//! Static operation attributes.

use crate::types::ElementType;
use std::fmt;

/// Attribute value types.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
    Ints(Vec<i64>),
    Floats(Vec<f64>),
    Type(ElementType),
}

impl AttributeValue {
    /// Short name of the variant, used in type mismatch messages.
    pub fn kind(&self) -> &'static str {
        match self {
            AttributeValue::Int(_) => "int",
            AttributeValue::Float(_) => "float",
            AttributeValue::Bool(_) => "bool",
            AttributeValue::String(_) => "string",
            AttributeValue::Ints(_) => "ints",
            AttributeValue::Floats(_) => "floats",
            AttributeValue::Type(_) => "type",
        }
    }
}

impl TryFrom<AttributeValue> for i64 {
    type Error = String;

    fn try_from(value: AttributeValue) -> std::result::Result<Self, Self::Error> {
        match value {
            AttributeValue::Int(v) => Ok(v),
            other => Err(format!("expected int, got {}", other.kind())),
        }
    }
}

impl TryFrom<AttributeValue> for bool {
    type Error = String;

    fn try_from(value: AttributeValue) -> std::result::Result<Self, Self::Error> {
        match value {
            AttributeValue::Bool(v) => Ok(v),
            AttributeValue::Int(v) => Ok(v != 0),
            other => Err(format!("expected bool, got {}", other.kind())),
        }
    }
}

impl TryFrom<AttributeValue> for Vec<i64> {
    type Error = String;

    fn try_from(value: AttributeValue) -> std::result::Result<Self, Self::Error> {
        match value {
            AttributeValue::Ints(v) => Ok(v),
            // A single int is accepted where a list is expected (`axis=1`).
            AttributeValue::Int(v) => Ok(vec![v]),
            other => Err(format!("expected ints, got {}", other.kind())),
        }
    }
}

impl TryFrom<AttributeValue> for ElementType {
    type Error = String;

    fn try_from(value: AttributeValue) -> std::result::Result<Self, Self::Error> {
        match value {
            AttributeValue::Type(v) => Ok(v),
            AttributeValue::String(s) => ElementType::parse(&s).map_err(|e| e.to_string()),
            other => Err(format!("expected type, got {}", other.kind())),
        }
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Int(v)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Float(v)
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        AttributeValue::Bool(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::String(v.to_string())
    }
}

impl From<Vec<i64>> for AttributeValue {
    fn from(v: Vec<i64>) -> Self {
        AttributeValue::Ints(v)
    }
}

impl From<ElementType> for AttributeValue {
    fn from(v: ElementType) -> Self {
        AttributeValue::Type(v)
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Int(v) => write!(f, "{} : i64", v),
            AttributeValue::Float(v) => write!(f, "{:?} : f64", v),
            AttributeValue::Bool(v) => write!(f, "{}", v),
            AttributeValue::String(v) => write!(f, "{:?}", v),
            AttributeValue::Ints(v) => write!(f, "[{}]", crate::types::join(v)),
            AttributeValue::Floats(v) => {
                let items: Vec<String> = v.iter().map(|x| format!("{:?}", x)).collect();
                write!(f, "[{}]", items.join(", "))
            }
            AttributeValue::Type(v) => write!(f, "{}", v),
        }
    }
}
