//! Scalar values carried by rows.

use serde::{Deserialize, Serialize};

/// A single field value.
///
/// Untagged so that JSON scalars map directly onto variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// Normalized form of a value used for key comparison and hashing.
///
/// Integral floats collapse onto `Int` so `1` and `1.0` correlate. Text never
/// equals a number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyRepr {
    Bool(bool),
    Int(i64),
    Float(u64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Display string for this value, `None` for `Null`.
    pub fn render(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(b.to_string()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(format_number(*f)),
            Value::Text(s) => Some(s.clone()),
        }
    }

    /// Key form of this value, `None` for `Null`.
    pub fn key(&self) -> Option<KeyRepr> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(KeyRepr::Bool(*b)),
            Value::Int(i) => Some(KeyRepr::Int(*i)),
            Value::Float(f) => {
                if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                    Some(KeyRepr::Int(*f as i64))
                } else {
                    Some(KeyRepr::Float(f.to_bits()))
                }
            }
            Value::Text(s) => Some(KeyRepr::Text(s.clone())),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
