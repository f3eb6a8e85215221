//!
//! The Value module contains the dynamically typed value representation used for record
//! fields.  [Value] is re-exported to the public interface.
//!

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Deserialize};

/// A dynamically typed field value within a [Record](crate::Record)
///
/// Records are schema-free, so the same field may hold a number in one record and a
/// string in another.  Representing values as a closed variant (rather than an open
/// dynamic type) lets the comparator and the coders match exhaustively.
///
/// NOTE: the variant order matters for deserialization.  The enum is `untagged`, so
/// serde tries the variants top to bottom and `Int` must come before `Float` for a
/// whole number on the wire to keep its integer representation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

impl Value {
    /// Returns the numeric magnitude of the value, widened to floating point, or `None`
    /// if the value is not numeric
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Renders the value as the string used for grouping keys and for the comparator's
    /// mixed-type fallback
    ///
    /// Scalars render as their natural text, with strings unquoted, so the number `5`
    /// and the string `"5"` land in the same group.  Nulls render as the literal
    /// `"null"`.  Sequences and mappings render through [fmt::Display].
    pub fn group_key(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            },
            Value::Object(fields) => {
                write!(f, "{{")?;
                for (idx, (name, value)) in fields.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                write!(f, "}}")
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_numbers_deserialize_as_int() {
        let v: Value = serde_json::from_str("30").unwrap();
        assert_eq!(v, Value::Int(30));
        let v: Value = serde_json::from_str("30.5").unwrap();
        assert_eq!(v, Value::Float(30.5));
    }

    #[test]
    fn group_keys_render_scalars_unquoted() {
        assert_eq!(Value::Null.group_key(), "null");
        assert_eq!(Value::Bool(true).group_key(), "true");
        assert_eq!(Value::Int(42).group_key(), "42");
        assert_eq!(Value::String("Eng".to_string()).group_key(), "Eng");
    }

    #[test]
    fn group_keys_render_composites() {
        let v: Value = serde_json::from_str(r#"[1, "a", null]"#).unwrap();
        assert_eq!(v.group_key(), "[1, a, null]");
        let v: Value = serde_json::from_str(r#"{"x": 1}"#).unwrap();
        assert_eq!(v.group_key(), "{x: 1}");
    }
}
