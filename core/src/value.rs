//! Dynamically typed column values.

use core::fmt;
use serde::{Serialize, Serializer};

#[cfg(feature = "rusqlite")]
mod rusqlite;

/// A single column value.
///
/// Rows are decoded from the store's column metadata rather than fixed
/// struct fields, so every cell is one of these variants. `Bool` never comes
/// out of the store directly; it is produced by boolean coercion and binds
/// as `0`/`1`.
#[derive(Debug, Clone, PartialEq, PartialOrd, Default)]
pub enum Value {
    /// NULL value
    #[default]
    Null,
    /// Integer value (i64)
    Integer(i64),
    /// Real value (f64)
    Real(f64),
    /// Text value
    Text(String),
    /// Boolean value
    Bool(bool),
}

impl Value {
    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Types a raw query-string value.
    ///
    /// Text that round-trips through `i64` binds as an integer and text that
    /// round-trips through a finite `f64` binds as a real; anything else
    /// (including `007` or `1e3`) stays text.
    pub fn from_query_text(raw: &str) -> Self {
        if let Ok(i) = raw.parse::<i64>()
            && i.to_string() == raw
        {
            return Value::Integer(i);
        }
        if raw.contains('.')
            && let Ok(f) = raw.parse::<f64>()
            && f.is_finite()
            && f.to_string() == raw
        {
            return Value::Real(f);
        }
        Value::Text(raw.to_string())
    }

    /// Converts a JSON body value. Arrays and objects are stored as their
    /// JSON text since the store has no structured column type.
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => n.as_f64().map_or(Value::Null, Value::Real),
            },
            serde_json::Value::String(s) => Value::Text(s),
            nested @ (serde_json::Value::Array(_) | serde_json::Value::Object(_)) => {
                Value::Text(nested.to_string())
            }
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Real(r) => serde_json::Number::from_f64(*r)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Bool(b) => serde_json::Value::Bool(*b),
        }
    }

    /// Key used to match relation rows by id across integer/text encodings.
    pub fn lookup_key(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Integer(i) => Some(i.to_string()),
            Value::Real(r) => Some(r.to_string()),
            Value::Text(s) => Some(s.clone()),
            Value::Bool(b) => Some(u8::from(*b).to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::Text(s) => write!(f, "{s:?}"),
            Value::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Real(r) => serializer.serialize_f64(*r),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Bool(b) => serializer.serialize_bool(*b),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or(Value::Real(value as f64), Value::Integer)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_text_typing() {
        assert_eq!(Value::from_query_text("18"), Value::Integer(18));
        assert_eq!(Value::from_query_text("-3"), Value::Integer(-3));
        assert_eq!(Value::from_query_text("2.5"), Value::Real(2.5));
        assert_eq!(Value::from_query_text("007"), Value::Text("007".into()));
        assert_eq!(Value::from_query_text("1e3"), Value::Text("1e3".into()));
        assert_eq!(Value::from_query_text("v1.2"), Value::Text("v1.2".into()));
        assert_eq!(Value::from_query_text(""), Value::Text(String::new()));
    }

    #[test]
    fn json_body_conversion() {
        assert_eq!(Value::from_json(json!(null)), Value::Null);
        assert_eq!(Value::from_json(json!(true)), Value::Bool(true));
        assert_eq!(Value::from_json(json!(42)), Value::Integer(42));
        assert_eq!(Value::from_json(json!(0.5)), Value::Real(0.5));
        assert_eq!(Value::from_json(json!("hi")), Value::Text("hi".into()));
        assert_eq!(
            Value::from_json(json!({"a": [1, 2]})),
            Value::Text(r#"{"a":[1,2]}"#.into())
        );
    }

    #[test]
    fn serializes_as_json_scalars() {
        let values = vec![
            Value::Null,
            Value::Integer(1),
            Value::Real(1.5),
            Value::Text("x".into()),
            Value::Bool(false),
        ];
        assert_eq!(
            serde_json::to_value(&values).unwrap(),
            json!([null, 1, 1.5, "x", false])
        );
    }
}
