use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON data types as named by the `type` keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Number,
    Integer,
    String,
    Array,
    Object,
    Boolean,
    Null,
}

impl DataType {
    pub const ALL: [DataType; 7] = [
        DataType::Number,
        DataType::Integer,
        DataType::String,
        DataType::Array,
        DataType::Object,
        DataType::Boolean,
        DataType::Null,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DataType::Number => "number",
            DataType::Integer => "integer",
            DataType::String => "string",
            DataType::Array => "array",
            DataType::Object => "object",
            DataType::Boolean => "boolean",
            DataType::Null => "null",
        }
    }

    /// Whether `value` is an instance of this type.
    ///
    /// Integers are numbers; a number is an integer when it has no fractional part.
    pub fn matches(self, value: &Value) -> bool {
        match self {
            DataType::Number => value.is_number(),
            DataType::Integer => is_integer(value),
            DataType::String => value.is_string(),
            DataType::Array => value.is_array(),
            DataType::Object => value.is_object(),
            DataType::Boolean => value.is_boolean(),
            DataType::Null => value.is_null(),
        }
    }

    /// Whether declaring `self` makes keywords grouped under `group` applicable.
    ///
    /// Number and integer admit each other: integer data is a number, and a
    /// number group keyword applies to integer data.
    pub fn admits(self, group: DataType) -> bool {
        self == group
            || matches!(
                (self, group),
                (DataType::Integer, DataType::Number) | (DataType::Number, DataType::Integer)
            )
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown type {s:?}"))
    }
}

/// Parse a `type`-like value: a type name or a non-empty list of names.
pub(crate) fn parse_types(value: &Value) -> Option<Vec<DataType>> {
    match value {
        Value::String(name) => name.parse().ok().map(|t| vec![t]),
        Value::Array(items) if !items.is_empty() => items
            .iter()
            .map(|item| item.as_str().and_then(|name| name.parse().ok()))
            .collect(),
        _ => None,
    }
}

pub(crate) fn types_text(types: &[DataType]) -> String {
    types
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

pub(crate) fn is_integer(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0),
        _ => false,
    }
}

/// Structural JSON equality where numbers compare by value (`1 == 1.0`).
pub fn json_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => match (x.as_u64(), y.as_u64()) {
                (Some(x), Some(y)) => x == y,
                _ => x.as_f64() == y.as_f64(),
            },
        },
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| json_equal(a, b))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(key, a)| y.get(key).is_some_and(|b| json_equal(a, b)))
        }
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn integer_matches_whole_floats() {
        assert!(DataType::Integer.matches(&json!(3)));
        assert!(DataType::Integer.matches(&json!(3.0)));
        assert!(!DataType::Integer.matches(&json!(3.5)));
        assert!(DataType::Number.matches(&json!(3)));
    }

    #[test]
    fn number_and_integer_declarations_admit_each_other() {
        assert!(DataType::Integer.admits(DataType::Number));
        assert!(DataType::Number.admits(DataType::Integer));
        assert!(!DataType::Integer.admits(DataType::String));
        assert!(!DataType::String.admits(DataType::Number));
    }

    #[test]
    fn parse_types_accepts_name_or_list() {
        assert_eq!(parse_types(&json!("string")), Some(vec![DataType::String]));
        assert_eq!(
            parse_types(&json!(["null", "array"])),
            Some(vec![DataType::Null, DataType::Array])
        );
        assert_eq!(parse_types(&json!("float")), None);
        assert_eq!(parse_types(&json!([])), None);
    }

    #[test]
    fn numbers_compare_by_value() {
        assert!(json_equal(&json!(1), &json!(1.0)));
        assert!(json_equal(&json!({"a": [1, 2.0]}), &json!({"a": [1.0, 2]})));
        assert!(!json_equal(&json!([1, 2]), &json!([2, 1])));
        assert!(!json_equal(&json!("1"), &json!(1)));
    }
}
