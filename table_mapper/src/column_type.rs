//! Column types
//!
//! Client input arrives as loosely typed JSON, usually strings. Before such a value is
//! compared with a column it is converted to the column's type, and the placeholder is
//! cast to it, so Postgres never sees `integer > text`.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::BTreeMap;

/// Column name (optionally `table.column`) to type
pub type ColumnTypes = BTreeMap<String, ColumnType>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    Text,
    Integer,
    Float,
    Boolean,
    Uuid,
    Timestamp,
    /// JSON and anything else that is compared as given
    Other,
}

impl ColumnType {
    /// Map an `information_schema.columns.data_type` (or a `pg_type` name)
    pub fn from_sql_type(data_type: &str) -> Self {
        match data_type.trim().to_ascii_lowercase().as_str() {
            "text" | "character varying" | "varchar" | "character" | "char" | "bpchar"
            | "name" | "citext" => ColumnType::Text,
            "smallint" | "integer" | "bigint" | "int2" | "int4" | "int8" => ColumnType::Integer,
            "real" | "double precision" | "numeric" | "decimal" | "float4" | "float8" => {
                ColumnType::Float
            }
            "boolean" | "bool" => ColumnType::Boolean,
            "uuid" => ColumnType::Uuid,
            "timestamp with time zone"
            | "timestamp without time zone"
            | "timestamptz"
            | "timestamp"
            | "date" => ColumnType::Timestamp,
            _ => ColumnType::Other,
        }
    }

    /// Type a stored JSON value reads as; `None` for NULL
    pub fn of_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(_) => Some(ColumnType::Boolean),
            Value::Number(n) if n.is_i64() || n.is_u64() => Some(ColumnType::Integer),
            Value::Number(_) => Some(ColumnType::Float),
            Value::String(_) => Some(ColumnType::Text),
            Value::Array(_) | Value::Object(_) => Some(ColumnType::Other),
        }
    }

    /// Placeholder cast, `$n::<type>`
    pub fn sql_cast(&self) -> Option<&'static str> {
        match self {
            ColumnType::Text => Some("text"),
            ColumnType::Integer => Some("bigint"),
            ColumnType::Float => Some("numeric"),
            ColumnType::Boolean => Some("boolean"),
            ColumnType::Uuid => Some("uuid"),
            ColumnType::Timestamp => Some("timestamptz"),
            ColumnType::Other => None,
        }
    }

    /// Convert `value` to this type; `None` when it has no such reading
    ///
    /// NULL stays NULL. Timestamps come out as RFC 3339 text in UTC.
    pub fn coerce(&self, value: &Value) -> Option<Value> {
        if value.is_null() {
            return Some(Value::Null);
        }
        match self {
            ColumnType::Text => match value {
                Value::String(_) => Some(value.clone()),
                Value::Number(n) => Some(Value::String(n.to_string())),
                Value::Bool(b) => Some(Value::String(b.to_string())),
                _ => None,
            },
            ColumnType::Integer => match value {
                Value::Number(n) => n
                    .as_i64()
                    .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                    .map(Value::from),
                Value::String(s) => s.trim().parse::<i64>().ok().map(Value::from),
                _ => None,
            },
            ColumnType::Float => match value {
                Value::Number(_) => Some(value.clone()),
                Value::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(Value::Number),
                _ => None,
            },
            ColumnType::Boolean => match value {
                Value::Bool(_) => Some(value.clone()),
                Value::Number(n) => match n.as_i64() {
                    Some(0) => Some(Value::Bool(false)),
                    Some(1) => Some(Value::Bool(true)),
                    _ => None,
                },
                Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "t" | "1" | "yes" | "on" => Some(Value::Bool(true)),
                    "false" | "f" | "0" | "no" | "off" => Some(Value::Bool(false)),
                    _ => None,
                },
                _ => None,
            },
            ColumnType::Uuid => match value {
                Value::String(s) => uuid::Uuid::parse_str(s.trim())
                    .ok()
                    .map(|id| Value::String(id.to_string())),
                _ => None,
            },
            ColumnType::Timestamp => match value {
                Value::String(s) => parse_timestamp(s.trim()).map(Value::String),
                _ => None,
            },
            ColumnType::Other => Some(value.clone()),
        }
    }
}

fn parse_timestamp(text: &str) -> Option<String> {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc).to_rfc3339());
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(text, format) {
            return Some(ts.and_utc().to_rfc3339());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|ts| ts.and_utc().to_rfc3339())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_catalog_names() {
        assert_eq!(ColumnType::from_sql_type("integer"), ColumnType::Integer);
        assert_eq!(ColumnType::from_sql_type("character varying"), ColumnType::Text);
        assert_eq!(ColumnType::from_sql_type("numeric"), ColumnType::Float);
        assert_eq!(
            ColumnType::from_sql_type("timestamp with time zone"),
            ColumnType::Timestamp
        );
        assert_eq!(ColumnType::from_sql_type("jsonb"), ColumnType::Other);
    }

    #[test]
    fn test_string_input_is_converted() {
        assert_eq!(ColumnType::Integer.coerce(&json!("30")), Some(json!(30)));
        assert_eq!(ColumnType::Integer.coerce(&json!(" 7 ")), Some(json!(7)));
        assert_eq!(ColumnType::Integer.coerce(&json!("3.5")), None);
        assert_eq!(ColumnType::Float.coerce(&json!("3.5")), Some(json!(3.5)));
        assert_eq!(ColumnType::Boolean.coerce(&json!("t")), Some(json!(true)));
        assert_eq!(ColumnType::Boolean.coerce(&json!("maybe")), None);
        assert_eq!(ColumnType::Text.coerce(&json!(30)), Some(json!("30")));
        assert_eq!(ColumnType::Other.coerce(&json!("x")), Some(json!("x")));
        assert_eq!(ColumnType::Integer.coerce(&Value::Null), Some(Value::Null));
    }

    #[test]
    fn test_uuid_and_timestamp_input() {
        assert_eq!(
            ColumnType::Uuid.coerce(&json!("550E8400-E29B-41D4-A716-446655440000")),
            Some(json!("550e8400-e29b-41d4-a716-446655440000"))
        );
        assert_eq!(ColumnType::Uuid.coerce(&json!("nope")), None);
        assert_eq!(
            ColumnType::Timestamp.coerce(&json!("2024-03-01")),
            Some(json!("2024-03-01T00:00:00+00:00"))
        );
        assert_eq!(
            ColumnType::Timestamp.coerce(&json!("2024-03-01 10:30:00")),
            Some(json!("2024-03-01T10:30:00+00:00"))
        );
    }

    #[test]
    fn test_value_types() {
        assert_eq!(ColumnType::of_value(&json!(3)), Some(ColumnType::Integer));
        assert_eq!(ColumnType::of_value(&json!(3.5)), Some(ColumnType::Float));
        assert_eq!(ColumnType::of_value(&json!("a")), Some(ColumnType::Text));
        assert_eq!(ColumnType::of_value(&Value::Null), None);
    }
}
