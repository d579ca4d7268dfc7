//! Entity export and row extraction
//!
//! An entity only has to export itself as a flat `name -> FieldValue` mapping.
//! `to_row` turns that mapping into the row a statement is built from.

use crate::errors::MapperError;
use crate::typed_value::FieldValue;
use crate::validation::ValidatedFieldName;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A flattened, persistable row
pub type Row = Map<String, Value>;

/// Rows returned by a select
pub type RowSet = Vec<Row>;

/// An exported entity before markers are resolved
pub type RawRow = BTreeMap<String, FieldValue>;

/// Anything that can export itself as a flat mapping
pub trait Entity {
    fn to_raw_row(&self) -> Result<RawRow, MapperError>;
}

impl Entity for RawRow {
    fn to_raw_row(&self) -> Result<RawRow, MapperError> {
        Ok(self.clone())
    }
}

/// Plain rows are fully present: a `null` in the map is an explicit NULL
impl Entity for Row {
    fn to_raw_row(&self) -> Result<RawRow, MapperError> {
        Ok(self
            .iter()
            .map(|(key, value)| (key.clone(), FieldValue::Value(value.clone())))
            .collect())
    }
}

impl<E: Entity + ?Sized> Entity for &E {
    fn to_raw_row(&self) -> Result<RawRow, MapperError> {
        (**self).to_raw_row()
    }
}

/// Struct-backed adapter over any `Serialize` type.
///
/// The value must serialize to a JSON object. A `null` field (an `Option::None`) counts
/// as unset; use [`Serialized::force_null`] to store NULL explicitly.
#[derive(Debug)]
pub struct Serialized<'a, T: Serialize> {
    inner: &'a T,
    forced_null: Vec<String>,
}

impl<'a, T: Serialize> Serialized<'a, T> {
    pub fn new(inner: &'a T) -> Self {
        Self {
            inner,
            forced_null: Vec::new(),
        }
    }

    pub fn force_null(mut self, field: impl Into<String>) -> Self {
        self.forced_null.push(field.into());
        self
    }
}

impl<T: Serialize> Entity for Serialized<'_, T> {
    fn to_raw_row(&self) -> Result<RawRow, MapperError> {
        let object = match serde_json::to_value(self.inner)? {
            Value::Object(object) => object,
            other => {
                return Err(MapperError::UnsupportedEntityType(format!(
                    "{} serialized to {} instead of an object",
                    std::any::type_name::<T>(),
                    json_kind(&other)
                )))
            }
        };

        let mut raw: RawRow = object
            .into_iter()
            .map(|(key, value)| {
                let field = if value.is_null() {
                    FieldValue::Absent
                } else {
                    FieldValue::Value(value)
                };
                (key, field)
            })
            .collect();

        for field in &self.forced_null {
            raw.insert(field.clone(), FieldValue::null());
        }

        Ok(raw)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Flatten an entity into a persistable row.
///
/// Absent fields are dropped before markers are resolved, so a resolved NULL stays
/// in the row while an unset field never reaches the statement.
pub fn to_row<E: Entity + ?Sized>(entity: &E) -> Result<Row, MapperError> {
    let raw = entity.to_raw_row()?;
    let mut row = Row::new();

    for (key, field) in raw.into_iter().filter(|(_, field)| !field.is_absent()) {
        ValidatedFieldName::new(&key)?;
        if let Some(value) = field.resolve() {
            row.insert(key, value);
        }
    }

    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typed_value::Nullable;
    use serde_json::json;

    #[derive(Serialize)]
    struct Customer {
        id: Option<i64>,
        name: String,
        email: Option<String>,
    }

    #[test]
    fn test_nullable_marker_survives_extraction() {
        let mut raw = RawRow::new();
        raw.insert("name".into(), "Ana".into());
        raw.insert("deleted_at".into(), Nullable::create().into());

        let row = to_row(&raw).unwrap();
        assert_eq!(row.get("deleted_at"), Some(&Value::Null));
        assert_eq!(row.get("name"), Some(&json!("Ana")));
    }

    #[test]
    fn test_absent_field_is_dropped() {
        let mut raw = RawRow::new();
        raw.insert("name".into(), "Ana".into());
        raw.insert("email".into(), FieldValue::Absent);

        let row = to_row(&raw).unwrap();
        assert!(!row.contains_key("email"));
        assert_eq!(row.len(), 1);
    }

    #[test]
    fn test_plain_row_keeps_explicit_null() {
        let mut input = Row::new();
        input.insert("note".into(), Value::Null);
        let row = to_row(&input).unwrap();
        assert_eq!(row.get("note"), Some(&Value::Null));
    }

    #[test]
    fn test_serialized_struct_treats_none_as_unset() {
        let customer = Customer {
            id: None,
            name: "Ana".into(),
            email: None,
        };

        let row = to_row(&Serialized::new(&customer)).unwrap();
        assert_eq!(row.len(), 1);
        assert_eq!(row["name"], json!("Ana"));

        let row = to_row(&Serialized::new(&customer).force_null("email")).unwrap();
        assert_eq!(row.get("email"), Some(&Value::Null));
        assert!(!row.contains_key("id"));
    }

    #[test]
    fn test_serialized_scalar_is_unsupported() {
        let err = to_row(&Serialized::new(&42)).unwrap_err();
        assert!(matches!(err, MapperError::UnsupportedEntityType(_)));

        let err = to_row(&Serialized::new(&vec![1, 2])).unwrap_err();
        assert!(matches!(err, MapperError::UnsupportedEntityType(_)));
    }

    #[test]
    fn test_invalid_column_key_is_rejected() {
        let mut input = Row::new();
        input.insert("name = 'x'; --".into(), json!(1));
        assert!(matches!(
            to_row(&input).unwrap_err(),
            MapperError::InvalidIdentifier(_)
        ));
    }
}
