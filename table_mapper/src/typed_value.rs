//! Typed value markers
//!
//! A marker lets a caller say "store exactly this" for a column, which differs from
//! leaving the column out of the statement. `Nullable` is the one that matters in
//! practice: it forces SQL NULL.

use serde_json::Value;
use std::fmt::Debug;
use std::sync::Arc;

/// A value object resolved to a concrete value during row extraction
pub trait TypedValue: Debug + Send + Sync {
    fn value(&self) -> Value;
}

/// Forces a column to SQL NULL
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Nullable;

impl Nullable {
    pub fn create() -> Self {
        Nullable
    }
}

impl TypedValue for Nullable {
    fn value(&self) -> Value {
        Value::Null
    }
}

/// One exported entity field before extraction
#[derive(Debug, Clone)]
pub enum FieldValue {
    /// Not set on the entity; never reaches a statement
    Absent,
    /// A concrete value, an explicit `Value::Null` included
    Value(Value),
    Typed(Arc<dyn TypedValue>),
}

impl FieldValue {
    pub fn typed(marker: impl TypedValue + 'static) -> Self {
        FieldValue::Typed(Arc::new(marker))
    }

    pub fn null() -> Self {
        Self::typed(Nullable::create())
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, FieldValue::Absent)
    }

    /// Resolve to the value sent to storage, `None` for absent fields
    pub fn resolve(&self) -> Option<Value> {
        match self {
            FieldValue::Absent => None,
            FieldValue::Value(value) => Some(value.clone()),
            FieldValue::Typed(marker) => Some(marker.value()),
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        FieldValue::Value(value)
    }
}

impl From<Nullable> for FieldValue {
    fn from(marker: Nullable) -> Self {
        FieldValue::typed(marker)
    }
}

impl<T: Into<Value>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => FieldValue::Value(v.into()),
            None => FieldValue::Absent,
        }
    }
}

macro_rules! field_value_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(value: $ty) -> Self {
                    FieldValue::Value(Value::from(value))
                }
            }
        )*
    };
}

field_value_from!(String, &str, bool, i32, i64, u32, u64, f64);
