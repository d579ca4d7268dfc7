use serde_json::Value;
use table_mapper::{ColumnType, MapperError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GridError {
    #[error("Invalid filters: {0}")]
    InvalidFilters(String),

    #[error("Unsupported operator '{op}' on field '{field}'")]
    UnsupportedOperator { field: String, op: String },

    #[error("Field '{0}' cannot be filtered")]
    DisallowedField(String),

    #[error("Value {value} on field '{field}' is not a valid {column_type:?}")]
    InvalidValue {
        field: String,
        value: Value,
        column_type: ColumnType,
    },

    #[error("Invalid sort column '{0}'")]
    InvalidSortColumn(String),

    #[error("Invalid query token: {0}")]
    Token(String),

    #[error(transparent)]
    Mapper(#[from] MapperError),
}

impl GridError {
    pub fn unsupported_operator(field: impl Into<String>, op: impl Into<String>) -> Self {
        Self::UnsupportedOperator {
            field: field.into(),
            op: op.into(),
        }
    }
}
