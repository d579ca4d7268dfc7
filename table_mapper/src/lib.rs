//! Table Mapper - row-level persistence for one relational table
//!
//! This crate provides entity extraction, typed value markers, query descriptors with
//! Postgres rendering, executors and the `TableMapper` CRUD layer built on them.

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub mod column_type;
pub mod entity;
pub mod errors;
pub mod executor;
pub mod mapper;
pub mod prelude;
pub mod query_builder;
pub mod typed_value;
pub mod validation;

pub use column_type::{ColumnType, ColumnTypes};
pub use entity::{to_row, Entity, RawRow, Row, RowSet, Serialized};
pub use errors::MapperError;
pub use executor::{ExecutionResult, Executor, MemoryExecutor, PgExecutor};
pub use mapper::{FetchOptions, MapperConfig, Page, Paginator, Reference, TableMapper};
pub use query_builder::{QueryFilter, QueryOperator, Select, SelectField, SortOrder, Statement};
pub use typed_value::{FieldValue, Nullable, TypedValue};
pub use validation::{ValidatedFieldName, ValidatedTableName, ValidationError};
