//! Convenience re-exports for common table-mapper usage

// Mapper
pub use crate::mapper::{FetchOptions, MapperConfig, Page, Paginator, Reference, TableMapper};

// Entities and markers
pub use crate::entity::{to_row, Entity, RawRow, Row, RowSet, Serialized};
pub use crate::typed_value::{FieldValue, Nullable, TypedValue};

// Column types
pub use crate::column_type::{ColumnType, ColumnTypes};

// Execution
pub use crate::executor::{ExecutionResult, Executor, MemoryExecutor, PgExecutor};

// Error types
pub use crate::errors::MapperError;

// Query building
pub use crate::query_builder::{
    GroupBy, JoinClause, JoinType, QueryFilter, Select, SelectField, SortOrder, Statement,
};

// Common external dependencies that are frequently used
pub use async_trait::async_trait;
pub use serde_json::{json, Value};
