//! Statement execution
//!
//! The mapper and the grid never touch a connection directly; they hand query
//! descriptors to an [`Executor`]. `PgExecutor` runs them on a sqlx pool,
//! `MemoryExecutor` evaluates them against in-memory tables.

pub mod memory;
pub mod postgres;

use crate::column_type::ColumnTypes;
use crate::entity::RowSet;
use crate::errors::MapperError;
use crate::query_builder::{Select, Statement};
use async_trait::async_trait;
use serde_json::Value;

pub use memory::MemoryExecutor;
pub use postgres::PgExecutor;

/// Outcome of an INSERT, UPDATE or DELETE
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionResult {
    pub generated_id: Option<Value>,
    pub affected_rows: u64,
}

impl ExecutionResult {
    pub fn new(generated_id: Option<Value>, affected_rows: u64) -> Self {
        Self {
            generated_id,
            affected_rows,
        }
    }

    /// Primary key produced by an INSERT, if the statement asked for one
    pub fn generated_value(&self) -> Option<&Value> {
        self.generated_id.as_ref()
    }

    pub fn affected_rows(&self) -> u64 {
        self.affected_rows
    }
}

#[async_trait]
pub trait Executor: Send + Sync {
    async fn fetch_all(&self, select: &Select) -> Result<RowSet, MapperError>;

    /// Number of rows `select` produces, ignoring its ordering and page window
    async fn fetch_count(&self, select: &Select) -> Result<u64, MapperError>;

    async fn execute(&self, statement: &Statement) -> Result<ExecutionResult, MapperError>;

    /// Column types of `table`, keyed by bare column name
    async fn column_types(&self, table: &str) -> Result<ColumnTypes, MapperError>;
}
