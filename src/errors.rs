//! Error types for the rowmapper crate
//!
//! Each member crate keeps its own error enum; `RowMapperError` gathers them for callers
//! that work across layers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RowMapperError {
    #[error("Database connection error: {0}")]
    DatabaseConnection(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Mapper(#[from] table_mapper::MapperError),

    #[error(transparent)]
    Grid(#[from] data_grid::GridError),

    #[error(transparent)]
    Filter(#[from] entity_filter::FilterError),
}
