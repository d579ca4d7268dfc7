//! # rowmapper
//!
//! Table mappers, jqGrid-style listings and entity validation for PostgreSQL.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rowmapper::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::new(
//!         "localhost".to_string(), 5432, "rowmapper".to_string(),
//!         "postgres".to_string(), "password".to_string(),
//!         1, 5, 30, 600, 3600,
//!     );
//!
//!     let hub = MapperHub::new(config).await?;
//!     let people = hub.mapper("people", "id");
//!
//!     let row = json!({"name": "Ana", "status": "active"});
//!     if let Value::Object(row) = row {
//!         people.persist(&row).await?;
//!     }
//!     println!("stored: {:?}", people.row_last_persist().await?);
//!
//!     let grid = hub.grid(people.select()?);
//!     let params = GridParams::new()
//!         .search(r#"{"groupOp":"AND","rules":[{"field":"status","op":"eq","data":"active"}]}"#)
//!         .sort("name", "asc");
//!     let envelope = grid.resultset(&params).await?;
//!     println!("{} of {} records", envelope.rows.len(), envelope.records);
//!
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod errors;
pub mod prelude;

// Re-export the main public types for convenience
pub use core::MapperHub;
pub use errors::RowMapperError;

// Logging macros live in table-mapper so every member crate shares them
pub use table_mapper::{debug_log, trace_log};

// Re-export centralized config
pub use config::{AppConfig, DatabaseConfig, GridSettings, MapperSettings, RulePolicy};

// Re-export member crates
pub use data_grid;
pub use entity_filter;
pub use table_mapper;

// Re-export external dependencies used in public API
pub use async_trait;
pub use sqlx;
