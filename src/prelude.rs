//! Convenience re-exports for common rowmapper usage
//!
//! # Example
//!
//! ```rust
//! use rowmapper::prelude::*;
//!
//! let select = Select::new("people").filter(QueryFilter::eq("status", json!("active")));
//! assert_eq!(select.build().0, "SELECT * FROM people WHERE status = $1");
//! ```

// Core rowmapper components
pub use crate::core::MapperHub;
pub use crate::errors::RowMapperError;

// Re-export centralized config
pub use config::{AppConfig, DatabaseConfig, GridSettings, MapperSettings, RulePolicy};

// Mappers, entities, queries and executors
pub use table_mapper::prelude::*;

// Grid listings
pub use data_grid::{
    FieldKind, FilterRule, FilterRuleSet, Grid, GridEnvelope, GridError, GridParams, GridState,
    GroupOp, QueryToken,
};

// Entity validation
pub use entity_filter::{
    Check, FieldError, FieldInput, FilterError, FilterSlot, Filterable, InputFilter,
    InputFilterExt, InputFilterSet, Transform,
};

// Common external dependencies
pub use anyhow;
pub use sqlx;
pub use tokio;

// Commonly used sqlx types
pub use sqlx::PgPool;
