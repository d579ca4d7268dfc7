//! Table mapper
//!
//! One `TableMapper` owns the identity of one table (name, primary key, reference
//! metadata) and an executor handle. It validates its configuration on first use and
//! stays ready afterwards.

mod fetch;
mod paginator;
mod persist;

pub use fetch::FetchOptions;
pub use paginator::{Page, Paginator};

use crate::errors::MapperError;
use crate::executor::Executor;
use crate::query_builder::Select;
use crate::validation::{ValidatedFieldName, ValidatedTableName};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

pub const DEFAULT_CREATED_AT_COLUMN: &str = "created_at";

/// One foreign key of the mapped table; informational only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub columns: Vec<String>,
    pub ref_table: String,
    pub ref_columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapperConfig {
    pub table_name: Option<String>,
    pub primary_key: Option<String>,
    pub reference_map: BTreeMap<String, Reference>,
    /// Look the primary key up before choosing between INSERT and UPDATE
    pub secure_persist: bool,
    /// Column never written by an UPDATE
    pub created_at_column: String,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            table_name: None,
            primary_key: None,
            reference_map: BTreeMap::new(),
            secure_persist: false,
            created_at_column: DEFAULT_CREATED_AT_COLUMN.to_string(),
        }
    }
}

impl MapperConfig {
    pub fn new(table_name: impl Into<String>, primary_key: impl Into<String>) -> Self {
        Self {
            table_name: Some(table_name.into()),
            primary_key: Some(primary_key.into()),
            ..Self::default()
        }
    }

    pub fn with_reference(mut self, name: impl Into<String>, reference: Reference) -> Self {
        self.reference_map.insert(name.into(), reference);
        self
    }

    pub fn with_secure_persist(mut self, secure_persist: bool) -> Self {
        self.secure_persist = secure_persist;
        self
    }

    pub fn with_created_at_column(mut self, column: impl Into<String>) -> Self {
        self.created_at_column = column.into();
        self
    }
}

pub struct TableMapper {
    config: MapperConfig,
    executor: Option<Arc<dyn Executor>>,
    table: OnceLock<ValidatedTableName>,
    last_persist_id: Mutex<Option<Value>>,
}

impl fmt::Debug for TableMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableMapper")
            .field("table_name", &self.config.table_name)
            .field("primary_key", &self.config.primary_key)
            .field("secure_persist", &self.config.secure_persist)
            .field("has_executor", &self.executor.is_some())
            .field("ready", &self.table.get().is_some())
            .finish()
    }
}

impl TableMapper {
    pub fn new(config: MapperConfig) -> Self {
        Self {
            config,
            executor: None,
            table: OnceLock::new(),
            last_persist_id: Mutex::new(None),
        }
    }

    pub fn with_executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn set_executor(&mut self, executor: Arc<dyn Executor>) {
        self.executor = Some(executor);
    }

    pub fn executor(&self) -> Option<&Arc<dyn Executor>> {
        self.executor.as_ref()
    }

    pub fn set_secure_persist(&mut self, secure_persist: bool) {
        self.config.secure_persist = secure_persist;
    }

    pub fn secure_persist(&self) -> bool {
        self.config.secure_persist
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    pub fn reference_map(&self) -> &BTreeMap<String, Reference> {
        &self.config.reference_map
    }

    /// Validate executor and table name once; later calls reuse the result
    pub(crate) fn initialize(&self) -> Result<(&Arc<dyn Executor>, &str), MapperError> {
        let executor = self
            .executor
            .as_ref()
            .ok_or_else(|| MapperError::configuration("No executor present"))?;

        let table = match self.table.get() {
            Some(table) => table,
            None => {
                let name = self
                    .config
                    .table_name
                    .as_deref()
                    .ok_or_else(|| MapperError::configuration("The table name is not defined"))?;
                let validated = ValidatedTableName::new(name).map_err(|e| {
                    MapperError::configuration(format!("Invalid table name '{}': {}", name, e))
                })?;
                debug_log!("[MAPPER] Table '{}' ready", validated);
                self.table.get_or_init(|| validated)
            }
        };

        Ok((executor, table.as_str()))
    }

    /// Name of the mapped table; fails until it is configured and valid
    pub fn table_name(&self) -> Result<&str, MapperError> {
        self.initialize().map(|(_, table)| table)
    }

    pub fn primary_key(&self) -> Result<&str, MapperError> {
        let primary_key = self.config.primary_key.as_deref().ok_or_else(|| {
            MapperError::configuration(format!(
                "The primary key is not defined for table {}",
                self.config.table_name.as_deref().unwrap_or("<unnamed>")
            ))
        })?;
        ValidatedFieldName::new(primary_key)?;
        Ok(primary_key)
    }

    /// `SELECT * FROM table`
    pub fn select(&self) -> Result<Select, MapperError> {
        let (_, table) = self.initialize()?;
        Ok(Select::new(table))
    }

    /// `SELECT * FROM table AS alias`, `t1` being the conventional alias
    pub fn select_alias(&self, alias: &str) -> Result<Select, MapperError> {
        let alias = ValidatedFieldName::new(alias)?;
        Ok(self.select()?.with_alias(alias.into_string()))
    }

    /// Primary key recorded by the last insert or primary-key update
    pub fn last_persist_id(&self) -> Option<Value> {
        self.last_persist_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn remember_persist_id(&self, id: Value) {
        *self
            .last_persist_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(id);
    }
}
