//! Writes
//!
//! `persist` picks INSERT or UPDATE from the primary key in the extracted row. With
//! secure persist the key is looked up first. That lookup and the following write are
//! two statements, so two callers persisting the same key can still race; wrap the call
//! in a transaction when that matters.

use super::TableMapper;
use crate::entity::{to_row, Entity, Row};
use crate::errors::MapperError;
use crate::executor::ExecutionResult;
use crate::query_builder::{QueryFilter, Statement};
use crate::validation::ValidatedTableName;
use serde_json::Value;

impl TableMapper {
    pub async fn insert<E: Entity + ?Sized>(&self, entity: &E) -> Result<ExecutionResult, MapperError> {
        let row = to_row(entity)?;
        self.insert_row(row, None).await
    }

    /// INSERT into another table through this mapper's executor
    pub async fn insert_into<E: Entity + ?Sized>(
        &self,
        entity: &E,
        table: &str,
    ) -> Result<ExecutionResult, MapperError> {
        let row = to_row(entity)?;
        self.insert_row(row, Some(table)).await
    }

    pub async fn update<E: Entity + ?Sized>(
        &self,
        entity: &E,
        criteria: &[QueryFilter],
    ) -> Result<ExecutionResult, MapperError> {
        let row = to_row(entity)?;
        self.update_row(row, criteria, None).await
    }

    pub async fn update_in<E: Entity + ?Sized>(
        &self,
        entity: &E,
        criteria: &[QueryFilter],
        table: &str,
    ) -> Result<ExecutionResult, MapperError> {
        let row = to_row(entity)?;
        self.update_row(row, criteria, Some(table)).await
    }

    /// INSERT or UPDATE depending on the entity's primary key
    pub async fn persist<E: Entity + ?Sized>(&self, entity: &E) -> Result<ExecutionResult, MapperError> {
        self.initialize()?;
        let mut row = to_row(entity)?;
        let primary_key = self.primary_key()?.to_string();

        if self.config.secure_persist {
            return self.secure_persist_row(row, &primary_key).await;
        }

        match row.remove(&primary_key) {
            Some(id) if !id.is_null() => {
                debug_log!("[PERSIST] {} = {} present, updating", primary_key, id);
                let criteria = [QueryFilter::eq(&primary_key, id.clone())];
                self.remember_persist_id(id);
                self.update_row(row, &criteria, None).await
            }
            _ => {
                debug_log!("[PERSIST] No {}, inserting", primary_key);
                self.insert_row(row, None).await
            }
        }
    }

    async fn secure_persist_row(
        &self,
        mut row: Row,
        primary_key: &str,
    ) -> Result<ExecutionResult, MapperError> {
        let id = row.get(primary_key).filter(|id| !id.is_null()).cloned();

        let existing = match &id {
            Some(id) => self.find(id.clone()).await?,
            None => None,
        };

        match (id, existing) {
            (Some(id), Some(_)) => {
                debug_log!("[SECURE_PERSIST] {} = {} found, updating", primary_key, id);
                row.remove(primary_key);
                let criteria = [QueryFilter::eq(primary_key, id.clone())];
                self.remember_persist_id(id);
                self.update_row(row, &criteria, None).await
            }
            (Some(_id), None) => {
                debug_log!("[SECURE_PERSIST] {} = {} not stored, inserting", primary_key, _id);
                self.insert_row(row, None).await
            }
            (None, _) => {
                row.remove(primary_key);
                self.insert_row(row, None).await
            }
        }
    }

    /// DELETE by primary key
    pub async fn remove(&self, id: impl Into<Value>) -> Result<ExecutionResult, MapperError> {
        let (executor, table) = self.initialize()?;
        let statement = Statement::delete(
            table,
            vec![QueryFilter::eq(self.primary_key()?, id.into())],
        );
        executor.execute(&statement).await
    }

    /// Fresh copy of the row written by the last insert or primary-key update
    pub async fn row_last_persist(&self) -> Result<Option<Row>, MapperError> {
        match self.last_persist_id() {
            Some(id) => self.find(id).await,
            None => Ok(None),
        }
    }

    async fn insert_row(&self, row: Row, table: Option<&str>) -> Result<ExecutionResult, MapperError> {
        let (executor, own_table) = self.initialize()?;

        let statement = match table {
            Some(other) => Statement::insert(ValidatedTableName::new(other)?.into_string(), row, None),
            None => Statement::insert(own_table, row, self.config.primary_key.clone()),
        };

        let result = executor.execute(&statement).await?;
        if let Some(id) = result.generated_value().filter(|id| !id.is_null()) {
            self.remember_persist_id(id.clone());
        }
        Ok(result)
    }

    async fn update_row(
        &self,
        mut row: Row,
        criteria: &[QueryFilter],
        table: Option<&str>,
    ) -> Result<ExecutionResult, MapperError> {
        let (executor, own_table) = self.initialize()?;
        let table = match table {
            Some(other) => ValidatedTableName::new(other)?.into_string(),
            None => own_table.to_string(),
        };

        row.remove(&self.config.created_at_column);
        if row.is_empty() {
            debug_log!("[UPDATE] Nothing to set on {}, skipping", table);
            return Ok(ExecutionResult::default());
        }

        executor
            .execute(&Statement::update(table, row, criteria.to_vec()))
            .await
    }
}
