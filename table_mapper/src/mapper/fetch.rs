use super::{Paginator, TableMapper};
use crate::entity::{Row, RowSet};
use crate::errors::MapperError;
use crate::query_builder::{QueryFilter, Select, SelectField, SortOrder};
use serde_json::Value;

/// Optional parts of a `fetch_all` query; anything left `None` keeps the default
///
/// A `limit` or `offset` of zero or less counts as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchOptions {
    pub columns: Option<Vec<SelectField>>,
    pub conditions: Option<Vec<QueryFilter>>,
    pub having: Option<Vec<QueryFilter>>,
    pub order: Option<Vec<(String, SortOrder)>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl FetchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns(mut self, columns: Vec<SelectField>) -> Self {
        self.columns = Some(columns);
        self
    }

    pub fn filter(mut self, filter: QueryFilter) -> Self {
        self.conditions.get_or_insert_with(Vec::new).push(filter);
        self
    }

    pub fn having(mut self, filter: QueryFilter) -> Self {
        self.having.get_or_insert_with(Vec::new).push(filter);
        self
    }

    pub fn order_by(mut self, field: &str, order: SortOrder) -> Self {
        self.order
            .get_or_insert_with(Vec::new)
            .push((field.to_string(), order));
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Layer the present options over `select`
    pub fn apply(self, mut select: Select) -> Select {
        if let Some(columns) = self.columns {
            select = select.columns(columns);
        }
        if let Some(conditions) = self.conditions {
            select = select.filters(conditions);
        }
        for filter in self.having.into_iter().flatten() {
            select.add_having(filter);
        }
        for (field, order) in self.order.into_iter().flatten() {
            select = select.order_by(&field, order);
        }
        // Zero means unset: a LIMIT 0 would never return a row
        if let Some(limit) = self.limit.filter(|limit| *limit > 0) {
            select = select.limit(limit);
        }
        if let Some(offset) = self.offset.filter(|offset| *offset > 0) {
            select = select.offset(offset);
        }
        select
    }
}

impl TableMapper {
    /// Row whose primary key equals `id`
    pub async fn find(&self, id: impl Into<Value>) -> Result<Option<Row>, MapperError> {
        let (executor, table) = self.initialize()?;
        let select = Select::new(table)
            .filter(QueryFilter::eq(self.primary_key()?, id.into()))
            .limit(1);

        Ok(executor.fetch_all(&select).await?.into_iter().next())
    }

    /// Rows matching every criterion; `None` when no criteria were given
    pub async fn find_by(&self, criteria: &[QueryFilter]) -> Result<Option<RowSet>, MapperError> {
        let (executor, table) = self.initialize()?;
        if criteria.is_empty() {
            debug_log!("[FIND_BY] No criteria for table {}", table);
            return Ok(None);
        }

        let select = Select::new(table).filters(criteria.to_vec());
        executor.fetch_all(&select).await.map(Some)
    }

    pub async fn fetch_all(&self, options: FetchOptions) -> Result<RowSet, MapperError> {
        let (executor, _) = self.initialize()?;
        let select = options.apply(self.select()?);
        executor.fetch_all(&select).await
    }

    /// Same query as `fetch_all`, returned as a paginator instead of being run
    pub fn fetch_all_paginated(&self, options: FetchOptions) -> Result<Paginator, MapperError> {
        let (executor, _) = self.initialize()?;
        let select = options.apply(self.select()?);
        Ok(Paginator::new(executor.clone(), select))
    }

    /// Run any select built from [`TableMapper::select`] or [`TableMapper::select_alias`]
    pub async fn fetch_select(&self, select: &Select) -> Result<RowSet, MapperError> {
        let (executor, _) = self.initialize()?;
        executor.fetch_all(select).await
    }
}
