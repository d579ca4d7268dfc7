//! In-memory executor
//!
//! Evaluates descriptors directly against rows held in memory: WHERE, ORDER BY,
//! LIMIT/OFFSET and column projection. Joins, grouping and computed select items need a
//! real database and are rejected. Rows keep insertion order until a query sorts them.
//! Comparing values of different kinds fails the statement, as it does in Postgres.

use super::{ExecutionResult, Executor};
use crate::column_type::{ColumnType, ColumnTypes};
use crate::entity::{Row, RowSet};
use crate::errors::MapperError;
use crate::query_builder::{
    LogicalOperator, QueryCondition, QueryFilter, QueryOperator, Select, SelectField, SortOrder,
    Statement,
};
use crate::validation::unqualified;
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("Table '{0}' does not exist")]
    UnknownTable(String),

    #[error("Duplicate value {value} for primary key '{column}'")]
    DuplicateKey { column: String, value: Value },

    #[error("Not supported by the in-memory executor: {0}")]
    Unsupported(&'static str),

    #[error("Table store lock poisoned")]
    Poisoned,

    #[error("Cannot compare {left} with {right}")]
    TypeMismatch {
        left: &'static str,
        right: &'static str,
    },

    #[error("Invalid input {value} for type {column_type:?}")]
    InvalidInput {
        value: Value,
        column_type: ColumnType,
    },
}

#[derive(Debug, Clone, Default)]
struct MemoryTable {
    primary_key: Option<String>,
    rows: Vec<Row>,
}

impl MemoryTable {
    fn next_id(&self, primary_key: &str) -> Value {
        let max = self
            .rows
            .iter()
            .filter_map(|row| row.get(primary_key).and_then(as_number))
            .fold(0.0_f64, f64::max);
        Value::from(max as i64 + 1)
    }

    fn contains_key(&self, primary_key: &str, id: &Value) -> bool {
        self.rows.iter().any(|row| {
            row.get(primary_key)
                .map(|existing| matches!(compare(existing, id), Ok(Some(Ordering::Equal))))
                .unwrap_or(false)
        })
    }
}

/// Executor over in-memory tables, for tests and local tooling
#[derive(Debug, Default)]
pub struct MemoryExecutor {
    tables: Mutex<BTreeMap<String, MemoryTable>>,
}

impl MemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a table; rows without a primary key get one assigned
    pub fn with_table(mut self, name: &str, primary_key: &str, rows: Vec<Row>) -> Self {
        let tables = self
            .tables
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        let mut table = MemoryTable {
            primary_key: Some(primary_key.to_string()),
            rows: Vec::with_capacity(rows.len()),
        };
        for mut row in rows {
            if row.get(primary_key).map(Value::is_null).unwrap_or(true) {
                let id = table.next_id(primary_key);
                row.insert(primary_key.to_string(), id);
            }
            table.rows.push(row);
        }
        tables.insert(name.to_string(), table);
        self
    }

    /// Register an empty table without a primary key
    pub fn create_table(&self, name: &str) -> Result<(), MapperError> {
        let mut tables = self.lock(name, "create")?;
        tables.entry(name.to_string()).or_default();
        Ok(())
    }

    /// Snapshot of a table's rows in storage order
    pub fn rows(&self, table: &str) -> Result<RowSet, MapperError> {
        let tables = self.lock(table, "snapshot")?;
        tables
            .get(table)
            .map(|t| t.rows.clone())
            .ok_or_else(|| MapperError::execution(table, "snapshot", MemoryError::UnknownTable(table.to_string())))
    }

    fn lock(
        &self,
        table: &str,
        operation: &str,
    ) -> Result<MutexGuard<'_, BTreeMap<String, MemoryTable>>, MapperError> {
        self.tables
            .lock()
            .map_err(|_| MapperError::execution(table, operation, MemoryError::Poisoned))
    }

    fn filtered(&self, select: &Select, operation: &str) -> Result<RowSet, MapperError> {
        let table = select.table_name();
        let fail = |error: MemoryError| MapperError::execution(table, operation, error);

        if !select.joins().is_empty() {
            return Err(fail(MemoryError::Unsupported("joins")));
        }
        if select.grouping().is_some() {
            return Err(fail(MemoryError::Unsupported("GROUP BY / HAVING")));
        }
        if select.fields().iter().any(SelectField::is_computed) {
            return Err(fail(MemoryError::Unsupported("computed select items")));
        }

        let tables = self.lock(table, operation)?;
        let stored = tables
            .get(table)
            .ok_or_else(|| fail(MemoryError::UnknownTable(table.to_string())))?;

        let mut rows = Vec::new();
        for row in &stored.rows {
            if matches_all(row, select.conditions()).map_err(fail)? {
                rows.push(row.clone());
            }
        }
        Ok(rows)
    }
}

#[async_trait]
impl Executor for MemoryExecutor {
    async fn fetch_all(&self, select: &Select) -> Result<RowSet, MapperError> {
        let mut rows = self.filtered(select, "select")?;

        if !select.ordering().is_empty() {
            rows.sort_by(|a, b| {
                select
                    .ordering()
                    .iter()
                    .map(|(field, order)| {
                        let ordering = sort_key_cmp(lookup(a, field), lookup(b, field));
                        match order {
                            SortOrder::Asc => ordering,
                            SortOrder::Desc => ordering.reverse(),
                        }
                    })
                    .find(|ordering| *ordering != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            });
        }

        let window = select.pagination();
        let offset = window.offset.unwrap_or(0).max(0) as usize;
        let limit = window
            .limit
            .map(|limit| limit.max(0) as usize)
            .unwrap_or(usize::MAX);

        Ok(rows
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|row| project(row, select))
            .collect())
    }

    async fn fetch_count(&self, select: &Select) -> Result<u64, MapperError> {
        Ok(self.filtered(select, "count")?.len() as u64)
    }

    /// Types read off the first non-NULL value of each column
    async fn column_types(&self, table: &str) -> Result<ColumnTypes, MapperError> {
        let tables = self.lock(table, "describe")?;
        let stored = tables.get(table).ok_or_else(|| {
            MapperError::execution(table, "describe", MemoryError::UnknownTable(table.to_string()))
        })?;

        let mut types = ColumnTypes::new();
        for row in &stored.rows {
            for (column, value) in row {
                if let Some(column_type) = ColumnType::of_value(value) {
                    types.entry(column.clone()).or_insert(column_type);
                }
            }
        }
        Ok(types)
    }

    async fn execute(&self, statement: &Statement) -> Result<ExecutionResult, MapperError> {
        let table_name = statement.table();
        let operation = statement.operation();
        let fail = |error: MemoryError| MapperError::execution(table_name, operation, error);

        let mut tables = self.lock(table_name, operation)?;
        let table = tables
            .get_mut(table_name)
            .ok_or_else(|| fail(MemoryError::UnknownTable(table_name.to_string())))?;

        match statement {
            Statement::Insert(insert) => {
                let mut row = insert.row.clone();
                if let Some(primary_key) = table.primary_key.clone() {
                    match row.get(&primary_key) {
                        Some(id) if !id.is_null() => {
                            if table.contains_key(&primary_key, id) {
                                return Err(fail(MemoryError::DuplicateKey {
                                    column: primary_key,
                                    value: id.clone(),
                                }));
                            }
                        }
                        _ => {
                            let id = table.next_id(&primary_key);
                            row.insert(primary_key, id);
                        }
                    }
                }

                let generated_id = insert
                    .returning
                    .as_ref()
                    .map(|column| row.get(column).cloned().unwrap_or(Value::Null));
                table.rows.push(row);
                Ok(ExecutionResult::new(generated_id, 1))
            }
            Statement::Update(update) => {
                let hits = matching_rows(&table.rows, &update.conditions).map_err(fail)?;
                for (row, _) in table.rows.iter_mut().zip(&hits).filter(|(_, hit)| **hit) {
                    for (column, value) in &update.row {
                        row.insert(column.clone(), value.clone());
                    }
                }
                let affected_rows = hits.iter().filter(|hit| **hit).count() as u64;
                Ok(ExecutionResult::new(None, affected_rows))
            }
            Statement::Delete(delete) => {
                let hits = matching_rows(&table.rows, &delete.conditions).map_err(fail)?;
                let mut hit = hits.iter();
                table.rows.retain(|_| !hit.next().copied().unwrap_or(false));
                let removed = hits.iter().filter(|hit| **hit).count() as u64;
                Ok(ExecutionResult::new(None, removed))
            }
        }
    }
}

fn lookup<'a>(row: &'a Row, field: &str) -> &'a Value {
    row.get(unqualified(field)).unwrap_or(&Value::Null)
}

fn project(row: Row, select: &Select) -> Row {
    if select.selects_all() {
        return row;
    }
    select
        .fields()
        .iter()
        .filter_map(|field| {
            let name = field.output_name()?;
            let source = field.source_column()?;
            Some((name.to_string(), lookup(&row, source).clone()))
        })
        .collect()
}

fn matching_rows(rows: &[Row], filters: &[QueryFilter]) -> Result<Vec<bool>, MemoryError> {
    rows.iter().map(|row| matches_all(row, filters)).collect()
}

fn matches_all(row: &Row, filters: &[QueryFilter]) -> Result<bool, MemoryError> {
    let results = filters
        .iter()
        .map(|filter| matches(row, filter))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(results.into_iter().all(|hit| hit))
}

fn matches(row: &Row, filter: &QueryFilter) -> Result<bool, MemoryError> {
    match filter {
        QueryFilter::Condition(condition) => matches_condition(row, condition),
        QueryFilter::Group { filters, .. } if filters.is_empty() => Ok(true),
        QueryFilter::Group { operator, filters } => {
            let results = filters
                .iter()
                .map(|f| matches(row, f))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(match operator {
                LogicalOperator::And => results.into_iter().all(|hit| hit),
                LogicalOperator::Or => results.into_iter().any(|hit| hit),
            })
        }
    }
}

/// Apply a placeholder cast the way Postgres would, failing on unreadable input
fn cast_input(value: &Value, cast: Option<ColumnType>) -> Result<Value, MemoryError> {
    let Some(column_type) = cast else {
        return Ok(value.clone());
    };
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| cast_input(item, cast))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        other => column_type
            .coerce(other)
            .ok_or_else(|| MemoryError::InvalidInput {
                value: other.clone(),
                column_type,
            }),
    }
}

fn is_equal(actual: &Value, expected: &Value) -> Result<bool, MemoryError> {
    Ok(compare(actual, expected)? == Some(Ordering::Equal))
}

fn matches_condition(row: &Row, condition: &QueryCondition) -> Result<bool, MemoryError> {
    let actual = lookup(row, &condition.field);
    let raw = condition.value.as_ref().unwrap_or(&Value::Null);

    let hit = match condition.operator {
        QueryOperator::IsNull => actual.is_null(),
        QueryOperator::IsNotNull => !actual.is_null(),
        // Patterns compare against the text form and are never cast
        QueryOperator::Like => like(actual, raw) == Some(true),
        QueryOperator::NotLike => like(actual, raw) == Some(false),
        QueryOperator::Eq if raw.is_null() => actual.is_null(),
        QueryOperator::Ne if raw.is_null() => !actual.is_null(),
        operator => {
            let expected = cast_input(raw, condition.cast)?;
            match operator {
                QueryOperator::Eq => is_equal(actual, &expected)?,
                QueryOperator::Ne => matches!(compare(actual, &expected)?, Some(o) if o != Ordering::Equal),
                QueryOperator::Gt => compare(actual, &expected)? == Some(Ordering::Greater),
                QueryOperator::Gte => matches!(
                    compare(actual, &expected)?,
                    Some(Ordering::Greater | Ordering::Equal)
                ),
                QueryOperator::Lt => compare(actual, &expected)? == Some(Ordering::Less),
                QueryOperator::Lte => matches!(
                    compare(actual, &expected)?,
                    Some(Ordering::Less | Ordering::Equal)
                ),
                QueryOperator::In => match &expected {
                    Value::Array(set) => {
                        let mut found = false;
                        for item in set {
                            found |= is_equal(actual, item)?;
                        }
                        found
                    }
                    _ => false,
                },
                QueryOperator::NotIn => match &expected {
                    Value::Array(set) if set.is_empty() => true,
                    Value::Array(set) => {
                        let mut outside = !actual.is_null();
                        for item in set {
                            outside &= matches!(compare(actual, item)?, Some(o) if o != Ordering::Equal);
                        }
                        outside
                    }
                    _ => true,
                },
                _ => false,
            }
        }
    };
    Ok(hit)
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "text",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// SQL-style comparison: anything against NULL is unknown, mixed kinds are an error
fn compare(left: &Value, right: &Value) -> Result<Option<Ordering>, MemoryError> {
    match (left, right) {
        (Value::Null, _) | (_, Value::Null) => Ok(None),
        (Value::String(a), Value::String(b)) => Ok(Some(a.cmp(b))),
        (Value::Bool(a), Value::Bool(b)) => Ok(Some(a.cmp(b))),
        (Value::Number(_), Value::Number(_)) => {
            Ok(as_number(left).zip(as_number(right)).and_then(|(a, b)| a.partial_cmp(&b)))
        }
        (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => {
            Ok((left == right).then_some(Ordering::Equal))
        }
        _ => Err(MemoryError::TypeMismatch {
            left: kind(left),
            right: kind(right),
        }),
    }
}

/// Ordering for ORDER BY, NULLs last
fn sort_key_cmp(left: &Value, right: &Value) -> Ordering {
    match (left.is_null(), right.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => match compare(left, right) {
            Ok(Some(ordering)) => ordering,
            _ => left.to_string().cmp(&right.to_string()),
        },
    }
}

fn like(actual: &Value, pattern: &Value) -> Option<bool> {
    let text = match actual {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let pattern = match pattern {
        Value::String(s) => s.clone(),
        Value::Null => return None,
        other => other.to_string(),
    };

    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();
    Some(like_match(&text, &pattern))
}

fn like_match(text: &[char], pattern: &[char]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some(('%', rest)) => (0..=text.len()).any(|skip| like_match(&text[skip..], rest)),
        Some(('_', rest)) => !text.is_empty() && like_match(&text[1..], rest),
        Some(('\\', rest)) if !rest.is_empty() => {
            text.first() == Some(&rest[0]) && like_match(&text[1..], &rest[1..])
        }
        Some((c, rest)) => text.first() == Some(c) && like_match(&text[1..], rest),
    }
}
