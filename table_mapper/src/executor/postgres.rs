//! sqlx-backed executor

use super::{ExecutionResult, Executor};
use crate::column_type::{ColumnType, ColumnTypes};
use crate::entity::{Row, RowSet};
use crate::errors::MapperError;
use crate::query_builder::{Select, Statement};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{Column, PgPool, Postgres, Row as _, TypeInfo};

// Binds a JSON value with the closest native Postgres type
macro_rules! bind_json_param {
    ($query:expr, $param:expr) => {
        match $param {
            serde_json::Value::String(s) => {
                // Try to parse as RFC3339 timestamp first
                if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(&s) {
                    $query.bind(dt.with_timezone(&chrono::Utc))
                // Try to parse as UUID
                } else if let Ok(uuid) = uuid::Uuid::parse_str(&s) {
                    $query.bind(uuid)
                } else {
                    $query.bind(s)
                }
            }
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    if i >= i32::MIN as i64 && i <= i32::MAX as i64 {
                        $query.bind(i as i32)
                    } else {
                        $query.bind(i)
                    }
                } else if let Some(f) = n.as_f64() {
                    $query.bind(f)
                } else {
                    $query.bind(n.to_string())
                }
            }
            serde_json::Value::Bool(b) => $query.bind(b),
            serde_json::Value::Null => $query.bind(Option::<String>::None),
            other @ serde_json::Value::Array(_) | other @ serde_json::Value::Object(_) => {
                $query.bind(other)
            }
        }
    };
}

type RawQuery<'q> = sqlx::query::Query<'q, Postgres, PgArguments>;
type ScalarQuery<'q> = sqlx::query::QueryScalar<'q, Postgres, i64, PgArguments>;

/// Runs query descriptors on a Postgres pool
#[derive(Debug, Clone)]
pub struct PgExecutor {
    pool: PgPool,
}

impl PgExecutor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn bind_all(sql: &str, params: Vec<Value>) -> RawQuery<'_> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_json_param!(query, param);
        }
        query
    }

    fn bind_scalar(sql: &str, params: Vec<Value>) -> ScalarQuery<'_> {
        let mut query = sqlx::query_scalar::<_, i64>(sql);
        for param in params {
            query = bind_json_param!(query, param);
        }
        query
    }
}

#[async_trait]
impl Executor for PgExecutor {
    async fn fetch_all(&self, select: &Select) -> Result<RowSet, MapperError> {
        let (sql, params) = select.build();
        debug_log!("[SELECT] SQL: {} ({} params)", sql, params.len());

        let rows = Self::bind_all(&sql, params)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| MapperError::execution(select.table_name(), "select", e))?;
        trace_log!("[SELECT] {} rows from {}", rows.len(), select.table_name());

        rows.iter().map(decode_row).collect()
    }

    async fn fetch_count(&self, select: &Select) -> Result<u64, MapperError> {
        let (sql, params) = select.build_count();
        debug_log!("[COUNT] SQL: {}", sql);

        let total = Self::bind_scalar(&sql, params)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| MapperError::execution(select.table_name(), "count", e))?;

        Ok(total.max(0) as u64)
    }

    async fn execute(&self, statement: &Statement) -> Result<ExecutionResult, MapperError> {
        let (sql, params) = statement.build();
        debug_log!("[{}] SQL: {}", statement.operation().to_uppercase(), sql);

        let query = Self::bind_all(&sql, params);
        let table = statement.table();
        let operation = statement.operation();

        match statement {
            Statement::Insert(insert) if insert.returning.is_some() => {
                let returned = query
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(|e| MapperError::execution(table, operation, e))?;

                let generated_id = match returned {
                    Some(row) => decode_row(&row)?.into_iter().next().map(|(_, id)| id),
                    None => None,
                };
                let affected_rows = u64::from(generated_id.is_some());
                Ok(ExecutionResult::new(generated_id, affected_rows))
            }
            _ => {
                let done = query
                    .execute(&self.pool)
                    .await
                    .map_err(|e| MapperError::execution(table, operation, e))?;
                Ok(ExecutionResult::new(None, done.rows_affected()))
            }
        }
    }

    async fn column_types(&self, table: &str) -> Result<ColumnTypes, MapperError> {
        let columns: Vec<(String, String)> = sqlx::query_as(COLUMN_TYPES_SQL)
            .bind(table)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| MapperError::execution(table, "describe", e))?;
        debug_log!("[DESCRIBE] {} columns in {}", columns.len(), table);

        Ok(columns
            .into_iter()
            .map(|(name, data_type)| (name, ColumnType::from_sql_type(&data_type)))
            .collect())
    }
}

const COLUMN_TYPES_SQL: &str = "SELECT column_name::text, data_type::text \
     FROM information_schema.columns \
     WHERE table_name = $1 AND table_schema = ANY(current_schemas(false)) \
     ORDER BY ordinal_position";

/// Convert a Postgres row into a JSON row, column order preserved
pub fn decode_row(row: &PgRow) -> Result<Row, MapperError> {
    let mut decoded = Row::new();
    for column in row.columns() {
        let value = decode_column(row, column.ordinal(), column.type_info().name())
            .map_err(|e| {
                MapperError::Serialization(format!(
                    "cannot decode column '{}': {}",
                    column.name(),
                    e
                ))
            })?;
        decoded.insert(column.name().to_string(), value);
    }
    Ok(decoded)
}

fn decode_column(row: &PgRow, index: usize, type_name: &str) -> Result<Value, sqlx::Error> {
    let value = match type_name {
        "INT2" => row.try_get::<Option<i16>, _>(index)?.map(Value::from),
        "INT4" => row.try_get::<Option<i32>, _>(index)?.map(Value::from),
        "INT8" => row.try_get::<Option<i64>, _>(index)?.map(Value::from),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(index)?
            .map(|f| Value::from(f as f64)),
        "FLOAT8" => row.try_get::<Option<f64>, _>(index)?.map(Value::from),
        "BOOL" => row.try_get::<Option<bool>, _>(index)?.map(Value::from),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => {
            row.try_get::<Option<String>, _>(index)?.map(Value::from)
        }
        "UUID" => row
            .try_get::<Option<uuid::Uuid>, _>(index)?
            .map(|id| Value::from(id.to_string())),
        "JSON" | "JSONB" => row.try_get::<Option<Value>, _>(index)?,
        "TIMESTAMPTZ" => row
            .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(index)?
            .map(|ts| Value::from(ts.to_rfc3339())),
        "TIMESTAMP" => row
            .try_get::<Option<chrono::NaiveDateTime>, _>(index)?
            .map(|ts| Value::from(ts.format("%Y-%m-%d %H:%M:%S%.f").to_string())),
        "DATE" => row
            .try_get::<Option<chrono::NaiveDate>, _>(index)?
            .map(|date| Value::from(date.to_string())),
        other => {
            return Err(sqlx::Error::Decode(
                format!("unsupported column type {}", other).into(),
            ))
        }
    };
    Ok(value.unwrap_or(Value::Null))
}
