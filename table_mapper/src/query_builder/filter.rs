//! Predicates
//!
//! Conditions keep their field name and value apart; values only ever reach SQL as bound
//! parameters.

use crate::column_type::ColumnType;
use crate::entity::Row;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Query condition operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryOperator {
    Eq,        // =
    Ne,        // !=
    Gt,        // >
    Gte,       // >=
    Lt,        // <
    Lte,       // <=
    Like,      // LIKE
    NotLike,   // NOT LIKE
    In,        // IN
    NotIn,     // NOT IN
    IsNull,    // IS NULL
    IsNotNull, // IS NOT NULL
}

/// Single condition in a WHERE or HAVING clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryCondition {
    pub field: String,
    pub operator: QueryOperator,
    pub value: Option<Value>, // None for IS NULL/IS NOT NULL
    /// Cast applied to the bound placeholders
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cast: Option<ColumnType>,
}

/// Logical operators for combining conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    pub fn to_sql(&self) -> &'static str {
        match self {
            LogicalOperator::And => " AND ",
            LogicalOperator::Or => " OR ",
        }
    }
}

/// Query filter that can be nested
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryFilter {
    Condition(QueryCondition),
    Group {
        operator: LogicalOperator,
        filters: Vec<QueryFilter>,
    },
}

impl QueryFilter {
    /// Create a simple condition
    pub fn condition(field: &str, operator: QueryOperator, value: Option<Value>) -> Self {
        Self::Condition(QueryCondition {
            field: field.to_string(),
            operator,
            value,
            cast: None,
        })
    }

    pub fn group(operator: LogicalOperator, filters: Vec<QueryFilter>) -> Self {
        Self::Group { operator, filters }
    }

    /// Create AND group
    pub fn and(filters: Vec<QueryFilter>) -> Self {
        Self::group(LogicalOperator::And, filters)
    }

    /// Create OR group
    pub fn or(filters: Vec<QueryFilter>) -> Self {
        Self::group(LogicalOperator::Or, filters)
    }

    /// Equal condition; a JSON null becomes IS NULL
    pub fn eq(field: &str, value: Value) -> Self {
        if value.is_null() {
            return Self::is_null(field);
        }
        Self::condition(field, QueryOperator::Eq, Some(value))
    }

    pub fn ne(field: &str, value: Value) -> Self {
        Self::condition(field, QueryOperator::Ne, Some(value))
    }

    pub fn gt(field: &str, value: Value) -> Self {
        Self::condition(field, QueryOperator::Gt, Some(value))
    }

    pub fn gte(field: &str, value: Value) -> Self {
        Self::condition(field, QueryOperator::Gte, Some(value))
    }

    pub fn lt(field: &str, value: Value) -> Self {
        Self::condition(field, QueryOperator::Lt, Some(value))
    }

    pub fn lte(field: &str, value: Value) -> Self {
        Self::condition(field, QueryOperator::Lte, Some(value))
    }

    pub fn like(field: &str, pattern: &str) -> Self {
        Self::condition(
            field,
            QueryOperator::Like,
            Some(Value::String(pattern.to_string())),
        )
    }

    pub fn not_like(field: &str, pattern: &str) -> Self {
        Self::condition(
            field,
            QueryOperator::NotLike,
            Some(Value::String(pattern.to_string())),
        )
    }

    pub fn in_values(field: &str, values: Vec<Value>) -> Self {
        Self::condition(field, QueryOperator::In, Some(Value::Array(values)))
    }

    pub fn not_in_values(field: &str, values: Vec<Value>) -> Self {
        Self::condition(field, QueryOperator::NotIn, Some(Value::Array(values)))
    }

    pub fn is_null(field: &str) -> Self {
        Self::condition(field, QueryOperator::IsNull, None)
    }

    pub fn is_not_null(field: &str) -> Self {
        Self::condition(field, QueryOperator::IsNotNull, None)
    }

    /// Cast the placeholders of every condition to `column_type`
    pub fn with_cast(self, column_type: ColumnType) -> Self {
        match self {
            QueryFilter::Condition(mut condition) => {
                condition.cast = Some(column_type);
                QueryFilter::Condition(condition)
            }
            QueryFilter::Group { operator, filters } => QueryFilter::Group {
                operator,
                filters: filters
                    .into_iter()
                    .map(|filter| filter.with_cast(column_type))
                    .collect(),
            },
        }
    }

    /// One equality per column of `row`, the `['col' => value]` criteria shape
    pub fn matching(row: &Row) -> Vec<QueryFilter> {
        row.iter()
            .map(|(field, value)| Self::eq(field, value.clone()))
            .collect()
    }

    /// Field names this filter touches, nested groups included
    pub fn fields(&self) -> Vec<&str> {
        match self {
            QueryFilter::Condition(condition) => vec![condition.field.as_str()],
            QueryFilter::Group { filters, .. } => {
                filters.iter().flat_map(|filter| filter.fields()).collect()
            }
        }
    }
}
