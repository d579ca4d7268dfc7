//! Postgres SQL rendering
//!
//! Every value becomes a `$n` placeholder; placeholders are numbered across the whole
//! statement, so WHERE and HAVING parameters share one value list.

use crate::column_type::ColumnType;
use crate::query_builder::aggregation::SelectField;
use crate::query_builder::builder::Select;
use crate::query_builder::filter::{QueryCondition, QueryFilter, QueryOperator};
use crate::query_builder::grouping::GroupBy;
use crate::query_builder::join::JoinClause;
use crate::query_builder::ordering::SortOrder;
use crate::query_builder::statement::{Delete, Insert, Update};
use serde_json::Value;

pub struct SqlGenerator;

impl SqlGenerator {
    fn where_clause(conditions: &[QueryFilter], values: &mut Vec<Value>) -> String {
        let conditions_sql = Self::join_conditions(conditions, values);
        if conditions_sql.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions_sql)
        }
    }

    fn join_conditions(conditions: &[QueryFilter], values: &mut Vec<Value>) -> String {
        conditions
            .iter()
            .filter_map(|condition| Self::build_condition_sql(condition, values))
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    /// `None` for groups with nothing in them
    fn build_condition_sql(filter: &QueryFilter, values: &mut Vec<Value>) -> Option<String> {
        match filter {
            QueryFilter::Condition(condition) => {
                Some(Self::build_single_condition_sql(condition, values))
            }
            QueryFilter::Group { operator, filters } => {
                let group_conditions = filters
                    .iter()
                    .filter_map(|f| Self::build_condition_sql(f, values))
                    .collect::<Vec<_>>();

                if group_conditions.is_empty() {
                    None
                } else {
                    Some(format!("({})", group_conditions.join(operator.to_sql())))
                }
            }
        }
    }

    fn bind(value: &Value, values: &mut Vec<Value>) -> String {
        values.push(value.clone());
        format!("${}", values.len())
    }

    /// Assigned NULLs are written as a literal; a bound NULL would carry a text type
    fn bind_assignment(value: &Value, values: &mut Vec<Value>) -> String {
        if value.is_null() {
            "NULL".to_string()
        } else {
            Self::bind(value, values)
        }
    }

    fn bind_cast(value: &Value, condition: &QueryCondition, values: &mut Vec<Value>) -> String {
        let param = Self::bind(value, values);
        match condition.cast.as_ref().and_then(ColumnType::sql_cast) {
            Some(cast) => format!("{}::{}", param, cast),
            None => param,
        }
    }

    fn build_single_condition_sql(condition: &QueryCondition, values: &mut Vec<Value>) -> String {
        let field = &condition.field;

        let symbol = match condition.operator {
            QueryOperator::Eq => "=",
            QueryOperator::Ne => "!=",
            QueryOperator::Gt => ">",
            QueryOperator::Gte => ">=",
            QueryOperator::Lt => "<",
            QueryOperator::Lte => "<=",
            QueryOperator::Like | QueryOperator::NotLike => {
                return Self::build_like_sql(field, condition, values);
            }
            QueryOperator::In => return Self::build_membership_sql(field, "IN", condition, values),
            QueryOperator::NotIn => {
                return Self::build_membership_sql(field, "NOT IN", condition, values);
            }
            QueryOperator::IsNull => return format!("{} IS NULL", field),
            QueryOperator::IsNotNull => return format!("{} IS NOT NULL", field),
        };

        match (&condition.value, condition.operator) {
            (None | Some(Value::Null), QueryOperator::Eq) => format!("{} IS NULL", field),
            (None | Some(Value::Null), QueryOperator::Ne) => format!("{} IS NOT NULL", field),
            (None, _) => "1=0".to_string(), // Invalid condition
            (Some(value), _) => {
                let param = Self::bind_cast(value, condition, values);
                format!("{} {} {}", field, symbol, param)
            }
        }
    }

    /// Patterns match the text form of any column type
    fn build_like_sql(field: &str, condition: &QueryCondition, values: &mut Vec<Value>) -> String {
        let keyword = if condition.operator == QueryOperator::NotLike {
            "NOT LIKE"
        } else {
            "LIKE"
        };
        match &condition.value {
            Some(pattern) if !pattern.is_null() => {
                let param = Self::bind(pattern, values);
                format!("{}::text {} {}", field, keyword, param)
            }
            _ => "1=0".to_string(),
        }
    }

    fn build_membership_sql(
        field: &str,
        keyword: &str,
        condition: &QueryCondition,
        values: &mut Vec<Value>,
    ) -> String {
        let negated = condition.operator == QueryOperator::NotIn;
        match &condition.value {
            Some(Value::Array(array_values)) if !array_values.is_empty() => {
                let placeholders: Vec<String> = array_values
                    .iter()
                    .map(|value| Self::bind_cast(value, condition, values))
                    .collect();
                format!("{} {} ({})", field, keyword, placeholders.join(", "))
            }
            // Empty NOT IN matches everything, empty IN nothing
            _ if negated => "1=1".to_string(),
            _ => "1=0".to_string(),
        }
    }

    /// Build ORDER BY clause
    pub fn build_order_clause(order_by: &[(String, SortOrder)]) -> String {
        if order_by.is_empty() {
            return "".to_string();
        }

        let order_items: Vec<String> = order_by
            .iter()
            .map(|(field, order)| format!("{} {}", field, order.to_sql()))
            .collect();

        format!("ORDER BY {}", order_items.join(", "))
    }

    /// Build LIMIT/OFFSET clause
    pub fn build_limit_clause(limit: Option<i64>, offset: Option<i64>) -> String {
        let mut clauses = Vec::new();

        if let Some(limit) = limit {
            clauses.push(format!("LIMIT {}", limit));
        }

        if let Some(offset) = offset {
            clauses.push(format!("OFFSET {}", offset));
        }

        clauses.join(" ")
    }

    /// Build SELECT list: base columns (or `*`), then join columns
    pub fn build_select_clause(select: &Select) -> String {
        let mut parts: Vec<String> = Vec::new();

        if select.fields.is_empty() {
            if select.joins.is_empty() {
                parts.push("*".to_string());
            } else {
                parts.push(format!("{}.*", select.table_ref()));
            }
        } else {
            parts.extend(select.fields.iter().map(SelectField::to_sql));
        }

        parts.extend(
            select
                .joins
                .iter()
                .flat_map(|join| join.columns.iter().map(SelectField::to_sql)),
        );

        parts.join(", ")
    }

    /// Build JOIN clauses
    pub fn build_join_clause(joins: &[JoinClause]) -> String {
        joins
            .iter()
            .map(JoinClause::to_sql)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Build GROUP BY clause
    pub fn build_group_by_clause(group_by: Option<&GroupBy>) -> String {
        match group_by {
            Some(group) if !group.fields.is_empty() => {
                format!("GROUP BY {}", group.fields.join(", "))
            }
            _ => "".to_string(),
        }
    }

    fn having_clause(group_by: Option<&GroupBy>, values: &mut Vec<Value>) -> String {
        match group_by.and_then(|group| group.having.as_deref()) {
            Some(having) => {
                let conditions_sql = Self::join_conditions(having, values);
                if conditions_sql.is_empty() {
                    String::new()
                } else {
                    format!("HAVING {}", conditions_sql)
                }
            }
            None => String::new(),
        }
    }

    pub fn build_select(select: &Select) -> (String, Vec<Value>) {
        let mut values = Vec::new();

        let from = match &select.alias {
            Some(alias) => format!("{} AS {}", select.table, alias),
            None => select.table.clone(),
        };

        let parts = [
            format!("SELECT {} FROM {}", Self::build_select_clause(select), from),
            Self::build_join_clause(&select.joins),
            Self::where_clause(&select.conditions, &mut values),
            Self::build_group_by_clause(select.group_by.as_ref()),
            Self::having_clause(select.group_by.as_ref(), &mut values),
            Self::build_order_clause(&select.order_by),
            Self::build_limit_clause(select.limit, select.offset),
        ];

        let sql = parts
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        (sql, values)
    }

    /// Row count of the query with its ordering and page window removed
    pub fn build_count(select: &Select) -> (String, Vec<Value>) {
        let (inner, values) = Self::build_select(&select.without_window());
        (
            format!("SELECT COUNT(1) AS c FROM ({}) AS original_select", inner),
            values,
        )
    }

    pub fn build_insert(insert: &Insert) -> (String, Vec<Value>) {
        let mut values = Vec::new();

        let mut sql = if insert.row.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", insert.table)
        } else {
            let columns: Vec<&str> = insert.row.keys().map(String::as_str).collect();
            let placeholders: Vec<String> = insert
                .row
                .values()
                .map(|value| Self::bind_assignment(value, &mut values))
                .collect();
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                insert.table,
                columns.join(", "),
                placeholders.join(", ")
            )
        };

        if let Some(returning) = &insert.returning {
            sql.push_str(&format!(" RETURNING {}", returning));
        }

        (sql, values)
    }

    pub fn build_update(update: &Update) -> (String, Vec<Value>) {
        let mut values = Vec::new();

        let assignments: Vec<String> = update
            .row
            .iter()
            .map(|(column, value)| format!("{} = {}", column, Self::bind_assignment(value, &mut values)))
            .collect();

        let mut sql = format!("UPDATE {} SET {}", update.table, assignments.join(", "));
        let where_clause = Self::where_clause(&update.conditions, &mut values);
        if !where_clause.is_empty() {
            sql.push(' ');
            sql.push_str(&where_clause);
        }

        (sql, values)
    }

    pub fn build_delete(delete: &Delete) -> (String, Vec<Value>) {
        let mut values = Vec::new();

        let mut sql = format!("DELETE FROM {}", delete.table);
        let where_clause = Self::where_clause(&delete.conditions, &mut values);
        if !where_clause.is_empty() {
            sql.push(' ');
            sql.push_str(&where_clause);
        }

        (sql, values)
    }
}
