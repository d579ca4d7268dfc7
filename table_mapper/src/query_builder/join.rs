use super::aggregation::SelectField;
use serde::{Deserialize, Serialize};

/// Represents the type of SQL JOIN operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl JoinType {
    pub fn to_sql(&self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT JOIN",
            JoinType::Right => "RIGHT JOIN",
            JoinType::Full => "FULL OUTER JOIN",
            JoinType::Cross => "CROSS JOIN",
        }
    }
}

/// Represents a condition for joining tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JoinCondition {
    /// ON table1.id = table2.user_id
    On {
        left_field: String,
        right_field: String,
    },
    /// USING (id, name)
    Using(Vec<String>),
    /// CROSS JOIN carries no condition
    None,
}

/// Represents a complete JOIN clause together with the columns it contributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinClause {
    pub join_type: JoinType,
    pub table: String,
    pub alias: Option<String>,
    pub condition: JoinCondition,
    /// Items appended to the select list
    pub columns: Vec<SelectField>,
}

impl JoinClause {
    /// Create a new JOIN clause with ON condition
    pub fn new_on(
        join_type: JoinType,
        table: impl Into<String>,
        left_field: impl Into<String>,
        right_field: impl Into<String>,
    ) -> Self {
        Self {
            join_type,
            table: table.into(),
            alias: None,
            condition: JoinCondition::On {
                left_field: left_field.into(),
                right_field: right_field.into(),
            },
            columns: Vec::new(),
        }
    }

    /// Create a new JOIN clause with USING condition
    pub fn new_using(join_type: JoinType, table: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            join_type,
            table: table.into(),
            alias: None,
            condition: JoinCondition::Using(columns),
            columns: Vec::new(),
        }
    }

    pub fn cross(table: impl Into<String>) -> Self {
        Self {
            join_type: JoinType::Cross,
            table: table.into(),
            alias: None,
            condition: JoinCondition::None,
            columns: Vec::new(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_columns(mut self, columns: Vec<SelectField>) -> Self {
        self.columns = columns;
        self
    }

    /// Get the table reference (alias if present, otherwise table name)
    pub fn table_ref(&self) -> &str {
        self.alias.as_ref().unwrap_or(&self.table)
    }

    pub fn to_sql(&self) -> String {
        let table_part = match &self.alias {
            Some(alias) => format!("{} AS {}", self.table, alias),
            None => self.table.clone(),
        };

        match &self.condition {
            JoinCondition::On {
                left_field,
                right_field,
            } => format!(
                "{} {} ON {} = {}",
                self.join_type.to_sql(),
                table_part,
                left_field,
                right_field
            ),
            JoinCondition::Using(columns) => format!(
                "{} {} USING ({})",
                self.join_type.to_sql(),
                table_part,
                columns.join(", ")
            ),
            JoinCondition::None => format!("{} {}", self.join_type.to_sql(), table_part),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_clause_new_on() {
        let join = JoinClause::new_on(JoinType::Inner, "orders", "users.id", "orders.user_id");

        assert_eq!(join.table_ref(), "orders");
        assert_eq!(
            join.to_sql(),
            "INNER JOIN orders ON users.id = orders.user_id"
        );
    }

    #[test]
    fn test_join_clause_using_with_alias() {
        let join = JoinClause::new_using(JoinType::Left, "profiles", vec!["user_id".to_string()])
            .with_alias("p");

        assert_eq!(join.table_ref(), "p");
        assert_eq!(join.to_sql(), "LEFT JOIN profiles AS p USING (user_id)");
    }

    #[test]
    fn test_join_columns() {
        let join = JoinClause::new_on(JoinType::Left, "orders", "users.id", "orders.user_id")
            .with_columns(vec![SelectField::count("orders.id").with_alias("order_count")]);

        assert_eq!(join.columns.len(), 1);
        assert_eq!(join.columns[0].output_name(), Some("order_count"));
    }

    #[test]
    fn test_cross_join() {
        assert_eq!(JoinClause::cross("regions").to_sql(), "CROSS JOIN regions");
    }
}
