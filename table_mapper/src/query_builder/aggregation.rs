use serde::{Deserialize, Serialize};

/// Represents SQL aggregate functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregateFunction {
    /// COUNT(*) or COUNT(field)
    Count,
    Sum,
    Avg,
    Min,
    Max,
    /// COUNT(DISTINCT field)
    CountDistinct,
}

impl AggregateFunction {
    /// Convert aggregate function to SQL string
    pub fn to_sql(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
            AggregateFunction::CountDistinct => "COUNT",
        }
    }

    pub fn is_distinct(&self) -> bool {
        matches!(self, AggregateFunction::CountDistinct)
    }
}

/// Represents a field selection in a SELECT clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SelectField {
    /// SELECT *
    All,
    /// SELECT field_name
    Field(String),
    /// SELECT field_name AS alias
    FieldWithAlias { field: String, alias: String },
    /// SELECT COUNT(field) [AS alias]
    Aggregate {
        function: AggregateFunction,
        field: Option<String>, // None for COUNT(*)
        alias: Option<String>,
    },
    /// Raw SQL expression; written by application code, never by clients
    Expression {
        sql: String,
        alias: String,
        /// Calls an aggregate, so it can only be filtered in HAVING
        #[serde(default)]
        aggregate: bool,
    },
}

impl SelectField {
    pub fn field(field: impl Into<String>) -> Self {
        SelectField::Field(field.into())
    }

    pub fn field_as(field: impl Into<String>, alias: impl Into<String>) -> Self {
        SelectField::FieldWithAlias {
            field: field.into(),
            alias: alias.into(),
        }
    }

    /// Row-level expression such as `price * quantity`
    pub fn expression(sql: impl Into<String>, alias: impl Into<String>) -> Self {
        SelectField::Expression {
            sql: sql.into(),
            alias: alias.into(),
            aggregate: false,
        }
    }

    /// Expression over aggregates such as `SUM(amount) / COUNT(*)`
    pub fn aggregate_expression(sql: impl Into<String>, alias: impl Into<String>) -> Self {
        SelectField::Expression {
            sql: sql.into(),
            alias: alias.into(),
            aggregate: true,
        }
    }

    pub fn count_all() -> Self {
        Self::aggregate(AggregateFunction::Count, None)
    }

    pub fn count(field: impl Into<String>) -> Self {
        Self::aggregate(AggregateFunction::Count, Some(field.into()))
    }

    pub fn count_distinct(field: impl Into<String>) -> Self {
        Self::aggregate(AggregateFunction::CountDistinct, Some(field.into()))
    }

    pub fn sum(field: impl Into<String>) -> Self {
        Self::aggregate(AggregateFunction::Sum, Some(field.into()))
    }

    pub fn avg(field: impl Into<String>) -> Self {
        Self::aggregate(AggregateFunction::Avg, Some(field.into()))
    }

    pub fn min(field: impl Into<String>) -> Self {
        Self::aggregate(AggregateFunction::Min, Some(field.into()))
    }

    pub fn max(field: impl Into<String>) -> Self {
        Self::aggregate(AggregateFunction::Max, Some(field.into()))
    }

    fn aggregate(function: AggregateFunction, field: Option<String>) -> Self {
        SelectField::Aggregate {
            function,
            field,
            alias: None,
        }
    }

    /// Add an alias to this select field
    pub fn with_alias(self, alias: impl Into<String>) -> Self {
        match self {
            SelectField::Field(field) => SelectField::FieldWithAlias {
                field,
                alias: alias.into(),
            },
            SelectField::Aggregate {
                function, field, ..
            } => SelectField::Aggregate {
                function,
                field,
                alias: Some(alias.into()),
            },
            SelectField::Expression { sql, aggregate, .. } => SelectField::Expression {
                sql,
                alias: alias.into(),
                aggregate,
            },
            other => other,
        }
    }

    /// Name of the column this item produces in a result row
    pub fn output_name(&self) -> Option<&str> {
        match self {
            SelectField::All => None,
            SelectField::Field(field) => Some(crate::validation::unqualified(field)),
            SelectField::FieldWithAlias { alias, .. } => Some(alias),
            SelectField::Aggregate { alias, .. } => alias.as_deref(),
            SelectField::Expression { alias, .. } => Some(alias),
        }
    }

    /// Underlying table column for plain and aliased fields
    pub fn source_column(&self) -> Option<&str> {
        match self {
            SelectField::Field(field) | SelectField::FieldWithAlias { field, .. } => Some(field),
            _ => None,
        }
    }

    /// Aggregates and raw expressions: values the table does not store
    pub fn is_computed(&self) -> bool {
        matches!(
            self,
            SelectField::Aggregate { .. } | SelectField::Expression { .. }
        )
    }

    /// Items that can only be filtered in HAVING
    pub fn is_aggregate(&self) -> bool {
        matches!(
            self,
            SelectField::Aggregate { .. } | SelectField::Expression { aggregate: true, .. }
        )
    }

    /// Aggregate function and argument, for plain aggregates
    pub fn aggregate_parts(&self) -> Option<(AggregateFunction, Option<&str>)> {
        match self {
            SelectField::Aggregate {
                function, field, ..
            } => Some((*function, field.as_deref())),
            _ => None,
        }
    }

    /// SQL of the value itself, without the alias
    pub fn value_sql(&self) -> String {
        match self {
            SelectField::All => "*".to_string(),
            SelectField::Field(name) | SelectField::FieldWithAlias { field: name, .. } => {
                name.clone()
            }
            SelectField::Aggregate {
                function, field, ..
            } => {
                let field_part = match (function.is_distinct(), field) {
                    (true, Some(f)) => format!("DISTINCT {}", f),
                    (_, Some(f)) => f.clone(),
                    (_, None) => "*".to_string(),
                };
                format!("{}({})", function.to_sql(), field_part)
            }
            SelectField::Expression { sql, .. } => sql.clone(),
        }
    }

    /// Full select-list entry
    pub fn to_sql(&self) -> String {
        match self {
            SelectField::All | SelectField::Field(_) => self.value_sql(),
            SelectField::FieldWithAlias { alias, .. } | SelectField::Expression { alias, .. } => {
                format!("{} AS {}", self.value_sql(), alias)
            }
            SelectField::Aggregate { alias, .. } => match alias {
                Some(alias) => format!("{} AS {}", self.value_sql(), alias),
                None => self.value_sql(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_function_to_sql() {
        assert_eq!(AggregateFunction::Count.to_sql(), "COUNT");
        assert_eq!(AggregateFunction::Sum.to_sql(), "SUM");
        assert_eq!(AggregateFunction::Avg.to_sql(), "AVG");
        assert_eq!(AggregateFunction::CountDistinct.to_sql(), "COUNT");
        assert!(AggregateFunction::CountDistinct.is_distinct());
    }

    #[test]
    fn test_select_field_sql() {
        assert_eq!(SelectField::All.to_sql(), "*");
        assert_eq!(SelectField::field("name").to_sql(), "name");
        assert_eq!(
            SelectField::field_as("u.name", "user_name").to_sql(),
            "u.name AS user_name"
        );
        assert_eq!(SelectField::count_all().to_sql(), "COUNT(*)");
        assert_eq!(
            SelectField::count_distinct("user_id").with_alias("buyers").to_sql(),
            "COUNT(DISTINCT user_id) AS buyers"
        );
        assert_eq!(
            SelectField::expression("price * quantity", "line_total").to_sql(),
            "price * quantity AS line_total"
        );
    }

    #[test]
    fn test_output_names() {
        assert_eq!(SelectField::field("t1.status").output_name(), Some("status"));
        assert_eq!(SelectField::field_as("name", "label").output_name(), Some("label"));
        assert_eq!(SelectField::sum("amount").output_name(), None);
        assert_eq!(
            SelectField::sum("amount").with_alias("total").output_name(),
            Some("total")
        );
        assert_eq!(SelectField::All.output_name(), None);
    }

    #[test]
    fn test_computed_fields() {
        assert!(SelectField::count_all().is_computed());
        assert!(SelectField::expression("1", "one").is_computed());
        assert!(!SelectField::field("id").is_computed());
        assert!(!SelectField::field_as("id", "key").is_computed());

        assert!(SelectField::sum("amount").is_aggregate());
        assert!(SelectField::aggregate_expression("SUM(a) / COUNT(*)", "ratio").is_aggregate());
        assert!(!SelectField::expression("price * quantity", "line_total").is_aggregate());
        assert_eq!(
            SelectField::max("age").aggregate_parts(),
            Some((AggregateFunction::Max, Some("age")))
        );
    }
}
