//! Rule → predicate translation
//!
//! The target is the field reference already resolved by the grid (a column or the SQL of
//! an aggregate), never the raw client field. Rule data is always bound. When the target's
//! type is known the data is converted to it first and the placeholder is cast, since
//! clients send numbers and dates as text.

use crate::errors::GridError;
use crate::rule::{FilterRule, RuleOperator};
use config::RulePolicy;
use serde_json::Value;
use table_mapper::debug_log;
use table_mapper::{ColumnType, QueryFilter};

/// Predicate for `rule` against `target`; `Ok(None)` when the policy ignores the rule
/// (unknown operator, or data that does not read as `column_type`)
pub fn translate(
    rule: &FilterRule,
    target: &str,
    column_type: Option<ColumnType>,
    policy: RulePolicy,
) -> Result<Option<QueryFilter>, GridError> {
    let Some(op) = rule.operator() else {
        return match policy {
            RulePolicy::Ignore => {
                debug_log!("[GRID] ignoring rule on '{}': unknown op '{}'", rule.field, rule.op);
                Ok(None)
            }
            RulePolicy::Reject => Err(GridError::unsupported_operator(&rule.field, &rule.op)),
        };
    };

    // Patterns match the column's text form
    if op.is_pattern() {
        return Ok(Some(predicate(op, target, &rule.data)));
    }

    let Some(column_type) = column_type else {
        return Ok(Some(predicate(op, target, &rule.data)));
    };

    match column_type.coerce(&rule.data) {
        Some(data) => Ok(Some(predicate(op, target, &data).with_cast(column_type))),
        None if policy == RulePolicy::Ignore => {
            debug_log!(
                "[GRID] ignoring rule on '{}': {} is not a {:?}",
                rule.field,
                rule.data,
                column_type
            );
            Ok(None)
        }
        None => Err(GridError::InvalidValue {
            field: rule.field.clone(),
            value: rule.data.clone(),
            column_type,
        }),
    }
}

pub fn predicate(op: RuleOperator, target: &str, data: &Value) -> QueryFilter {
    let text = pattern_text(data);
    match op {
        RuleOperator::Equal => QueryFilter::eq(target, data.clone()),
        RuleOperator::NotEqual => QueryFilter::ne(target, data.clone()),
        RuleOperator::Less => QueryFilter::lt(target, data.clone()),
        RuleOperator::LessOrEqual => QueryFilter::lte(target, data.clone()),
        RuleOperator::Greater => QueryFilter::gt(target, data.clone()),
        RuleOperator::GreaterOrEqual => QueryFilter::gte(target, data.clone()),
        RuleOperator::BeginsWith => QueryFilter::like(target, &format!("{}%", text)),
        RuleOperator::NotBeginsWith => QueryFilter::not_like(target, &format!("{}%", text)),
        RuleOperator::EndsWith => QueryFilter::like(target, &format!("%{}", text)),
        RuleOperator::NotEndsWith => QueryFilter::not_like(target, &format!("%{}", text)),
        RuleOperator::Contains => QueryFilter::like(target, &format!("%{}%", text)),
        RuleOperator::NotContains => QueryFilter::not_like(target, &format!("%{}%", text)),
        // One literal, no splitting on commas
        RuleOperator::In => QueryFilter::in_values(target, vec![data.clone()]),
        RuleOperator::NotIn => QueryFilter::not_in_values(target, vec![data.clone()]),
    }
}

fn pattern_text(data: &Value) -> String {
    match data {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use table_mapper::Select;

    fn render(rule: FilterRule) -> (String, Vec<Value>) {
        let filter = translate(&rule, &rule.field, None, RulePolicy::Ignore)
            .unwrap()
            .unwrap();
        Select::new("people").filter(filter).build()
    }

    #[test]
    fn test_comparison_binds_the_value() {
        let (sql, values) = render(FilterRule::new("age", "gt", 30));
        assert_eq!(sql, "SELECT * FROM people WHERE age > $1");
        assert_eq!(values, vec![json!(30)]);

        let (sql, _) = render(FilterRule::new("age", "le", 30));
        assert_eq!(sql, "SELECT * FROM people WHERE age <= $1");
    }

    #[test]
    fn test_like_patterns() {
        let cases = [
            ("bw", "SELECT * FROM people WHERE name::text LIKE $1", "Jo%"),
            ("bn", "SELECT * FROM people WHERE name::text NOT LIKE $1", "Jo%"),
            ("ew", "SELECT * FROM people WHERE name::text LIKE $1", "%Jo"),
            ("en", "SELECT * FROM people WHERE name::text NOT LIKE $1", "%Jo"),
            ("cn", "SELECT * FROM people WHERE name::text LIKE $1", "%Jo%"),
            ("nc", "SELECT * FROM people WHERE name::text NOT LIKE $1", "%Jo%"),
        ];

        for (op, expected_sql, pattern) in cases {
            let (sql, values) = render(FilterRule::new("name", op, "Jo"));
            assert_eq!(sql, expected_sql, "op {}", op);
            assert_eq!(values, vec![json!(pattern)], "op {}", op);
        }
    }

    #[test]
    fn test_numeric_data_in_a_pattern() {
        let (_, values) = render(FilterRule::new("code", "cn", 30));
        assert_eq!(values, vec![json!("%30%")]);
    }

    #[test]
    fn test_membership_keeps_a_single_literal() {
        let (sql, values) = render(FilterRule::new("role", "ni", "5"));
        assert_eq!(sql, "SELECT * FROM people WHERE role NOT IN ($1)");
        assert_eq!(values, vec![json!("5")]);

        let (sql, values) = render(FilterRule::new("role", "in", "1,2"));
        assert_eq!(sql, "SELECT * FROM people WHERE role IN ($1)");
        assert_eq!(values, vec![json!("1,2")]);
    }

    #[test]
    fn test_unknown_operator_follows_policy() {
        let rule = FilterRule::new("age", "nu", json!(null));

        assert!(translate(&rule, "age", None, RulePolicy::Ignore).unwrap().is_none());
        assert!(matches!(
            translate(&rule, "age", None, RulePolicy::Reject),
            Err(GridError::UnsupportedOperator { ref field, ref op }) if field == "age" && op == "nu"
        ));
    }

    #[test]
    fn test_translation_uses_the_resolved_target() {
        let rule = FilterRule::new("total", "ge", 100);
        let filter = translate(&rule, "SUM(amount)", None, RulePolicy::Ignore)
            .unwrap()
            .unwrap();
        assert_eq!(filter.fields(), vec!["SUM(amount)"]);
    }

    fn render_typed(rule: FilterRule, column_type: ColumnType) -> (String, Vec<Value>) {
        let filter = translate(&rule, &rule.field, Some(column_type), RulePolicy::Reject)
            .unwrap()
            .unwrap();
        Select::new("people").filter(filter).build()
    }

    #[test]
    fn test_text_data_is_converted_to_the_column_type() {
        let (sql, values) = render_typed(FilterRule::new("age", "gt", "30"), ColumnType::Integer);
        assert_eq!(sql, "SELECT * FROM people WHERE age > $1::bigint");
        assert_eq!(values, vec![json!(30)]);

        let (sql, values) = render_typed(FilterRule::new("age", "ni", "5"), ColumnType::Integer);
        assert_eq!(sql, "SELECT * FROM people WHERE age NOT IN ($1::bigint)");
        assert_eq!(values, vec![json!(5)]);

        let (sql, values) = render_typed(FilterRule::new("code", "eq", 7), ColumnType::Text);
        assert_eq!(sql, "SELECT * FROM people WHERE code = $1::text");
        assert_eq!(values, vec![json!("7")]);
    }

    #[test]
    fn test_patterns_on_typed_columns_match_text() {
        let (sql, values) = render_typed(FilterRule::new("age", "bw", "3"), ColumnType::Integer);
        assert_eq!(sql, "SELECT * FROM people WHERE age::text LIKE $1");
        assert_eq!(values, vec![json!("3%")]);
    }

    #[test]
    fn test_unreadable_data_follows_policy() {
        let rule = FilterRule::new("age", "gt", "thirty");

        assert!(translate(&rule, "age", Some(ColumnType::Integer), RulePolicy::Ignore)
            .unwrap()
            .is_none());
        assert!(matches!(
            translate(&rule, "age", Some(ColumnType::Integer), RulePolicy::Reject),
            Err(GridError::InvalidValue { ref field, column_type: ColumnType::Integer, .. })
                if field == "age"
        ));
    }
}
