//! SQL rendering tests

#[cfg(test)]
mod tests {
    use crate::column_type::ColumnType;
    use crate::entity::Row;
    use crate::query_builder::{
        GroupBy, JoinClause, JoinType, QueryFilter, Select, SelectField, SortOrder, Statement,
    };
    use serde_json::json;

    fn row(value: serde_json::Value) -> Row {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    // ========================================
    // WHERE rendering
    // ========================================

    #[test]
    fn test_default_select_has_no_clauses() {
        let (sql, values) = Select::new("users").build();
        assert_eq!(sql, "SELECT * FROM users");
        assert!(values.is_empty());
    }

    #[test]
    fn test_conditions_are_bound_in_order() {
        let (sql, values) = Select::new("users")
            .filter(QueryFilter::gt("age", json!(30)))
            .filter(QueryFilter::like("name", "Jo%"))
            .build();

        assert_eq!(sql, "SELECT * FROM users WHERE age > $1 AND name::text LIKE $2");
        assert_eq!(values, vec![json!(30), json!("Jo%")]);
    }

    #[test]
    fn test_null_equality_becomes_is_null() {
        let (sql, values) = Select::new("users")
            .filter(QueryFilter::eq("deleted_at", json!(null)))
            .filter(QueryFilter::ne("archived_at", json!(null)))
            .build();

        assert_eq!(
            sql,
            "SELECT * FROM users WHERE deleted_at IS NULL AND archived_at IS NOT NULL"
        );
        assert!(values.is_empty());
    }

    #[test]
    fn test_or_group_is_parenthesized() {
        let (sql, values) = Select::new("users")
            .filter(QueryFilter::eq("tenant_id", json!(7)))
            .filter(QueryFilter::or(vec![
                QueryFilter::eq("status", json!("active")),
                QueryFilter::eq("status", json!("pending")),
            ]))
            .build();

        assert_eq!(
            sql,
            "SELECT * FROM users WHERE tenant_id = $1 AND (status = $2 OR status = $3)"
        );
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn test_empty_group_is_skipped() {
        let (sql, _) = Select::new("users")
            .filter(QueryFilter::and(vec![]))
            .build();
        assert_eq!(sql, "SELECT * FROM users");
    }

    #[test]
    fn test_membership_rendering() {
        let (sql, values) = Select::new("users")
            .filter(QueryFilter::in_values("id", vec![json!(1), json!(2)]))
            .filter(QueryFilter::not_in_values("role", vec![json!("5")]))
            .build();

        assert_eq!(
            sql,
            "SELECT * FROM users WHERE id IN ($1, $2) AND role NOT IN ($3)"
        );
        assert_eq!(values, vec![json!(1), json!(2), json!("5")]);
    }

    #[test]
    fn test_typed_placeholders_are_cast() {
        let (sql, values) = Select::new("users")
            .filter(QueryFilter::gt("age", json!(30)).with_cast(ColumnType::Integer))
            .filter(
                QueryFilter::or(vec![
                    QueryFilter::eq("code", json!("550e8400-e29b-41d4-a716-446655440000")),
                    QueryFilter::not_in_values("code", vec![json!("x")]),
                ])
                .with_cast(ColumnType::Text),
            )
            .filter(QueryFilter::like("age", "3%").with_cast(ColumnType::Integer))
            .build();

        assert_eq!(
            sql,
            "SELECT * FROM users WHERE age > $1::bigint \
             AND (code = $2::text OR code NOT IN ($3::text)) AND age::text LIKE $4"
        );
        assert_eq!(values.len(), 4);
    }

    #[test]
    fn test_empty_membership_sets() {
        let (sql, values) = Select::new("users")
            .filter(QueryFilter::in_values("id", vec![]))
            .filter(QueryFilter::not_in_values("id", vec![]))
            .build();

        assert_eq!(sql, "SELECT * FROM users WHERE 1=0 AND 1=1");
        assert!(values.is_empty());
    }

    #[test]
    fn test_injection_text_stays_a_parameter() {
        let (sql, values) = Select::new("users")
            .filter(QueryFilter::eq("name", json!("'; DROP TABLE users; --")))
            .build();

        assert_eq!(sql, "SELECT * FROM users WHERE name = $1");
        assert_eq!(values, vec![json!("'; DROP TABLE users; --")]);
    }

    // ========================================
    // Select list, joins, grouping
    // ========================================

    #[test]
    fn test_aliased_select_with_join_columns() {
        let select = Select::new("users")
            .with_alias("t1")
            .join(
                JoinClause::new_on(JoinType::Left, "orders", "t1.id", "o.user_id")
                    .with_alias("o")
                    .with_columns(vec![
                        SelectField::count("o.id").with_alias("order_count"),
                    ]),
            )
            .group_by(GroupBy::single("t1.id"));

        let (sql, _) = select.build();
        assert_eq!(
            sql,
            "SELECT t1.*, COUNT(o.id) AS order_count FROM users AS t1 \
             LEFT JOIN orders AS o ON t1.id = o.user_id GROUP BY t1.id"
        );
    }

    #[test]
    fn test_having_shares_placeholder_numbering() {
        let select = Select::new("orders")
            .columns(vec![
                SelectField::field("customer_id"),
                SelectField::sum("amount").with_alias("total"),
            ])
            .filter(QueryFilter::eq("status", json!("paid")))
            .group_by(GroupBy::single("customer_id"))
            .having(QueryFilter::gt("SUM(amount)", json!(100)));

        let (sql, values) = select.build();
        assert_eq!(
            sql,
            "SELECT customer_id, SUM(amount) AS total FROM orders WHERE status = $1 \
             GROUP BY customer_id HAVING SUM(amount) > $2"
        );
        assert_eq!(values, vec![json!("paid"), json!(100)]);
    }

    #[test]
    fn test_having_without_group_by() {
        let mut select = Select::new("orders").columns(vec![SelectField::count_all().with_alias("n")]);
        select.add_having(QueryFilter::gt("COUNT(*)", json!(1)));

        let (sql, _) = select.build();
        assert_eq!(sql, "SELECT COUNT(*) AS n FROM orders HAVING COUNT(*) > $1");
    }

    // ========================================
    // Ordering and windows
    // ========================================

    #[test]
    fn test_set_order_replaces_previous_ordering() {
        let mut select = Select::new("users")
            .order_by("name", SortOrder::Asc)
            .order_by("id", SortOrder::Asc);
        select.set_order("created_at", SortOrder::Desc);

        let (sql, _) = select.build();
        assert_eq!(sql, "SELECT * FROM users ORDER BY created_at DESC");
    }

    #[test]
    fn test_limit_and_offset() {
        let (sql, _) = Select::new("users").limit(10).offset(5).build();
        assert_eq!(sql, "SELECT * FROM users LIMIT 10 OFFSET 5");
    }

    #[test]
    fn test_count_drops_window_and_order() {
        let select = Select::new("users")
            .filter(QueryFilter::eq("status", json!("active")))
            .order_by("name", SortOrder::Desc)
            .limit(10)
            .offset(10);

        let (sql, values) = select.build_count();
        assert_eq!(
            sql,
            "SELECT COUNT(1) AS c FROM (SELECT * FROM users WHERE status = $1) AS original_select"
        );
        assert_eq!(values, vec![json!("active")]);
    }

    // ========================================
    // Write statements
    // ========================================

    #[test]
    fn test_insert_with_returning() {
        let statement = Statement::insert(
            "users",
            row(json!({"name": "Ann", "nickname": null})),
            Some("id".to_string()),
        );

        let (sql, values) = statement.build();
        assert_eq!(
            sql,
            "INSERT INTO users (name, nickname) VALUES ($1, NULL) RETURNING id"
        );
        assert_eq!(values, vec![json!("Ann")]);
    }

    #[test]
    fn test_insert_without_columns() {
        let (sql, values) = Statement::insert("audit", Row::new(), None).build();
        assert_eq!(sql, "INSERT INTO audit DEFAULT VALUES");
        assert!(values.is_empty());
    }

    #[test]
    fn test_update_binds_set_before_where() {
        let statement = Statement::update(
            "users",
            row(json!({"name": "Bo", "nickname": null})),
            vec![QueryFilter::eq("id", json!(4))],
        );

        let (sql, values) = statement.build();
        assert_eq!(sql, "UPDATE users SET name = $1, nickname = NULL WHERE id = $2");
        assert_eq!(values, vec![json!("Bo"), json!(4)]);
        assert_eq!(statement.operation(), "update");
    }

    #[test]
    fn test_delete_by_key() {
        let statement = Statement::delete("users", vec![QueryFilter::eq("id", json!(9))]);
        let (sql, values) = statement.build();
        assert_eq!(sql, "DELETE FROM users WHERE id = $1");
        assert_eq!(values, vec![json!(9)]);
        assert_eq!(statement.table(), "users");
    }

    // ========================================
    // Descriptor round trip
    // ========================================

    #[test]
    fn test_select_survives_serde() {
        let select = Select::new("users")
            .with_alias("t1")
            .filter(QueryFilter::or(vec![
                QueryFilter::eq("status", json!("active")),
                QueryFilter::is_null("status"),
            ]))
            .order_by("name", SortOrder::Desc)
            .limit(20);

        let encoded = serde_json::to_string(&select).unwrap();
        let decoded: Select = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, select);
        assert_eq!(decoded.build(), select.build());
    }
}
