//! Grid adapter
//!
//! Wraps a base [`Select`] and turns client filter, sort and page parameters into a
//! paginated result. Field names from the client are never written into SQL as given:
//! each one is classified against the select list and the allow-list first. Rule data is
//! converted to the type of the column it is compared with.

use crate::envelope::{GridEnvelope, GridParams, GridState, QueryToken};
use crate::errors::GridError;
use crate::rule::FilterRuleSet;
use crate::translator::translate;
use config::{GridSettings, RulePolicy};
use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};
use table_mapper::query_builder::AggregateFunction;
use table_mapper::validation::{unqualified, ValidatedFieldName};
use table_mapper::{
    debug_log, ColumnType, ColumnTypes, Executor, Paginator, QueryFilter, Select, SelectField,
    SortOrder,
};

/// How a client field name maps onto the query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Listed in the ignore list; rules on it are dropped
    Ignored,
    /// Alias of an aggregate select item; predicates go to HAVING over this SQL
    Expression(String),
    /// Alias of a row-level expression; predicates go to WHERE over this SQL
    Computed(String),
    /// Plain column; predicates go to WHERE over this source column
    Column(String),
    Disallowed,
}

#[derive(Clone)]
pub struct Grid {
    executor: Arc<dyn Executor>,
    select: Select,
    ignore_fields: BTreeSet<String>,
    allowed_fields: Option<BTreeSet<String>>,
    policy: RulePolicy,
    default_rows: u64,
    max_rows: u64,
    /// Rule sets and sort applied so far, carried by the token
    state: GridState,
    column_types: ColumnTypes,
    catalog: Arc<OnceLock<ColumnTypes>>,
}

impl std::fmt::Debug for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grid")
            .field("select", &self.select)
            .field("ignore_fields", &self.ignore_fields)
            .field("allowed_fields", &self.allowed_fields)
            .field("policy", &self.policy)
            .field("default_rows", &self.default_rows)
            .field("max_rows", &self.max_rows)
            .field("state", &self.state)
            .field("column_types", &self.column_types)
            .field("catalog", &self.catalog.get())
            .finish()
    }
}

impl Grid {
    pub fn new(executor: Arc<dyn Executor>, select: Select) -> Self {
        Self::with_settings(executor, select, &GridSettings::default())
    }

    pub fn with_settings(
        executor: Arc<dyn Executor>,
        select: Select,
        settings: &GridSettings,
    ) -> Self {
        Self {
            executor,
            select,
            ignore_fields: BTreeSet::new(),
            allowed_fields: None,
            policy: settings.rule_policy,
            default_rows: settings.default_rows.max(1),
            max_rows: settings.max_rows.max(1),
            state: GridState::default(),
            column_types: ColumnTypes::new(),
            catalog: Arc::new(OnceLock::new()),
        }
    }

    /// This grid with the filters and sort of an earlier response's `userdata.q` replayed
    ///
    /// The replay goes through [`Grid::filter`] and [`Grid::sort`], so the token is held to
    /// the same allow-list and policy as a fresh request.
    pub async fn from_token(&self, token: &QueryToken) -> Result<Self, GridError> {
        let state = token.decode()?;
        let mut grid = self.clone();
        grid.describe().await?;

        for rule_set in &state.filters {
            grid.filter(rule_set)?;
        }
        if let Some(sidx) = &state.sidx {
            grid.sort(sidx, state.sord.as_deref().unwrap_or("ASC"))?;
        }
        Ok(grid)
    }

    pub fn set_ignore_fields<I, S>(&mut self, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_fields = fields.into_iter().map(Into::into).collect();
    }

    pub fn with_ignore_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_ignore_fields(fields);
        self
    }

    /// Restrict raw-column rules to these names
    ///
    /// Without an allow-list, a query selecting `*` accepts any valid identifier and a
    /// query with an explicit select list accepts only its own items.
    pub fn with_allowed_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Declare column types; these win over what [`Grid::describe`] reads
    ///
    /// Keys are client field names or source columns (`o.amount`).
    pub fn with_column_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = (S, ColumnType)>,
        S: Into<String>,
    {
        self.column_types
            .extend(types.into_iter().map(|(name, column_type)| (name.into(), column_type)));
        self
    }

    /// Read the column types of the queried tables, once per grid
    ///
    /// Base table columns are keyed both bare and qualified, joined ones only qualified.
    pub async fn describe(&self) -> Result<(), GridError> {
        if self.catalog.get().is_some() {
            return Ok(());
        }

        let mut catalog = ColumnTypes::new();
        let table_ref = self.select.table_ref();
        for (column, column_type) in self.executor.column_types(self.select.table_name()).await? {
            catalog.insert(format!("{}.{}", table_ref, column), column_type);
            catalog.insert(column, column_type);
        }
        for join in self.select.joins() {
            let join_ref = join.table_ref();
            for (column, column_type) in self.executor.column_types(&join.table).await? {
                catalog
                    .entry(format!("{}.{}", join_ref, column))
                    .or_insert(column_type);
            }
        }

        debug_log!(
            "[GRID] described {} ({} columns)",
            self.select.table_name(),
            catalog.len()
        );
        // A concurrent describe may have won; both read the same catalog
        let _ = self.catalog.set(catalog);
        Ok(())
    }

    pub fn with_policy(mut self, policy: RulePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> RulePolicy {
        self.policy
    }

    pub fn select(&self) -> &Select {
        &self.select
    }

    pub fn into_select(self) -> Select {
        self.select
    }

    pub fn state(&self) -> &GridState {
        &self.state
    }

    /// Token for the filters and sort applied so far
    pub fn token(&self) -> Result<QueryToken, GridError> {
        QueryToken::encode(&self.state)
    }

    fn select_item(&self, name: &str) -> Option<&SelectField> {
        self.select
            .select_items()
            .into_iter()
            .find(|item| item.output_name() == Some(name))
    }

    pub fn classify_field(&self, name: &str) -> FieldKind {
        if self.ignore_fields.contains(name) {
            return FieldKind::Ignored;
        }

        if let Some(item) = self.select_item(name) {
            if item.is_aggregate() {
                return FieldKind::Expression(item.value_sql());
            }
            if item.is_computed() {
                return FieldKind::Computed(item.value_sql());
            }
            if let Some(source) = item.source_column() {
                return FieldKind::Column(source.to_string());
            }
        }

        if ValidatedFieldName::qualified(name).is_err() {
            return FieldKind::Disallowed;
        }

        let allowed = match &self.allowed_fields {
            Some(allowed) => allowed.contains(name),
            None => self.select.selects_all(),
        };
        if !allowed {
            return FieldKind::Disallowed;
        }

        // Unqualified names are pinned to the base table once other tables are joined in
        if !self.select.joins().is_empty() && !name.contains('.') {
            FieldKind::Column(format!("{}.{}", self.select.table_ref(), name))
        } else {
            FieldKind::Column(name.to_string())
        }
    }

    fn lookup(&self, key: &str) -> Option<ColumnType> {
        self.column_types
            .get(key)
            .or_else(|| self.catalog.get().and_then(|catalog| catalog.get(key)))
            .copied()
    }

    /// Type rule data on `field` is converted to; `None` leaves the data as sent
    pub fn column_type(&self, field: &str) -> Option<ColumnType> {
        if let Some(column_type) = self.column_types.get(field) {
            return Some(*column_type);
        }

        match self.classify_field(field) {
            FieldKind::Column(source) => self.lookup(&source),
            FieldKind::Expression(_) => {
                let (function, argument) = self.select_item(field)?.aggregate_parts()?;
                match function {
                    AggregateFunction::Count | AggregateFunction::CountDistinct => {
                        Some(ColumnType::Integer)
                    }
                    AggregateFunction::Sum | AggregateFunction::Avg => Some(ColumnType::Float),
                    AggregateFunction::Min | AggregateFunction::Max => {
                        let argument = argument?;
                        self.lookup(argument)
                            .or_else(|| self.lookup(unqualified(argument)))
                    }
                }
            }
            FieldKind::Computed(_) | FieldKind::Ignored | FieldKind::Disallowed => None,
        }
    }

    /// Attach the rule set's predicates: row-level rules to WHERE, aggregate rules to HAVING
    ///
    /// Column types come from [`Grid::with_column_types`] and, once [`Grid::describe`] has
    /// run, from the database catalog.
    pub fn filter(&mut self, rule_set: &FilterRuleSet) -> Result<(), GridError> {
        let mut where_predicates = Vec::new();
        let mut having_predicates = Vec::new();

        for rule in &rule_set.rules {
            match self.classify_field(&rule.field) {
                FieldKind::Ignored => {
                    debug_log!("[GRID] field '{}' is ignored", rule.field);
                }
                FieldKind::Disallowed => match self.policy {
                    RulePolicy::Ignore => {
                        debug_log!("[GRID] skipping rule on disallowed field '{}'", rule.field);
                    }
                    RulePolicy::Reject => {
                        return Err(GridError::DisallowedField(rule.field.clone()));
                    }
                },
                FieldKind::Column(sql) | FieldKind::Computed(sql) => {
                    let column_type = self.column_type(&rule.field);
                    if let Some(predicate) = translate(rule, &sql, column_type, self.policy)? {
                        where_predicates.push(predicate);
                    }
                }
                FieldKind::Expression(sql) => {
                    let column_type = self.column_type(&rule.field);
                    if let Some(predicate) = translate(rule, &sql, column_type, self.policy)? {
                        having_predicates.push(predicate);
                    }
                }
            }
        }

        let operator = rule_set.group_op.logical();
        if let Some(predicate) = combine(operator, where_predicates) {
            self.select.add_where(predicate);
        }
        if let Some(predicate) = combine(operator, having_predicates) {
            self.select.add_having(predicate);
        }
        self.state.filters.push(rule_set.clone());
        Ok(())
    }

    /// Replace the ordering with `column direction`; an empty column leaves it alone
    pub fn sort(&mut self, column: &str, direction: &str) -> Result<(), GridError> {
        let column = column.trim();
        if column.is_empty() {
            return Ok(());
        }

        let target = match self.classify_field(column) {
            // Output names are valid ORDER BY targets
            FieldKind::Expression(_) | FieldKind::Computed(_) => Some(column.to_string()),
            FieldKind::Column(source) => Some(source),
            FieldKind::Ignored | FieldKind::Disallowed => None,
        };

        match target {
            Some(target) => {
                self.select
                    .set_order(&target, SortOrder::from_direction(direction));
                self.state.sidx = Some(column.to_string());
                self.state.sord = Some(direction.to_string());
                Ok(())
            }
            None if self.policy == RulePolicy::Ignore => {
                debug_log!("[GRID] ignoring sort on '{}'", column);
                Ok(())
            }
            None => Err(GridError::InvalidSortColumn(column.to_string())),
        }
    }

    fn rows_per_page(&self, requested: Option<i64>) -> u64 {
        match requested {
            Some(rows) if rows > 0 => (rows as u64).min(self.max_rows),
            _ => self.default_rows.min(self.max_rows),
        }
    }

    /// Filter, sort and paginate per the request, leaving this grid untouched
    pub async fn resultset(&self, params: &GridParams) -> Result<GridEnvelope, GridError> {
        self.describe().await?;
        let mut grid = self.clone();

        if params.search {
            if let Some(filters) = &params.filters {
                let rule_set = FilterRuleSet::from_value(filters)?;
                grid.filter(&rule_set)?;
            }
        }
        if let Some(sidx) = &params.sidx {
            grid.sort(sidx, params.sord.as_deref().unwrap_or("ASC"))?;
        }

        let per_page = grid.rows_per_page(params.rows);
        let paginator = Paginator::new(grid.executor.clone(), grid.select.clone());
        let page = paginator.fetch_page(params.page_number(), per_page).await?;
        debug_log!(
            "[GRID] {} page {}/{} ({} records)",
            grid.select.table_name(),
            page.number,
            page.page_count,
            page.total_items
        );

        Ok(GridEnvelope::new(
            page.number,
            page.page_count,
            page.total_items,
            page.items,
            grid.token()?,
        ))
    }
}

fn combine(
    operator: table_mapper::query_builder::LogicalOperator,
    mut predicates: Vec<QueryFilter>,
) -> Option<QueryFilter> {
    match predicates.len() {
        0 => None,
        1 => predicates.pop(),
        _ => Some(QueryFilter::group(operator, predicates)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{FilterRule, GroupOp};
    use base64::Engine;
    use serde_json::json;
    use table_mapper::query_builder::{GroupBy, JoinClause, JoinType};
    use table_mapper::{MemoryExecutor, Row};

    fn row(value: serde_json::Value) -> Row {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    fn executor() -> Arc<dyn Executor> {
        Arc::new(MemoryExecutor::new())
    }

    fn orders_grid() -> Grid {
        let select = Select::new("orders")
            .with_alias("o")
            .columns(vec![
                SelectField::field("o.customer_id"),
                SelectField::field_as("o.status", "state"),
                SelectField::sum("o.amount").with_alias("total"),
            ])
            .join(
                JoinClause::new_on(JoinType::Left, "refunds", "o.id", "r.order_id")
                    .with_alias("r")
                    .with_columns(vec![SelectField::count("r.id").with_alias("refund_count")]),
            )
            .group_by(GroupBy::new(vec![
                "o.customer_id".to_string(),
                "o.status".to_string(),
            ]));
        Grid::new(executor(), select)
    }

    #[test]
    fn test_classify_field() {
        let grid = orders_grid().with_ignore_fields(["actions"]);

        assert_eq!(grid.classify_field("actions"), FieldKind::Ignored);
        assert_eq!(
            grid.classify_field("total"),
            FieldKind::Expression("SUM(o.amount)".to_string())
        );
        assert_eq!(
            grid.classify_field("refund_count"),
            FieldKind::Expression("COUNT(r.id)".to_string())
        );
        assert_eq!(
            grid.classify_field("state"),
            FieldKind::Column("o.status".to_string())
        );
        assert_eq!(
            grid.classify_field("customer_id"),
            FieldKind::Column("o.customer_id".to_string())
        );
        // Explicit select list and no allow-list
        assert_eq!(grid.classify_field("password"), FieldKind::Disallowed);
        assert_eq!(grid.classify_field("1; DROP TABLE x"), FieldKind::Disallowed);
    }

    #[test]
    fn test_star_select_accepts_identifiers() {
        let grid = Grid::new(executor(), Select::new("people"));
        assert_eq!(
            grid.classify_field("status"),
            FieldKind::Column("status".to_string())
        );
        assert_eq!(grid.classify_field("status)--"), FieldKind::Disallowed);

        let restricted = Grid::new(executor(), Select::new("people")).with_allowed_fields(["name"]);
        assert_eq!(
            restricted.classify_field("name"),
            FieldKind::Column("name".to_string())
        );
        assert_eq!(restricted.classify_field("status"), FieldKind::Disallowed);
    }

    #[test]
    fn test_expression_rules_go_to_having() {
        let mut grid = orders_grid();
        let rules = FilterRuleSet::new(GroupOp::And)
            .rule(FilterRule::new("state", "eq", "paid"))
            .rule(FilterRule::new("total", "gt", 100));
        grid.filter(&rules).unwrap();

        let (sql, values) = grid.select().build();
        assert_eq!(
            sql,
            "SELECT o.customer_id, o.status AS state, SUM(o.amount) AS total, \
             COUNT(r.id) AS refund_count FROM orders AS o \
             LEFT JOIN refunds AS r ON o.id = r.order_id \
             WHERE o.status = $1 GROUP BY o.customer_id, o.status HAVING SUM(o.amount) > $2"
        );
        assert_eq!(values, vec![json!("paid"), json!(100)]);
    }

    #[test]
    fn test_or_rules_are_grouped_and_anded_onto_existing_where() {
        let select = Select::new("people").filter(QueryFilter::eq("tenant_id", json!(7)));
        let mut grid = Grid::new(executor(), select);
        let rules = FilterRuleSet::new(GroupOp::Or)
            .rule(FilterRule::new("status", "eq", "active"))
            .rule(FilterRule::new("age", "ge", 30));
        grid.filter(&rules).unwrap();

        let (sql, _) = grid.select().build();
        assert_eq!(
            sql,
            "SELECT * FROM people WHERE tenant_id = $1 AND (status = $2 OR age >= $3)"
        );
    }

    #[test]
    fn test_ignored_and_unknown_rules_add_nothing() {
        let mut grid = Grid::new(executor(), Select::new("people")).with_ignore_fields(["actions"]);
        let rules = FilterRuleSet::new(GroupOp::And)
            .rule(FilterRule::new("actions", "eq", "x"))
            .rule(FilterRule::new("name", "nu", json!(null)))
            .rule(FilterRule::new("bad field", "eq", 1));
        grid.filter(&rules).unwrap();

        assert_eq!(grid.select().build().0, "SELECT * FROM people");
    }

    #[test]
    fn test_reject_policy() {
        let mut grid = Grid::new(executor(), Select::new("people")).with_policy(RulePolicy::Reject);

        let disallowed = FilterRuleSet::new(GroupOp::And).rule(FilterRule::new("a-b", "eq", 1));
        assert!(matches!(
            grid.filter(&disallowed),
            Err(GridError::DisallowedField(field)) if field == "a-b"
        ));

        let unknown = FilterRuleSet::new(GroupOp::And).rule(FilterRule::new("name", "zz", 1));
        assert!(matches!(
            grid.filter(&unknown),
            Err(GridError::UnsupportedOperator { .. })
        ));

        assert!(matches!(
            grid.sort("name; --", "asc"),
            Err(GridError::InvalidSortColumn(_))
        ));
    }

    #[test]
    fn test_sort_replaces_ordering() {
        let select = Select::new("people").order_by("id", SortOrder::Asc);
        let mut grid = Grid::new(executor(), select);

        grid.sort("", "desc").unwrap();
        assert_eq!(grid.select().ordering(), &[("id".to_string(), SortOrder::Asc)]);

        grid.sort("name", "desc").unwrap();
        assert_eq!(grid.select().build().0, "SELECT * FROM people ORDER BY name DESC");

        grid.sort("name", "whatever").unwrap();
        assert_eq!(grid.select().build().0, "SELECT * FROM people ORDER BY name ASC");
    }

    #[test]
    fn test_sort_on_expression_alias() {
        let mut grid = orders_grid();
        grid.sort("total", "DESC").unwrap();
        assert_eq!(
            grid.select().ordering(),
            &[("total".to_string(), SortOrder::Desc)]
        );
    }

    #[test]
    fn test_rows_per_page_bounds() {
        let settings = GridSettings::new(20, 50, RulePolicy::Ignore);
        let grid = Grid::with_settings(executor(), Select::new("people"), &settings);

        assert_eq!(grid.rows_per_page(None), 20);
        assert_eq!(grid.rows_per_page(Some(0)), 20);
        assert_eq!(grid.rows_per_page(Some(-3)), 20);
        assert_eq!(grid.rows_per_page(Some(10)), 10);
        assert_eq!(grid.rows_per_page(Some(500)), 50);
    }

    #[test]
    fn test_sort_on_ignored_field_is_rejected() {
        let select = Select::new("users").columns(vec![SelectField::field("name")]);
        let mut grid = Grid::new(executor(), select).with_policy(RulePolicy::Reject);
        grid.set_ignore_fields(["password"]);

        assert!(matches!(
            grid.sort("password", "asc"),
            Err(GridError::InvalidSortColumn(column)) if column == "password"
        ));

        let mut lenient = grid.clone().with_policy(RulePolicy::Ignore);
        lenient.sort("password", "asc").unwrap();
        assert_eq!(lenient.select().build().0, "SELECT name FROM users");
        assert!(lenient.state().sidx.is_none());
    }

    #[test]
    fn test_row_expression_rules_go_to_where() {
        let select = Select::new("order_lines").columns(vec![
            SelectField::field("id"),
            SelectField::expression("price * quantity", "line_total"),
            SelectField::aggregate_expression("COUNT(*) OVER ()", "line_count"),
        ]);
        let mut grid = Grid::new(executor(), select);
        assert_eq!(
            grid.classify_field("line_total"),
            FieldKind::Computed("price * quantity".to_string())
        );
        assert_eq!(
            grid.classify_field("line_count"),
            FieldKind::Expression("COUNT(*) OVER ()".to_string())
        );

        let rules = FilterRuleSet::new(GroupOp::And).rule(FilterRule::new("line_total", "gt", 100));
        grid.filter(&rules).unwrap();
        grid.sort("line_total", "desc").unwrap();

        assert_eq!(
            grid.select().build().0,
            "SELECT id, price * quantity AS line_total, COUNT(*) OVER () AS line_count \
             FROM order_lines WHERE price * quantity > $1 ORDER BY line_total DESC"
        );
    }

    #[test]
    fn test_declared_types_convert_rule_data() {
        let mut grid = Grid::new(executor(), Select::new("people"))
            .with_column_types([("age", ColumnType::Integer), ("active", ColumnType::Boolean)]);
        let rules = FilterRuleSet::new(GroupOp::And)
            .rule(FilterRule::new("age", "gt", "30"))
            .rule(FilterRule::new("active", "eq", "t"))
            .rule(FilterRule::new("age", "cn", "3"));
        grid.filter(&rules).unwrap();

        let (sql, values) = grid.select().build();
        assert_eq!(
            sql,
            "SELECT * FROM people WHERE (age > $1::bigint AND active = $2::boolean \
             AND age::text LIKE $3)"
        );
        assert_eq!(values, vec![json!(30), json!(true), json!("%3%")]);

        let mut strict = Grid::new(executor(), Select::new("people"))
            .with_column_types([("age", ColumnType::Integer)])
            .with_policy(RulePolicy::Reject);
        let unreadable = FilterRuleSet::new(GroupOp::And).rule(FilterRule::new("age", "gt", "old"));
        assert!(matches!(
            strict.filter(&unreadable),
            Err(GridError::InvalidValue { field, column_type: ColumnType::Integer, .. }) if field == "age"
        ));
    }

    #[tokio::test]
    async fn test_describe_types_base_joined_and_aggregate_fields() {
        let executor: Arc<dyn Executor> = Arc::new(
            MemoryExecutor::new()
                .with_table(
                    "orders",
                    "id",
                    vec![row(json!({"customer_id": 4, "status": "paid", "amount": 12.5}))],
                )
                .with_table("refunds", "id", vec![row(json!({"order_id": 1, "reason": "late"}))]),
        );
        let grid = Grid {
            executor,
            ..orders_grid()
        };
        assert_eq!(grid.column_type("state"), None);

        grid.describe().await.unwrap();
        assert_eq!(grid.column_type("state"), Some(ColumnType::Text));
        assert_eq!(grid.column_type("customer_id"), Some(ColumnType::Integer));
        assert_eq!(grid.column_type("total"), Some(ColumnType::Float));
        assert_eq!(grid.column_type("refund_count"), Some(ColumnType::Integer));
        assert_eq!(grid.column_type("r.reason"), None);

        // Clones share what was read
        let copy = grid.clone().with_column_types([("state", ColumnType::Other)]);
        assert_eq!(copy.column_type("state"), Some(ColumnType::Other));
        assert_eq!(copy.column_type("customer_id"), Some(ColumnType::Integer));
    }

    fn people_grid() -> Grid {
        let executor: Arc<dyn Executor> = Arc::new(MemoryExecutor::new().with_table(
            "people",
            "id",
            vec![row(json!({"name": "Jo", "status": "active", "age": 30}))],
        ));
        let select = Select::new("people").columns(vec![
            SelectField::field("name"),
            SelectField::field("status"),
            SelectField::field("age"),
        ]);
        Grid::new(executor, select)
    }

    #[tokio::test]
    async fn test_token_replays_filters_and_sort() {
        let base = people_grid();
        let mut grid = base.clone();
        grid.describe().await.unwrap();
        grid.filter(&FilterRuleSet::new(GroupOp::And).rule(FilterRule::new("name", "bw", "Jo")))
            .unwrap();
        grid.filter(&FilterRuleSet::new(GroupOp::Or).rule(FilterRule::new("age", "ge", "21")))
            .unwrap();
        grid.sort("age", "desc").unwrap();

        let token = grid.token().unwrap();
        let restored = base.from_token(&token).await.unwrap();
        assert_eq!(restored.select(), grid.select());
        assert_eq!(restored.state(), grid.state());
        assert_eq!(
            restored.select().build().0,
            "SELECT name, status, age FROM people WHERE name::text LIKE $1 \
             AND age >= $2::bigint ORDER BY age DESC"
        );
    }

    #[tokio::test]
    async fn test_modified_token_cannot_widen_the_query() {
        let base = people_grid().with_policy(RulePolicy::Reject);
        let token = |state: GridState| QueryToken::encode(&state).unwrap();

        let hidden_field = token(GridState {
            filters: vec![FilterRuleSet::new(GroupOp::And)
                .rule(FilterRule::new("password", "bw", "a"))],
            ..GridState::default()
        });
        assert!(matches!(
            base.from_token(&hidden_field).await,
            Err(GridError::DisallowedField(field)) if field == "password"
        ));

        let injected_sort = token(GridState {
            sidx: Some("age; DROP TABLE people".to_string()),
            ..GridState::default()
        });
        assert!(matches!(
            base.from_token(&injected_sort).await,
            Err(GridError::InvalidSortColumn(_))
        ));

        let lenient = base.clone().with_policy(RulePolicy::Ignore);
        let replayed = lenient.from_token(&hidden_field).await.unwrap();
        assert_eq!(replayed.select(), lenient.select());

        let query_shaped = QueryToken::from(base64::engine::general_purpose::STANDARD.encode(
            serde_json::to_vec(&Select::new("admins").filter(QueryFilter::eq("1", json!(1))))
                .unwrap(),
        ));
        assert!(matches!(
            base.from_token(&query_shaped).await,
            Err(GridError::Token(_))
        ));
    }
}
