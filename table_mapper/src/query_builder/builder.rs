//! SELECT descriptor
//!
//! `Select` is plain data: it can be cloned, inspected, serialized into a client token and
//! rendered by [`SqlGenerator`](super::sql_generation::SqlGenerator).

use crate::query_builder::aggregation::SelectField;
use crate::query_builder::filter::QueryFilter;
use crate::query_builder::grouping::GroupBy;
use crate::query_builder::join::JoinClause;
use crate::query_builder::ordering::SortOrder;
use crate::query_builder::pagination::Pagination;
use crate::query_builder::sql_generation::SqlGenerator;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Select {
    pub(crate) table: String,
    pub(crate) alias: Option<String>,
    pub(crate) fields: Vec<SelectField>,
    #[serde(default)]
    pub(crate) joins: Vec<JoinClause>,
    #[serde(default)]
    pub(crate) conditions: Vec<QueryFilter>,
    pub(crate) group_by: Option<GroupBy>,
    #[serde(default)]
    pub(crate) order_by: Vec<(String, SortOrder)>,
    pub(crate) limit: Option<i64>,
    pub(crate) offset: Option<i64>,
}

impl Select {
    /// `SELECT * FROM table`
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            alias: None,
            fields: Vec::new(),
            joins: Vec::new(),
            conditions: Vec::new(),
            group_by: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Replace the select list
    pub fn columns(mut self, fields: Vec<SelectField>) -> Self {
        self.fields = fields;
        self
    }

    pub fn column(mut self, field: SelectField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn join(mut self, join: JoinClause) -> Self {
        self.joins.push(join);
        self
    }

    /// Add a filter condition
    pub fn filter(mut self, filter: QueryFilter) -> Self {
        self.conditions.push(filter);
        self
    }

    /// Add multiple filters (combined with AND)
    pub fn filters(mut self, filters: Vec<QueryFilter>) -> Self {
        self.conditions.extend(filters);
        self
    }

    pub fn group_by(mut self, group_by: GroupBy) -> Self {
        self.group_by = Some(group_by);
        self
    }

    pub fn having(mut self, filter: QueryFilter) -> Self {
        self.add_having(filter);
        self
    }

    /// Add ordering
    pub fn order_by(mut self, field: &str, order: SortOrder) -> Self {
        self.order_by.push((field.to_string(), order));
        self
    }

    /// Add limit
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Add offset
    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn add_where(&mut self, filter: QueryFilter) {
        self.conditions.push(filter);
    }

    /// HAVING without an explicit GROUP BY applies to the whole result as one group
    pub fn add_having(&mut self, filter: QueryFilter) {
        self.group_by
            .get_or_insert_with(GroupBy::default)
            .push_having(filter);
    }

    /// Drop any previous ordering and sort by `field` alone
    pub fn set_order(&mut self, field: &str, order: SortOrder) {
        self.order_by = vec![(field.to_string(), order)];
    }

    pub fn set_pagination(&mut self, pagination: Pagination) {
        self.limit = pagination.limit;
        self.offset = pagination.offset;
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn table_alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Name used to qualify the base table's columns
    pub fn table_ref(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }

    pub fn fields(&self) -> &[SelectField] {
        &self.fields
    }

    pub fn joins(&self) -> &[JoinClause] {
        &self.joins
    }

    pub fn conditions(&self) -> &[QueryFilter] {
        &self.conditions
    }

    pub fn grouping(&self) -> Option<&GroupBy> {
        self.group_by.as_ref()
    }

    pub fn having_conditions(&self) -> &[QueryFilter] {
        self.group_by
            .as_ref()
            .and_then(|group| group.having.as_deref())
            .unwrap_or(&[])
    }

    pub fn ordering(&self) -> &[(String, SortOrder)] {
        &self.order_by
    }

    pub fn pagination(&self) -> Pagination {
        Pagination {
            limit: self.limit,
            offset: self.offset,
        }
    }

    /// True when the base table contributes `*` (no explicit columns or an explicit `*`)
    pub fn selects_all(&self) -> bool {
        self.fields.is_empty() || self.fields.iter().any(|f| matches!(f, SelectField::All))
    }

    /// Select list in output order: base columns, then each join's columns
    pub fn select_items(&self) -> Vec<&SelectField> {
        self.fields
            .iter()
            .chain(self.joins.iter().flat_map(|join| join.columns.iter()))
            .collect()
    }

    /// Same query without ORDER BY, LIMIT and OFFSET; the input of a row count
    pub fn without_window(&self) -> Self {
        let mut select = self.clone();
        select.order_by.clear();
        select.limit = None;
        select.offset = None;
        select
    }

    pub fn build(&self) -> (String, Vec<Value>) {
        SqlGenerator::build_select(self)
    }

    pub fn build_count(&self) -> (String, Vec<Value>) {
        SqlGenerator::build_count(self)
    }
}
