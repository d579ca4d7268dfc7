use super::filter::QueryFilter;
use serde::{Deserialize, Serialize};

/// Represents a GROUP BY clause with optional HAVING conditions.
///
/// An empty field list with HAVING conditions renders only the HAVING clause, which
/// treats the whole result as one group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupBy {
    pub fields: Vec<String>,
    pub having: Option<Vec<QueryFilter>>,
}

impl GroupBy {
    pub fn new(fields: Vec<String>) -> Self {
        Self {
            fields,
            having: None,
        }
    }

    pub fn single(field: impl Into<String>) -> Self {
        Self::new(vec![field.into()])
    }

    pub fn with_having(mut self, conditions: Vec<QueryFilter>) -> Self {
        self.having = Some(conditions);
        self
    }

    /// Add a single HAVING condition
    pub fn having(mut self, condition: QueryFilter) -> Self {
        self.push_having(condition);
        self
    }

    pub fn push_having(&mut self, condition: QueryFilter) {
        self.having.get_or_insert_with(Vec::new).push(condition);
    }

    pub fn has_having(&self) -> bool {
        self.having.as_ref().map(|h| !h.is_empty()).unwrap_or(false)
    }
}
