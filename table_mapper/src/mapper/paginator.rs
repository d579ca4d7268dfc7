use crate::entity::RowSet;
use crate::errors::MapperError;
use crate::executor::Executor;
use crate::query_builder::pagination::{normalize_page, page_count};
use crate::query_builder::{Pagination, Select};
use serde::Serialize;
use std::sync::Arc;

/// One page of a paginated query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    /// Normalized 1-based page number actually returned
    pub number: u64,
    pub per_page: u64,
    pub page_count: u64,
    pub total_items: u64,
    pub items: RowSet,
}

/// Deferred query that is counted first, then fetched one page at a time
#[derive(Clone)]
pub struct Paginator {
    executor: Arc<dyn Executor>,
    select: Select,
}

impl std::fmt::Debug for Paginator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Paginator")
            .field("select", &self.select)
            .finish()
    }
}

impl Paginator {
    pub fn new(executor: Arc<dyn Executor>, select: Select) -> Self {
        Self { executor, select }
    }

    pub fn select(&self) -> &Select {
        &self.select
    }

    pub async fn count(&self) -> Result<u64, MapperError> {
        self.executor.fetch_count(&self.select).await
    }

    /// Fetch `page`, clamped into the available range
    pub async fn fetch_page(&self, page: i64, per_page: u64) -> Result<Page, MapperError> {
        let per_page = per_page.max(1);
        let total_items = self.count().await?;
        let page_count = page_count(total_items, per_page);
        let number = normalize_page(page, page_count);

        let items = if total_items == 0 {
            RowSet::new()
        } else {
            let mut select = self.select.clone();
            select.set_pagination(Pagination::for_page(number, per_page));
            self.executor.fetch_all(&select).await?
        };

        Ok(Page {
            number,
            per_page,
            page_count,
            total_items,
            items,
        })
    }
}
