//! Page arithmetic
//!
//! Page numbers are 1-based. A requested page below 1 becomes 1 and a page past the end
//! becomes the last page, so a listing never answers with an out-of-range page.

use serde::{Deserialize, Serialize};

/// Pagination configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Pagination {
    /// LIMIT/OFFSET window for a (normalized) 1-based page
    pub fn for_page(page: u64, per_page: u64) -> Self {
        let per_page = per_page.max(1);
        let page = page.max(1);
        Self {
            limit: Some(per_page as i64),
            offset: Some(((page - 1) * per_page) as i64),
        }
    }
}

/// Number of pages needed for `total_items`; zero items means zero pages
pub fn page_count(total_items: u64, per_page: u64) -> u64 {
    let per_page = per_page.max(1);
    total_items.div_ceil(per_page)
}

/// Clamp a requested page into `1..=page_count` (page 1 when there are no pages)
pub fn normalize_page(requested: i64, page_count: u64) -> u64 {
    if requested < 1 {
        return 1;
    }
    let requested = requested as u64;
    if page_count > 0 && requested > page_count {
        page_count
    } else if page_count == 0 {
        1
    } else {
        requested
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_page() {
        let second = Pagination::for_page(2, 10);
        assert_eq!((second.limit, second.offset), (Some(10), Some(10)));

        let clamped = Pagination::for_page(0, 0);
        assert_eq!((clamped.limit, clamped.offset), (Some(1), Some(0)));
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(25, 10), 3);
        assert_eq!(page_count(20, 10), 2);
        assert_eq!(page_count(0, 10), 0);
        assert_eq!(page_count(5, 0), 5);
    }

    #[test]
    fn test_normalize_page() {
        assert_eq!(normalize_page(0, 3), 1);
        assert_eq!(normalize_page(-4, 3), 1);
        assert_eq!(normalize_page(2, 3), 2);
        assert_eq!(normalize_page(9, 3), 3);
        assert_eq!(normalize_page(5, 0), 1);
    }
}
