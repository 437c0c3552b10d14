//! Pagination

use serde::Deserialize;
use serde::Serialize;

use crate::grid::PaginationState;
use crate::model::Record;

/// One page of the matched records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultPage {
    /// Records on this page, in order.
    pub items: Vec<Record>,
    /// Number of records matched before slicing.
    pub total_count: usize,
    /// 1-based page number.
    pub current_page: usize,
    /// Records per page; `0` means every match is on this page.
    pub page_size: usize,
}

impl ResultPage {
    /// Builds a page from an already sliced set of items.
    ///
    /// A page size of zero pins the page number to 1.
    pub fn new(items: Vec<Record>, total_count: usize, current_page: usize, page_size: usize) -> Self {
        let current_page = if page_size == 0 { 1 } else { current_page.max(1) };
        Self {
            items,
            total_count,
            current_page,
            page_size,
        }
    }

    /// Returns the number of the last page (at least 1).
    pub fn last_page(&self) -> usize {
        if self.page_size == 0 {
            return 1;
        }
        self.total_count.div_ceil(self.page_size).max(1)
    }

    /// Returns `true` if pages follow this one.
    pub fn has_more_pages(&self) -> bool {
        self.current_page < self.last_page()
    }

    /// Returns the number of items on this page.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if this page holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Slices ordered records into the requested page.
///
/// `total_count` is taken before slicing. A page past the end yields no
/// items; a page size of zero returns every record on page 1.
pub fn paginate(records: Vec<Record>, pagination: &PaginationState) -> ResultPage {
    let total_count = records.len();
    let PaginationState {
        page_size,
        current_page,
    } = *pagination;

    if page_size == 0 {
        return ResultPage::new(records, total_count, 1, 0);
    }

    let current_page = current_page.max(1);
    let offset = (current_page - 1).saturating_mul(page_size);
    let items = records.into_iter().skip(offset).take(page_size).collect();
    ResultPage::new(items, total_count, current_page, page_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(n: i32) -> Vec<Record> {
        (1..=n).map(|id| Record::new().set("id", id)).collect()
    }

    #[test]
    fn test_zero_page_size_returns_everything() {
        let page = paginate(
            records(23),
            &PaginationState {
                page_size: 0,
                current_page: 4,
            },
        );
        assert_eq!(page.len(), 23);
        assert_eq!(page.total_count, 23);
        assert_eq!(page.current_page, 1);
        assert!(!page.has_more_pages());
    }

    #[test]
    fn test_offset_pagination() {
        let page = paginate(
            records(23),
            &PaginationState {
                page_size: 10,
                current_page: 3,
            },
        );
        assert_eq!(page.len(), 3);
        assert_eq!(page.total_count, 23);
        assert_eq!(page.last_page(), 3);
        assert_eq!(page.items[0].get("id"), Some(&crate::model::Value::Int(21)));
    }

    #[test]
    fn test_page_past_the_end_is_empty() {
        let page = paginate(
            records(5),
            &PaginationState {
                page_size: 10,
                current_page: 2,
            },
        );
        assert!(page.is_empty());
        assert_eq!(page.total_count, 5);
        assert_eq!(page.current_page, 2);
    }
}
