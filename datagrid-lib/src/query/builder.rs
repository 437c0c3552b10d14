//! Store query description.

use super::Filter;
use super::OrderBy;

/// A query against a queryable store.
///
/// This is a plain value: the grid engine builds it and a
/// [`QueryableStore`](crate::store::QueryableStore) executes it.
///
/// # Example
///
/// ```
/// use datagrid_lib::query::{Filter, OrderBy, Query};
///
/// let query = Query::new("orders")
///     .filter(Filter::eq("orders.status", "open"))
///     .order_by(OrderBy::desc("orders.total"))
///     .page(10, 2);
///
/// assert_eq!(query.limit(), Some(10));
/// assert_eq!(query.offset(), 10);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    table: String,
    select: Vec<String>,
    filter: Option<Filter>,
    order_by: Option<OrderBy>,
    limit: Option<usize>,
    offset: usize,
}

impl Query {
    /// Creates a query over every row of `table`.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            select: Vec::new(),
            filter: None,
            order_by: None,
            limit: None,
            offset: 0,
        }
    }

    /// Specifies which fields to select.
    ///
    /// If not called, all fields are returned.
    pub fn select(mut self, fields: &[&str]) -> Self {
        self.select = fields.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// Sets the filter condition.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Sets the ordering of results.
    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by = Some(order);
        self
    }

    /// Returns the maximum number of records, if limited.
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Sets the maximum number of records returned.
    pub fn take(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Skips the first `n` records.
    pub fn skip(mut self, n: usize) -> Self {
        self.offset = n;
        self
    }

    /// Restricts the query to one page (1-based).
    pub fn page(self, page_size: usize, page: usize) -> Self {
        let offset = page.saturating_sub(1).saturating_mul(page_size);
        self.take(page_size).skip(offset)
    }

    /// Returns a copy without ordering or limits, for counting matches.
    pub fn for_count(&self) -> Self {
        Self {
            table: self.table.clone(),
            select: Vec::new(),
            filter: self.filter.clone(),
            order_by: None,
            limit: None,
            offset: 0,
        }
    }

    /// Returns the base table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the selected fields (empty means all).
    pub fn selected(&self) -> &[String] {
        &self.select
    }

    /// Returns the filter condition, if any.
    pub fn filter_ref(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    /// Returns the ordering, if any.
    pub fn order(&self) -> Option<&OrderBy> {
        self.order_by.as_ref()
    }

    /// Returns the number of skipped records.
    pub fn offset(&self) -> usize {
        self.offset
    }
}
