//! Queryable store over records held in memory.

use async_trait::async_trait;
use log::trace;

use super::QueryableStore;
use crate::error::StoreError;
use crate::model::Record;
use crate::model::Value;
use crate::query::Query;

/// A queryable store that evaluates queries against a fixed set of records.
///
/// Fields qualified with the store's own table name (`orders.total`) read
/// the record's own fields; other qualified names resolve through nested
/// records (`customer.name`).
///
/// # Example
///
/// ```
/// use datagrid_lib::model::Record;
/// use datagrid_lib::store::MemoryStore;
///
/// let store = MemoryStore::new("orders", vec![
///     Record::new().set("id", 1).set("status", "open"),
///     Record::new().set("id", 2).set("status", "closed"),
/// ]);
/// ```
#[derive(Debug, Clone)]
pub struct MemoryStore {
    table: String,
    records: Vec<Record>,
    separator: char,
}

impl MemoryStore {
    /// Creates a store named `table` over `records`.
    pub fn new(table: impl Into<String>, records: impl IntoIterator<Item = Record>) -> Self {
        Self {
            table: table.into(),
            records: records.into_iter().collect(),
            separator: '.',
        }
    }

    /// Sets the relation separator (default `'.'`).
    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    /// Returns the stored records.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    fn local(&self, field: &str) -> String {
        field
            .strip_prefix(self.table.as_str())
            .and_then(|rest| rest.strip_prefix(self.separator))
            .unwrap_or(field)
            .to_string()
    }

    fn matching(&self, query: &Query) -> Vec<&Record> {
        let filter = query
            .filter_ref()
            .map(|filter| filter.clone().rename_fields(&|field| self.local(field)));

        self.records
            .iter()
            .filter(|record| match &filter {
                Some(filter) => filter.evaluate(record, self.separator).unwrap_or_else(|err| {
                    trace!("Record excluded: {}", err);
                    false
                }),
                None => true,
            })
            .collect()
    }
}

#[async_trait]
impl QueryableStore for MemoryStore {
    fn table(&self) -> Result<&str, StoreError> {
        Ok(&self.table)
    }

    async fn count(&self, query: &Query) -> Result<usize, StoreError> {
        Ok(self.matching(query).len())
    }

    async fn fetch(&self, query: &Query) -> Result<Vec<Record>, StoreError> {
        let mut matched = self.matching(query);

        if let Some(order) = query.order() {
            let order = order.clone().rename_fields(&|field| self.local(field));
            matched.sort_by(|a, b| order.compare(a, b, self.separator));
        }

        let page = matched
            .into_iter()
            .skip(query.offset())
            .take(query.limit().unwrap_or(usize::MAX));

        let selected = query.selected();
        if selected.is_empty() {
            return Ok(page.cloned().collect());
        }

        Ok(page
            .map(|record| {
                selected
                    .iter()
                    .map(|field| {
                        let value = record
                            .get_path(&self.local(field), self.separator)
                            .cloned()
                            .unwrap_or(Value::Null);
                        (field.clone(), value)
                    })
                    .collect()
            })
            .collect())
    }
}
