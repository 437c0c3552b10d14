//! Ordered in-memory record collection

use serde::Deserialize;
use serde::Serialize;

use super::Record;
use super::Value;

/// An ordered, materialized set of records.
///
/// This is the value held by the in-memory datasource variant and the value
/// the result cache stores per grid identity.
///
/// # Example
///
/// ```
/// use datagrid_lib::model::{Collection, Record};
///
/// let collection: Collection = vec![
///     Record::new().set("id", 1).set("status", "open"),
///     Record::new().set("id", 2).set("status", "closed"),
/// ]
/// .into();
///
/// assert_eq!(collection.len(), 2);
/// assert_eq!(collection.pluck("id").len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection {
    records: Vec<Record>,
}

impl Collection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a collection from a JSON array.
    ///
    /// Returns `None` when the JSON value is not an array.
    pub fn from_json(json: serde_json::Value) -> Option<Self> {
        match json {
            serde_json::Value::Array(items) => {
                Some(items.into_iter().map(Record::from_json).collect())
            }
            _ => None,
        }
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the collection holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the records as a slice.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Consumes the collection and returns the records.
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// Returns an iterator over the records.
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Appends a record.
    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    /// Collects the value of `field` from every record, `Null` where absent.
    pub fn pluck(&self, field: &str) -> Vec<Value> {
        self.records
            .iter()
            .map(|record| record.get(field).cloned().unwrap_or_default())
            .collect()
    }
}

impl From<Vec<Record>> for Collection {
    fn from(records: Vec<Record>) -> Self {
        Self { records }
    }
}

impl FromIterator<Record> for Collection {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Collection {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
