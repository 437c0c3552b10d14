//! Computed columns applied to the returned page.

use std::fmt;
use std::sync::Arc;

use crate::model::Record;
use crate::model::Value;

/// A computed column function.
pub type ColumnFn = Arc<dyn Fn(&Record) -> Value + Send + Sync>;

/// Declared computed columns, applied in declaration order.
///
/// Each function sees the row as augmented by the columns declared before it.
///
/// # Example
///
/// ```
/// use datagrid_lib::engine::AddColumns;
/// use datagrid_lib::model::{Record, Value};
///
/// let columns = AddColumns::new()
///     .add("name_upper", |row| match row.get("name") {
///         Some(Value::String(name)) => name.to_uppercase().into(),
///         _ => Value::Null,
///     });
///
/// let rows = columns.transform(vec![Record::new().set("name", "anna")]);
/// assert_eq!(rows[0].get("name_upper"), Some(&Value::from("ANNA")));
/// ```
#[derive(Clone, Default)]
pub struct AddColumns {
    columns: Vec<(String, ColumnFn)>,
}

impl AddColumns {
    /// Creates an empty declaration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a computed column. Re-declaring a name replaces its function.
    pub fn add<F>(mut self, name: impl Into<String>, column: F) -> Self
    where
        F: Fn(&Record) -> Value + Send + Sync + 'static,
    {
        let name = name.into();
        let column: ColumnFn = Arc::new(column);
        match self.columns.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = column,
            None => self.columns.push((name, column)),
        }
        self
    }

    /// Returns `true` if no column is declared.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns the declared column names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Augments one row.
    pub fn apply(&self, mut record: Record) -> Record {
        for (name, column) in &self.columns {
            let value = column(&record);
            record.insert(name.clone(), value);
        }
        record
    }

    /// Augments every row; rows pass through untouched when nothing is declared.
    pub fn transform(&self, items: Vec<Record>) -> Vec<Record> {
        if self.is_empty() {
            return items;
        }
        items.into_iter().map(|record| self.apply(record)).collect()
    }
}

impl fmt::Debug for AddColumns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_see_earlier_columns() {
        let columns = AddColumns::new()
            .add("double", |row| {
                row.get("n").and_then(Value::as_f64).map(|n| n * 2.0).into()
            })
            .add("label", |row| match row.get("double") {
                Some(value) => format!("x{}", value).into(),
                None => Value::Null,
            });

        let rows = columns.transform(vec![Record::new().set("n", 4)]);
        assert_eq!(rows[0].get("double"), Some(&Value::Float(8.0)));
        assert_eq!(rows[0].get("label"), Some(&Value::from("x8")));
    }

    #[test]
    fn test_no_columns_pass_through() {
        let rows = vec![Record::new().set("id", 1)];
        assert_eq!(AddColumns::new().transform(rows.clone()), rows);
    }
}
