//! Sort key resolution

use crate::grid::Column;
use crate::grid::SortState;
use crate::model::Record;
use crate::query::OrderBy;

/// Resolves sort keys against the active table.
#[derive(Debug, Clone, Copy)]
pub struct SortResolver {
    separator: char,
}

impl SortResolver {
    /// Creates a resolver using `separator` between relation and field.
    pub fn new(separator: char) -> Self {
        Self { separator }
    }

    /// Qualifies a bare field with the table name.
    ///
    /// A field that already contains the separator is returned unchanged.
    ///
    /// ```
    /// use datagrid_lib::engine::SortResolver;
    ///
    /// let resolver = SortResolver::new('.');
    /// assert_eq!(resolver.resolve("total", "orders"), "orders.total");
    /// assert_eq!(resolver.resolve("customers.name", "orders"), "customers.name");
    /// ```
    pub fn resolve(&self, raw: &str, table: &str) -> String {
        if raw.contains(self.separator) {
            raw.to_string()
        } else {
            format!("{}{}{}", table, self.separator, raw)
        }
    }

    /// Returns the store field for a column field.
    ///
    /// A column aliased to a related field uses the alias; anything else is
    /// qualified with [`resolve`](Self::resolve).
    pub fn store_field(&self, columns: &[Column], field: &str, table: &str) -> String {
        columns
            .iter()
            .find(|column| column.field == field)
            .and_then(|column| column.relation_field.clone())
            .unwrap_or_else(|| self.resolve(field, table))
    }

    /// Builds the ordering for a sort state.
    ///
    /// With a table, the field is qualified for a store. A numeric-string
    /// sort emits the numeric reading first and the raw field second, so the
    /// raw value breaks ties between equal numeric readings.
    pub fn order_by(&self, sort: &SortState, columns: &[Column], table: Option<&str>) -> OrderBy {
        let field = match table {
            Some(table) => self.store_field(columns, &sort.field, table),
            None => sort.field.clone(),
        };

        let order = OrderBy::default();
        let order = if sort.numeric_string {
            order.then(field.clone(), sort.direction, true)
        } else {
            order
        };
        order.then(field, sort.direction, false)
    }

    /// Sorts records in memory. The sort is stable.
    pub fn sort(&self, records: &mut [Record], sort: &SortState) {
        let order = self.order_by(sort, &[], None);
        records.sort_by(|a, b| order.compare(a, b, self.separator));
    }
}

impl Default for SortResolver {
    fn default() -> Self {
        Self::new('.')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;
    use crate::query::Direction;

    fn ids(records: &[Record]) -> Vec<Value> {
        records
            .iter()
            .map(|r| r.get("id").cloned().unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_relation_alias_wins() {
        let resolver = SortResolver::default();
        let columns = vec![Column::new("customer").relation("customers.name")];
        assert_eq!(resolver.store_field(&columns, "customer", "orders"), "customers.name");
        assert_eq!(resolver.store_field(&columns, "total", "orders"), "orders.total");
    }

    #[test]
    fn test_numeric_string_emits_both_terms() {
        let resolver = SortResolver::default();
        let mut sort = SortState::new("code");
        sort.numeric_string = true;
        sort.direction = Direction::Desc;

        let order = resolver.order_by(&sort, &[], Some("items"));
        let terms = order.terms();
        assert_eq!(terms.len(), 2);
        assert!(terms[0].numeric);
        assert_eq!(terms[0].field, "items.code");
        assert!(!terms[1].numeric);
        assert_eq!(terms[1].direction, Direction::Desc);
    }

    #[test]
    fn test_in_memory_sort() {
        let resolver = SortResolver::default();
        let mut records = vec![
            Record::new().set("id", 1).set("code", "10"),
            Record::new().set("id", 2).set("code", "9"),
            Record::new().set("id", 3).set("code", "100"),
        ];

        let mut sort = SortState::new("code");
        resolver.sort(&mut records, &sort);
        assert_eq!(ids(&records), vec![Value::Int(1), Value::Int(3), Value::Int(2)]);

        sort.numeric_string = true;
        resolver.sort(&mut records, &sort);
        assert_eq!(ids(&records), vec![Value::Int(2), Value::Int(1), Value::Int(3)]);
    }

    #[test]
    fn test_in_memory_sort_of_mixed_column() {
        let resolver = SortResolver::default();
        let mut records: Vec<Record> = (0..400)
            .map(|i| {
                let code = (i * 37) % 1000;
                let record = Record::new().set("id", i);
                if i % 2 == 0 {
                    record.set("code", code)
                } else {
                    record.set("code", code.to_string())
                }
            })
            .collect();

        let mut sort = SortState::new("code");
        resolver.sort(&mut records, &sort);
        let codes: Vec<&Value> = records.iter().filter_map(|r| r.get("code")).collect();
        let (numbers, texts) = codes.split_at(200);
        assert!(numbers.iter().all(|v| matches!(v, Value::Int(_))));
        assert!(numbers.windows(2).all(|w| w[0].as_f64() <= w[1].as_f64()));
        assert!(texts.iter().all(|v| matches!(v, Value::String(_))));
        assert!(texts.windows(2).all(|w| w[0].to_text() <= w[1].to_text()));

        sort.numeric_string = true;
        resolver.sort(&mut records, &sort);
        let readings: Vec<f64> = records
            .iter()
            .filter_map(|r| r.get("code").and_then(Value::numeric_prefix))
            .collect();
        assert_eq!(readings.len(), 400);
        assert!(readings.windows(2).all(|w| w[0] <= w[1]));
    }
}
