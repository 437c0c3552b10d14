//! Shared fixtures for integration tests.

#![allow(dead_code)]

use datagrid_lib::grid::Column;
use datagrid_lib::model::Record;
use datagrid_lib::model::Value;
use simplelog::Config;
use simplelog::LevelFilter;
use simplelog::TestLogger;

/// Routes library logs to the test harness output.
pub fn init_logger() {
    let _ = TestLogger::init(LevelFilter::Trace, Config::default());
}

pub fn ids(records: &[Record]) -> Vec<i64> {
    records
        .iter()
        .filter_map(|record| record.get_long("id").ok().flatten())
        .collect()
}

pub fn longs(values: &[Value]) -> Vec<i64> {
    values
        .iter()
        .filter_map(|value| match value {
            Value::Int(n) => Some(i64::from(*n)),
            Value::Long(n) => Some(*n),
            _ => None,
        })
        .collect()
}

pub fn order_columns() -> Vec<Column> {
    vec![
        Column::new("id").label("ID").sortable(),
        Column::new("status").label("Status").searchable().sortable(),
        Column::new("code").label("Code").sortable(),
        Column::new("total").label("Total").sortable(),
        Column::new("customer")
            .label("Customer")
            .sortable()
            .relation("customers.name"),
    ]
}
