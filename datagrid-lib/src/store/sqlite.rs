//! SQLite-backed queryable store.

use async_sqlite::Client;
use async_sqlite::rusqlite;
use async_sqlite::rusqlite::types::Value as SqlValue;
use async_sqlite::rusqlite::types::ValueRef;
use async_trait::async_trait;
use log::trace;
use rust_decimal::prelude::ToPrimitive;

use super::QueryableStore;
use crate::error::StoreError;
use crate::model::Record;
use crate::model::Value;
use crate::query::Query;
use crate::query::sql::count_to_sql;
use crate::query::sql::select_to_sql;

/// A queryable store over one SQLite table, optionally joined to related tables.
///
/// Relation-qualified fields (`customers.name`) resolve through the joins
/// declared with [`join`](Self::join). Grids configured with another
/// relation separator must pass it to [`with_separator`](Self::with_separator).
///
/// # Example
///
/// ```ignore
/// use async_sqlite::ClientBuilder;
/// use datagrid_lib::store::SqliteStore;
///
/// let client = ClientBuilder::new().path("shop.db").open().await?;
/// let store = SqliteStore::new(client, "orders")
///     .join("LEFT JOIN customers ON customers.id = orders.customer_id");
/// ```
pub struct SqliteStore {
    client: Client,
    table: String,
    joins: Vec<String>,
    separator: char,
}

impl SqliteStore {
    /// Creates a store reading `table` through `client`.
    pub fn new(client: Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
            joins: Vec::new(),
            separator: '.',
        }
    }

    /// Sets the separator between relation and field names.
    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    /// Adds a `JOIN` clause making a related table's fields available.
    pub fn join(mut self, clause: impl Into<String>) -> Self {
        self.joins.push(clause.into());
        self
    }

    /// Returns the underlying client.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl QueryableStore for SqliteStore {
    fn table(&self) -> Result<&str, StoreError> {
        Ok(&self.table)
    }

    async fn count(&self, query: &Query) -> Result<usize, StoreError> {
        let statement = count_to_sql(query, &self.joins, self.separator);
        trace!("{} {:?}", statement.sql, statement.params);

        let count = self
            .client
            .conn(move |conn| {
                let params: Vec<SqlValue> = statement.params.iter().map(to_sql_value).collect();
                conn.query_row(
                    &statement.sql,
                    rusqlite::params_from_iter(params.iter()),
                    |row| row.get::<_, i64>(0),
                )
            })
            .await?;

        usize::try_from(count).map_err(|_| StoreError::query(format!("invalid count {}", count)))
    }

    async fn fetch(&self, query: &Query) -> Result<Vec<Record>, StoreError> {
        let statement = select_to_sql(query, &self.joins, self.separator);
        trace!("{} {:?}", statement.sql, statement.params);

        let records = self
            .client
            .conn(move |conn| {
                let mut stmt = conn.prepare(&statement.sql)?;
                let names: Vec<String> = stmt
                    .column_names()
                    .into_iter()
                    .map(String::from)
                    .collect();
                let params: Vec<SqlValue> = statement.params.iter().map(to_sql_value).collect();

                let rows = stmt.query_map(rusqlite::params_from_iter(params.iter()), |row| {
                    let mut record = Record::new();
                    for (index, name) in names.iter().enumerate() {
                        record.insert(name.clone(), from_sql_value(row.get_ref(index)?));
                    }
                    Ok(record)
                })?;

                rows.collect::<Result<Vec<_>, _>>()
            })
            .await?;

        Ok(records)
    }
}

fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Int(n) => SqlValue::Integer(i64::from(*n)),
        Value::Long(n) => SqlValue::Integer(*n),
        Value::Float(n) => SqlValue::Real(*n),
        Value::Decimal(d) => d
            .to_f64()
            .map(SqlValue::Real)
            .unwrap_or_else(|| SqlValue::Text(d.to_string())),
        Value::String(s) => SqlValue::Text(s.clone()),
        Value::Guid(g) => SqlValue::Text(g.to_string()),
        // Midnight renders date-only so it compares correctly against DATE columns.
        Value::DateTime(dt) => {
            let naive = dt.naive_utc();
            if naive.time() == chrono::NaiveTime::MIN {
                SqlValue::Text(naive.format("%Y-%m-%d").to_string())
            } else {
                SqlValue::Text(naive.format("%Y-%m-%d %H:%M:%S").to_string())
            }
        }
        Value::Date(d) => SqlValue::Text(d.format("%Y-%m-%d").to_string()),
        Value::Record(_) | Value::List(_) => SqlValue::Text(value.to_string()),
    }
}

fn from_sql_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(n) => match i32::try_from(n) {
            Ok(small) => Value::Int(small),
            Err(_) => Value::Long(n),
        },
        ValueRef::Real(n) => Value::Float(n),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
    }
}
