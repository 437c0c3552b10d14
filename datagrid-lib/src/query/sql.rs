//! SQL generation for store queries.
//!
//! Filters render to parameterised fragments (`?` placeholders) with the
//! bound values collected alongside, so no user input is ever spliced into
//! the statement text.

use super::Filter;
use super::OrderBy;
use super::Query;
use crate::model::Value;

/// A rendered SQL statement with its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    /// Statement text with `?` placeholders.
    pub sql: String,
    /// Values bound to the placeholders, in order.
    pub params: Vec<Value>,
}

/// Renders a `SELECT` for the query, with any extra `JOIN` clauses.
pub fn select_to_sql(query: &Query, joins: &[String], separator: char) -> SqlStatement {
    let columns = if query.selected().is_empty() {
        format!("{}.*", quote_ident(query.table(), separator))
    } else {
        query
            .selected()
            .iter()
            .map(|field| format!("{} AS {}", quote_ident(field, separator), quote_alias(field)))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut params = Vec::new();
    let mut sql = format!("SELECT {} FROM {}", columns, quote_ident(query.table(), separator));
    push_joins(&mut sql, joins);

    if let Some(filter) = query.filter_ref() {
        sql.push_str(" WHERE ");
        sql.push_str(&filter_to_sql(filter, &mut params, separator));
    }

    if let Some(order) = query.order().filter(|order| !order.is_empty()) {
        sql.push_str(" ORDER BY ");
        sql.push_str(&order_to_sql(order, separator));
    }

    match (query.limit(), query.offset()) {
        (Some(limit), offset) => sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset)),
        (None, 0) => {}
        (None, offset) => sql.push_str(&format!(" LIMIT -1 OFFSET {}", offset)),
    }

    SqlStatement { sql, params }
}

/// Renders a `SELECT COUNT(*)` over the query's matches.
pub fn count_to_sql(query: &Query, joins: &[String], separator: char) -> SqlStatement {
    let mut params = Vec::new();
    let mut sql = format!("SELECT COUNT(*) FROM {}", quote_ident(query.table(), separator));
    push_joins(&mut sql, joins);

    if let Some(filter) = query.filter_ref() {
        sql.push_str(" WHERE ");
        sql.push_str(&filter_to_sql(filter, &mut params, separator));
    }

    SqlStatement { sql, params }
}

fn push_joins(sql: &mut String, joins: &[String]) {
    for join in joins {
        sql.push(' ');
        sql.push_str(join);
    }
}

/// Converts a `Filter` to a SQL boolean expression, appending bound values to `params`.
pub fn filter_to_sql(filter: &Filter, params: &mut Vec<Value>, separator: char) -> String {
    let mut bind = |value: &Value| {
        params.push(value.clone());
        "?"
    };

    match filter {
        Filter::Eq(field, Value::Null) => format!("{} IS NULL", quote_ident(field, separator)),
        Filter::Eq(field, value) => format!("{} = {}", quote_ident(field, separator), bind(value)),
        Filter::Ne(field, value) => format!("{} <> {}", quote_ident(field, separator), bind(value)),
        Filter::Gt(field, value) => format!("{} > {}", quote_ident(field, separator), bind(value)),
        Filter::Ge(field, value) => format!("{} >= {}", quote_ident(field, separator), bind(value)),
        Filter::Lt(field, value) => format!("{} < {}", quote_ident(field, separator), bind(value)),
        Filter::Le(field, value) => format!("{} <= {}", quote_ident(field, separator), bind(value)),
        Filter::Contains(field, needle) => {
            like(field, format!("%{}%", escape_like(needle)), params, separator)
        }
        Filter::StartsWith(field, needle) => like(field, format!("{}%", escape_like(needle)), params, separator),
        Filter::EndsWith(field, needle) => like(field, format!("%{}", escape_like(needle)), params, separator),
        Filter::In(field, values) => {
            if values.is_empty() {
                return "0 = 1".to_string();
            }
            let placeholders: Vec<_> = values.iter().map(|v| bind(v).to_string()).collect();
            format!("{} IN ({})", quote_ident(field, separator), placeholders.join(", "))
        }
        Filter::Between(field, start, end) => match (start, end) {
            (Some(start), Some(end)) => {
                let lower = bind(start);
                let upper = bind(end);
                format!("{} BETWEEN {} AND {}", quote_ident(field, separator), lower, upper)
            }
            (Some(start), None) => format!("{} >= {}", quote_ident(field, separator), bind(start)),
            (None, Some(end)) => format!("{} <= {}", quote_ident(field, separator), bind(end)),
            (None, None) => format!("{} IS NOT NULL", quote_ident(field, separator)),
        },
        Filter::IsNull(field) => format!("{} IS NULL", quote_ident(field, separator)),
        Filter::IsNotNull(field) => format!("{} IS NOT NULL", quote_ident(field, separator)),
        Filter::And(filters) => join(filters, " AND ", "1 = 1", params, separator),
        Filter::Or(filters) => join(filters, " OR ", "0 = 1", params, separator),
        Filter::Not(inner) => format!("NOT ({})", filter_to_sql(inner, params, separator)),
    }
}

fn join(filters: &[Filter], glue: &str, empty: &str, params: &mut Vec<Value>, separator: char) -> String {
    if filters.is_empty() {
        return empty.to_string();
    }
    let parts: Vec<_> = filters.iter().map(|f| filter_to_sql(f, params, separator)).collect();
    format!("({})", parts.join(glue))
}

fn like(field: &str, pattern: String, params: &mut Vec<Value>, separator: char) -> String {
    params.push(Value::String(pattern.to_lowercase()));
    format!("LOWER({}) LIKE ? ESCAPE '\\'", quote_ident(field, separator))
}

/// Converts an `OrderBy` to a SQL `ORDER BY` list.
///
/// Numeric terms render as `field + 0`, which reads strings holding numbers
/// by their numeric value.
pub fn order_to_sql(order: &OrderBy, separator: char) -> String {
    order
        .terms()
        .iter()
        .map(|term| {
            if term.numeric {
                format!("{} + 0 {}", quote_ident(&term.field, separator), term.direction.as_sql())
            } else {
                format!("{} {}", quote_ident(&term.field, separator), term.direction.as_sql())
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Quotes a possibly qualified identifier: `orders.total` → `"orders"."total"`.
///
/// `separator` is the grid's relation separator; the rendered SQL always
/// qualifies with `.`.
pub fn quote_ident(field: &str, separator: char) -> String {
    field
        .split(separator)
        .map(|part| format!("\"{}\"", part.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(".")
}

// Selected fields keep their qualified name as the column alias.
fn quote_alias(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Escapes `LIKE` wildcards so the needle matches literally.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}
