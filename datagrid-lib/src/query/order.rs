//! Ordering types for grid queries.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::model::Record;
use crate::model::Value;

/// Sort direction for ordering results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Ascending order (A-Z, 0-9).
    #[default]
    Asc,
    /// Descending order (Z-A, 9-0).
    Desc,
}

impl Direction {
    /// Returns the opposite direction.
    pub fn toggled(self) -> Self {
        match self {
            Direction::Asc => Direction::Desc,
            Direction::Desc => Direction::Asc,
        }
    }

    /// Returns the SQL keyword for this direction.
    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Asc => f.write_str("asc"),
            Direction::Desc => f.write_str("desc"),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Direction::Asc),
            "desc" => Ok(Direction::Desc),
            other => Err(format!("unknown sort direction '{}'", other)),
        }
    }
}

/// One `ORDER BY` term.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderTerm {
    /// Field (possibly relation-qualified) to order by.
    pub field: String,
    /// Sort direction.
    pub direction: Direction,
    /// Order by the numeric reading of the field (`field + 0`) instead of its raw value.
    pub numeric: bool,
}

/// Specifies the ordering of query results.
///
/// Multiple fields can be chained together for secondary, tertiary, etc. sorting.
///
/// # Example
///
/// ```
/// use datagrid_lib::query::OrderBy;
///
/// // Single field ordering
/// let order = OrderBy::desc("total");
///
/// // Numbers stored as strings: numeric reading first, raw value as tie-break
/// let order = OrderBy::numeric_asc("orders.code").then_asc("orders.code");
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrderBy {
    pub(crate) terms: Vec<OrderTerm>,
}

impl OrderBy {
    /// Creates an ascending order on a field.
    pub fn asc(field: impl Into<String>) -> Self {
        Self::default().then(field, Direction::Asc, false)
    }

    /// Creates a descending order on a field.
    pub fn desc(field: impl Into<String>) -> Self {
        Self::default().then(field, Direction::Desc, false)
    }

    /// Creates an ascending order on the numeric reading of a field.
    pub fn numeric_asc(field: impl Into<String>) -> Self {
        Self::default().then(field, Direction::Asc, true)
    }

    /// Adds a secondary ascending order on a field.
    pub fn then_asc(self, field: impl Into<String>) -> Self {
        self.then(field, Direction::Asc, false)
    }

    /// Adds a secondary descending order on a field.
    pub fn then_desc(self, field: impl Into<String>) -> Self {
        self.then(field, Direction::Desc, false)
    }

    /// Adds an order term.
    pub fn then(mut self, field: impl Into<String>, direction: Direction, numeric: bool) -> Self {
        self.terms.push(OrderTerm {
            field: field.into(),
            direction,
            numeric,
        });
        self
    }

    /// Returns the order terms, highest precedence first.
    pub fn terms(&self) -> &[OrderTerm] {
        &self.terms
    }

    /// Returns `true` if no ordering was requested.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Rewrites every field name.
    pub fn rename_fields(mut self, rename: &impl Fn(&str) -> String) -> Self {
        for term in &mut self.terms {
            term.field = rename(&term.field);
        }
        self
    }

    /// Compares two records the way a store would order them.
    ///
    /// Nulls sort first in ascending order. Numbers sort before text the way
    /// SQLite orders mixed columns, so a number never compares with a numeric
    /// string by value. Numeric terms compare the leading numeric portion of
    /// the value.
    pub fn compare(&self, a: &Record, b: &Record, separator: char) -> Ordering {
        for term in &self.terms {
            let left = a.get_path(&term.field, separator).unwrap_or(&Value::Null);
            let right = b.get_path(&term.field, separator).unwrap_or(&Value::Null);

            let ordering = if term.numeric {
                compare_numeric(left, right)
            } else {
                compare_values(left, right)
            };
            let ordering = match term.direction {
                Direction::Asc => ordering,
                Direction::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

fn compare_numeric(a: &Value, b: &Value) -> Ordering {
    match (a.numeric_prefix(), b.numeric_prefix()) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
    }
}

// Class first: null, numbers, timestamps, text, then nested values.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    let class = rank(a);
    if class != rank(b) {
        return class.cmp(&rank(b));
    }
    match class {
        0 => Ordering::Equal,
        1 => number(a).total_cmp(&number(b)),
        2 => a.as_datetime().cmp(&b.as_datetime()),
        _ => a.to_text().cmp(&b.to_text()),
    }
}

fn rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        v if v.is_numeric() => 1,
        Value::DateTime(_) | Value::Date(_) => 2,
        Value::String(_) | Value::Guid(_) => 3,
        _ => 4,
    }
}

fn number(value: &Value) -> f64 {
    match value {
        Value::Bool(b) => f64::from(u8::from(*b)),
        other => other.as_f64().unwrap_or(f64::NAN),
    }
}
