//! Predicate tree shared by in-memory evaluation and store queries.

use std::cmp::Ordering;

use log::trace;

use crate::error::FieldError;
use crate::model::Record;
use crate::model::Value;

/// A filter condition over record fields.
///
/// The same tree is evaluated directly against in-memory records
/// ([`Filter::evaluate`]) and rendered into a `WHERE` clause for queryable
/// stores, so both datasource variants share one set of semantics.
///
/// # Example
///
/// ```
/// use datagrid_lib::query::Filter;
///
/// // Simple equality filter
/// let filter = Filter::eq("status", "open");
///
/// // Combined filter
/// let filter = Filter::and([
///     Filter::eq("status", "open"),
///     Filter::gt("total", 100),
/// ]);
///
/// // Using combinators
/// let filter = Filter::contains("name", "ann")
///     .or_else(Filter::contains("email", "ann"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Equality: `field = value`
    Eq(String, Value),
    /// Not equal: `field <> value`
    Ne(String, Value),
    /// Greater than: `field > value`
    Gt(String, Value),
    /// Greater than or equal: `field >= value`
    Ge(String, Value),
    /// Less than: `field < value`
    Lt(String, Value),
    /// Less than or equal: `field <= value`
    Le(String, Value),
    /// Case-insensitive substring match.
    Contains(String, String),
    /// Case-insensitive prefix match.
    StartsWith(String, String),
    /// Case-insensitive suffix match.
    EndsWith(String, String),
    /// Membership: `field IN (values)`
    In(String, Vec<Value>),
    /// Inclusive range; an open bound is unbounded on that side.
    Between(String, Option<Value>, Option<Value>),
    /// Is null (or absent).
    IsNull(String),
    /// Is not null.
    IsNotNull(String),
    /// Logical AND of multiple filters.
    And(Vec<Filter>),
    /// Logical OR of multiple filters.
    Or(Vec<Filter>),
    /// Logical negation.
    Not(Box<Filter>),
}

impl Filter {
    /// Creates an equality filter.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(field.into(), value.into())
    }

    /// Creates a not-equal filter.
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Ne(field.into(), value.into())
    }

    /// Creates a greater-than filter.
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Gt(field.into(), value.into())
    }

    /// Creates a greater-than-or-equal filter.
    pub fn ge(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Ge(field.into(), value.into())
    }

    /// Creates a less-than filter.
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Lt(field.into(), value.into())
    }

    /// Creates a less-than-or-equal filter.
    pub fn le(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Le(field.into(), value.into())
    }

    /// Creates a contains filter.
    pub fn contains(field: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Contains(field.into(), value.into())
    }

    /// Creates a starts-with filter.
    pub fn starts_with(field: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::StartsWith(field.into(), value.into())
    }

    /// Creates an ends-with filter.
    pub fn ends_with(field: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::EndsWith(field.into(), value.into())
    }

    /// Creates a membership filter.
    pub fn is_in(field: impl Into<String>, values: impl IntoIterator<Item = Value>) -> Self {
        Filter::In(field.into(), values.into_iter().collect())
    }

    /// Creates an inclusive range filter.
    pub fn between(field: impl Into<String>, start: Option<Value>, end: Option<Value>) -> Self {
        Filter::Between(field.into(), start, end)
    }

    /// Creates an is-null filter.
    pub fn is_null(field: impl Into<String>) -> Self {
        Filter::IsNull(field.into())
    }

    /// Creates an is-not-null filter.
    pub fn is_not_null(field: impl Into<String>) -> Self {
        Filter::IsNotNull(field.into())
    }

    /// Creates a logical AND of multiple filters.
    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::And(filters.into_iter().collect())
    }

    /// Creates a logical OR of multiple filters.
    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::Or(filters.into_iter().collect())
    }

    /// Combines this filter with another using logical AND.
    pub fn and_also(self, other: Filter) -> Self {
        match self {
            Filter::And(mut filters) => {
                filters.push(other);
                Filter::And(filters)
            }
            _ => Filter::And(vec![self, other]),
        }
    }

    /// Combines this filter with another using logical OR.
    pub fn or_else(self, other: Filter) -> Self {
        match self {
            Filter::Or(mut filters) => {
                filters.push(other);
                Filter::Or(filters)
            }
            _ => Filter::Or(vec![self, other]),
        }
    }

    /// Negates this filter.
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Filter::Not(Box::new(self))
    }

    /// Rewrites every field name in the tree.
    pub fn rename_fields(self, rename: &impl Fn(&str) -> String) -> Self {
        match self {
            Filter::Eq(f, v) => Filter::Eq(rename(&f), v),
            Filter::Ne(f, v) => Filter::Ne(rename(&f), v),
            Filter::Gt(f, v) => Filter::Gt(rename(&f), v),
            Filter::Ge(f, v) => Filter::Ge(rename(&f), v),
            Filter::Lt(f, v) => Filter::Lt(rename(&f), v),
            Filter::Le(f, v) => Filter::Le(rename(&f), v),
            Filter::Contains(f, v) => Filter::Contains(rename(&f), v),
            Filter::StartsWith(f, v) => Filter::StartsWith(rename(&f), v),
            Filter::EndsWith(f, v) => Filter::EndsWith(rename(&f), v),
            Filter::In(f, v) => Filter::In(rename(&f), v),
            Filter::Between(f, a, b) => Filter::Between(rename(&f), a, b),
            Filter::IsNull(f) => Filter::IsNull(rename(&f)),
            Filter::IsNotNull(f) => Filter::IsNotNull(rename(&f)),
            Filter::And(filters) => Filter::And(filters.into_iter().map(|f| f.rename_fields(rename)).collect()),
            Filter::Or(filters) => Filter::Or(filters.into_iter().map(|f| f.rename_fields(rename)).collect()),
            Filter::Not(inner) => Filter::Not(Box::new(inner.rename_fields(rename))),
        }
    }

    /// Evaluates the filter against a record.
    ///
    /// Fields are resolved with [`Record::get_path`], so relation-qualified
    /// names reach into nested records. A missing field reads as null.
    /// Ordering comparisons between incomparable values are errors; callers
    /// treat an error as "the record does not match".
    ///
    /// Inside an `Or`, a failing branch counts as false and the remaining
    /// branches still decide the result.
    pub fn evaluate(&self, record: &Record, separator: char) -> Result<bool, FieldError> {
        let lookup = |field: &str| -> Value {
            record
                .get_path(field, separator)
                .cloned()
                .unwrap_or_default()
        };

        match self {
            Filter::Eq(field, value) => Ok(lookup(field).loose_eq(value)),
            Filter::Ne(field, value) => {
                let actual = lookup(field);
                Ok(!actual.is_null() && !actual.loose_eq(value))
            }
            Filter::Gt(field, value) => ordered(field, &lookup(field), value, |o| o.is_gt()),
            Filter::Ge(field, value) => ordered(field, &lookup(field), value, |o| o.is_ge()),
            Filter::Lt(field, value) => ordered(field, &lookup(field), value, |o| o.is_lt()),
            Filter::Le(field, value) => ordered(field, &lookup(field), value, |o| o.is_le()),
            Filter::Contains(field, needle) => Ok(text_match(&lookup(field), needle, |h, n| h.contains(n))),
            Filter::StartsWith(field, needle) => {
                Ok(text_match(&lookup(field), needle, |h, n| h.starts_with(n)))
            }
            Filter::EndsWith(field, needle) => {
                Ok(text_match(&lookup(field), needle, |h, n| h.ends_with(n)))
            }
            Filter::In(field, values) => {
                let actual = lookup(field);
                Ok(values.iter().any(|candidate| actual.loose_eq(candidate)))
            }
            Filter::Between(field, start, end) => {
                let actual = lookup(field);
                if actual.is_null() {
                    return Ok(false);
                }
                let lower = match start {
                    Some(bound) => ordered(field, &actual, bound, |o| o.is_ge())?,
                    None => true,
                };
                let upper = match end {
                    Some(bound) => ordered(field, &actual, bound, |o| o.is_le())?,
                    None => true,
                };
                Ok(lower && upper)
            }
            Filter::IsNull(field) => Ok(lookup(field).is_null()),
            Filter::IsNotNull(field) => Ok(!lookup(field).is_null()),
            Filter::And(filters) => {
                for filter in filters {
                    if !filter.evaluate(record, separator)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Filter::Or(filters) => Ok(filters.iter().any(|filter| {
                filter.evaluate(record, separator).unwrap_or_else(|err| {
                    trace!("Or branch skipped: {}", err);
                    false
                })
            })),
            Filter::Not(inner) => Ok(!inner.evaluate(record, separator)?),
        }
    }
}

fn ordered(
    field: &str,
    actual: &Value,
    bound: &Value,
    accept: impl Fn(Ordering) -> bool,
) -> Result<bool, FieldError> {
    if actual.is_null() {
        return Ok(false);
    }
    match actual.compare(bound) {
        Some(ordering) => Ok(accept(ordering)),
        None => Err(FieldError::type_mismatch(
            field,
            bound.type_name(),
            actual.type_name(),
        )),
    }
}

fn text_match(actual: &Value, needle: &str, matches: impl Fn(&str, &str) -> bool) -> bool {
    match actual.to_text() {
        Some(haystack) => matches(&haystack.to_lowercase(), &needle.to_lowercase()),
        None => false,
    }
}
