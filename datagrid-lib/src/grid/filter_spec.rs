//! Column filter definitions supplied by filter widgets.

use std::collections::BTreeMap;

use crate::model::Value;

/// How a column filter matches records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterKind {
    /// Case-insensitive substring.
    Contains,
    /// Case-insensitive substring must be absent.
    NotContains,
    /// Loose equality.
    Equals,
    /// Loose inequality.
    NotEquals,
    /// Case-insensitive prefix.
    StartsWith,
    /// Case-insensitive suffix.
    EndsWith,
    /// Membership in a list of values.
    In,
    /// Inclusive numeric or lexical range.
    Between,
    /// Strict boolean equality.
    Boolean,
    /// Inclusive date range; a date-only upper bound covers the whole day.
    DateRange,
    /// A kind this version does not understand.
    Unknown(String),
}

impl FilterKind {
    /// Parses a kind name as sent by filter widgets.
    ///
    /// Unrecognized names become [`FilterKind::Unknown`] instead of failing.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "contains" => FilterKind::Contains,
            "not_contains" => FilterKind::NotContains,
            "equals" | "is" => FilterKind::Equals,
            "not_equals" | "is_not" => FilterKind::NotEquals,
            "starts_with" => FilterKind::StartsWith,
            "ends_with" => FilterKind::EndsWith,
            "in" | "multi_select" => FilterKind::In,
            "between" | "number" => FilterKind::Between,
            "boolean" => FilterKind::Boolean,
            "date_range" | "date_picker" => FilterKind::DateRange,
            _ => FilterKind::Unknown(name.to_string()),
        }
    }

    /// Returns the canonical kind name.
    pub fn name(&self) -> &str {
        match self {
            FilterKind::Contains => "contains",
            FilterKind::NotContains => "not_contains",
            FilterKind::Equals => "equals",
            FilterKind::NotEquals => "not_equals",
            FilterKind::StartsWith => "starts_with",
            FilterKind::EndsWith => "ends_with",
            FilterKind::In => "in",
            FilterKind::Between => "between",
            FilterKind::Boolean => "boolean",
            FilterKind::DateRange => "date_range",
            FilterKind::Unknown(name) => name,
        }
    }
}

/// The payload of a column filter.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// One value (text, number, boolean).
    Single(Value),
    /// Several values, for membership filters.
    List(Vec<Value>),
    /// Range bounds; either side may be open.
    Range {
        start: Option<Value>,
        end: Option<Value>,
    },
}

impl FilterValue {
    /// Returns `true` if the payload is empty, which makes the filter inactive.
    pub fn is_blank(&self) -> bool {
        match self {
            FilterValue::Single(value) => value.is_blank(),
            FilterValue::List(values) => values.iter().all(Value::is_blank),
            FilterValue::Range { start, end } => {
                start.as_ref().is_none_or(Value::is_blank) && end.as_ref().is_none_or(Value::is_blank)
            }
        }
    }
}

/// A filter on one column.
///
/// # Example
///
/// ```
/// use datagrid_lib::grid::FilterSpec;
///
/// let status = FilterSpec::equals("open");
/// let total = FilterSpec::between(Some(10.into()), Some(100.into()));
/// let tags = FilterSpec::is_in(["red".into(), "blue".into()]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSpec {
    /// Matching rule.
    pub kind: FilterKind,
    /// Filter payload.
    pub value: FilterValue,
}

impl FilterSpec {
    /// Creates a filter of any kind.
    pub fn new(kind: FilterKind, value: FilterValue) -> Self {
        Self { kind, value }
    }

    /// Creates a substring filter.
    pub fn contains(value: impl Into<Value>) -> Self {
        Self::new(FilterKind::Contains, FilterValue::Single(value.into()))
    }

    /// Creates an equality filter.
    pub fn equals(value: impl Into<Value>) -> Self {
        Self::new(FilterKind::Equals, FilterValue::Single(value.into()))
    }

    /// Creates a membership filter.
    pub fn is_in(values: impl IntoIterator<Item = Value>) -> Self {
        Self::new(FilterKind::In, FilterValue::List(values.into_iter().collect()))
    }

    /// Creates an inclusive range filter.
    pub fn between(start: Option<Value>, end: Option<Value>) -> Self {
        Self::new(FilterKind::Between, FilterValue::Range { start, end })
    }

    /// Creates a boolean filter.
    pub fn boolean(value: bool) -> Self {
        Self::new(FilterKind::Boolean, FilterValue::Single(Value::Bool(value)))
    }

    /// Creates a date range filter.
    pub fn date_range(start: Option<Value>, end: Option<Value>) -> Self {
        Self::new(FilterKind::DateRange, FilterValue::Range { start, end })
    }

    /// Returns `true` if the filter takes part in matching.
    pub fn is_active(&self) -> bool {
        !self.value.is_blank()
    }
}

/// Active filters keyed by column field, in field order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    filters: BTreeMap<String, FilterSpec>,
}

impl FilterSet {
    /// Creates an empty filter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the filter for a field (builder pattern).
    pub fn with(mut self, field: impl Into<String>, spec: FilterSpec) -> Self {
        self.insert(field, spec);
        self
    }

    /// Adds or replaces the filter for a field.
    pub fn insert(&mut self, field: impl Into<String>, spec: FilterSpec) {
        self.filters.insert(field.into(), spec);
    }

    /// Removes the filter for a field.
    pub fn remove(&mut self, field: &str) -> Option<FilterSpec> {
        self.filters.remove(field)
    }

    /// Removes every filter.
    pub fn clear(&mut self) {
        self.filters.clear();
    }

    /// Returns the filter for a field.
    pub fn get(&self, field: &str) -> Option<&FilterSpec> {
        self.filters.get(field)
    }

    /// Returns the number of filters, active or not.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns `true` if no filter is set.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Iterates over filters whose payload is not blank.
    pub fn active(&self) -> impl Iterator<Item = (&str, &FilterSpec)> {
        self.filters
            .iter()
            .filter(|(_, spec)| spec.is_active())
            .map(|(field, spec)| (field.as_str(), spec))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_and_unknown_kinds() {
        assert_eq!(FilterKind::parse("multi_select"), FilterKind::In);
        assert_eq!(FilterKind::parse("Date_Picker"), FilterKind::DateRange);
        assert_eq!(
            FilterKind::parse("regex"),
            FilterKind::Unknown("regex".to_string())
        );
    }

    #[test]
    fn test_blank_payloads_are_inactive() {
        let filters = FilterSet::new()
            .with("name", FilterSpec::contains(""))
            .with("tags", FilterSpec::is_in([]))
            .with("total", FilterSpec::between(None, Some(Value::Null)))
            .with("status", FilterSpec::equals("open"));

        let active: Vec<_> = filters.active().map(|(field, _)| field).collect();
        assert_eq!(active, vec!["status"]);
    }

    #[test]
    fn test_false_is_an_active_boolean() {
        assert!(FilterSpec::boolean(false).is_active());
    }
}
