//! Search and column filter evaluation.
//!
//! Grid search and filter state is translated into one [`Filter`] tree. The
//! in-memory path evaluates that tree record by record; the queryable path
//! hands it to the store with every field qualified for the store's table.

use chrono::NaiveDate;
use chrono::NaiveTime;
use log::debug;
use log::trace;
use log::warn;

use super::SortResolver;
use crate::error::ConfigError;
use crate::grid::Column;
use crate::grid::FilterKind;
use crate::grid::FilterSet;
use crate::grid::FilterSpec;
use crate::grid::FilterValue;
use crate::grid::GridConfig;
use crate::grid::RelationSearch;
use crate::grid::SearchState;
use crate::grid::UnknownFilterPolicy;
use crate::model::Record;
use crate::model::Value;
use crate::query::Filter;

/// Builds and applies the search and filter predicate of a grid.
///
/// # Example
///
/// ```
/// use datagrid_lib::engine::FilterEngine;
/// use datagrid_lib::grid::{Column, FilterSet, FilterSpec, GridConfig, RelationSearch, SearchState};
/// use datagrid_lib::model::Record;
///
/// let config = GridConfig::default();
/// let columns = vec![Column::new("name").searchable(), Column::new("age")];
/// let relations = RelationSearch::new();
/// let engine = FilterEngine::new(&columns, &relations, &config);
///
/// let records = vec![
///     Record::new().set("name", "Anna").set("age", 30),
///     Record::new().set("name", "Ann").set("age", 25),
/// ];
/// let search = SearchState { term: "Ann".into() };
/// let filters = FilterSet::new().with("age", FilterSpec::equals(30));
///
/// let matched = engine.apply(records, &search, &filters).unwrap();
/// assert_eq!(matched.len(), 1);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FilterEngine<'a> {
    columns: &'a [Column],
    relation_search: &'a RelationSearch,
    config: &'a GridConfig,
}

impl<'a> FilterEngine<'a> {
    /// Creates an engine over the grid's columns and relation search declarations.
    pub fn new(columns: &'a [Column], relation_search: &'a RelationSearch, config: &'a GridConfig) -> Self {
        Self {
            columns,
            relation_search,
            config,
        }
    }

    /// Filters in-memory records.
    ///
    /// A record whose evaluation fails is excluded; the rest of the batch is
    /// still evaluated.
    pub fn apply(
        &self,
        records: Vec<Record>,
        search: &SearchState,
        filters: &FilterSet,
    ) -> Result<Vec<Record>, ConfigError> {
        let Some(predicate) = self.build(search, filters, None)? else {
            return Ok(records);
        };

        let separator = self.config.relation_separator;
        Ok(records
            .into_iter()
            .filter(|record| {
                predicate.evaluate(record, separator).unwrap_or_else(|err| {
                    trace!("Record excluded: {}", err);
                    false
                })
            })
            .collect())
    }

    /// Builds the store predicate, with fields qualified for `table`.
    ///
    /// Returns `None` when neither search nor any filter is active.
    pub fn predicate(
        &self,
        table: &str,
        search: &SearchState,
        filters: &FilterSet,
    ) -> Result<Option<Filter>, ConfigError> {
        self.build(search, filters, Some(table))
    }

    fn build(
        &self,
        search: &SearchState,
        filters: &FilterSet,
        table: Option<&str>,
    ) -> Result<Option<Filter>, ConfigError> {
        let mut parts = Vec::new();

        if search.is_active() {
            parts.push(self.search_group(search.trimmed(), table));
        }

        for (field, spec) in filters.active() {
            let target = self.field_name(field, table);
            if let Some(filter) = self.spec_filter(field, target, spec)? {
                parts.push(filter);
            }
        }

        Ok(match parts.len() {
            0 => None,
            1 => parts.pop(),
            _ => Some(Filter::And(parts)),
        })
    }

    // Any searchable column or declared relation column containing the term.
    // In memory an aliased column matches on its own field or on the aliased
    // path through nested records.
    fn search_group(&self, term: &str, table: Option<&str>) -> Filter {
        let separator = self.config.relation_separator;
        let columns = self
            .columns
            .iter()
            .filter(|column| column.searchable)
            .flat_map(|column| match (table, &column.relation_field) {
                (None, Some(alias)) => vec![column.field.clone(), alias.clone()],
                _ => vec![self.field_name(&column.field, table)],
            });
        let relations = self.relation_search.qualified_fields(separator);

        Filter::or(
            columns
                .chain(relations)
                .map(|field| Filter::contains(field, term)),
        )
    }

    fn field_name(&self, field: &str, table: Option<&str>) -> String {
        match table {
            Some(table) => SortResolver::new(self.config.relation_separator).store_field(self.columns, field, table),
            None => field.to_string(),
        }
    }

    fn spec_filter(&self, field: &str, target: String, spec: &FilterSpec) -> Result<Option<Filter>, ConfigError> {
        let filter = match (&spec.kind, &spec.value) {
            (FilterKind::Unknown(kind), _) => {
                return match self.config.unknown_filter_policy {
                    UnknownFilterPolicy::Ignore => {
                        warn!("Ignoring filter on {} with unknown kind '{}'", field, kind);
                        Ok(None)
                    }
                    UnknownFilterPolicy::Reject => Err(ConfigError::UnknownFilterKind {
                        field: field.to_string(),
                        kind: kind.clone(),
                    }),
                };
            }
            (FilterKind::Contains, value) => text_filter(target, value, Filter::Contains),
            (FilterKind::NotContains, value) => text_filter(target.clone(), value, Filter::Contains)
                .map(|contains| Filter::is_not_null(target).and_also(contains.not())),
            (FilterKind::StartsWith, value) => text_filter(target, value, Filter::StartsWith),
            (FilterKind::EndsWith, value) => text_filter(target, value, Filter::EndsWith),
            (FilterKind::Equals, FilterValue::List(values)) | (FilterKind::In, FilterValue::List(values)) => {
                Some(Filter::is_in(target, present(values)))
            }
            (FilterKind::Equals, FilterValue::Single(value)) | (FilterKind::In, FilterValue::Single(value)) => {
                Some(Filter::eq(target, value.clone()))
            }
            (FilterKind::NotEquals, FilterValue::Single(value)) => Some(Filter::ne(target, value.clone())),
            (FilterKind::NotEquals, FilterValue::List(values)) => Some(
                Filter::is_not_null(target.clone()).and_also(Filter::is_in(target, present(values)).not()),
            ),
            (FilterKind::Between, FilterValue::Range { start, end }) => {
                Some(Filter::between(target, bound(start), bound(end)))
            }
            (FilterKind::Between, FilterValue::Single(value)) => Some(Filter::eq(target, value.clone())),
            (FilterKind::Boolean, FilterValue::Single(value)) => match parse_bool(value) {
                Some(flag) => Some(Filter::eq(target, flag)),
                None => {
                    debug!("Boolean filter on {} has unreadable value {:?}", field, value);
                    None
                }
            },
            (FilterKind::DateRange, FilterValue::Range { start, end }) => {
                let start = start.as_ref().and_then(|value| day_bound(value, NaiveTime::MIN));
                let end = end.as_ref().and_then(|value| day_bound(value, end_of_day()));
                if start.is_none() && end.is_none() {
                    debug!("Date range filter on {} has no readable bound", field);
                    None
                } else {
                    Some(Filter::between(target, start, end))
                }
            }
            (kind, value) => {
                debug!("Filter {} on {} does not accept {:?}", kind.name(), field, value);
                None
            }
        };
        Ok(filter)
    }
}

fn text_filter(target: String, value: &FilterValue, build: fn(String, String) -> Filter) -> Option<Filter> {
    match value {
        FilterValue::Single(value) => value.to_text().map(|text| build(target, text)),
        FilterValue::List(values) => {
            let terms: Vec<_> = present(values)
                .into_iter()
                .filter_map(|value| value.to_text())
                .map(|text| build(target.clone(), text))
                .collect();
            Some(Filter::or(terms))
        }
        FilterValue::Range { .. } => None,
    }
}

fn present(values: &[Value]) -> Vec<Value> {
    values.iter().filter(|value| !value.is_blank()).cloned().collect()
}

fn bound(value: &Option<Value>) -> Option<Value> {
    value.as_ref().filter(|value| !value.is_blank()).cloned()
}

fn parse_bool(value: &Value) -> Option<bool> {
    if let Some(flag) = value.as_bool() {
        return Some(flag);
    }
    match value {
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN)
}

// Date-only bounds are widened to `time`; full timestamps are kept as given.
fn day_bound(value: &Value, time: NaiveTime) -> Option<Value> {
    let date = match value {
        Value::Date(date) => Some(*date),
        Value::String(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok(),
        _ => None,
    };
    match date {
        Some(date) => Some(Value::DateTime(date.and_time(time).and_utc())),
        None => value.as_datetime().map(Value::DateTime),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<Column> {
        vec![
            Column::new("id"),
            Column::new("name").searchable(),
            Column::new("email").searchable(),
            Column::new("age"),
            Column::new("active"),
            Column::new("customer").searchable().relation("customers.name"),
        ]
    }

    fn people() -> Vec<Record> {
        vec![
            Record::new().set("id", 1).set("name", "Anna").set("age", 30).set("active", true),
            Record::new().set("id", 2).set("name", "Ann").set("age", 25).set("active", 0),
            Record::new().set("id", 3).set("name", "Bob").set("age", "30").set("email", "ann@b.io"),
        ]
    }

    fn ids(records: &[Record]) -> Vec<i64> {
        records
            .iter()
            .filter_map(|r| r.get_long("id").ok().flatten())
            .collect()
    }

    fn search(term: &str) -> SearchState {
        SearchState { term: term.into() }
    }

    #[test]
    fn test_filters_and_search_are_anded() {
        let config = GridConfig::default();
        let columns = columns();
        let relations = RelationSearch::new();
        let engine = FilterEngine::new(&columns, &relations, &config);

        let filters = FilterSet::new().with("age", FilterSpec::equals(30));
        let matched = engine.apply(people(), &search("ann"), &filters).unwrap();
        assert_eq!(ids(&matched), vec![1, 3]);
    }

    #[test]
    fn test_blank_filters_are_inactive() {
        let config = GridConfig::default();
        let columns = columns();
        let relations = RelationSearch::new();
        let engine = FilterEngine::new(&columns, &relations, &config);

        let filters = FilterSet::new()
            .with("name", FilterSpec::contains(""))
            .with("age", FilterSpec::between(None, None));
        assert!(engine.predicate("people", &search(" "), &filters).unwrap().is_none());
        assert_eq!(engine.apply(people(), &search(""), &filters).unwrap().len(), 3);
    }

    #[test]
    fn test_boolean_filter_accepts_stored_integers() {
        let config = GridConfig::default();
        let columns = columns();
        let relations = RelationSearch::new();
        let engine = FilterEngine::new(&columns, &relations, &config);

        let filters = FilterSet::new().with(
            "active",
            FilterSpec::new(FilterKind::Boolean, FilterValue::Single("false".into())),
        );
        let matched = engine.apply(people(), &search(""), &filters).unwrap();
        assert_eq!(ids(&matched), vec![2]);
    }

    #[test]
    fn test_unknown_kind_policy() {
        let columns = columns();
        let relations = RelationSearch::new();
        let filters = FilterSet::new().with(
            "age",
            FilterSpec::new(FilterKind::parse("fuzzy"), FilterValue::Single(3.into())),
        );

        let config = GridConfig::default();
        let engine = FilterEngine::new(&columns, &relations, &config);
        assert_eq!(engine.apply(people(), &search(""), &filters).unwrap().len(), 3);

        let config = GridConfig::default().with_unknown_filter_policy(UnknownFilterPolicy::Reject);
        let engine = FilterEngine::new(&columns, &relations, &config);
        assert_eq!(
            engine.apply(people(), &search(""), &filters),
            Err(ConfigError::UnknownFilterKind {
                field: "age".into(),
                kind: "fuzzy".into(),
            })
        );
    }

    #[test]
    fn test_store_predicate_qualifies_fields() {
        let config = GridConfig::default();
        let columns = columns();
        let relations = RelationSearch::new().relation("tags", ["label"]);
        let engine = FilterEngine::new(&columns, &relations, &config);

        let filters = FilterSet::new().with("age", FilterSpec::equals(30));
        let predicate = engine.predicate("people", &search("x"), &filters).unwrap();

        assert_eq!(
            predicate,
            Some(Filter::And(vec![
                Filter::or([
                    Filter::contains("people.name", "x"),
                    Filter::contains("people.email", "x"),
                    Filter::contains("customers.name", "x"),
                    Filter::contains("tags.label", "x"),
                ]),
                Filter::eq("people.age", 30),
            ]))
        );
    }

    #[test]
    fn test_date_range_end_covers_whole_day() {
        let config = GridConfig::default();
        let columns = vec![Column::new("created")];
        let relations = RelationSearch::new();
        let engine = FilterEngine::new(&columns, &relations, &config);

        let records = vec![
            Record::new().set("id", 1).set("created", "2024-01-31 18:30:00"),
            Record::new().set("id", 2).set("created", "2024-02-01 00:00:00"),
            Record::new().set("id", 3).set("created", "2024-01-01"),
        ];
        let filters = FilterSet::new().with(
            "created",
            FilterSpec::date_range(Some("2024-01-01".into()), Some("2024-01-31".into())),
        );
        let matched = engine.apply(records, &search(""), &filters).unwrap();
        assert_eq!(ids(&matched), vec![1, 3]);
    }

    #[test]
    fn test_aliased_column_searches_nested_path_in_memory() {
        let config = GridConfig::default();
        let columns = columns();
        let relations = RelationSearch::new();
        let engine = FilterEngine::new(&columns, &relations, &config);

        let records = vec![
            Record::new()
                .set("id", 1)
                .set("customers", Record::new().set("name", "Contoso")),
            Record::new()
                .set("id", 2)
                .set("customers", Record::new().set("name", "Fabrikam")),
            Record::new().set("id", 3).set("customer", "Contoso Ltd"),
        ];
        let matched = engine.apply(records, &search("contoso"), &FilterSet::new()).unwrap();
        assert_eq!(ids(&matched), vec![1, 3]);
    }
}
