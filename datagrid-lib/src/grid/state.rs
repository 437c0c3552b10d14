//! Per-interaction grid state owned by the collaborator.

use log::debug;

use super::Column;
use super::FilterSet;
use super::FilterSpec;
use super::GridConfig;
use crate::error::ConfigError;
use crate::query::Direction;

/// Global free-text search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    /// The term typed by the user.
    pub term: String,
}

impl SearchState {
    /// Returns `true` if the term contributes a search predicate.
    pub fn is_active(&self) -> bool {
        !self.term.trim().is_empty()
    }

    /// Returns the term without surrounding whitespace.
    pub fn trimmed(&self) -> &str {
        self.term.trim()
    }
}

/// Active sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortState {
    /// Field to sort by; may be relation-qualified.
    pub field: String,
    /// Sort direction.
    pub direction: Direction,
    /// Order strings holding numbers by their numeric value first.
    pub numeric_string: bool,
}

impl SortState {
    /// Creates an ascending sort on a field.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Asc,
            numeric_string: false,
        }
    }
}

/// Page position and size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    /// Records per page; `0` returns every match as one page.
    pub page_size: usize,
    /// 1-based page number.
    pub current_page: usize,
}

impl PaginationState {
    /// Creates pagination on the first page.
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            current_page: 1,
        }
    }
}

/// Everything the user can change between pipeline runs.
///
/// Mutators mirror the grid's user interactions and keep the page position
/// consistent: a new search term, page size or filter sends the grid back to
/// page 1.
///
/// # Example
///
/// ```
/// use datagrid_lib::grid::{Column, GridConfig, GridState};
///
/// let config = GridConfig::default();
/// let mut state = GridState::new(vec![Column::new("name").searchable()], &config);
///
/// state.go_to_page(3);
/// state.set_search("ann");
/// assert_eq!(state.pagination.current_page, 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GridState {
    pub columns: Vec<Column>,
    pub search: SearchState,
    pub filters: FilterSet,
    pub sort: SortState,
    pub pagination: PaginationState,
}

impl GridState {
    /// Creates the initial state: no search, no filters, ascending by primary key.
    pub fn new(columns: Vec<Column>, config: &GridConfig) -> Self {
        Self {
            columns,
            search: SearchState::default(),
            filters: FilterSet::new(),
            sort: SortState::new(config.primary_key.clone()),
            pagination: PaginationState::new(config.per_page),
        }
    }

    /// Sets the search term; a non-empty term returns to page 1.
    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search.term = term.into();
        if self.search.is_active() {
            self.reset_page();
        }
    }

    /// Sorts by a field; repeating the current field flips the direction.
    pub fn sort_by(&mut self, field: impl Into<String>) {
        let field = field.into();
        if self.sort.field == field {
            self.sort.direction = self.sort.direction.toggled();
        } else {
            self.sort.field = field;
            self.sort.direction = Direction::Asc;
        }
        debug!("Sorting by {} {}", self.sort.field, self.sort.direction);
    }

    /// Orders strings holding numbers numerically.
    pub fn set_numeric_sort(&mut self, enabled: bool) {
        self.sort.numeric_string = enabled;
    }

    /// Changes the page size and returns to page 1.
    pub fn set_per_page(&mut self, per_page: usize, config: &GridConfig) -> Result<(), ConfigError> {
        config.validate_per_page(per_page)?;
        self.pagination.page_size = per_page;
        self.reset_page();
        Ok(())
    }

    /// Moves to a page; page numbers start at 1.
    pub fn go_to_page(&mut self, page: usize) {
        self.pagination.current_page = page.max(1);
    }

    /// Sets a column filter and returns to page 1.
    pub fn set_filter(&mut self, field: impl Into<String>, spec: FilterSpec) {
        self.filters.insert(field, spec);
        self.reset_page();
    }

    /// Removes a column filter and returns to page 1.
    pub fn clear_filter(&mut self, field: &str) {
        if self.filters.remove(field).is_some() {
            self.reset_page();
        }
    }

    /// Removes every column filter and returns to page 1.
    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.reset_page();
    }

    /// Flips the visibility of a column. Returns `false` if no column has that field.
    pub fn toggle_column(&mut self, field: &str) -> bool {
        match self.columns.iter_mut().find(|column| column.field == field) {
            Some(column) => {
                column.hidden = !column.hidden;
                debug!("Column {} hidden: {}", field, column.hidden);
                true
            }
            None => false,
        }
    }

    /// Returns the columns currently shown.
    pub fn visible_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|column| !column.hidden)
    }

    /// Looks up a column by field.
    pub fn column(&self, field: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.field == field)
    }

    fn reset_page(&mut self) {
        self.pagination.current_page = 1;
    }
}
