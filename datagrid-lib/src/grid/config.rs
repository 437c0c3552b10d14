//! Grid configuration

use crate::error::ConfigError;

/// What to do with a filter whose kind is not recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownFilterPolicy {
    /// Skip the filter and log a warning.
    #[default]
    Ignore,
    /// Fail the pipeline run with [`ConfigError::UnknownFilterKind`].
    Reject,
}

/// When to re-run the pipeline after an inline update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshPolicy {
    /// Refresh after every update attempt.
    #[default]
    Always,
    /// Refresh only when the datasource is an in-memory collection.
    InMemoryOnly,
    /// Never refresh; the collaborator re-runs the pipeline itself.
    Never,
}

/// Configuration shared by every run of a grid.
///
/// # Example
///
/// ```
/// use datagrid_lib::grid::{GridConfig, UnknownFilterPolicy};
///
/// let config = GridConfig::default()
///     .with_primary_key("order_id")
///     .with_per_page(25)
///     .with_unknown_filter_policy(UnknownFilterPolicy::Reject);
///
/// assert_eq!(config.per_page, 25);
/// ```
#[derive(Debug, Clone)]
pub struct GridConfig {
    /// Field plucked into the matched-identifier set.
    ///
    /// Default: `"id"`
    pub primary_key: String,

    /// Initial page size.
    ///
    /// Default: 10
    pub per_page: usize,

    /// Page sizes the collaborator may switch to; `0` means "all".
    ///
    /// Default: `[10, 25, 50, 100, 0]`
    pub per_page_values: Vec<usize>,

    /// Separator between a relation and its field.
    ///
    /// Default: `'.'`
    pub relation_separator: char,

    /// Whether materialized in-memory collections are cached per grid identity.
    ///
    /// Default: `true`
    pub cache_enabled: bool,

    /// Handling of unrecognized filter kinds.
    ///
    /// Default: [`UnknownFilterPolicy::Ignore`]
    pub unknown_filter_policy: UnknownFilterPolicy,

    /// Refresh behaviour after inline updates.
    ///
    /// Default: [`RefreshPolicy::Always`]
    pub refresh_policy: RefreshPolicy,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            primary_key: "id".to_string(),
            per_page: 10,
            per_page_values: vec![10, 25, 50, 100, 0],
            relation_separator: '.',
            cache_enabled: true,
            unknown_filter_policy: UnknownFilterPolicy::Ignore,
            refresh_policy: RefreshPolicy::Always,
        }
    }
}

impl GridConfig {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the primary key field.
    pub fn with_primary_key(mut self, field: impl Into<String>) -> Self {
        self.primary_key = field.into();
        self
    }

    /// Sets the initial page size.
    ///
    /// A size outside `per_page_values` is ignored, keeping the previous size.
    pub fn with_per_page(mut self, per_page: usize) -> Self {
        if self.per_page_values.contains(&per_page) {
            self.per_page = per_page;
        }
        self
    }

    /// Sets the allowed page sizes.
    pub fn with_per_page_values(mut self, values: impl Into<Vec<usize>>) -> Self {
        self.per_page_values = values.into();
        self
    }

    /// Sets the relation separator.
    pub fn with_relation_separator(mut self, separator: char) -> Self {
        self.relation_separator = separator;
        self
    }

    /// Enables or disables result caching.
    pub fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    /// Sets the unknown filter kind policy.
    pub fn with_unknown_filter_policy(mut self, policy: UnknownFilterPolicy) -> Self {
        self.unknown_filter_policy = policy;
        self
    }

    /// Sets the post-update refresh policy.
    pub fn with_refresh_policy(mut self, policy: RefreshPolicy) -> Self {
        self.refresh_policy = policy;
        self
    }

    /// Checks a page size against the allowed values.
    pub fn validate_per_page(&self, per_page: usize) -> Result<(), ConfigError> {
        if self.per_page_values.contains(&per_page) {
            Ok(())
        } else {
            Err(ConfigError::InvalidPerPage {
                value: per_page,
                allowed: self.per_page_values.clone(),
            })
        }
    }
}
