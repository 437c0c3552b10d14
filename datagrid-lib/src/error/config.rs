//! Grid configuration error types

/// Errors caused by grid configuration the collaborator has to fix.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Neither a mounted datasource nor a datasource hook produced a value.
    #[error("No datasource configured")]
    MissingDatasource,

    /// The requested page size is not one of the allowed values.
    #[error("Page size {value} is not allowed (allowed: {allowed:?})")]
    InvalidPerPage { value: usize, allowed: Vec<usize> },

    /// A filter kind the engine does not understand, under the `Reject` policy.
    #[error("Unknown filter kind '{kind}' on field '{field}'")]
    UnknownFilterKind { field: String, kind: String },

    /// A column referenced by the grid state does not exist.
    #[error("Unknown column '{0}'")]
    UnknownColumn(String),
}
