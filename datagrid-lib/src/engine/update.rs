//! Inline update outcomes

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

use super::GridOutput;
use crate::model::Value;
use crate::response::Response;

/// An inline edit of one cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowUpdate {
    /// Primary key of the edited row.
    pub id: Value,
    /// Edited column field.
    pub field: String,
    /// New value.
    pub value: Value,
}

impl RowUpdate {
    /// Creates an update.
    pub fn new(id: impl Into<Value>, field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            id: id.into(),
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Persists inline edits. Returns whether the edit was applied.
///
/// Closures taking a [`RowUpdate`] implement this trait.
#[async_trait]
pub trait RowUpdater: Send + Sync {
    async fn update(&self, update: &RowUpdate) -> bool;
}

#[async_trait]
impl<F> RowUpdater for F
where
    F: Fn(&RowUpdate) -> bool + Send + Sync,
{
    async fn update(&self, update: &RowUpdate) -> bool {
        self(update)
    }
}

/// Message category of an update outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateStatus {
    Success,
    Error,
}

impl From<bool> for UpdateStatus {
    fn from(applied: bool) -> Self {
        if applied {
            UpdateStatus::Success
        } else {
            UpdateStatus::Error
        }
    }
}

/// User-facing messages for update outcomes, with optional per-field overrides.
///
/// # Example
///
/// ```
/// use datagrid_lib::engine::{UpdateMessages, UpdateStatus};
///
/// let messages = UpdateMessages::default()
///     .with_field(UpdateStatus::Error, "email", "That email is already taken.");
///
/// assert_eq!(messages.message(UpdateStatus::Error, "email"), "That email is already taken.");
/// assert_eq!(messages.message(UpdateStatus::Error, "name"), "Error updating the data.");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateMessages {
    success: String,
    error: String,
    overrides: HashMap<(UpdateStatus, String), String>,
}

impl Default for UpdateMessages {
    fn default() -> Self {
        Self {
            success: "Data has been updated successfully!".to_string(),
            error: "Error updating the data.".to_string(),
            overrides: HashMap::new(),
        }
    }
}

impl UpdateMessages {
    /// Sets the default success message.
    pub fn with_success(mut self, message: impl Into<String>) -> Self {
        self.success = message.into();
        self
    }

    /// Sets the default error message.
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error = message.into();
        self
    }

    /// Overrides the message for one field and status.
    pub fn with_field(mut self, status: UpdateStatus, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.overrides.insert((status, field.into()), message.into());
        self
    }

    /// Resolves the message for a field, falling back to the status default.
    pub fn message(&self, status: UpdateStatus, field: &str) -> &str {
        if let Some(message) = self.overrides.get(&(status, field.to_string())) {
            return message;
        }
        match status {
            UpdateStatus::Success => &self.success,
            UpdateStatus::Error => &self.error,
        }
    }
}

/// Result of an inline update.
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub status: UpdateStatus,
    /// Message to show the user.
    pub message: String,
    /// Fresh pipeline output, when the refresh policy asked for one.
    pub refreshed: Option<Response<GridOutput>>,
}

impl UpdateOutcome {
    /// Returns `true` if the edit was applied.
    pub fn is_success(&self) -> bool {
        self.status == UpdateStatus::Success
    }
}
