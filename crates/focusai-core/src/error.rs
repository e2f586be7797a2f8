//! Core error types for focusai-core.
//!
//! This module defines the error hierarchy using thiserror. Each concern
//! (task store, configuration, validation, alert actions) has its own enum;
//! [`CoreError`] wraps them for callers that don't care which layer failed.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for focusai-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Task store errors
    #[error("Task store error: {0}")]
    Store(#[from] TaskStoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Alert action errors
    #[error("Alert error: {0}")]
    Alert(#[from] AlertError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by a [`TaskStore`](crate::store::TaskStore) implementation.
#[derive(Error, Debug)]
pub enum TaskStoreError {
    /// Transport-level failure (connection refused, timeout, TLS, ...)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("{message} (HTTP {status})")]
    Api { status: u16, message: String },

    /// The response body could not be decoded.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// No task with this id exists.
    #[error("Task not found: {0}")]
    NotFound(String),

    /// The store is unreachable or refused the operation.
    #[error("Task store unavailable: {0}")]
    Unavailable(String),

    /// The request was rejected before it was sent.
    #[error("Invalid request: {0}")]
    Invalid(#[from] ValidationError),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Dot-path key does not name a config field
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// No usable configuration directory
    #[error("Could not create configuration directory {path}: {message}")]
    NoDataDir { path: PathBuf, message: String },
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Task titles must contain at least one non-whitespace character.
    #[error("Title is required")]
    EmptyTitle,

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Errors from user actions on a presented alert.
#[derive(Error, Debug)]
pub enum AlertError {
    /// Complete/Dismiss/Snooze was requested with nothing on screen.
    #[error("No alert is currently shown")]
    NoActiveAlert,

    /// Snooze duration is zero or not one of the configured options.
    #[error("Invalid snooze duration: {minutes} minutes")]
    InvalidSnooze { minutes: u32 },

    /// The task store call behind the action failed.
    #[error("Failed to update task: {0}")]
    Store(#[from] TaskStoreError),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_shows_message_and_status() {
        let err = TaskStoreError::Api {
            status: 500,
            message: "Failed to fetch todos".into(),
        };
        assert_eq!(err.to_string(), "Failed to fetch todos (HTTP 500)");
    }

    #[test]
    fn store_error_converts_into_core_error() {
        let err: CoreError = TaskStoreError::NotFound("t1".into()).into();
        assert!(matches!(err, CoreError::Store(TaskStoreError::NotFound(_))));
    }

    #[test]
    fn validation_error_converts_into_store_error() {
        let err: TaskStoreError = ValidationError::EmptyTitle.into();
        assert_eq!(err.to_string(), "Invalid request: Title is required");
    }
}
