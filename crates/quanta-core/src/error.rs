//! Core error types for quanta-core.
//!
//! This module defines the error hierarchy using thiserror. Spending a grace
//! day with an empty balance is not an error; it is reported through
//! [`InsuranceOutcome`](crate::tracker::InsuranceOutcome).

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for quanta-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Narrative service errors
    #[error("Narrative error: {0}")]
    Narrative(#[from] NarrativeError),

    /// A habit or check-in referenced by id does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    pub fn habit_not_found(id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: "habit",
            id: id.into(),
        }
    }

    pub fn checkin_not_found(id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: "check-in",
            id: id.into(),
        }
    }

    /// Whether this error is a rejected duplicate check-in.
    pub fn is_conflict(&self) -> bool {
        matches!(self, CoreError::Database(DatabaseError::Conflict(_)))
    }
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Unique constraint violation, e.g. a second check-in for the same day
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
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

    /// Unknown configuration key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Validation errors raised at the boundary, before the streak engine.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Difficulty outside 1..=3
    #[error("Difficulty must be between 1 and 3, got {0}")]
    InvalidDifficulty(i64),

    /// Empty or whitespace-only text field
    #[error("Field '{0}' must not be empty")]
    EmptyField(&'static str),

    /// Text exceeds the column limit
    #[error("Field '{field}' exceeds {max} characters")]
    TooLong { field: &'static str, max: usize },

    /// Unparseable calendar date
    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Errors from the progress narrative service.
#[derive(Error, Debug)]
pub enum NarrativeError {
    /// Narrative generation is disabled or no endpoint is configured
    #[error("Narrative service unavailable")]
    Unavailable,

    /// Transport failure
    #[error("Narrative request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("Narrative service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Endpoint is not a valid URL
    #[error("Invalid narrative endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    /// Request exceeded the configured timeout
    #[error("Narrative request timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The runtime driving the request could not be started
    #[error("Failed to start narrative runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

// Helper implementations for converting from other error types

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, msg) => match code.code {
                rusqlite::ErrorCode::DatabaseLocked | rusqlite::ErrorCode::DatabaseBusy => {
                    DatabaseError::Locked
                }
                rusqlite::ErrorCode::ConstraintViolation => DatabaseError::Conflict(
                    msg.clone().unwrap_or_else(|| code.to_string()),
                ),
                _ => DatabaseError::QueryFailed(err.to_string()),
            },
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(DatabaseError::from(err))
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
