//! Error types for the market table

use thiserror::Error;

/// Errors that can occur when fetching market rows from a provider
///
/// Every variant collapses into the same `is_error` state on the table;
/// the distinction only shows up in logs and events.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network request failed
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// Provider answered with a non-success status
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Response body could not be decoded into market rows
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Errors raised while reading or writing persisted view state
///
/// None of these reach the caller of `ViewStateStore`: invalid fields fall
/// back to their defaults and write failures are logged.
#[derive(Debug, Error)]
pub enum StateError {
    /// A persisted field holds a value outside its domain
    #[error("Invalid persisted value for {field}: {value:?}")]
    InvalidField { field: &'static str, value: String },

    /// Storage backend could not be read or written
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Storage contents could not be (de)serialized
    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Storage backend is in an unusable state
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl StateError {
    /// Creates an InvalidField error
    pub fn invalid_field(field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            value: value.into(),
        }
    }
}

/// Errors returned by the table facade and controller handle
#[derive(Debug, Error)]
pub enum TableError {
    /// The controller task has stopped and accepts no more commands
    #[error("Table controller is not running")]
    ControllerClosed,

    /// Building the provider failed
    #[error("Provider setup failed: {0}")]
    Provider(#[from] ProviderError),

    /// A row index outside the currently displayed rows
    #[error("Row {index} is out of range ({len} rows displayed)")]
    RowOutOfRange { index: usize, len: usize },
}
