//! Settings error types.

use thiserror::Error;

/// Errors from a settings store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing file could not be read or written.
    #[error("settings store io error: {0}")]
    Io(#[from] std::io::Error),
    /// Stored data is not valid JSON or not an object.
    #[error("settings store holds invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The backend refused the operation.
    #[error("settings store unavailable: {0}")]
    Unavailable(String),
}

/// Errors that can occur when loading the runtime configuration file.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Failed to read the config file from disk.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// Failed to parse JSON in the config file.
    #[error("failed to parse config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
