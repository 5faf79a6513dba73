//! Error types for gphotos-sync.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while syncing media.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Rejected user input or remote data that would break the folder layout.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid date '{0}'. Expected YYYY/MM/DD")]
    InvalidDate(String),

    #[error("Empty date range: {to} is before {from}")]
    EmptyRange { from: String, to: String },

    #[error("Target folder \"{}\" does NOT exist", .0.display())]
    DestinationMissing(PathBuf),

    #[error("Refusing to write remote filename '{0}': not a plain file name")]
    UnsafeFilename(String),
}

impl SyncError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            SyncError::Config(_) => 10,
            SyncError::Auth(_) => 3,
            SyncError::Network(_) => 4,
            SyncError::Validation(ValidationError::EmptyRange { .. }) => 5,
            SyncError::Validation(ValidationError::InvalidDate(_)) => 2,
            SyncError::Validation(_) => 1,
            SyncError::Io(_) => 1,
        }
    }
}

/// Result type alias for gphotos operations.
pub type SyncResult<T> = Result<T, SyncError>;
