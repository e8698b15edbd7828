//! Error types for notebase.

use thiserror::Error;

/// Result type alias using notebase's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for notebase operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found.
    ///
    /// Also returned when a note exists but the caller has no access to it,
    /// so that requesters cannot probe for the existence of foreign notes.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Principal lacks the required permission on a note it can see
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Optimistic lock failure: the note was modified by another writer.
    ///
    /// Carries the current authoritative version so the caller can
    /// re-fetch, re-apply, and re-submit.
    #[error("Concurrent modification detected. Current version: {current_version}")]
    ConcurrentModification { current_version: i32 },

    /// Malformed input (content too long, invalid category, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Duplicate state transition (e.g. re-sharing with identical permission)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Construct the uniform "note not found" error used by every access
    /// gate. Missing and forbidden notes must be indistinguishable.
    pub fn note_not_found() -> Self {
        Error::NotFound("Note not found".to_string())
    }

    /// True if this error should be retried by the caller after a re-fetch.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::ConcurrentModification { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
