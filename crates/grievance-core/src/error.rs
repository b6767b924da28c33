//! Error types for the grievance service.

use thiserror::Error;

/// Result type alias using the grievance service's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for grievance operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Grievance identifier does not match the expected format
    #[error("Invalid grievance id: {0}")]
    InvalidId(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Categorization/generation failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// Object store rejected or failed an upload
    #[error("Storage error: {0}")]
    Storage(String),

    /// Outbound notification could not be delivered
    #[error("Notification error: {0}")]
    Notification(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// A record with the same id already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Insert collided with an existing record.
    pub fn duplicate_id(id: &str) -> Self {
        Error::Conflict(format!("Grievance {} already exists", id))
    }

    /// Message without the variant prefix, suitable for client-facing bodies.
    pub fn detail(&self) -> String {
        match self {
            Error::NotFound(m)
            | Error::InvalidId(m)
            | Error::InvalidInput(m)
            | Error::Inference(m)
            | Error::Storage(m)
            | Error::Notification(m)
            | Error::Serialization(m)
            | Error::Config(m)
            | Error::Request(m)
            | Error::Internal(m)
            | Error::Conflict(m) => m.clone(),
            Error::Database(e) => e.to_string(),
            Error::Io(e) => e.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
