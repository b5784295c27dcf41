//! Storage and data model errors
//!
//! Backend errors are carried through the facade untouched so callers can
//! still tell an HTTP 404 from a broken SQLite file.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    /// The remote backend answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("local store error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not found: {0}")]
    NotFound(String),

    /// The configured API base URL is not an absolute http(s) URL
    #[error("invalid API base URL: {0}")]
    InvalidUrl(String),

    /// The upload task stopped before producing its result
    #[error("upload ended without a result")]
    UploadIncomplete,
}

impl StorageError {
    /// HTTP status of a backend rejection, if that is what this error is
    pub fn status(&self) -> Option<u16> {
        match self {
            StorageError::Http { status, .. } => Some(*status),
            StorageError::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("action message has no action_call")]
    MissingActionCall,

    #[error("action_call references undeclared action '{0}'")]
    UndeclaredAction(String),
}
