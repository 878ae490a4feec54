//! Store errors

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Backing store failures
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filter could not be parsed
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// Inserted document carries an `_id` that already exists
    #[error("duplicate id '{id}' in '{collection}'")]
    DuplicateId { collection: String, id: String },

    /// Document is not a JSON object or has a non-string `_id`
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// Store is unreachable or its lock is poisoned
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Persisted data could not be read or written
    #[error("store I/O error: {0}")]
    Io(String),
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidFilter(_) => "FG_STORE_INVALID_FILTER",
            Self::DuplicateId { .. } => "FG_STORE_DUPLICATE_ID",
            Self::InvalidDocument(_) => "FG_STORE_INVALID_DOCUMENT",
            Self::Unavailable(_) => "FG_STORE_UNAVAILABLE",
            Self::Io(_) => "FG_STORE_IO",
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Io(format!("JSON error: {}", e))
    }
}
