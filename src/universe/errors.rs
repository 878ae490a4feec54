//! Universe state errors

use thiserror::Error;

/// Result type for universe state operations
pub type UniverseResult<T> = Result<T, UniverseError>;

/// Failures loading the universe snapshot
#[derive(Debug, Error)]
pub enum UniverseError {
    /// Snapshot source could not be read
    #[error("universe source unavailable: {0}")]
    Unavailable(String),

    /// Snapshot source held malformed data
    #[error("malformed universe state: {0}")]
    Malformed(String),
}

impl UniverseError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "FG_UNIVERSE_UNAVAILABLE",
            Self::Malformed(_) => "FG_UNIVERSE_MALFORMED",
        }
    }
}

impl From<std::io::Error> for UniverseError {
    fn from(e: std::io::Error) -> Self {
        Self::Unavailable(e.to_string())
    }
}

impl From<serde_json::Error> for UniverseError {
    fn from(e: serde_json::Error) -> Self {
        Self::Malformed(e.to_string())
    }
}
