//! CLI error types

use thiserror::Error;

use crate::config::ConfigError;
use crate::schema::SchemaError;
use crate::store::StoreError;

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

/// CLI errors; every one ends the process with a non-zero status
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The engine refused or failed; the response was already written
    #[error("request failed: {0}")]
    RequestFailed(&'static str),
}

impl CliError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.code(),
            Self::InvalidArgument(_) => "FG_CLI_INVALID_ARGUMENT",
            Self::Io(_) => "FG_CLI_IO",
            Self::Store(e) => e.code(),
            Self::Schema(e) => e.code(),
            Self::RequestFailed(code) => code,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidArgument(format!("JSON error: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(CliError::invalid_argument("x").code(), "FG_CLI_INVALID_ARGUMENT");
        assert_eq!(CliError::RequestFailed("FG_WRITE_DENIED").code(), "FG_WRITE_DENIED");
        assert_eq!(
            CliError::from(ConfigError::Invalid("bad".into())).code(),
            "FG_CONFIG_INVALID"
        );
    }

    #[test]
    fn test_json_error_is_invalid_argument() {
        let err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        assert!(matches!(CliError::from(err), CliError::InvalidArgument(_)));
    }
}
