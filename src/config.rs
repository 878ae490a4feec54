//! Engine configuration
//!
//! Loaded from a JSON file. Every field has a default, so `{}` is a valid
//! configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {message}")]
    Read { path: PathBuf, message: String },

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Read { .. } => "FG_CONFIG_READ",
            Self::Parse(_) => "FG_CONFIG_PARSE",
            Self::Invalid(_) => "FG_CONFIG_INVALID",
        }
    }
}

/// Engine and CLI settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Page size used when a read names none
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,

    /// Upper bound applied to requested page sizes
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,

    /// Lifetime of a cached universe snapshot
    #[serde(default = "default_universe_ttl_secs")]
    pub universe_ttl_secs: u64,

    /// Shown to unprivileged requesters in place of refusal detail
    #[serde(default = "default_generic_denial_message")]
    pub generic_denial_message: String,

    /// `tracing` filter directive; `FIELDGUARD_LOG` overrides it
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// JSON file backing the in-memory store (CLI)
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// JSON file holding the universe state (CLI)
    #[serde(default = "default_universe_path")]
    pub universe_path: PathBuf,
}

fn default_page_size() -> usize {
    50
}
fn default_max_page_size() -> usize {
    500
}
fn default_universe_ttl_secs() -> u64 {
    30
}
fn default_generic_denial_message() -> String {
    "Not allowed".to_string()
}
fn default_log_filter() -> String {
    "info".to_string()
}
fn default_store_path() -> PathBuf {
    PathBuf::from("./fieldguard-store.json")
}
fn default_universe_path() -> PathBuf {
    PathBuf::from("./fieldguard-universe.json")
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            universe_ttl_secs: default_universe_ttl_secs(),
            generic_denial_message: default_generic_denial_message(),
            log_filter: default_log_filter(),
            store_path: default_store_path(),
            universe_path: default_universe_path(),
        }
    }
}

impl EngineConfig {
    /// Load and validate a configuration file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let config: EngineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`Self::load`], but a missing file yields the defaults
    pub fn load_or_default(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.default_page_size == 0 {
            return Err(ConfigError::Invalid("default_page_size must be > 0".into()));
        }
        if self.max_page_size < self.default_page_size {
            return Err(ConfigError::Invalid(format!(
                "max_page_size ({}) must be >= default_page_size ({})",
                self.max_page_size, self.default_page_size
            )));
        }
        if self.generic_denial_message.trim().is_empty() {
            return Err(ConfigError::Invalid("generic_denial_message must not be empty".into()));
        }
        Ok(())
    }

    /// Effective page size for a requested size
    pub fn page_size(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_page_size)
            .min(self.max_page_size)
    }

    pub fn universe_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::try_from(self.universe_ttl_secs).unwrap_or(i64::MAX))
    }
}
