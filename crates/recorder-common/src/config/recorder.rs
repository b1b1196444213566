//! Engine configuration structures.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_NEW_GEN_SIZE, DEFAULT_PROMOTE_THRESHOLD};
use crate::error::{RecorderError, RecorderResult};

/// Main engine configuration.
///
/// # Example
///
/// ```rust
/// use recorder_common::config::RecorderConfig;
///
/// let config = RecorderConfig::default();
/// assert_eq!(config.query_cache.new_gen_size, 30);
/// assert_eq!(config.query_cache.promote_threshold, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Per-worker query cache configuration.
    pub query_cache: QueryCacheConfig,

    /// Log rendered SQL at debug level whenever a plan is compiled.
    /// Default: false
    pub log_sql: bool,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            query_cache: QueryCacheConfig::default(),
            log_sql: false,
        }
    }
}

impl RecorderConfig {
    /// Creates a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from TOML text and validates it.
    pub fn from_toml_str(content: &str) -> RecorderResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration from a TOML file.
    pub fn from_file(path: &Path) -> RecorderResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> RecorderResult<()> {
        self.query_cache.validate()
    }
}

/// Configuration of the two-generation query cache owned by each worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryCacheConfig {
    /// Maximum number of entries in the new generation.
    /// Default: 30
    pub new_gen_size: usize,

    /// Lookups needed to promote a new-generation entry.
    /// Default: 10
    pub promote_threshold: u32,
}

impl Default for QueryCacheConfig {
    fn default() -> Self {
        Self {
            new_gen_size: DEFAULT_NEW_GEN_SIZE,
            promote_threshold: DEFAULT_PROMOTE_THRESHOLD,
        }
    }
}

impl QueryCacheConfig {
    /// Creates a configuration with the given sizes.
    #[must_use]
    pub fn new(new_gen_size: usize, promote_threshold: u32) -> Self {
        Self {
            new_gen_size,
            promote_threshold,
        }
    }

    /// Validates the cache sizes.
    pub fn validate(&self) -> RecorderResult<()> {
        if self.new_gen_size == 0 {
            return Err(RecorderError::invalid_config(
                "query_cache.new_gen_size must be at least 1",
            ));
        }
        if self.promote_threshold == 0 {
            return Err(RecorderError::invalid_config(
                "query_cache.promote_threshold must be at least 1",
            ));
        }
        Ok(())
    }
}
