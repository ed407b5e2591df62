//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Tunables for an [`Engine`](crate::engine::Engine).
///
/// Every field has a default, so a TOML file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Reject calls to unregistered functions at compile time
    pub strict_functions: bool,

    /// Bound on parse nesting and on nested function evaluation
    pub max_depth: usize,

    /// Longest regular expression pattern accepted, in bytes
    pub max_pattern_length: usize,

    /// Size limit for a compiled regular expression, in bytes
    pub regex_size_limit: usize,

    /// Max entries per shared cache; 0 disables caching
    pub cache_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strict_functions: true,
            max_depth: 64,
            max_pattern_length: 4096,
            regex_size_limit: 1 << 20,
            cache_capacity: 1024,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load a configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }
}
