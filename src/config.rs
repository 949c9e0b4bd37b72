//! Configuration loading for `depscope.toml` files.
//!
//! Every field is optional; missing fields fall back to the public registries
//! and a batch size of 8.

use crate::error::ConfigError;
use crate::registry::{MAVEN_CENTRAL_API_URL, NPM_REGISTRY_URL, NUGET_SERVICE_INDEX_URL};
use crate::update::DEFAULT_BATCH_SIZE;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration filename.
pub const DEFAULT_CONFIG_FILE: &str = "depscope.toml";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Root configuration structure for `depscope.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Concurrent registry lookups per batch
    pub batch_size: usize,
    /// HTTP request timeout in seconds
    pub timeout_secs: u64,
    pub npm_registry_url: String,
    pub nuget_service_index_url: String,
    pub maven_search_url: String,
    /// Extra glob patterns excluded from manifest discovery
    pub exclude: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            npm_registry_url: NPM_REGISTRY_URL.to_string(),
            nuget_service_index_url: NUGET_SERVICE_INDEX_URL.to_string(),
            maven_search_url: MAVEN_CENTRAL_API_URL.to_string(),
            exclude: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// HTTP timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Rejects values the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize {
                value: self.batch_size,
            });
        }
        Ok(())
    }

    /// Parses and validates a config document
    pub fn from_toml(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::InvalidConfigFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a config file from an explicit path
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::InvalidConfigFile {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        Self::from_toml(&content, path)
    }

    /// Loads `depscope.toml` from `root` when present, defaults otherwise
    pub fn discover(root: &Path) -> Result<Self, ConfigError> {
        let candidate: PathBuf = root.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            tracing::debug!("loading config from {}", candidate.display());
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }
}
