//! Engine configuration
//!
//! JSON with every field optional:
//!
//! ```json
//! {
//!   "poll_interval_ms": 5000,
//!   "dispatch": { "mode": "partitioned", "partitions": 10, "ring_capacity": 4096 },
//!   "match_description": "continuous match"
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use matchbook_core::DEFAULT_MATCH_DESCRIPTION;
use matchbook_dispatch::{DispatchConfig, DispatchMode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Root configuration for the matching engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Sleep between poll cycles
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Text stored on every match record
    #[serde(default = "default_match_description")]
    pub match_description: String,
}

fn default_poll_interval_ms() -> u64 {
    5000
}

fn default_match_description() -> String {
    DEFAULT_MATCH_DESCRIPTION.to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            dispatch: DispatchConfig::default(),
            match_description: default_match_description(),
        }
    }
}

impl EngineConfig {
    /// Load and validate configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::from_json(&content)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn with_dispatch(mut self, dispatch: DispatchConfig) -> Self {
        self.dispatch = dispatch;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "poll_interval_ms must be positive".to_string(),
            ));
        }

        let dispatch = &self.dispatch;
        match dispatch.mode {
            DispatchMode::Locking if dispatch.worker_pool_size == 0 => {
                return Err(ConfigError::Invalid(
                    "worker_pool_size must be positive".to_string(),
                ));
            }
            DispatchMode::Partitioned if dispatch.partitions == 0 => {
                return Err(ConfigError::Invalid(
                    "partitions must be positive".to_string(),
                ));
            }
            DispatchMode::Partitioned if dispatch.ring_capacity < dispatch.partitions => {
                return Err(ConfigError::Invalid(format!(
                    "ring_capacity {} is smaller than partitions {}",
                    dispatch.ring_capacity, dispatch.partitions
                )));
            }
            _ => {}
        }

        if dispatch.publish_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "publish_timeout_ms must be positive when set".to_string(),
            ));
        }

        Ok(())
    }
}
