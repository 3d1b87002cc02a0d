//! Store configuration: the working root, buffering and write timing, and
//! watch exclusions, loaded from a JSON file with per-field defaults.

use crate::services::fs::WatchOptions;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SyncConfig {
    /// Working root inside the container. Saves outside it are rejected and
    /// only paths below it are watched.
    #[serde(default = "default_work_dir")]
    pub work_dir: String,

    /// How long change events are buffered before being applied as one batch
    #[serde(default = "default_buffer_window")]
    pub buffer_window_ms: u64,

    /// Upper bound on a single write-through to the provider
    #[serde(default = "default_write_timeout")]
    pub write_timeout_ms: u64,

    /// Number of leading bytes inspected when classifying content as binary
    #[serde(default = "default_binary_sample_len")]
    pub binary_sample_len: usize,

    /// Path segments that are never watched
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
}

fn default_work_dir() -> String {
    "/home/project".to_string()
}

fn default_buffer_window() -> u64 {
    100
}

fn default_write_timeout() -> u64 {
    10_000
}

fn default_binary_sample_len() -> usize {
    100
}

fn default_exclude() -> Vec<String> {
    vec!["node_modules".to_string(), ".git".to_string()]
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            buffer_window_ms: default_buffer_window(),
            write_timeout_ms: default_write_timeout(),
            binary_sample_len: default_binary_sample_len(),
            exclude: default_exclude(),
        }
    }
}

impl SyncConfig {
    /// Config rooted at `work_dir`, defaults otherwise
    pub fn with_work_dir(work_dir: impl Into<String>) -> Self {
        Self {
            work_dir: work_dir.into(),
            ..Self::default()
        }
    }

    pub fn buffer_window(&self) -> Duration {
        Duration::from_millis(self.buffer_window_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    /// Watch filter for the provider subscription
    pub fn watch_options(&self) -> WatchOptions {
        WatchOptions {
            root: self.work_dir.clone(),
            exclude: self.exclude.clone(),
            include_content: true,
        }
    }

    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        let config: SyncConfig =
            serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        self.validate()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path.as_ref(), contents).map_err(|e| ConfigError::IoError(e.to_string()))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.work_dir.starts_with('/') {
            return Err(ConfigError::ValidationError(
                "work_dir must be an absolute path".to_string(),
            ));
        }

        if self.buffer_window_ms == 0 {
            return Err(ConfigError::ValidationError(
                "buffer_window_ms must be greater than 0".to_string(),
            ));
        }

        if self.write_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "write_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.binary_sample_len == 0 {
            return Err(ConfigError::ValidationError(
                "binary_sample_len must be greater than 0".to_string(),
            ));
        }

        if self.exclude.iter().any(|segment| segment.is_empty() || segment.contains('/')) {
            return Err(ConfigError::ValidationError(
                "exclude entries must be single, non-empty path segments".to_string(),
            ));
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Serialize error: {0}")]
    SerializeError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
}
