//! Engine configuration via `stratastm.toml`
//!
//! All settings are optional; an empty file yields the defaults.

use crate::retry::RetryConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use stratastm_core::{StmError, StmResult};

/// Config file name
pub const CONFIG_FILE_NAME: &str = "stratastm.toml";

/// Largest accepted commit-lock timeout (one hour)
pub const MAX_LOCK_TIMEOUT_MS: u64 = 3_600_000;

/// Engine configuration loaded from `stratastm.toml`.
///
/// # Example
///
/// ```toml
/// # Bound on waiting for each commit lock, in milliseconds
/// lock_timeout_ms = 1000
///
/// [retry]
/// # max_attempts = 64
/// base_delay_us = 50
/// max_delay_us = 10000
/// jitter = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StmConfig {
    /// Bound on waiting for each commit lock, in milliseconds
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
    /// Retry policy for conflicting transactions
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_lock_timeout_ms() -> u64 {
    1_000
}

impl Default for StmConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: default_lock_timeout_ms(),
            retry: RetryConfig::default(),
        }
    }
}

impl StmConfig {
    /// Commit-lock timeout as a `Duration`
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    /// Check the settings for values the engine cannot honor.
    ///
    /// # Errors
    ///
    /// Returns [`StmError::Config`] if the lock timeout is zero or above
    /// [`MAX_LOCK_TIMEOUT_MS`], if `max_attempts` is zero, or if the base
    /// delay exceeds the maximum delay.
    pub fn validate(&self) -> StmResult<()> {
        if self.lock_timeout_ms == 0 || self.lock_timeout_ms > MAX_LOCK_TIMEOUT_MS {
            return Err(StmError::Config(format!(
                "lock_timeout_ms must be between 1 and {}, got {}",
                MAX_LOCK_TIMEOUT_MS, self.lock_timeout_ms
            )));
        }
        if self.retry.max_attempts == Some(0) {
            return Err(StmError::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.retry.base_delay_us > self.retry.max_delay_us {
            return Err(StmError::Config(format!(
                "retry.base_delay_us ({}) exceeds retry.max_delay_us ({})",
                self.retry.base_delay_us, self.retry.max_delay_us
            )));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# STM engine configuration
#
# Bound on waiting for each commit lock, in milliseconds.
# A commit that cannot lock a cell in time is retried as a conflict.
lock_timeout_ms = 1000

[retry]
# Maximum attempts per execute() call. Omit to retry until commit.
# max_attempts = 64

# Exponential backoff between attempts, in microseconds.
base_delay_us = 50
max_delay_us = 10000

# Randomize each delay in [0, delay] to spread out contending threads.
jitter = true
"#
    }

    /// Parse and validate config from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string cannot be parsed or fails validation.
    pub fn from_toml_str(content: &str) -> StmResult<Self> {
        let config: StmConfig = toml::from_str(content)
            .map_err(|e| StmError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> StmResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            StmError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content).map_err(|e| {
            StmError::Config(format!("Invalid config file '{}': {}", path.display(), e))
        })
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> StmResult<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                StmError::Config(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> StmResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| StmError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            StmError::Config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
