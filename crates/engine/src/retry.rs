//! Retry policy for conflicting transactions
//!
//! Contains RetryConfig: how many attempts the executor makes and how long
//! it backs off between them.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for transaction retry behavior
///
/// Retrying is always correct (a failed attempt never applied anything),
/// but without backoff heavily contended cells can starve. The default
/// retries forever with jittered exponential backoff.
///
/// # Example
/// ```
/// use stratastm_engine::RetryConfig;
///
/// let config = RetryConfig::default()
///     .with_max_attempts(10)
///     .with_base_delay_us(100)
///     .with_max_delay_us(5_000);
/// assert_eq!(config.max_attempts, Some(10));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts (`None` = retry until commit)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<usize>,
    /// Base delay between retries in microseconds (exponential backoff)
    #[serde(default = "default_base_delay_us")]
    pub base_delay_us: u64,
    /// Maximum delay between retries in microseconds
    #[serde(default = "default_max_delay_us")]
    pub max_delay_us: u64,
    /// Randomize each delay uniformly in `[0, delay]`
    #[serde(default = "default_jitter")]
    pub jitter: bool,
}

fn default_base_delay_us() -> u64 {
    50
}

fn default_max_delay_us() -> u64 {
    10_000
}

fn default_jitter() -> bool {
    true
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: None,
            base_delay_us: default_base_delay_us(),
            max_delay_us: default_max_delay_us(),
            jitter: default_jitter(),
        }
    }
}

impl RetryConfig {
    /// Create a new RetryConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Retry forever without sleeping (the thread yields between attempts)
    pub fn no_backoff() -> Self {
        Self {
            max_attempts: None,
            base_delay_us: 0,
            max_delay_us: 0,
            jitter: false,
        }
    }

    /// Run a single attempt and never retry
    pub fn no_retry() -> Self {
        Self {
            max_attempts: Some(1),
            ..Default::default()
        }
    }

    /// Set maximum number of attempts
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Remove the attempt limit
    pub fn unbounded(mut self) -> Self {
        self.max_attempts = None;
        self
    }

    /// Set base delay for exponential backoff
    pub fn with_base_delay_us(mut self, base_delay_us: u64) -> Self {
        self.base_delay_us = base_delay_us;
        self
    }

    /// Set maximum delay between retries
    pub fn with_max_delay_us(mut self, max_delay_us: u64) -> Self {
        self.max_delay_us = max_delay_us;
        self
    }

    /// Enable or disable jitter
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Check whether `attempts` completed attempts exhaust the budget
    pub fn is_exhausted(&self, attempts: usize) -> bool {
        matches!(self.max_attempts, Some(max) if attempts >= max)
    }

    /// Upper bound of the delay after the given failed attempt (0-based)
    pub fn calculate_delay(&self, attempt: usize) -> Duration {
        // Cap the shift to prevent overflow (1 << 63 is the max for u64)
        let shift = attempt.min(63) as u32;
        let multiplier = 1u64 << shift;
        let delay_us = self.base_delay_us.saturating_mul(multiplier);
        Duration::from_micros(delay_us.min(self.max_delay_us))
    }

    /// Delay to actually sleep after the given failed attempt, jittered if enabled
    pub fn delay_for(&self, attempt: usize) -> Duration {
        let ceiling = self.calculate_delay(attempt);
        if !self.jitter || ceiling.is_zero() {
            return ceiling;
        }
        let us = ceiling.as_micros() as u64;
        Duration::from_micros(rand::thread_rng().gen_range(0..=us))
    }
}
