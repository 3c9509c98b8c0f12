//! Transaction engine for the STM
//!
//! This crate sits on top of the concurrency layer and provides:
//! - TransactionExecutor: run-commit-retry loop for user actions
//! - RetryConfig: attempt limit and jittered exponential backoff
//! - StmConfig: `stratastm.toml` loading and validation
//! - TransactionCoordinator: attempt lifecycle and metrics

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod coordinator;
pub mod executor;
pub mod retry;

pub use config::{StmConfig, CONFIG_FILE_NAME, MAX_LOCK_TIMEOUT_MS};
pub use coordinator::{TransactionCoordinator, TransactionMetrics};
pub use executor::TransactionExecutor;
pub use retry::RetryConfig;
