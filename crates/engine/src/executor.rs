//! Retrying transaction executor
//!
//! [`TransactionExecutor::execute`] runs an action inside a fresh
//! [`Transaction`] and commits it. Retryable failures (conflicts, aborts)
//! discard the attempt and run the action again in a new transaction.
//! Any other error aborts the attempt and reaches the caller unchanged.

use crate::config::StmConfig;
use crate::coordinator::{TransactionCoordinator, TransactionMetrics};
use crate::retry::RetryConfig;
use std::thread;
use stratastm_concurrency::Transaction;
use stratastm_core::{StmError, StmResult};
use tracing::warn;

/// Runs actions transactionally, retrying on conflict
///
/// Executors are cheap and share no state with each other beyond the
/// process-wide version clock; every executor sees every cell.
///
/// # Example
///
/// ```
/// use stratastm_concurrency::TCell;
/// use stratastm_engine::TransactionExecutor;
///
/// let executor = TransactionExecutor::new();
/// let from = TCell::new(100i64);
/// let to = TCell::new(0i64);
///
/// executor
///     .execute(|txn| {
///         let a = from.get(txn)?;
///         from.set(txn, a - 10)?;
///         to.modify(txn, |b| b + 10)
///     })
///     .unwrap();
///
/// assert_eq!(from.load(), 90);
/// assert_eq!(to.load(), 10);
/// ```
#[derive(Debug)]
pub struct TransactionExecutor {
    config: StmConfig,
    coordinator: TransactionCoordinator,
}

impl Default for TransactionExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionExecutor {
    /// Executor with the default configuration
    pub fn new() -> Self {
        Self::with_config(StmConfig::default())
    }

    /// Executor with the given configuration, taken as-is
    pub fn with_config(config: StmConfig) -> Self {
        let coordinator = TransactionCoordinator::new(config.lock_timeout());
        Self {
            config,
            coordinator,
        }
    }

    /// Executor with the default lock timeout and the given retry policy
    pub fn with_retry(retry: RetryConfig) -> Self {
        Self::with_config(StmConfig {
            retry,
            ..StmConfig::default()
        })
    }

    /// Executor from a loaded configuration
    ///
    /// # Errors
    /// Returns [`StmError::Config`] if the configuration does not validate.
    pub fn from_config(config: &StmConfig) -> StmResult<Self> {
        config.validate()?;
        Ok(Self::with_config(config.clone()))
    }

    /// Active configuration
    pub fn config(&self) -> &StmConfig {
        &self.config
    }

    /// Counters for attempts run by this executor
    pub fn metrics(&self) -> TransactionMetrics {
        self.coordinator.metrics()
    }

    /// Run `action` transactionally and commit its effects
    ///
    /// The action may run several times; each run gets a new transaction
    /// and only the run that commits has any visible effect. Side effects
    /// outside the transaction are not rolled back.
    ///
    /// # Errors
    /// - [`StmError::RetriesExhausted`] if the retry policy's attempt limit
    ///   is reached; `last` holds the final attempt's error
    /// - any non-retryable error returned by `action`, unchanged
    pub fn execute<T, F>(&self, mut action: F) -> StmResult<T>
    where
        F: FnMut(&mut Transaction) -> StmResult<T>,
    {
        let retry = &self.config.retry;
        let mut attempt = 0usize;

        loop {
            attempt += 1;
            let mut txn = self.coordinator.start_transaction();

            let outcome = action(&mut txn).and_then(|value| txn.commit().map(|_| value));

            match outcome {
                Ok(value) => {
                    self.coordinator.record_commit(&txn, attempt);
                    return Ok(value);
                }
                Err(e) if e.is_retryable() => {
                    txn.rollback();
                    self.coordinator.record_conflict(&txn, attempt, &e);

                    if retry.is_exhausted(attempt) {
                        self.coordinator.record_exhausted();
                        warn!(
                            target: "stratastm::txn",
                            attempts = attempt,
                            error = %e,
                            "Transaction gave up after exhausting retries"
                        );
                        return Err(StmError::RetriesExhausted {
                            attempts: attempt,
                            last: Box::new(e),
                        });
                    }

                    let delay = retry.delay_for(attempt - 1);
                    if delay.is_zero() {
                        thread::yield_now();
                    } else {
                        thread::sleep(delay);
                    }
                }
                Err(e) => {
                    if txn.is_active() {
                        // An active transaction always aborts cleanly
                        let _ = txn.abort();
                    }
                    self.coordinator.record_caller_error(&txn, &e);
                    return Err(e);
                }
            }
        }
    }
}
