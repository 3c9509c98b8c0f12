//! StrataSTM - in-process software transactional memory
//!
//! Shared state lives in [`TCell`]s. Code reads and writes cells through a
//! [`Transaction`], and a [`TransactionExecutor`] commits the transaction
//! atomically, re-running the code whenever another thread got there first.
//!
//! # Quick Start
//!
//! ```
//! use stratastm::{atomically, TCell};
//!
//! let a = TCell::new(100i64);
//! let b = TCell::new(200i64);
//!
//! atomically(|txn| {
//!     let amount = 10;
//!     a.modify(txn, |v| v - amount)?;
//!     b.modify(txn, |v| v + amount)
//! })
//! .unwrap();
//!
//! assert_eq!(a.load() + b.load(), 300);
//! ```
//!
//! # Architecture
//!
//! - `stratastm-core`: ids, versions and the error taxonomy
//! - `stratastm-concurrency`: version clock, commit locks, cells, transactions
//! - `stratastm-engine`: retry policy, configuration and the executor

use once_cell::sync::Lazy;

pub use stratastm_concurrency::{
    CommitLock, GlobalVersionClock, TCell, Transaction, TransactionStatus, DEFAULT_LOCK_TIMEOUT,
};
pub use stratastm_core::{BoxError, CellId, ConflictKind, StmError, StmResult, TxnId, Version};
pub use stratastm_engine::{
    RetryConfig, StmConfig, TransactionExecutor, TransactionMetrics, CONFIG_FILE_NAME,
};

static DEFAULT_EXECUTOR: Lazy<TransactionExecutor> = Lazy::new(TransactionExecutor::new);

/// Run `action` on the process-wide default executor
///
/// Uses the default configuration: one second per commit lock and
/// unbounded retries with jittered backoff. Build a
/// [`TransactionExecutor`] for anything else.
pub fn atomically<T, F>(action: F) -> StmResult<T>
where
    F: FnMut(&mut Transaction) -> StmResult<T>,
{
    DEFAULT_EXECUTOR.execute(action)
}

/// Metrics of the executor behind [`atomically`]
pub fn default_metrics() -> TransactionMetrics {
    DEFAULT_EXECUTOR.metrics()
}

/// Common imports
pub mod prelude {
    pub use crate::{atomically, StmError, StmResult, TCell, Transaction, TransactionExecutor};
}
