//! Transaction coordinator for managing attempt lifecycle
//!
//! The TransactionCoordinator starts transactions with the configured lock
//! timeout and keeps executor-level metrics:
//! - attempts started
//! - commits
//! - conflicts (attempts discarded and retried)
//! - caller errors (attempts aborted and propagated)
//! - exhausted retry budgets

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use stratastm_concurrency::Transaction;
use stratastm_core::StmError;
use tracing::{debug, trace};

/// Transaction coordinator for an executor
///
/// # Memory Ordering
///
/// The metric counters use Relaxed ordering: they are purely observational
/// and do not synchronize any other memory operations.
#[derive(Debug)]
pub struct TransactionCoordinator {
    lock_timeout: Duration,
    total_started: AtomicU64,
    total_committed: AtomicU64,
    total_conflicts: AtomicU64,
    total_caller_errors: AtomicU64,
    total_exhausted: AtomicU64,
}

impl TransactionCoordinator {
    /// Create a coordinator whose transactions use `lock_timeout`
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            lock_timeout,
            total_started: AtomicU64::new(0),
            total_committed: AtomicU64::new(0),
            total_conflicts: AtomicU64::new(0),
            total_caller_errors: AtomicU64::new(0),
            total_exhausted: AtomicU64::new(0),
        }
    }

    /// Commit-lock timeout given to every transaction
    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    /// Start a new attempt
    pub fn start_transaction(&self) -> Transaction {
        self.total_started.fetch_add(1, Ordering::Relaxed);
        Transaction::begin_with_lock_timeout(self.lock_timeout)
    }

    /// Record a successful commit
    pub fn record_commit(&self, txn: &Transaction, attempt: usize) {
        self.total_committed.fetch_add(1, Ordering::Relaxed);
        trace!(target: "stratastm::txn", txn_id = %txn.id(), attempt, "Attempt committed");
    }

    /// Record an attempt discarded because of a retryable error
    pub fn record_conflict(&self, txn: &Transaction, attempt: usize, error: &StmError) {
        self.total_conflicts.fetch_add(1, Ordering::Relaxed);
        debug!(target: "stratastm::txn", txn_id = %txn.id(), attempt, error = %error, "Attempt conflicted");
    }

    /// Record an attempt aborted by a caller error
    pub fn record_caller_error(&self, txn: &Transaction, error: &StmError) {
        self.total_caller_errors.fetch_add(1, Ordering::Relaxed);
        debug!(target: "stratastm::txn", txn_id = %txn.id(), error = %error, "Attempt aborted by action");
    }

    /// Record a call that ran out of attempts
    pub fn record_exhausted(&self) {
        self.total_exhausted.fetch_add(1, Ordering::Relaxed);
    }

    /// Get transaction metrics
    pub fn metrics(&self) -> TransactionMetrics {
        let started = self.total_started.load(Ordering::Relaxed);
        let committed = self.total_committed.load(Ordering::Relaxed);

        TransactionMetrics {
            total_started: started,
            total_committed: committed,
            total_conflicts: self.total_conflicts.load(Ordering::Relaxed),
            total_caller_errors: self.total_caller_errors.load(Ordering::Relaxed),
            total_exhausted: self.total_exhausted.load(Ordering::Relaxed),
            commit_rate: if started > 0 {
                committed as f64 / started as f64
            } else {
                0.0
            },
        }
    }
}

/// Point-in-time copy of the coordinator's counters
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionMetrics {
    /// Total attempts started
    pub total_started: u64,
    /// Total attempts committed
    pub total_committed: u64,
    /// Attempts discarded on conflict or abort and retried
    pub total_conflicts: u64,
    /// Attempts aborted by a non-retryable action error
    pub total_caller_errors: u64,
    /// Calls that gave up after exhausting their retry budget
    pub total_exhausted: u64,
    /// Commit success rate (committed / started)
    pub commit_rate: f64,
}

impl TransactionMetrics {
    /// Attempts that have finished one way or another
    pub fn total_completed(&self) -> u64 {
        self.total_committed + self.total_conflicts + self.total_caller_errors
    }

    /// Conflict rate (conflicts / started)
    pub fn conflict_rate(&self) -> f64 {
        if self.total_started > 0 {
            self.total_conflicts as f64 / self.total_started as f64
        } else {
            0.0
        }
    }
}
