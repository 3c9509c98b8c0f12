//! Shared test utilities for the integration test suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]

use std::sync::{Arc, Barrier, Once};
use std::thread::{self, JoinHandle};

pub use stratastm::{
    RetryConfig, StmConfig, StmError, StmResult, TCell, Transaction, TransactionExecutor, Version,
};

// ============================================================================
// Initialization
// ============================================================================

static INIT_TRACING: Once = Once::new();

/// Route `tracing` output to the test harness
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_test_writer()
            .try_init();
    });
}

// ============================================================================
// Executors
// ============================================================================

/// Executor that retries forever with a short backoff
pub fn contended_executor() -> Arc<TransactionExecutor> {
    init_tracing();
    Arc::new(TransactionExecutor::with_retry(
        RetryConfig::new().with_base_delay_us(1).with_max_delay_us(500),
    ))
}

/// Executor with a bounded attempt budget and no sleeping
pub fn bounded_executor(max_attempts: usize) -> TransactionExecutor {
    init_tracing();
    TransactionExecutor::with_retry(RetryConfig::no_backoff().with_max_attempts(max_attempts))
}

// ============================================================================
// Threads
// ============================================================================

/// Spawn `n` threads that start together, passing each its index
pub fn spawn_synchronized<F, R>(n: usize, f: F) -> Vec<JoinHandle<R>>
where
    F: Fn(usize) -> R + Send + Sync + 'static,
    R: Send + 'static,
{
    let barrier = Arc::new(Barrier::new(n));
    let f = Arc::new(f);
    (0..n)
        .map(|i| {
            let barrier = Arc::clone(&barrier);
            let f = Arc::clone(&f);
            thread::spawn(move || {
                barrier.wait();
                f(i)
            })
        })
        .collect()
}

/// Join every handle, propagating panics
pub fn join_all<R>(handles: Vec<JoinHandle<R>>) -> Vec<R> {
    handles
        .into_iter()
        .map(|h| h.join().expect("worker thread panicked"))
        .collect()
}

// ============================================================================
// Assertions
// ============================================================================

/// Assert no commit lock is held on any of the cells
pub fn assert_unlocked<T: Clone + Send + Sync + 'static>(cells: &[TCell<T>]) {
    for cell in cells {
        assert!(!cell.is_locked(), "{} still locked", cell.id());
    }
}
