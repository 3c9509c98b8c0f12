//! Per-cell commit lock
//!
//! An exclusive lock held only for the lock/validate/apply window of a commit.
//! The owner is recorded as a [`TxnId`], which gives readers a lock-free
//! ownership check (`holder()`) and lets commit validation distinguish
//! "locked by me" from "locked by someone else".
//!
//! Acquisition is always bounded: a stuck acquisition degrades to a
//! `false` return (and a retried conflict upstream), never a hang.

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use stratastm_core::TxnId;

/// Upper bound applied to any requested wait
pub const MAX_LOCK_WAIT: Duration = Duration::from_secs(3600);

const FREE: u64 = 0;

/// Exclusive, owner-tracking lock with timed acquisition
#[derive(Debug, Default)]
pub struct CommitLock {
    /// Raw id of the owning transaction, `FREE` when unlocked
    owner: AtomicU64,
    /// Serializes waiters with releasers so a release is never missed
    gate: Mutex<()>,
    released: Condvar,
}

impl CommitLock {
    /// Create an unlocked lock
    pub fn new() -> Self {
        Self::default()
    }

    /// Transaction currently holding the lock, if any
    pub fn holder(&self) -> Option<TxnId> {
        match self.owner.load(Ordering::Acquire) {
            FREE => None,
            id => Some(TxnId::new(id)),
        }
    }

    /// Check whether `txn` holds the lock
    pub fn is_held_by(&self, txn: TxnId) -> bool {
        self.owner.load(Ordering::Acquire) == txn.as_u64()
    }

    /// Check whether some transaction other than `txn` holds the lock
    pub fn is_held_by_other(&self, txn: TxnId) -> bool {
        matches!(self.holder(), Some(holder) if holder != txn)
    }

    /// Try to acquire the lock for `txn`, waiting at most `timeout`
    ///
    /// Returns `true` if `txn` holds the lock on return (including the case
    /// where it already held it). Returns `false` on timeout.
    ///
    /// # Panics
    /// Panics if `txn` is [`TxnId::NONE`].
    pub fn try_acquire(&self, txn: TxnId, timeout: Duration) -> bool {
        assert!(!txn.is_none(), "TxnId::NONE cannot own a commit lock");

        if self.try_take(txn) {
            return true;
        }
        if timeout.is_zero() {
            return false;
        }

        let deadline = Instant::now() + timeout.min(MAX_LOCK_WAIT);
        let mut guard = self.gate.lock();
        loop {
            if self.try_take(txn) {
                return true;
            }
            if self.released.wait_until(&mut guard, deadline).timed_out() {
                return self.try_take(txn);
            }
        }
    }

    /// Release the lock held by `txn`
    ///
    /// Returns `false` (and changes nothing) if `txn` is not the holder.
    pub fn release(&self, txn: TxnId) -> bool {
        let released = self
            .owner
            .compare_exchange(txn.as_u64(), FREE, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if released {
            let _guard = self.gate.lock();
            self.released.notify_all();
        }
        released
    }

    fn try_take(&self, txn: TxnId) -> bool {
        match self.owner.compare_exchange(
            FREE,
            txn.as_u64(),
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => true,
            Err(current) => current == txn.as_u64(),
        }
    }
}
