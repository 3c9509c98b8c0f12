//! Transactional cells
//!
//! A [`TCell<T>`] is one shared mutable slot: a value, the version of the
//! commit that last wrote it, and an exclusive commit lock. Application code
//! creates cells once and reaches them only through a [`Transaction`]:
//!
//! - `get` returns the transaction's own pending write if there is one
//!   (read-your-own-writes), otherwise samples the committed value and
//!   records the observed version in the read set.
//! - `set` buffers the new value in the write set. Nothing is visible to
//!   other transactions until commit.
//!
//! Both operations run the conflict check on every call, so a transaction
//! that has already lost a race fails fast instead of at commit.
//!
//! The value and version are only ever changed by `apply`, which commit
//! calls while holding the cell's commit lock.

use crate::lock::CommitLock;
use crate::transaction::Transaction;
use parking_lot::RwLock;
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use stratastm_core::{CellId, ConflictKind, StmError, StmResult, TxnId, Version};
use tracing::trace;

static NEXT_CELL_ID: AtomicU64 = AtomicU64::new(1);

/// Type-erased pending value held in a transaction's write set
pub(crate) type PendingValue = Box<dyn Any + Send>;

/// Object-safe view of a cell used by the commit protocol
///
/// Lets one transaction lock, validate and apply cells of different value
/// types through a single collection.
pub(crate) trait CellHandle: Send + Sync {
    fn id(&self) -> CellId;
    fn version(&self) -> Version;
    fn lock_holder(&self) -> Option<TxnId>;
    fn validate(&self, as_of: Version, txn: TxnId) -> bool;
    fn try_acquire_commit_lock(&self, txn: TxnId, timeout: Duration) -> bool;
    fn release_commit_lock(&self, txn: TxnId) -> StmResult<()>;
    fn apply_pending(&self, value: PendingValue, version: Version, txn: TxnId);
}

struct Slot<T> {
    value: T,
    version: Version,
}

struct CellInner<T> {
    id: CellId,
    /// Value and version always change together
    slot: RwLock<Slot<T>>,
    commit_lock: CommitLock,
}

impl<T> CellInner<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn sample(&self) -> (T, Version) {
        let slot = self.slot.read();
        (slot.value.clone(), slot.version)
    }

    fn apply(&self, value: T, version: Version, txn: TxnId) {
        assert!(
            self.commit_lock.is_held_by(txn),
            "{} applied to {} without holding its commit lock",
            txn,
            self.id
        );
        let mut slot = self.slot.write();
        assert!(
            version > slot.version,
            "non-increasing version applied to {}: {} -> {}",
            self.id,
            slot.version,
            version
        );
        slot.value = value;
        slot.version = version;
    }
}

impl<T> CellHandle for CellInner<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn id(&self) -> CellId {
        self.id
    }

    fn version(&self) -> Version {
        self.slot.read().version
    }

    fn lock_holder(&self) -> Option<TxnId> {
        self.commit_lock.holder()
    }

    fn validate(&self, as_of: Version, txn: TxnId) -> bool {
        self.version() <= as_of && !self.commit_lock.is_held_by_other(txn)
    }

    fn try_acquire_commit_lock(&self, txn: TxnId, timeout: Duration) -> bool {
        self.commit_lock.try_acquire(txn, timeout)
    }

    fn release_commit_lock(&self, txn: TxnId) -> StmResult<()> {
        if self.commit_lock.release(txn) {
            Ok(())
        } else {
            Err(StmError::LockNotHeld {
                cell: self.id,
                txn_id: txn,
            })
        }
    }

    fn apply_pending(&self, value: PendingValue, version: Version, txn: TxnId) {
        match value.downcast::<T>() {
            Ok(value) => self.apply(*value, version, txn),
            Err(_) => panic!("pending value for {} has the wrong type", self.id),
        }
    }
}

/// A transactional memory cell holding a value of type `T`
///
/// Cloning a `TCell` yields another handle to the same cell.
///
/// # Example
///
/// ```
/// use stratastm_concurrency::{TCell, Transaction};
///
/// let cell = TCell::new(10);
/// let mut txn = Transaction::begin();
/// let v = cell.get(&mut txn).unwrap();
/// cell.set(&mut txn, v + 1).unwrap();
/// assert_eq!(cell.get(&mut txn).unwrap(), 11); // own pending write
/// assert_eq!(cell.load(), 10); // not visible before commit
///
/// txn.commit().unwrap();
/// assert_eq!(cell.load(), 11);
/// ```
pub struct TCell<T> {
    inner: Arc<CellInner<T>>,
}

impl<T> TCell<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a cell holding `value` at [`Version::INITIAL`]
    pub fn new(value: T) -> Self {
        let id = CellId::new(NEXT_CELL_ID.fetch_add(1, Ordering::Relaxed));
        TCell {
            inner: Arc::new(CellInner {
                id,
                slot: RwLock::new(Slot {
                    value,
                    version: Version::INITIAL,
                }),
                commit_lock: CommitLock::new(),
            }),
        }
    }

    /// Stable identity of this cell
    pub fn id(&self) -> CellId {
        self.inner.id
    }

    /// Version of the last commit that wrote this cell
    pub fn version(&self) -> Version {
        CellHandle::version(&*self.inner)
    }

    /// Read the committed value without a transaction
    ///
    /// This is a raw read: nothing is tracked and there is no consistency
    /// with reads of other cells.
    pub fn load(&self) -> T {
        self.inner.sample().0
    }

    /// Check whether some transaction is currently committing to this cell
    pub fn is_locked(&self) -> bool {
        self.inner.commit_lock.holder().is_some()
    }

    /// Read the cell inside `txn`
    ///
    /// Returns the transaction's pending write if it has one. Otherwise
    /// returns the committed value and records `(cell, version)` in the
    /// read set (first observation wins).
    ///
    /// # Errors
    /// - [`StmError::Aborted`] if `txn` is aborted
    /// - [`StmError::InvalidState`] if `txn` already committed
    /// - [`StmError::Conflict`] if another transaction holds the commit lock
    ///   or the cell has been committed past `txn`'s snapshot
    pub fn get(&self, txn: &mut Transaction) -> StmResult<T> {
        txn.ensure_active()?;
        // Checked before sampling as well as after: a commit holding the lock
        // across the sample cannot pass both checks.
        self.check_conflict(txn)?;

        let value = match txn.pending::<T>(self.id()) {
            Some(pending) => pending.clone(),
            None => {
                let (value, version) = self.inner.sample();
                txn.record_read(self.handle(), version);
                value
            }
        };

        self.check_conflict(txn)?;
        trace!(target: "stratastm::txn", txn_id = %txn.id(), cell = %self.id(), "read");
        Ok(value)
    }

    /// Buffer `value` as this cell's new value in `txn`
    ///
    /// Overwrites any earlier pending value. The committed value is not
    /// touched until `txn` commits.
    ///
    /// # Errors
    /// Same as [`TCell::get`].
    pub fn set(&self, txn: &mut Transaction, value: T) -> StmResult<()> {
        txn.ensure_active()?;
        txn.stage_write(self.handle(), Box::new(value));
        self.check_conflict(txn)?;
        trace!(target: "stratastm::txn", txn_id = %txn.id(), cell = %self.id(), "write");
        Ok(())
    }

    /// Read, transform and write back in one call
    pub fn modify<F>(&self, txn: &mut Transaction, f: F) -> StmResult<()>
    where
        F: FnOnce(T) -> T,
    {
        let current = self.get(txn)?;
        self.set(txn, f(current))
    }

    /// Check that this cell is still consistent with a snapshot
    ///
    /// Returns `false` if the cell's version is newer than `as_of`, or if a
    /// transaction other than `txn` holds the commit lock.
    pub fn validate(&self, as_of: Version, txn: TxnId) -> bool {
        CellHandle::validate(&*self.inner, as_of, txn)
    }

    /// Try to take the commit lock for `txn`, waiting at most `timeout`
    ///
    /// Returns `false` on timeout; never blocks beyond the bound.
    pub fn try_acquire_commit_lock(&self, txn: TxnId, timeout: Duration) -> bool {
        CellHandle::try_acquire_commit_lock(&*self.inner, txn, timeout)
    }

    /// Release the commit lock held by `txn`
    ///
    /// # Errors
    /// [`StmError::LockNotHeld`] if `txn` does not hold the lock.
    pub fn release_commit_lock(&self, txn: TxnId) -> StmResult<()> {
        CellHandle::release_commit_lock(&*self.inner, txn)
    }

    /// Install a committed value
    ///
    /// # Panics
    /// Panics unless `txn` holds the commit lock and `version` is greater
    /// than the current version.
    pub(crate) fn apply(&self, value: T, version: Version, txn: TxnId) {
        self.inner.apply(value, version, txn);
    }

    fn handle(&self) -> Arc<dyn CellHandle> {
        Arc::clone(&self.inner) as Arc<dyn CellHandle>
    }

    fn check_conflict(&self, txn: &Transaction) -> StmResult<()> {
        if let Some(holder) = self.inner.commit_lock.holder() {
            if holder != txn.id() {
                return Err(StmError::conflict(
                    self.id(),
                    ConflictKind::LockedByOther { holder },
                ));
            }
        }
        let current = self.version();
        if current > txn.snapshot_version() {
            return Err(StmError::conflict(
                self.id(),
                ConflictKind::StaleRead {
                    snapshot: txn.snapshot_version(),
                    current,
                },
            ));
        }
        Ok(())
    }
}

impl<T> Clone for TCell<T> {
    fn clone(&self) -> Self {
        TCell {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for TCell<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = self.inner.slot.read();
        f.debug_struct("TCell")
            .field("id", &self.inner.id)
            .field("value", &slot.value)
            .field("version", &slot.version)
            .field("locked_by", &self.inner.commit_lock.holder())
            .finish()
    }
}
