//! Transaction context for OCC
//!
//! A [`Transaction`] is the per-attempt context threaded explicitly through
//! every cell operation. It carries:
//! - the snapshot version read from the global clock at `begin()`
//! - the read set: cell → version observed at first read
//! - the write set: cell → pending value, invisible to others until commit
//! - the status: `Active`, then exactly one of `Committed` / `Aborted`
//!
//! ## Commit Sequence
//!
//! ```text
//! 1. Lock     - take every written cell's commit lock, in CellId order,
//!               each with a bounded wait. Timeout → Conflict, status stays Active.
//! 2. Validate - re-check every read. Failure → Conflict, status Aborted.
//! 3. Apply    - tick the global clock once, apply every pending value at that version.
//! 4. Finish   - clear both sets, status Committed.
//! 5. Release  - every lock taken in step 1, on every exit path.
//! ```
//!
//! Failure in steps 1-2 means step 3 never runs, so a commit is all-or-nothing.

use crate::cell::{CellHandle, PendingValue};
use crate::clock::GlobalVersionClock;
use crate::validation::validate_read_set;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use stratastm_core::{CellId, ConflictKind, StmError, StmResult, TxnId, Version};
use tracing::{debug, error, trace};

/// Default bound on waiting for a single commit lock
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(1);

static NEXT_TXN_ID: AtomicU64 = AtomicU64::new(1);

/// Status of a transaction in its lifecycle
///
/// `Active` → `Committed` or `Active` → `Aborted`. Both are terminal.
/// A retry is not a transition: the executor begins a new transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Transaction is executing, can read/write
    Active,
    /// Transaction committed successfully
    Committed,
    /// Transaction was aborted
    Aborted,
}

/// A read recorded for commit-time validation
pub(crate) struct ReadEntry {
    pub(crate) cell: Arc<dyn CellHandle>,
    /// Version observed at first read
    pub(crate) observed: Version,
}

struct WriteEntry {
    cell: Arc<dyn CellHandle>,
    value: PendingValue,
}

/// Commit locks taken during one commit attempt
///
/// Dropping releases every lock, so no exit path from `commit` leaks one.
struct HeldLocks {
    txn_id: TxnId,
    cells: SmallVec<[Arc<dyn CellHandle>; 8]>,
}

impl HeldLocks {
    fn new(txn_id: TxnId) -> Self {
        HeldLocks {
            txn_id,
            cells: SmallVec::new(),
        }
    }

    fn push(&mut self, cell: Arc<dyn CellHandle>) {
        self.cells.push(cell);
    }
}

impl Drop for HeldLocks {
    fn drop(&mut self) {
        while let Some(cell) = self.cells.pop() {
            if let Err(e) = cell.release_commit_lock(self.txn_id) {
                error!(target: "stratastm::txn", txn_id = %self.txn_id, error = %e, "Failed to release commit lock");
            }
        }
    }
}

/// Transaction context for OCC with snapshot isolation
///
/// Created fresh for every attempt. Cells are accessed through it with
/// [`TCell::get`](crate::TCell::get) and [`TCell::set`](crate::TCell::set).
pub struct Transaction {
    id: TxnId,
    /// Global clock value at begin. Cells newer than this are conflicts.
    snapshot_version: Version,
    status: TransactionStatus,
    read_set: FxHashMap<CellId, ReadEntry>,
    /// Ordered by cell id, which is the lock-acquisition order
    write_set: BTreeMap<CellId, WriteEntry>,
    lock_timeout: Duration,
    start_time: Instant,
}

impl Transaction {
    /// Begin a transaction with the default lock timeout
    pub fn begin() -> Self {
        Self::begin_with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    /// Begin a transaction whose commit waits at most `lock_timeout` per cell lock
    pub fn begin_with_lock_timeout(lock_timeout: Duration) -> Self {
        let id = TxnId::new(NEXT_TXN_ID.fetch_add(1, Ordering::Relaxed));
        let snapshot_version = GlobalVersionClock::global().current();
        trace!(target: "stratastm::txn", txn_id = %id, snapshot = %snapshot_version, "Transaction started");

        Transaction {
            id,
            snapshot_version,
            status: TransactionStatus::Active,
            read_set: FxHashMap::default(),
            write_set: BTreeMap::new(),
            lock_timeout,
            start_time: Instant::now(),
        }
    }

    /// Unique id of this attempt
    pub fn id(&self) -> TxnId {
        self.id
    }

    /// Global version observed at begin
    pub fn snapshot_version(&self) -> Version {
        self.snapshot_version
    }

    /// Current status
    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    /// Check if transaction is in Active state
    pub fn is_active(&self) -> bool {
        self.status == TransactionStatus::Active
    }

    /// Check if transaction is committed
    pub fn is_committed(&self) -> bool {
        self.status == TransactionStatus::Committed
    }

    /// Check if transaction is aborted
    pub fn is_aborted(&self) -> bool {
        self.status == TransactionStatus::Aborted
    }

    /// Number of cells in the read set
    pub fn read_count(&self) -> usize {
        self.read_set.len()
    }

    /// Number of cells with a pending write
    pub fn write_count(&self) -> usize {
        self.write_set.len()
    }

    /// Version recorded for `cell` at its first read, if it was read
    pub fn read_version(&self, cell: CellId) -> Option<Version> {
        self.read_set.get(&cell).map(|entry| entry.observed)
    }

    /// Check whether `cell` has a pending write in this transaction
    pub fn has_pending_write(&self, cell: CellId) -> bool {
        self.write_set.contains_key(&cell)
    }

    /// Bound on waiting for each commit lock
    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    /// Time since begin
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Check if transaction can accept operations
    ///
    /// # Errors
    /// - [`StmError::Aborted`] if aborted
    /// - [`StmError::InvalidState`] if committed
    pub fn ensure_active(&self) -> StmResult<()> {
        match self.status {
            TransactionStatus::Active => Ok(()),
            TransactionStatus::Aborted => Err(StmError::Aborted { txn_id: self.id }),
            TransactionStatus::Committed => Err(StmError::InvalidState(format!(
                "{} is already committed",
                self.id
            ))),
        }
    }

    /// Discard all buffered reads and writes, keeping the status
    pub fn rollback(&mut self) {
        self.read_set.clear();
        self.write_set.clear();
    }

    /// Abort: discard buffered operations and move to `Aborted`
    ///
    /// Any later cell access through this transaction fails with
    /// [`StmError::Aborted`].
    ///
    /// # Errors
    /// Fails if the transaction is no longer active.
    pub fn abort(&mut self) -> StmResult<()> {
        self.ensure_active()?;
        self.mark_aborted();
        debug!(target: "stratastm::txn", txn_id = %self.id, "Transaction aborted");
        Ok(())
    }

    /// Commit atomically
    ///
    /// Returns the version stamped on every written cell. A transaction
    /// without writes validates its reads and returns its snapshot version;
    /// it does not advance the global clock.
    ///
    /// # Errors
    /// - [`StmError::Conflict`] with [`ConflictKind::LockTimeout`] if a
    ///   commit lock could not be taken in time (status stays `Active`)
    /// - [`StmError::Conflict`] if a read no longer validates (status
    ///   becomes `Aborted`)
    /// - [`StmError::Aborted`] / [`StmError::InvalidState`] if not active
    pub fn commit(&mut self) -> StmResult<Version> {
        self.ensure_active()?;

        // Phase 1: lock
        let mut held = HeldLocks::new(self.id);
        for (cell_id, entry) in &self.write_set {
            if !entry.cell.try_acquire_commit_lock(self.id, self.lock_timeout) {
                debug!(target: "stratastm::txn", txn_id = %self.id, cell = %cell_id, "Commit lock timed out");
                return Err(StmError::conflict(
                    *cell_id,
                    ConflictKind::LockTimeout {
                        waited: self.lock_timeout,
                    },
                ));
            }
            held.push(Arc::clone(&entry.cell));
        }

        // Phase 2: validate
        let validation =
            validate_read_set(self.read_set.values(), self.snapshot_version, self.id);
        if let Some(err) = validation.into_error() {
            drop(held);
            self.mark_aborted();
            debug!(target: "stratastm::txn", txn_id = %self.id, error = %err, "Validation failed");
            return Err(err);
        }

        // Phase 3: apply
        let commit_version = if self.write_set.is_empty() {
            self.snapshot_version
        } else {
            let version = GlobalVersionClock::global().tick();
            for (_, entry) in std::mem::take(&mut self.write_set) {
                entry.cell.apply_pending(entry.value, version, self.id);
            }
            version
        };

        // Phase 4: finish
        self.read_set.clear();
        self.status = TransactionStatus::Committed;

        // Phase 5: release
        drop(held);

        debug!(
            target: "stratastm::txn",
            txn_id = %self.id,
            commit_version = %commit_version,
            "Transaction committed"
        );
        Ok(commit_version)
    }

    fn mark_aborted(&mut self) {
        self.rollback();
        self.status = TransactionStatus::Aborted;
    }

    pub(crate) fn pending<T: 'static>(&self, cell: CellId) -> Option<&T> {
        self.write_set.get(&cell).map(|entry| {
            match entry.value.downcast_ref::<T>() {
                Some(value) => value,
                None => panic!("pending value for {} has the wrong type", cell),
            }
        })
    }

    pub(crate) fn record_read(&mut self, cell: Arc<dyn CellHandle>, observed: Version) {
        self.read_set
            .entry(cell.id())
            .or_insert(ReadEntry { cell, observed });
    }

    pub(crate) fn stage_write(&mut self, cell: Arc<dyn CellHandle>, value: PendingValue) {
        self.write_set
            .insert(cell.id(), WriteEntry { cell, value });
    }

    #[cfg(test)]
    pub(crate) fn read_entries(&self) -> impl Iterator<Item = &ReadEntry> {
        self.read_set.values()
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("snapshot_version", &self.snapshot_version)
            .field("status", &self.status)
            .field("reads", &self.read_set.len())
            .field("writes", &self.write_set.len())
            .finish()
    }
}
