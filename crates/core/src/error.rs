//! Error types for the STM engine
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Errors fall into two groups:
//! - Retryable: [`StmError::Conflict`] and [`StmError::Aborted`]. These are
//!   produced by the optimistic protocol and are consumed by the executor,
//!   which discards the attempt and starts a fresh transaction.
//! - Terminal: everything else. These propagate to the caller unchanged.
//!
//! Invariant violations (e.g. applying a non-increasing version) are not
//! errors at all; they panic.

use crate::types::{CellId, TxnId, Version};
use std::time::Duration;
use thiserror::Error;

/// Boxed caller error carried through [`StmError::Action`]
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for STM operations
pub type StmResult<T> = std::result::Result<T, StmError>;

/// Why a cell access or commit detected a conflict
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConflictKind {
    /// The cell was committed after the transaction's snapshot was taken
    #[error("stale read: snapshot {snapshot}, cell at {current}")]
    StaleRead {
        /// Snapshot version of the transaction
        snapshot: Version,
        /// Version of the cell when the conflict was detected
        current: Version,
    },

    /// Another transaction currently holds the cell's commit lock
    #[error("commit lock held by {holder}")]
    LockedByOther {
        /// Transaction holding the lock
        holder: TxnId,
    },

    /// The commit lock could not be acquired within the bounded wait
    #[error("failed to lock within {waited:?}")]
    LockTimeout {
        /// How long the acquisition waited before giving up
        waited: Duration,
    },

    /// Commit-time validation of the read set failed
    #[error("validation failed: read {observed}, cell at {current}")]
    ValidationFailed {
        /// Version recorded in the read set
        observed: Version,
        /// Version of the cell at validation time
        current: Version,
    },
}

/// Error types for the STM engine
#[derive(Debug, Error)]
pub enum StmError {
    /// Optimistic conflict on a cell (retryable)
    #[error("conflict on {cell}: {kind}")]
    Conflict {
        /// Cell on which the conflict was detected
        cell: CellId,
        /// What kind of conflict
        kind: ConflictKind,
    },

    /// Operation targeted a transaction that is already aborted (retryable)
    #[error("{txn_id} is aborted")]
    Aborted {
        /// The aborted transaction
        txn_id: TxnId,
    },

    /// Operation is not legal in the transaction's current state
    #[error("invalid transaction state: {0}")]
    InvalidState(String),

    /// Attempted to release a commit lock the caller does not hold
    #[error("commit lock on {cell} is not held by {txn_id}")]
    LockNotHeld {
        /// Cell whose lock was released
        cell: CellId,
        /// Transaction that attempted the release
        txn_id: TxnId,
    },

    /// The action cancelled the transaction explicitly
    #[error("transaction cancelled: {reason}")]
    Cancelled {
        /// Human-readable reason
        reason: String,
    },

    /// The action failed with its own error
    #[error("action failed: {0}")]
    Action(#[source] BoxError),

    /// The retry budget ran out before any attempt committed
    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Number of attempts made
        attempts: usize,
        /// Error that ended the final attempt
        last: Box<StmError>,
    },

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),
}

impl StmError {
    /// Build a conflict error
    pub fn conflict(cell: CellId, kind: ConflictKind) -> Self {
        StmError::Conflict { cell, kind }
    }

    /// Wrap a caller error so it can travel through an action
    ///
    /// The executor never retries these; the original error can be
    /// recovered with [`StmError::action_ref`].
    pub fn action<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StmError::Action(Box::new(err))
    }

    /// Explicitly cancel the enclosing transaction
    pub fn cancelled(reason: impl Into<String>) -> Self {
        StmError::Cancelled {
            reason: reason.into(),
        }
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(self, StmError::Conflict { .. })
    }

    /// Check if this error reports an aborted transaction
    pub fn is_aborted(&self) -> bool {
        matches!(self, StmError::Aborted { .. })
    }

    /// Check if this error is retryable.
    ///
    /// Retryable errors may succeed on a fresh transaction.
    pub fn is_retryable(&self) -> bool {
        self.is_conflict() || self.is_aborted()
    }

    /// The conflict kind, if this is a conflict
    pub fn conflict_kind(&self) -> Option<&ConflictKind> {
        match self {
            StmError::Conflict { kind, .. } => Some(kind),
            _ => None,
        }
    }

    /// Borrow the caller's original error if it has type `E`
    pub fn action_ref<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        match self {
            StmError::Action(inner) => inner.downcast_ref::<E>(),
            _ => None,
        }
    }
}
