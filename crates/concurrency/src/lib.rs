//! Concurrency layer for the STM engine
//!
//! This crate implements optimistic concurrency control (OCC) over shared cells:
//! - GlobalVersionClock: Process-wide commit timeline
//! - CommitLock: Per-cell exclusive lock with bounded acquisition
//! - TCell: Transactional cell (value + version + commit lock)
//! - Transaction: Read/write set tracking and the three-phase commit
//! - Validation: Commit-time read-set checks

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cell;
pub mod clock;
pub mod lock;
pub mod transaction;
pub mod validation;

pub use cell::TCell;
pub use clock::GlobalVersionClock;
pub use lock::CommitLock;
pub use transaction::{Transaction, TransactionStatus, DEFAULT_LOCK_TIMEOUT};
pub use validation::{ReadConflict, ValidationResult};
