//! Core types for the STM engine
//!
//! This crate defines the foundational types used throughout the system:
//! - TxnId: Identity of a transaction attempt (also the commit-lock owner token)
//! - CellId: Stable identity of a transactional cell
//! - Version: Position on the global commit timeline
//! - StmError: Error taxonomy (retryable conflicts vs. terminal errors)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod types;

pub use error::{BoxError, ConflictKind, StmError, StmResult};
pub use types::{CellId, TxnId, Version};
