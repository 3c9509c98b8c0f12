//! Core identifier types
//!
//! This module defines the small value types shared by every layer:
//! - TxnId: Identity of one transaction attempt
//! - CellId: Stable identity of a transactional cell
//! - Version: Position on the global commit timeline

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a single transaction attempt
///
/// Every retry gets a fresh `TxnId`. Commit locks record the id of the
/// transaction holding them, so the id doubles as the lock owner token.
/// Id 0 is reserved to mean "no owner".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TxnId(u64);

impl TxnId {
    /// Reserved id that never names a real transaction
    pub const NONE: Self = TxnId(0);

    /// Create a transaction id from its raw value
    pub const fn new(id: u64) -> Self {
        TxnId(id)
    }

    /// Get the raw id
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Check whether this is the reserved "no owner" id
    pub const fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn:{}", self.0)
    }
}

/// Stable identity of a transactional cell
///
/// Assigned once at cell creation and never reused within a process.
/// The ordering of `CellId`s is the global lock-acquisition order used
/// by commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellId(u64);

impl CellId {
    /// Create a cell id from its raw value
    pub const fn new(id: u64) -> Self {
        CellId(id)
    }

    /// Get the raw id
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cell:{}", self.0)
    }
}

/// Version number on the global commit timeline
///
/// Cells start at [`Version::INITIAL`]. Each successful commit mints one
/// new version from the global clock and stamps it on every cell it wrote,
/// so a cell's version strictly increases over its lifetime.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Version(u64);

impl Version {
    /// Version of a freshly created cell, and the clock's starting point
    pub const INITIAL: Self = Version(1);

    /// Create a version from its raw value
    pub const fn new(v: u64) -> Self {
        Version(v)
    }

    /// Get the raw version number
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// The version immediately after this one
    pub fn next(&self) -> Self {
        Version(self.0.saturating_add(1))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl From<u64> for Version {
    fn from(v: u64) -> Self {
        Version(v)
    }
}
