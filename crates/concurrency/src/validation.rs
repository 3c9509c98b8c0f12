//! Read-set validation for OCC
//!
//! Runs in the second phase of commit, after every written cell is locked.
//! A read is still valid iff:
//! - the cell's version has not moved since it was observed, and is not
//!   newer than the transaction's snapshot
//! - no other transaction holds the cell's commit lock
//!
//! Blind writes (write without read) never appear here and so never fail
//! validation.

use crate::transaction::ReadEntry;
use stratastm_core::{CellId, ConflictKind, StmError, TxnId, Version};

/// A single failed read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadConflict {
    /// The cell whose read is no longer valid
    pub cell: CellId,
    /// Why it is no longer valid
    pub kind: ConflictKind,
}

/// Result of read-set validation
///
/// Accumulates all conflicts found, ordered by cell id.
/// A transaction proceeds to apply only if `is_valid()` returns true.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// All conflicts detected during validation
    pub conflicts: Vec<ReadConflict>,
}

impl ValidationResult {
    /// Create a successful validation result (no conflicts)
    pub fn ok() -> Self {
        ValidationResult {
            conflicts: Vec::new(),
        }
    }

    /// Check if validation passed (no conflicts)
    pub fn is_valid(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Get the number of conflicts
    pub fn conflict_count(&self) -> usize {
        self.conflicts.len()
    }

    /// Convert the first conflict into the error reported by commit
    pub fn into_error(self) -> Option<StmError> {
        self.conflicts
            .into_iter()
            .next()
            .map(|c| StmError::conflict(c.cell, c.kind))
    }
}

/// Validate every read against the cells' current state
pub(crate) fn validate_read_set<'a, I>(reads: I, snapshot: Version, txn: TxnId) -> ValidationResult
where
    I: IntoIterator<Item = &'a ReadEntry>,
{
    let mut result = ValidationResult::ok();

    for entry in reads {
        let cell = entry.cell.id();
        if let Some(holder) = entry.cell.lock_holder() {
            if holder != txn {
                result.conflicts.push(ReadConflict {
                    cell,
                    kind: ConflictKind::LockedByOther { holder },
                });
                continue;
            }
        }

        let current = entry.cell.version();
        if current != entry.observed || !entry.cell.validate(snapshot, txn) {
            result.conflicts.push(ReadConflict {
                cell,
                kind: ConflictKind::ValidationFailed {
                    observed: entry.observed,
                    current,
                },
            });
        }
    }

    result.conflicts.sort_by_key(|c| c.cell);
    result
}
