//! Global version clock
//!
//! A single monotonic counter for the whole process:
//! - Read (never incremented) when a transaction begins, giving its snapshot version
//! - Incremented exactly once per successful commit that writes at least one cell
//!
//! The clock is only ever advanced by commit, strictly after every write lock
//! is held and every read is validated, so each minted version corresponds to
//! exactly one write-set application.

use std::sync::atomic::{AtomicU64, Ordering};
use stratastm_core::Version;

static GLOBAL_CLOCK: GlobalVersionClock = GlobalVersionClock::new();

/// Process-wide commit version counter
///
/// There is no way to set the clock; it only moves forward through [`tick`].
///
/// [`tick`]: GlobalVersionClock::tick
#[derive(Debug)]
pub struct GlobalVersionClock {
    /// Monotonically increasing. Each committing write set increments by 1.
    version: AtomicU64,
}

impl GlobalVersionClock {
    /// Create a clock positioned at [`Version::INITIAL`]
    pub(crate) const fn new() -> Self {
        GlobalVersionClock {
            version: AtomicU64::new(Version::INITIAL.as_u64()),
        }
    }

    /// The process-wide clock shared by every transaction and cell
    pub fn global() -> &'static GlobalVersionClock {
        &GLOBAL_CLOCK
    }

    /// Get the current version
    pub fn current(&self) -> Version {
        Version::new(self.version.load(Ordering::SeqCst))
    }

    /// Mint the next commit version (increment and read)
    pub fn tick(&self) -> Version {
        Version::new(self.version.fetch_add(1, Ordering::SeqCst) + 1)
    }
}
