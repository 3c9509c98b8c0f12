//! Atomicity Tests
//!
//! Every cell in a write set moves together, or none does.

use crate::common::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use stratastm::ConflictKind;

#[test]
fn all_written_cells_share_commit_version() {
    let executor = TransactionExecutor::new();
    let cells: Vec<_> = (0..5).map(TCell::new).collect();

    executor
        .execute(|txn| {
            for cell in &cells {
                cell.modify(txn, |v| v + 100)?;
            }
            Ok(())
        })
        .unwrap();

    let version = cells[0].version();
    for (i, cell) in cells.iter().enumerate() {
        assert_eq!(cell.load(), i as i32 + 100);
        assert_eq!(cell.version(), version);
    }
}

#[test]
fn failed_validation_applies_nothing() {
    let guard = TCell::new(0u32);
    let a = TCell::new("a".to_string());
    let b = TCell::new("b".to_string());

    let mut txn = Transaction::begin();
    guard.get(&mut txn).unwrap();
    a.set(&mut txn, "a2".to_string()).unwrap();
    b.set(&mut txn, "b2".to_string()).unwrap();

    // Invalidate the read before commit
    let mut other = Transaction::begin();
    guard.set(&mut other, 1).unwrap();
    other.commit().unwrap();

    let err = txn.commit().unwrap_err();
    assert!(matches!(
        err.conflict_kind(),
        Some(ConflictKind::ValidationFailed { .. })
    ));
    assert_eq!(a.load(), "a");
    assert_eq!(b.load(), "b");
    assert_eq!(a.version(), Version::INITIAL);
    assert_eq!(b.version(), Version::INITIAL);
}

/// Raw loads from a non-transactional observer never see a torn pair
#[test]
fn observers_never_see_partial_commit() {
    init_tracing();
    let executor = TransactionExecutor::new();
    let left = TCell::new(0u64);
    let right = TCell::new(0u64);
    let stop = Arc::new(AtomicBool::new(false));

    let observer = {
        let (left, right) = (left.clone(), right.clone());
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            let mut seen = 0u64;
            while !(stop.load(Ordering::Relaxed) && seen > 0) {
                let mut txn = Transaction::begin();
                if let (Ok(l), Ok(r)) = (left.get(&mut txn), right.get(&mut txn)) {
                    assert_eq!(l, r, "torn read");
                    seen += 1;
                }
            }
            seen
        })
    };

    for n in 1..=2_000u64 {
        executor
            .execute(|txn| {
                left.set(txn, n)?;
                right.set(txn, n)
            })
            .unwrap();
    }

    stop.store(true, Ordering::Relaxed);
    assert!(observer.join().unwrap() > 0);
    assert_eq!((left.load(), right.load()), (2_000, 2_000));
}
