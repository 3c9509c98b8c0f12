//! Version Monotonicity Tests

use crate::common::*;
use std::collections::HashSet;
use stratastm::GlobalVersionClock;

#[test]
fn each_write_commit_bumps_version() {
    let executor = TransactionExecutor::new();
    let cell = TCell::new(0u8);
    let mut last = cell.version();

    for _ in 0..50 {
        executor.execute(|txn| cell.modify(txn, |v| v.wrapping_add(1))).unwrap();
        let now = cell.version();
        assert!(now > last);
        last = now;
    }
}

#[test]
fn read_only_execution_leaves_version() {
    let executor = TransactionExecutor::new();
    let cell = TCell::new(7u8);
    let before = cell.version();

    let v = executor.execute(|txn| cell.get(txn)).unwrap();
    assert_eq!(v, 7);
    assert_eq!(cell.version(), before);
}

#[test]
fn concurrent_commits_never_share_a_version() {
    let executor = contended_executor();
    let cell = TCell::new(0u64);

    let handles = {
        let cell = cell.clone();
        spawn_synchronized(4, move |_| {
            let mut versions = Vec::new();
            for _ in 0..100 {
                executor.execute(|txn| cell.modify(txn, |v| v + 1)).unwrap();
                // Written by this thread or later, never older
                versions.push(cell.version());
            }
            versions
        })
    };

    let per_thread = join_all(handles);
    for versions in &per_thread {
        assert!(versions.windows(2).all(|w| w[0] < w[1]));
    }
    assert_eq!(cell.load(), 400);
    assert!(cell.version() <= GlobalVersionClock::global().current());
}

#[test]
fn commit_versions_are_distinct_across_cells() {
    let cells: Vec<_> = (0..4).map(|_| TCell::new(0i32)).collect();

    let handles = {
        let cells = cells.clone();
        spawn_synchronized(4, move |i| {
            let mut versions = Vec::new();
            while versions.len() < 50 {
                let mut txn = Transaction::begin();
                if cells[i].set(&mut txn, 1).is_err() {
                    continue;
                }
                if let Ok(v) = txn.commit() {
                    versions.push(v);
                }
            }
            versions
        })
    };

    let all: Vec<Version> = join_all(handles).into_iter().flatten().collect();
    let unique: HashSet<_> = all.iter().collect();
    assert_eq!(unique.len(), all.len());
}
