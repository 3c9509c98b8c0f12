//! Read-Your-Own-Writes Tests

use crate::common::*;

#[test]
fn get_after_set_returns_pending_value() {
    let cell = TCell::new(vec![1, 2, 3]);
    let executor = TransactionExecutor::new();

    let seen = executor
        .execute(|txn| {
            cell.set(txn, vec![9])?;
            cell.get(txn)
        })
        .unwrap();

    assert_eq!(seen, vec![9]);
    assert_eq!(cell.load(), vec![9]);
}

#[test]
fn pending_value_is_invisible_to_others() {
    let cell = TCell::new(1);

    let mut writer = Transaction::begin();
    cell.set(&mut writer, 2).unwrap();
    assert_eq!(cell.get(&mut writer).unwrap(), 2);

    let mut reader = Transaction::begin();
    assert_eq!(cell.get(&mut reader).unwrap(), 1);
    assert_eq!(cell.load(), 1);

    writer.commit().unwrap();
    assert_eq!(cell.load(), 2);
}

#[test]
fn last_set_wins_within_attempt() {
    let cell = TCell::new(0);
    TransactionExecutor::new()
        .execute(|txn| {
            for i in 1..=5 {
                cell.set(txn, i)?;
                assert_eq!(cell.get(txn)?, i);
            }
            Ok(())
        })
        .unwrap();
    assert_eq!(cell.load(), 5);
}

#[test]
fn write_only_cell_is_not_in_read_set() {
    let cell = TCell::new(0);
    let mut txn = Transaction::begin();
    cell.set(&mut txn, 1).unwrap();
    cell.get(&mut txn).unwrap();
    assert_eq!(txn.read_count(), 0);
    assert!(txn.has_pending_write(cell.id()));
}
