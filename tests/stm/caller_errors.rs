//! Non-Retry on Caller Error Tests

use crate::common::*;
use std::fmt;

#[derive(Debug)]
struct InsufficientFunds {
    wanted: i64,
    available: i64,
}

impl fmt::Display for InsufficientFunds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wanted {} but only {} available", self.wanted, self.available)
    }
}

impl std::error::Error for InsufficientFunds {}

fn withdraw(executor: &TransactionExecutor, account: &TCell<i64>, amount: i64) -> StmResult<i64> {
    executor.execute(|txn| {
        let balance = account.get(txn)?;
        if balance < amount {
            return Err(StmError::action(InsufficientFunds {
                wanted: amount,
                available: balance,
            }));
        }
        account.set(txn, balance - amount)?;
        Ok(balance - amount)
    })
}

#[test]
fn caller_error_propagates_on_first_attempt() {
    let executor = TransactionExecutor::new();
    let account = TCell::new(30i64);
    let other = TCell::new(0i64);
    let mut runs = 0;

    let err = executor
        .execute(|txn| -> StmResult<()> {
            runs += 1;
            other.set(txn, 99)?;
            account.set(txn, 0)?;
            Err(StmError::action(InsufficientFunds {
                wanted: 50,
                available: 30,
            }))
        })
        .unwrap_err();

    assert_eq!(runs, 1);
    let inner = err.action_ref::<InsufficientFunds>().unwrap();
    assert_eq!(inner.wanted, 50);
    assert_eq!(account.load(), 30);
    assert_eq!(other.load(), 0);
    assert_eq!(account.version(), Version::INITIAL);
    assert_eq!(executor.metrics().total_conflicts, 0);
}

#[test]
fn domain_error_after_successful_withdrawals() {
    let executor = TransactionExecutor::new();
    let account = TCell::new(100i64);

    assert_eq!(withdraw(&executor, &account, 60).unwrap(), 40);
    let err = withdraw(&executor, &account, 60).unwrap_err();
    assert!(err.to_string().contains("wanted 60"));
    assert_eq!(account.load(), 40);
}

#[test]
fn explicit_cancellation_is_not_retried() {
    let executor = bounded_executor(10);
    let cell = TCell::new(1);
    let mut runs = 0;

    let err = executor
        .execute(|txn| -> StmResult<()> {
            runs += 1;
            cell.set(txn, 2)?;
            Err(StmError::cancelled("changed my mind"))
        })
        .unwrap_err();

    assert_eq!(runs, 1);
    assert!(matches!(err, StmError::Cancelled { ref reason } if reason == "changed my mind"));
    assert_eq!(cell.load(), 1);
}

#[test]
fn invalid_state_from_action_propagates() {
    let executor = bounded_executor(10);
    let mut runs = 0;

    let err = executor
        .execute(|txn| -> StmResult<()> {
            runs += 1;
            Err(StmError::InvalidState(format!("{} refused", txn.id())))
        })
        .unwrap_err();

    assert_eq!(runs, 1);
    assert!(matches!(err, StmError::InvalidState(_)));
}
