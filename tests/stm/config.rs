//! Configuration Tests
//!
//! `stratastm.toml` drives executor behavior.

use crate::common::*;
use std::time::Duration;
use stratastm::CONFIG_FILE_NAME;

#[test]
fn executor_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(
        &path,
        "lock_timeout_ms = 20\n\n[retry]\nmax_attempts = 3\njitter = false\n",
    )
    .unwrap();

    let config = StmConfig::from_file(&path).unwrap();
    let executor = TransactionExecutor::from_config(&config).unwrap();
    assert_eq!(executor.config().lock_timeout(), Duration::from_millis(20));
    assert_eq!(executor.config().retry.max_attempts, Some(3));

    let mut runs = 0;
    let err = executor
        .execute(|txn| -> StmResult<()> {
            runs += 1;
            Err(StmError::Aborted { txn_id: txn.id() })
        })
        .unwrap_err();
    assert_eq!(runs, 3);
    assert!(matches!(err, StmError::RetriesExhausted { attempts: 3, .. }));
}

#[test]
fn default_file_is_written_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);

    StmConfig::write_default_if_missing(&path).unwrap();
    let config = StmConfig::from_file(&path).unwrap();
    assert_eq!(config, StmConfig::default());
    assert!(TransactionExecutor::from_config(&config).is_ok());
}

#[test]
fn invalid_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&path, "[retry]\nbase_delay_us = 100\nmax_delay_us = 1\n").unwrap();

    let err = StmConfig::from_file(&path).unwrap_err();
    assert!(matches!(err, StmError::Config(_)));
}
