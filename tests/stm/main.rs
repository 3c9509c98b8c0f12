//! STM Integration Tests
//!
//! End-to-end guarantees of the executor over shared cells.

#[path = "../common/mod.rs"]
mod common;

mod atomicity;
mod caller_errors;
mod config;
mod read_your_writes;
mod version_monotonicity;
