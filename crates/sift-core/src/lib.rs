//! Sift Core Library
//!
//! Rule automation for a personal finance ledger:
//! - Domain models for accounts, categories, transactions and rules
//! - Pure rule engine producing per-transaction changesets
//! - Execution orchestrator that scans, applies and summarizes rule runs
//! - Store traits and their SQLite (SQLCipher) implementation
//! - Executor configuration with embedded defaults

pub mod config;
pub mod db;
pub mod error;
pub mod executor;
pub mod models;
pub mod rules;
pub mod store;

/// Fixture builders and a seeded ledger for tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::ExecutorConfig;
pub use db::Database;
pub use error::{Error, Result};
pub use executor::{
    CancelFlag, ExecuteRequest, ExecutionSummary, ModifiedResult, RuleExecutor, SkippedResult,
};
pub use rules::{Changeset, FieldKind, RuleEngine, TransferInfo};
pub use store::{
    AccountStore, CategoryStore, LedgerStore, RuleStore, TransactionChanges, TransactionStore,
};
