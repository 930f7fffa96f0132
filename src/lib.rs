//! Account Ledger Library
//! # Overview
//!
//! This library manages monetary accounts and records debit ("use") and
//! credit ("cancel") operations against them, guaranteeing that a balance
//! never goes negative and that concurrent operations on the same account
//! cannot race.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Account, Transaction, AccountUser, views, errors)
//! - [`store`] - Persistence abstractions and in-memory implementations
//! - [`core`] - Business logic components:
//!   - [`core::lock`] - Per-account mutual exclusion with bounded wait
//!   - [`core::engine`] - Balance validation, mutation, and audit records
//!   - [`core::accounts`] - Account lifecycle (open, close, list)
//!   - [`core::ledger`] - The locked composition of all of the above
//!
//! # Serialization Guarantee
//!
//! For a fixed account number, all use/cancel attempts are totally ordered:
//! one attempt fully completes (success or failure record written) before
//! the next begins. The application-level account lock is the sole
//! correctness mechanism; the store is never relied upon to serialize
//! concurrent writers to the same account.
//!
//! # Audit Ledger
//!
//! Every use/cancel attempt, successful or failed, appends exactly one
//! immutable transaction record carrying the balance snapshot observed at
//! that point, and failed attempts are recorded while the account lock is
//! still held.

// Module declarations
pub mod core;
pub mod store;
pub mod types;

pub use crate::core::{
    AccountService, LedgerConfig, LockConfig, LockCoordinator, LockHandle, LockedLedger,
    TransactionEngine, ACCOUNT_NUMBER_SEED, MAX_ACCOUNTS_PER_USER,
};
pub use store::{
    AccountStore, InMemoryAccountStore, InMemoryTransactionStore, InMemoryUserStore,
    TransactionStore, UserStore,
};
pub use types::{
    Account, AccountId, AccountStatus, AccountSummary, AccountUser, AccountView, LedgerError,
    Transaction, TransactionResult, TransactionType, TransactionView, UserId,
};
