//! Core business logic components
//!
//! This module contains the lock coordinator, the balance transaction
//! engine, the account lifecycle service, and the locked ledger that
//! composes them.

pub mod accounts;
pub mod engine;
pub mod ledger;
pub mod lock;

pub use accounts::{AccountService, ACCOUNT_NUMBER_SEED, MAX_ACCOUNTS_PER_USER};
pub use engine::TransactionEngine;
pub use ledger::{LedgerConfig, LockedLedger};
pub use lock::{LockConfig, LockCoordinator, LockHandle};
