//! Core data types for the account ledger
//!
//! This module contains the domain entities (accounts, users, transactions),
//! the closed error enum, and the immutable views returned at the service
//! boundary.

pub mod account;
pub mod error;
pub mod transaction;
pub mod user;
pub mod view;

pub use account::{Account, AccountId, AccountStatus};
pub use error::LedgerError;
pub use transaction::{Transaction, TransactionResult, TransactionType};
pub use user::{AccountUser, AuditStamps, UserId};
pub use view::{AccountSummary, AccountView, TransactionView};
