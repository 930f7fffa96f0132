//! Persistence abstractions for the account ledger
//!
//! This module defines the store traits the engine and services depend on.
//! Lookups return `Option`; the callers map absence to the matching
//! not-found domain error. Implementations must be safe to share across
//! concurrent tasks, but they are *not* relied upon to serialize writers
//! to the same account: the application-level account lock is the sole
//! correctness mechanism for that.

pub mod memory;

use crate::types::{Account, AccountId, AccountUser, LedgerError, Transaction, UserId};

pub use memory::{InMemoryAccountStore, InMemoryTransactionStore, InMemoryUserStore};

/// Store for users
pub trait UserStore: Send + Sync {
    /// Look up a user by storage id
    fn find_by_id(&self, id: UserId) -> Option<AccountUser>;

    /// Persist a user, returning the stored state
    fn save(&self, user: AccountUser) -> AccountUser;
}

/// Store for accounts
///
/// Accounts are keyed both by storage id and by their globally unique
/// account number.
pub trait AccountStore: Send + Sync {
    /// Look up an account by storage id
    fn find_by_id(&self, id: AccountId) -> Option<Account>;

    /// Look up an account by its account number
    fn find_by_number(&self, account_number: &str) -> Option<Account>;

    /// All accounts owned by a user, ordered by storage id
    fn find_by_user(&self, user_id: UserId) -> Vec<Account>;

    /// Number of accounts (any status) owned by a user
    fn count_by_user(&self, user_id: UserId) -> usize;

    /// The numerically highest account number currently allocated
    fn highest_account_number(&self) -> Option<String>;

    /// Persist an account, assigning a storage id on first save
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` when a first save would reuse an already
    /// allocated account number, and `Internal` for backend failures.
    fn save(&self, account: Account) -> Result<Account, LedgerError>;
}

/// Store for the append-only transaction ledger
pub trait TransactionStore: Send + Sync {
    /// Look up a record by its correlation id
    fn find_by_transaction_id(&self, transaction_id: &str) -> Option<Transaction>;

    /// Append a record, assigning its storage id
    fn save(&self, transaction: Transaction) -> Transaction;
}
