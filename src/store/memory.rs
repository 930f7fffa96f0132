//! Thread-safe in-memory store implementations
//!
//! These stores back the test suites and any embedded deployment. They use
//! `DashMap` for fine-grained per-entry locking so unrelated entities never
//! contend, and atomic counters for storage-id assignment.
//!
//! # Consistency
//!
//! Individual reads and writes are atomic, but read-modify-write cycles on
//! the same account are only consistent when serialized by the account
//! lock. That matches the system's shared-resource policy: the store is not
//! the mechanism that orders concurrent writers to one account.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use dashmap::DashMap;

use crate::types::{Account, AccountId, AccountUser, LedgerError, Transaction, UserId};

use super::{AccountStore, TransactionStore, UserStore};

/// In-memory user store
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: DashMap<UserId, AccountUser>,
}

impl InMemoryUserStore {
    /// Create an empty user store
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserStore for InMemoryUserStore {
    fn find_by_id(&self, id: UserId) -> Option<AccountUser> {
        self.users.get(&id).map(|entry| entry.value().clone())
    }

    fn save(&self, mut user: AccountUser) -> AccountUser {
        user.audit.touch(Utc::now());
        self.users.insert(user.id, user.clone());
        user
    }
}

/// In-memory account store
///
/// Accounts are keyed by their unique account number; a secondary index
/// maps storage ids back to numbers for id lookups.
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    by_number: DashMap<String, Account>,
    id_index: DashMap<AccountId, String>,
    next_id: AtomicU64,
}

impl InMemoryAccountStore {
    /// Create an empty account store
    pub fn new() -> Self {
        Self::default()
    }
}

impl AccountStore for InMemoryAccountStore {
    fn find_by_id(&self, id: AccountId) -> Option<Account> {
        let number = self.id_index.get(&id)?.value().clone();
        self.by_number
            .get(&number)
            .map(|entry| entry.value().clone())
    }

    fn find_by_number(&self, account_number: &str) -> Option<Account> {
        self.by_number
            .get(account_number)
            .map(|entry| entry.value().clone())
    }

    fn find_by_user(&self, user_id: UserId) -> Vec<Account> {
        let mut accounts: Vec<Account> = self
            .by_number
            .iter()
            .filter(|entry| entry.value().user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        // Deterministic order for listings
        accounts.sort_by_key(|account| account.id);
        accounts
    }

    fn count_by_user(&self, user_id: UserId) -> usize {
        self.by_number
            .iter()
            .filter(|entry| entry.value().user_id == user_id)
            .count()
    }

    fn highest_account_number(&self) -> Option<String> {
        self.by_number
            .iter()
            .filter_map(|entry| entry.key().parse::<u64>().ok())
            .max()
            .map(|number| number.to_string())
    }

    fn save(&self, mut account: Account) -> Result<Account, LedgerError> {
        account.audit.touch(Utc::now());

        if account.id == 0 {
            // First save: the number must not already be allocated.
            if self.by_number.contains_key(&account.account_number) {
                return Err(LedgerError::invalid_request(format!(
                    "account number {} is already allocated",
                    account.account_number
                )));
            }
            account.id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            self.by_number
                .insert(account.account_number.clone(), account.clone());
            self.id_index.insert(account.id, account.account_number.clone());
        } else {
            self.by_number
                .insert(account.account_number.clone(), account.clone());
        }

        Ok(account)
    }
}

/// In-memory append-only transaction store
#[derive(Debug, Default)]
pub struct InMemoryTransactionStore {
    by_correlation: DashMap<String, Transaction>,
    next_id: AtomicU64,
}

impl InMemoryTransactionStore {
    /// Create an empty transaction store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of ledger records held
    pub fn len(&self) -> usize {
        self.by_correlation.len()
    }

    /// Whether the ledger is empty
    pub fn is_empty(&self) -> bool {
        self.by_correlation.is_empty()
    }

    /// All records in storage-id order
    ///
    /// Listing is not part of the store contract; it exists so tests can
    /// assert over the full ledger.
    pub fn all(&self) -> Vec<Transaction> {
        let mut records: Vec<Transaction> = self
            .by_correlation
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by_key(|record| record.id);
        records
    }
}

impl TransactionStore for InMemoryTransactionStore {
    fn find_by_transaction_id(&self, transaction_id: &str) -> Option<Transaction> {
        self.by_correlation
            .get(transaction_id)
            .map(|entry| entry.value().clone())
    }

    fn save(&self, mut transaction: Transaction) -> Transaction {
        transaction.id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        transaction.audit.touch(Utc::now());
        self.by_correlation
            .insert(transaction.transaction_id.clone(), transaction.clone());
        transaction
    }
}
