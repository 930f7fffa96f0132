//! Locked ledger composition
//!
//! This module provides the [`LockedLedger`], the composition of the lock
//! coordinator with the transaction engine and account service. It is the
//! sole place where concurrent callers touching the same account are
//! serialized end to end: validation, mutation, and failure bookkeeping
//! form one atomic unit from the perspective of other callers on that
//! account.
//!
//! The guarded region is made explicit by
//! [`LockedLedger::with_account_lock`]: the lock key (the account number,
//! selected by the caller-facing operation itself) and the operation body
//! are both visible at the call site. On a domain error the matching FAIL
//! record is written *before* the lock is released, so the audit entry for
//! a failed attempt can never interleave with a concurrent successful
//! attempt on the same account.

use std::sync::Arc;
use std::time::Duration;

use tracing::error;

use crate::store::{AccountStore, TransactionStore, UserStore};
use crate::types::{
    Account, AccountId, AccountSummary, AccountView, LedgerError, TransactionView, UserId,
};

use super::accounts::AccountService;
use super::engine::TransactionEngine;
use super::lock::{LockConfig, LockCoordinator};

/// Ledger-wide configuration
#[derive(Debug, Clone, Default)]
pub struct LedgerConfig {
    /// Lock acquisition bounds
    pub lock: LockConfig,

    /// Optional artificial delay inside the guarded region
    ///
    /// Applied after acquisition and before the body runs. Intended for
    /// widening the critical section when exercising contention in tests;
    /// leave `None` in production.
    pub contention_delay: Option<Duration>,
}

/// Serializes balance operations per account and keeps the audit ledger
///
/// Cloning is cheap; all state is shared. Operations on different accounts
/// proceed independently, while use/cancel attempts on one account are
/// totally ordered, failure records included.
#[derive(Clone)]
pub struct LockedLedger {
    engine: TransactionEngine,
    accounts: AccountService,
    locks: Arc<LockCoordinator>,
    contention_delay: Option<Duration>,
}

impl LockedLedger {
    /// Compose a ledger over the given stores
    pub fn new(
        users: Arc<dyn UserStore>,
        accounts: Arc<dyn AccountStore>,
        transactions: Arc<dyn TransactionStore>,
        config: LedgerConfig,
    ) -> Self {
        Self {
            engine: TransactionEngine::new(users.clone(), accounts.clone(), transactions),
            accounts: AccountService::new(users, accounts),
            locks: Arc::new(LockCoordinator::new(config.lock)),
            contention_delay: config.contention_delay,
        }
    }

    /// Run `body` while holding the lock for `key`
    ///
    /// Acquires the account lock (or fails with `LOCK_TIMEOUT` without ever
    /// running `body`), executes the body, and releases on every exit path.
    /// The body result is returned unchanged.
    ///
    /// # Errors
    ///
    /// `LOCK_TIMEOUT` when the wait bound elapses; otherwise whatever the
    /// body returns.
    pub async fn with_account_lock<T, F>(&self, key: &str, body: F) -> Result<T, LedgerError>
    where
        F: FnOnce() -> Result<T, LedgerError>,
    {
        let handle = self.locks.acquire(key).await?;
        if let Some(delay) = self.contention_delay {
            tokio::time::sleep(delay).await;
        }
        let result = body();
        self.locks.release(handle);
        result
    }

    /// Debit an account balance under its account lock
    ///
    /// On a domain error the matching FAIL record is written while the lock
    /// is still held, then the original error propagates unchanged. Lock
    /// timeouts bypass the bookkeeping entirely: no attempt has started.
    ///
    /// # Errors
    ///
    /// See [`TransactionEngine::use_balance`], plus `LOCK_TIMEOUT`.
    pub async fn use_balance(
        &self,
        user_id: UserId,
        account_number: &str,
        amount: i64,
    ) -> Result<TransactionView, LedgerError> {
        self.with_account_lock(account_number, || {
            self.engine
                .use_balance(user_id, account_number, amount)
                .map_err(|err| {
                    self.record_failed_use(account_number, amount, &err);
                    err
                })
        })
        .await
    }

    /// Reverse an earlier use under the account lock
    ///
    /// Same bookkeeping contract as [`Self::use_balance`].
    ///
    /// # Errors
    ///
    /// See [`TransactionEngine::cancel_balance`], plus `LOCK_TIMEOUT`.
    pub async fn cancel_balance(
        &self,
        transaction_id: &str,
        account_number: &str,
        amount: i64,
    ) -> Result<TransactionView, LedgerError> {
        self.with_account_lock(account_number, || {
            self.engine
                .cancel_balance(transaction_id, account_number, amount)
                .map_err(|err| {
                    self.record_failed_cancel(account_number, amount, &err);
                    err
                })
        })
        .await
    }

    fn record_failed_use(&self, account_number: &str, amount: i64, err: &LedgerError) {
        if !err.is_domain() {
            return;
        }
        error!(account_number, code = err.code(), "failed to use balance");
        if let Err(bookkeeping) = self.engine.save_failed_use_transaction(account_number, amount)
        {
            // The original error still propagates; only the audit entry is lost.
            error!(
                account_number,
                code = bookkeeping.code(),
                "could not record failed use attempt"
            );
        }
    }

    fn record_failed_cancel(&self, account_number: &str, amount: i64, err: &LedgerError) {
        if !err.is_domain() {
            return;
        }
        error!(account_number, code = err.code(), "failed to cancel balance");
        if let Err(bookkeeping) = self
            .engine
            .save_failed_cancel_transaction(account_number, amount)
        {
            error!(
                account_number,
                code = bookkeeping.code(),
                "could not record failed cancel attempt"
            );
        }
    }

    /// Look up a ledger record by correlation id (no lock needed)
    ///
    /// # Errors
    ///
    /// `TRANSACTION_NOT_FOUND` if no record carries the id.
    pub fn query_transaction(&self, transaction_id: &str) -> Result<TransactionView, LedgerError> {
        self.engine.query_transaction(transaction_id)
    }

    /// Open an account; see [`AccountService::create_account`]
    ///
    /// # Errors
    ///
    /// `INVALID_REQUEST`, `USER_NOT_FOUND`, `MAX_ACCOUNTS_PER_USER`.
    pub fn create_account(
        &self,
        user_id: UserId,
        initial_balance: i64,
    ) -> Result<AccountView, LedgerError> {
        self.accounts.create_account(user_id, initial_balance)
    }

    /// Close an account; see [`AccountService::close_account`]
    ///
    /// # Errors
    ///
    /// `USER_NOT_FOUND`, `ACCOUNT_NOT_FOUND`, `USER_ACCOUNT_UNMATCH`,
    /// `ACCOUNT_ALREADY_UNREGISTERED`, `BALANCE_NOT_EMPTY`.
    pub fn close_account(
        &self,
        user_id: UserId,
        account_number: &str,
    ) -> Result<AccountView, LedgerError> {
        self.accounts.close_account(user_id, account_number)
    }

    /// List a user's accounts; see [`AccountService::list_accounts`]
    ///
    /// # Errors
    ///
    /// `USER_NOT_FOUND`.
    pub fn list_accounts(&self, user_id: UserId) -> Result<Vec<AccountSummary>, LedgerError> {
        self.accounts.list_accounts(user_id)
    }

    /// Fetch an account by storage id; see [`AccountService::get_account`]
    ///
    /// # Errors
    ///
    /// `ACCOUNT_NOT_FOUND`.
    pub fn get_account(&self, id: AccountId) -> Result<Account, LedgerError> {
        self.accounts.get_account(id)
    }
}
