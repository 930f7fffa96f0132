//! Account lifecycle service
//!
//! This module provides the [`AccountService`] for opening, closing, and
//! querying accounts, including the account status state machine: accounts
//! start `Active` and can only ever move to `Unregistered`.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::store::{AccountStore, UserStore};
use crate::types::{
    Account, AccountId, AccountSummary, AccountUser, AccountView, LedgerError, UserId,
};

/// Account number handed to the very first account in the system
pub const ACCOUNT_NUMBER_SEED: &str = "1000000000";

/// Maximum accounts (any status) a single user may hold
pub const MAX_ACCOUNTS_PER_USER: usize = 10;

/// Opens, closes, and lists accounts
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserStore>,
    accounts: Arc<dyn AccountStore>,
}

impl AccountService {
    /// Create a service over the given stores
    pub fn new(users: Arc<dyn UserStore>, accounts: Arc<dyn AccountStore>) -> Self {
        Self { users, accounts }
    }

    /// Open a new account for a user
    ///
    /// Allocates the next sequential account number: the numerically
    /// highest existing number plus one, or the fixed seed when no account
    /// exists yet. The account starts `Active` with the given balance.
    ///
    /// # Errors
    ///
    /// * `INVALID_REQUEST` for a negative initial balance
    /// * `USER_NOT_FOUND` if the user does not exist
    /// * `MAX_ACCOUNTS_PER_USER` if the user already holds the cap
    pub fn create_account(
        &self,
        user_id: UserId,
        initial_balance: i64,
    ) -> Result<AccountView, LedgerError> {
        if initial_balance < 0 {
            return Err(LedgerError::invalid_request(
                "initial balance must not be negative",
            ));
        }

        let user = self.get_user(user_id)?;
        self.validate_create_account(&user)?;

        let account_number = self.next_account_number()?;
        let account = self
            .accounts
            .save(Account::open(user.id, account_number, initial_balance, Utc::now()))?;

        info!(
            account_number = %account.account_number,
            user_id,
            balance = account.balance,
            "account opened"
        );

        Ok(AccountView::from_account(&account))
    }

    fn validate_create_account(&self, user: &AccountUser) -> Result<(), LedgerError> {
        if self.accounts.count_by_user(user.id) >= MAX_ACCOUNTS_PER_USER {
            return Err(LedgerError::max_accounts_per_user(user.id));
        }
        Ok(())
    }

    fn next_account_number(&self) -> Result<String, LedgerError> {
        match self.accounts.highest_account_number() {
            Some(highest) => {
                let number: u64 = highest.parse().map_err(|_| {
                    LedgerError::internal(format!("non-numeric account number {highest} in store"))
                })?;
                Ok((number + 1).to_string())
            }
            None => Ok(ACCOUNT_NUMBER_SEED.to_string()),
        }
    }

    /// Close an account
    ///
    /// The transition `Active -> Unregistered` requires that the requesting
    /// user owns the account, the account is not already unregistered, and
    /// the balance is zero. Nothing leaves the `Unregistered` state.
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
        let user = self.get_user(user_id)?;

        let mut account = self
            .accounts
            .find_by_number(account_number)
            .ok_or_else(|| LedgerError::account_not_found(account_number))?;

        Self::validate_close_account(&user, &account)?;

        account.unregister(Utc::now());
        let account = self.accounts.save(account)?;

        info!(account_number = %account.account_number, user_id, "account closed");

        Ok(AccountView::from_account(&account))
    }

    fn validate_close_account(user: &AccountUser, account: &Account) -> Result<(), LedgerError> {
        if user.id != account.user_id {
            return Err(LedgerError::user_account_unmatch(
                user.id,
                &account.account_number,
            ));
        }
        if !account.is_active() {
            return Err(LedgerError::account_already_unregistered(
                &account.account_number,
            ));
        }
        if account.balance > 0 {
            return Err(LedgerError::balance_not_empty(&account.account_number));
        }
        Ok(())
    }

    /// List a user's accounts as number/balance pairs
    ///
    /// # Errors
    ///
    /// `USER_NOT_FOUND` if the user does not exist.
    pub fn list_accounts(&self, user_id: UserId) -> Result<Vec<AccountSummary>, LedgerError> {
        let user = self.get_user(user_id)?;

        Ok(self
            .accounts
            .find_by_user(user.id)
            .iter()
            .map(AccountSummary::from_account)
            .collect())
    }

    /// Fetch a single account by storage id
    ///
    /// # Errors
    ///
    /// `ACCOUNT_NOT_FOUND` if no account has the id.
    pub fn get_account(&self, id: AccountId) -> Result<Account, LedgerError> {
        self.accounts
            .find_by_id(id)
            .ok_or_else(|| LedgerError::account_not_found(id.to_string()))
    }

    fn get_user(&self, user_id: UserId) -> Result<AccountUser, LedgerError> {
        self.users
            .find_by_id(user_id)
            .ok_or_else(|| LedgerError::user_not_found(user_id))
    }
}
