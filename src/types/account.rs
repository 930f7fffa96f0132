//! Account-related types for the account ledger
//!
//! This module defines the Account entity, its lifecycle states, and the
//! balance operations that preserve the non-negative balance invariant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::LedgerError;
use super::user::{AuditStamps, UserId};

/// Account storage identifier
///
/// Zero until the account is first saved; stores assign the real id.
pub type AccountId = u64;

/// Account lifecycle state
///
/// Accounts start `Active` and can only move to `Unregistered`, which is
/// terminal. No transition leaves `Unregistered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    /// Open for balance operations
    Active,
    /// Closed; terminal state
    Unregistered,
}

/// A monetary account owned by a single user
///
/// The balance is held in currency minor units and is never negative.
/// The account number is immutable and globally unique, and doubles as
/// the lock key that serializes all balance operations on this account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Storage identifier (assigned on first save)
    pub id: AccountId,

    /// The owning user
    pub user_id: UserId,

    /// Immutable, globally unique account number
    pub account_number: String,

    /// Lifecycle state
    pub status: AccountStatus,

    /// Current balance in currency minor units, always >= 0
    pub balance: i64,

    /// When the account was opened
    pub registered_at: DateTime<Utc>,

    /// When the account was closed, if it has been
    pub unregistered_at: Option<DateTime<Utc>>,

    /// Audit fields
    pub audit: AuditStamps,
}

impl Account {
    /// Open a new active account
    ///
    /// The storage id stays zero until the store assigns one on save.
    ///
    /// # Arguments
    ///
    /// * `user_id` - The owning user
    /// * `account_number` - The allocated, globally unique account number
    /// * `initial_balance` - Starting balance in minor units (non-negative)
    /// * `now` - Registration timestamp
    pub fn open(
        user_id: UserId,
        account_number: impl Into<String>,
        initial_balance: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Account {
            id: 0,
            user_id,
            account_number: account_number.into(),
            status: AccountStatus::Active,
            balance: initial_balance,
            registered_at: now,
            unregistered_at: None,
            audit: AuditStamps::new(now),
        }
    }

    /// Whether the account accepts balance operations
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    /// Debit the balance
    ///
    /// The balance is only mutated when the full amount is covered, which
    /// keeps the non-negative invariant unconditionally.
    ///
    /// # Errors
    ///
    /// Returns `AmountExceedBalance` if `amount` is greater than the current
    /// balance; the balance is left unchanged.
    pub fn use_balance(&mut self, amount: i64) -> Result<(), LedgerError> {
        if amount > self.balance {
            return Err(LedgerError::amount_exceed_balance(
                &self.account_number,
                self.balance,
                amount,
            ));
        }
        self.balance -= amount;
        Ok(())
    }

    /// Credit the balance
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` for a non-positive amount and `Internal`
    /// if the credit would overflow the balance.
    pub fn cancel_balance(&mut self, amount: i64) -> Result<(), LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::invalid_request("cancel amount must be positive"));
        }
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::internal("balance overflow on cancel"))?;
        Ok(())
    }

    /// Transition the account to its terminal state
    ///
    /// Preconditions (ownership, current status, empty balance) are checked
    /// by the account service before this is called.
    pub fn unregister(&mut self, now: DateTime<Utc>) {
        self.status = AccountStatus::Unregistered;
        self.unregistered_at = Some(now);
    }
}
