//! Immutable boundary views
//!
//! Entities never cross the service boundary directly; callers receive
//! these snapshot views instead. Field names serialize in camelCase to
//! match the external API contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::account::Account;
use super::transaction::{Transaction, TransactionResult, TransactionType};
use super::user::UserId;

/// Result view of a use/cancel attempt or a transaction lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
    /// Account number the attempt targeted
    pub account_number: String,
    /// Kind of operation
    pub transaction_type: TransactionType,
    /// Outcome of the attempt
    pub transaction_result: TransactionResult,
    /// Correlation id of the record
    pub transaction_id: String,
    /// Amount in minor units
    pub amount: i64,
    /// When the attempt happened
    pub transacted_at: DateTime<Utc>,
}

impl TransactionView {
    /// Build a view from a persisted ledger record
    pub fn from_transaction(transaction: &Transaction) -> Self {
        TransactionView {
            account_number: transaction.account_number.clone(),
            transaction_type: transaction.transaction_type,
            transaction_result: transaction.result,
            transaction_id: transaction.transaction_id.clone(),
            amount: transaction.amount,
            transacted_at: transaction.transacted_at,
        }
    }
}

/// Full account view returned from create/close operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    /// The owning user
    pub user_id: UserId,
    /// The account number
    pub account_number: String,
    /// Current balance in minor units
    pub balance: i64,
    /// When the account was opened
    pub registered_at: DateTime<Utc>,
    /// When the account was closed, if it has been
    pub unregistered_at: Option<DateTime<Utc>>,
}

impl AccountView {
    /// Build a view from an account entity
    pub fn from_account(account: &Account) -> Self {
        AccountView {
            user_id: account.user_id,
            account_number: account.account_number.clone(),
            balance: account.balance,
            registered_at: account.registered_at,
            unregistered_at: account.unregistered_at,
        }
    }
}

/// Condensed view used for account listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    /// The account number
    pub account_number: String,
    /// Current balance in minor units
    pub balance: i64,
}

impl AccountSummary {
    /// Build a summary from an account entity
    pub fn from_account(account: &Account) -> Self {
        AccountSummary {
            account_number: account.account_number.clone(),
            balance: account.balance,
        }
    }
}
