//! Error types for the account ledger
//!
//! This module defines the closed error enum used throughout the system.
//! Every variant carries a stable error code (see [`LedgerError::code`])
//! that is surfaced unchanged at the service boundary.
//!
//! # Error Categories
//!
//! - **Domain errors**: validation failures and missing referenced entities.
//!   Expected, never retried automatically, and always followed by a failure
//!   record when raised from a balance operation.
//! - **Lock timeout**: infrastructure-level, raised before any business
//!   attempt has started. Safe to retry, never produces a failure record.
//! - **Internal errors**: unexpected conditions. No partial state is assumed
//!   consistent.

use thiserror::Error;

use super::user::UserId;

/// Main error type for the account ledger
///
/// This enum represents all failures a caller can observe. Each variant
/// includes relevant context to help diagnose and resolve the issue, and
/// maps to exactly one stable code via [`LedgerError::code`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The referenced user does not exist
    #[error("user {user_id} not found")]
    UserNotFound {
        /// The user id that was not found
        user_id: UserId,
    },

    /// The referenced account does not exist
    #[error("account {account} not found")]
    AccountNotFound {
        /// The account number (or storage id) that was not found
        account: String,
    },

    /// The requesting user does not own the account
    #[error("user {user_id} does not own account {account_number}")]
    UserAccountUnmatch {
        /// The requesting user id
        user_id: UserId,
        /// The account number the request targeted
        account_number: String,
    },

    /// The account has already been unregistered
    ///
    /// Unregistered is a terminal state; no balance operation may target
    /// the account afterwards.
    #[error("account {account_number} is already unregistered")]
    AccountAlreadyUnregistered {
        /// The unregistered account number
        account_number: String,
    },

    /// The debit amount exceeds the current balance
    ///
    /// The balance is left unchanged when this is raised.
    #[error("amount {requested} exceeds balance {balance} on account {account_number}")]
    AmountExceedBalance {
        /// The account number
        account_number: String,
        /// The balance at the time of the attempt
        balance: i64,
        /// The requested debit amount
        requested: i64,
    },

    /// The referenced transaction does not exist
    #[error("transaction {transaction_id} not found")]
    TransactionNotFound {
        /// The correlation id that was not found
        transaction_id: String,
    },

    /// The transaction does not belong to the given account
    #[error("transaction {transaction_id} does not belong to account {account_number}")]
    TransactionAccountUnmatch {
        /// The correlation id of the original transaction
        transaction_id: String,
        /// The account number the cancel targeted
        account_number: String,
    },

    /// A cancel must match the original amount exactly
    ///
    /// Partial cancellation is not supported.
    #[error("cancel amount {requested} must equal original amount {original} of transaction {transaction_id}")]
    CancelMustBeFull {
        /// The correlation id of the original transaction
        transaction_id: String,
        /// The amount of the original transaction
        original: i64,
        /// The requested cancel amount
        requested: i64,
    },

    /// The original transaction is outside the retention window
    ///
    /// Transactions are cancellable for one year from their timestamp.
    #[error("transaction {transaction_id} is too old to cancel")]
    TooOldToCancel {
        /// The correlation id of the original transaction
        transaction_id: String,
    },

    /// The user already holds the maximum number of accounts
    #[error("user {user_id} already has the maximum number of accounts")]
    MaxAccountsPerUser {
        /// The requesting user id
        user_id: UserId,
    },

    /// The account still has a balance and cannot be closed
    #[error("account {account_number} still has a balance")]
    BalanceNotEmpty {
        /// The account number
        account_number: String,
    },

    /// The account lock could not be acquired within the wait bound
    ///
    /// No business attempt has started when this is raised, so the caller
    /// may retry and no failure record is written.
    #[error("timed out waiting for lock on account {key}")]
    LockTimeout {
        /// The lock key (account number) that timed out
        key: String,
    },

    /// The request itself is malformed (e.g. non-positive amount)
    #[error("invalid request: {message}")]
    InvalidRequest {
        /// Description of the violation
        message: String,
    },

    /// An unexpected internal failure
    #[error("internal error: {message}")]
    Internal {
        /// Description of the failure
        message: String,
    },
}

impl LedgerError {
    /// The stable code surfaced at the service boundary
    ///
    /// Codes are part of the external contract and never change meaning.
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::UserNotFound { .. } => "USER_NOT_FOUND",
            LedgerError::AccountNotFound { .. } => "ACCOUNT_NOT_FOUND",
            LedgerError::UserAccountUnmatch { .. } => "USER_ACCOUNT_UNMATCH",
            LedgerError::AccountAlreadyUnregistered { .. } => "ACCOUNT_ALREADY_UNREGISTERED",
            LedgerError::AmountExceedBalance { .. } => "AMOUNT_EXCEED_BALANCE",
            LedgerError::TransactionNotFound { .. } => "TRANSACTION_NOT_FOUND",
            LedgerError::TransactionAccountUnmatch { .. } => "TRANSACTION_ACCOUNT_UNMATCH",
            LedgerError::CancelMustBeFull { .. } => "CANCEL_MUST_BE_FULL",
            LedgerError::TooOldToCancel { .. } => "TOO_OLD_TO_CANCEL",
            LedgerError::MaxAccountsPerUser { .. } => "MAX_ACCOUNTS_PER_USER",
            LedgerError::BalanceNotEmpty { .. } => "BALANCE_NOT_EMPTY",
            LedgerError::LockTimeout { .. } => "LOCK_TIMEOUT",
            LedgerError::InvalidRequest { .. } => "INVALID_REQUEST",
            LedgerError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Whether this is a domain (business) error
    ///
    /// Domain errors are the only errors that produce a failure record for
    /// balance operations. Lock timeouts happen before the attempt starts
    /// and internal errors leave no state worth auditing.
    pub fn is_domain(&self) -> bool {
        !matches!(
            self,
            LedgerError::LockTimeout { .. } | LedgerError::Internal { .. }
        )
    }
}

// Helper functions for creating common errors

impl LedgerError {
    /// Create a UserNotFound error
    pub fn user_not_found(user_id: UserId) -> Self {
        LedgerError::UserNotFound { user_id }
    }

    /// Create an AccountNotFound error
    pub fn account_not_found(account: impl Into<String>) -> Self {
        LedgerError::AccountNotFound {
            account: account.into(),
        }
    }

    /// Create a UserAccountUnmatch error
    pub fn user_account_unmatch(user_id: UserId, account_number: &str) -> Self {
        LedgerError::UserAccountUnmatch {
            user_id,
            account_number: account_number.to_string(),
        }
    }

    /// Create an AccountAlreadyUnregistered error
    pub fn account_already_unregistered(account_number: &str) -> Self {
        LedgerError::AccountAlreadyUnregistered {
            account_number: account_number.to_string(),
        }
    }

    /// Create an AmountExceedBalance error
    pub fn amount_exceed_balance(account_number: &str, balance: i64, requested: i64) -> Self {
        LedgerError::AmountExceedBalance {
            account_number: account_number.to_string(),
            balance,
            requested,
        }
    }

    /// Create a TransactionNotFound error
    pub fn transaction_not_found(transaction_id: &str) -> Self {
        LedgerError::TransactionNotFound {
            transaction_id: transaction_id.to_string(),
        }
    }

    /// Create a TransactionAccountUnmatch error
    pub fn transaction_account_unmatch(transaction_id: &str, account_number: &str) -> Self {
        LedgerError::TransactionAccountUnmatch {
            transaction_id: transaction_id.to_string(),
            account_number: account_number.to_string(),
        }
    }

    /// Create a CancelMustBeFull error
    pub fn cancel_must_be_full(transaction_id: &str, original: i64, requested: i64) -> Self {
        LedgerError::CancelMustBeFull {
            transaction_id: transaction_id.to_string(),
            original,
            requested,
        }
    }

    /// Create a TooOldToCancel error
    pub fn too_old_to_cancel(transaction_id: &str) -> Self {
        LedgerError::TooOldToCancel {
            transaction_id: transaction_id.to_string(),
        }
    }

    /// Create a MaxAccountsPerUser error
    pub fn max_accounts_per_user(user_id: UserId) -> Self {
        LedgerError::MaxAccountsPerUser { user_id }
    }

    /// Create a BalanceNotEmpty error
    pub fn balance_not_empty(account_number: &str) -> Self {
        LedgerError::BalanceNotEmpty {
            account_number: account_number.to_string(),
        }
    }

    /// Create a LockTimeout error
    pub fn lock_timeout(key: &str) -> Self {
        LedgerError::LockTimeout {
            key: key.to_string(),
        }
    }

    /// Create an InvalidRequest error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        LedgerError::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        LedgerError::Internal {
            message: message.into(),
        }
    }
}
