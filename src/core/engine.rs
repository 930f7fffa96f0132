//! Balance transaction engine
//!
//! This module provides the [`TransactionEngine`] that validates business
//! preconditions, mutates account balances, and appends ledger records for
//! every attempt, successful or failed.
//!
//! The engine enforces business rules such as:
//! - Ownership and lifecycle checks before any debit
//! - Non-negative balances (a debit never exceeds the balance)
//! - Full-amount cancellation within the one-year retention window
//! - Exactly one ledger record per attempt
//!
//! The engine itself performs no locking: callers serialize same-account
//! operations through the lock coordinator (see
//! [`LockedLedger`](crate::core::ledger::LockedLedger)).

use std::sync::Arc;

use chrono::{DateTime, Months, Utc};
use tracing::info;

use crate::store::{AccountStore, TransactionStore, UserStore};
use crate::types::{
    Account, AccountUser, LedgerError, Transaction, TransactionResult, TransactionType,
    TransactionView, UserId,
};

/// Validates preconditions, mutates balances, and appends ledger records
///
/// Stores are shared trait objects so the engine composes with any
/// persistence backend and can be cloned cheaply into concurrent tasks.
#[derive(Clone)]
pub struct TransactionEngine {
    users: Arc<dyn UserStore>,
    accounts: Arc<dyn AccountStore>,
    transactions: Arc<dyn TransactionStore>,
}

impl TransactionEngine {
    /// Create an engine over the given stores
    pub fn new(
        users: Arc<dyn UserStore>,
        accounts: Arc<dyn AccountStore>,
        transactions: Arc<dyn TransactionStore>,
    ) -> Self {
        Self {
            users,
            accounts,
            transactions,
        }
    }

    /// Debit an account balance
    ///
    /// Precondition checks run in a fixed order, each a hard gate: user
    /// exists, account exists, the user owns the account, the account is
    /// active, and the amount is covered by the balance. The balance is
    /// mutated only when every check passes, and the attempt is recorded
    /// with the post-debit balance snapshot.
    ///
    /// # Arguments
    ///
    /// * `user_id` - The requesting user
    /// * `account_number` - The account to debit
    /// * `amount` - Debit amount in minor units, positive
    ///
    /// # Errors
    ///
    /// `INVALID_REQUEST`, `USER_NOT_FOUND`, `ACCOUNT_NOT_FOUND`,
    /// `USER_ACCOUNT_UNMATCH`, `ACCOUNT_ALREADY_UNREGISTERED`,
    /// `AMOUNT_EXCEED_BALANCE`, in that order of evaluation.
    pub fn use_balance(
        &self,
        user_id: UserId,
        account_number: &str,
        amount: i64,
    ) -> Result<TransactionView, LedgerError> {
        ensure_positive_amount(amount)?;

        let user = self
            .users
            .find_by_id(user_id)
            .ok_or_else(|| LedgerError::user_not_found(user_id))?;

        let mut account = self
            .accounts
            .find_by_number(account_number)
            .ok_or_else(|| LedgerError::account_not_found(account_number))?;

        Self::validate_use_balance(&user, &account)?;

        account.use_balance(amount)?;
        let account = self.accounts.save(account)?;

        info!(
            account_number = %account.account_number,
            amount,
            balance = account.balance,
            "balance used"
        );

        let transaction = self.record_transaction(
            TransactionType::Use,
            TransactionResult::Success,
            amount,
            &account,
        );
        Ok(TransactionView::from_transaction(&transaction))
    }

    fn validate_use_balance(user: &AccountUser, account: &Account) -> Result<(), LedgerError> {
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
        Ok(())
    }

    /// Credit an account balance by reversing an earlier transaction
    ///
    /// The original transaction must belong to the given account, the
    /// cancel amount must equal the original amount exactly (partial
    /// cancellation is unsupported), and the original must be younger than
    /// the one-year retention window.
    ///
    /// # Arguments
    ///
    /// * `transaction_id` - Correlation id of the transaction to reverse
    /// * `account_number` - The account to credit
    /// * `amount` - Cancel amount in minor units, positive
    ///
    /// # Errors
    ///
    /// `INVALID_REQUEST`, `TRANSACTION_NOT_FOUND`, `ACCOUNT_NOT_FOUND`,
    /// `TRANSACTION_ACCOUNT_UNMATCH`, `CANCEL_MUST_BE_FULL`,
    /// `TOO_OLD_TO_CANCEL`, in that order of evaluation.
    pub fn cancel_balance(
        &self,
        transaction_id: &str,
        account_number: &str,
        amount: i64,
    ) -> Result<TransactionView, LedgerError> {
        ensure_positive_amount(amount)?;

        let original = self
            .transactions
            .find_by_transaction_id(transaction_id)
            .ok_or_else(|| LedgerError::transaction_not_found(transaction_id))?;

        let mut account = self
            .accounts
            .find_by_number(account_number)
            .ok_or_else(|| LedgerError::account_not_found(account_number))?;

        Self::validate_cancel_balance(&original, &account, amount, Utc::now())?;

        account.cancel_balance(amount)?;
        let account = self.accounts.save(account)?;

        info!(
            account_number = %account.account_number,
            transaction_id = %original.transaction_id,
            amount,
            balance = account.balance,
            "balance use cancelled"
        );

        let transaction = self.record_transaction(
            TransactionType::Cancel,
            TransactionResult::Success,
            amount,
            &account,
        );
        Ok(TransactionView::from_transaction(&transaction))
    }

    fn validate_cancel_balance(
        original: &Transaction,
        account: &Account,
        amount: i64,
        now: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        if original.account_id != account.id {
            return Err(LedgerError::transaction_account_unmatch(
                &original.transaction_id,
                &account.account_number,
            ));
        }
        if original.amount != amount {
            return Err(LedgerError::cancel_must_be_full(
                &original.transaction_id,
                original.amount,
                amount,
            ));
        }

        let cutoff = now
            .checked_sub_months(Months::new(12))
            .ok_or_else(|| LedgerError::internal("retention cutoff out of range"))?;
        if original.transacted_at < cutoff {
            return Err(LedgerError::too_old_to_cancel(&original.transaction_id));
        }
        Ok(())
    }

    /// Look up a ledger record by its correlation id
    ///
    /// Failed attempts are returned as faithfully as successful ones.
    ///
    /// # Errors
    ///
    /// `TRANSACTION_NOT_FOUND` if no record carries the id.
    pub fn query_transaction(&self, transaction_id: &str) -> Result<TransactionView, LedgerError> {
        self.transactions
            .find_by_transaction_id(transaction_id)
            .map(|transaction| TransactionView::from_transaction(&transaction))
            .ok_or_else(|| LedgerError::transaction_not_found(transaction_id))
    }

    /// Record a failed debit attempt
    ///
    /// Appends a FAIL ledger record carrying the current, unchanged balance
    /// as its snapshot. Callers invoke this while still holding the account
    /// lock so the record is ordered against concurrent attempts.
    ///
    /// # Errors
    ///
    /// `ACCOUNT_NOT_FOUND` if the account does not exist (nothing can be
    /// recorded against a missing account).
    pub fn save_failed_use_transaction(
        &self,
        account_number: &str,
        amount: i64,
    ) -> Result<(), LedgerError> {
        self.save_failed_transaction(TransactionType::Use, account_number, amount)
    }

    /// Record a failed cancel attempt
    ///
    /// Same contract as [`Self::save_failed_use_transaction`].
    pub fn save_failed_cancel_transaction(
        &self,
        account_number: &str,
        amount: i64,
    ) -> Result<(), LedgerError> {
        self.save_failed_transaction(TransactionType::Cancel, account_number, amount)
    }

    fn save_failed_transaction(
        &self,
        transaction_type: TransactionType,
        account_number: &str,
        amount: i64,
    ) -> Result<(), LedgerError> {
        let account = self
            .accounts
            .find_by_number(account_number)
            .ok_or_else(|| LedgerError::account_not_found(account_number))?;

        self.record_transaction(transaction_type, TransactionResult::Fail, amount, &account);
        Ok(())
    }

    /// Append one ledger record for an attempt
    ///
    /// The snapshot is the account balance as passed in: post-mutation for
    /// successes, untouched for failures.
    fn record_transaction(
        &self,
        transaction_type: TransactionType,
        result: TransactionResult,
        amount: i64,
        account: &Account,
    ) -> Transaction {
        let now = Utc::now();
        self.transactions.save(Transaction {
            id: 0,
            transaction_id: Transaction::new_transaction_id(),
            account_id: account.id,
            account_number: account.account_number.clone(),
            transaction_type,
            result,
            amount,
            balance_snapshot: account.balance,
            transacted_at: now,
            audit: crate::types::AuditStamps::new(now),
        })
    }
}

fn ensure_positive_amount(amount: i64) -> Result<(), LedgerError> {
    if amount <= 0 {
        return Err(LedgerError::invalid_request("amount must be positive"));
    }
    Ok(())
}
