//! Transaction-related types for the account ledger
//!
//! Transactions form an append-only audit ledger: every use/cancel attempt,
//! successful or not, produces exactly one record and records are never
//! mutated afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::account::AccountId;
use super::user::AuditStamps;

/// Kind of balance operation a record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// A debit against the account balance
    Use,
    /// A credit reversing an earlier use
    Cancel,
}

/// Outcome of an attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionResult {
    /// The attempt passed validation and mutated the balance
    Success,
    /// The attempt failed validation; the balance is untouched
    Fail,
}

/// One entry in the append-only transaction ledger
///
/// The correlation id (`transaction_id`) is an opaque random hex string,
/// deliberately independent of the storage key, and is what callers use to
/// reference the transaction later (e.g. for cancellation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Storage identifier (assigned on save)
    pub id: u64,

    /// Opaque correlation id, 32 hex characters
    pub transaction_id: String,

    /// Storage id of the owning account
    pub account_id: AccountId,

    /// Account number of the owning account
    ///
    /// Denormalized for view building; safe because the ledger is
    /// append-only and account numbers are immutable.
    pub account_number: String,

    /// Kind of operation attempted
    pub transaction_type: TransactionType,

    /// Outcome of the attempt
    pub result: TransactionResult,

    /// Amount in currency minor units, always positive
    pub amount: i64,

    /// Account balance right after this record was taken
    ///
    /// For a successful attempt this is the post-mutation balance; for a
    /// failed attempt it is the unchanged balance at the time of the
    /// failure.
    pub balance_snapshot: i64,

    /// When the attempt happened
    pub transacted_at: DateTime<Utc>,

    /// Audit fields
    pub audit: AuditStamps,
}

impl Transaction {
    /// Generate a fresh correlation id
    ///
    /// Random 32-character hex, independent of any storage key.
    pub fn new_transaction_id() -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_id_is_32_hex_chars() {
        let id = Transaction::new_transaction_id();

        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_transaction_ids_are_unique() {
        let a = Transaction::new_transaction_id();
        let b = Transaction::new_transaction_id();

        assert_ne!(a, b);
    }

    #[test]
    fn test_enums_serialize_as_screaming_snake_case() {
        assert_eq!(
            serde_json::to_string(&TransactionType::Use).unwrap(),
            "\"USE\""
        );
        assert_eq!(
            serde_json::to_string(&TransactionType::Cancel).unwrap(),
            "\"CANCEL\""
        );
        assert_eq!(
            serde_json::to_string(&TransactionResult::Success).unwrap(),
            "\"SUCCESS\""
        );
        assert_eq!(
            serde_json::to_string(&TransactionResult::Fail).unwrap(),
            "\"FAIL\""
        );
    }
}
