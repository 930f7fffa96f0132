//! User-related types for the account ledger

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User identifier
pub type UserId = u64;

/// Shared audit fields embedded in every persisted entity
///
/// Kept as a plain embedded struct; stores refresh `updated_at` on save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStamps {
    /// When the entity was first persisted
    pub created_at: DateTime<Utc>,
    /// When the entity was last written
    pub updated_at: DateTime<Utc>,
}

impl AuditStamps {
    /// Create fresh stamps with both fields set to `now`
    pub fn new(now: DateTime<Utc>) -> Self {
        AuditStamps {
            created_at: now,
            updated_at: now,
        }
    }

    /// Refresh the modification timestamp
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

/// A user that owns zero or more accounts
///
/// Users are referenced by accounts through [`UserId`]; the ledger never
/// mutates users beyond their audit stamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountUser {
    /// Storage identifier
    pub id: UserId,

    /// Display name
    pub name: String,

    /// Audit fields
    pub audit: AuditStamps,
}

impl AccountUser {
    /// Create a new user
    pub fn new(id: UserId, name: impl Into<String>, now: DateTime<Utc>) -> Self {
        AccountUser {
            id,
            name: name.into(),
            audit: AuditStamps::new(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_stamps_touch_updates_only_modified() {
        let created = Utc::now();
        let mut stamps = AuditStamps::new(created);

        let later = created + chrono::Duration::seconds(5);
        stamps.touch(later);

        assert_eq!(stamps.created_at, created);
        assert_eq!(stamps.updated_at, later);
    }
}
