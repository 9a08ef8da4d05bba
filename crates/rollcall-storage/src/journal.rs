//! Raw journal rows.
//!
//! The store does not interpret journal payloads; the audit crate encodes its
//! entries into them. The store only enforces the foreign key to `users` and
//! the per-user ordinal.

use rollcall_core::UserId;

/// One row of the append-only journal table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalRecord {
    /// The user the row refers to.
    pub user_id: UserId,
    /// 1-based ordinal, contiguous per user.
    pub sequence: u64,
    /// Encoded entry.
    pub payload: Vec<u8>,
}

impl JournalRecord {
    /// Create a journal row.
    #[must_use]
    pub fn new(user_id: UserId, sequence: u64, payload: Vec<u8>) -> Self {
        Self {
            user_id,
            sequence,
            payload,
        }
    }
}
