//! Audit entry types.
//!
//! Every committed mutation of a user record is recorded as one entry.
//! Entries for a user are numbered from 1 and chain-linked (each contains
//! the hash of the previous one).

use chrono::{DateTime, Utc};
use rollcall_core::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{AuditError, AuditResult};
use crate::hash::ContentHash;

/// Unique identifier of an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuditEntryId(pub Uuid);

impl AuditEntryId {
    /// Create a new random entry ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AuditEntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AuditEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "audit:{}", self.0)
    }
}

/// Kind of mutation an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOperation {
    /// A record was created.
    Create,
    /// A record's fields changed.
    Update,
    /// A record was deleted.
    Delete,
}

impl fmt::Display for AuditOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        })
    }
}

/// One field's value before and after a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    /// Column name.
    pub field: String,
    /// Value before the mutation; `None` for creates.
    pub old: Option<serde_json::Value>,
    /// Value after the mutation; `None` for hard deletes.
    pub new: Option<serde_json::Value>,
}

/// A single audit log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique entry identifier.
    pub id: AuditEntryId,
    /// The affected user record.
    pub user_id: UserId,
    /// 1-based ordinal among this user's entries.
    pub sequence: u64,
    /// What kind of mutation happened.
    pub operation: AuditOperation,
    /// Field-level changes.
    pub changes: Vec<FieldChange>,
    /// When the mutation was recorded.
    pub recorded_at: DateTime<Utc>,
    /// Capture epoch the entry was written under.
    pub capture_epoch: u64,
    /// Hash of this user's previous entry (zero for the first).
    pub previous_hash: ContentHash,
}

impl AuditEntry {
    /// Create an entry.
    #[must_use]
    pub fn new(
        user_id: UserId,
        sequence: u64,
        operation: AuditOperation,
        changes: Vec<FieldChange>,
        recorded_at: DateTime<Utc>,
        capture_epoch: u64,
        previous_hash: ContentHash,
    ) -> Self {
        Self {
            id: AuditEntryId::new(),
            user_id,
            sequence,
            operation,
            changes,
            recorded_at,
            capture_epoch,
            previous_hash,
        }
    }

    /// Bytes covered by the content hash.
    #[must_use]
    pub fn hashing_data(&self) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(self.id.0.as_bytes());
        data.extend_from_slice(self.user_id.0.as_bytes());
        data.extend_from_slice(&self.sequence.to_le_bytes());
        data.extend_from_slice(self.operation.to_string().as_bytes());
        // Changes are serialized to JSON for consistent hashing
        if let Ok(changes_json) = serde_json::to_vec(&self.changes) {
            data.extend_from_slice(&changes_json);
        }
        data.extend_from_slice(&self.recorded_at.timestamp_micros().to_le_bytes());
        data.extend_from_slice(&self.capture_epoch.to_le_bytes());
        data.extend_from_slice(self.previous_hash.as_bytes());
        data
    }

    /// Compute the content hash of this entry.
    #[must_use]
    pub fn content_hash(&self) -> ContentHash {
        ContentHash::of_entry(&self.hashing_data())
    }

    /// Check if this entry follows another (chain linking).
    #[must_use]
    pub fn follows(&self, previous: &AuditEntry) -> bool {
        self.previous_hash == previous.content_hash()
    }

    /// The change recorded for `field`, if any.
    #[must_use]
    pub fn change(&self, field: &str) -> Option<&FieldChange> {
        self.changes.iter().find(|c| c.field == field)
    }

    pub(crate) fn encode(&self) -> AuditResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| AuditError::SerializationError(e.to_string()))
    }

    pub(crate) fn decode(bytes: &[u8]) -> AuditResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| AuditError::SerializationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(sequence: u64, previous_hash: ContentHash) -> AuditEntry {
        AuditEntry::new(
            UserId::new(),
            sequence,
            AuditOperation::Create,
            vec![FieldChange {
                field: "username".to_owned(),
                old: None,
                new: Some(serde_json::json!("testuser123")),
            }],
            Utc::now(),
            0,
            previous_hash,
        )
    }

    #[test]
    fn encode_decode_preserves_hash() {
        let original = entry(1, ContentHash::zero());
        let decoded = AuditEntry::decode(&original.encode().unwrap()).unwrap();
        assert_eq!(decoded.content_hash(), original.content_hash());
    }

    #[test]
    fn follows_checks_previous_hash() {
        let first = entry(1, ContentHash::zero());
        let second = entry(2, first.content_hash());
        let stray = entry(2, ContentHash::zero());
        assert!(second.follows(&first));
        assert!(!stray.follows(&first));
    }

    #[test]
    fn tampering_changes_the_hash() {
        let original = entry(1, ContentHash::zero());
        let mut tampered = original.clone();
        tampered.changes[0].new = Some(serde_json::json!("someoneelse"));
        assert_ne!(original.content_hash(), tampered.content_hash());
    }

    #[test]
    fn operation_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&AuditOperation::Delete).unwrap(),
            "\"delete\""
        );
    }
}
