//! Read side of the audit journal.

use rollcall_core::UserId;
use rollcall_storage::{Database, JournalRecord};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::entry::{AuditEntry, AuditOperation};
use crate::error::{AuditError, AuditResult};

/// Read-only view of recorded audit entries.
#[derive(Debug, Clone)]
pub struct AuditTrail {
    db: Database,
}

impl AuditTrail {
    /// Create a trail over `db`'s journal.
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Entries for one user, in sequence order.
    ///
    /// # Errors
    ///
    /// Returns an error if a journal row does not decode.
    pub async fn entries_for(&self, user_id: UserId) -> AuditResult<Vec<AuditEntry>> {
        decode_all(&self.db.journal(user_id).await)
    }

    /// Every entry, ordered by time of recording.
    ///
    /// # Errors
    ///
    /// Returns an error if a journal row does not decode.
    pub async fn all_entries(&self) -> AuditResult<Vec<AuditEntry>> {
        let mut entries = decode_all(&self.db.journal_all().await)?;
        entries.sort_by_key(|e| e.recorded_at);
        Ok(entries)
    }

    /// Total number of entries.
    pub async fn count(&self) -> usize {
        self.db.journal_len().await
    }

    /// Number of entries for one user.
    pub async fn count_for(&self, user_id: UserId) -> usize {
        self.db.journal(user_id).await.len()
    }

    /// Verify the integrity of one user's chain.
    ///
    /// # Errors
    ///
    /// Returns an error if a journal row does not decode.
    pub async fn verify_chain(&self, user_id: UserId) -> AuditResult<ChainVerification> {
        let entries = self.entries_for(user_id).await?;
        let result = verify_entries(user_id, &entries);
        if !result.valid {
            warn!(%user_id, issues = result.issues.len(), "audit chain verification failed");
        }
        Ok(result)
    }
}

fn decode_all(rows: &[JournalRecord]) -> AuditResult<Vec<AuditEntry>> {
    rows.iter()
        .map(|row| {
            AuditEntry::decode(&row.payload).map_err(|e| AuditError::IntegrityViolation {
                sequence: row.sequence,
                reason: e.to_string(),
            })
        })
        .collect()
}

fn verify_entries(user_id: UserId, entries: &[AuditEntry]) -> ChainVerification {
    let mut issues = Vec::new();
    let mut gaps = Vec::new();
    let mut previous: Option<&AuditEntry> = None;

    for entry in entries {
        if entry.user_id != user_id {
            issues.push(ChainIssue::WrongUser {
                sequence: entry.sequence,
            });
        }

        let expected = previous.map_or(1, |p| p.sequence.saturating_add(1));
        if entry.sequence != expected {
            issues.push(ChainIssue::SequenceGap {
                expected,
                found: entry.sequence,
            });
        }

        match previous {
            Some(prev) => {
                if !entry.follows(prev) {
                    issues.push(ChainIssue::BrokenLink {
                        sequence: entry.sequence,
                    });
                }
                if entry.capture_epoch != prev.capture_epoch {
                    gaps.push(CaptureGap::Between {
                        after_sequence: prev.sequence,
                        before_sequence: entry.sequence,
                        from_epoch: prev.capture_epoch,
                        to_epoch: entry.capture_epoch,
                    });
                }
            },
            None => {
                if !entry.previous_hash.is_zero() {
                    issues.push(ChainIssue::BrokenLink {
                        sequence: entry.sequence,
                    });
                }
                if entry.operation != AuditOperation::Create {
                    gaps.push(CaptureGap::Leading {
                        first_sequence: entry.sequence,
                        epoch: entry.capture_epoch,
                    });
                }
            },
        }

        previous = Some(entry);
    }

    ChainVerification {
        valid: issues.is_empty(),
        entries_checked: entries.len(),
        issues,
        gaps,
    }
}

/// Result of verifying one user's chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainVerification {
    /// No integrity issue was found.
    pub valid: bool,
    /// Number of entries checked.
    pub entries_checked: usize,
    /// Integrity problems.
    pub issues: Vec<ChainIssue>,
    /// Places where capture was paused between two recorded entries.
    /// These do not make the chain invalid.
    pub gaps: Vec<CaptureGap>,
}

/// An integrity problem in a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainIssue {
    /// Sequence numbers are not contiguous.
    SequenceGap {
        /// Expected sequence number.
        expected: u64,
        /// Found sequence number.
        found: u64,
    },
    /// Entry does not link to its predecessor.
    BrokenLink {
        /// Sequence of the entry with the bad link.
        sequence: u64,
    },
    /// Entry belongs to another user.
    WrongUser {
        /// Sequence of the misplaced entry.
        sequence: u64,
    },
}

/// A stretch of a user's history that the trail cannot vouch for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureGap {
    /// The earliest recorded entry is not the record's creation: the create,
    /// and possibly later mutations, happened while capture was inactive or
    /// their entries were purged.
    Leading {
        /// Sequence of the earliest recorded entry.
        first_sequence: u64,
        /// Epoch of the earliest recorded entry.
        epoch: u64,
    },
    /// Two neighbouring entries written under different capture epochs.
    /// Mutations committed between them, if any, were not recorded.
    Between {
        /// Last entry before the pause.
        after_sequence: u64,
        /// First entry after the pause.
        before_sequence: u64,
        /// Epoch of the earlier entry.
        from_epoch: u64,
        /// Epoch of the later entry.
        to_epoch: u64,
    },
}
