//! Enablement-gated audit writer.

use rollcall_core::Clock;
use rollcall_storage::{JournalRecord, Transaction};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

use crate::entry::AuditEntry;
use crate::error::{AuditError, AuditResult};
use crate::event::MutationEvent;
use crate::hash::ContentHash;

// State word layout: bit 0 is the operator switch, bits 1..=16 count open
// suspensions, the remaining bits hold the epoch.
const ENABLED_BIT: u64 = 1;
const SUSPEND_SHIFT: u32 = 1;
const SUSPEND_MAX: u64 = 0xFFFF;
const EPOCH_SHIFT: u32 = 17;

fn switched_on(state: u64) -> bool {
    state & ENABLED_BIT != 0
}

fn suspensions(state: u64) -> u64 {
    state.wrapping_shr(SUSPEND_SHIFT) & SUSPEND_MAX
}

fn epoch_of(state: u64) -> u64 {
    state.wrapping_shr(EPOCH_SHIFT)
}

fn active(state: u64) -> bool {
    switched_on(state) && suspensions(state) == 0
}

fn pack(enabled: bool, suspensions: u64, epoch: u64) -> u64 {
    epoch.wrapping_shl(EPOCH_SHIFT)
        | (suspensions & SUSPEND_MAX).wrapping_shl(SUSPEND_SHIFT)
        | u64::from(enabled)
}

/// Next state word. The epoch advances whenever capture becomes active.
fn transition(state: u64, enabled: bool, suspensions: u64) -> u64 {
    let epoch = epoch_of(state);
    let next = pack(enabled, suspensions, epoch);
    if active(next) && !active(state) {
        pack(enabled, suspensions, epoch.wrapping_add(1))
    } else {
        next
    }
}

/// The capture flag as observed at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    /// Mutations are recorded under this epoch.
    Enabled {
        /// Number of times capture has become active again.
        epoch: u64,
    },
    /// Mutations are not recorded.
    Disabled,
}

impl CaptureMode {
    fn from_state(state: u64) -> Self {
        if active(state) {
            Self::Enabled {
                epoch: epoch_of(state),
            }
        } else {
            Self::Disabled
        }
    }

    /// Whether this snapshot records mutations.
    #[must_use]
    pub fn is_enabled(self) -> bool {
        matches!(self, Self::Enabled { .. })
    }
}

/// Writes one audit entry per committed mutation while enabled.
///
/// Capture is active when the operator switch is on and no suspension is
/// open. The switch, the suspension count and the capture epoch share one
/// atomic word, so a reader always sees a consistent triple.
pub struct AuditCapture {
    state: AtomicU64,
    clock: Arc<dyn Clock>,
}

impl AuditCapture {
    /// Create a writer, starting at epoch 0.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, enabled: bool) -> Self {
        Self {
            state: AtomicU64::new(pack(enabled, 0, 0)),
            clock,
        }
    }

    /// Snapshot the flag. Take this once at the start of a mutation.
    #[must_use]
    pub fn mode(&self) -> CaptureMode {
        CaptureMode::from_state(self.state.load(Ordering::Acquire))
    }

    /// Whether capture is currently active.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.mode().is_enabled()
    }

    /// Whether the operator switch is on, regardless of suspensions.
    #[must_use]
    pub fn is_switched_on(&self) -> bool {
        switched_on(self.state.load(Ordering::Acquire))
    }

    /// Number of open suspensions.
    #[must_use]
    pub fn suspensions(&self) -> u64 {
        suspensions(self.state.load(Ordering::Acquire))
    }

    /// Current capture epoch.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        epoch_of(self.state.load(Ordering::Acquire))
    }

    /// Set the operator switch and return its previous setting.
    ///
    /// Setting the current value is a no-op. While a suspension is open,
    /// switching on takes effect only once the last suspension ends.
    pub fn set_enabled(&self, enabled: bool) -> bool {
        let result = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |state| {
                if switched_on(state) == enabled {
                    None
                } else {
                    Some(transition(state, enabled, suspensions(state)))
                }
            });

        match result {
            Ok(previous) => {
                info!(
                    enabled,
                    suspensions = suspensions(previous),
                    epoch = self.epoch(),
                    "audit capture toggled"
                );
                switched_on(previous)
            },
            Err(unchanged) => switched_on(unchanged),
        }
    }

    /// Open a suspension. Capture stays inactive until every open suspension
    /// is ended with [`resume`](Self::resume).
    ///
    /// Returns `false` if the suspension count is exhausted; the caller must
    /// not call `resume` in that case.
    pub fn suspend(&self) -> bool {
        let result = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |state| {
                let open = suspensions(state);
                (open < SUSPEND_MAX)
                    .then(|| transition(state, switched_on(state), open.saturating_add(1)))
            });
        match result {
            Ok(previous) => {
                debug!(
                    open = suspensions(previous).saturating_add(1),
                    "audit capture suspended"
                );
                true
            },
            Err(_) => {
                warn!("audit capture suspension count exhausted");
                false
            },
        }
    }

    /// End one suspension opened with [`suspend`](Self::suspend).
    pub fn resume(&self) {
        let result = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |state| {
                let open = suspensions(state);
                (open > 0).then(|| transition(state, switched_on(state), open.saturating_sub(1)))
            });
        match result {
            Ok(previous) => debug!(
                open = suspensions(previous).saturating_sub(1),
                active = self.is_enabled(),
                "audit capture suspension ended"
            ),
            Err(_) => warn!("resume called without an open suspension"),
        }
    }

    /// Record `event` inside `tx`.
    ///
    /// Appends exactly one journal row when `mode` is enabled and nothing
    /// otherwise. Must be called after the row mutation and before commit, so
    /// that the entry and the mutation share one fate.
    ///
    /// # Errors
    ///
    /// Returns an error if the journal rejects the row or the user's previous
    /// entry cannot be decoded.
    pub fn on_commit(
        &self,
        mode: CaptureMode,
        tx: &mut Transaction,
        event: &MutationEvent,
    ) -> AuditResult<Option<AuditEntry>> {
        let CaptureMode::Enabled { epoch } = mode else {
            debug!(
                user_id = %event.user_id(),
                operation = %event.operation(),
                "audit capture suspended, mutation not recorded"
            );
            return Ok(None);
        };

        let user_id = event.user_id();
        let (sequence, previous_hash) = match tx.journal_head(user_id) {
            Some(head) => {
                let previous = AuditEntry::decode(&head.payload).map_err(|e| {
                    AuditError::IntegrityViolation {
                        sequence: head.sequence,
                        reason: e.to_string(),
                    }
                })?;
                let next = head.sequence.checked_add(1).ok_or_else(|| {
                    AuditError::IntegrityViolation {
                        sequence: head.sequence,
                        reason: "sequence exhausted".to_owned(),
                    }
                })?;
                (next, previous.content_hash())
            },
            None => (1, ContentHash::zero()),
        };

        let entry = AuditEntry::new(
            user_id,
            sequence,
            event.operation(),
            event.changes(),
            self.clock.now(),
            epoch,
            previous_hash,
        );
        tx.append_journal(JournalRecord::new(user_id, sequence, entry.encode()?))?;

        debug!(
            tx = tx.id(),
            entry_id = %entry.id,
            %user_id,
            sequence,
            operation = %entry.operation,
            "audit entry appended"
        );
        Ok(Some(entry))
    }
}

impl std::fmt::Debug for AuditCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditCapture")
            .field("mode", &self.mode())
            .field("suspensions", &self.suspensions())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AuditOperation;
    use chrono::{NaiveDate, Utc};
    use rollcall_core::{FixedClock, PasswordHash, SystemClock, UserCandidate, UserRecord};
    use rollcall_storage::{Database, StorageError};

    fn record(email: &str, username: &str) -> UserRecord {
        let candidate = UserCandidate::new(
            email,
            username,
            PasswordHash::new("hash"),
            NaiveDate::from_ymd_opt(1990, 1, 15).unwrap(),
        )
        .with_name("Test", "User")
        .with_phone_number("+1-555-000-0000");
        UserRecord::from_candidate(candidate, Utc::now())
    }

    fn capture(enabled: bool) -> AuditCapture {
        AuditCapture::new(Arc::new(SystemClock), enabled)
    }

    #[test]
    fn toggling_advances_epoch_on_reenable_only() {
        let capture = capture(true);
        assert_eq!(capture.mode(), CaptureMode::Enabled { epoch: 0 });

        assert!(capture.set_enabled(false));
        assert_eq!(capture.mode(), CaptureMode::Disabled);
        assert!(!capture.set_enabled(false));

        assert!(!capture.set_enabled(true));
        assert_eq!(capture.mode(), CaptureMode::Enabled { epoch: 1 });
        assert!(capture.set_enabled(true));
        assert_eq!(capture.epoch(), 1);
    }

    #[test]
    fn starting_disabled_keeps_epoch_zero() {
        let capture = capture(false);
        assert!(!capture.is_enabled());
        capture.set_enabled(true);
        assert_eq!(capture.mode(), CaptureMode::Enabled { epoch: 1 });
    }

    #[test]
    fn suspensions_stack_and_overlap() {
        let capture = capture(true);

        assert!(capture.suspend());
        assert!(capture.suspend());
        assert_eq!(capture.mode(), CaptureMode::Disabled);
        assert!(capture.is_switched_on());

        // Windows may end in any order; only the last one reactivates.
        capture.resume();
        assert_eq!(capture.mode(), CaptureMode::Disabled);
        capture.resume();
        assert_eq!(capture.mode(), CaptureMode::Enabled { epoch: 1 });
        assert_eq!(capture.suspensions(), 0);
    }

    #[test]
    fn switching_on_during_suspension_waits_for_resume() {
        let capture = capture(false);
        capture.suspend();
        assert!(!capture.set_enabled(true));
        assert_eq!(capture.mode(), CaptureMode::Disabled);
        assert_eq!(capture.epoch(), 0);

        capture.resume();
        assert_eq!(capture.mode(), CaptureMode::Enabled { epoch: 1 });
    }

    #[test]
    fn suspension_of_disabled_capture_keeps_it_disabled() {
        let capture = capture(false);
        capture.suspend();
        capture.resume();
        assert_eq!(capture.mode(), CaptureMode::Disabled);
        assert_eq!(capture.epoch(), 0);
    }

    #[test]
    fn unmatched_resume_is_ignored() {
        let capture = capture(true);
        capture.resume();
        assert_eq!(capture.suspensions(), 0);
        assert_eq!(capture.mode(), CaptureMode::Enabled { epoch: 0 });
    }

    #[tokio::test]
    async fn enabled_mode_appends_one_entry() {
        let db = Database::in_memory();
        let clock = FixedClock::at_date(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()).shared();
        let capture = AuditCapture::new(clock.clone(), true);

        let mut tx = db.begin().await;
        let user = tx
            .insert_user(record("test.user@example.com", "testuser123"))
            .unwrap();
        let entry = capture
            .on_commit(capture.mode(), &mut tx, &MutationEvent::created(user.clone()))
            .unwrap()
            .unwrap();
        tx.commit();

        assert_eq!(entry.sequence, 1);
        assert_eq!(entry.operation, AuditOperation::Create);
        assert_eq!(entry.recorded_at, clock.now());
        assert!(entry.previous_hash.is_zero());
        assert_eq!(db.journal(user.id).await.len(), 1);
    }

    #[tokio::test]
    async fn disabled_mode_appends_nothing() {
        let db = Database::in_memory();
        let capture = capture(false);

        let mut tx = db.begin().await;
        let user = tx.insert_user(record("a@example.com", "alice")).unwrap();
        let entry = capture
            .on_commit(capture.mode(), &mut tx, &MutationEvent::created(user))
            .unwrap();
        tx.commit();

        assert!(entry.is_none());
        assert_eq!(db.journal_len().await, 0);
    }

    #[tokio::test]
    async fn consecutive_entries_are_chained() {
        let db = Database::in_memory();
        let capture = capture(true);

        let mut tx = db.begin().await;
        let user = tx.insert_user(record("a@example.com", "alice")).unwrap();
        let first = capture
            .on_commit(capture.mode(), &mut tx, &MutationEvent::created(user.clone()))
            .unwrap()
            .unwrap();
        let mut renamed = user.clone();
        renamed.first_name = "Alicia".to_owned();
        let before = tx.update_user(renamed.clone()).unwrap();
        let second = capture
            .on_commit(
                capture.mode(),
                &mut tx,
                &MutationEvent::updated(before, renamed),
            )
            .unwrap()
            .unwrap();
        tx.commit();

        assert_eq!(second.sequence, 2);
        assert!(second.follows(&first));
    }

    #[tokio::test]
    async fn entry_for_missing_user_is_rejected() {
        let db = Database::in_memory();
        let capture = capture(true);

        let mut tx = db.begin().await;
        let ghost = record("ghost@example.com", "ghost");
        let err = capture
            .on_commit(capture.mode(), &mut tx, &MutationEvent::created(ghost))
            .unwrap_err();
        assert!(matches!(
            err,
            AuditError::StorageError(StorageError::ForeignKeyViolation(_))
        ));
    }

    #[tokio::test]
    async fn entry_rolls_back_with_its_transaction() {
        let db = Database::in_memory();
        let capture = capture(true);

        {
            let mut tx = db.begin().await;
            let user = tx.insert_user(record("a@example.com", "alice")).unwrap();
            capture
                .on_commit(capture.mode(), &mut tx, &MutationEvent::created(user))
                .unwrap();
        }

        assert_eq!(db.user_count().await, 0);
        assert_eq!(db.journal_len().await, 0);
    }
}
