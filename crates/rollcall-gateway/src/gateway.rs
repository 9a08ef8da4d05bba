//! The mutation gateway.

use rollcall_audit::{AuditCapture, AuditTrail, CaptureMode, MutationEvent};
use rollcall_core::{
    Clock, RegistrationError, RegistrationResult, UserCandidate, UserId, UserPatch, UserRecord,
};
use rollcall_rules::RuleEngine;
use rollcall_storage::{Database, Rows, UserFilter};
use rollcall_telemetry::RequestContext;
use std::future::Future;
use std::sync::Arc;
use tracing::{Instrument, debug, info, warn};

use crate::builder::GatewayBuilder;
use crate::error::{from_audit, from_storage};

pub(crate) struct Inner {
    pub(crate) db: Database,
    pub(crate) rules: RuleEngine,
    pub(crate) capture: AuditCapture,
    pub(crate) clock: Arc<dyn Clock>,
}

/// Single entry point for user mutations.
///
/// Every mutation runs as one unit: rule evaluation, the storage write and
/// the audit entry either all take effect or none does. Cloning is cheap and
/// yields a handle to the same store and capture flag.
#[derive(Clone)]
pub struct MutationGateway {
    inner: Arc<Inner>,
}

impl MutationGateway {
    /// Start building a gateway.
    #[must_use]
    pub fn builder() -> GatewayBuilder {
        GatewayBuilder::new()
    }

    /// A gateway over a fresh in-memory store with default settings.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::builder().build()
    }

    pub(crate) fn from_inner(inner: Inner) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// Returns the first rule violation, [`RegistrationError::DuplicateIdentity`]
    /// if a concurrent registration took the email or username first, or
    /// [`RegistrationError::Storage`] for anything else. On error nothing is
    /// written.
    pub async fn create(&self, candidate: UserCandidate) -> RegistrationResult<UserRecord> {
        let ctx = RequestContext::new("gateway").with_operation("create");
        traced(ctx, self.create_inner(candidate)).await
    }

    async fn create_inner(&self, candidate: UserCandidate) -> RegistrationResult<UserRecord> {
        let inner = &*self.inner;
        let mode = inner.capture.mode();

        let existing = inner.db.query(UserFilter::Live).await.to_vec();
        inner
            .rules
            .validate(&candidate, &existing, inner.clock.today())?;

        let mut tx = inner.db.begin().await;
        let record = tx
            .insert_user(UserRecord::from_candidate(candidate, inner.clock.now()))
            .map_err(|e| from_storage(e, None))?;
        let entry = inner
            .capture
            .on_commit(mode, &mut tx, &MutationEvent::created(record.clone()))
            .map_err(|e| from_audit(e, Some(record.id)))?;
        tx.commit();

        info!(user_id = %record.id, audited = entry.is_some(), "user created");
        Ok(record)
    }

    /// Apply `patch` to a live record.
    ///
    /// The patched record is re-validated against every other live record.
    /// If the record changed between that check and taking the store lock,
    /// the patch is applied to the stored row and validated again before it
    /// is written.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::NotFound`] if the record is missing or
    /// deleted, a rule violation, or a storage error.
    pub async fn update(&self, id: UserId, patch: UserPatch) -> RegistrationResult<UserRecord> {
        let ctx = RequestContext::new("gateway")
            .with_operation("update")
            .with_subject(id);
        traced(ctx, self.update_inner(id, patch)).await
    }

    async fn update_inner(&self, id: UserId, patch: UserPatch) -> RegistrationResult<UserRecord> {
        let inner = &*self.inner;
        let mode = inner.capture.mode();
        let now = inner.clock.now();

        let live = inner.db.query(UserFilter::Live).await;
        let current = live
            .iter()
            .find(|r| r.id == id)
            .ok_or(RegistrationError::NotFound { id })?;
        let others: Vec<UserRecord> = live.iter().filter(|r| r.id != id).cloned().collect();
        let proposed = current.patched(patch.clone(), now);
        inner
            .rules
            .validate(&proposed.to_candidate(), &others, inner.clock.today())?;

        let mut tx = inner.db.begin().await;
        let fresh = tx
            .get_user(id)
            .filter(UserRecord::is_live)
            .ok_or(RegistrationError::NotFound { id })?;
        let next = fresh.patched(patch, now);
        if fresh != *current {
            // Another write landed after the snapshot; judge what will be stored.
            debug!(user_id = %id, "record changed since validation, re-validating");
            let others: Vec<UserRecord> = tx
                .find(&UserFilter::Live)
                .into_iter()
                .filter(|r| r.id != id)
                .collect();
            inner
                .rules
                .validate(&next.to_candidate(), &others, inner.clock.today())?;
        }
        let before = tx
            .update_user(next.clone())
            .map_err(|e| from_storage(e, Some(id)))?;
        inner
            .capture
            .on_commit(mode, &mut tx, &MutationEvent::updated(before, next.clone()))
            .map_err(|e| from_audit(e, Some(id)))?;
        tx.commit();

        info!(user_id = %id, "user updated");
        Ok(next)
    }

    /// Soft-delete a live record.
    ///
    /// The record stays readable through [`get`](Self::get) but no longer
    /// counts towards uniqueness, so its email and username can be reused.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::NotFound`] if the record is missing or
    /// already deleted, or a storage error.
    pub async fn delete(&self, id: UserId) -> RegistrationResult<UserRecord> {
        let ctx = RequestContext::new("gateway")
            .with_operation("delete")
            .with_subject(id);
        traced(ctx, self.delete_inner(id)).await
    }

    async fn delete_inner(&self, id: UserId) -> RegistrationResult<UserRecord> {
        let inner = &*self.inner;
        let mode = inner.capture.mode();
        let now = inner.clock.now();

        let mut tx = inner.db.begin().await;
        let mut tombstone = tx
            .get_user(id)
            .filter(UserRecord::is_live)
            .ok_or(RegistrationError::NotFound { id })?;
        tombstone.deleted_at = Some(now);
        tombstone.updated_at = now;

        let before = tx
            .update_user(tombstone.clone())
            .map_err(|e| from_storage(e, Some(id)))?;
        inner
            .capture
            .on_commit(
                mode,
                &mut tx,
                &MutationEvent::deleted(before, Some(tombstone.clone())),
            )
            .map_err(|e| from_audit(e, Some(id)))?;
        tx.commit();

        info!(user_id = %id, "user deleted");
        Ok(tombstone)
    }

    /// Remove every user row, live or deleted, and return how many were
    /// removed.
    ///
    /// With capture enabled each removed row gets a `Delete` entry; with
    /// capture suspended (see [`bulk_maintenance`](Self::bulk_maintenance))
    /// nothing is recorded. Existing audit entries are kept.
    ///
    /// # Errors
    ///
    /// Returns a storage error if an audit entry cannot be written; nothing
    /// is removed in that case.
    pub async fn clear(&self) -> RegistrationResult<usize> {
        let ctx = RequestContext::new("gateway").with_operation("clear");
        traced(ctx, self.clear_inner()).await
    }

    async fn clear_inner(&self) -> RegistrationResult<usize> {
        let inner = &*self.inner;
        let mode = inner.capture.mode();

        let mut tx = inner.db.begin().await;
        if mode.is_enabled() {
            // Entries must be appended while their rows still exist.
            for row in tx.find(&UserFilter::All) {
                let id = row.id;
                inner
                    .capture
                    .on_commit(mode, &mut tx, &MutationEvent::deleted(row, None))
                    .map_err(|e| from_audit(e, Some(id)))?;
            }
        }
        let removed = tx.clear_users().len();
        tx.commit();

        info!(removed, audited = mode.is_enabled(), "users cleared");
        Ok(removed)
    }

    /// Delete every audit entry and return how many were removed.
    pub async fn purge_audit(&self) -> usize {
        let mut tx = self.inner.db.begin().await;
        let removed = tx.clear_journal();
        tx.commit();
        warn!(removed, "audit journal purged");
        removed
    }

    /// Query user rows. See [`UserFilter`] for the available predicates.
    pub async fn query(&self, filter: UserFilter) -> Rows {
        self.inner.db.query(filter).await
    }

    /// The live record with this email.
    pub async fn find_by_email(&self, email: &str) -> Option<UserRecord> {
        self.find_live(UserFilter::email(email)).await
    }

    /// The live record with this username.
    pub async fn find_by_username(&self, username: &str) -> Option<UserRecord> {
        self.find_live(UserFilter::username(username)).await
    }

    async fn find_live(&self, filter: UserFilter) -> Option<UserRecord> {
        let rows = self.inner.db.query(filter).await;
        rows.iter().find(|r| r.is_live()).cloned()
    }

    /// A record by id, live or deleted.
    pub async fn get(&self, id: UserId) -> Option<UserRecord> {
        self.inner.db.get(id).await
    }

    /// Read access to recorded audit entries.
    #[must_use]
    pub fn audit_trail(&self) -> AuditTrail {
        AuditTrail::new(self.inner.db.clone())
    }

    /// Switch audit capture on or off and return the previous setting.
    ///
    /// Applies to mutations that start after this call returns; mutations
    /// already in flight keep the setting they started with. Switching on
    /// inside a [`bulk_maintenance`](Self::bulk_maintenance) window takes
    /// effect when the last open window ends.
    pub fn set_audit_capture(&self, enabled: bool) -> bool {
        self.inner.capture.set_enabled(enabled)
    }

    /// Whether mutations started now would be recorded: capture is switched
    /// on and no maintenance window is open.
    #[must_use]
    pub fn audit_capture_enabled(&self) -> bool {
        self.inner.capture.is_enabled()
    }

    pub(crate) fn capture(&self) -> &AuditCapture {
        &self.inner.capture
    }

    /// The current capture flag and epoch.
    #[must_use]
    pub fn capture_mode(&self) -> CaptureMode {
        self.inner.capture.mode()
    }

    /// Names of the active rules, in evaluation order.
    #[must_use]
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.inner.rules.rule_names()
    }

    /// The underlying store.
    #[must_use]
    pub fn database(&self) -> &Database {
        &self.inner.db
    }
}

impl std::fmt::Debug for MutationGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationGateway")
            .field("rules", &self.inner.rules)
            .field("capture", &self.inner.capture)
            .finish_non_exhaustive()
    }
}

/// Run `fut` inside the context's span and log how it ended.
async fn traced<T, F>(ctx: RequestContext, fut: F) -> RegistrationResult<T>
where
    F: Future<Output = RegistrationResult<T>>,
{
    let span = ctx.span();
    async move {
        let result = fut.await;
        match &result {
            Ok(_) => debug!(elapsed_ms = ctx.elapsed_ms(), "mutation committed"),
            Err(err) => warn!(
                rule = err.rule_name(),
                error = %err,
                elapsed_ms = ctx.elapsed_ms(),
                "mutation rejected"
            ),
        }
        result
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rollcall_audit::AuditOperation;
    use rollcall_core::{FixedClock, IdentityField, PasswordHash};
    use rollcall_rules::{Rule, RuleContext, Violation};
    use serde_json::json;
    use std::sync::OnceLock;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn gateway() -> MutationGateway {
        MutationGateway::builder()
            .clock(FixedClock::at_date(today()).shared())
            .build()
    }

    fn candidate(email: &str, username: &str) -> UserCandidate {
        UserCandidate::new(
            email,
            username,
            PasswordHash::new("$2a$12$opaque"),
            NaiveDate::from_ymd_opt(1990, 1, 15).unwrap(),
        )
        .with_name("Test", "User")
        .with_phone_number("+1-555-123-4567")
    }

    #[tokio::test]
    async fn create_writes_row_and_entry() {
        let gw = gateway();
        let user = gw
            .create(candidate("test.user@example.com", "testuser123"))
            .await
            .unwrap();

        assert_eq!(gw.get(user.id).await, Some(user.clone()));
        let entries = gw.audit_trail().entries_for(user.id).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].operation, AuditOperation::Create);
        assert_eq!(entries[0].sequence, 1);
    }

    #[tokio::test]
    async fn rejected_create_writes_nothing() {
        let gw = gateway();
        gw.create(candidate("a@example.com", "alice")).await.unwrap();

        let err = gw
            .create(candidate("b@example.com", "alice"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            RegistrationError::DuplicateIdentity {
                field: IdentityField::Username
            }
        );
        assert_eq!(gw.database().user_count().await, 1);
        assert_eq!(gw.audit_trail().count().await, 1);
    }

    #[tokio::test]
    async fn update_records_changed_fields() {
        let gw = gateway();
        let user = gw.create(candidate("a@example.com", "alice")).await.unwrap();

        let updated = gw
            .update(user.id, UserPatch::new().phone_number("+1-555-999-0000"))
            .await
            .unwrap();
        assert_eq!(updated.phone_number, "+1-555-999-0000");
        assert_eq!(updated.username, "alice");

        let entries = gw.audit_trail().entries_for(user.id).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].operation, AuditOperation::Update);
        assert_eq!(entries[1].changes.len(), 1);
        assert_eq!(
            entries[1].change("phone_number").unwrap().new,
            Some(json!("+1-555-999-0000"))
        );
    }

    #[tokio::test]
    async fn update_cannot_take_anothers_email() {
        let gw = gateway();
        gw.create(candidate("a@example.com", "alice")).await.unwrap();
        let bob = gw.create(candidate("b@example.com", "bob")).await.unwrap();

        let err = gw
            .update(bob.id, UserPatch::new().email("a@example.com"))
            .await
            .unwrap_err();
        assert_eq!(err.rule_name(), "unique_email");
        assert_eq!(gw.get(bob.id).await.unwrap().email, "b@example.com");
    }

    #[tokio::test]
    async fn update_of_unknown_user_is_not_found() {
        let gw = gateway();
        let id = UserId::new();
        assert_eq!(
            gw.update(id, UserPatch::new()).await.unwrap_err(),
            RegistrationError::NotFound { id }
        );
    }

    #[tokio::test]
    async fn delete_frees_identity_for_reuse() {
        let gw = gateway();
        let user = gw.create(candidate("a@example.com", "alice")).await.unwrap();

        let tombstone = gw.delete(user.id).await.unwrap();
        assert!(!tombstone.is_live());
        assert!(gw.find_by_email("a@example.com").await.is_none());
        assert_eq!(
            gw.delete(user.id).await.unwrap_err(),
            RegistrationError::NotFound { id: user.id }
        );

        let again = gw.create(candidate("a@example.com", "alice")).await.unwrap();
        assert_ne!(again.id, user.id);
        assert_eq!(gw.find_by_username("alice").await.unwrap().id, again.id);

        let entries = gw.audit_trail().entries_for(user.id).await.unwrap();
        assert_eq!(entries.last().unwrap().operation, AuditOperation::Delete);
    }

    #[tokio::test]
    async fn clear_with_capture_records_each_row() {
        let gw = gateway();
        gw.create(candidate("a@example.com", "alice")).await.unwrap();
        gw.create(candidate("b@example.com", "bob")).await.unwrap();

        assert_eq!(gw.clear().await.unwrap(), 2);
        assert_eq!(gw.database().user_count().await, 0);
        let entries = gw.audit_trail().all_entries().await.unwrap();
        assert_eq!(entries.len(), 4);
        assert_eq!(
            entries
                .iter()
                .filter(|e| e.operation == AuditOperation::Delete)
                .count(),
            2
        );
    }

    #[tokio::test]
    async fn clear_without_capture_records_nothing() {
        let gw = gateway();
        gw.create(candidate("a@example.com", "alice")).await.unwrap();
        gw.set_audit_capture(false);

        assert_eq!(gw.clear().await.unwrap(), 1);
        assert_eq!(gw.audit_trail().count().await, 1);
    }

    #[tokio::test]
    async fn purge_audit_empties_the_journal() {
        let gw = gateway();
        gw.create(candidate("a@example.com", "alice")).await.unwrap();
        assert_eq!(gw.purge_audit().await, 1);
        assert_eq!(gw.audit_trail().count().await, 0);
        assert_eq!(gw.database().user_count().await, 1);
    }

    #[tokio::test]
    async fn capture_toggle_reports_previous_state() {
        let gw = gateway();
        assert!(gw.audit_capture_enabled());
        assert!(gw.set_audit_capture(false));
        assert!(!gw.set_audit_capture(false));
        assert!(!gw.audit_capture_enabled());
        assert!(!gw.set_audit_capture(true));
        assert_eq!(gw.capture_mode(), CaptureMode::Enabled { epoch: 1 });
    }

    #[tokio::test]
    async fn store_rejects_under_age_rows_without_rules() {
        let gw = MutationGateway::builder()
            .clock(FixedClock::at_date(today()).shared())
            .rules(RuleEngine::empty())
            .build();
        let young = candidate("kid@example.com", "kid")
            .with_date_of_birth(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());

        let err = gw.create(young).await.unwrap_err();

        assert_eq!(err, RegistrationError::AgeBelowMinimum { minimum: 13, age: 0 });
        assert_eq!(gw.database().user_count().await, 0);
        assert_eq!(gw.audit_trail().count().await, 0);
    }

    /// Blanks the target's last name through a separate transaction the
    /// first time it sees the marker phone number.
    struct InterleavedWrite {
        db: Database,
        target: Arc<OnceLock<UserId>>,
        fired: Arc<AtomicBool>,
    }

    const MARKER_PHONE: &str = "+1-555-777-0000";

    impl Rule for InterleavedWrite {
        fn name(&self) -> &'static str {
            "interleaved_write"
        }

        fn check(&self, ctx: &RuleContext<'_>) -> Result<(), Violation> {
            let Some(&id) = self.target.get() else {
                return Ok(());
            };
            if ctx.candidate.phone_number != MARKER_PHONE || self.fired.swap(true, Ordering::SeqCst) {
                return Ok(());
            }
            futures::executor::block_on(async {
                let mut tx = self.db.begin().await;
                let mut row = tx.get_user(id).unwrap();
                row.last_name = String::new();
                tx.update_user(row).unwrap();
                tx.commit();
            });
            Ok(())
        }
    }

    #[tokio::test]
    async fn update_is_revalidated_against_the_locked_row() {
        let db = Database::in_memory();
        let target = Arc::new(OnceLock::new());
        let fired = Arc::new(AtomicBool::new(false));
        let gw = MutationGateway::builder()
            .database(db.clone())
            .clock(FixedClock::at_date(today()).shared())
            .rules(RuleEngine::standard(13).with_rule(InterleavedWrite {
                db: db.clone(),
                target: Arc::clone(&target),
                fired: Arc::clone(&fired),
            }))
            .build();
        let user = gw.create(candidate("a@example.com", "alice")).await.unwrap();
        target.set(user.id).unwrap();

        let err = gw
            .update(user.id, UserPatch::new().phone_number(MARKER_PHONE))
            .await
            .unwrap_err();

        assert_eq!(err, RegistrationError::MissingField { field: "last_name" });
        assert!(fired.load(Ordering::SeqCst));
        let stored = db.get(user.id).await.unwrap();
        assert_eq!(stored.phone_number, "+1-555-123-4567");
        assert_eq!(stored.last_name, "");
        assert_eq!(gw.audit_trail().count().await, 1);
    }
}
