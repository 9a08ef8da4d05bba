//! Committed-mutation descriptions handed to audit capture.

use rollcall_core::{UserId, UserRecord};
use serde_json::Value;

use crate::entry::{AuditOperation, FieldChange};

/// Placeholder written instead of credential values.
const REDACTED: &str = "[redacted]";

/// A mutation of one user record, described by its before and after states.
#[derive(Debug, Clone)]
pub struct MutationEvent {
    user_id: UserId,
    operation: AuditOperation,
    before: Option<UserRecord>,
    after: Option<UserRecord>,
}

impl MutationEvent {
    /// A record was inserted.
    #[must_use]
    pub fn created(after: UserRecord) -> Self {
        Self {
            user_id: after.id,
            operation: AuditOperation::Create,
            before: None,
            after: Some(after),
        }
    }

    /// A record was replaced.
    #[must_use]
    pub fn updated(before: UserRecord, after: UserRecord) -> Self {
        Self {
            user_id: before.id,
            operation: AuditOperation::Update,
            before: Some(before),
            after: Some(after),
        }
    }

    /// A record was deleted. `after` is the tombstone for soft deletes and
    /// `None` when the row was removed outright.
    #[must_use]
    pub fn deleted(before: UserRecord, after: Option<UserRecord>) -> Self {
        Self {
            user_id: before.id,
            operation: AuditOperation::Delete,
            before: Some(before),
            after,
        }
    }

    /// The affected record.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Kind of mutation.
    #[must_use]
    pub fn operation(&self) -> AuditOperation {
        self.operation
    }

    /// Field-level changes.
    ///
    /// Creates list every populated field, updates only the fields whose
    /// value differs, deletes the whole prior state.
    #[must_use]
    pub fn changes(&self) -> Vec<FieldChange> {
        let before = self.before.as_ref().map(columns);
        let after = self.after.as_ref().map(columns);

        match (self.operation, before, after) {
            (AuditOperation::Create, _, Some(after)) => after
                .into_iter()
                .filter(|(_, value)| !value.is_null())
                .map(|(field, value)| change(field, None, Some(value)))
                .collect(),
            (AuditOperation::Update, Some(before), Some(after)) => before
                .into_iter()
                .zip(after)
                .filter(|((_, old), (_, new))| old != new)
                .map(|((field, old), (_, new))| change(field, Some(old), Some(new)))
                .collect(),
            (AuditOperation::Delete, Some(before), after) => {
                let mut after = after.map(IntoIterator::into_iter);
                before
                    .into_iter()
                    .map(|(field, old)| {
                        let new = after.as_mut().and_then(Iterator::next).map(|(_, v)| v);
                        change(field, Some(old), new)
                    })
                    .collect()
            },
            _ => Vec::new(),
        }
    }
}

fn change(field: &'static str, old: Option<Value>, new: Option<Value>) -> FieldChange {
    let redact = |value: Value| {
        if field == "password_hash" {
            Value::String(REDACTED.to_owned())
        } else {
            value
        }
    };
    FieldChange {
        field: field.to_owned(),
        old: old.map(redact),
        new: new.map(redact),
    }
}

/// Audited columns, in a fixed order. Credential values are raw here so
/// that comparisons see real changes; they are redacted in [`change`].
fn columns(record: &UserRecord) -> [(&'static str, Value); 8] {
    [
        ("email", Value::from(record.email.as_str())),
        ("username", Value::from(record.username.as_str())),
        (
            "password_hash",
            Value::from(record.password_hash.as_str()),
        ),
        ("first_name", Value::from(record.first_name.as_str())),
        ("last_name", Value::from(record.last_name.as_str())),
        (
            "date_of_birth",
            Value::String(record.date_of_birth.to_string()),
        ),
        ("phone_number", Value::from(record.phone_number.as_str())),
        (
            "deleted_at",
            record
                .deleted_at
                .map_or(Value::Null, |at| Value::String(at.to_rfc3339())),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use rollcall_core::{PasswordHash, UserCandidate, UserPatch};
    use serde_json::json;

    fn record() -> UserRecord {
        let candidate = UserCandidate::new(
            "test.user@example.com",
            "testuser123",
            PasswordHash::new("$2a$12$first"),
            NaiveDate::from_ymd_opt(1990, 1, 15).unwrap(),
        )
        .with_name("Test", "User")
        .with_phone_number("+1-555-123-4567");
        UserRecord::from_candidate(candidate, Utc::now())
    }

    #[test]
    fn create_lists_populated_fields() {
        let event = MutationEvent::created(record());
        let changes = event.changes();
        assert_eq!(changes.len(), 7);
        assert!(changes.iter().all(|c| c.old.is_none()));
        assert!(changes.iter().all(|c| c.field != "deleted_at"));
        assert_eq!(event.operation(), AuditOperation::Create);
    }

    #[test]
    fn update_lists_only_changed_fields() {
        let before = record();
        let after = before.patched(
            UserPatch::default().phone_number("+1-555-999-0000"),
            Utc::now(),
        );
        let changes = MutationEvent::updated(before, after).changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "phone_number");
        assert_eq!(changes[0].old, Some(json!("+1-555-123-4567")));
        assert_eq!(changes[0].new, Some(json!("+1-555-999-0000")));
    }

    #[test]
    fn noop_update_has_no_changes() {
        let before = record();
        let after = before.clone();
        assert!(MutationEvent::updated(before, after).changes().is_empty());
    }

    #[test]
    fn credential_changes_are_detected_but_redacted() {
        let before = record();
        let after = before.patched(
            UserPatch::default().password_hash(PasswordHash::new("$2a$12$second")),
            Utc::now(),
        );
        let changes = MutationEvent::updated(before, after).changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].old, Some(json!(REDACTED)));
        assert_eq!(changes[0].new, Some(json!(REDACTED)));
    }

    #[test]
    fn hard_delete_has_no_new_values() {
        let before = record();
        let id = before.id;
        let event = MutationEvent::deleted(before, None);
        assert_eq!(event.user_id(), id);
        let changes = event.changes();
        assert_eq!(changes.len(), 8);
        assert!(changes.iter().all(|c| c.new.is_none()));
        assert_eq!(
            event.changes()[0].old,
            Some(json!("test.user@example.com"))
        );
    }

    #[test]
    fn soft_delete_records_tombstone() {
        let before = record();
        let mut after = before.clone();
        after.deleted_at = Some(Utc::now());
        let changes = MutationEvent::deleted(before, Some(after)).changes();
        let deleted_at = changes.iter().find(|c| c.field == "deleted_at").unwrap();
        assert_eq!(deleted_at.old, Some(Value::Null));
        assert!(matches!(deleted_at.new, Some(Value::String(_))));
    }
}
