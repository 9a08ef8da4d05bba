//! Translation of lower-layer failures into the caller-facing taxonomy.

use rollcall_audit::AuditError;
use rollcall_core::{RegistrationError, UserId};
use rollcall_storage::StorageError;

/// Classify a storage failure. `subject` is the record the operation
/// targeted, if any.
pub(crate) fn from_storage(err: StorageError, subject: Option<UserId>) -> RegistrationError {
    match (err, subject) {
        (StorageError::UniqueViolation { field }, _) => RegistrationError::DuplicateIdentity { field },
        (StorageError::NotFound(_), Some(id)) => RegistrationError::NotFound { id },
        (StorageError::CheckViolation { minimum, age, .. }, _) => {
            RegistrationError::AgeBelowMinimum { minimum, age }
        },
        (other, _) => RegistrationError::Storage(other.to_string()),
    }
}

/// Classify an audit capture failure.
pub(crate) fn from_audit(err: AuditError, subject: Option<UserId>) -> RegistrationError {
    match err {
        AuditError::StorageError(inner) => from_storage(inner, subject),
        other => RegistrationError::Storage(other.to_string()),
    }
}
