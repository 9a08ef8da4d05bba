//! Storage error types.

use rollcall_core::IdentityField;

/// Errors from storage operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// A unique index rejected the write.
    #[error("unique violation on {field}")]
    UniqueViolation {
        /// The constrained field.
        field: IdentityField,
    },

    /// The requested row was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A journal row references a user that does not exist.
    #[error("foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// A journal row does not extend the user's sequence by exactly one.
    #[error("sequence conflict for {user}: expected {expected}, got {found}")]
    SequenceConflict {
        /// The user whose journal was appended to.
        user: String,
        /// The next free sequence number.
        expected: u64,
        /// The sequence number that was supplied.
        found: u64,
    },

    /// A row failed a check constraint.
    #[error("check constraint {constraint} failed: age {age} is below {minimum}")]
    CheckViolation {
        /// The constraint that rejected the row.
        constraint: &'static str,
        /// Smallest age the constraint accepts.
        minimum: u32,
        /// Age of the rejected row on the day it was checked.
        age: i32,
    },

    /// A storage operation failed.
    #[error("storage error: {0}")]
    Internal(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
