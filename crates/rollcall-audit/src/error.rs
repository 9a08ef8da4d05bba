//! Audit-related error types.

use thiserror::Error;

/// Errors that can occur with audit capture.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The journal rejected or failed the write.
    #[error("storage error: {0}")]
    StorageError(#[from] rollcall_storage::StorageError),

    /// An entry could not be encoded or decoded.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// A journal row does not decode to the entry it claims to be.
    #[error("chain integrity violation at sequence {sequence}: {reason}")]
    IntegrityViolation {
        /// The journal row's sequence number.
        sequence: u64,
        /// Why the row is invalid.
        reason: String,
    },
}

/// Result type for audit operations.
pub type AuditResult<T> = Result<T, AuditError>;
