//! Caller-facing error taxonomy for registration writes.
//!
//! Every failed mutation surfaces as exactly one of these kinds. Storage
//! engine failures are classified before they get here; nothing is passed
//! through as an opaque engine code.

use thiserror::Error;

use crate::types::{IdentityField, UserId};

/// Errors returned by the mutation gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// A uniquely constrained field collides with a live record.
    #[error("duplicate identity: {field} is already taken")]
    DuplicateIdentity {
        /// The colliding field.
        field: IdentityField,
    },

    /// Date of birth yields an age under the configured minimum.
    #[error("age below minimum: {age} is under {minimum} years")]
    AgeBelowMinimum {
        /// Configured minimum age in whole years.
        minimum: u32,
        /// Computed age in whole years (negative for future dates).
        age: i32,
    },

    /// A required field is empty.
    #[error("missing required field: {field}")]
    MissingField {
        /// Column name of the empty field.
        field: &'static str,
    },

    /// The referenced record does not exist or is no longer live.
    #[error("user not found: {id}")]
    NotFound {
        /// The requested identity.
        id: UserId,
    },

    /// Unclassified storage failure.
    #[error("storage error: {0}")]
    Storage(String),
}

impl RegistrationError {
    /// Stable machine-readable name of the rule or constraint involved.
    #[must_use]
    pub fn rule_name(&self) -> &'static str {
        match self {
            Self::DuplicateIdentity {
                field: IdentityField::Email,
            } => "unique_email",
            Self::DuplicateIdentity {
                field: IdentityField::Username,
            } => "unique_username",
            Self::AgeBelowMinimum { .. } => "minimum_age",
            Self::MissingField { .. } => "required_field",
            Self::NotFound { .. } => "user_exists",
            Self::Storage(_) => "storage",
        }
    }

    /// Whether the caller can succeed by changing its input.
    ///
    /// Storage failures are not recoverable and must not be retried blindly:
    /// a create is not idempotent.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Storage(_))
    }
}

/// Result type for registration operations.
pub type RegistrationResult<T> = Result<T, RegistrationError>;
