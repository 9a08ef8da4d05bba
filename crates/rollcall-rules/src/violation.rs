//! Rule violations.

use rollcall_core::{IdentityField, RegistrationError};

/// Why a candidate was not admitted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    /// A required field is empty.
    #[error("missing required field: {field}")]
    MissingField {
        /// Column name.
        field: &'static str,
    },

    /// A live record already holds this identity value.
    #[error("duplicate {field}")]
    DuplicateIdentity {
        /// The colliding field.
        field: IdentityField,
    },

    /// Computed age is under the minimum.
    #[error("age {age} is below the minimum of {minimum}")]
    AgeBelowMinimum {
        /// Configured minimum in whole years.
        minimum: u32,
        /// Computed age in whole years.
        age: i32,
    },
}

impl From<Violation> for RegistrationError {
    fn from(violation: Violation) -> Self {
        match violation {
            Violation::MissingField { field } => Self::MissingField { field },
            Violation::DuplicateIdentity { field } => Self::DuplicateIdentity { field },
            Violation::AgeBelowMinimum { minimum, age } => Self::AgeBelowMinimum { minimum, age },
        }
    }
}
