//! Row-level check constraints.

use rollcall_core::{Clock, UserRecord, age_on};
use std::sync::Arc;

use crate::error::StorageError;

/// Name reported by [`StorageError::CheckViolation`] for the age check.
pub const MINIMUM_AGE_CONSTRAINT: &str = "minimum_age";

/// `users.date_of_birth` must be at least `minimum` whole years before today.
#[derive(Clone)]
pub(crate) struct AgeCheck {
    minimum: u32,
    clock: Arc<dyn Clock>,
}

impl AgeCheck {
    pub(crate) fn new(minimum: u32, clock: Arc<dyn Clock>) -> Self {
        Self { minimum, clock }
    }

    /// Tombstones are exempt: a deleted row no longer asserts anything.
    pub(crate) fn check(&self, record: &UserRecord) -> Result<(), StorageError> {
        if !record.is_live() {
            return Ok(());
        }
        let age = age_on(record.date_of_birth, self.clock.today());
        if i64::from(age) < i64::from(self.minimum) {
            return Err(StorageError::CheckViolation {
                constraint: MINIMUM_AGE_CONSTRAINT,
                minimum: self.minimum,
                age,
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for AgeCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgeCheck")
            .field("minimum", &self.minimum)
            .finish_non_exhaustive()
    }
}
