//! Prelude module - commonly used types for convenient import.
//!
//! Use `use rollcall_core::prelude::*;` to import all essential types.

// Errors
pub use crate::{RegistrationError, RegistrationResult};

// Identity
pub use crate::{IdentityField, UserId};

// Records
pub use crate::{PasswordHash, UserCandidate, UserPatch, UserRecord};

// Time
pub use crate::age_on;
pub use crate::{Clock, FixedClock, SystemClock};
