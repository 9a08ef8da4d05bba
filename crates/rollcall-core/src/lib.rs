//! Rollcall Core - Foundation types for the rollcall registration subsystem.
//!
//! This crate provides:
//! - The user record data model ([`UserCandidate`], [`UserRecord`], [`UserPatch`])
//! - The caller-facing error taxonomy ([`RegistrationError`])
//! - A [`Clock`] abstraction so evaluation time can be pinned in tests
//!
//! Nothing here performs I/O. Storage, validation and audit capture live in
//! their own crates and share these types.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod age;
pub mod clock;
pub mod error;
pub mod types;
pub mod user;

pub use age::age_on;
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{RegistrationError, RegistrationResult};
pub use types::{IdentityField, UserId};
pub use user::{PasswordHash, UserCandidate, UserPatch, UserRecord};
