//! Rollcall Rules - admissibility checks for candidate user records.
//!
//! Rules are pure: they see the candidate, the live records it must not
//! collide with, and the evaluation date, and nothing else. Storage never
//! enters the picture, so every rule is testable on plain values.
//!
//! # Evaluation Order
//!
//! The [standard](RuleEngine::standard) rule set checks, in order:
//!
//! 1. Are all required fields present? -> [`Violation::MissingField`]
//! 2. Is the email free? -> [`Violation::DuplicateIdentity`]
//! 3. Is the username free? -> [`Violation::DuplicateIdentity`]
//! 4. Is the candidate old enough? -> [`Violation::AgeBelowMinimum`]
//!
//! The uniqueness checks here are advisory. The identity store re-checks
//! them under its lock and has the final word.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use rollcall_core::{PasswordHash, UserCandidate};
//! use rollcall_rules::{RuleEngine, Violation};
//!
//! let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
//! let engine = RuleEngine::standard(13);
//!
//! let candidate = UserCandidate::new(
//!     "young@example.com",
//!     "younguser",
//!     PasswordHash::new("$2a$12$opaque"),
//!     NaiveDate::from_ymd_opt(2014, 10, 19).unwrap(),
//! )
//! .with_name("Young", "User")
//! .with_phone_number("+1-555-000-0003");
//!
//! let result = engine.validate(&candidate, &[], today);
//! assert!(matches!(result, Err(Violation::AgeBelowMinimum { age: 12, .. })));
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod builtin;
mod engine;
mod rule;
mod violation;

pub use builtin::{MinimumAge, RequiredFields, UniqueIdentity};
pub use rollcall_core::age_on;
pub use engine::RuleEngine;
pub use rule::{Rule, RuleContext};
pub use violation::Violation;

/// Default minimum age in whole years.
pub const DEFAULT_MINIMUM_AGE: u32 = 13;
