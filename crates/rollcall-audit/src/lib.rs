//! Rollcall Audit - recording every committed mutation of a user record.
//!
//! This crate provides:
//! - [`AuditEntry`]: immutable description of one mutation (operation, field
//!   changes, timestamp, per-user sequence number)
//! - [`AuditCapture`]: the enablement-gated writer, invoked inside the same
//!   storage transaction as the mutation it describes
//! - [`AuditTrail`]: the read side, including chain verification
//!
//! # Integrity Model
//!
//! Entries for one user form a chain: sequence numbers are contiguous from 1
//! and each entry carries the BLAKE3 hash of its predecessor. Each entry also
//! records the capture epoch it was written under. The epoch advances every
//! time capture is switched back on, so a pause in capture shows up as an
//! epoch change between neighbouring entries rather than being hidden inside
//! a seemingly continuous history.
//!
//! Entries are written through the caller's [`Transaction`](rollcall_storage::Transaction),
//! so an entry exists if and only if its mutation committed.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod capture;
mod entry;
mod error;
mod event;
mod hash;
mod trail;

pub use capture::{AuditCapture, CaptureMode};
pub use entry::{AuditEntry, AuditEntryId, AuditOperation, FieldChange};
pub use error::{AuditError, AuditResult};
pub use event::MutationEvent;
pub use hash::ContentHash;
pub use trail::{AuditTrail, CaptureGap, ChainIssue, ChainVerification};
