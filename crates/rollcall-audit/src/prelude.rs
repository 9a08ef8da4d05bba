//! Prelude module - commonly used types for convenient import.
//!
//! Use `use rollcall_audit::prelude::*;` to import all essential types.

// Errors
pub use crate::{AuditError, AuditResult};

// Entry types
pub use crate::{AuditEntry, AuditEntryId, AuditOperation, ContentHash, FieldChange};

// Capture
pub use crate::{AuditCapture, CaptureMode, MutationEvent};

// Trail and verification
pub use crate::{AuditTrail, CaptureGap, ChainIssue, ChainVerification};
