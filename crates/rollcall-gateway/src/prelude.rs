//! Prelude module - commonly used types for convenient import.
//!
//! Use `use rollcall_gateway::prelude::*;` to get the gateway together with
//! the record types and errors its methods take and return.

// Gateway
pub use crate::{GatewayBuilder, MutationGateway};

// Queries
pub use crate::{Rows, UserFilter};

// Records and errors
pub use rollcall_core::{
    RegistrationError, RegistrationResult, UserCandidate, UserId, UserPatch, UserRecord,
};

// Audit read side
pub use rollcall_audit::{AuditEntry, AuditOperation, AuditTrail, ChainVerification};
