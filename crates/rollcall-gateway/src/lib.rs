//! Rollcall Gateway - the single entry point for user mutations.
//!
//! This crate ties the other rollcall crates together:
//! - Rule evaluation via `rollcall-rules`
//! - Transactional writes via `rollcall-storage`
//! - Audit capture via `rollcall-audit`
//!
//! # Mutation Flow
//!
//! ```text
//! create / update / delete / clear
//! ├── snapshot capture mode
//! ├── read live rows
//! ├── rule engine (first violation wins)
//! └── transaction
//!     ├── row write (store re-checks uniqueness)
//!     ├── audit entry (when capture was enabled at the start)
//!     └── commit, or roll back everything
//! ```
//!
//! The rule engine's uniqueness checks run before the store lock is taken,
//! so two concurrent registrations can both pass them. The store re-checks
//! under its lock, and the loser gets the same
//! [`DuplicateIdentity`](rollcall_core::RegistrationError::DuplicateIdentity)
//! error a sequential caller would see.
//!
//! # Example
//!
//! ```rust,ignore
//! use rollcall_gateway::MutationGateway;
//!
//! let gateway = MutationGateway::builder().minimum_age(13).build();
//! let user = gateway.create(candidate).await?;
//!
//! let removed = gateway
//!     .bulk_maintenance(|gw| async move { gw.clear().await })
//!     .await?;
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod builder;
mod error;
mod gateway;
mod maintenance;

pub use builder::GatewayBuilder;
pub use gateway::MutationGateway;

pub use rollcall_storage::{Rows, UserFilter};
