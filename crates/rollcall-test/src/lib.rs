//! Rollcall Test - shared test utilities.
//!
//! Fixtures for building candidates with known-good field values, and a
//! logging harness that routes `tracing` output through the test writer.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! rollcall-test.workspace = true
//! ```
//!
//! ```rust,ignore
//! use rollcall_test::{test_candidate, test_clock};
//!
//! let gateway = MutationGateway::builder().clock(test_clock()).build();
//! let user = gateway.create(test_candidate()).await?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod fixtures;
pub mod harness;

pub use fixtures::*;
pub use harness::*;
