//! Rollcall Telemetry - logging setup and request correlation.
//!
//! This crate provides:
//! - Configurable logging with several formats and targets
//! - [`RequestContext`] for correlating the log lines of one operation
//!
//! With the `config` feature, a [`LogConfig`] can be built from the
//! `[logging]` section of the rollcall configuration.
//!
//! # Example
//!
//! ```rust,no_run
//! use rollcall_telemetry::{LogConfig, LogFormat, RequestContext, setup_logging};
//!
//! # fn main() -> Result<(), rollcall_telemetry::TelemetryError> {
//! let config = LogConfig::new("debug")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("rollcall_storage=trace");
//! setup_logging(&config)?;
//!
//! let ctx = RequestContext::new("registration").with_operation("create");
//! let _guard = ctx.span().entered();
//! tracing::info!("registering user");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod context;
mod error;
mod logging;

pub use context::RequestContext;
pub use error::{TelemetryError, TelemetryResult};
pub use logging::{
    FileRotation, LogConfig, LogFormat, LogTarget, setup_default_logging, setup_logging,
};
