//! Configuration types.
//!
//! These types carry no dependency on other rollcall crates; the gateway and
//! telemetry crates convert them at their boundary. Every section implements
//! [`Default`], so a bare `[section]` header yields a working configuration.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Registration rules.
    pub registration: RegistrationSection,
    /// Audit capture.
    pub audit: AuditSection,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
}

/// Registration rule settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationSection {
    /// Minimum age in whole years, inclusive.
    pub minimum_age: u32,
}

impl Default for RegistrationSection {
    fn default() -> Self {
        Self { minimum_age: 13 }
    }
}

/// Audit capture settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditSection {
    /// Whether capture starts enabled.
    pub capture_enabled: bool,
}

impl Default for AuditSection {
    fn default() -> Self {
        Self {
            capture_enabled: true,
        }
    }
}

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"` (human-friendly), `"compact"` (one-line),
    /// `"json"` (structured), or `"full"` (verbose).
    pub format: String,
    /// Per-crate tracing directives (e.g. `["rollcall_storage=debug"]`).
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
        }
    }
}
