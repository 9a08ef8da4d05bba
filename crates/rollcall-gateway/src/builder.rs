//! Gateway construction.

use rollcall_audit::AuditCapture;
use rollcall_config::Config;
use rollcall_core::{Clock, SystemClock};
use rollcall_rules::{DEFAULT_MINIMUM_AGE, RuleEngine};
use rollcall_storage::Database;
use std::sync::Arc;
use tracing::debug;

use crate::gateway::{Inner, MutationGateway};

/// Builder for [`MutationGateway`].
pub struct GatewayBuilder {
    database: Option<Database>,
    clock: Option<Arc<dyn Clock>>,
    rules: Option<RuleEngine>,
    minimum_age: u32,
    capture_enabled: bool,
}

impl GatewayBuilder {
    pub(crate) fn new() -> Self {
        Self {
            database: None,
            clock: None,
            rules: None,
            minimum_age: DEFAULT_MINIMUM_AGE,
            capture_enabled: true,
        }
    }

    /// Use an existing store. Defaults to a fresh in-memory store.
    #[must_use]
    pub fn database(mut self, database: Database) -> Self {
        self.database = Some(database);
        self
    }

    /// Evaluation-time source. Defaults to the wall clock.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Replace the standard rule set. Takes precedence over
    /// [`minimum_age`](Self::minimum_age) for validation; the store's age
    /// check still applies.
    #[must_use]
    pub fn rules(mut self, rules: RuleEngine) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Minimum age for the standard rule set and the store's age check.
    #[must_use]
    pub fn minimum_age(mut self, years: u32) -> Self {
        self.minimum_age = years;
        self
    }

    /// Whether audit capture starts enabled. Defaults to `true`.
    #[must_use]
    pub fn capture_enabled(mut self, enabled: bool) -> Self {
        self.capture_enabled = enabled;
        self
    }

    /// Apply the `[registration]` and `[audit]` sections of `config`.
    #[must_use]
    pub fn from_config(self, config: &Config) -> Self {
        self.minimum_age(config.registration.minimum_age)
            .capture_enabled(config.audit.capture_enabled)
    }

    /// Build the gateway.
    #[must_use]
    pub fn build(self) -> MutationGateway {
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let rules = self
            .rules
            .unwrap_or_else(|| RuleEngine::standard(self.minimum_age));
        debug!(
            rules = ?rules.rule_names(),
            minimum_age = self.minimum_age,
            capture_enabled = self.capture_enabled,
            "building mutation gateway"
        );
        let db = self
            .database
            .unwrap_or_default()
            .with_minimum_age(self.minimum_age, Arc::clone(&clock));
        MutationGateway::from_inner(Inner {
            db,
            rules,
            capture: AuditCapture::new(Arc::clone(&clock), self.capture_enabled),
            clock,
        })
    }
}

impl Default for GatewayBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for GatewayBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayBuilder")
            .field("minimum_age", &self.minimum_age)
            .field("capture_enabled", &self.capture_enabled)
            .field("custom_rules", &self.rules.is_some())
            .finish_non_exhaustive()
    }
}
