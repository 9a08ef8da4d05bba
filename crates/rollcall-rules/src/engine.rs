//! Ordered rule evaluation.

use chrono::NaiveDate;
use rollcall_core::{IdentityField, UserCandidate, UserRecord};
use tracing::debug;

use crate::builtin::{MinimumAge, RequiredFields, UniqueIdentity};
use crate::rule::{Rule, RuleContext};
use crate::violation::Violation;

/// An ordered set of rules.
pub struct RuleEngine {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleEngine {
    /// An engine with no rules; admits everything.
    #[must_use]
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Required fields, unique email, unique username, minimum age.
    #[must_use]
    pub fn standard(minimum_age: u32) -> Self {
        Self::empty()
            .with_rule(RequiredFields)
            .with_rule(UniqueIdentity(IdentityField::Email))
            .with_rule(UniqueIdentity(IdentityField::Username))
            .with_rule(MinimumAge { years: minimum_age })
    }

    /// Append a rule. It runs after the rules already present.
    #[must_use]
    pub fn with_rule(mut self, rule: impl Rule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Names of the configured rules, in evaluation order.
    #[must_use]
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Run every rule in order and stop at the first violation.
    ///
    /// # Errors
    ///
    /// Returns the first [`Violation`] found.
    pub fn validate(
        &self,
        candidate: &UserCandidate,
        existing: &[UserRecord],
        today: NaiveDate,
    ) -> Result<(), Violation> {
        let ctx = RuleContext {
            candidate,
            existing,
            today,
        };
        for rule in &self.rules {
            if let Err(violation) = rule.check(&ctx) {
                debug!(rule = rule.name(), %violation, "candidate rejected");
                return Err(violation);
            }
        }
        debug!(rules = self.rules.len(), "candidate admitted");
        Ok(())
    }

    /// Run every rule and collect all violations.
    #[must_use]
    pub fn validate_all(
        &self,
        candidate: &UserCandidate,
        existing: &[UserRecord],
        today: NaiveDate,
    ) -> Vec<Violation> {
        let ctx = RuleContext {
            candidate,
            existing,
            today,
        };
        self.rules
            .iter()
            .filter_map(|rule| rule.check(&ctx).err())
            .collect()
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::standard(crate::DEFAULT_MINIMUM_AGE)
    }
}

impl std::fmt::Debug for RuleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleEngine")
            .field("rules", &self.rule_names())
            .finish()
    }
}
