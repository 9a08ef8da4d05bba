//! The rule trait and its evaluation context.

use chrono::NaiveDate;
use rollcall_core::{UserCandidate, UserRecord};

use crate::violation::Violation;

/// Everything a rule may look at.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// The record being admitted or the post-update state of a record.
    pub candidate: &'a UserCandidate,
    /// Live records the candidate must not collide with. When validating an
    /// update, the record being updated is not in this list.
    pub existing: &'a [UserRecord],
    /// Evaluation date for time-dependent rules.
    pub today: NaiveDate,
}

/// A pure admissibility predicate.
pub trait Rule: Send + Sync {
    /// Stable rule name, used in logs.
    fn name(&self) -> &'static str;

    /// Check the candidate.
    ///
    /// # Errors
    ///
    /// Returns the [`Violation`] this rule detected.
    fn check(&self, ctx: &RuleContext<'_>) -> Result<(), Violation>;
}
