//! Built-in rules.

use rollcall_core::{IdentityField, age_on};

use crate::rule::{Rule, RuleContext};
use crate::violation::Violation;

/// Every required string field must be non-blank.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiredFields;

impl Rule for RequiredFields {
    fn name(&self) -> &'static str {
        "required_field"
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Result<(), Violation> {
        match ctx
            .candidate
            .required_strings()
            .into_iter()
            .find(|(_, value)| value.trim().is_empty())
        {
            Some((field, _)) => Err(Violation::MissingField { field }),
            None => Ok(()),
        }
    }
}

/// No live record may share this field's value with the candidate.
#[derive(Debug, Clone, Copy)]
pub struct UniqueIdentity(pub IdentityField);

impl Rule for UniqueIdentity {
    fn name(&self) -> &'static str {
        match self.0 {
            IdentityField::Email => "unique_email",
            IdentityField::Username => "unique_username",
        }
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Result<(), Violation> {
        let field = self.0;
        let value = ctx.candidate.identity(field);
        let taken = ctx
            .existing
            .iter()
            .any(|record| record.is_live() && record.identity(field) == value);
        if taken {
            Err(Violation::DuplicateIdentity { field })
        } else {
            Ok(())
        }
    }
}

/// Candidate must be at least `years` old on the evaluation date.
#[derive(Debug, Clone, Copy)]
pub struct MinimumAge {
    /// Minimum age in whole years, inclusive.
    pub years: u32,
}

impl Rule for MinimumAge {
    fn name(&self) -> &'static str {
        "minimum_age"
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Result<(), Violation> {
        let age = age_on(ctx.candidate.date_of_birth, ctx.today);
        let old_enough = u32::try_from(age).is_ok_and(|age| age >= self.years);
        if old_enough {
            Ok(())
        } else {
            Err(Violation::AgeBelowMinimum {
                minimum: self.years,
                age,
            })
        }
    }
}
