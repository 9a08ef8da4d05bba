//! Test fixtures for user records.

use chrono::{Months, NaiveDate};
use rollcall_core::{FixedClock, PasswordHash, UserCandidate};
use std::sync::Arc;

/// Evaluation date used by [`test_clock`].
#[must_use]
pub fn test_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap_or_default()
}

/// A clock pinned to noon UTC on [`test_today`].
#[must_use]
pub fn test_clock() -> Arc<FixedClock> {
    FixedClock::at_date(test_today()).shared()
}

/// A clock pinned to noon UTC on `date`.
#[must_use]
pub fn test_clock_at(date: NaiveDate) -> Arc<FixedClock> {
    FixedClock::at_date(date).shared()
}

/// The date exactly `years` years before `date`. Feb 29 maps to Feb 28.
#[must_use]
pub fn years_before(date: NaiveDate, years: u32) -> NaiveDate {
    date.checked_sub_months(Months::new(years.saturating_mul(12)))
        .unwrap_or(NaiveDate::MIN)
}

/// The canonical valid candidate.
#[must_use]
pub fn test_candidate() -> UserCandidate {
    test_candidate_with("test.user@example.com", "testuser123")
}

/// A valid adult candidate with the given identity.
#[must_use]
pub fn test_candidate_with(email: impl Into<String>, username: impl Into<String>) -> UserCandidate {
    UserCandidate::new(
        email,
        username,
        PasswordHash::new("$2a$12$test.hash.value"),
        NaiveDate::from_ymd_opt(1990, 1, 15).unwrap_or_default(),
    )
    .with_name("Test", "User")
    .with_phone_number("+1-555-123-4567")
}

/// A candidate numbered `n`, for tests that need many distinct users.
#[must_use]
pub fn numbered_candidate(n: usize) -> UserCandidate {
    test_candidate_with(format!("user{n}@example.com"), format!("user{n}"))
}
