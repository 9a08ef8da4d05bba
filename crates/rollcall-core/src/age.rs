//! Calendar age.

use chrono::{Datelike, NaiveDate};

/// Age in whole years on `today` for someone born on `date_of_birth`.
///
/// One year is subtracted while this year's birthday is still ahead, so a
/// Feb 29 birthday only turns over on Mar 1 in common years. A date of birth
/// in the future gives a negative age.
#[must_use]
pub fn age_on(date_of_birth: NaiveDate, today: NaiveDate) -> i32 {
    let years = today.year().saturating_sub(date_of_birth.year());
    let birthday_pending =
        (today.month(), today.day()) < (date_of_birth.month(), date_of_birth.day());
    if birthday_pending {
        years.saturating_sub(1)
    } else {
        years
    }
}
