//! Row filters and query results.

use rollcall_core::{UserId, UserRecord};
use std::sync::Arc;

/// Predicate over user rows. String matches are exact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserFilter {
    /// Every row, including soft-deleted ones.
    All,
    /// Rows that have not been deleted.
    Live,
    /// The row with this id.
    Id(UserId),
    /// Rows with this email.
    Email(String),
    /// Rows with this username.
    Username(String),
}

impl UserFilter {
    /// Match by email.
    #[must_use]
    pub fn email(email: impl Into<String>) -> Self {
        Self::Email(email.into())
    }

    /// Match by username.
    #[must_use]
    pub fn username(username: impl Into<String>) -> Self {
        Self::Username(username.into())
    }

    /// Whether `record` satisfies the filter.
    #[must_use]
    pub fn matches(&self, record: &UserRecord) -> bool {
        match self {
            Self::All => true,
            Self::Live => record.is_live(),
            Self::Id(id) => record.id == *id,
            Self::Email(email) => record.email == *email,
            Self::Username(username) => record.username == *username,
        }
    }
}

/// Result of a query: a snapshot plus a lazily applied filter.
///
/// Iteration can be restarted any number of times and always yields the same
/// rows; later writes to the store are not reflected.
#[derive(Debug, Clone)]
pub struct Rows {
    snapshot: Arc<[Arc<UserRecord>]>,
    filter: UserFilter,
}

impl Rows {
    pub(crate) fn new(snapshot: Arc<[Arc<UserRecord>]>, filter: UserFilter) -> Self {
        Self { snapshot, filter }
    }

    /// Iterate over matching rows.
    #[must_use]
    pub fn iter(&self) -> RowsIter<'_> {
        RowsIter {
            inner: self.snapshot.iter(),
            filter: &self.filter,
        }
    }

    /// Number of matching rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Whether no row matches.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// First matching row.
    #[must_use]
    pub fn first(&self) -> Option<&UserRecord> {
        self.iter().next()
    }

    /// Clone the matching rows out of the snapshot.
    #[must_use]
    pub fn to_vec(&self) -> Vec<UserRecord> {
        self.iter().cloned().collect()
    }
}

impl<'a> IntoIterator for &'a Rows {
    type Item = &'a UserRecord;
    type IntoIter = RowsIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the rows of a [`Rows`] snapshot.
#[derive(Debug)]
pub struct RowsIter<'a> {
    inner: std::slice::Iter<'a, Arc<UserRecord>>,
    filter: &'a UserFilter,
}

impl<'a> Iterator for RowsIter<'a> {
    type Item = &'a UserRecord;

    fn next(&mut self) -> Option<Self::Item> {
        let filter = self.filter;
        self.inner
            .by_ref()
            .map(|record| &**record)
            .find(|record| filter.matches(record))
    }
}
