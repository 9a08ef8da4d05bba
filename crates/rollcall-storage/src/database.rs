//! The store handle.

use rollcall_core::{Clock, UserId, UserRecord};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::check::AgeCheck;
use crate::filter::{Rows, UserFilter};
use crate::journal::JournalRecord;
use crate::tables::Tables;
use crate::transaction::Transaction;

/// In-memory transactional identity store.
///
/// Cloning is cheap and yields a handle to the same tables.
#[derive(Clone, Default)]
pub struct Database {
    tables: Arc<Mutex<Tables>>,
    age_check: Option<AgeCheck>,
}

impl Database {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Enforce the `minimum_age` check on every live row written through
    /// this handle, judged against `clock`'s current date.
    ///
    /// Clones made afterwards share the check; handles cloned before do not.
    #[must_use]
    pub fn with_minimum_age(mut self, minimum: u32, clock: Arc<dyn Clock>) -> Self {
        self.age_check = Some(AgeCheck::new(minimum, clock));
        self
    }

    /// Wrap in an Arc for sharing.
    #[must_use]
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Start a write transaction.
    ///
    /// Waits until no other transaction is open.
    pub async fn begin(&self) -> Transaction {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        Transaction::new(guard, self.age_check.clone())
    }

    /// Query user rows.
    ///
    /// The returned [`Rows`] holds a snapshot taken at call time; the filter
    /// is applied while iterating.
    pub async fn query(&self, filter: UserFilter) -> Rows {
        let tables = self.tables.lock().await;
        let snapshot: Vec<Arc<UserRecord>> = tables.users.values().cloned().collect();
        Rows::new(snapshot.into(), filter)
    }

    /// Fetch one row by id, live or not.
    pub async fn get(&self, id: UserId) -> Option<UserRecord> {
        let tables = self.tables.lock().await;
        tables.users.get(&id).map(|r| (**r).clone())
    }

    /// Number of user rows, live or not.
    pub async fn user_count(&self) -> usize {
        self.tables.lock().await.users.len()
    }

    /// Journal rows for one user, in sequence order.
    pub async fn journal(&self, user_id: UserId) -> Vec<JournalRecord> {
        let tables = self.tables.lock().await;
        tables.journal.get(&user_id).cloned().unwrap_or_default()
    }

    /// Every journal row, grouped by user and in sequence order per user.
    pub async fn journal_all(&self) -> Vec<JournalRecord> {
        let tables = self.tables.lock().await;
        tables.journal.values().flatten().cloned().collect()
    }

    /// Total number of journal rows.
    pub async fn journal_len(&self) -> usize {
        self.tables.lock().await.journal_len()
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("age_check", &self.age_check)
            .finish_non_exhaustive()
    }
}
