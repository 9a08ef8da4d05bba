//! Write transactions with undo-log rollback.

use rollcall_core::{UserId, UserRecord};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, warn};

use crate::check::AgeCheck;
use crate::error::{StorageError, StorageResult};
use crate::filter::UserFilter;
use crate::journal::JournalRecord;
use crate::tables::Tables;

static NEXT_TX_ID: AtomicU64 = AtomicU64::new(1);

/// Inverse of one applied write.
#[derive(Debug)]
enum Undo {
    /// Restore the row that `put_user` replaced, or remove the inserted row.
    User {
        id: UserId,
        previous: Option<Arc<UserRecord>>,
    },
    /// Re-insert rows removed by `clear_users`.
    Users(Vec<Arc<UserRecord>>),
    /// Drop the last journal row of a user.
    JournalAppend(UserId),
    /// Restore the journal wiped by `clear_journal`.
    Journal(BTreeMap<UserId, Vec<JournalRecord>>),
}

/// An exclusive write transaction over the store.
///
/// Holds the store lock for its whole lifetime. Call [`commit`](Self::commit)
/// to keep the writes; any other way of dropping it rolls them back.
#[derive(Debug)]
pub struct Transaction {
    id: u64,
    tables: OwnedMutexGuard<Tables>,
    age_check: Option<AgeCheck>,
    undo: Vec<Undo>,
    committed: bool,
}

impl Transaction {
    pub(crate) fn new(tables: OwnedMutexGuard<Tables>, age_check: Option<AgeCheck>) -> Self {
        let id = NEXT_TX_ID.fetch_add(1, Ordering::Relaxed);
        debug!(tx = id, "transaction started");
        Self {
            id,
            tables,
            age_check,
            undo: Vec::new(),
            committed: false,
        }
    }

    /// Transaction number, for log correlation.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Insert a new user row.
    ///
    /// This is the authoritative uniqueness check: it runs under the store
    /// lock, so of two racing inserts with the same email or username exactly
    /// one gets past it.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::UniqueViolation`] if a live row already holds
    /// the email or username, [`StorageError::CheckViolation`] if the row
    /// fails the age check, or [`StorageError::Internal`] if the id is
    /// already taken.
    pub fn insert_user(&mut self, record: UserRecord) -> StorageResult<UserRecord> {
        if self.tables.users.contains_key(&record.id) {
            return Err(StorageError::Internal(format!(
                "primary key {} already exists",
                record.id
            )));
        }
        self.check_row(&record)?;
        if let Some(field) = self.tables.conflict(&record) {
            debug!(tx = self.id, %field, "unique index rejected insert");
            return Err(StorageError::UniqueViolation { field });
        }

        let id = record.id;
        let previous = self.tables.put_user(Arc::new(record.clone()));
        self.undo.push(Undo::User { id, previous });
        Ok(record)
    }

    /// Replace an existing user row and return the row it replaced.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if no row has this id,
    /// [`StorageError::CheckViolation`] if the new row fails the age check, or
    /// [`StorageError::UniqueViolation`] if the new values collide with
    /// another live row.
    pub fn update_user(&mut self, record: UserRecord) -> StorageResult<UserRecord> {
        if !self.tables.users.contains_key(&record.id) {
            return Err(StorageError::NotFound(record.id.to_string()));
        }
        self.check_row(&record)?;
        if let Some(field) = self.tables.conflict(&record) {
            debug!(tx = self.id, %field, "unique index rejected update");
            return Err(StorageError::UniqueViolation { field });
        }

        let id = record.id;
        let previous = self.tables.put_user(Arc::new(record));
        let replaced = previous
            .as_deref()
            .cloned()
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        self.undo.push(Undo::User { id, previous });
        Ok(replaced)
    }

    fn check_row(&self, record: &UserRecord) -> StorageResult<()> {
        if let Some(check) = &self.age_check {
            check.check(record).inspect_err(|err| {
                debug!(tx = self.id, error = %err, "check constraint rejected row");
            })?;
        }
        Ok(())
    }

    /// Fetch a row as seen by this transaction.
    #[must_use]
    pub fn get_user(&self, id: UserId) -> Option<UserRecord> {
        self.tables.users.get(&id).map(|r| (**r).clone())
    }

    /// All rows matching `filter`, as seen by this transaction.
    #[must_use]
    pub fn find(&self, filter: &UserFilter) -> Vec<UserRecord> {
        self.tables
            .users
            .values()
            .filter(|r| filter.matches(r))
            .map(|r| (**r).clone())
            .collect()
    }

    /// Remove every user row and return them.
    ///
    /// Journal rows are left alone.
    pub fn clear_users(&mut self) -> Vec<UserRecord> {
        let removed = self.tables.take_users();
        let rows = removed.iter().map(|r| (**r).clone()).collect();
        self.undo.push(Undo::Users(removed));
        rows
    }

    /// Latest journal row for a user.
    #[must_use]
    pub fn journal_head(&self, user_id: UserId) -> Option<&JournalRecord> {
        self.tables.journal.get(&user_id).and_then(|rows| rows.last())
    }

    /// Append a journal row.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ForeignKeyViolation`] if the user row does not
    /// exist, or [`StorageError::SequenceConflict`] if the sequence is not
    /// exactly one past the user's current head.
    pub fn append_journal(&mut self, record: JournalRecord) -> StorageResult<()> {
        if !self.tables.users.contains_key(&record.user_id) {
            return Err(StorageError::ForeignKeyViolation(format!(
                "journal row references missing {}",
                record.user_id
            )));
        }

        let head = self.journal_head(record.user_id).map_or(0, |r| r.sequence);
        let expected = head.checked_add(1).ok_or_else(|| {
            StorageError::Internal(format!("journal sequence exhausted for {}", record.user_id))
        })?;
        if record.sequence != expected {
            return Err(StorageError::SequenceConflict {
                user: record.user_id.to_string(),
                expected,
                found: record.sequence,
            });
        }

        let user_id = record.user_id;
        self.tables.journal.entry(user_id).or_default().push(record);
        self.undo.push(Undo::JournalAppend(user_id));
        Ok(())
    }

    /// Delete every journal row and return how many were removed.
    pub fn clear_journal(&mut self) -> usize {
        let removed = std::mem::take(&mut self.tables.journal);
        let count = removed.values().map(Vec::len).sum();
        self.undo.push(Undo::Journal(removed));
        count
    }

    /// Make the writes permanent and release the lock.
    pub fn commit(mut self) {
        self.committed = true;
        debug!(tx = self.id, writes = self.undo.len(), "transaction committed");
        self.undo.clear();
    }

    fn rollback(&mut self) {
        let writes = self.undo.len();
        while let Some(step) = self.undo.pop() {
            match step {
                Undo::User { id, previous } => {
                    match previous {
                        Some(prev) => {
                            self.tables.put_user(prev);
                        },
                        None => {
                            self.tables.remove_user(id);
                        },
                    }
                },
                Undo::Users(rows) => {
                    for row in rows {
                        self.tables.put_user(row);
                    }
                },
                Undo::JournalAppend(user_id) => {
                    if let Some(rows) = self.tables.journal.get_mut(&user_id) {
                        rows.pop();
                        if rows.is_empty() {
                            self.tables.journal.remove(&user_id);
                        }
                    }
                },
                Undo::Journal(journal) => {
                    self.tables.journal = journal;
                },
            }
        }
        if writes > 0 {
            warn!(tx = self.id, writes, "transaction rolled back");
        }
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if !self.committed {
            self.rollback();
        }
    }
}
