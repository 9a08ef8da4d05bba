//! In-memory table layout and index maintenance.

use rollcall_core::{IdentityField, UserId, UserRecord};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::journal::JournalRecord;

/// Everything guarded by the store lock.
#[derive(Debug, Default)]
pub(crate) struct Tables {
    pub(crate) users: BTreeMap<UserId, Arc<UserRecord>>,
    emails: HashMap<String, UserId>,
    usernames: HashMap<String, UserId>,
    pub(crate) journal: BTreeMap<UserId, Vec<JournalRecord>>,
}

impl Tables {
    fn index(&self, field: IdentityField) -> &HashMap<String, UserId> {
        match field {
            IdentityField::Email => &self.emails,
            IdentityField::Username => &self.usernames,
        }
    }

    fn index_mut(&mut self, field: IdentityField) -> &mut HashMap<String, UserId> {
        match field {
            IdentityField::Email => &mut self.emails,
            IdentityField::Username => &mut self.usernames,
        }
    }

    /// First unique index that `record` would collide with, if any.
    ///
    /// Only live rows take part in uniqueness, and a row never collides with
    /// itself.
    pub(crate) fn conflict(&self, record: &UserRecord) -> Option<IdentityField> {
        if !record.is_live() {
            return None;
        }
        IdentityField::ALL.into_iter().find(|field| {
            self.index(*field)
                .get(record.identity(*field))
                .is_some_and(|owner| *owner != record.id)
        })
    }

    /// Store `record`, replacing any row with the same id, and return the
    /// replaced row.
    pub(crate) fn put_user(&mut self, record: Arc<UserRecord>) -> Option<Arc<UserRecord>> {
        let previous = self.users.insert(record.id, Arc::clone(&record));
        if let Some(prev) = &previous {
            self.unindex(prev);
        }
        self.index_live(&record);
        previous
    }

    /// Remove a row and its index entries.
    pub(crate) fn remove_user(&mut self, id: UserId) -> Option<Arc<UserRecord>> {
        let previous = self.users.remove(&id);
        if let Some(prev) = &previous {
            self.unindex(prev);
        }
        previous
    }

    /// Remove every row. Indexes are emptied with them.
    pub(crate) fn take_users(&mut self) -> Vec<Arc<UserRecord>> {
        self.emails.clear();
        self.usernames.clear();
        std::mem::take(&mut self.users).into_values().collect()
    }

    pub(crate) fn journal_len(&self) -> usize {
        self.journal.values().map(Vec::len).sum()
    }

    fn index_live(&mut self, record: &UserRecord) {
        if !record.is_live() {
            return;
        }
        for field in IdentityField::ALL {
            let key = record.identity(field).to_owned();
            self.index_mut(field).insert(key, record.id);
        }
    }

    fn unindex(&mut self, record: &UserRecord) {
        for field in IdentityField::ALL {
            let index = self.index_mut(field);
            if index.get(record.identity(field)) == Some(&record.id) {
                index.remove(record.identity(field));
            }
        }
    }
}
