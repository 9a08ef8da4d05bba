//! Rollcall Storage - the identity store.
//!
//! Holds canonical user records and the raw audit journal in one
//! transactional engine, so a user mutation and its audit row commit or roll
//! back together.
//!
//! # Tables
//!
//! | Table | Key | Constraints |
//! |-------|-----|-------------|
//! | `users` | [`UserId`](rollcall_core::UserId) | unique `email`, unique `username`, `minimum_age` check (live rows only) |
//! | `journal` | `(UserId, sequence)` | user must exist, sequence is head + 1 |
//!
//! The age check is off for a bare [`Database::in_memory`] store and is
//! switched on with [`Database::with_minimum_age`].
//!
//! # Transactions
//!
//! [`Database::begin`] takes the store's exclusive lock and returns a
//! [`Transaction`]. Writes are applied in place and recorded in an undo log.
//! [`Transaction::commit`] keeps them; dropping the transaction in any other
//! way (an error path, an early return, a cancelled future) replays the undo
//! log. Because the lock is held until then, no other caller ever observes a
//! half-applied transaction.
//!
//! ```rust,ignore
//! use rollcall_storage::{Database, UserFilter};
//!
//! let db = Database::in_memory();
//! let mut tx = db.begin().await;
//! tx.insert_user(record)?;
//! tx.commit();
//!
//! let rows = db.query(UserFilter::email("test.user@example.com")).await;
//! assert_eq!(rows.len(), 1);
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod check;
mod database;
mod error;
mod filter;
mod journal;
mod tables;
mod transaction;

pub use check::MINIMUM_AGE_CONSTRAINT;
pub use database::Database;
pub use error::{StorageError, StorageResult};
pub use filter::{Rows, RowsIter, UserFilter};
pub use journal::JournalRecord;
pub use transaction::Transaction;
