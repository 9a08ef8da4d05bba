//! User record data model.
//!
//! A [`UserCandidate`] is what a caller submits. Once the gateway admits it,
//! the store holds a [`UserRecord`]: the same fields plus the surrogate
//! [`UserId`] and lifecycle timestamps. Updates are expressed as a
//! [`UserPatch`] whose `None` fields are left untouched.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{IdentityField, UserId};

/// Opaque, externally computed password credential.
///
/// Rollcall never hashes or inspects this value. `Debug` output is redacted
/// so it cannot leak through logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap a pre-computed credential string.
    #[must_use]
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    /// The raw credential string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash([redacted])")
    }
}

/// A not-yet-committed user record submitted for validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCandidate {
    /// Email address (unique among live records).
    pub email: String,
    /// Login name (unique among live records).
    pub username: String,
    /// Pre-computed credential.
    pub password_hash: PasswordHash,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Calendar date of birth.
    pub date_of_birth: NaiveDate,
    /// Contact phone number.
    pub phone_number: String,
}

impl UserCandidate {
    /// Create a candidate with the two identity fields, credential and date
    /// of birth. Name and phone fields start empty.
    #[must_use]
    pub fn new(
        email: impl Into<String>,
        username: impl Into<String>,
        password_hash: PasswordHash,
        date_of_birth: NaiveDate,
    ) -> Self {
        Self {
            email: email.into(),
            username: username.into(),
            password_hash,
            first_name: String::new(),
            last_name: String::new(),
            date_of_birth,
            phone_number: String::new(),
        }
    }

    /// Set first and last name.
    #[must_use]
    pub fn with_name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = first.into();
        self.last_name = last.into();
        self
    }

    /// Set the phone number.
    #[must_use]
    pub fn with_phone_number(mut self, phone: impl Into<String>) -> Self {
        self.phone_number = phone.into();
        self
    }

    /// Set the date of birth.
    #[must_use]
    pub fn with_date_of_birth(mut self, date_of_birth: NaiveDate) -> Self {
        self.date_of_birth = date_of_birth;
        self
    }

    /// Value of a uniquely constrained field.
    #[must_use]
    pub fn identity(&self, field: IdentityField) -> &str {
        match field {
            IdentityField::Email => &self.email,
            IdentityField::Username => &self.username,
        }
    }

    /// Required string fields as `(column, value)` pairs.
    #[must_use]
    pub fn required_strings(&self) -> [(&'static str, &str); 6] {
        [
            ("email", &self.email),
            ("username", &self.username),
            ("password_hash", self.password_hash.as_str()),
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("phone_number", &self.phone_number),
        ]
    }
}

/// A user record as stored in the identity store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Surrogate identity.
    pub id: UserId,
    /// Email address.
    pub email: String,
    /// Login name.
    pub username: String,
    /// Pre-computed credential.
    pub password_hash: PasswordHash,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Calendar date of birth.
    pub date_of_birth: NaiveDate,
    /// Contact phone number.
    pub phone_number: String,
    /// When the record was first committed.
    pub created_at: DateTime<Utc>,
    /// When the record was last mutated.
    pub updated_at: DateTime<Utc>,
    /// Set when the record has been soft-deleted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl UserRecord {
    /// Materialise a candidate as a new record with a fresh [`UserId`].
    #[must_use]
    pub fn from_candidate(candidate: UserCandidate, now: DateTime<Utc>) -> Self {
        Self {
            id: UserId::new(),
            email: candidate.email,
            username: candidate.username,
            password_hash: candidate.password_hash,
            first_name: candidate.first_name,
            last_name: candidate.last_name,
            date_of_birth: candidate.date_of_birth,
            phone_number: candidate.phone_number,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Whether the record counts towards uniqueness and default queries.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Value of a uniquely constrained field.
    #[must_use]
    pub fn identity(&self, field: IdentityField) -> &str {
        match field {
            IdentityField::Email => &self.email,
            IdentityField::Username => &self.username,
        }
    }

    /// The mutable fields of this record, as a candidate.
    #[must_use]
    pub fn to_candidate(&self) -> UserCandidate {
        UserCandidate {
            email: self.email.clone(),
            username: self.username.clone(),
            password_hash: self.password_hash.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            date_of_birth: self.date_of_birth,
            phone_number: self.phone_number.clone(),
        }
    }

    /// Produce the record that results from applying `patch` at `now`.
    #[must_use]
    pub fn patched(&self, patch: UserPatch, now: DateTime<Utc>) -> Self {
        let mut next = self.clone();
        if let Some(email) = patch.email {
            next.email = email;
        }
        if let Some(username) = patch.username {
            next.username = username;
        }
        if let Some(hash) = patch.password_hash {
            next.password_hash = hash;
        }
        if let Some(first) = patch.first_name {
            next.first_name = first;
        }
        if let Some(last) = patch.last_name {
            next.last_name = last;
        }
        if let Some(dob) = patch.date_of_birth {
            next.date_of_birth = dob;
        }
        if let Some(phone) = patch.phone_number {
            next.phone_number = phone;
        }
        next.updated_at = now;
        next
    }
}

/// Partial update of a user record. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPatch {
    /// New email address.
    pub email: Option<String>,
    /// New login name.
    pub username: Option<String>,
    /// New credential.
    pub password_hash: Option<PasswordHash>,
    /// New given name.
    pub first_name: Option<String>,
    /// New family name.
    pub last_name: Option<String>,
    /// New date of birth.
    pub date_of_birth: Option<NaiveDate>,
    /// New phone number.
    pub phone_number: Option<String>,
}

impl UserPatch {
    /// An empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the email address.
    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Replace the username.
    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Replace the credential.
    #[must_use]
    pub fn password_hash(mut self, hash: PasswordHash) -> Self {
        self.password_hash = Some(hash);
        self
    }

    /// Replace the phone number.
    #[must_use]
    pub fn phone_number(mut self, phone: impl Into<String>) -> Self {
        self.phone_number = Some(phone.into());
        self
    }

    /// Replace the date of birth.
    #[must_use]
    pub fn date_of_birth(mut self, dob: NaiveDate) -> Self {
        self.date_of_birth = Some(dob);
        self
    }

    /// Whether no field would change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
