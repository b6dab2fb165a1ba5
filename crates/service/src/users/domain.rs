use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Densely packed identifier starting at 1. Ids above a deleted one shift down by one.
/// Signed so that zero or negative ids from callers resolve to NotFound.
pub type UserId = i64;

/// A stored user. Every field is required on creation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRecord {
    pub username: String,
    pub email: String,
    pub age: i64,
    pub password: String,
    pub is_active: bool,
}

/// Update payload: `None` (omitted or `null`) leaves the stored field untouched.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PartialRecord {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub age: Option<i64>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl PartialRecord {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.age.is_none()
            && self.password.is_none()
            && self.is_active.is_none()
    }

    /// Overwrite the fields present in `self`.
    pub fn apply_to(self, record: &mut UserRecord) {
        if let Some(username) = self.username { record.username = username; }
        if let Some(email) = self.email { record.email = email; }
        if let Some(age) = self.age { record.age = age; }
        if let Some(password) = self.password { record.password = password; }
        if let Some(is_active) = self.is_active { record.is_active = is_active; }
    }
}

/// Result of listing the store. `Empty` is a normal outcome, not an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Listing {
    Empty,
    Users(BTreeMap<UserId, UserRecord>),
}

impl Listing {
    pub fn len(&self) -> usize {
        match self {
            Listing::Empty => 0,
            Listing::Users(users) => users.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Listing::Empty)
    }
}
