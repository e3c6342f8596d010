//! Session types
//!
//! A session exists only in memory, from a successful registration until
//! logout.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Backend-assigned user identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// The logged-in user.
///
/// `session_id` is minted per login, so logging in twice as the same user
/// still counts as a session change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: Uuid,
    pub user_id: UserId,
    pub display_name: String,
    pub contact_address: String,
}

impl Session {
    pub fn new(
        user_id: UserId,
        display_name: impl Into<String>,
        contact_address: impl Into<String>,
    ) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            user_id,
            display_name: display_name.into(),
            contact_address: contact_address.into(),
        }
    }

    /// Whether `other` is the very same login (not merely the same user).
    pub fn same_login(&self, other: &Self) -> bool {
        self.session_id == other.session_id
    }
}
