//! Authorization state and attempt bookkeeping

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AuthorizationFailure;
use crate::impl_domain_status_conversions;

/// Whether the active session may create calendar events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationState {
    #[default]
    Unknown,
    Checking,
    Authorized,
    Unauthorized,
}

impl_domain_status_conversions!(AuthorizationState {
    Unknown => "unknown",
    Checking => "checking",
    Authorized => "authorized",
    Unauthorized => "unauthorized",
});

impl AuthorizationState {
    /// Map the backend's `needsAuth` flag.
    pub fn from_needs_authorization(needs_authorization: bool) -> Self {
        if needs_authorization {
            Self::Unauthorized
        } else {
            Self::Authorized
        }
    }

    pub fn is_authorized(self) -> bool {
        matches!(self, Self::Authorized)
    }
}

/// Identity of one authorization attempt. Time-ordered (UUID v7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttemptId(Uuid);

impl AttemptId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AttemptId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle of an authorization attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum AttemptStatus {
    Pending,
    Succeeded,
    Failed(AuthorizationFailure),
    TimedOut,
}

impl AttemptStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// The failure a resolved, unsuccessful attempt reports.
    pub fn failure(&self) -> Option<AuthorizationFailure> {
        match self {
            Self::Failed(reason) => Some(reason.clone()),
            Self::TimedOut => Some(AuthorizationFailure::TimedOut),
            Self::Pending | Self::Succeeded => None,
        }
    }
}
