//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for SmartCal
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum SmartCalError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SmartCalError {
    /// Which user-facing failure family this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Network(_) => ErrorCategory::Connectivity,
            Self::InvalidInput(_) | Self::NotFound(_) => ErrorCategory::Validation,
            Self::Auth(_) => ErrorCategory::Authorization,
            Self::Config(_) | Self::Platform(_) | Self::Internal(_) => ErrorCategory::Internal,
        }
    }
}

/// Result type alias for SmartCal operations
pub type Result<T> = std::result::Result<T, SmartCalError>;

/// Failure families surfaced to the user.
///
/// None of these are retried automatically; a retry is always a new explicit
/// user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Backend unreachable, timed out or answered with a failing status
    Connectivity,
    /// Bad user input, surfaced immediately
    Validation,
    /// Authorization window blocked, not completed or timed out
    Authorization,
    /// Event rejected by the backend, or transport failure after authorization
    Creation,
    /// Misconfiguration or a bug
    Internal,
}

/// Why the backend could not be reached.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ConnectivityFailure {
    #[error("connection refused")]
    ConnectionRefused,

    #[error("request timed out")]
    Timeout,

    #[error("backend answered with HTTP {0}")]
    HttpError(u16),

    #[error("no response received")]
    NoResponse,

    #[error("unknown connectivity failure: {0}")]
    Unknown(String),
}

impl ConnectivityFailure {
    /// Human-actionable hint for this failure.
    pub fn hint(&self) -> &'static str {
        match self {
            Self::ConnectionRefused => {
                "The backend refused the connection. Make sure the server is running and the \
                 base URL points at it."
            }
            Self::Timeout => {
                "The backend did not answer in time. It may still be starting up; try again in a \
                 moment."
            }
            Self::HttpError(status) if *status >= 500 => {
                "The backend is reachable but failing. Check the server logs."
            }
            Self::HttpError(_) => {
                "The backend rejected the health request. Check that the base URL includes the \
                 API prefix."
            }
            Self::NoResponse => {
                "The request was sent but nothing came back. Check your network connection and \
                 any proxy settings."
            }
            Self::Unknown(_) => "An unexpected error occurred while contacting the backend.",
        }
    }
}

/// Terminal failures of an authorization attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum AuthorizationFailure {
    #[error("authorization window blocked")]
    WindowBlocked,

    #[error("authorization not completed")]
    NotCompleted,

    #[error("authorization timed out")]
    TimedOut,

    #[error("authorization already in progress")]
    InProgress,

    #[error("authorization cancelled")]
    Cancelled,

    #[error("could not obtain authorization URL: {0}")]
    UrlUnavailable(String),

    #[error("could not check authorization status: {0}")]
    CheckFailed(String),
}

/// Failures of the create-event call itself.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum CreationFailure {
    /// The backend answered and said no (validation, unknown user, …)
    #[error("event rejected: {reason}")]
    Rejected { reason: String, error_code: Option<String> },

    /// Network failure or timeout
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<&AuthorizationFailure> for ErrorCategory {
    fn from(_: &AuthorizationFailure) -> Self {
        Self::Authorization
    }
}
