//! Conversions from external infrastructure errors into domain errors.

use reqwest::Error as HttpError;
use smartcal_domain::{ConnectivityFailure, SmartCalError};
use thiserror::Error;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct InfraError(pub SmartCalError);

impl From<InfraError> for SmartCalError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<SmartCalError> for InfraError {
    fn from(value: SmartCalError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoSmartCalError {
    fn into_smartcal(self) -> SmartCalError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → SmartCalError */
/* -------------------------------------------------------------------------- */

impl IntoSmartCalError for HttpError {
    fn into_smartcal(self) -> SmartCalError {
        if self.is_timeout() {
            return SmartCalError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return SmartCalError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => SmartCalError::Auth(message),
                404 => SmartCalError::NotFound(message),
                400..=499 => SmartCalError::InvalidInput(message),
                _ => SmartCalError::Network(message),
            };
        }

        if self.is_decode() {
            return SmartCalError::Internal(format!("unexpected response body: {self}"));
        }

        SmartCalError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_smartcal())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → ConnectivityFailure */
/* -------------------------------------------------------------------------- */

/// Classify a failed health request.
pub fn classify_connectivity(err: &HttpError) -> ConnectivityFailure {
    if err.is_timeout() {
        ConnectivityFailure::Timeout
    } else if err.is_connect() {
        ConnectivityFailure::ConnectionRefused
    } else if let Some(status) = err.status() {
        ConnectivityFailure::HttpError(status.as_u16())
    } else if err.is_request() || err.is_body() {
        ConnectivityFailure::NoResponse
    } else {
        ConnectivityFailure::Unknown(err.to_string())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
