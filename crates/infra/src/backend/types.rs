//! Wire types for the calendar backend
//!
//! Field names follow the backend's camelCase JSON. Everything optional on
//! the wire is optional here; the client decides what a missing field means.

use serde::{Deserialize, Serialize};

/// `GET /events/health`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HealthResponse {
    pub status: Option<String>,
    pub ai_parser_available: Option<bool>,
    pub active_users: Option<u64>,
    pub registered_users: Option<u64>,
}

impl HealthResponse {
    pub fn detail(&self) -> String {
        let status = self.status.as_deref().unwrap_or("OK");
        match self.ai_parser_available {
            Some(false) => format!("{status} (parser unavailable)"),
            _ => status.to_string(),
        }
    }
}

/// `POST /users/register` body
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
}

/// `POST /users/register` response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub user_id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// `POST /events/parse` body
#[derive(Debug, Clone, Serialize)]
pub struct ParseRequest<'a> {
    pub text: &'a str,
}

/// `GET /events/auth/check/{userId}`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthCheckResponse {
    pub needs_auth: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// `GET /events/auth/url/{userId}`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthUrlResponse {
    pub auth_url: Option<String>,
    pub message: Option<String>,
    pub error: Option<String>,
}

/// `POST /events/create` response, on success and on rejection alike
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateEventResponse {
    pub success: bool,
    pub message: Option<String>,
    pub error_code: Option<String>,
}

/// Generic `{error}` / `{message}` body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ErrorBody {
    pub error: Option<String>,
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn into_reason(self) -> Option<String> {
        self.error.or(self.message).filter(|reason| !reason.trim().is_empty())
    }
}
