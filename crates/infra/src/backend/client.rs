//! HTTP client for the calendar backend
//!
//! Implements every backend port the core needs against the REST routes
//! under the configured base URL (`…/api`).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use smartcal_core::{
    AccountDirectory, AuthorizationBackend, EventCreator, EventParser, HealthCheck,
    RegisteredUser,
};
use smartcal_domain::constants::USER_ID_HEADER;
use smartcal_domain::{
    BackendConfig, ConnectivityFailure, CreationConfirmation, CreationFailure, EventPayload,
    ParsedEvent, Result, SmartCalError, UserId,
};
use tracing::{debug, instrument, warn};
use url::Url;

use super::types::{
    AuthCheckResponse, AuthUrlResponse, CreateEventResponse, ErrorBody, HealthResponse,
    ParseRequest, RegisterRequest, RegisterResponse,
};
use crate::errors::{classify_connectivity, InfraError};
use crate::http::HttpClient;

/// Backend client
#[derive(Clone)]
pub struct BackendClient {
    http: HttpClient,
    base_url: String,
    health_timeout: Duration,
}

impl BackendClient {
    /// Build a client for the configured backend.
    ///
    /// # Errors
    /// `Config` if the base URL does not parse; otherwise whatever building
    /// the HTTP client failed with.
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let base_url = config.resolved_base_url();
        Url::parse(&base_url).map_err(|err| {
            SmartCalError::Config(format!("invalid backend URL {base_url}: {err}"))
        })?;

        let http = HttpClient::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("smartcal/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, base_url, health_timeout: config.health_timeout() })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.http.send(self.http.request(Method::GET, self.url(path))).await?;
        ensure_success(response).await?.json().await.map_err(decode_error)
    }
}

#[async_trait]
impl HealthCheck for BackendClient {
    #[instrument(skip(self))]
    async fn check_health(&self) -> std::result::Result<String, ConnectivityFailure> {
        let request =
            self.http.request(Method::GET, self.url("/events/health")).timeout(self.health_timeout);
        let response =
            self.http.execute(request).await.map_err(|err| classify_connectivity(&err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConnectivityFailure::HttpError(status.as_u16()));
        }

        // Older backends answer with a plain string; reachability is what counts.
        let body: HealthResponse = response.json().await.unwrap_or_default();
        Ok(body.detail())
    }
}

#[async_trait]
impl AccountDirectory for BackendClient {
    #[instrument(skip(self, contact_address))]
    async fn register(&self, display_name: &str, contact_address: &str) -> Result<RegisteredUser> {
        let request = self
            .http
            .request(Method::POST, self.url("/users/register"))
            .json(&RegisterRequest { username: display_name, email: contact_address });
        let response = ensure_success(self.http.send(request).await?).await?;
        let body: RegisterResponse = response.json().await.map_err(decode_error)?;

        debug!(user_id = %body.user_id, "user registered");
        Ok(RegisteredUser {
            user_id: UserId::new(body.user_id),
            display_name: body.username.unwrap_or_else(|| display_name.to_string()),
            contact_address: body.email.unwrap_or_else(|| contact_address.to_string()),
        })
    }
}

#[async_trait]
impl EventParser for BackendClient {
    #[instrument(skip(self, text))]
    async fn parse(&self, text: &str) -> Result<ParsedEvent> {
        let request =
            self.http.request(Method::POST, self.url("/events/parse")).json(&ParseRequest { text });
        let response = self.http.send(request).await?;
        let status = response.status();
        let raw = response.text().await.map_err(decode_error)?;

        // Unsuccessful interpretations come back as 400/500 with a full body.
        match serde_json::from_str::<ParsedEvent>(&raw) {
            Ok(parsed) => {
                debug!(%status, successful = parsed.successful, "parse response");
                Ok(parsed)
            }
            Err(err) if status.is_success() => {
                Err(SmartCalError::Internal(format!("unexpected parse response: {err}")))
            }
            Err(_) => Err(map_status_error(status, reason_from(&raw))),
        }
    }
}

#[async_trait]
impl AuthorizationBackend for BackendClient {
    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn needs_authorization(&self, user_id: &UserId) -> Result<bool> {
        let path = format!("/events/auth/check/{}", user_id.as_str());
        let body: AuthCheckResponse = self.get_json(&path).await?;

        if let Some(error) = body.error.as_deref() {
            warn!(error, "backend reported an authorization check problem");
        }
        Ok(body.needs_auth)
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn authorization_url(&self, user_id: &UserId) -> Result<String> {
        let path = format!("/events/auth/url/{}", user_id.as_str());
        let body: AuthUrlResponse = self.get_json(&path).await?;

        match body.auth_url.filter(|url| !url.trim().is_empty()) {
            Some(auth_url) => Ok(auth_url),
            None => Err(SmartCalError::NotFound(
                body.error
                    .or(body.message)
                    .unwrap_or_else(|| "no authorization URL returned".into()),
            )),
        }
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn forget_authorization(&self, user_id: &UserId) -> Result<()> {
        let url = self.url(&format!("/events/cache/{}", user_id.as_str()));
        let response = self.http.send(self.http.request(Method::DELETE, url)).await?;
        ensure_success(response).await?;
        Ok(())
    }
}

#[async_trait]
impl EventCreator for BackendClient {
    #[instrument(skip(self, payload), fields(user_id = %user_id, title = %payload.title))]
    async fn create_event(
        &self,
        user_id: &UserId,
        payload: &EventPayload,
        timeout: Duration,
    ) -> std::result::Result<CreationConfirmation, CreationFailure> {
        let request = self
            .http
            .request(Method::POST, self.url("/events/create"))
            .header(USER_ID_HEADER, user_id.as_str())
            .timeout(timeout)
            .json(payload);

        let response = self.http.execute(request).await.map_err(|err| {
            CreationFailure::Transport(SmartCalError::from(InfraError::from(err)).to_string())
        })?;
        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|err| CreationFailure::Transport(format!("failed to read response: {err}")))?;

        let Ok(body) = serde_json::from_str::<CreateEventResponse>(&raw) else {
            return Err(CreationFailure::Transport(format!(
                "backend answered HTTP {} without a readable body",
                status.as_u16()
            )));
        };

        if status.is_success() && body.success {
            return Ok(CreationConfirmation {
                message: body.message.unwrap_or_else(|| "Event created".into()),
                error_code: body.error_code,
            });
        }

        let reason = body
            .message
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| format!("backend rejected the event (HTTP {})", status.as_u16()));
        Err(CreationFailure::Rejected { reason, error_code: body.error_code })
    }
}

/// Pass successful responses through; turn anything else into a domain error
/// carrying the backend's own explanation when there is one.
async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let raw = response.text().await.unwrap_or_default();
    Err(map_status_error(status, reason_from(&raw)))
}

fn reason_from(raw: &str) -> String {
    serde_json::from_str::<ErrorBody>(raw)
        .ok()
        .and_then(ErrorBody::into_reason)
        .unwrap_or_else(|| raw.trim().to_string())
}

fn map_status_error(status: StatusCode, reason: String) -> SmartCalError {
    let message = if reason.is_empty() {
        format!("backend returned status {status}")
    } else {
        format!("backend returned status {status}: {reason}")
    };

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        SmartCalError::Auth(message)
    } else if status == StatusCode::NOT_FOUND {
        SmartCalError::NotFound(message)
    } else if status.is_client_error() {
        SmartCalError::InvalidInput(message)
    } else {
        SmartCalError::Network(message)
    }
}

fn decode_error(err: reqwest::Error) -> SmartCalError {
    InfraError::from(err).into()
}
