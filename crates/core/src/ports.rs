//! Port interfaces for the backend collaborator and the authorization surface
//!
//! These traits define the boundaries between core business logic and the
//! infrastructure implementations (HTTP backend, browser process).

use std::sync::Weak;
use std::time::Duration;

use async_trait::async_trait;
use smartcal_domain::{
    ConnectivityFailure, CreationConfirmation, CreationFailure, EventPayload, ParsedEvent, Result,
    UserId,
};
use thiserror::Error;

/// Backend health endpoint
#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// Returns a short status detail when the backend answered successfully.
    async fn check_health(&self) -> std::result::Result<String, ConnectivityFailure>;
}

/// User as known to the backend after registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredUser {
    pub user_id: UserId,
    pub display_name: String,
    pub contact_address: String,
}

/// Registration / login
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// Register (or re-register) a user and return the backend identity
    async fn register(&self, display_name: &str, contact_address: &str) -> Result<RegisteredUser>;
}

/// Natural-language parser
#[async_trait]
pub trait EventParser: Send + Sync {
    /// Parse free text. An unsuccessful interpretation is `Ok` with
    /// `successful == false`; `Err` is reserved for transport failures.
    async fn parse(&self, text: &str) -> Result<ParsedEvent>;
}

/// Per-user calendar authorization on the backend
#[async_trait]
pub trait AuthorizationBackend: Send + Sync {
    /// `true` when the user still has to grant calendar access
    async fn needs_authorization(&self, user_id: &UserId) -> Result<bool>;

    /// URL of the provider consent page for this user
    async fn authorization_url(&self, user_id: &UserId) -> Result<String>;

    /// Drop whatever the backend cached for this user, forcing a new consent
    async fn forget_authorization(&self, user_id: &UserId) -> Result<()>;
}

/// Create-event call
#[async_trait]
pub trait EventCreator: Send + Sync {
    async fn create_event(
        &self,
        user_id: &UserId,
        payload: &EventPayload,
        timeout: Duration,
    ) -> std::result::Result<CreationConfirmation, CreationFailure>;
}

/// A window the user completes authorization in.
///
/// The core only observes it; there is no completion callback.
pub trait ExternalSurface: Send + Sync {
    /// Whether the user (or anything else) has closed the surface
    fn is_closed(&self) -> bool;

    /// Close the surface if it is still open
    fn close(&self);
}

/// Surface could not be opened at all
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("authorization surface blocked: {0}")]
pub struct SurfaceBlocked(pub String);

/// Opens external authorization surfaces.
///
/// The launcher owns the surfaces it opens; callers only get a `Weak`
/// reference. A surface that can no longer be upgraded counts as closed.
pub trait SurfaceLauncher: Send + Sync {
    fn open(&self, url: &str) -> std::result::Result<Weak<dyn ExternalSurface>, SurfaceBlocked>;
}
