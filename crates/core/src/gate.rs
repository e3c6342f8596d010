//! Event creation gate
//!
//! Owns the confirmed payload while authorization is sorted out, then issues
//! exactly one create call for it.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use smartcal_domain::{
    AuthorizationFailure, CreationConfirmation, CreationFailure, ErrorCategory,
    PendingEventRequest, Session,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::authorization::{AuthorizationFlowController, FlowOutcome};
use crate::ports::EventCreator;
use crate::session::SessionStore;

/// Result of one confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreationOutcome {
    Success(CreationConfirmation),
    Rejected { reason: String, error_code: Option<String> },
    TransportError(String),
    AuthorizationFailed(AuthorizationFailure),
}

impl CreationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Failure family, `None` on success.
    pub fn category(&self) -> Option<ErrorCategory> {
        match self {
            Self::Success(_) => None,
            Self::Rejected { .. } | Self::TransportError(_) => Some(ErrorCategory::Creation),
            Self::AuthorizationFailed(reason) => Some(reason.into()),
        }
    }
}

impl From<CreationFailure> for CreationOutcome {
    fn from(failure: CreationFailure) -> Self {
        match failure {
            CreationFailure::Rejected { reason, error_code } => {
                Self::Rejected { reason, error_code }
            }
            CreationFailure::Transport(detail) => Self::TransportError(detail),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingSlot {
    confirmation_id: Uuid,
    session_id: Uuid,
}

pub struct EventCreationGate {
    controller: Arc<AuthorizationFlowController>,
    creator: Arc<dyn EventCreator>,
    sessions: Arc<SessionStore>,
    create_timeout: Duration,
    pending: Mutex<Option<PendingSlot>>,
}

impl EventCreationGate {
    pub fn new(
        controller: Arc<AuthorizationFlowController>,
        creator: Arc<dyn EventCreator>,
        sessions: Arc<SessionStore>,
        create_timeout: Duration,
    ) -> Self {
        Self { controller, creator, sessions, create_timeout, pending: Mutex::new(None) }
    }

    /// Authorize, then create. The request is consumed: one confirmation can
    /// never produce more than one create call.
    #[instrument(
        skip(self, session, request),
        fields(user_id = %session.user_id, confirmation_id = %request.confirmation_id)
    )]
    pub async fn request_create(
        &self,
        session: &Session,
        request: PendingEventRequest,
    ) -> CreationOutcome {
        let confirmation_id = request.confirmation_id;
        {
            let mut slot = self.pending.lock();
            if slot.is_some() {
                warn!("another confirmation is still waiting");
                return CreationOutcome::AuthorizationFailed(AuthorizationFailure::InProgress);
            }
            *slot = Some(PendingSlot { confirmation_id, session_id: session.session_id });
        }
        let _slot = PendingGuard { pending: &self.pending, confirmation_id };

        match self.controller.ensure_authorized(session).await {
            Ok(FlowOutcome::AlreadyAuthorized) => {}
            Ok(FlowOutcome::AuthorizedAfterAttempt(attempt_id)) => {
                info!(%attempt_id, "authorization obtained, creating deferred event");
            }
            Err(reason) => return CreationOutcome::AuthorizationFailed(reason),
        }

        if !self.still_pending(confirmation_id) || !self.sessions.is_current(session) {
            info!("request discarded before creation");
            return CreationOutcome::AuthorizationFailed(AuthorizationFailure::Cancelled);
        }

        let payload = request.into_payload();
        let call = self.creator.create_event(&session.user_id, &payload, self.create_timeout);
        let outcome = match tokio::time::timeout(self.create_timeout, call).await {
            Ok(Ok(confirmation)) => CreationOutcome::Success(confirmation),
            Ok(Err(failure)) => failure.into(),
            Err(_) => CreationOutcome::TransportError(format!(
                "create request timed out after {}s",
                self.create_timeout.as_secs()
            )),
        };

        match &outcome {
            CreationOutcome::Success(_) => info!(title = %payload.title, "event created"),
            other => warn!(outcome = ?other, category = ?other.category(), "event creation failed"),
        }
        outcome
    }

    /// Drop the waiting confirmation. Its flow ends without a create call.
    pub fn discard_pending(&self) -> bool {
        match self.pending.lock().take() {
            Some(slot) => {
                info!(
                    confirmation_id = %slot.confirmation_id,
                    session_id = %slot.session_id,
                    "pending event request discarded"
                );
                true
            }
            None => false,
        }
    }

    fn still_pending(&self, confirmation_id: Uuid) -> bool {
        self.pending.lock().is_some_and(|slot| slot.confirmation_id == confirmation_id)
    }
}

struct PendingGuard<'a> {
    pending: &'a Mutex<Option<PendingSlot>>,
    confirmation_id: Uuid,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        let mut slot = self.pending.lock();
        if slot.is_some_and(|held| held.confirmation_id == self.confirmation_id) {
            *slot = None;
        }
    }
}
