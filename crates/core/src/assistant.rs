//! Calendar assistant
//!
//! Ties the session, the parser and the creation gate together into the
//! handful of actions a user can take: log in, describe an event, confirm
//! it, cancel, log out.

use std::sync::Arc;

use smartcal_domain::{
    AuthorizationState, Config, DisplayMessage, ParsedEvent, PendingEventRequest, ProbeReport,
    Result, Session, SmartCalError,
};
use tokio::sync::watch;
use tracing::{info, instrument, warn};

use crate::authorization::{
    AuthorizationFlowController, AuthorizationSnapshot, AuthorizationStatusCache, FlowState,
};
use crate::gate::{CreationOutcome, EventCreationGate};
use crate::messages;
use crate::ports::{
    AccountDirectory, AuthorizationBackend, EventCreator, EventParser, HealthCheck,
    SurfaceLauncher,
};
use crate::probe::ConnectivityProbe;
use crate::session::SessionStore;

/// Everything the assistant talks to
#[derive(Clone)]
pub struct AssistantPorts {
    pub health: Arc<dyn HealthCheck>,
    pub accounts: Arc<dyn AccountDirectory>,
    pub parser: Arc<dyn EventParser>,
    pub authorization: Arc<dyn AuthorizationBackend>,
    pub creator: Arc<dyn EventCreator>,
    pub launcher: Arc<dyn SurfaceLauncher>,
}

impl AssistantPorts {
    /// All backend ports served by one client.
    pub fn from_backend<B>(backend: Arc<B>, launcher: Arc<dyn SurfaceLauncher>) -> Self
    where
        B: HealthCheck + AccountDirectory + EventParser + AuthorizationBackend + EventCreator + 'static,
    {
        Self {
            health: backend.clone(),
            accounts: backend.clone(),
            parser: backend.clone(),
            authorization: backend.clone(),
            creator: backend,
            launcher,
        }
    }
}

pub struct CalendarAssistant {
    sessions: Arc<SessionStore>,
    probe: ConnectivityProbe,
    accounts: Arc<dyn AccountDirectory>,
    parser: Arc<dyn EventParser>,
    authorization: Arc<dyn AuthorizationBackend>,
    cache: Arc<AuthorizationStatusCache>,
    controller: Arc<AuthorizationFlowController>,
    gate: EventCreationGate,
    message: watch::Sender<Option<DisplayMessage>>,
}

impl CalendarAssistant {
    pub fn new(ports: AssistantPorts, config: &Config) -> Self {
        let sessions = Arc::new(SessionStore::new());
        let cache =
            Arc::new(AuthorizationStatusCache::new(ports.authorization.clone(), sessions.clone()));
        let controller = Arc::new(AuthorizationFlowController::new(
            ports.authorization.clone(),
            ports.launcher,
            cache.clone(),
            config.authorization,
        ));
        let gate = EventCreationGate::new(
            controller.clone(),
            ports.creator,
            sessions.clone(),
            config.backend.create_timeout(),
        );
        let (message, _) = watch::channel(None);

        Self {
            sessions,
            probe: ConnectivityProbe::new(ports.health, config.backend.health_timeout()),
            accounts: ports.accounts,
            parser: ports.parser,
            authorization: ports.authorization,
            cache,
            controller,
            gate,
            message,
        }
    }

    pub async fn probe(&self) -> ProbeReport {
        self.probe.probe().await
    }

    /// Register with the backend and start a fresh session, tearing down
    /// whatever the previous one left behind.
    ///
    /// # Errors
    /// `InvalidInput` for a blank name or an address without `@`; otherwise
    /// whatever registration failed with.
    #[instrument(skip(self, contact_address))]
    pub async fn login(&self, display_name: &str, contact_address: &str) -> Result<Session> {
        let display_name = display_name.trim();
        let contact_address = contact_address.trim();

        if display_name.is_empty() {
            return Err(self.reject_input("Please enter your name."));
        }
        if !contact_address.contains('@') {
            return Err(self.reject_input("Please enter a valid email address."));
        }

        let user = match self.accounts.register(display_name, contact_address).await {
            Ok(user) => user,
            Err(err) => {
                warn!(error = %err, "registration failed");
                self.show(DisplayMessage::error(messages::CONNECTION_FAILED));
                return Err(err);
            }
        };

        self.teardown();
        let session = Session::new(
            user.user_id,
            non_blank_or(user.display_name, display_name),
            non_blank_or(user.contact_address, contact_address),
        );
        self.sessions.begin(session.clone());
        self.show(messages::welcome(display_name));
        Ok(session)
    }

    /// Cancel everything in flight and forget the session.
    pub fn logout(&self) {
        self.teardown();
        self.sessions.end();
        self.message.send_replace(None);
    }

    /// Interpret free text. Starting a new request abandons any confirmation
    /// still waiting on authorization.
    ///
    /// # Errors
    /// `Auth` without a session, `InvalidInput` for empty text, or the
    /// parser's transport error.
    #[instrument(skip(self, text))]
    pub async fn parse(&self, text: &str) -> Result<ParsedEvent> {
        self.require_session()?;
        let text = text.trim();
        if text.is_empty() {
            return Err(self.reject_input("Please describe the event you want to create."));
        }

        self.abandon_pending();
        self.message.send_replace(None);

        match self.parser.parse(text).await {
            Ok(parsed) => {
                self.show(messages::parse_result(&parsed));
                Ok(parsed)
            }
            Err(err) => {
                warn!(error = %err, "parse request failed");
                self.show(messages::parse_unavailable());
                Err(err)
            }
        }
    }

    /// Create the confirmed event, obtaining calendar authorization first if
    /// needed. Advisory messages follow the authorization flow; exactly one
    /// persistent message reports the outcome unless the confirmation was
    /// cancelled.
    ///
    /// # Errors
    /// `Auth` without a session; `InvalidInput` if `parsed` cannot be turned
    /// into a payload. Creation failures are reported in the outcome.
    #[instrument(skip(self, parsed))]
    pub async fn confirm(&self, parsed: ParsedEvent) -> Result<CreationOutcome> {
        let session = self.require_session()?;
        let payload = match parsed.into_payload() {
            Ok(payload) => payload,
            Err(err) => {
                self.show(DisplayMessage::error(user_text(&err)));
                return Err(err);
            }
        };

        self.show(messages::creating());
        let mut states = self.controller.subscribe();
        let create = self.gate.request_create(&session, PendingEventRequest::new(payload));
        tokio::pin!(create);

        let outcome = loop {
            tokio::select! {
                outcome = &mut create => break outcome,
                Ok(()) = states.changed() => {
                    let advisory = messages::flow_advisory(&states.borrow_and_update());
                    if let Some(advisory) = advisory {
                        self.show(advisory);
                    }
                }
            }
        };

        // Cancellation is silent; whoever cancelled owns the message line.
        if !self.sessions.is_current(&session) {
            info!("session ended while confirming; outcome not shown");
        } else if let Some(message) = messages::creation_outcome(&outcome) {
            self.show(message);
        }
        Ok(outcome)
    }

    /// Drop the confirmation in progress, if any.
    pub fn cancel(&self) {
        self.abandon_pending();
        self.message.send_replace(None);
    }

    /// Re-query the backend for the badge.
    ///
    /// # Errors
    /// `Auth` without a session, or the backend error.
    pub async fn refresh_authorization(&self) -> Result<AuthorizationState> {
        let session = self.require_session()?;
        self.cache.check(&session).await
    }

    /// Ask the backend to drop its cached calendar access for the user, so
    /// the next creation goes through consent again.
    ///
    /// # Errors
    /// `Auth` without a session, or the backend error.
    #[instrument(skip(self))]
    pub async fn forget_authorization(&self) -> Result<()> {
        let session = self.require_session()?;
        self.abandon_pending();
        self.authorization.forget_authorization(&session.user_id).await?;
        self.cache.reset();
        info!(user_id = %session.user_id, "calendar authorization forgotten");
        Ok(())
    }

    pub fn authorization_state(&self) -> AuthorizationState {
        self.sessions
            .current()
            .map_or(AuthorizationState::Unknown, |session| self.cache.state_for(&session))
    }

    pub fn current_session(&self) -> Option<Session> {
        self.sessions.current()
    }

    pub fn message(&self) -> Option<DisplayMessage> {
        self.message.borrow().clone()
    }

    pub fn subscribe_messages(&self) -> watch::Receiver<Option<DisplayMessage>> {
        self.message.subscribe()
    }

    pub fn subscribe_flow(&self) -> watch::Receiver<FlowState> {
        self.controller.subscribe()
    }

    pub fn subscribe_authorization(&self) -> watch::Receiver<AuthorizationSnapshot> {
        self.cache.subscribe()
    }

    pub fn subscribe_connectivity(&self) -> watch::Receiver<smartcal_domain::ConnectivityStatus> {
        self.probe.subscribe()
    }

    fn require_session(&self) -> Result<Session> {
        self.sessions.current().ok_or_else(|| SmartCalError::Auth("not logged in".into()))
    }

    fn teardown(&self) {
        self.controller.cancel_all();
        self.gate.discard_pending();
        self.cache.reset();
    }

    fn abandon_pending(&self) {
        self.gate.discard_pending();
        self.controller.cancel_pending();
    }

    fn reject_input(&self, text: &str) -> SmartCalError {
        self.show(DisplayMessage::error(text));
        SmartCalError::InvalidInput(text.to_string())
    }

    fn show(&self, message: DisplayMessage) {
        self.message.send_replace(Some(message));
    }
}

fn non_blank_or(value: String, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value
    }
}

fn user_text(err: &SmartCalError) -> String {
    match err {
        SmartCalError::InvalidInput(text) => text.clone(),
        other => other.to_string(),
    }
}
