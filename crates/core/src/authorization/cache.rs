//! Authorization status cache
//!
//! The answer to "is the active user allowed to create events", tagged with
//! the session it was computed for. `check` always queries the backend; the
//! cached value is only for observers such as the UI badge.

use std::sync::Arc;

use smartcal_domain::{AuthorizationState, Result, Session};
use tokio::sync::watch;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::ports::AuthorizationBackend;
use crate::session::SessionStore;

/// Cached state plus the login it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AuthorizationSnapshot {
    pub session_id: Option<Uuid>,
    pub state: AuthorizationState,
}

pub struct AuthorizationStatusCache {
    backend: Arc<dyn AuthorizationBackend>,
    sessions: Arc<SessionStore>,
    snapshot: watch::Sender<AuthorizationSnapshot>,
}

impl AuthorizationStatusCache {
    pub fn new(backend: Arc<dyn AuthorizationBackend>, sessions: Arc<SessionStore>) -> Self {
        let (snapshot, _) = watch::channel(AuthorizationSnapshot::default());
        Self { backend, sessions, snapshot }
    }

    /// Query the backend for `session`'s user and publish the answer.
    ///
    /// Observers see `Checking` while the call is outstanding. Results for a
    /// session that has since ended are returned to the caller but never
    /// written. Dropping the future mid-call leaves `Unknown` behind.
    ///
    /// # Errors
    /// Propagates the backend error; the cached state falls back to `Unknown`.
    #[instrument(skip(self, session), fields(user_id = %session.user_id))]
    pub async fn check(&self, session: &Session) -> Result<AuthorizationState> {
        let mut outstanding = OutstandingCheck { cache: self, session, settled: false };
        self.publish(session, AuthorizationState::Checking);

        let answer = self.backend.needs_authorization(&session.user_id).await;
        outstanding.settled = true;

        match answer {
            Ok(needs_authorization) => {
                let state = AuthorizationState::from_needs_authorization(needs_authorization);
                if !self.publish(session, state) {
                    debug!(%state, "discarding authorization result for a stale session");
                }
                Ok(state)
            }
            Err(err) => {
                warn!(error = %err, "authorization check failed");
                self.publish(session, AuthorizationState::Unknown);
                Err(err)
            }
        }
    }

    /// Forget everything; used on logout and session change.
    pub fn reset(&self) {
        self.snapshot.send_replace(AuthorizationSnapshot::default());
    }

    /// Cached state for `session`, `Unknown` if the cache belongs to another
    /// login.
    pub fn state_for(&self, session: &Session) -> AuthorizationState {
        let snapshot = *self.snapshot.borrow();
        if snapshot.session_id == Some(session.session_id) {
            snapshot.state
        } else {
            AuthorizationState::Unknown
        }
    }

    pub fn snapshot(&self) -> AuthorizationSnapshot {
        *self.snapshot.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthorizationSnapshot> {
        self.snapshot.subscribe()
    }

    fn publish(&self, session: &Session, state: AuthorizationState) -> bool {
        if !self.sessions.is_current(session) {
            return false;
        }
        self.snapshot
            .send_replace(AuthorizationSnapshot { session_id: Some(session.session_id), state });
        true
    }
}

/// Publishes `Unknown` when a check is abandoned while its `Checking` is
/// still the visible state.
struct OutstandingCheck<'a> {
    cache: &'a AuthorizationStatusCache,
    session: &'a Session,
    settled: bool,
}

impl Drop for OutstandingCheck<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let checking = AuthorizationSnapshot {
            session_id: Some(self.session.session_id),
            state: AuthorizationState::Checking,
        };
        if self.cache.snapshot() == checking
            && self.cache.publish(self.session, AuthorizationState::Unknown)
        {
            debug!("authorization check abandoned");
        }
    }
}
