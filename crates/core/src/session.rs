//! In-memory session store
//!
//! Holds the single active session. Every change is a full replace on a
//! watch channel so observers never see a half-updated session.

use smartcal_domain::Session;
use tokio::sync::watch;
use tracing::info;

pub struct SessionStore {
    current: watch::Sender<Option<Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        Self { current }
    }

    /// Install a new session, returning the one it replaced.
    pub fn begin(&self, session: Session) -> Option<Session> {
        info!(user_id = %session.user_id, session_id = %session.session_id, "session started");
        self.current.send_replace(Some(session))
    }

    /// Clear the active session, returning it.
    pub fn end(&self) -> Option<Session> {
        let previous = self.current.send_replace(None);
        if let Some(session) = &previous {
            info!(user_id = %session.user_id, session_id = %session.session_id, "session ended");
        }
        previous
    }

    pub fn current(&self) -> Option<Session> {
        self.current.borrow().clone()
    }

    /// Whether `session` is still the active login.
    pub fn is_current(&self, session: &Session) -> bool {
        self.current.borrow().as_ref().is_some_and(|active| active.same_login(session))
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.current.subscribe()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
