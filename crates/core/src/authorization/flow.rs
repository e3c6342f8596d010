//! Authorization flow controller
//!
//! Drives a user from "unknown" to "authorized" by opening the external
//! consent surface and watching it close. There is no completion callback:
//! the only signal is that the surface went away, after which a fresh status
//! check decides the outcome.

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use smartcal_domain::{
    AttemptId, AttemptStatus, AuthorizationConfig, AuthorizationFailure, AuthorizationState,
    Session,
};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::attempt::{url_origin, AuthorizationAttempt};
use super::cache::AuthorizationStatusCache;
use crate::ports::{AuthorizationBackend, SurfaceLauncher};

/// Observable controller state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FlowState {
    #[default]
    Idle,
    CheckingAuthorization,
    RequestingAuthorizationUrl,
    AwaitingExternalCompletion { attempt_id: AttemptId, cycles_elapsed: u32 },
    VerifyingCompletion { attempt_id: AttemptId },
    Authorized,
    Succeeded { attempt_id: AttemptId },
    Failed(AuthorizationFailure),
    TimedOut,
}

/// How authorization was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
    AlreadyAuthorized,
    AuthorizedAfterAttempt(AttemptId),
}

struct PendingAttempt {
    attempt_id: AttemptId,
    session_id: Uuid,
    cancel: CancellationToken,
}

pub struct AuthorizationFlowController {
    backend: Arc<dyn AuthorizationBackend>,
    launcher: Arc<dyn SurfaceLauncher>,
    cache: Arc<AuthorizationStatusCache>,
    policy: AuthorizationConfig,
    pending: Mutex<Option<PendingAttempt>>,
    session_cancel: Mutex<CancellationToken>,
    state: watch::Sender<FlowState>,
}

impl AuthorizationFlowController {
    pub fn new(
        backend: Arc<dyn AuthorizationBackend>,
        launcher: Arc<dyn SurfaceLauncher>,
        cache: Arc<AuthorizationStatusCache>,
        policy: AuthorizationConfig,
    ) -> Self {
        let (state, _) = watch::channel(FlowState::Idle);
        Self {
            backend,
            launcher,
            cache,
            policy,
            pending: Mutex::new(None),
            session_cancel: Mutex::new(CancellationToken::new()),
            state,
        }
    }

    /// Make sure `session`'s user may create events, running the external
    /// authorization flow if needed.
    ///
    /// Only one flow runs at a time; a second caller gets
    /// [`AuthorizationFailure::InProgress`] without touching the backend.
    #[instrument(skip(self, session), fields(user_id = %session.user_id))]
    pub async fn ensure_authorized(
        &self,
        session: &Session,
    ) -> Result<FlowOutcome, AuthorizationFailure> {
        let (attempt_id, cancel) = self.claim(session)?;
        let _slot = SlotGuard { pending: &self.pending, attempt_id };

        let result = self.run(session, attempt_id, &cancel).await;

        let terminal = match &result {
            Ok(FlowOutcome::AlreadyAuthorized) => FlowState::Authorized,
            Ok(FlowOutcome::AuthorizedAfterAttempt(id)) => FlowState::Succeeded { attempt_id: *id },
            Err(AuthorizationFailure::TimedOut) => FlowState::TimedOut,
            // Whoever cancelled already published, and a newer flow may own the state.
            Err(AuthorizationFailure::Cancelled) => return result,
            Err(reason) => FlowState::Failed(reason.clone()),
        };

        let slot = self.pending.lock();
        if slot.as_ref().is_some_and(|pending| pending.attempt_id == attempt_id) {
            self.publish(terminal);
        } else {
            debug!(%attempt_id, "flow no longer owns the slot; terminal state not published");
        }
        drop(slot);
        result
    }

    /// Cancel everything belonging to the current session. Used on logout
    /// and session change.
    pub fn cancel_all(&self) {
        let previous = std::mem::replace(&mut *self.session_cancel.lock(), CancellationToken::new());
        previous.cancel();

        if let Some(pending) = self.pending.lock().take() {
            info!(attempt_id = %pending.attempt_id, session_id = %pending.session_id, "authorization attempt cancelled");
        }
        self.publish(FlowState::Idle);
    }

    /// Cancel the in-flight attempt, if any.
    pub fn cancel_pending(&self) -> bool {
        let Some(pending) = self.pending.lock().take() else {
            return false;
        };
        pending.cancel.cancel();
        info!(attempt_id = %pending.attempt_id, session_id = %pending.session_id, "authorization attempt cancelled");
        self.publish(FlowState::Idle);
        true
    }

    pub fn subscribe(&self) -> watch::Receiver<FlowState> {
        self.state.subscribe()
    }

    fn claim(
        &self,
        session: &Session,
    ) -> Result<(AttemptId, CancellationToken), AuthorizationFailure> {
        let mut slot = self.pending.lock();
        if let Some(pending) = slot.as_ref() {
            warn!(attempt_id = %pending.attempt_id, "rejecting request while authorization is pending");
            return Err(AuthorizationFailure::InProgress);
        }

        let attempt_id = AttemptId::new();
        let cancel = self.session_cancel.lock().child_token();
        *slot = Some(PendingAttempt {
            attempt_id,
            session_id: session.session_id,
            cancel: cancel.clone(),
        });
        Ok((attempt_id, cancel))
    }

    async fn run(
        &self,
        session: &Session,
        attempt_id: AttemptId,
        cancel: &CancellationToken,
    ) -> Result<FlowOutcome, AuthorizationFailure> {
        self.publish(FlowState::CheckingAuthorization);
        if self.fresh_check(session, cancel).await?.is_authorized() {
            debug!("already authorized");
            return Ok(FlowOutcome::AlreadyAuthorized);
        }

        self.publish(FlowState::RequestingAuthorizationUrl);
        let url = until_cancelled(cancel, self.backend.authorization_url(&session.user_id))
            .await?
            .map_err(|err| {
                warn!(error = %err, "authorization URL unavailable");
                AuthorizationFailure::UrlUnavailable(err.to_string())
            })?;

        let surface = self.launcher.open(&url).map_err(|blocked| {
            warn!(error = %blocked, "authorization surface did not open");
            AuthorizationFailure::WindowBlocked
        })?;

        let mut attempt =
            AuthorizationAttempt::new(attempt_id, session.user_id.clone(), url, surface);
        info!(
            %attempt_id,
            origin = %url_origin(&attempt.authorization_url),
            timeout_secs = self.policy.ceiling().as_secs(),
            "authorization surface opened"
        );
        self.publish(FlowState::AwaitingExternalCompletion { attempt_id, cycles_elapsed: 0 });

        if !self.await_closure(&mut attempt, cancel).await? {
            let forced = attempt.close_surface();
            attempt.resolve(AttemptStatus::TimedOut);
            warn!(
                %attempt_id,
                cycles = attempt.attempts_elapsed,
                forced_close = forced,
                "authorization surface never closed"
            );
            return Err(AuthorizationFailure::TimedOut);
        }

        self.publish(FlowState::VerifyingCompletion { attempt_id });
        until_cancelled(cancel, tokio::time::sleep(self.policy.grace_period())).await?;

        let verified = self.fresh_check(session, cancel).await?;
        if verified.is_authorized() {
            attempt.resolve(AttemptStatus::Succeeded);
            info!(%attempt_id, cycles = attempt.attempts_elapsed, "authorization completed");
            Ok(FlowOutcome::AuthorizedAfterAttempt(attempt_id))
        } else {
            attempt.resolve(AttemptStatus::Failed(AuthorizationFailure::NotCompleted));
            warn!(%attempt_id, "surface closed without granting access");
            Err(AuthorizationFailure::NotCompleted)
        }
    }

    /// Poll the surface until it closes or the cycle ceiling is hit.
    /// Returns `false` on timeout.
    async fn await_closure(
        &self,
        attempt: &mut AuthorizationAttempt,
        cancel: &CancellationToken,
    ) -> Result<bool, AuthorizationFailure> {
        while attempt.attempts_elapsed < self.policy.max_poll_cycles {
            until_cancelled(cancel, tokio::time::sleep(self.policy.poll_interval())).await?;
            attempt.attempts_elapsed += 1;
            self.publish(FlowState::AwaitingExternalCompletion {
                attempt_id: attempt.id,
                cycles_elapsed: attempt.attempts_elapsed,
            });

            if attempt.surface_closed() {
                debug!(attempt_id = %attempt.id, cycles = attempt.attempts_elapsed, "surface closed");
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn fresh_check(
        &self,
        session: &Session,
        cancel: &CancellationToken,
    ) -> Result<AuthorizationState, AuthorizationFailure> {
        let state = until_cancelled(cancel, self.cache.check(session))
            .await?
            .map_err(|err| AuthorizationFailure::CheckFailed(err.to_string()))?;

        // A logout that lands while the answer is in transit still wins.
        if cancel.is_cancelled() {
            return Err(AuthorizationFailure::Cancelled);
        }
        Ok(state)
    }

    fn publish(&self, state: FlowState) {
        self.state.send_replace(state);
    }
}

async fn until_cancelled<F: Future>(
    cancel: &CancellationToken,
    future: F,
) -> Result<F::Output, AuthorizationFailure> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(AuthorizationFailure::Cancelled),
        output = future => Ok(output),
    }
}

/// Frees the single-flight slot when the owning flow ends, unless someone
/// already replaced it.
struct SlotGuard<'a> {
    pending: &'a Mutex<Option<PendingAttempt>>,
    attempt_id: AttemptId,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        let mut slot = self.pending.lock();
        if slot.as_ref().is_some_and(|pending| pending.attempt_id == self.attempt_id) {
            *slot = None;
        }
    }
}
