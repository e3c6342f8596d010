use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use smartcal_core::{
    AccountDirectory, AuthorizationBackend, EventCreator, EventParser, HealthCheck,
    RegisteredUser,
};
use smartcal_domain::{
    ConnectivityFailure, CreationConfirmation, CreationFailure, EventPayload, ParsedEvent,
    Result as DomainResult, SmartCalError, UserId,
};

#[derive(Default)]
struct Calls {
    checks: usize,
    url_fetches: usize,
    forgets: usize,
    parses: Vec<String>,
    creates: Vec<(UserId, EventPayload)>,
}

/// Backend fake. Authorization answers are consumed in order; the last one
/// repeats once the script runs out.
pub struct FakeBackend {
    user_id: UserId,
    needs_auth: Mutex<VecDeque<bool>>,
    url_available: Mutex<bool>,
    register_fails: Mutex<bool>,
    create_hangs: Mutex<bool>,
    create_result: Mutex<std::result::Result<CreationConfirmation, CreationFailure>>,
    parsed: Mutex<Option<ParsedEvent>>,
    calls: Mutex<Calls>,
}

impl FakeBackend {
    /// A backend that knows `user_id` and answers `needsAuth` with `answers`.
    pub fn new(user_id: &str, answers: &[bool]) -> Arc<Self> {
        Arc::new(Self {
            user_id: UserId::new(user_id),
            needs_auth: Mutex::new(answers.iter().copied().collect()),
            url_available: Mutex::new(true),
            register_fails: Mutex::new(false),
            create_hangs: Mutex::new(false),
            create_result: Mutex::new(Ok(CreationConfirmation {
                message: "Event created successfully".into(),
                error_code: None,
            })),
            parsed: Mutex::new(None),
            calls: Mutex::new(Calls::default()),
        })
    }

    pub fn authorized(user_id: &str) -> Arc<Self> {
        Self::new(user_id, &[false])
    }

    pub fn fail_registration(&self) {
        *self.register_fails.lock() = true;
    }

    pub fn withhold_url(&self) {
        *self.url_available.lock() = false;
    }

    pub fn hang_creates(&self) {
        *self.create_hangs.lock() = true;
    }

    pub fn reject_creates(&self, reason: &str, error_code: &str) {
        *self.create_result.lock() = Err(CreationFailure::Rejected {
            reason: reason.into(),
            error_code: Some(error_code.into()),
        });
    }

    pub fn parse_to(&self, parsed: ParsedEvent) {
        *self.parsed.lock() = Some(parsed);
    }

    pub fn check_calls(&self) -> usize {
        self.calls.lock().checks
    }

    pub fn url_fetches(&self) -> usize {
        self.calls.lock().url_fetches
    }

    pub fn forget_calls(&self) -> usize {
        self.calls.lock().forgets
    }

    pub fn parsed_texts(&self) -> Vec<String> {
        self.calls.lock().parses.clone()
    }

    pub fn creates(&self) -> Vec<(UserId, EventPayload)> {
        self.calls.lock().creates.clone()
    }

    fn next_answer(&self) -> bool {
        let mut answers = self.needs_auth.lock();
        if answers.len() > 1 {
            answers.pop_front().unwrap_or(true)
        } else {
            answers.front().copied().unwrap_or(true)
        }
    }
}

#[async_trait]
impl HealthCheck for FakeBackend {
    async fn check_health(&self) -> std::result::Result<String, ConnectivityFailure> {
        Ok("OK".into())
    }
}

#[async_trait]
impl AccountDirectory for FakeBackend {
    async fn register(&self, display_name: &str, contact_address: &str) -> DomainResult<RegisteredUser> {
        if *self.register_fails.lock() {
            return Err(SmartCalError::Network("connection refused".into()));
        }
        Ok(RegisteredUser {
            user_id: self.user_id.clone(),
            display_name: display_name.into(),
            contact_address: contact_address.into(),
        })
    }
}

#[async_trait]
impl EventParser for FakeBackend {
    async fn parse(&self, text: &str) -> DomainResult<ParsedEvent> {
        self.calls.lock().parses.push(text.to_string());
        Ok(self.parsed.lock().clone().unwrap_or_else(super::dentist_appointment))
    }
}

#[async_trait]
impl AuthorizationBackend for FakeBackend {
    async fn needs_authorization(&self, user_id: &UserId) -> DomainResult<bool> {
        assert_eq!(user_id, &self.user_id, "authorization checked for the wrong user");
        self.calls.lock().checks += 1;
        Ok(self.next_answer())
    }

    async fn authorization_url(&self, user_id: &UserId) -> DomainResult<String> {
        self.calls.lock().url_fetches += 1;
        if *self.url_available.lock() {
            Ok(format!("https://accounts.example.com/o/oauth2/auth?state={user_id}"))
        } else {
            Err(SmartCalError::NotFound("Auth URL not found".into()))
        }
    }

    async fn forget_authorization(&self, _user_id: &UserId) -> DomainResult<()> {
        self.calls.lock().forgets += 1;
        Ok(())
    }
}

#[async_trait]
impl EventCreator for FakeBackend {
    async fn create_event(
        &self,
        user_id: &UserId,
        payload: &EventPayload,
        _timeout: Duration,
    ) -> std::result::Result<CreationConfirmation, CreationFailure> {
        self.calls.lock().creates.push((user_id.clone(), payload.clone()));
        let hangs = *self.create_hangs.lock();
        if hangs {
            std::future::pending::<()>().await;
        }
        self.create_result.lock().clone()
    }
}
