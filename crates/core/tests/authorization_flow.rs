//! End-to-end authorization flows through the assistant, on a paused clock.

mod support;

use std::sync::Arc;
use std::time::Duration;

use smartcal_core::{CreationOutcome, FlowState};
use smartcal_domain::{AuthorizationFailure, AuthorizationState, ErrorCategory, MessageKind};
use support::{assistant, dentist_appointment, FakeBackend, ScriptedLauncher, SurfacePlan};
use tokio::time::Instant;

async fn wait_for_surface(flow: &mut tokio::sync::watch::Receiver<FlowState>) {
    flow.wait_for(|state| matches!(state, FlowState::AwaitingExternalCompletion { .. }))
        .await
        .expect("controller dropped");
}

#[tokio::test(start_paused = true)]
async fn authorized_user_creates_without_opening_a_surface() {
    let backend = FakeBackend::authorized("42");
    let launcher = ScriptedLauncher::new(SurfacePlan::LeaveOpen);
    let assistant = assistant(&backend, &launcher);
    assistant.login("Ada", "ada@example.com").await.unwrap();

    let outcome = assistant.confirm(dentist_appointment()).await.unwrap();

    assert!(outcome.is_success(), "{outcome:?}");
    assert_eq!(launcher.open_count(), 0);
    assert_eq!(backend.url_fetches(), 0);
    assert_eq!(backend.check_calls(), 1);
    assert_eq!(backend.creates().len(), 1);
    assert_eq!(assistant.authorization_state(), AuthorizationState::Authorized);

    let message = assistant.message().unwrap();
    assert_eq!(message.kind, MessageKind::Success);
    assert!(message.text.contains("Event created successfully"));
}

#[tokio::test(start_paused = true)]
async fn unauthorized_user_authorizes_then_event_is_created_once() {
    let backend = FakeBackend::new("7", &[true, false]);
    let launcher = ScriptedLauncher::new(SurfacePlan::CloseAfter(Duration::from_secs(5)));
    let assistant = assistant(&backend, &launcher);
    assistant.login("Bea", "bea@example.com").await.unwrap();

    let started = Instant::now();
    let outcome = assistant.confirm(dentist_appointment()).await.unwrap();
    let elapsed = started.elapsed();

    assert!(outcome.is_success(), "{outcome:?}");
    assert_eq!(backend.url_fetches(), 1);
    assert_eq!(launcher.open_count(), 1);
    assert!(launcher.opened_urls()[0].contains("state=7"));
    assert_eq!(backend.check_calls(), 2, "initial check plus one verification");

    let creates = backend.creates();
    assert_eq!(creates.len(), 1);
    assert_eq!(creates[0].0.as_str(), "7");
    assert_eq!(creates[0].1, dentist_appointment().into_payload().unwrap());

    // closure observed on the fifth poll, then the grace period
    assert!(elapsed >= Duration::from_secs(7), "{elapsed:?}");
    assert!(elapsed < Duration::from_secs(8), "{elapsed:?}");
    assert!(!launcher.last_surface().unwrap().was_force_closed());
}

#[tokio::test(start_paused = true)]
async fn closing_without_granting_reports_not_completed() {
    let backend = FakeBackend::new("9", &[true, true]);
    let launcher = ScriptedLauncher::new(SurfacePlan::CloseAfter(Duration::from_secs(3)));
    let assistant = assistant(&backend, &launcher);
    assistant.login("Cy", "cy@example.com").await.unwrap();

    let outcome = assistant.confirm(dentist_appointment()).await.unwrap();

    assert_eq!(
        outcome,
        CreationOutcome::AuthorizationFailed(AuthorizationFailure::NotCompleted)
    );
    assert!(backend.creates().is_empty());
    assert_eq!(assistant.authorization_state(), AuthorizationState::Unauthorized);

    let message = assistant.message().unwrap();
    assert_eq!(message.kind, MessageKind::Error);
    assert_eq!(message.text, "Google Calendar authorization was not completed. Please try again.");
}

#[tokio::test(start_paused = true)]
async fn abandoned_window_times_out_and_is_closed() {
    let backend = FakeBackend::new("9", &[true]);
    let launcher = ScriptedLauncher::new(SurfacePlan::LeaveOpen);
    let assistant = assistant(&backend, &launcher);
    assistant.login("Cy", "cy@example.com").await.unwrap();

    let started = Instant::now();
    let outcome = assistant.confirm(dentist_appointment()).await.unwrap();

    assert_eq!(outcome, CreationOutcome::AuthorizationFailed(AuthorizationFailure::TimedOut));
    assert!(started.elapsed() >= Duration::from_secs(120));
    assert!(launcher.last_surface().unwrap().was_force_closed());
    assert_eq!(backend.check_calls(), 1, "no verification after a timeout");
    assert!(backend.creates().is_empty());
    assert!(assistant.message().unwrap().text.contains("timed out"));
    assert_eq!(outcome.category(), Some(ErrorCategory::Authorization));
}

#[tokio::test(start_paused = true)]
async fn window_closed_on_the_last_poll_still_counts() {
    let backend = FakeBackend::new("7", &[true, false]);
    let launcher = ScriptedLauncher::new(SurfacePlan::CloseAfter(Duration::from_secs(120)));
    let assistant = assistant(&backend, &launcher);
    assistant.login("Bea", "bea@example.com").await.unwrap();

    let started = Instant::now();
    let outcome = assistant.confirm(dentist_appointment()).await.unwrap();

    assert!(outcome.is_success(), "{outcome:?}");
    assert!(started.elapsed() >= Duration::from_secs(122), "closed on poll 120, then grace");
    assert!(!launcher.last_surface().unwrap().was_force_closed());
    assert_eq!(backend.check_calls(), 2);
    assert_eq!(backend.creates().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn blocked_window_fails_without_polling() {
    let backend = FakeBackend::new("9", &[true]);
    let launcher = ScriptedLauncher::new(SurfacePlan::Blocked);
    let assistant = assistant(&backend, &launcher);
    assistant.login("Cy", "cy@example.com").await.unwrap();

    let started = Instant::now();
    let outcome = assistant.confirm(dentist_appointment()).await.unwrap();

    assert_eq!(outcome, CreationOutcome::AuthorizationFailed(AuthorizationFailure::WindowBlocked));
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(backend.url_fetches(), 1);
    assert!(backend.creates().is_empty());
    assert!(assistant.message().unwrap().text.contains("blocked"));
}

#[tokio::test(start_paused = true)]
async fn missing_url_fails_without_opening() {
    let backend = FakeBackend::new("9", &[true]);
    backend.withhold_url();
    let launcher = ScriptedLauncher::new(SurfacePlan::LeaveOpen);
    let assistant = assistant(&backend, &launcher);
    assistant.login("Cy", "cy@example.com").await.unwrap();

    let outcome = assistant.confirm(dentist_appointment()).await.unwrap();

    assert!(matches!(
        outcome,
        CreationOutcome::AuthorizationFailed(AuthorizationFailure::UrlUnavailable(_))
    ));
    assert_eq!(backend.url_fetches(), 1, "no retry");
    assert_eq!(launcher.open_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn second_confirmation_while_pending_is_rejected() {
    let backend = FakeBackend::new("7", &[true, false]);
    let launcher = ScriptedLauncher::new(SurfacePlan::LeaveOpen);
    let assistant = Arc::new(assistant(&backend, &launcher));
    assistant.login("Bea", "bea@example.com").await.unwrap();

    let mut flow = assistant.subscribe_flow();
    let first = tokio::spawn({
        let assistant = assistant.clone();
        async move { assistant.confirm(dentist_appointment()).await }
    });
    wait_for_surface(&mut flow).await;

    let second = assistant.confirm(dentist_appointment()).await.unwrap();
    assert_eq!(second, CreationOutcome::AuthorizationFailed(AuthorizationFailure::InProgress));

    launcher.user_closes_window();
    let first = first.await.unwrap().unwrap();

    assert!(first.is_success(), "{first:?}");
    assert_eq!(backend.url_fetches(), 1);
    assert_eq!(launcher.open_count(), 1);
    assert_eq!(backend.creates().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn logout_during_polling_stops_everything() {
    let backend = FakeBackend::new("7", &[true, false]);
    let launcher = ScriptedLauncher::new(SurfacePlan::LeaveOpen);
    let assistant = Arc::new(assistant(&backend, &launcher));
    assistant.login("Bea", "bea@example.com").await.unwrap();

    let mut flow = assistant.subscribe_flow();
    let pending = tokio::spawn({
        let assistant = assistant.clone();
        async move { assistant.confirm(dentist_appointment()).await }
    });
    wait_for_surface(&mut flow).await;
    tokio::time::sleep(Duration::from_secs(10)).await;

    assistant.logout();
    let outcome = pending.await.unwrap().unwrap();
    assert_eq!(outcome, CreationOutcome::AuthorizationFailed(AuthorizationFailure::Cancelled));

    let checks = backend.check_calls();
    launcher.user_closes_window();
    tokio::time::sleep(Duration::from_secs(300)).await;

    assert_eq!(backend.check_calls(), checks);
    assert!(backend.creates().is_empty());
    assert!(assistant.message().is_none());
    assert_eq!(assistant.subscribe_flow().borrow().clone(), FlowState::Idle);
}

#[tokio::test(start_paused = true)]
async fn logout_during_grace_period_skips_verification() {
    let backend = FakeBackend::new("7", &[true, false]);
    let launcher = ScriptedLauncher::new(SurfacePlan::CloseAfter(Duration::from_secs(3)));
    let assistant = Arc::new(assistant(&backend, &launcher));
    assistant.login("Bea", "bea@example.com").await.unwrap();

    let mut flow = assistant.subscribe_flow();
    let pending = tokio::spawn({
        let assistant = assistant.clone();
        async move { assistant.confirm(dentist_appointment()).await }
    });
    flow.wait_for(|state| matches!(state, FlowState::VerifyingCompletion { .. }))
        .await
        .unwrap();

    assistant.logout();
    let outcome = pending.await.unwrap().unwrap();
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert_eq!(outcome, CreationOutcome::AuthorizationFailed(AuthorizationFailure::Cancelled));
    assert_eq!(backend.check_calls(), 1, "no verification after logout");
    assert!(backend.creates().is_empty());
    assert_eq!(assistant.subscribe_flow().borrow().clone(), FlowState::Idle);
}

#[tokio::test(start_paused = true)]
async fn abandoned_flow_leaves_the_next_flow_state_alone() {
    let backend = FakeBackend::new("7", &[true, true, false]);
    let launcher = ScriptedLauncher::new(SurfacePlan::LeaveOpen);
    let assistant = assistant(&backend, &launcher);
    assistant.login("Bea", "bea@example.com").await.unwrap();
    let mut flow = assistant.subscribe_flow();

    let first = assistant.confirm(dentist_appointment());
    tokio::pin!(first);
    tokio::select! {
        outcome = &mut first => panic!("first confirmation ended early: {outcome:?}"),
        () = wait_for_surface(&mut flow) => {}
    }
    assistant.cancel();

    let second = assistant.confirm(dentist_appointment());
    tokio::pin!(second);
    tokio::select! {
        outcome = &mut second => panic!("second confirmation ended early: {outcome:?}"),
        () = wait_for_surface(&mut flow) => {}
    }

    // The first flow only notices its cancellation now, after the second took over.
    let first = first.await.unwrap();
    assert_eq!(first, CreationOutcome::AuthorizationFailed(AuthorizationFailure::Cancelled));
    assert!(matches!(
        *assistant.subscribe_flow().borrow(),
        FlowState::AwaitingExternalCompletion { .. }
    ));

    launcher.user_closes_window();
    let second = second.await.unwrap();
    assert!(second.is_success(), "{second:?}");
    assert_eq!(launcher.open_count(), 2);
    assert_eq!(backend.creates().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn message_returns_to_creating_once_authorized() {
    let backend = FakeBackend::new("7", &[true, false]);
    backend.hang_creates();
    let launcher = ScriptedLauncher::new(SurfacePlan::CloseAfter(Duration::from_secs(5)));
    let assistant = Arc::new(assistant(&backend, &launcher));
    assistant.login("Bea", "bea@example.com").await.unwrap();

    let mut flow = assistant.subscribe_flow();
    let pending = tokio::spawn({
        let assistant = assistant.clone();
        async move { assistant.confirm(dentist_appointment()).await }
    });
    flow.wait_for(|state| matches!(state, FlowState::Succeeded { .. })).await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(backend.creates().len(), 1);
    let message = assistant.message().unwrap();
    assert_eq!(message.kind, MessageKind::Info);
    assert_eq!(message.text, "Creating your event...");

    pending.abort();
}

#[tokio::test(start_paused = true)]
async fn new_parse_abandons_waiting_confirmation() {
    let backend = FakeBackend::new("7", &[true, false]);
    let launcher = ScriptedLauncher::new(SurfacePlan::LeaveOpen);
    let assistant = Arc::new(assistant(&backend, &launcher));
    assistant.login("Bea", "bea@example.com").await.unwrap();

    let mut flow = assistant.subscribe_flow();
    let pending = tokio::spawn({
        let assistant = assistant.clone();
        async move { assistant.confirm(dentist_appointment()).await }
    });
    wait_for_surface(&mut flow).await;

    assistant.parse("lunch with Sam on friday at noon").await.unwrap();
    let outcome = pending.await.unwrap().unwrap();

    assert_eq!(outcome, CreationOutcome::AuthorizationFailed(AuthorizationFailure::Cancelled));
    assert!(backend.creates().is_empty());
    assert_eq!(assistant.message().unwrap().text, "✓ I understood your request!");
}

#[tokio::test(start_paused = true)]
async fn hanging_create_becomes_transport_error() {
    let backend = FakeBackend::authorized("42");
    backend.hang_creates();
    let launcher = ScriptedLauncher::new(SurfacePlan::LeaveOpen);
    let assistant = assistant(&backend, &launcher);
    assistant.login("Ada", "ada@example.com").await.unwrap();

    let started = Instant::now();
    let outcome = assistant.confirm(dentist_appointment()).await.unwrap();

    assert!(matches!(outcome, CreationOutcome::TransportError(_)), "{outcome:?}");
    assert!(started.elapsed() >= Duration::from_secs(300));
    assert_eq!(backend.creates().len(), 1, "no automatic retry");
    assert_eq!(
        assistant.message().unwrap().text,
        "Error creating event. Please check your Google Calendar connection."
    );
}

#[tokio::test(start_paused = true)]
async fn rejection_is_reported_with_reason() {
    let backend = FakeBackend::authorized("42");
    backend.reject_creates("User not found", "USER_NOT_FOUND");
    let launcher = ScriptedLauncher::new(SurfacePlan::LeaveOpen);
    let assistant = assistant(&backend, &launcher);
    assistant.login("Ada", "ada@example.com").await.unwrap();

    let outcome = assistant.confirm(dentist_appointment()).await.unwrap();

    assert_eq!(
        outcome,
        CreationOutcome::Rejected {
            reason: "User not found".into(),
            error_code: Some("USER_NOT_FOUND".into()),
        }
    );
    assert_eq!(assistant.message().unwrap().text, "User not found");
}

#[tokio::test(start_paused = true)]
async fn relogin_after_authorization_checks_again() {
    let backend = FakeBackend::authorized("42");
    let launcher = ScriptedLauncher::new(SurfacePlan::LeaveOpen);
    let assistant = assistant(&backend, &launcher);

    assistant.login("Ada", "ada@example.com").await.unwrap();
    assistant.confirm(dentist_appointment()).await.unwrap();
    assert_eq!(assistant.authorization_state(), AuthorizationState::Authorized);

    assistant.login("Ada", "ada@example.com").await.unwrap();
    assert_eq!(assistant.authorization_state(), AuthorizationState::Unknown);

    assistant.confirm(dentist_appointment()).await.unwrap();
    assert_eq!(backend.check_calls(), 2);
}
