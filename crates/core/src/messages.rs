//! User-facing texts

use smartcal_domain::{AuthorizationFailure, DisplayMessage, ParsedEvent};

use crate::authorization::FlowState;
use crate::gate::CreationOutcome;

pub const CONNECTION_FAILED: &str = "Failed to connect to server. Make sure backend is running.";

pub fn welcome(display_name: &str) -> DisplayMessage {
    DisplayMessage::success(format!("Welcome, {display_name}!"))
}

pub fn parse_result(parsed: &ParsedEvent) -> DisplayMessage {
    if parsed.successful {
        DisplayMessage::success("✓ I understood your request!")
    } else {
        DisplayMessage::error(
            parsed
                .error_message
                .clone()
                .filter(|msg| !msg.trim().is_empty())
                .unwrap_or_else(|| "Could not understand the request".to_string()),
        )
    }
}

pub fn parse_unavailable() -> DisplayMessage {
    DisplayMessage::error("Error parsing request. Please try again.")
}

pub fn creating() -> DisplayMessage {
    DisplayMessage::info("Creating your event...")
}

/// Advisory shown while the flow sits in `state`. Once authorized the create
/// call is underway. Failed states produce nothing here; the creation outcome
/// reports them.
pub fn flow_advisory(state: &FlowState) -> Option<DisplayMessage> {
    let text = match state {
        FlowState::Authorized | FlowState::Succeeded { .. } => return Some(creating()),
        FlowState::CheckingAuthorization => "Checking Google Calendar authorization...",
        FlowState::RequestingAuthorizationUrl => "Opening Google Calendar authorization...",
        FlowState::AwaitingExternalCompletion { cycles_elapsed: 0, .. } => {
            "Please complete the authorization in the window that just opened."
        }
        FlowState::VerifyingCompletion { .. } => "Verifying authorization...",
        _ => return None,
    };
    Some(DisplayMessage::info(text))
}

/// The one terminal message for a confirmation. Cancellation stays silent.
pub fn creation_outcome(outcome: &CreationOutcome) -> Option<DisplayMessage> {
    let message = match outcome {
        CreationOutcome::Success(_) => {
            DisplayMessage::success("✓ Event created successfully in your Google Calendar!")
        }
        CreationOutcome::Rejected { reason, .. } if !reason.trim().is_empty() => {
            DisplayMessage::error(reason.clone())
        }
        CreationOutcome::Rejected { .. } => DisplayMessage::error("Failed to create event"),
        CreationOutcome::TransportError(_) => DisplayMessage::error(
            "Error creating event. Please check your Google Calendar connection.",
        ),
        CreationOutcome::AuthorizationFailed(reason) => return authorization_failure(reason),
    };
    Some(message)
}

pub fn authorization_failure(reason: &AuthorizationFailure) -> Option<DisplayMessage> {
    let text = match reason {
        AuthorizationFailure::WindowBlocked => {
            "The authorization window was blocked. Allow pop-ups for this app and try again."
                .to_string()
        }
        AuthorizationFailure::NotCompleted => {
            "Google Calendar authorization was not completed. Please try again.".to_string()
        }
        AuthorizationFailure::TimedOut => {
            "Authorization timed out after 2 minutes. Please try again.".to_string()
        }
        AuthorizationFailure::InProgress => {
            "Authorization is already in progress. Finish it in the open window first."
                .to_string()
        }
        AuthorizationFailure::UrlUnavailable(detail) => {
            format!("Could not start Google Calendar authorization: {detail}")
        }
        AuthorizationFailure::CheckFailed(detail) => {
            format!("Could not check Google Calendar authorization: {detail}")
        }
        AuthorizationFailure::Cancelled => return None,
    };
    Some(DisplayMessage::error(text))
}
