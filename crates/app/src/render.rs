//! Terminal rendering

use smartcal_domain::{
    AuthorizationState, DisplayMessage, MessageKind, ParsedEvent, ProbeReport,
};

/// One message line, prefixed by its kind.
pub fn message_line(message: &DisplayMessage) -> String {
    let prefix = match message.kind {
        MessageKind::Info => "…",
        MessageKind::Success => "✔",
        MessageKind::Error => "✖",
    };
    format!("{prefix} {}", message.text)
}

/// Multi-line preview of an interpretation, shown before asking to confirm.
pub fn event_preview(parsed: &ParsedEvent) -> String {
    let mut lines = Vec::new();
    let field = |label: &str, value: Option<String>| {
        format!("  {label:<9}{}", value.unwrap_or_else(|| "-".to_string()))
    };

    lines.push(field("Title", parsed.title.clone()));
    lines.push(field("Date", parsed.date.map(|date| date.format("%A, %B %-d, %Y").to_string())));
    lines.push(field(
        "Time",
        parsed.start_time.map(|start| match parsed.end_time {
            Some(end) => format!("{} - {}", start.format("%H:%M"), end.format("%H:%M")),
            None => start.format("%H:%M").to_string(),
        }),
    ));
    if let Some(location) = parsed.location.as_deref().filter(|l| !l.trim().is_empty()) {
        lines.push(field("Location", Some(location.to_string())));
    }
    lines.join("\n")
}

pub fn probe_line(report: &ProbeReport) -> String {
    if report.reachable {
        format!("Backend connected ({})", report.detail)
    } else {
        format!("Backend unreachable: {}", report.detail)
    }
}

pub fn authorization_badge(state: AuthorizationState) -> &'static str {
    match state {
        AuthorizationState::Authorized => "Google Calendar connected",
        AuthorizationState::Unauthorized => "Google Calendar not connected",
        AuthorizationState::Checking => "Checking Google Calendar connection...",
        AuthorizationState::Unknown => "Google Calendar connection unknown",
    }
}
