//! Shared test helpers for `smartcal-core` integration tests.
//!
//! An in-memory backend that scripts the authorization answers and records
//! every call, plus a surface launcher whose windows close on a tokio clock
//! so flows can be driven with paused time.

#![allow(dead_code)]

pub mod backend;
pub mod surface;

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use smartcal_core::{AssistantPorts, CalendarAssistant};
use smartcal_domain::{ActionType, Config, ParsedEvent};

pub use backend::FakeBackend;
pub use surface::{ScriptedLauncher, SurfacePlan};

/// Assistant wired to the given fakes with the default timing policy.
pub fn assistant(backend: &Arc<FakeBackend>, launcher: &Arc<ScriptedLauncher>) -> CalendarAssistant {
    let ports = AssistantPorts::from_backend(backend.clone(), launcher.clone());
    CalendarAssistant::new(ports, &Config::default())
}

/// "Dentist tomorrow at 3pm" as the parser would return it.
pub fn dentist_appointment() -> ParsedEvent {
    ParsedEvent {
        successful: true,
        action_type: Some(ActionType::Create),
        title: Some("Dentist".into()),
        date: NaiveDate::from_ymd_opt(2025, 3, 14),
        start_time: NaiveTime::from_hms_opt(15, 0, 0),
        end_time: NaiveTime::from_hms_opt(16, 0, 0),
        location: Some("Main St".into()),
        error_message: None,
    }
}
