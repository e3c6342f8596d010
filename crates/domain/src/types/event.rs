//! Calendar event types
//!
//! `ParsedEvent` is what the natural-language parser hands back;
//! `EventPayload` is what gets sent to the create-event call once the user
//! confirms it.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{Result, SmartCalError};

/// What the user asked the parser for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionType {
    Create,
    View,
    Update,
    Delete,
    #[serde(other)]
    Unknown,
}

/// Structured interpretation of free text
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedEvent {
    pub successful: bool,
    #[serde(default)]
    pub action_type: Option<ActionType>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default, with = "clock_time::optional")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, with = "clock_time::optional")]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl ParsedEvent {
    /// Turn a successful interpretation into the payload the user confirms.
    ///
    /// # Errors
    /// Returns `SmartCalError::InvalidInput` when the parse failed, is not a
    /// create request, or lacks a title, date or start time.
    pub fn into_payload(self) -> Result<EventPayload> {
        if !self.successful {
            return Err(SmartCalError::InvalidInput(
                self.error_message.unwrap_or_else(|| "Could not understand the request".into()),
            ));
        }

        if let Some(action) = self.action_type {
            if !matches!(action, ActionType::Create) {
                return Err(SmartCalError::InvalidInput(format!(
                    "only create requests can be confirmed (got {action:?})"
                )));
            }
        }

        let title = self
            .title
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| SmartCalError::InvalidInput("parsed event has no title".into()))?;
        let date =
            self.date.ok_or_else(|| SmartCalError::InvalidInput("parsed event has no date".into()))?;
        let start_time = self
            .start_time
            .ok_or_else(|| SmartCalError::InvalidInput("parsed event has no start time".into()))?;

        Ok(EventPayload {
            title,
            date,
            start_time,
            end_time: self.end_time,
            location: self.location.filter(|l| !l.trim().is_empty()),
        })
    }
}

/// Body of the create-event call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    pub title: String,
    pub date: NaiveDate,
    #[serde(with = "clock_time")]
    pub start_time: NaiveTime,
    #[serde(default, with = "clock_time::optional", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// A confirmed payload waiting to be created.
///
/// Deliberately not `Clone`: the gate consumes it when it issues the create
/// call, so one confirmation can produce at most one call.
#[derive(Debug, PartialEq, Eq)]
pub struct PendingEventRequest {
    pub confirmation_id: Uuid,
    pub captured_at: DateTime<Utc>,
    payload: EventPayload,
}

impl PendingEventRequest {
    pub fn new(payload: EventPayload) -> Self {
        Self { confirmation_id: Uuid::new_v4(), captured_at: Utc::now(), payload }
    }

    pub fn payload(&self) -> &EventPayload {
        &self.payload
    }

    pub fn into_payload(self) -> EventPayload {
        self.payload
    }
}

/// Backend acknowledgement of a created event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreationConfirmation {
    pub message: String,
    pub error_code: Option<String>,
}

/// Wall-clock times as `HH:MM`, accepting `HH:MM:SS[.fff]` on input.
mod clock_time {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const OUTPUT_FORMAT: &str = "%H:%M";
    const INPUT_FORMATS: [&str; 2] = ["%H:%M:%S%.f", "%H:%M"];

    pub fn parse(raw: &str) -> Option<NaiveTime> {
        INPUT_FORMATS.iter().find_map(|fmt| NaiveTime::parse_from_str(raw.trim(), fmt).ok())
    }

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(OUTPUT_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid time of day: {raw}")))
    }

    pub mod optional {
        use chrono::NaiveTime;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            time: &Option<NaiveTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match time {
                Some(time) => super::serialize(time, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveTime>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) if raw.trim().is_empty() => Ok(None),
                Some(raw) => super::parse(&raw).map(Some).ok_or_else(|| {
                    serde::de::Error::custom(format!("invalid time of day: {raw}"))
                }),
                None => Ok(None),
            }
        }
    }
}
