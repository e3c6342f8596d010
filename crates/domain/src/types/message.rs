//! User-facing messages produced by the core

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Info,
    Success,
    Error,
}

/// One line of feedback for the UI.
///
/// Non-persistent messages are advisory and get replaced by the next one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayMessage {
    pub kind: MessageKind,
    pub text: String,
    pub persistent: bool,
}

impl DisplayMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self { kind: MessageKind::Info, text: text.into(), persistent: false }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self { kind: MessageKind::Success, text: text.into(), persistent: true }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { kind: MessageKind::Error, text: text.into(), persistent: true }
    }

    pub fn is_terminal(&self) -> bool {
        self.persistent
    }
}
