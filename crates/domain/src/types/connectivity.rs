//! Backend reachability types

use serde::{Deserialize, Serialize};

use crate::errors::ConnectivityFailure;

/// Tri-state connectivity shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "failure", rename_all = "snake_case")]
pub enum ConnectivityStatus {
    #[default]
    Checking,
    Connected,
    Unreachable(ConnectivityFailure),
}

/// Result of one probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeReport {
    pub reachable: bool,
    pub detail: String,
    pub failure: Option<ConnectivityFailure>,
}

impl ProbeReport {
    pub fn connected(detail: impl Into<String>) -> Self {
        Self { reachable: true, detail: detail.into(), failure: None }
    }

    /// Unreachable report whose detail is the failure's hint.
    pub fn unreachable(failure: ConnectivityFailure) -> Self {
        Self { reachable: false, detail: format!("{failure}. {}", failure.hint()), failure: Some(failure) }
    }

    pub fn status(&self) -> ConnectivityStatus {
        match &self.failure {
            Some(failure) => ConnectivityStatus::Unreachable(failure.clone()),
            None => ConnectivityStatus::Connected,
        }
    }
}
