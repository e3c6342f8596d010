//! Configuration structures
//!
//! Every section has serde defaults so a partial file (or none at all) still
//! yields a usable configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    AUTH_GRACE_PERIOD_MS, AUTH_MAX_POLL_CYCLES, AUTH_POLL_INTERVAL_MS, CREATE_EVENT_TIMEOUT_SECS,
    HEALTH_TIMEOUT_SECS, HOSTED_BACKEND_URL, LOCAL_BACKEND_URL, REQUEST_TIMEOUT_SECS,
};
use crate::impl_domain_status_conversions;

/// Where the client is running; picks the default backend location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentContext {
    #[default]
    Local,
    Hosted,
}

impl_domain_status_conversions!(DeploymentContext {
    Local => "local",
    Hosted => "hosted",
});

impl DeploymentContext {
    pub fn default_backend_url(self) -> &'static str {
        match self {
            Self::Local => LOCAL_BACKEND_URL,
            Self::Hosted => HOSTED_BACKEND_URL,
        }
    }
}

/// Top-level client configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub authorization: AuthorizationConfig,
    pub browser: BrowserConfig,
}

/// Backend collaborator location and request timeouts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub deployment: DeploymentContext,
    /// Explicit base URL; overrides the deployment default when set
    pub base_url: Option<String>,
    pub health_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub create_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            deployment: DeploymentContext::Local,
            base_url: None,
            health_timeout_secs: HEALTH_TIMEOUT_SECS,
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            create_timeout_secs: CREATE_EVENT_TIMEOUT_SECS,
        }
    }
}

impl BackendConfig {
    /// Base URL without a trailing slash.
    pub fn resolved_base_url(&self) -> String {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.deployment.default_backend_url())
            .trim_end_matches('/')
            .to_string()
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn create_timeout(&self) -> Duration {
        Duration::from_secs(self.create_timeout_secs)
    }
}

/// Polling policy for the external authorization surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorizationConfig {
    pub poll_interval_ms: u64,
    pub max_poll_cycles: u32,
    pub grace_period_ms: u64,
}

impl Default for AuthorizationConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: AUTH_POLL_INTERVAL_MS,
            max_poll_cycles: AUTH_MAX_POLL_CYCLES,
            grace_period_ms: AUTH_GRACE_PERIOD_MS,
        }
    }
}

impl AuthorizationConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    /// Upper bound on how long a surface is watched before timing out.
    pub fn ceiling(&self) -> Duration {
        self.poll_interval().saturating_mul(self.max_poll_cycles)
    }
}

/// How the authorization window is launched.
///
/// `args` may contain `{url}` and `{profile}` placeholders. The launched
/// process must stay alive for as long as the window is open; a dedicated
/// profile directory keeps Chromium-family browsers from handing the window
/// to an already running instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            program: default_browser_program().to_string(),
            args: vec![
                "--user-data-dir={profile}".to_string(),
                "--no-first-run".to_string(),
                "--app={url}".to_string(),
            ],
        }
    }
}

fn default_browser_program() -> &'static str {
    if cfg!(target_os = "macos") {
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"
    } else if cfg!(target_os = "windows") {
        "chrome.exe"
    } else {
        "chromium"
    }
}
