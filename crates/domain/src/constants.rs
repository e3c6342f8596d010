//! Application constants
//!
//! Centralized location for the timing defaults and backend locations used
//! throughout the application.

// Backend locations
pub const LOCAL_BACKEND_URL: &str = "http://localhost:8080/api";
pub const HOSTED_BACKEND_URL: &str = "https://smartcalendarassistant-production.up.railway.app/api";

// Request timeouts
pub const HEALTH_TIMEOUT_SECS: u64 = 5;
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
pub const CREATE_EVENT_TIMEOUT_SECS: u64 = 300;

// Authorization polling
pub const AUTH_POLL_INTERVAL_MS: u64 = 1_000;
pub const AUTH_MAX_POLL_CYCLES: u32 = 120;
pub const AUTH_GRACE_PERIOD_MS: u64 = 2_000;

/// Header carrying the acting user on create-event calls.
pub const USER_ID_HEADER: &str = "User-Id";
