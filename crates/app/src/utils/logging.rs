use std::time::Duration;

use smartcal_domain::SmartCalError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `default_level` when set. Logs go to stderr so the
/// assistant's own output on stdout stays clean.
///
/// # Errors
/// Fails if `default_level` is not a valid filter directive or a global
/// subscriber is already installed.
pub fn init_tracing(default_level: &str, json: bool) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_level)?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if json {
        builder.json().try_init().map_err(|err| anyhow::anyhow!(err))?;
    } else {
        builder.compact().try_init().map_err(|err| anyhow::anyhow!(err))?;
    }
    Ok(())
}

/// Log the outcome of a CLI command with structured fields.
///
/// `command` should be a stable identifier such as `"create"`.
#[inline]
pub fn log_command_execution(command: &str, elapsed: Duration, success: bool) {
    let duration_ms = elapsed.as_millis() as u64;

    if success {
        info!(command, duration_ms, "command_execution_success");
    } else {
        warn!(command, duration_ms, "command_execution_failure");
    }
}

/// Convert a `SmartCalError` into a stable label suitable for logging.
#[inline]
pub fn error_label(error: &SmartCalError) -> &'static str {
    match error {
        SmartCalError::Config(_) => "config",
        SmartCalError::Platform(_) => "platform",
        SmartCalError::Network(_) => "network",
        SmartCalError::Auth(_) => "auth",
        SmartCalError::NotFound(_) => "not_found",
        SmartCalError::InvalidInput(_) => "invalid_input",
        SmartCalError::Internal(_) => "internal",
    }
}
