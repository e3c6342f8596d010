//! Configuration loader
//!
//! Loads client configuration from a file (if one is found) and overlays
//! environment variables on top.
//!
//! ## Loading Strategy
//! 1. Probes multiple paths for a config file (JSON or TOML)
//! 2. Falls back to built-in defaults when none exists
//! 3. Applies environment overrides last
//!
//! ## Environment Variables
//! - `SMARTCAL_BACKEND_URL`: Explicit backend base URL (including `/api`)
//! - `SMARTCAL_DEPLOYMENT`: `local` or `hosted`; picks the default base URL
//! - `SMARTCAL_POLL_INTERVAL_MS`: Authorization window poll interval
//! - `SMARTCAL_MAX_POLL_CYCLES`: Poll cycles before the attempt times out
//! - `SMARTCAL_GRACE_PERIOD_MS`: Wait after the window closes before verifying
//! - `SMARTCAL_BROWSER`: Program used to open the authorization window
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./smartcal.json` or `./smartcal.toml` (current working directory)
//! 2. `./config.json` or `./config.toml` (current working directory)
//! 3. The same names one and two directories up
//! 4. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use smartcal_domain::{Config, DeploymentContext, Result, SmartCalError};

const ENV_BACKEND_URL: &str = "SMARTCAL_BACKEND_URL";
const ENV_DEPLOYMENT: &str = "SMARTCAL_DEPLOYMENT";
const ENV_POLL_INTERVAL_MS: &str = "SMARTCAL_POLL_INTERVAL_MS";
const ENV_MAX_POLL_CYCLES: &str = "SMARTCAL_MAX_POLL_CYCLES";
const ENV_GRACE_PERIOD_MS: &str = "SMARTCAL_GRACE_PERIOD_MS";
const ENV_BROWSER: &str = "SMARTCAL_BROWSER";

const CONFIG_NAMES: [&str; 4] = ["smartcal.json", "smartcal.toml", "config.json", "config.toml"];

/// Load configuration: probed file or defaults, then environment overrides.
///
/// # Errors
/// Returns `SmartCalError::Config` if a config file exists but cannot be
/// parsed, or an environment variable has an invalid value.
pub fn load() -> Result<Config> {
    let base = match probe_config_paths() {
        Some(path) => load_from_file(Some(path))?,
        None => {
            tracing::debug!("No config file found, using defaults");
            Config::default()
        }
    };
    apply_env_overrides(base)
}

/// Defaults with environment overrides applied.
///
/// # Environment Variables
/// See module documentation for the complete list.
///
/// # Errors
/// Returns `SmartCalError::Config` if a variable has an invalid value.
pub fn load_from_env() -> Result<Config> {
    apply_env_overrides(Config::default())
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
/// Sections and fields missing from the file keep their defaults.
///
/// # Errors
/// Returns `SmartCalError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(SmartCalError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            SmartCalError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| SmartCalError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `SmartCalError::Config` if format is invalid or parsing fails.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| SmartCalError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| SmartCalError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(SmartCalError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Overlay environment variables onto `config`.
///
/// An explicit `SMARTCAL_BACKEND_URL` wins over `SMARTCAL_DEPLOYMENT`.
///
/// # Errors
/// Returns `SmartCalError::Config` if a variable has an invalid value.
pub fn apply_env_overrides(mut config: Config) -> Result<Config> {
    if let Some(deployment) = env_var(ENV_DEPLOYMENT) {
        config.backend.deployment = DeploymentContext::from_str(deployment.trim())
            .map_err(|_| SmartCalError::Config(format!("Invalid {ENV_DEPLOYMENT}: {deployment}")))?;
        config.backend.base_url = None;
    }
    if let Some(url) = env_var(ENV_BACKEND_URL) {
        config.backend.base_url = Some(url);
    }

    if let Some(interval) = env_parse::<u64>(ENV_POLL_INTERVAL_MS)? {
        config.authorization.poll_interval_ms = interval;
    }
    if let Some(cycles) = env_parse::<u32>(ENV_MAX_POLL_CYCLES)? {
        if cycles == 0 {
            return Err(SmartCalError::Config(format!("{ENV_MAX_POLL_CYCLES} must be positive")));
        }
        config.authorization.max_poll_cycles = cycles;
    }
    if let Some(grace) = env_parse::<u64>(ENV_GRACE_PERIOD_MS)? {
        config.authorization.grace_period_ms = grace;
    }

    if let Some(browser) = env_var(ENV_BROWSER) {
        config.browser.program = browser;
    }

    Ok(config)
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    // Try current working directory and its parents
    if let Ok(cwd) = std::env::current_dir() {
        roots.extend([cwd.clone(), cwd.join(".."), cwd.join("../..")]);
    }

    // Try relative to executable
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.extend([exe_dir.to_path_buf(), exe_dir.join(".."), exe_dir.join("../..")]);
        }
    }

    // Return first existing candidate
    roots
        .iter()
        .flat_map(|root| CONFIG_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

/// Non-empty environment variable
fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Parse an optional numeric environment variable
///
/// # Errors
/// Returns `SmartCalError::Config` if the variable is set but does not parse.
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_var(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| SmartCalError::Config(format!("Invalid {}: {}", key, e)))
        })
        .transpose()
}
