//! Application context - dependency injection container

use std::sync::Arc;

use smartcal_core::{AssistantPorts, CalendarAssistant, SurfaceLauncher};
use smartcal_domain::{Config, Result};
use smartcal_infra::{BackendClient, ProcessSurfaceLauncher};
use tracing::info;

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub backend: Arc<BackendClient>,
    pub assistant: CalendarAssistant,
    // Owns every authorization window; dropping the context closes them.
    _launcher: Arc<ProcessSurfaceLauncher>,
}

impl AppContext {
    /// Build the backend client, the window launcher and the assistant.
    ///
    /// # Errors
    /// Returns an error if the backend client cannot be built from `config`.
    pub fn new(config: Config) -> Result<Self> {
        let backend = Arc::new(BackendClient::new(&config.backend)?);
        let launcher = Arc::new(ProcessSurfaceLauncher::new(&config.browser));

        let surface_launcher: Arc<dyn SurfaceLauncher> = launcher.clone();
        let ports = AssistantPorts::from_backend(backend.clone(), surface_launcher);
        let assistant = CalendarAssistant::new(ports, &config);

        info!(
            backend = %backend.base_url(),
            browser = %config.browser.program,
            "SmartCal context initialized"
        );

        Ok(Self { config, backend, assistant, _launcher: launcher })
    }
}
