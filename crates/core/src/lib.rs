//! # SmartCal Core
//!
//! Business logic for the calendar assistant - no HTTP or process code.
//!
//! This crate contains:
//! - Port interfaces (traits) for the backend and the authorization surface
//! - The connectivity probe and session store
//! - The authorization status cache and flow controller
//! - The event creation gate and the assistant facade on top of it
//!
//! ## Architecture Principles
//! - Only depends on `smartcal-domain`
//! - All external collaborators via traits
//! - Every wait is cancellable and driven by tokio time, so tests can run on
//!   a paused clock

pub mod assistant;
pub mod authorization;
pub mod gate;
pub mod messages;
pub mod ports;
pub mod probe;
pub mod session;

pub use assistant::{AssistantPorts, CalendarAssistant};
pub use authorization::{
    AuthorizationAttempt, AuthorizationFlowController, AuthorizationSnapshot,
    AuthorizationStatusCache, FlowOutcome, FlowState,
};
pub use gate::{CreationOutcome, EventCreationGate};
pub use ports::{
    AccountDirectory, AuthorizationBackend, EventCreator, EventParser, ExternalSurface,
    HealthCheck, RegisteredUser, SurfaceBlocked, SurfaceLauncher,
};
pub use probe::ConnectivityProbe;
pub use session::SessionStore;
