//! Domain types and models

pub mod authorization;
pub mod connectivity;
pub mod event;
pub mod message;
pub mod session;

pub use authorization::{AttemptId, AttemptStatus, AuthorizationState};
pub use connectivity::{ConnectivityStatus, ProbeReport};
pub use event::{
    ActionType, CreationConfirmation, EventPayload, ParsedEvent, PendingEventRequest,
};
pub use message::{DisplayMessage, MessageKind};
pub use session::{Session, UserId};
