//! Calendar authorization: the status cache and the flow that obtains consent

pub mod attempt;
pub mod cache;
pub mod flow;

pub use attempt::AuthorizationAttempt;
pub use cache::{AuthorizationSnapshot, AuthorizationStatusCache};
pub use flow::{AuthorizationFlowController, FlowOutcome, FlowState};
