//! Infrastructure error handling

mod conversions;

pub use conversions::{classify_connectivity, InfraError};
