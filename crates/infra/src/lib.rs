//! # SmartCal Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - The REST client for the calendar backend
//! - The browser-process authorization window
//! - Configuration loading (files and environment)
//!
//! ## Architecture
//! - Implements traits defined in `smartcal-core`
//! - Depends on `smartcal-domain` and `smartcal-core`
//! - Contains all "impure" code (network, processes, filesystem)

pub mod backend;
pub mod config;
pub mod errors;
pub mod http;
pub mod surface;

// Re-export commonly used items
pub use backend::BackendClient;
pub use errors::{classify_connectivity, InfraError};
pub use http::{HttpClient, HttpClientBuilder};
pub use surface::{ProcessSurface, ProcessSurfaceLauncher};
