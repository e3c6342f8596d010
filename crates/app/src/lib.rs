//! # SmartCal App
//!
//! Wiring and terminal front end for the `smartcal` binary.

pub mod cli;
pub mod context;
pub mod render;
pub mod utils;

pub use context::AppContext;
