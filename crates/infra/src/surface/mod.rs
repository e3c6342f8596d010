//! External authorization surfaces

pub mod process;

pub use process::{ProcessSurface, ProcessSurfaceLauncher};
