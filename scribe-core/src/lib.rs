//! Scribe Core - shared data structures, errors and infrastructure
//!
//! This crate defines the types that flow through the research and generation
//! pipeline, plus the error, configuration and logging layers every other
//! scribe crate builds on.

pub mod async_utils;
pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use async_utils::*;
pub use config::*;
pub use error::*;
pub use logging::*;
pub use types::*;

// Re-export commonly used external types
pub use tokio;
pub use tracing;
