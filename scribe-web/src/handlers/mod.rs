//! HTTP request handlers for the Scribe web server

pub mod generate;
pub mod health;
pub mod research;
pub mod types;
pub mod usage;

pub use generate::*;
pub use health::*;
pub use research::*;
pub use usage::*;

pub use types::*;
