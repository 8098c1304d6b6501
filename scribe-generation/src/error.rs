//! Errors from a single generation attempt

use thiserror::Error;

/// Why a backend attempt produced no content. Always recovered by the synthesizer.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("{backend} is not configured")]
    NotConfigured { backend: String },

    #[error("{backend} client setup failed: {message}")]
    Client { backend: String, message: String },

    #[error("{backend} request failed: {message}")]
    Request { backend: String, message: String },

    #[error("{backend} returned no text")]
    EmptyResponse { backend: String },

    #[error("{backend} did not answer within {timeout_ms}ms")]
    Timeout { backend: String, timeout_ms: u64 },
}

impl GenerationError {
    pub fn backend(&self) -> &str {
        match self {
            GenerationError::NotConfigured { backend }
            | GenerationError::Client { backend, .. }
            | GenerationError::Request { backend, .. }
            | GenerationError::EmptyResponse { backend }
            | GenerationError::Timeout { backend, .. } => backend,
        }
    }
}
