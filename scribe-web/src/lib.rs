//! Scribe Web Server
//!
//! HTTP API for research aggregation and rate-limited content generation.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod openapi;
pub mod routes;
pub mod security;
pub mod server;
pub mod state;

// Re-export main types
pub use error::ApiError;
pub use server::{ScribeServer, ScribeServerBuilder};
pub use state::AppState;

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware, Router,
};
use scribe_core::ScribeError;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

/// Create the main application router
pub fn create_app(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .server
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            // Credentialed CORS cannot use a wildcard origin
            Ok(value) if value != "*" => Some(value),
            _ => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let body_limit = state.config.server.body_limit_bytes;

    let mut app = Router::new()
        .nest("/api", routes::api_routes())
        .layer(middleware::from_fn(security::security_headers_middleware))
        .layer(TraceLayer::new_for_http());

    if !origins.is_empty() {
        app = app.layer(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([Method::GET, Method::POST])
                .allow_credentials(true)
                .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE]),
        );
    }

    app.layer(DefaultBodyLimit::max(body_limit)).with_state(state)
}

/// Error types for the web server
#[derive(thiserror::Error, Debug)]
pub enum WebError {
    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Scribe(#[from] ScribeError),
}

/// Result type for web operations
pub type WebResult<T> = Result<T, WebError>;
