//! Route definitions for the Scribe web server

use crate::{auth, handlers, openapi, AppState};
use axum::{
    routing::{get, post},
    Router,
};

/// API routes, mounted under `/api`
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Research aggregation
        .route(
            "/research",
            post(handlers::research).get(handlers::research_capabilities),
        )
        // Content generation
        .route(
            "/generate",
            post(handlers::generate).get(handlers::generation_capabilities),
        )
        // Accounts
        .route("/usage", get(handlers::usage))
        .route("/auth/register", post(auth::handlers::register))
        .route("/auth/login", post(auth::handlers::login))
        .route("/auth/logout", post(auth::handlers::logout))
        .route("/auth/me", get(auth::handlers::me))
        .route("/openapi.json", get(openapi::openapi_json))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use scribe_core::ScribeConfig;
    use scribe_generation::ContentSynthesizer;
    use scribe_research::ResearchAggregator;
    use std::time::Duration;
    use tower::ServiceExt;

    fn state() -> AppState {
        AppState::with_components(
            ScribeConfig::default(),
            ResearchAggregator::new(Duration::from_secs(10), 5),
            ContentSynthesizer::new(Vec::new(), Duration::from_secs(30)),
        )
    }

    #[tokio::test]
    async fn test_health_check_route() {
        let app = api_routes().with_state(state());

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/health")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let app = api_routes().with_state(state());

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/wiki")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
