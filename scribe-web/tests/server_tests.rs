//! Tests against a real listener, so the socket peer address is in play

mod helpers;

use helpers::{test_config, test_state, FakeSource, Feed};
use scribe_core::{AuthMode, SourceId};
use scribe_web::create_app;
use serde_json::json;
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Serve the app on an ephemeral port and return its base URL
async fn spawn_app(trust_proxy_headers: bool) -> String {
    let mut config = test_config(AuthMode::Open);
    config.server.trust_proxy_headers = trust_proxy_headers;
    let state = test_state(
        config,
        vec![FakeSource::new(SourceId::Web, Feed::Results(2))],
        Vec::new(),
    );
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(
            listener,
            create_app(state).into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("server error");
    });

    format!("http://127.0.0.1:{}", port)
}

#[tokio::test]
async fn test_health_over_http() {
    let address = spawn_app(false).await;

    let response = reqwest::get(format!("{}/api/health", address))
        .await
        .expect("Failed to execute request.");

    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_peer_address_is_the_rate_limit_key_without_proxy_headers() {
    let address = spawn_app(true).await;
    let client = reqwest::Client::new();
    let body = json!({ "topic": "electric cars", "sources": ["web"] });

    for _ in 0..5 {
        let response = client
            .post(format!("{}/api/research", address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.");
        assert_eq!(response.status(), reqwest::StatusCode::OK);
    }

    let limited = client
        .post(format!("{}/api/research", address))
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(limited.status(), reqwest::StatusCode::TOO_MANY_REQUESTS);
    assert!(limited.headers().contains_key("retry-after"));

    // A proxy-reported address gets its own window
    let forwarded = client
        .post(format!("{}/api/research", address))
        .header("x-forwarded-for", "192.0.2.44, 10.0.0.1")
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(forwarded.status(), reqwest::StatusCode::OK);
}

#[tokio::test]
async fn test_forged_forwarded_for_does_not_reset_the_window() {
    let address = spawn_app(false).await;
    let client = reqwest::Client::new();
    let body = json!({ "topic": "electric cars", "sources": ["web"] });

    for i in 0..5 {
        let response = client
            .post(format!("{}/api/research", address))
            .header("x-forwarded-for", format!("192.0.2.{}", i + 1))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.");
        assert_eq!(response.status(), reqwest::StatusCode::OK);
    }

    // A fresh header value still maps to the same socket peer
    let limited = client
        .post(format!("{}/api/research", address))
        .header("x-forwarded-for", "192.0.2.200")
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(limited.status(), reqwest::StatusCode::TOO_MANY_REQUESTS);
}
