//! Shared fixtures for the HTTP tests: scripted sources and backends plus a
//! small client that drives the router in-process.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use scribe_core::{
    provider_error, AuthMode, RateLimitPolicy, ScribeConfig, ScribeResult, SearchResult, SourceId,
};
use scribe_generation::{ContentSynthesizer, GenerationError, GenerationPrompt, Generator};
use scribe_research::{ResearchAggregator, SourceAdapter};
use scribe_web::{create_app, AppState};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "integration-test-secret";
pub const DEFAULT_IP: &str = "203.0.113.7";

/// What a fake source does when asked
#[derive(Clone)]
pub enum Feed {
    Results(usize),
    Fail,
    Hang,
}

pub struct FakeSource {
    source: SourceId,
    configured: bool,
    feed: Feed,
    calls: AtomicUsize,
}

impl FakeSource {
    pub fn new(source: SourceId, feed: Feed) -> Arc<Self> {
        Arc::new(Self {
            source,
            configured: true,
            feed,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn unconfigured(source: SourceId) -> Arc<Self> {
        Arc::new(Self {
            source,
            configured: false,
            feed: Feed::Results(1),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceAdapter for FakeSource {
    fn source(&self) -> SourceId {
        self.source
    }

    fn provider(&self) -> &'static str {
        "fake"
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn fetch(&self, topic: &str, _max_results: usize) -> ScribeResult<Vec<SearchResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.feed.clone() {
            Feed::Results(count) => Ok((0..count)
                .map(|i| {
                    SearchResult::new(self.source, format!("{} on {} #{}", topic, self.source, i))
                        .with_url(Some(format!("https://{}.example.com/{}", self.source, i)))
                })
                .collect()),
            Feed::Fail => Err(provider_error!("fake", "HTTP 502")),
            Feed::Hang => {
                std::future::pending::<()>().await;
                Ok(Vec::new())
            }
        }
    }
}

/// Backend that answers with fixed text, or fails when `reply` is `None`
pub struct FakeBackend {
    name: &'static str,
    reply: Option<&'static str>,
    configured: bool,
    calls: AtomicUsize,
}

impl FakeBackend {
    pub fn replying(name: &'static str, reply: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            reply: Some(reply),
            configured: true,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            reply: None,
            configured: true,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn unconfigured(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            reply: None,
            configured: false,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Generator for FakeBackend {
    fn name(&self) -> &str {
        self.name
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn attempt(
        &self,
        _prompt: &GenerationPrompt,
        _token_budget: u32,
    ) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply
            .map(str::to_string)
            .ok_or_else(|| GenerationError::Request {
                backend: self.name.to_string(),
                message: "HTTP 503".to_string(),
            })
    }
}

/// Config with a fixed secret and tight research/generate limits (5 per second).
/// Proxy headers are trusted so in-process requests can pick their address.
pub fn test_config(mode: AuthMode) -> ScribeConfig {
    let mut config = ScribeConfig::default();
    config.server.trust_proxy_headers = true;
    config.auth.mode = mode;
    config.auth.jwt_secret = Some(TEST_SECRET.to_string());
    config.auth.cookie_secure = false;
    config.rate_limits.research = RateLimitPolicy::new(5, 1000);
    config.rate_limits.generate = RateLimitPolicy::new(5, 1000);
    config
}

pub fn test_state(
    config: ScribeConfig,
    sources: Vec<Arc<FakeSource>>,
    backends: Vec<Arc<FakeBackend>>,
) -> AppState {
    let mut aggregator = ResearchAggregator::new(
        Duration::from_millis(config.research.timeout_ms),
        config.research.max_results_per_source,
    );
    for source in sources {
        aggregator.register(source);
    }

    let synthesizer = ContentSynthesizer::new(
        backends
            .into_iter()
            .map(|b| b as Arc<dyn Generator>)
            .collect(),
        Duration::from_millis(config.generation.timeout_ms),
    );

    AppState::with_components(config, aggregator, synthesizer)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn set_cookie(&self) -> Option<&str> {
        self.header(header::SET_COOKIE.as_str())
    }
}

/// Drives the full application router without a socket
#[derive(Clone)]
pub struct TestClient {
    app: Router,
}

impl TestClient {
    pub fn new(state: AppState) -> Self {
        Self {
            app: create_app(state),
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        let mut request = Request::get(uri).header("x-forwarded-for", DEFAULT_IP);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(request.body(Body::empty()).unwrap()).await
    }

    pub async fn post(&self, uri: &str, body: Value, token: Option<&str>) -> TestResponse {
        self.post_from(uri, body, token, DEFAULT_IP).await
    }

    pub async fn post_from(
        &self,
        uri: &str,
        body: Value,
        token: Option<&str>,
        ip: &str,
    ) -> TestResponse {
        let mut request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", ip);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(request.body(Body::from(body.to_string())).unwrap())
            .await
    }

    /// Register a free account and return its session token
    pub async fn register(&self, email: &str) -> String {
        let response = self
            .post(
                "/api/auth/register",
                serde_json::json!({ "email": email, "password": "password123" }),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        response.body["token"]
            .as_str()
            .expect("token in register response")
            .to_string()
    }
}
