//! Rate limiting, client identification and response hardening

use crate::error::ApiError;
use axum::{
    extract::{ConnectInfo, Request},
    http::{
        header::{REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS},
        request::Parts,
        HeaderValue,
    },
    middleware::Next,
    response::Response,
};
use scribe_core::{RateLimitPolicy, RateLimitSettings};
use std::{
    collections::HashMap,
    net::{IpAddr, SocketAddr},
    sync::{Mutex, MutexGuard},
    time::{Duration, Instant},
};
use tracing::{debug, warn};

/// Outcome of a rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    Rejected { retry_after: Duration },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed { .. })
    }
}

#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    count: u32,
    reset_at: Instant,
    last_seen: Instant,
}

/// Fixed-window counter per key.
///
/// Each key's read-modify-write happens under a single lock acquisition. The number
/// of tracked keys is bounded: at capacity, expired windows are purged and then the
/// least recently seen key is dropped, which resets that key's count.
#[derive(Debug)]
pub struct RateLimiter {
    entries: Mutex<HashMap<String, WindowEntry>>,
    max_keys: usize,
}

impl RateLimiter {
    pub fn new(max_keys: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_keys: max_keys.max(1),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, WindowEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn admit(&self, key: &str, limit: u32, window: Duration) -> RateDecision {
        self.admit_at(key, limit, window, Instant::now())
    }

    /// [`admit`](Self::admit) against an explicit clock reading
    pub fn admit_at(&self, key: &str, limit: u32, window: Duration, now: Instant) -> RateDecision {
        let mut entries = self.entries();

        if let Some(entry) = entries.get_mut(key) {
            if now <= entry.reset_at {
                entry.count = entry.count.saturating_add(1);
                entry.last_seen = now;
                if entry.count > limit {
                    return RateDecision::Rejected {
                        retry_after: entry.reset_at.saturating_duration_since(now),
                    };
                }
                return RateDecision::Allowed {
                    remaining: limit - entry.count,
                };
            }
        } else if entries.len() >= self.max_keys {
            Self::make_room(&mut entries, self.max_keys, now);
        }

        entries.insert(
            key.to_string(),
            WindowEntry {
                count: 1,
                reset_at: now + window,
                last_seen: now,
            },
        );
        RateDecision::Allowed {
            remaining: limit.saturating_sub(1),
        }
    }

    fn make_room(entries: &mut HashMap<String, WindowEntry>, max_keys: usize, now: Instant) {
        entries.retain(|_, entry| now <= entry.reset_at);
        if entries.len() < max_keys {
            return;
        }

        let oldest = entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_seen)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            debug!(key = %key, "Rate limiter at capacity; evicting least recently seen key");
            entries.remove(&key);
        }
    }

    pub fn reset(&self, key: &str) {
        self.entries().remove(key);
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every window that ended before `now`; returns how many were removed
    pub fn purge_expired(&self, now: Instant) -> usize {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|_, entry| now <= entry.reset_at);
        before - entries.len()
    }
}

/// A named policy bound to its own limiter
#[derive(Debug)]
pub struct PolicyGate {
    name: &'static str,
    policy: RateLimitPolicy,
    limiter: RateLimiter,
}

impl PolicyGate {
    pub fn new(name: &'static str, policy: RateLimitPolicy, max_keys: usize) -> Self {
        Self {
            name,
            policy,
            limiter: RateLimiter::new(max_keys),
        }
    }

    pub fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Admit `key` or fail with a rate limit error carrying the retry delay
    pub fn check(&self, key: &str) -> Result<(), ApiError> {
        match self
            .limiter
            .admit(key, self.policy.limit, self.policy.window())
        {
            RateDecision::Allowed { remaining } => {
                debug!(policy = self.name, key = %key, remaining, "Request admitted");
                Ok(())
            }
            RateDecision::Rejected { retry_after } => {
                warn!(
                    policy = self.name,
                    key = %key,
                    retry_after_ms = retry_after.as_millis() as u64,
                    "Rate limit exceeded"
                );
                Err(ApiError::RateLimited { retry_after })
            }
        }
    }
}

/// One gate per named policy
#[derive(Debug)]
pub struct RateLimiters {
    pub login: PolicyGate,
    pub research: PolicyGate,
    pub generate: PolicyGate,
}

impl RateLimiters {
    pub fn from_settings(settings: &RateLimitSettings) -> Self {
        let max_keys = settings.max_tracked_keys;
        Self {
            login: PolicyGate::new("login", settings.login, max_keys),
            research: PolicyGate::new("research", settings.research, max_keys),
            generate: PolicyGate::new("generate", settings.generate, max_keys),
        }
    }

    /// Purge expired windows across all policies
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        [&self.login, &self.research, &self.generate]
            .iter()
            .map(|gate| gate.limiter.purge_expired(now))
            .sum()
    }
}

/// Client address used for rate limiting.
///
/// With `trust_proxy_headers` the first `X-Forwarded-For` entry wins, then
/// `X-Real-IP`. Otherwise only the socket peer counts, since any client can set
/// those headers.
pub fn client_ip(parts: &Parts, trust_proxy_headers: bool) -> String {
    if trust_proxy_headers {
        if let Some(ip) = forwarded_ip(parts) {
            return ip.to_string();
        }
    }

    parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn forwarded_ip(parts: &Parts) -> Option<IpAddr> {
    let forwarded = parts
        .headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|first| first.trim().parse::<IpAddr>().ok());

    forwarded.or_else(|| {
        parts
            .headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<IpAddr>().ok())
    })
}

/// Add standard hardening headers to every response
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    response
}
