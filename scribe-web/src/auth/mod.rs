//! Authentication, accounts and usage quotas

pub mod handlers;
pub mod jwt;
pub mod quota;
pub mod users;

pub use jwt::{Claims, JwtService};
pub use quota::{Plan, QuotaKind, QuotaUsage, UsageLedger, UsageReport};
pub use users::{InMemoryUserStore, Registration, UserProfile, UserRecord, UserStore};

use crate::error::ApiError;
use crate::security::client_ip;
use crate::AppState;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;
use scribe_core::AuthMode;
use tracing::debug;

/// Identity carried by a verified session token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub plan: Plan,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            name: claims.name,
            plan: claims.plan,
        }
    }
}

/// Session token from `Authorization: Bearer` or, failing that, the session cookie
pub fn session_token(parts: &Parts, cookie_name: &str) -> Option<String> {
    let bearer = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    CookieJar::from_headers(&parts.headers)
        .get(cookie_name)
        .map(|cookie| cookie.value().to_string())
        .filter(|t| !t.is_empty())
}

/// Requires a valid session
impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let token = session_token(parts, &app_state.config.auth.cookie_name)
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

        app_state.jwt.verify(&token).map(AuthUser::from)
    }
}

/// Who is calling: an optional verified user plus the client address.
///
/// A bad token is not rejected here; in open mode the caller is treated as
/// anonymous, in required mode [`Caller::ensure_allowed`] reports it.
#[derive(Debug, Clone)]
pub struct Caller {
    pub user: Option<AuthUser>,
    pub ip: String,
    mode: AuthMode,
    token_problem: Option<String>,
}

impl Caller {
    /// Rate limiting key: user id when signed in, client address otherwise
    pub fn rate_key(&self) -> String {
        match &self.user {
            Some(user) => format!("user:{}", user.id),
            None => format!("ip:{}", self.ip),
        }
    }

    /// Reject anonymous callers when authentication is required
    pub fn ensure_allowed(&self) -> Result<(), ApiError> {
        if self.mode == AuthMode::Required && self.user.is_none() {
            let message = self
                .token_problem
                .clone()
                .unwrap_or_else(|| "Authentication required".to_string());
            return Err(ApiError::Unauthorized(message));
        }
        Ok(())
    }
}

impl<S> FromRequestParts<S> for Caller
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let ip = client_ip(parts, app_state.config.server.trust_proxy_headers);

        let mut token_problem = None;
        let user = match session_token(parts, &app_state.config.auth.cookie_name) {
            Some(token) => match app_state.jwt.verify(&token) {
                Ok(claims) => Some(AuthUser::from(claims)),
                Err(e) => {
                    debug!(ip = %ip, error = %e, "Ignoring invalid session token");
                    token_problem = Some(e.to_string());
                    None
                }
            },
            None => None,
        };

        Ok(Caller {
            user,
            ip,
            mode: app_state.config.auth.mode,
            token_problem,
        })
    }
}
