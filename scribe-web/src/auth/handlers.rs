//! Account handlers: registration, login, logout and the current session

use super::users::verify_dummy_password;
use super::{AuthUser, Caller, Plan, Registration, UserRecord};
use crate::error::{ApiError, ApiJson};
use crate::handlers::types::{
    AuthResponse, LoginRequest, MeResponse, MessageResponse, RegisterRequest,
};
use crate::AppState;
use axum::{extract::State, response::Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use scribe_core::AuthConfig;
use tracing::{info, warn};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

fn session_cookie(config: &AuthConfig, token: String) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(SameSite::Lax)
        .build()
}

/// Issue a token for `user` and attach it to the response as a cookie
fn start_session(
    state: &AppState,
    jar: CookieJar,
    user: &UserRecord,
) -> Result<(CookieJar, Json<AuthResponse>), ApiError> {
    let token = state.jwt.issue(user)?;
    let jar = jar.add(session_cookie(&state.config.auth, token.clone()));
    Ok((
        jar,
        Json(AuthResponse {
            user: user.profile(),
            token,
        }),
    ))
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Account",
    summary = "Register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created and signed in", body = AuthResponse),
        (status = 400, description = "Invalid email or password"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), ApiError> {
    // Self-service accounts always start on the free plan
    let registration = Registration::new(
        &request.email,
        &request.password,
        request.name.as_deref(),
        Plan::Free,
    )?;

    let user = state.users.create(registration).await?;
    info!(user_id = %user.id, plan = %user.plan, "Account created");

    start_session(&state, jar, &user)
}

/// Sign in with email and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Account",
    summary = "Sign in",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 429, description = "Too many attempts")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    caller: Caller,
    jar: CookieJar,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), ApiError> {
    state.limiters.login.check(&format!("ip:{}", caller.ip))?;

    let user = match state.users.find_by_email(&request.email).await? {
        Some(user) => user.verify_password(&request.password).then_some(user),
        None => {
            verify_dummy_password(&request.password);
            None
        }
    };
    let Some(user) = user else {
        warn!(ip = %caller.ip, "Failed login attempt");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    };

    info!(user_id = %user.id, "User signed in");
    start_session(&state, jar, &user)
}

/// Sign out by clearing the session cookie. Tokens are stateless, so a copy
/// held elsewhere stays valid until it expires.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Account",
    summary = "Sign out",
    responses(
        (status = 200, description = "Session cookie cleared", body = MessageResponse)
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    // Always send the expired cookie, whether or not this request carried one
    let mut removal = session_cookie(&state.config.auth, String::new());
    removal.make_removal();
    (
        jar.add(removal),
        Json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
    )
}

/// Current account and usage
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Account",
    summary = "Current user",
    responses(
        (status = 200, description = "Signed-in user with usage for this period", body = MeResponse),
        (status = 401, description = "Not signed in")
    ),
    security(("bearer_auth" = []))
)]
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<MeResponse>, ApiError> {
    let record = state
        .users
        .find_by_id(&user.id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Account no longer exists".to_string()))?;

    let usage = state
        .usage
        .report(&record.id, record.plan, chrono::Utc::now());

    Ok(Json(MeResponse {
        user: record.profile(),
        usage,
    }))
}
