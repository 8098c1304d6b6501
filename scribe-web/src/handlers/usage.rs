//! Plan usage handler

use crate::{
    auth::{AuthUser, UsageReport},
    AppState,
};
use axum::{extract::State, response::Json};

/// Usage in the current period against the caller's plan limits
#[utoipa::path(
    get,
    path = "/api/usage",
    tag = "Account",
    summary = "Current usage",
    responses(
        (status = 200, description = "Usage for the current period", body = UsageReport),
        (status = 401, description = "Authentication required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn usage(State(state): State<AppState>, user: AuthUser) -> Json<UsageReport> {
    Json(state.usage.report(&user.id, user.plan, chrono::Utc::now()))
}
