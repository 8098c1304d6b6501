//! Research aggregation handlers

use super::types::{
    ResearchCapabilities, ResearchMetadata, ResearchProbeConfig, ResearchRequest,
    ResearchResponse,
};
use crate::{auth::Caller, error::ApiError, error::ApiJson, AppState};
use axum::{extract::State, response::Json};
use scribe_core::{performance::measure_async, ResearchQuery, SourceId};
use tracing::info;

/// Aggregate research for a topic across the requested sources
#[utoipa::path(
    post,
    path = "/api/research",
    tag = "Research",
    summary = "Aggregate research",
    description = "Query every requested source concurrently. Sources that fail or time out contribute an empty list.",
    request_body = ResearchRequest,
    responses(
        (status = 200, description = "Research bundle", body = ResearchResponse),
        (status = 400, description = "Invalid topic or source"),
        (status = 401, description = "Authentication required"),
        (status = 429, description = "Rate limit exceeded")
    )
)]
pub async fn research(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(request): ApiJson<ResearchRequest>,
) -> Result<Json<ResearchResponse>, ApiError> {
    caller.ensure_allowed()?;
    state.limiters.research.check(&caller.rate_key())?;

    let sources = request
        .sources
        .unwrap_or_default()
        .iter()
        .map(|s| s.parse::<SourceId>())
        .collect::<Result<Vec<_>, _>>()?;
    let query = ResearchQuery::new(&request.topic, &sources)?;

    info!(
        topic = %query.topic(),
        sources = ?query.sources(),
        caller = %caller.rate_key(),
        "Research requested"
    );

    let outcome = measure_async("research", state.aggregator.aggregate(&query)).await;
    let bundle = outcome.bundle;

    let metadata = ResearchMetadata {
        total_results: bundle.total_results(),
        search_time_ms: outcome.elapsed.as_millis() as u64,
        sources_used: bundle.sources(),
        sources_with_results: bundle.sources_with_results(),
        topic: query.topic().to_string(),
    };

    Ok(Json(ResearchResponse {
        data: bundle,
        metadata,
    }))
}

/// Report which research sources are configured
#[utoipa::path(
    get,
    path = "/api/research",
    tag = "Research",
    summary = "Research capabilities",
    responses(
        (status = 200, description = "Configured sources and limits", body = ResearchCapabilities)
    )
)]
pub async fn research_capabilities(State(state): State<AppState>) -> Json<ResearchCapabilities> {
    Json(ResearchCapabilities {
        available_sources: state.aggregator.available_sources(),
        config: ResearchProbeConfig {
            timeout_ms: state.aggregator.source_timeout().as_millis() as u64,
            max_results_per_source: state.aggregator.max_results(),
        },
    })
}
