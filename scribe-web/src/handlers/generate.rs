//! Content generation handlers

use super::types::{
    GenerateRequest, GenerateResponse, GenerationCapabilities, GenerationMetadata,
    GenerationProbeConfig, LengthOption,
};
use crate::{
    auth::{Caller, QuotaKind},
    error::{ApiError, ApiJson},
    AppState,
};
use axum::{extract::State, response::Json};
use scribe_core::{
    performance::measure_async, ContentLength, ContentType, GenerationRequest, ScribeResult, Tone,
};
use tracing::info;

/// Turn the loosely typed body into a validated generation request
fn build_request(body: GenerateRequest) -> ScribeResult<GenerationRequest> {
    let mut request = GenerationRequest::new(&body.topic, body.research_data.unwrap_or_default())?;

    if let Some(tone) = body.tone.as_deref() {
        request = request.with_tone(tone.parse::<Tone>()?);
    }
    if let Some(content_type) = body.content_type.as_deref() {
        request = request.with_content_type(content_type.parse::<ContentType>()?);
    }
    if let Some(length) = body.length.as_deref() {
        request = request.with_length(length.parse::<ContentLength>()?);
    }
    if let Some(language) = body.language.as_deref() {
        request = request.with_language(language)?;
    }
    if let Some(audience) = body.target_audience.as_deref() {
        request = request.with_audience(audience);
    }

    Ok(request)
}

/// Generate content from research
#[utoipa::path(
    post,
    path = "/api/generate",
    tag = "Generation",
    summary = "Generate content",
    description = "Try each configured backend in order. When every backend fails a deterministic draft template is returned instead.",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Generated content", body = GenerateResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Plan quota exhausted"),
        (status = 429, description = "Rate limit exceeded"),
        (status = 500, description = "Unexpected error")
    )
)]
pub async fn generate(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(body): ApiJson<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    caller.ensure_allowed()?;
    state.limiters.generate.check(&caller.rate_key())?;

    let request = build_request(body)?;

    let usage = match &caller.user {
        Some(user) => Some(state.usage.check_and_record(
            &user.id,
            user.plan,
            QuotaKind::for_content(request.content_type),
            chrono::Utc::now(),
        )?),
        None => None,
    };

    info!(
        topic = %request.topic,
        content_type = %request.content_type,
        length = %request.length,
        sources = request.bundle.len(),
        caller = %caller.rate_key(),
        "Generation requested"
    );

    let generated = measure_async("generate", state.synthesizer.synthesize(&request)).await;

    Ok(Json(GenerateResponse {
        content: generated.content,
        metadata: GenerationMetadata {
            backend: generated.backend,
            fallback: generated.fallback,
            generation_time_ms: generated.elapsed.as_millis() as u64,
            token_budget: generated.token_budget,
            topic: request.topic,
            tone: request.tone.to_string(),
            content_type: request.content_type.to_string(),
            length: request.length.to_string(),
            language: request.language,
            usage,
        },
    }))
}

/// Report which generation backends are configured
#[utoipa::path(
    get,
    path = "/api/generate",
    tag = "Generation",
    summary = "Generation capabilities",
    responses(
        (status = 200, description = "Configured backends and options", body = GenerationCapabilities)
    )
)]
pub async fn generation_capabilities(State(state): State<AppState>) -> Json<GenerationCapabilities> {
    let lengths = ContentLength::ALL
        .into_iter()
        .map(|length| LengthOption {
            name: length.as_str().to_string(),
            token_budget: length.token_budget(),
            words: length.word_target().to_string(),
        })
        .collect();

    Json(GenerationCapabilities {
        available_apis: state.synthesizer.available_backends(),
        config: GenerationProbeConfig {
            timeout_ms: state.synthesizer.attempt_timeout().as_millis() as u64,
            backend_order: state.synthesizer.backend_order(),
            lengths,
        },
    })
}
