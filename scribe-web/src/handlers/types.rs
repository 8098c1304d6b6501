//! Request and response bodies for the HTTP API

use crate::auth::{UsageReport, UserProfile};
use scribe_core::{ResearchBundle, SourceId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "healthy")]
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    #[schema(example = "0.1.0")]
    pub version: String,
}

/// Research request
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResearchRequest {
    #[serde(default)]
    #[schema(example = "electric cars")]
    pub topic: String,
    /// Sources to query; omitted or empty selects all of them
    #[serde(default)]
    #[schema(example = json!(["web", "news"]))]
    pub sources: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResearchMetadata {
    pub total_results: usize,
    pub search_time_ms: u64,
    #[schema(value_type = Vec<String>)]
    pub sources_used: Vec<SourceId>,
    #[schema(value_type = Vec<String>)]
    pub sources_with_results: Vec<SourceId>,
    pub topic: String,
}

/// Research results keyed by source
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ResearchResponse {
    #[schema(value_type = Object)]
    pub data: ResearchBundle,
    pub metadata: ResearchMetadata,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResearchProbeConfig {
    pub timeout_ms: u64,
    pub max_results_per_source: usize,
}

/// Sources that are configured on this server
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResearchCapabilities {
    #[schema(value_type = Vec<String>)]
    pub available_sources: Vec<SourceId>,
    pub config: ResearchProbeConfig,
}

/// Content generation request
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    /// Output of a previous research call
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub research_data: Option<ResearchBundle>,
    #[serde(default)]
    #[schema(example = "electric cars")]
    pub topic: String,
    #[schema(example = "en")]
    pub language: Option<String>,
    #[schema(example = "professional")]
    pub tone: Option<String>,
    #[schema(example = "article")]
    pub content_type: Option<String>,
    #[schema(example = "medium")]
    pub length: Option<String>,
    #[schema(example = "fleet managers")]
    pub target_audience: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerationMetadata {
    /// Backend that produced the text; `null` for the draft template
    pub backend: Option<String>,
    pub fallback: bool,
    pub generation_time_ms: u64,
    pub token_budget: u32,
    pub topic: String,
    pub tone: String,
    pub content_type: String,
    pub length: String,
    pub language: String,
    /// Usage after this request; absent for anonymous callers
    pub usage: Option<UsageReport>,
}

/// Generated content
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GenerateResponse {
    pub content: String,
    pub metadata: GenerationMetadata,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LengthOption {
    #[schema(example = "medium")]
    pub name: String,
    #[schema(example = 1000)]
    pub token_budget: u32,
    #[schema(example = "800-1200 words")]
    pub words: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerationProbeConfig {
    pub timeout_ms: u64,
    pub backend_order: Vec<String>,
    pub lengths: Vec<LengthOption>,
}

/// Generation backends that are configured on this server
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GenerationCapabilities {
    #[serde(rename = "availableAPIs")]
    pub available_apis: Vec<String>,
    pub config: GenerationProbeConfig,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "writer@example.com")]
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "writer@example.com")]
    pub email: String,
    pub password: String,
}

/// Signed-in user plus session token
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserProfile,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MeResponse {
    pub user: UserProfile,
    pub usage: UsageReport,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}
