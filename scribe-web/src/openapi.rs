//! OpenAPI document for the Scribe API

use axum::response::Json;
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

use crate::auth::{Plan, QuotaUsage, UsageReport, UserProfile};
use crate::handlers::{
    AuthResponse, GenerateRequest, GenerateResponse, GenerationCapabilities, GenerationMetadata,
    GenerationProbeConfig, HealthResponse, LengthOption, LoginRequest, MeResponse,
    MessageResponse, RegisterRequest, ResearchCapabilities, ResearchMetadata, ResearchProbeConfig,
    ResearchRequest, ResearchResponse,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Scribe API",
        version = "0.1.0",
        description = "Multi-source research aggregation and AI content generation",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    paths(
        crate::handlers::health_check,

        crate::handlers::research,
        crate::handlers::research_capabilities,

        crate::handlers::generate,
        crate::handlers::generation_capabilities,

        crate::handlers::usage,
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::logout,
        crate::auth::handlers::me,
    ),
    components(
        schemas(
            HealthResponse,
            ResearchRequest,
            ResearchResponse,
            ResearchMetadata,
            ResearchCapabilities,
            ResearchProbeConfig,
            GenerateRequest,
            GenerateResponse,
            GenerationMetadata,
            GenerationCapabilities,
            GenerationProbeConfig,
            LengthOption,
            RegisterRequest,
            LoginRequest,
            AuthResponse,
            MeResponse,
            MessageResponse,
            UserProfile,
            UsageReport,
            QuotaUsage,
            Plan,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Research", description = "Multi-source research aggregation"),
        (name = "Generation", description = "Content generation with backend fallback"),
        (name = "Account", description = "Registration, sessions and plan usage")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

/// Serve the OpenAPI document
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
