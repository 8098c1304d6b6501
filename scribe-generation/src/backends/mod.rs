//! Generation backends

pub mod llm;

pub use llm::SiumaiGenerator;

use crate::error::GenerationError;
use crate::prompt::GenerationPrompt;
use async_trait::async_trait;
use scribe_core::{GenerationSettings, ProviderCredentials};
use std::sync::Arc;

/// A text generation backend
#[async_trait]
pub trait Generator: Send + Sync {
    /// Backend name reported in responses and logs
    fn name(&self) -> &str;

    /// Whether credentials are present. Unconfigured backends are never attempted.
    fn is_configured(&self) -> bool;

    /// One generation call limited to `token_budget` completion tokens
    async fn attempt(
        &self,
        prompt: &GenerationPrompt,
        token_budget: u32,
    ) -> Result<String, GenerationError>;
}

/// Backends in configured priority order
pub fn build_generators(
    settings: &GenerationSettings,
    credentials: &ProviderCredentials,
) -> Vec<Arc<dyn Generator>> {
    settings
        .backend_order
        .iter()
        .map(|kind| {
            Arc::new(SiumaiGenerator::from_settings(*kind, settings, credentials))
                as Arc<dyn Generator>
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_core::BackendKind;

    #[test]
    fn test_build_generators_follows_configured_order() {
        let settings = GenerationSettings {
            backend_order: vec![BackendKind::DeepSeek, BackendKind::OpenAi],
            ..Default::default()
        };
        let credentials = ProviderCredentials {
            openai_api_key: Some("sk-test".into()),
            ..Default::default()
        };

        let generators = build_generators(&settings, &credentials);
        let names: Vec<&str> = generators.iter().map(|g| g.name()).collect();
        assert_eq!(names, vec!["deepseek", "openai"]);
        assert!(!generators[0].is_configured());
        assert!(generators[1].is_configured());
    }
}
