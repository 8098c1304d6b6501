//! OpenAI-compatible chat backends through siumai

use super::Generator;
use crate::error::GenerationError;
use crate::prompt::GenerationPrompt;
use async_trait::async_trait;
use scribe_core::{BackendKind, GenerationSettings, ProviderCredentials};
use siumai::prelude::*;
use std::time::Instant;
use tracing::{debug, info};

/// Chat completion backend for OpenAI, Groq, or DeepSeek
#[derive(Clone)]
pub struct SiumaiGenerator {
    kind: BackendKind,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    base_url: Option<String>,
}

impl SiumaiGenerator {
    pub fn new(kind: BackendKind, api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            kind,
            api_key: api_key
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            model: model.into(),
            temperature: 0.7,
            base_url: None,
        }
    }

    pub fn from_settings(
        kind: BackendKind,
        settings: &GenerationSettings,
        credentials: &ProviderCredentials,
    ) -> Self {
        let api_key = credentials.backend_key(kind).map(str::to_string);
        let generator = match kind {
            BackendKind::OpenAi => Self::new(kind, api_key, &settings.openai_model),
            BackendKind::Groq => Self::new(kind, api_key, &settings.groq_model),
            BackendKind::DeepSeek => Self::new(kind, api_key, &settings.deepseek_model)
                .with_base_url(&settings.deepseek_base_url),
        };
        generator.with_temperature(settings.temperature)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Build a client for one call; the token budget varies per request
    async fn build_client(
        &self,
        api_key: &str,
        token_budget: u32,
    ) -> Result<Box<dyn LlmClient>, GenerationError> {
        let client_error = |e: LlmError| GenerationError::Client {
            backend: self.name().to_string(),
            message: e.to_string(),
        };

        match self.kind {
            // DeepSeek speaks the OpenAI protocol behind its own base URL
            BackendKind::OpenAi | BackendKind::DeepSeek => {
                let mut builder = LlmBuilder::new()
                    .openai()
                    .api_key(api_key)
                    .model(&self.model)
                    .temperature(self.temperature)
                    .max_tokens(token_budget);

                if let Some(base_url) = &self.base_url {
                    builder = builder.base_url(base_url);
                }

                let client = builder.build().await.map_err(client_error)?;
                Ok(Box::new(client))
            }
            BackendKind::Groq => {
                let client = LlmBuilder::new()
                    .groq()
                    .api_key(api_key)
                    .model(&self.model)
                    .temperature(self.temperature)
                    .max_tokens(token_budget)
                    .build()
                    .await
                    .map_err(client_error)?;
                Ok(Box::new(client))
            }
        }
    }
}

#[async_trait]
impl Generator for SiumaiGenerator {
    fn name(&self) -> &str {
        self.kind.as_str()
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn attempt(
        &self,
        prompt: &GenerationPrompt,
        token_budget: u32,
    ) -> Result<String, GenerationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| GenerationError::NotConfigured {
                backend: self.name().to_string(),
            })?;

        let start_time = Instant::now();
        let client = self.build_client(api_key, token_budget).await?;

        debug!(
            backend = self.name(),
            model = %self.model,
            token_budget,
            "Sending generation request"
        );

        let messages = vec![system!(prompt.system.as_str()), user!(prompt.user.as_str())];
        let response = client
            .chat(messages)
            .await
            .map_err(|e| GenerationError::Request {
                backend: self.name().to_string(),
                message: e.to_string(),
            })?;

        let content = response
            .content_text()
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| GenerationError::EmptyResponse {
                backend: self.name().to_string(),
            })?;

        info!(
            backend = self.name(),
            chars = content.len(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "Generated content"
        );

        Ok(content)
    }
}

impl std::fmt::Debug for SiumaiGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiumaiGenerator")
            .field("backend", &self.kind.as_str())
            .field("model", &self.model)
            .field("configured", &self.api_key.is_some())
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deepseek_uses_compatible_base_url() {
        let settings = GenerationSettings::default();
        let credentials = ProviderCredentials {
            deepseek_api_key: Some("ds-key".into()),
            ..Default::default()
        };

        let generator = SiumaiGenerator::from_settings(BackendKind::DeepSeek, &settings, &credentials);
        assert_eq!(generator.name(), "deepseek");
        assert_eq!(generator.model(), settings.deepseek_model);
        assert_eq!(generator.base_url.as_deref(), Some(settings.deepseek_base_url.as_str()));
        assert!(generator.is_configured());
    }

    #[test]
    fn test_blank_key_is_unconfigured() {
        let generator = SiumaiGenerator::new(BackendKind::Groq, Some("   ".into()), "llama");
        assert!(!generator.is_configured());
    }

    #[tokio::test]
    async fn test_unconfigured_attempt_fails_without_network() {
        let generator = SiumaiGenerator::new(BackendKind::OpenAi, None, "gpt-4o-mini");
        let prompt = GenerationPrompt {
            system: "system".into(),
            user: "user".into(),
        };

        let result = generator.attempt(&prompt, 500).await;
        assert!(matches!(result, Err(GenerationError::NotConfigured { .. })));
    }
}
