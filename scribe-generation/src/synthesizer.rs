//! Ordered backend chain with a deterministic fallback

use crate::backends::{build_generators, Generator};
use crate::error::GenerationError;
use crate::fallback::render_fallback;
use crate::prompt::GenerationPrompt;
use scribe_core::{GenerationRequest, GenerationSettings, ProviderCredentials};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout, Instant};
use tracing::{debug, info, warn};

/// Output of one synthesis run
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedContent {
    pub content: String,
    /// Backend that produced the text; `None` for the fallback template
    pub backend: Option<String>,
    pub fallback: bool,
    pub token_budget: u32,
    pub elapsed: Duration,
}

/// Tries each configured backend in order and never fails
#[derive(Clone)]
pub struct ContentSynthesizer {
    generators: Vec<Arc<dyn Generator>>,
    attempt_timeout: Duration,
}

impl ContentSynthesizer {
    pub fn new(generators: Vec<Arc<dyn Generator>>, attempt_timeout: Duration) -> Self {
        Self {
            generators,
            attempt_timeout,
        }
    }

    pub fn from_config(settings: &GenerationSettings, credentials: &ProviderCredentials) -> Self {
        Self::new(
            build_generators(settings, credentials),
            Duration::from_millis(settings.timeout_ms),
        )
    }

    /// Backend names in priority order
    pub fn backend_order(&self) -> Vec<String> {
        self.generators.iter().map(|g| g.name().to_string()).collect()
    }

    /// Configured backend names in priority order
    pub fn available_backends(&self) -> Vec<String> {
        self.generators
            .iter()
            .filter(|g| g.is_configured())
            .map(|g| g.name().to_string())
            .collect()
    }

    pub fn attempt_timeout(&self) -> Duration {
        self.attempt_timeout
    }

    pub async fn synthesize(&self, request: &GenerationRequest) -> GeneratedContent {
        let started = Instant::now();
        let prompt = GenerationPrompt::build(request);
        let token_budget = request.length.token_budget();

        for generator in &self.generators {
            if !generator.is_configured() {
                debug!(backend = generator.name(), "Backend not configured; skipping");
                continue;
            }

            match self.attempt(generator.as_ref(), &prompt, token_budget).await {
                Ok(content) => {
                    let elapsed = started.elapsed();
                    info!(
                        backend = generator.name(),
                        topic = %request.topic,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Content generated"
                    );
                    return GeneratedContent {
                        content,
                        backend: Some(generator.name().to_string()),
                        fallback: false,
                        token_budget,
                        elapsed,
                    };
                }
                Err(e) => warn!(backend = e.backend(), error = %e, "Backend attempt failed"),
            }
        }

        warn!(topic = %request.topic, "No backend produced content; using fallback template");
        GeneratedContent {
            content: render_fallback(request),
            backend: None,
            fallback: true,
            token_budget,
            elapsed: started.elapsed(),
        }
    }

    async fn attempt(
        &self,
        generator: &dyn Generator,
        prompt: &GenerationPrompt,
        token_budget: u32,
    ) -> Result<String, GenerationError> {
        let text = timeout(self.attempt_timeout, generator.attempt(prompt, token_budget))
            .await
            .map_err(|_| GenerationError::Timeout {
                backend: generator.name().to_string(),
                timeout_ms: self.attempt_timeout.as_millis() as u64,
            })??;

        let text = text.trim();
        if text.is_empty() {
            return Err(GenerationError::EmptyResponse {
                backend: generator.name().to_string(),
            });
        }
        Ok(text.to_string())
    }
}

impl std::fmt::Debug for ContentSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentSynthesizer")
            .field("backends", &self.backend_order())
            .field("attempt_timeout", &self.attempt_timeout)
            .finish()
    }
}
