//! Application state management

use crate::auth::{InMemoryUserStore, JwtService, UsageLedger, UserStore};
use crate::security::RateLimiters;
use crate::{WebError, WebResult};
use chrono::Utc;
use scribe_core::ScribeConfig;
use scribe_generation::ContentSynthesizer;
use scribe_research::ResearchAggregator;
use std::sync::Arc;
use tracing::info;

/// What one sweep removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub rate_limit_windows: usize,
    pub usage_periods: usize,
}

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ScribeConfig>,
    pub limiters: Arc<RateLimiters>,
    pub aggregator: Arc<ResearchAggregator>,
    pub synthesizer: Arc<ContentSynthesizer>,
    pub users: Arc<dyn UserStore>,
    pub usage: Arc<UsageLedger>,
    pub jwt: Arc<JwtService>,
}

impl AppState {
    /// Build state with the real research providers and generation backends
    pub fn new(config: ScribeConfig) -> WebResult<Self> {
        config.validate().map_err(WebError::from)?;

        let aggregator = ResearchAggregator::from_config(&config.research, &config.providers)?;
        let synthesizer = ContentSynthesizer::from_config(&config.generation, &config.providers);

        info!(
            sources = ?aggregator.available_sources(),
            backends = ?synthesizer.available_backends(),
            auth_mode = ?config.auth.mode,
            "Application state initialized"
        );

        Ok(Self::with_components(config, aggregator, synthesizer))
    }

    /// Build state around explicit pipeline components, skipping config validation
    pub fn with_components(
        config: ScribeConfig,
        aggregator: ResearchAggregator,
        synthesizer: ContentSynthesizer,
    ) -> Self {
        Self {
            limiters: Arc::new(RateLimiters::from_settings(&config.rate_limits)),
            jwt: Arc::new(JwtService::from_config(&config.auth)),
            aggregator: Arc::new(aggregator),
            synthesizer: Arc::new(synthesizer),
            users: Arc::new(InMemoryUserStore::new()),
            usage: Arc::new(UsageLedger::new()),
            config: Arc::new(config),
        }
    }

    /// Swap the user store
    pub fn with_user_store(mut self, users: Arc<dyn UserStore>) -> Self {
        self.users = users;
        self
    }

    /// Periodic housekeeping: drop expired rate limit windows and usage
    /// counters from past periods
    pub fn sweep(&self) -> SweepReport {
        SweepReport {
            rate_limit_windows: self.limiters.sweep(),
            usage_periods: self.usage.prune_past_periods(Utc::now()),
        }
    }
}
