//! Concurrent research aggregation across source adapters

use crate::sources::{build_adapters, SourceAdapter};
use scribe_core::{
    with_timeout, ProviderCredentials, ResearchBundle, ResearchQuery, ResearchSettings,
    ScribeResult, SourceId,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};

/// Result of one aggregation run
#[derive(Debug, Clone)]
pub struct ResearchOutcome {
    pub bundle: ResearchBundle,
    pub elapsed: Duration,
}

/// Fans a research query out to every requested source concurrently.
///
/// Every requested source gets an entry in the bundle. A source that is unknown,
/// unconfigured, fails, panics, or exceeds the per-source timeout contributes an
/// empty list; none of these affect the other sources.
#[derive(Clone)]
pub struct ResearchAggregator {
    adapters: HashMap<SourceId, Arc<dyn SourceAdapter>>,
    source_timeout: Duration,
    max_results: usize,
}

impl ResearchAggregator {
    pub fn new(source_timeout: Duration, max_results: usize) -> Self {
        Self {
            adapters: HashMap::new(),
            source_timeout,
            max_results,
        }
    }

    /// Aggregator wired to the real providers
    pub fn from_config(
        settings: &ResearchSettings,
        credentials: &ProviderCredentials,
    ) -> ScribeResult<Self> {
        let mut aggregator = Self::new(
            Duration::from_millis(settings.timeout_ms),
            settings.max_results_per_source,
        );
        for adapter in build_adapters(settings, credentials)? {
            aggregator.register(adapter);
        }
        Ok(aggregator)
    }

    /// Register an adapter under its source, replacing any previous one
    pub fn register(&mut self, adapter: Arc<dyn SourceAdapter>) {
        self.adapters.insert(adapter.source(), adapter);
    }

    pub fn with_adapter(mut self, adapter: Arc<dyn SourceAdapter>) -> Self {
        self.register(adapter);
        self
    }

    /// Sources that have a configured adapter, in canonical order
    pub fn available_sources(&self) -> Vec<SourceId> {
        SourceId::ALL
            .into_iter()
            .filter(|source| {
                self.adapters
                    .get(source)
                    .is_some_and(|adapter| adapter.is_configured())
            })
            .collect()
    }

    pub fn source_timeout(&self) -> Duration {
        self.source_timeout
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    /// Run a query against all of its sources. Never fails.
    pub async fn aggregate(&self, query: &ResearchQuery) -> ResearchOutcome {
        let started = Instant::now();
        let mut bundle = ResearchBundle::for_sources(query.sources());
        let mut tasks = JoinSet::new();

        for &source in query.sources() {
            let Some(adapter) = self.adapters.get(&source).cloned() else {
                debug!(source = %source, "No adapter registered for source");
                continue;
            };

            let topic = query.topic().to_string();
            let max_results = self.max_results;
            let source_timeout = self.source_timeout;
            let operation = format!("research.{}", source);
            let span = info_span!("research_source", source = %source, provider = adapter.provider());

            tasks.spawn(
                async move {
                    let results =
                        match with_timeout(adapter.search(&topic, max_results), source_timeout, &operation)
                            .await
                        {
                            Ok(mut results) => {
                                results.truncate(max_results);
                                results
                            }
                            Err(e) => {
                                warn!(
                                    error = %e,
                                    recoverable = e.is_recoverable(),
                                    retry_hint_ms = ?e.retry_delay_ms(),
                                    "Source exceeded its time budget"
                                );
                                Vec::new()
                            }
                        };
                    (source, results)
                }
                .instrument(span),
            );
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((source, results)) => bundle.insert(source, results),
                Err(e) => warn!(error = %e, "Source task aborted; its entry stays empty"),
            }
        }

        let elapsed = started.elapsed();
        info!(
            topic = query.topic(),
            sources = query.sources().len(),
            results = bundle.total_results(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Research aggregation completed"
        );

        ResearchOutcome { bundle, elapsed }
    }
}

impl std::fmt::Debug for ResearchAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut registered: Vec<SourceId> = self.adapters.keys().copied().collect();
        registered.sort();
        f.debug_struct("ResearchAggregator")
            .field("sources", &registered)
            .field("source_timeout", &self.source_timeout)
            .field("max_results", &self.max_results)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_registers_every_source() {
        let aggregator =
            ResearchAggregator::from_config(&ResearchSettings::default(), &ProviderCredentials::default())
                .unwrap();

        assert_eq!(aggregator.source_timeout(), Duration::from_secs(10));
        assert_eq!(aggregator.max_results(), 5);
        assert_eq!(
            aggregator.available_sources(),
            vec![SourceId::Academic, SourceId::Encyclopedia]
        );
    }

    #[test]
    fn test_available_sources_with_keys() {
        let credentials = ProviderCredentials {
            news_api_key: Some("news".into()),
            youtube_api_key: Some("yt".into()),
            ..Default::default()
        };
        let aggregator =
            ResearchAggregator::from_config(&ResearchSettings::default(), &credentials).unwrap();

        assert_eq!(
            aggregator.available_sources(),
            vec![
                SourceId::Video,
                SourceId::News,
                SourceId::Academic,
                SourceId::Encyclopedia
            ]
        );
    }
}
