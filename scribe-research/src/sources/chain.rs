//! Primary/secondary provider chaining for a single source

use super::SourceAdapter;
use async_trait::async_trait;
use scribe_core::{ScribeResult, SearchResult, SourceId};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Queries a primary provider and tops the result list up from a secondary one.
///
/// The secondary runs when the primary is unconfigured, fails, or returns fewer
/// than `max_results` items. Results from the secondary that duplicate a URL (or,
/// lacking one, a title) already collected are dropped.
pub struct ChainedAdapter {
    primary: Arc<dyn SourceAdapter>,
    secondary: Arc<dyn SourceAdapter>,
}

impl ChainedAdapter {
    pub fn new(primary: Arc<dyn SourceAdapter>, secondary: Arc<dyn SourceAdapter>) -> Self {
        Self { primary, secondary }
    }
}

fn dedup_key(result: &SearchResult) -> String {
    match &result.url {
        Some(url) => url.trim_end_matches('/').to_ascii_lowercase(),
        None => format!("title:{}", result.title.to_lowercase()),
    }
}

#[async_trait]
impl SourceAdapter for ChainedAdapter {
    fn source(&self) -> SourceId {
        self.primary.source()
    }

    fn provider(&self) -> &'static str {
        self.primary.provider()
    }

    fn is_configured(&self) -> bool {
        self.primary.is_configured() || self.secondary.is_configured()
    }

    async fn fetch(&self, topic: &str, max_results: usize) -> ScribeResult<Vec<SearchResult>> {
        let mut results = Vec::new();
        let mut primary_error = None;

        if self.primary.is_configured() {
            match self.primary.fetch(topic, max_results).await {
                Ok(found) => results = found,
                Err(e) => {
                    warn!(
                        source = %self.source(),
                        provider = self.primary.provider(),
                        error = %e,
                        "Primary provider failed; trying secondary"
                    );
                    primary_error = Some(e);
                }
            }
        }
        results.truncate(max_results);

        if results.len() >= max_results || !self.secondary.is_configured() {
            return match primary_error {
                Some(e) if results.is_empty() => Err(e),
                _ => Ok(results),
            };
        }

        debug!(
            source = %self.source(),
            provider = self.secondary.provider(),
            have = results.len(),
            want = max_results,
            "Topping up from secondary provider"
        );

        match self.secondary.fetch(topic, max_results).await {
            Ok(extra) => {
                let mut seen: HashSet<String> = results.iter().map(dedup_key).collect();
                for result in extra {
                    if results.len() >= max_results {
                        break;
                    }
                    if seen.insert(dedup_key(&result)) {
                        results.push(result);
                    }
                }
                Ok(results)
            }
            Err(e) if results.is_empty() => Err(e),
            Err(e) => {
                warn!(
                    source = %self.source(),
                    provider = self.secondary.provider(),
                    error = %e,
                    "Secondary provider failed; keeping primary results"
                );
                Ok(results)
            }
        }
    }
}
