//! Source adapters
//!
//! Each adapter queries one external provider and normalizes its payload into
//! [`SearchResult`]s. Adapters never surface provider failures to callers: the provided
//! [`SourceAdapter::search`] turns errors and missing credentials into an empty list.

pub mod academic;
pub mod chain;
pub mod encyclopedia;
pub mod news;
pub mod video;
pub mod web;

pub use academic::SemanticScholarAdapter;
pub use chain::ChainedAdapter;
pub use encyclopedia::WikipediaAdapter;
pub use news::NewsApiAdapter;
pub use video::YouTubeAdapter;
pub use web::{GoogleSearchAdapter, GoogleSearchClient};

use crate::http::create_http_client;
use async_trait::async_trait;
use regex::Regex;
use scribe_core::{ProviderCredentials, ResearchSettings, ScribeResult, SearchResult, SourceId};
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

/// A search provider normalized to Scribe's result shape
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// The source category this adapter fills
    fn source(&self) -> SourceId;

    /// Provider name used in logs
    fn provider(&self) -> &'static str;

    /// Whether the credentials needed to call the provider are present
    fn is_configured(&self) -> bool;

    /// Query the provider. Errors describe transport, status, or payload problems.
    async fn fetch(&self, topic: &str, max_results: usize) -> ScribeResult<Vec<SearchResult>>;

    /// Infallible search: empty when unconfigured or on any provider failure,
    /// never more than `max_results` items.
    async fn search(&self, topic: &str, max_results: usize) -> Vec<SearchResult> {
        if !self.is_configured() {
            debug!(
                source = %self.source(),
                provider = self.provider(),
                "Source not configured; skipping"
            );
            return Vec::new();
        }

        match self.fetch(topic, max_results).await {
            Ok(mut results) => {
                results.truncate(max_results);
                debug!(
                    source = %self.source(),
                    provider = self.provider(),
                    count = results.len(),
                    "Source search completed"
                );
                results
            }
            Err(e) => {
                warn!(
                    source = %self.source(),
                    provider = self.provider(),
                    error = %e,
                    recoverable = e.is_recoverable(),
                    retry_hint_ms = ?e.retry_delay_ms(),
                    "Source search failed; returning no results"
                );
                Vec::new()
            }
        }
    }
}

/// Build the default adapter for every source from settings and credentials
pub fn build_adapters(
    settings: &ResearchSettings,
    credentials: &ProviderCredentials,
) -> ScribeResult<Vec<Arc<dyn SourceAdapter>>> {
    let client = create_http_client(settings)?;

    let google = GoogleSearchClient::new(
        client.clone(),
        credentials.google_search_api_key.clone(),
        credentials.google_search_engine_id.clone(),
    );

    let video: Arc<dyn SourceAdapter> = Arc::new(ChainedAdapter::new(
        Arc::new(YouTubeAdapter::new(
            client.clone(),
            credentials.youtube_api_key.clone(),
        )),
        Arc::new(GoogleSearchAdapter::video_fallback(google.clone())),
    ));

    Ok(vec![
        Arc::new(GoogleSearchAdapter::web(google)),
        video,
        Arc::new(NewsApiAdapter::new(
            client.clone(),
            credentials.news_api_key.clone(),
        )),
        Arc::new(SemanticScholarAdapter::new(
            client.clone(),
            credentials.semantic_scholar_api_key.clone(),
        )),
        Arc::new(WikipediaAdapter::new(client)),
    ])
}

/// Strip markup from provider snippets and decode the common HTML entities
pub(crate) fn strip_html(input: &str) -> String {
    static TAG: OnceLock<Regex> = OnceLock::new();
    let tag = TAG.get_or_init(|| Regex::new(r"<[^>]*>").unwrap());

    let without_tags = tag.replace_all(input, "");
    let decoded = without_tags
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#039;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&");

    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Treat blank provider strings as missing
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_html() {
        assert_eq!(
            strip_html(r#"<span class="searchmatch">Electric</span> cars &amp; trucks"#),
            "Electric cars & trucks"
        );
        assert_eq!(strip_html("&quot;quoted&quot;  text"), "\"quoted\" text");
        assert_eq!(strip_html("plain"), "plain");
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("  ".to_string())), None);
        assert_eq!(non_empty(None), None);
        assert_eq!(non_empty(Some(" x ".to_string())), Some("x".to_string()));
    }

    #[test]
    fn test_build_adapters_covers_every_source() {
        let adapters =
            build_adapters(&ResearchSettings::default(), &ProviderCredentials::default()).unwrap();
        let mut sources: Vec<SourceId> = adapters.iter().map(|a| a.source()).collect();
        sources.sort();
        assert_eq!(sources, SourceId::ALL.to_vec());

        // Without keys only the keyless providers are usable
        let configured: Vec<SourceId> = adapters
            .iter()
            .filter(|a| a.is_configured())
            .map(|a| a.source())
            .collect();
        assert!(configured.contains(&SourceId::Academic));
        assert!(configured.contains(&SourceId::Encyclopedia));
        assert!(!configured.contains(&SourceId::Web));
        assert!(!configured.contains(&SourceId::Video));
        assert!(!configured.contains(&SourceId::News));
    }
}
