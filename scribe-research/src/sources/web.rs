//! Google Custom Search provider
//!
//! Fills the `web` source and doubles as the site-restricted fallback for `video`.

use super::{non_empty, strip_html, SourceAdapter};
use crate::http::send_json;
use async_trait::async_trait;
use scribe_core::{ScribeResult, SearchResult, SourceId};
use serde::Deserialize;
use std::collections::HashMap;

const GOOGLE_CSE_URL: &str = "https://www.googleapis.com/customsearch/v1";
/// The Custom Search API rejects `num` above this
const MAX_PAGE_SIZE: usize = 10;
/// Hosts accepted when Google search stands in for a video provider
const VIDEO_HOSTS: &[&str] = &["youtube.com", "youtu.be", "vimeo.com"];

const DATE_META_KEYS: &[&str] = &[
    "article:published_time",
    "og:updated_time",
    "article:modified_time",
    "date",
];
const AUTHOR_META_KEYS: &[&str] = &["author", "article:author", "og:site_name"];

#[derive(Debug, Deserialize)]
struct GoogleSearchResponse {
    #[serde(default)]
    items: Vec<GoogleItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleItem {
    #[serde(default)]
    title: String,
    link: Option<String>,
    snippet: Option<String>,
    pagemap: Option<PageMap>,
}

#[derive(Debug, Default, Deserialize)]
struct PageMap {
    #[serde(default)]
    cse_thumbnail: Vec<Thumbnail>,
    #[serde(default)]
    cse_image: Vec<Thumbnail>,
    #[serde(default)]
    metatags: Vec<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    src: Option<String>,
}

impl PageMap {
    fn thumbnail(&self) -> Option<String> {
        self.cse_thumbnail
            .iter()
            .chain(self.cse_image.iter())
            .find_map(|t| t.src.clone())
    }

    fn meta(&self, keys: &[&str]) -> Option<String> {
        self.metatags.iter().find_map(|tags| {
            keys.iter().find_map(|key| {
                tags.get(*key)
                    .and_then(|v| v.as_str())
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
            })
        })
    }
}

/// Thin Custom Search client shared by the adapters that use it
#[derive(Debug, Clone)]
pub struct GoogleSearchClient {
    client: reqwest::Client,
    api_key: Option<String>,
    engine_id: Option<String>,
    base_url: String,
}

impl GoogleSearchClient {
    pub fn new(client: reqwest::Client, api_key: Option<String>, engine_id: Option<String>) -> Self {
        Self {
            client,
            api_key: non_empty(api_key),
            engine_id: non_empty(engine_id),
            base_url: GOOGLE_CSE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Both the API key and the search engine id are required
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some() && self.engine_id.is_some()
    }

    async fn query(&self, query: &str, max_results: usize) -> ScribeResult<GoogleSearchResponse> {
        let num = max_results.clamp(1, MAX_PAGE_SIZE).to_string();
        let request = self.client.get(&self.base_url).query(&[
            ("key", self.api_key.as_deref().unwrap_or_default()),
            ("cx", self.engine_id.as_deref().unwrap_or_default()),
            ("q", query),
            ("num", num.as_str()),
        ]);

        send_json("google_cse", request).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SearchScope {
    Web,
    Video,
}

/// Google-backed adapter for general web pages or video pages
#[derive(Debug, Clone)]
pub struct GoogleSearchAdapter {
    client: GoogleSearchClient,
    scope: SearchScope,
}

impl GoogleSearchAdapter {
    /// General web search
    pub fn web(client: GoogleSearchClient) -> Self {
        Self {
            client,
            scope: SearchScope::Web,
        }
    }

    /// Site-restricted search that only keeps links to known video hosts
    pub fn video_fallback(client: GoogleSearchClient) -> Self {
        Self {
            client,
            scope: SearchScope::Video,
        }
    }
}

#[async_trait]
impl SourceAdapter for GoogleSearchAdapter {
    fn source(&self) -> SourceId {
        match self.scope {
            SearchScope::Web => SourceId::Web,
            SearchScope::Video => SourceId::Video,
        }
    }

    fn provider(&self) -> &'static str {
        "google_cse"
    }

    fn is_configured(&self) -> bool {
        self.client.is_configured()
    }

    async fn fetch(&self, topic: &str, max_results: usize) -> ScribeResult<Vec<SearchResult>> {
        let query = match self.scope {
            SearchScope::Web => topic.to_string(),
            SearchScope::Video => format!("{} site:youtube.com", topic),
        };

        let response = self.client.query(&query, max_results).await?;
        let mut results = parse_items(response, self.source());
        if self.scope == SearchScope::Video {
            results.retain(|r| r.url.as_deref().is_some_and(is_video_url));
        }
        results.truncate(max_results);
        Ok(results)
    }
}

fn parse_items(response: GoogleSearchResponse, source: SourceId) -> Vec<SearchResult> {
    response
        .items
        .into_iter()
        .filter(|item| !item.title.trim().is_empty())
        .map(|item| {
            let pagemap = item.pagemap.unwrap_or_default();
            SearchResult::new(source, strip_html(&item.title))
                .with_description(item.snippet.map(|s| strip_html(&s)).and_then(|s| non_empty(Some(s))))
                .with_url(non_empty(item.link))
                .with_thumbnail(pagemap.thumbnail())
                .with_date(pagemap.meta(DATE_META_KEYS))
                .with_author(pagemap.meta(AUTHOR_META_KEYS))
        })
        .collect()
}

/// Whether a link points at one of the known video hosts
pub(crate) fn is_video_url(link: &str) -> bool {
    let Ok(parsed) = url::Url::parse(link) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();

    VIDEO_HOSTS
        .iter()
        .any(|allowed| host == *allowed || host.ends_with(&format!(".{}", allowed)))
}
