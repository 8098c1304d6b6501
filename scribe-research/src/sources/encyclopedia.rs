//! Wikipedia provider for the `encyclopedia` source

use super::{non_empty, strip_html, SourceAdapter};
use crate::http::send_json;
use async_trait::async_trait;
use scribe_core::{ScribeResult, SearchResult, SourceId};
use serde::Deserialize;

const WIKIPEDIA_API_URL: &str = "https://en.wikipedia.org/w/api.php";
const WIKIPEDIA_ARTICLE_URL: &str = "https://en.wikipedia.org/wiki/";
const MAX_PAGE_SIZE: usize = 50;

#[derive(Debug, Deserialize)]
struct WikiSearchResponse {
    query: Option<WikiQuery>,
}

#[derive(Debug, Deserialize)]
struct WikiQuery {
    #[serde(default)]
    search: Vec<WikiPage>,
}

#[derive(Debug, Deserialize)]
struct WikiPage {
    title: String,
    snippet: Option<String>,
    timestamp: Option<String>,
}

/// Full-text article search through the MediaWiki API. Needs no credentials.
#[derive(Debug, Clone)]
pub struct WikipediaAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl WikipediaAdapter {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: WIKIPEDIA_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl SourceAdapter for WikipediaAdapter {
    fn source(&self) -> SourceId {
        SourceId::Encyclopedia
    }

    fn provider(&self) -> &'static str {
        "wikipedia"
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn fetch(&self, topic: &str, max_results: usize) -> ScribeResult<Vec<SearchResult>> {
        let limit = max_results.clamp(1, MAX_PAGE_SIZE).to_string();
        let request = self.client.get(&self.base_url).query(&[
            ("action", "query"),
            ("list", "search"),
            ("srsearch", topic),
            ("srlimit", limit.as_str()),
            ("format", "json"),
            ("utf8", "1"),
        ]);

        let response: WikiSearchResponse = send_json(self.provider(), request).await?;
        Ok(parse_pages(response))
    }
}

fn parse_pages(response: WikiSearchResponse) -> Vec<SearchResult> {
    let Some(query) = response.query else {
        return Vec::new();
    };

    query
        .search
        .into_iter()
        .filter(|page| !page.title.trim().is_empty())
        .map(|page| {
            let url = article_url(&page.title);
            SearchResult::new(SourceId::Encyclopedia, page.title.trim())
                .with_description(non_empty(page.snippet.map(|s| strip_html(&s))))
                .with_url(Some(url))
                .with_date(non_empty(page.timestamp))
                .with_author(Some("Wikipedia".to_string()))
        })
        .collect()
}

/// Canonical article link for a page title
fn article_url(title: &str) -> String {
    format!(
        "{}{}",
        WIKIPEDIA_ARTICLE_URL,
        urlencoding::encode(&title.trim().replace(' ', "_"))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pages() {
        let payload = r#"{
            "batchcomplete": "",
            "query": {
                "searchinfo": {"totalhits": 2},
                "search": [
                    {
                        "ns": 0,
                        "title": "Electric car",
                        "pageid": 1,
                        "snippet": "An <span class=\"searchmatch\">electric</span> car is a vehicle &quot;powered&quot; by motors",
                        "timestamp": "2024-05-01T12:00:00Z"
                    },
                    {
                        "ns": 0,
                        "title": "History of the electric vehicle",
                        "pageid": 2,
                        "snippet": ""
                    }
                ]
            }
        }"#;

        let response: WikiSearchResponse = serde_json::from_str(payload).unwrap();
        let pages = parse_pages(response);

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].title, "Electric car");
        assert_eq!(
            pages[0].description.as_deref(),
            Some("An electric car is a vehicle \"powered\" by motors")
        );
        assert_eq!(
            pages[0].url.as_deref(),
            Some("https://en.wikipedia.org/wiki/Electric_car")
        );
        assert_eq!(pages[0].date.as_deref(), Some("2024-05-01T12:00:00Z"));
        assert!(pages[1].description.is_none());
        assert_eq!(
            pages[1].url.as_deref(),
            Some("https://en.wikipedia.org/wiki/History_of_the_electric_vehicle")
        );
    }

    #[test]
    fn test_missing_query_block() {
        let response: WikiSearchResponse =
            serde_json::from_str(r#"{"batchcomplete": ""}"#).unwrap();
        assert!(parse_pages(response).is_empty());
    }
}
