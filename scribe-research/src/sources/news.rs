//! NewsAPI provider for the `news` source

use super::{non_empty, strip_html, SourceAdapter};
use crate::http::send_json;
use async_trait::async_trait;
use scribe_core::{ErrorContext, ScribeError, ScribeResult, SearchResult, SourceId};
use serde::Deserialize;

const NEWS_API_URL: &str = "https://newsapi.org/v2/everything";
const MAX_PAGE_SIZE: usize = 100;
/// Title NewsAPI substitutes for articles pulled by the publisher
const REMOVED_MARKER: &str = "[Removed]";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsApiResponse {
    status: String,
    code: Option<String>,
    message: Option<String>,
    #[serde(default)]
    articles: Vec<NewsArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsArticle {
    source: Option<NewsSource>,
    author: Option<String>,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    url_to_image: Option<String>,
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewsSource {
    name: Option<String>,
}

/// Article search through NewsAPI's `everything` endpoint
#[derive(Debug, Clone)]
pub struct NewsApiAdapter {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl NewsApiAdapter {
    pub fn new(client: reqwest::Client, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key: non_empty(api_key),
            base_url: NEWS_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl SourceAdapter for NewsApiAdapter {
    fn source(&self) -> SourceId {
        SourceId::News
    }

    fn provider(&self) -> &'static str {
        "newsapi"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch(&self, topic: &str, max_results: usize) -> ScribeResult<Vec<SearchResult>> {
        let page_size = max_results.clamp(1, MAX_PAGE_SIZE).to_string();
        let request = self
            .client
            .get(&self.base_url)
            .header("X-Api-Key", self.api_key.as_deref().unwrap_or_default())
            .query(&[
                ("q", topic),
                ("pageSize", page_size.as_str()),
                ("sortBy", "relevancy"),
                ("language", "en"),
            ]);

        let response: NewsApiResponse = send_json(self.provider(), request).await?;
        parse_articles(response)
    }
}

fn parse_articles(response: NewsApiResponse) -> ScribeResult<Vec<SearchResult>> {
    if response.status != "ok" {
        return Err(ScribeError::Provider {
            provider: "newsapi".to_string(),
            message: format!(
                "{}: {}",
                response.code.as_deref().unwrap_or("error"),
                response.message.as_deref().unwrap_or("request rejected")
            ),
            status: None,
            source: None,
            context: ErrorContext::new("newsapi").with_operation("parse_articles"),
        });
    }

    Ok(response
        .articles
        .into_iter()
        .filter_map(|article| {
            let title = non_empty(article.title.map(|t| strip_html(&t)))?;
            if title == REMOVED_MARKER {
                return None;
            }

            let author = non_empty(article.author)
                .or_else(|| article.source.and_then(|s| non_empty(s.name)));

            Some(
                SearchResult::new(SourceId::News, title)
                    .with_description(non_empty(article.description.map(|d| strip_html(&d))))
                    .with_url(non_empty(article.url))
                    .with_thumbnail(non_empty(article.url_to_image))
                    .with_date(non_empty(article.published_at))
                    .with_author(author),
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_articles() {
        let payload = r#"{
            "status": "ok",
            "totalResults": 3,
            "articles": [
                {
                    "source": {"id": null, "name": "Example Times"},
                    "author": null,
                    "title": "EV sales climb again",
                    "description": "Quarterly figures show growth.",
                    "url": "https://news.example.com/ev-sales",
                    "urlToImage": "https://news.example.com/ev.jpg",
                    "publishedAt": "2024-05-10T08:30:00Z"
                },
                {
                    "source": {"id": null, "name": "[Removed]"},
                    "title": "[Removed]",
                    "url": "https://removed.com"
                },
                {
                    "source": {"id": "wired", "name": "Wired"},
                    "author": "Sam Writer",
                    "title": "Charging networks expand",
                    "description": null,
                    "url": "https://wired.example.com/charging",
                    "urlToImage": null,
                    "publishedAt": "2024-05-09T12:00:00Z"
                }
            ]
        }"#;

        let response: NewsApiResponse = serde_json::from_str(payload).unwrap();
        let articles = parse_articles(response).unwrap();

        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title, "EV sales climb again");
        assert_eq!(articles[0].author.as_deref(), Some("Example Times"));
        assert_eq!(
            articles[0].thumbnail.as_deref(),
            Some("https://news.example.com/ev.jpg")
        );
        assert_eq!(articles[1].author.as_deref(), Some("Sam Writer"));
        assert!(articles[1].description.is_none());
        assert!(articles.iter().all(|a| a.source == SourceId::News));
    }

    #[test]
    fn test_error_status_is_provider_error() {
        let payload = r#"{"status": "error", "code": "apiKeyInvalid", "message": "Your API key is invalid."}"#;
        let response: NewsApiResponse = serde_json::from_str(payload).unwrap();

        match parse_articles(response) {
            Err(ScribeError::Provider {
                provider, message, ..
            }) => {
                assert_eq!(provider, "newsapi");
                assert!(message.contains("apiKeyInvalid"));
            }
            other => panic!("Expected provider error, got {:?}", other),
        }
    }
}
