//! YouTube Data API provider for the `video` source

use super::{non_empty, strip_html, SourceAdapter};
use crate::http::send_json;
use async_trait::async_trait;
use scribe_core::{ScribeResult, SearchResult, SourceId};
use serde::Deserialize;

const YOUTUBE_SEARCH_URL: &str = "https://www.googleapis.com/youtube/v3/search";
const MAX_PAGE_SIZE: usize = 50;

#[derive(Debug, Deserialize)]
struct YouTubeSearchResponse {
    #[serde(default)]
    items: Vec<YouTubeItem>,
}

#[derive(Debug, Deserialize)]
struct YouTubeItem {
    id: YouTubeId,
    snippet: Option<YouTubeSnippet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YouTubeId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YouTubeSnippet {
    #[serde(default)]
    title: String,
    description: Option<String>,
    published_at: Option<String>,
    channel_title: Option<String>,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    high: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

impl Thumbnails {
    fn best(&self) -> Option<String> {
        self.medium
            .as_ref()
            .or(self.high.as_ref())
            .or(self.default.as_ref())
            .map(|t| t.url.clone())
    }
}

/// Video search through the YouTube Data API v3
#[derive(Debug, Clone)]
pub struct YouTubeAdapter {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl YouTubeAdapter {
    pub fn new(client: reqwest::Client, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key: non_empty(api_key),
            base_url: YOUTUBE_SEARCH_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl SourceAdapter for YouTubeAdapter {
    fn source(&self) -> SourceId {
        SourceId::Video
    }

    fn provider(&self) -> &'static str {
        "youtube"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch(&self, topic: &str, max_results: usize) -> ScribeResult<Vec<SearchResult>> {
        let page_size = max_results.clamp(1, MAX_PAGE_SIZE).to_string();
        let request = self.client.get(&self.base_url).query(&[
            ("part", "snippet"),
            ("type", "video"),
            ("q", topic),
            ("maxResults", page_size.as_str()),
            ("key", self.api_key.as_deref().unwrap_or_default()),
        ]);

        let response: YouTubeSearchResponse = send_json(self.provider(), request).await?;
        Ok(parse_videos(response))
    }
}

fn parse_videos(response: YouTubeSearchResponse) -> Vec<SearchResult> {
    response
        .items
        .into_iter()
        .filter_map(|item| {
            let video_id = non_empty(item.id.video_id)?;
            let snippet = item.snippet?;
            let title = strip_html(&snippet.title);
            if title.is_empty() {
                return None;
            }

            Some(
                SearchResult::new(SourceId::Video, title)
                    .with_description(non_empty(snippet.description.map(|d| strip_html(&d))))
                    .with_url(Some(format!("https://www.youtube.com/watch?v={}", video_id)))
                    .with_thumbnail(snippet.thumbnails.best())
                    .with_date(non_empty(snippet.published_at))
                    .with_author(non_empty(snippet.channel_title)),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_videos() {
        let payload = r#"{
            "items": [
                {
                    "id": {"kind": "youtube#video", "videoId": "dQw4w9WgXcQ"},
                    "snippet": {
                        "title": "How EV batteries work &amp; age",
                        "description": "A look inside the pack.",
                        "publishedAt": "2023-11-02T10:00:00Z",
                        "channelTitle": "Engineering Explained",
                        "thumbnails": {
                            "default": {"url": "https://i.ytimg.com/vi/dQw4w9WgXcQ/default.jpg"},
                            "medium": {"url": "https://i.ytimg.com/vi/dQw4w9WgXcQ/mqdefault.jpg"}
                        }
                    }
                },
                {
                    "id": {"kind": "youtube#channel", "channelId": "UC123"},
                    "snippet": {"title": "A channel, not a video"}
                }
            ]
        }"#;

        let response: YouTubeSearchResponse = serde_json::from_str(payload).unwrap();
        let videos = parse_videos(response);

        assert_eq!(videos.len(), 1);
        let video = &videos[0];
        assert_eq!(video.source, SourceId::Video);
        assert_eq!(video.title, "How EV batteries work & age");
        assert_eq!(
            video.url.as_deref(),
            Some("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
        );
        assert_eq!(
            video.thumbnail.as_deref(),
            Some("https://i.ytimg.com/vi/dQw4w9WgXcQ/mqdefault.jpg")
        );
        assert_eq!(video.date.as_deref(), Some("2023-11-02T10:00:00Z"));
        assert_eq!(video.author.as_deref(), Some("Engineering Explained"));
    }

    #[test]
    fn test_unconfigured_without_key() {
        let adapter = YouTubeAdapter::new(reqwest::Client::new(), None);
        assert!(!adapter.is_configured());
        assert_eq!(adapter.source(), SourceId::Video);
    }
}
