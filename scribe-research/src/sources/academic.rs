//! Semantic Scholar provider for the `academic` source

use super::{non_empty, strip_html, SourceAdapter};
use crate::http::send_json;
use async_trait::async_trait;
use scribe_core::{ScribeResult, SearchResult, SourceId};
use serde::Deserialize;

const SEMANTIC_SCHOLAR_URL: &str = "https://api.semanticscholar.org/graph/v1/paper/search";
const PAPER_FIELDS: &str = "title,abstract,url,year,publicationDate,authors,venue";
const MAX_PAGE_SIZE: usize = 100;
/// Authors listed before collapsing the rest into "et al."
const MAX_LISTED_AUTHORS: usize = 3;

#[derive(Debug, Deserialize)]
struct PaperSearchResponse {
    #[serde(default)]
    data: Vec<Paper>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Paper {
    paper_id: Option<String>,
    title: Option<String>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    url: Option<String>,
    year: Option<u32>,
    publication_date: Option<String>,
    #[serde(default)]
    authors: Vec<PaperAuthor>,
}

#[derive(Debug, Deserialize)]
struct PaperAuthor {
    name: Option<String>,
}

/// Paper search through the Semantic Scholar Graph API.
///
/// The public endpoint works without a key; a key only raises provider-side limits.
#[derive(Debug, Clone)]
pub struct SemanticScholarAdapter {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl SemanticScholarAdapter {
    pub fn new(client: reqwest::Client, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key: non_empty(api_key),
            base_url: SEMANTIC_SCHOLAR_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl SourceAdapter for SemanticScholarAdapter {
    fn source(&self) -> SourceId {
        SourceId::Academic
    }

    fn provider(&self) -> &'static str {
        "semantic_scholar"
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn fetch(&self, topic: &str, max_results: usize) -> ScribeResult<Vec<SearchResult>> {
        let limit = max_results.clamp(1, MAX_PAGE_SIZE).to_string();
        let mut request = self.client.get(&self.base_url).query(&[
            ("query", topic),
            ("limit", limit.as_str()),
            ("fields", PAPER_FIELDS),
        ]);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response: PaperSearchResponse = send_json(self.provider(), request).await?;
        Ok(parse_papers(response))
    }
}

fn parse_papers(response: PaperSearchResponse) -> Vec<SearchResult> {
    response
        .data
        .into_iter()
        .filter_map(|paper| {
            let title = non_empty(paper.title.map(|t| strip_html(&t)))?;
            let url = non_empty(paper.url).or_else(|| {
                non_empty(paper.paper_id)
                    .map(|id| format!("https://www.semanticscholar.org/paper/{}", id))
            });
            let date = non_empty(paper.publication_date).or(paper.year.map(|y| y.to_string()));

            Some(
                SearchResult::new(SourceId::Academic, title)
                    .with_description(non_empty(paper.abstract_text.map(|a| strip_html(&a))))
                    .with_url(url)
                    .with_date(date)
                    .with_author(format_authors(&paper.authors)),
            )
        })
        .collect()
}

fn format_authors(authors: &[PaperAuthor]) -> Option<String> {
    let names: Vec<&str> = authors
        .iter()
        .filter_map(|a| a.name.as_deref())
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .collect();

    match names.len() {
        0 => None,
        n if n <= MAX_LISTED_AUTHORS => Some(names.join(", ")),
        _ => Some(format!("{} et al.", names[..MAX_LISTED_AUTHORS].join(", "))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_papers() {
        let payload = r#"{
            "total": 2,
            "offset": 0,
            "data": [
                {
                    "paperId": "abc123",
                    "title": "Lithium-ion degradation in electric vehicles",
                    "abstract": "We study capacity fade.",
                    "url": "https://www.semanticscholar.org/paper/abc123",
                    "year": 2021,
                    "publicationDate": "2021-06-15",
                    "authors": [
                        {"authorId": "1", "name": "A. Author"},
                        {"authorId": "2", "name": "B. Author"},
                        {"authorId": "3", "name": "C. Author"},
                        {"authorId": "4", "name": "D. Author"}
                    ]
                },
                {
                    "paperId": "def456",
                    "title": "Grid impacts of EV charging",
                    "abstract": null,
                    "url": null,
                    "year": 2019,
                    "publicationDate": null,
                    "authors": [{"authorId": "5", "name": "E. Author"}]
                },
                {
                    "paperId": "ghi789",
                    "title": null,
                    "authors": []
                }
            ]
        }"#;

        let response: PaperSearchResponse = serde_json::from_str(payload).unwrap();
        let papers = parse_papers(response);

        assert_eq!(papers.len(), 2);
        assert_eq!(
            papers[0].author.as_deref(),
            Some("A. Author, B. Author, C. Author et al.")
        );
        assert_eq!(papers[0].date.as_deref(), Some("2021-06-15"));
        assert_eq!(papers[0].description.as_deref(), Some("We study capacity fade."));

        assert_eq!(papers[1].date.as_deref(), Some("2019"));
        assert_eq!(
            papers[1].url.as_deref(),
            Some("https://www.semanticscholar.org/paper/def456")
        );
        assert_eq!(papers[1].author.as_deref(), Some("E. Author"));
        assert!(papers[1].description.is_none());
    }

    #[test]
    fn test_always_configured() {
        let adapter = SemanticScholarAdapter::new(reqwest::Client::new(), None);
        assert!(adapter.is_configured());
    }
}
