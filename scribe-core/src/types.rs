//! Core data type definitions

use crate::error::{ScribeError, ScribeResult};
use crate::validation_error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Minimum topic length in characters, after sanitization
pub const MIN_TOPIC_CHARS: usize = 2;
/// Maximum topic length in characters, after sanitization
pub const MAX_TOPIC_CHARS: usize = 100;
/// Maximum audience description length in characters
pub const MAX_AUDIENCE_CHARS: usize = 100;

/// Research providers the aggregator can fan out to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    Web,
    Video,
    News,
    Academic,
    Encyclopedia,
}

impl SourceId {
    pub const ALL: [SourceId; 5] = [
        SourceId::Web,
        SourceId::Video,
        SourceId::News,
        SourceId::Academic,
        SourceId::Encyclopedia,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::Web => "web",
            SourceId::Video => "video",
            SourceId::News => "news",
            SourceId::Academic => "academic",
            SourceId::Encyclopedia => "encyclopedia",
        }
    }

    /// Heading used when the source is summarized for a prompt
    pub fn display_name(&self) -> &'static str {
        match self {
            SourceId::Web => "Web results",
            SourceId::Video => "Videos",
            SourceId::News => "News coverage",
            SourceId::Academic => "Academic papers",
            SourceId::Encyclopedia => "Encyclopedia entries",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceId {
    type Err = ScribeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "web" => Ok(SourceId::Web),
            "video" | "videos" | "youtube" => Ok(SourceId::Video),
            "news" => Ok(SourceId::News),
            "academic" | "scholar" => Ok(SourceId::Academic),
            "encyclopedia" | "wikipedia" => Ok(SourceId::Encyclopedia),
            other => Err(validation_error!(
                format!(
                    "Unknown source '{}'. Expected one of: web, video, news, academic, encyclopedia",
                    other
                ),
                "sources",
                "types"
            )),
        }
    }
}

/// One normalized result produced by a source adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub source: SourceId,
}

impl SearchResult {
    pub fn new(source: SourceId, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            url: None,
            thumbnail: None,
            date: None,
            author: None,
            source,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !d.trim().is_empty());
        self
    }

    pub fn with_url(mut self, url: Option<String>) -> Self {
        self.url = url;
        self
    }

    pub fn with_thumbnail(mut self, thumbnail: Option<String>) -> Self {
        self.thumbnail = thumbnail;
        self
    }

    pub fn with_date(mut self, date: Option<String>) -> Self {
        self.date = date;
        self
    }

    pub fn with_author(mut self, author: Option<String>) -> Self {
        self.author = author.filter(|a| !a.trim().is_empty());
        self
    }
}

/// Aggregated research, keyed by source.
///
/// Every source the bundle was created for keeps a key even when it produced nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResearchBundle(BTreeMap<SourceId, Vec<SearchResult>>);

impl ResearchBundle {
    /// Create a bundle with an empty entry for each source
    pub fn for_sources(sources: &[SourceId]) -> Self {
        Self(sources.iter().map(|s| (*s, Vec::new())).collect())
    }

    /// Replace the results stored for a source
    pub fn insert(&mut self, source: SourceId, results: Vec<SearchResult>) {
        self.0.insert(source, results);
    }

    /// Results for a source, empty when the source is absent
    pub fn get(&self, source: SourceId) -> &[SearchResult] {
        self.0.get(&source).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, source: SourceId) -> bool {
        self.0.contains_key(&source)
    }

    /// Number of source keys
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total_results(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn sources(&self) -> Vec<SourceId> {
        self.0.keys().copied().collect()
    }

    pub fn sources_with_results(&self) -> Vec<SourceId> {
        self.0
            .iter()
            .filter(|(_, results)| !results.is_empty())
            .map(|(source, _)| *source)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SourceId, &[SearchResult])> {
        self.0.iter().map(|(source, results)| (*source, results.as_slice()))
    }
}

/// A validated research request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResearchQuery {
    topic: String,
    sources: Vec<SourceId>,
}

impl ResearchQuery {
    /// Validate and build a query.
    ///
    /// The topic is sanitized before its length is checked. Duplicate sources are dropped
    /// (first occurrence wins) and an empty source list selects every source.
    pub fn new(topic: &str, sources: &[SourceId]) -> ScribeResult<Self> {
        let topic = validate_topic(topic)?;

        let mut unique = Vec::with_capacity(sources.len());
        for source in sources {
            if !unique.contains(source) {
                unique.push(*source);
            }
        }
        if unique.is_empty() {
            unique = SourceId::ALL.to_vec();
        }

        Ok(Self {
            topic,
            sources: unique,
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Requested sources in request order
    pub fn sources(&self) -> &[SourceId] {
        &self.sources
    }
}

/// Writing tone requested for generated content
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Professional,
    Casual,
    Friendly,
    Formal,
    Persuasive,
    Informative,
    Humorous,
}

impl Tone {
    pub const ALL: [Tone; 7] = [
        Tone::Professional,
        Tone::Casual,
        Tone::Friendly,
        Tone::Formal,
        Tone::Persuasive,
        Tone::Informative,
        Tone::Humorous,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Professional => "professional",
            Tone::Casual => "casual",
            Tone::Friendly => "friendly",
            Tone::Formal => "formal",
            Tone::Persuasive => "persuasive",
            Tone::Informative => "informative",
            Tone::Humorous => "humorous",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tone {
    type Err = ScribeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Tone::ALL
            .into_iter()
            .find(|tone| tone.as_str() == wanted)
            .ok_or_else(|| validation_error!(format!("Unknown tone '{}'", s), "tone", "types"))
    }
}

/// Kind of document to generate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Article,
    Blog,
    Ad,
    Social,
    Email,
    Book,
}

impl ContentType {
    pub const ALL: [ContentType; 6] = [
        ContentType::Article,
        ContentType::Blog,
        ContentType::Ad,
        ContentType::Social,
        ContentType::Email,
        ContentType::Book,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Article => "article",
            ContentType::Blog => "blog",
            ContentType::Ad => "ad",
            ContentType::Social => "social",
            ContentType::Email => "email",
            ContentType::Book => "book",
        }
    }

    /// Human phrasing used inside prompts
    pub fn description(&self) -> &'static str {
        match self {
            ContentType::Article => "long-form article",
            ContentType::Blog => "blog post",
            ContentType::Ad => "marketing advertisement",
            ContentType::Social => "social media post",
            ContentType::Email => "marketing email",
            ContentType::Book => "book chapter",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = ScribeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        let normalized = match wanted.as_str() {
            "blog-post" | "blogpost" | "blog_post" => "blog",
            "advertisement" | "ads" => "ad",
            "social-media" | "social_media" => "social",
            "chapter" => "book",
            other => other,
        };
        ContentType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| {
                validation_error!(format!("Unknown content type '{}'", s), "contentType", "types")
            })
    }
}

/// Target length of generated content
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentLength {
    Short,
    #[default]
    Medium,
    Long,
}

impl ContentLength {
    pub const ALL: [ContentLength; 3] =
        [ContentLength::Short, ContentLength::Medium, ContentLength::Long];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentLength::Short => "short",
            ContentLength::Medium => "medium",
            ContentLength::Long => "long",
        }
    }

    /// Completion token ceiling sent to the generation backend
    pub fn token_budget(&self) -> u32 {
        match self {
            ContentLength::Short => 500,
            ContentLength::Medium => 1000,
            ContentLength::Long => 2000,
        }
    }

    /// Word count the prompt asks for
    pub fn word_target(&self) -> &'static str {
        match self {
            ContentLength::Short => "300-500 words",
            ContentLength::Medium => "800-1200 words",
            ContentLength::Long => "2000+ words",
        }
    }
}

impl fmt::Display for ContentLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentLength {
    type Err = ScribeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ContentLength::ALL
            .into_iter()
            .find(|length| length.as_str() == wanted)
            .ok_or_else(|| validation_error!(format!("Unknown length '{}'", s), "length", "types"))
    }
}

/// Everything the synthesizer needs for one generation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub bundle: ResearchBundle,
    pub topic: String,
    pub language: String,
    pub tone: Tone,
    pub content_type: ContentType,
    pub length: ContentLength,
    pub audience: String,
}

impl GenerationRequest {
    pub const DEFAULT_LANGUAGE: &'static str = "en";
    pub const DEFAULT_AUDIENCE: &'static str = "general audience";

    /// Build a request with default settings, validating the topic
    pub fn new(topic: &str, bundle: ResearchBundle) -> ScribeResult<Self> {
        Ok(Self {
            bundle,
            topic: validate_topic(topic)?,
            language: Self::DEFAULT_LANGUAGE.to_string(),
            tone: Tone::default(),
            content_type: ContentType::default(),
            length: ContentLength::default(),
            audience: Self::DEFAULT_AUDIENCE.to_string(),
        })
    }

    pub fn with_tone(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }

    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn with_length(mut self, length: ContentLength) -> Self {
        self.length = length;
        self
    }

    /// Set the language code; blank input keeps the default
    pub fn with_language(mut self, language: &str) -> ScribeResult<Self> {
        let language = language.trim().to_ascii_lowercase();
        if language.is_empty() {
            return Ok(self);
        }
        let well_formed = language.len() <= 16
            && language.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
        if !well_formed {
            return Err(validation_error!(
                format!("Invalid language code '{}'", language),
                "language",
                "types"
            ));
        }
        self.language = language;
        Ok(self)
    }

    /// Set the audience; blank input keeps the default
    pub fn with_audience(mut self, audience: &str) -> Self {
        let audience: String = sanitize_text(audience)
            .chars()
            .take(MAX_AUDIENCE_CHARS)
            .collect();
        if !audience.is_empty() {
            self.audience = audience;
        }
        self
    }
}

/// Remove angle brackets and surrounding whitespace from user text
pub fn sanitize_text(input: &str) -> String {
    input
        .chars()
        .filter(|c| *c != '<' && *c != '>')
        .collect::<String>()
        .trim()
        .to_string()
}

/// Sanitize a topic and enforce its length bounds
pub fn validate_topic(topic: &str) -> ScribeResult<String> {
    let sanitized = sanitize_text(topic);
    let chars = sanitized.chars().count();

    if chars < MIN_TOPIC_CHARS {
        return Err(validation_error!(
            format!("Topic must be at least {} characters", MIN_TOPIC_CHARS),
            "topic",
            "types"
        ));
    }
    if chars > MAX_TOPIC_CHARS {
        return Err(validation_error!(
            format!("Topic must be at most {} characters", MAX_TOPIC_CHARS),
            "topic",
            "types"
        ));
    }

    Ok(sanitized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_sanitization() {
        let query = ResearchQuery::new("  <script>electric cars</script> ", &[SourceId::Web]).unwrap();
        assert_eq!(query.topic(), "scriptelectric cars/script");

        assert!(ResearchQuery::new("<a>", &[SourceId::Web]).is_err());
        assert!(ResearchQuery::new("x", &[SourceId::Web]).is_err());
        assert!(ResearchQuery::new(&"y".repeat(101), &[SourceId::Web]).is_err());
        assert!(ResearchQuery::new(&"y".repeat(100), &[SourceId::Web]).is_ok());
    }

    #[test]
    fn test_query_sources_dedup_and_default() {
        let query = ResearchQuery::new(
            "solar power",
            &[SourceId::News, SourceId::Web, SourceId::News],
        )
        .unwrap();
        assert_eq!(query.sources(), &[SourceId::News, SourceId::Web]);

        let all = ResearchQuery::new("solar power", &[]).unwrap();
        assert_eq!(all.sources(), &SourceId::ALL);
    }

    #[test]
    fn test_source_id_parsing() {
        assert_eq!("Web".parse::<SourceId>().unwrap(), SourceId::Web);
        assert_eq!("wikipedia".parse::<SourceId>().unwrap(), SourceId::Encyclopedia);
        assert!("podcasts".parse::<SourceId>().is_err());
    }

    #[test]
    fn test_bundle_keeps_empty_sources() {
        let mut bundle = ResearchBundle::for_sources(&[SourceId::Web, SourceId::News]);
        bundle.insert(
            SourceId::Web,
            vec![SearchResult::new(SourceId::Web, "Result")],
        );

        assert_eq!(bundle.len(), 2);
        assert_eq!(bundle.total_results(), 1);
        assert!(bundle.contains(SourceId::News));
        assert!(bundle.get(SourceId::News).is_empty());
        assert!(bundle.get(SourceId::Video).is_empty());
        assert_eq!(bundle.sources_with_results(), vec![SourceId::Web]);

        let json = serde_json::to_value(&bundle).unwrap();
        assert_eq!(json["news"], serde_json::json!([]));
        assert_eq!(json["web"][0]["title"], "Result");
        assert!(json["web"][0].get("url").is_none());
    }

    #[test]
    fn test_length_budgets() {
        assert_eq!(ContentLength::Short.token_budget(), 500);
        assert_eq!(ContentLength::Medium.token_budget(), 1000);
        assert_eq!(ContentLength::Long.token_budget(), 2000);
        assert_eq!(ContentLength::default(), ContentLength::Medium);
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!("Persuasive".parse::<Tone>().unwrap(), Tone::Persuasive);
        assert_eq!("blog-post".parse::<ContentType>().unwrap(), ContentType::Blog);
        assert_eq!("LONG".parse::<ContentLength>().unwrap(), ContentLength::Long);
        assert!("angry".parse::<Tone>().is_err());
    }

    #[test]
    fn test_generation_request_builders() {
        let request = GenerationRequest::new("remote work", ResearchBundle::default())
            .unwrap()
            .with_language(" ES ")
            .unwrap()
            .with_audience("  <b>startup founders</b> ");

        assert_eq!(request.language, "es");
        assert_eq!(request.audience, "bstartup founders/b");
        assert!(request
            .clone()
            .with_language("en; drop table")
            .is_err());
        assert_eq!(request.with_audience("   ").audience, "bstartup founders/b");
    }
}
