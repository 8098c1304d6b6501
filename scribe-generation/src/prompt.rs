//! Prompt construction

use scribe_core::{GenerationRequest, ResearchBundle, SearchResult};
use std::fmt::Write;

/// Items per source included in the research digest
pub const DIGEST_ITEMS_PER_SOURCE: usize = 3;
/// Character ceiling for one digest item
pub const DIGEST_ITEM_CHARS: usize = 150;

const ELLIPSIS: &str = "...";

/// System and user instructions for one generation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationPrompt {
    pub system: String,
    pub user: String,
}

impl GenerationPrompt {
    pub fn build(request: &GenerationRequest) -> Self {
        let language = language_name(&request.language);

        let system = format!(
            "You are an expert content writer who produces well-structured, accurate {kind}s. \
             Write in {language}. Format the output as Markdown with a title and clear sections. \
             Ground claims in the supplied research when it is relevant and never invent statistics \
             or quotes.",
            kind = request.content_type.description(),
            language = language,
        );

        let mut user = format!(
            "Write a {kind} about \"{topic}\".\n\n\
             Tone: {tone}\n\
             Target audience: {audience}\n\
             Length: {words}\n\
             Language: {language}\n",
            kind = request.content_type.description(),
            topic = request.topic,
            tone = request.tone,
            audience = request.audience,
            words = request.length.word_target(),
            language = language,
        );

        if let Some(digest) = research_digest(&request.bundle) {
            user.push_str("\nResearch findings:\n");
            user.push_str(&digest);
        }

        Self { system, user }
    }
}

/// Bounded summary of a bundle, `None` when it holds no results
pub fn research_digest(bundle: &ResearchBundle) -> Option<String> {
    if bundle.total_results() == 0 {
        return None;
    }

    let mut digest = String::new();
    for (source, results) in bundle.iter() {
        if results.is_empty() {
            continue;
        }
        let _ = writeln!(digest, "\n## {}", source.display_name());
        for result in results.iter().take(DIGEST_ITEMS_PER_SOURCE) {
            let _ = writeln!(digest, "- {}", summarize(result));
        }
    }
    Some(digest)
}

/// One-line summary of a result, at most [`DIGEST_ITEM_CHARS`] characters
pub fn summarize(result: &SearchResult) -> String {
    let line = match result.description.as_deref().map(str::trim) {
        Some(description) if !description.is_empty() => {
            format!("{}: {}", result.title.trim(), description)
        }
        _ => result.title.trim().to_string(),
    };
    let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_chars(&line, DIGEST_ITEM_CHARS)
}

/// Cut `text` to at most `max_chars` characters, marking the cut with an ellipsis
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.truncate(truncated.trim_end().len());
    truncated.push_str(ELLIPSIS);
    truncated
}

/// English name for common language codes; other codes are passed through
pub fn language_name(code: &str) -> &str {
    match code {
        "en" => "English",
        "es" => "Spanish",
        "fr" => "French",
        "de" => "German",
        "it" => "Italian",
        "pt" => "Portuguese",
        "nl" => "Dutch",
        "pl" => "Polish",
        "ru" => "Russian",
        "ja" => "Japanese",
        "zh" => "Chinese",
        "ko" => "Korean",
        "ar" => "Arabic",
        "hi" => "Hindi",
        "tr" => "Turkish",
        other => other,
    }
}
