//! Offline draft used when no backend produces content

use crate::prompt::{language_name, DIGEST_ITEMS_PER_SOURCE};
use scribe_core::GenerationRequest;
use std::fmt::Write;

/// Visible marker identifying template output
pub const DRAFT_MARKER: &str = "DRAFT TEMPLATE";

/// Render the fallback document. Pure: same request, same text.
pub fn render_fallback(request: &GenerationRequest) -> String {
    let mut doc = String::new();

    let _ = writeln!(doc, "# {}", request.topic);
    let _ = writeln!(doc);
    let _ = writeln!(
        doc,
        "> **{}**: automatic generation is unavailable right now. This outline is a starting point to edit by hand.",
        DRAFT_MARKER
    );
    let _ = writeln!(doc);
    let _ = writeln!(doc, "- **Content type:** {}", request.content_type);
    let _ = writeln!(doc, "- **Tone:** {}", request.tone);
    let _ = writeln!(doc, "- **Audience:** {}", request.audience);
    let _ = writeln!(doc, "- **Length:** {}", request.length.word_target());
    let _ = writeln!(doc, "- **Language:** {}", language_name(&request.language));
    let _ = writeln!(doc);

    let _ = writeln!(doc, "## Introduction");
    let _ = writeln!(doc);
    let _ = writeln!(
        doc,
        "Introduce {} to a {} in a {} tone and state why it matters to them.",
        request.topic, request.audience, request.tone
    );
    let _ = writeln!(doc);
    let _ = writeln!(doc, "## Key points");
    let _ = writeln!(doc);
    let _ = writeln!(doc, "1. What {} is and where it stands today.", request.topic);
    let _ = writeln!(doc, "2. The main benefits and open challenges.");
    let _ = writeln!(doc, "3. What the reader should do or watch next.");
    let _ = writeln!(doc);

    if request.bundle.total_results() > 0 {
        let _ = writeln!(doc, "## Research to review");
        let _ = writeln!(doc);
        for (source, results) in request.bundle.iter() {
            for result in results.iter().take(DIGEST_ITEMS_PER_SOURCE) {
                match &result.url {
                    Some(url) => {
                        let _ = writeln!(doc, "- [{}]({}) ({})", result.title, url, source);
                    }
                    None => {
                        let _ = writeln!(doc, "- {} ({})", result.title, source);
                    }
                }
            }
        }
        let _ = writeln!(doc);
    }

    let _ = writeln!(doc, "## Conclusion");
    let _ = writeln!(doc);
    let _ = write!(doc, "Summarize the key points about {} and close with a clear next step.", request.topic);

    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_core::{ContentType, ResearchBundle, SearchResult, SourceId, Tone};

    #[test]
    fn test_fallback_contains_request_details() {
        let request = GenerationRequest::new("urban beekeeping", ResearchBundle::default())
            .unwrap()
            .with_tone(Tone::Friendly)
            .with_content_type(ContentType::Email)
            .with_audience("city gardeners");

        let doc = render_fallback(&request);
        assert!(doc.starts_with("# urban beekeeping"));
        assert!(doc.contains(DRAFT_MARKER));
        assert!(doc.contains("friendly"));
        assert!(doc.contains("email"));
        assert!(doc.contains("city gardeners"));
        assert!(!doc.contains("Research to review"));
    }

    #[test]
    fn test_fallback_is_deterministic() {
        let mut bundle = ResearchBundle::for_sources(&[SourceId::Web]);
        bundle.insert(
            SourceId::Web,
            vec![SearchResult::new(SourceId::Web, "Hive basics")
                .with_url(Some("https://bees.example.com".to_string()))],
        );
        let request = GenerationRequest::new("urban beekeeping", bundle).unwrap();

        let first = render_fallback(&request);
        assert_eq!(first, render_fallback(&request));
        assert!(first.contains("[Hive basics](https://bees.example.com) (web)"));
    }
}
