//! Scribe Generation - turns research bundles into written content
//!
//! A [`ContentSynthesizer`] walks an ordered chain of [`Generator`] backends and
//! falls back to a deterministic draft template when none of them produce text.

pub mod backends;
pub mod error;
pub mod fallback;
pub mod prompt;
pub mod synthesizer;

pub use backends::{build_generators, Generator, SiumaiGenerator};
pub use error::GenerationError;
pub use fallback::{render_fallback, DRAFT_MARKER};
pub use prompt::GenerationPrompt;
pub use synthesizer::{ContentSynthesizer, GeneratedContent};
