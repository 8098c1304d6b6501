//! Scribe Research - concurrent multi-source research
//!
//! Source adapters normalize external search providers into [`SearchResult`]s and the
//! [`ResearchAggregator`] fans a query out to them with a per-source timeout.
//!
//! [`SearchResult`]: scribe_core::SearchResult

pub mod aggregator;
pub mod http;
pub mod sources;

pub use aggregator::{ResearchAggregator, ResearchOutcome};
pub use sources::{build_adapters, ChainedAdapter, SourceAdapter};
