//! Search-page fetching, article extraction, and relevance filtering.
//!
//! This crate provides:
//! - [`fetch`] — Browser-like HTTP fetcher for search result pages
//! - [`strategies`] — Ranked extraction strategies (structural, then backup anchors)
//! - [`Extractor`] — Runs the strategy cascade and produces fingerprinted candidates
//! - [`RelevanceValidator`] — Topic, length, keyword and URL acceptance rules

pub mod extractor;
pub mod fetch;
pub mod fingerprint;
pub mod relevance;
pub mod strategies;
pub mod text;

pub use extractor::{BACKUP_THRESHOLD, Extractor, PageContext, RunLedger};
pub use fetch::{FetchedPage, Fetcher, PageRequest};
pub use fingerprint::fingerprint;
pub use relevance::{Rejection, RelevanceValidator};
pub use strategies::{
    AnchorPatternStrategy, ExtractionStrategy, RawItem, SdsBlockStrategy, StrategyRegistry,
    StrategyTier,
};
pub use text::{normalize_text, truncate_chars};
