//! Core domain types for solonews article collection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum stored title length, in characters.
pub const MAX_TITLE_CHARS: usize = 500;

/// Maximum stored summary length, in characters.
pub const MAX_SUMMARY_CHARS: usize = 300;

/// Maximum stored author length, in characters.
pub const MAX_AUTHOR_CHARS: usize = 100;

/// Items collected per run when the caller does not say otherwise.
pub const DEFAULT_MAX_ITEMS: usize = 20;

/// Upper bound accepted for a single run's item budget.
pub const MAX_ITEMS_CAP: usize = 100;

// ---------------------------------------------------------------------------
// ArticleStatus
// ---------------------------------------------------------------------------

/// Lifecycle state of a stored article.
///
/// The collector only ever creates `Pending` rows; promotion is owned by
/// whoever curates the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    #[default]
    Pending,
    Published,
}

impl ArticleStatus {
    /// The string stored in the `status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Published => "published",
        }
    }
}

impl std::fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ArticleStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "published" => Ok(Self::Published),
            other => Err(format!("unknown article status: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// CandidateArticle
// ---------------------------------------------------------------------------

/// Provenance of a candidate: which strategy found it, and on which page.
///
/// Diagnostic only; never part of the deduplication key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMeta {
    /// Name of the extraction strategy that produced the item.
    pub scrape_method: String,
    /// Search query of the page the item came from.
    pub search_keyword: String,
    /// 1-based index of the page within the run.
    pub page: usize,
    /// Press name as printed on the results page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub press: Option<String>,
    /// Thumbnail image reference, when the result block carried one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

/// One extracted, validated, fingerprinted news item awaiting storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateArticle {
    pub title: String,
    pub summary: String,
    pub original_url: String,
    /// Same value as `original_url`; no canonicalization is attempted.
    pub canonical_url: String,
    /// Publishing outlet.
    pub author: String,
    /// Approximated by the extraction time; results pages do not expose it reliably.
    pub published_at: DateTime<Utc>,
    pub fetched_at: DateTime<Utc>,
    pub status: ArticleStatus,
    pub raw_meta: RawMeta,
    /// SHA-256 hex of `original_url::title`, the deduplication key.
    pub hash: String,
}

// ---------------------------------------------------------------------------
// Search targets
// ---------------------------------------------------------------------------

/// One page of search results to fetch: a query term and a start offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchTarget {
    /// Search term, e.g. `나는 솔로`.
    pub query: String,
    /// 1-based result offset (`1`, `11`, `21`, ...).
    pub start: u32,
}

impl SearchTarget {
    pub fn new(query: impl Into<String>, start: u32) -> Self {
        Self {
            query: query.into(),
            start,
        }
    }

    /// Fill a URL template's `{query}` (form-encoded) and `{start}` placeholders.
    pub fn render(&self, template: &str) -> String {
        let query: String = url::form_urlencoded::byte_serialize(self.query.as_bytes()).collect();
        template
            .replace("{query}", &query)
            .replace("{start}", &self.start.to_string())
    }
}

// ---------------------------------------------------------------------------
// Request / response
// ---------------------------------------------------------------------------

/// Caller-supplied collection request, as received over the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionRequest {
    /// Requested item budget; missing or out-of-range values are clamped.
    #[serde(default, alias = "maxItems", alias = "maxPerSource")]
    pub max_items: Option<i64>,
}

impl CollectionRequest {
    /// Resolve the item budget: default when absent, clamped to `1..=MAX_ITEMS_CAP`.
    pub fn max_items(&self) -> usize {
        match self.max_items {
            None => DEFAULT_MAX_ITEMS,
            Some(n) => n.clamp(1, MAX_ITEMS_CAP as i64) as usize,
        }
    }
}

/// A per-source failure reported alongside a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceError {
    pub source_id: String,
    pub message: String,
}

/// Outcome of a completed collection run.
///
/// `inserted + skipped == total` whenever the run completes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSummary {
    pub inserted: usize,
    /// Number of candidates extracted in the run.
    pub total: usize,
    /// Duplicates plus per-record insert failures.
    pub skipped: usize,
    pub errors: Vec<SourceError>,
}

/// Result of inserting one article into the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new row was written.
    Inserted,
    /// A uniqueness constraint rejected the row; it was already stored.
    Duplicate,
}
