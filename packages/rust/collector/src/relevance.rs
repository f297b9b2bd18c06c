//! Topical relevance checks for extracted (title, summary, url) triples.
//!
//! Rejection is the common case on a search page (navigation links, ads,
//! unrelated stories), so it is reported as a value rather than an error.

use solonews_shared::TopicConfig;
use tracing::debug;

/// Titles must be strictly longer than this many characters.
const MIN_TITLE_CHARS: usize = 5;

/// Titles must be strictly shorter than this many characters.
const MAX_TITLE_CHARS: usize = 500;

/// Why a candidate was filtered out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Title or URL is empty.
    Empty,
    /// Title length (in characters) is outside the accepted range.
    TitleLength(usize),
    /// Neither title nor summary mentions the topic.
    OffTopic,
    /// Title contains an excluded keyword.
    ExcludedKeyword(String),
    /// URL is not http(s) or points back at the search engine.
    BadUrl,
}

/// Decides whether an extracted item is an in-scope article.
#[derive(Debug, Clone)]
pub struct RelevanceValidator {
    markers: Vec<String>,
    excluded_keywords: Vec<String>,
    search_host: String,
}

impl RelevanceValidator {
    pub fn new(topic: &TopicConfig) -> Self {
        let non_empty = |values: &[String]| -> Vec<String> {
            values
                .iter()
                .filter(|v| !v.is_empty())
                .cloned()
                .collect()
        };

        Self {
            markers: non_empty(&topic.markers),
            excluded_keywords: non_empty(&topic.excluded_keywords),
            search_host: topic.search_host.clone(),
        }
    }

    /// `true` when the item passes every relevance rule.
    pub fn is_valid(&self, title: &str, summary: Option<&str>, url: &str) -> bool {
        match self.check(title, summary, url) {
            Ok(()) => true,
            Err(reason) => {
                debug!(?reason, title, url, "candidate rejected");
                false
            }
        }
    }

    /// Run the rules in order and report the first one that fails.
    pub fn check(
        &self,
        title: &str,
        summary: Option<&str>,
        url: &str,
    ) -> std::result::Result<(), Rejection> {
        if title.is_empty() || url.is_empty() {
            return Err(Rejection::Empty);
        }

        let title_len = title.chars().count();
        if title_len <= MIN_TITLE_CHARS || title_len >= MAX_TITLE_CHARS {
            return Err(Rejection::TitleLength(title_len));
        }

        let mentions_topic = |text: &str| self.markers.iter().any(|m| text.contains(m.as_str()));
        if !mentions_topic(title) && !summary.is_some_and(mentions_topic) {
            return Err(Rejection::OffTopic);
        }

        if let Some(keyword) = self
            .excluded_keywords
            .iter()
            .find(|k| title.contains(k.as_str()))
        {
            return Err(Rejection::ExcludedKeyword(keyword.clone()));
        }

        if !url.starts_with("http")
            || (!self.search_host.is_empty() && url.contains(self.search_host.as_str()))
        {
            return Err(Rejection::BadUrl);
        }

        Ok(())
    }
}
