//! Backup strategies: loose anchor patterns.
//!
//! Each instance matches whole `<a>` elements and takes the headline from the
//! anchor's inner markup. They trade precision for surviving front-end markup
//! changes, so they sit behind the primary strategy. Matching never crosses
//! the closing `</a>`, so one link's target is never paired with the next
//! link's text.

use regex::Regex;
use std::sync::LazyLock;

use solonews_shared::{Result, SoloNewsError};

use super::{ExtractionStrategy, RawItem, StrategyTier};
use crate::text::normalize_text;

/// Non-greedy, so a nested `<span>` ends the capture at the inner `</span>`.
static SPAN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<span[^>]*>([\s\S]*?)</span>").expect("span regex"));

/// Which part of the anchor carries the headline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextScope {
    /// Everything between `<a>` and `</a>`.
    Anchor,
    /// The first `<span>` inside the anchor that mentions the topic.
    Span,
}

/// Regex-backed backup strategy over `<a>` tags.
pub struct AnchorPatternStrategy {
    name: &'static str,
    anchor: Regex,
    scope: TextScope,
    topic: Option<Regex>,
}

impl AnchorPatternStrategy {
    /// Legacy results markup: `<a class="news_tit" href=...>TITLE</a>`.
    pub fn news_title() -> Self {
        Self {
            name: "backup_news_tit_v2",
            anchor: Regex::new(
                r#"(?i)<a[^>]*class="[^"]*news_tit[^"]*"[^>]*href="([^"]*)"[^>]*>([\s\S]*?)</a>"#,
            )
            .expect("news_tit regex"),
            scope: TextScope::Anchor,
            topic: None,
        }
    }

    /// A new-tab anchor holding a span whose text mentions the topic.
    pub fn blank_target_span(loose_terms: &[String]) -> Result<Self> {
        Self::compile(
            "backup_sds_span_v2",
            r#"(?i)<a[^>]*href="([^"]*)"[^>]*target="_blank"[^>]*>([\s\S]*?)</a>"#,
            TextScope::Span,
            loose_terms,
        )
    }

    /// Any absolute http(s) anchor whose text mentions the topic.
    pub fn topic_anchor(loose_terms: &[String]) -> Result<Self> {
        Self::compile(
            "backup_topic_anchor_v2",
            r#"(?i)<a[^>]*href="(https?://[^"]*)"[^>]*>([\s\S]*?)</a>"#,
            TextScope::Anchor,
            loose_terms,
        )
    }

    fn compile(
        name: &'static str,
        anchor: &str,
        scope: TextScope,
        loose_terms: &[String],
    ) -> Result<Self> {
        let invalid = |e: regex::Error| SoloNewsError::config(format!("invalid {name} pattern: {e}"));
        let topic = Regex::new(&loose_topic_pattern(loose_terms)?).map_err(invalid)?;
        let anchor = Regex::new(anchor).map_err(invalid)?;
        Ok(Self {
            name,
            anchor,
            scope,
            topic: Some(topic),
        })
    }

    fn mentions_topic(&self, markup: &str) -> bool {
        self.topic.as_ref().is_none_or(|t| t.is_match(markup))
    }

    fn headline<'h>(&self, inner: &'h str) -> Option<&'h str> {
        match self.scope {
            TextScope::Anchor => Some(inner).filter(|m| self.mentions_topic(m)),
            TextScope::Span => SPAN_RE
                .captures_iter(inner)
                .filter_map(|c| c.get(1))
                .map(|m| m.as_str())
                .find(|m| self.mentions_topic(m)),
        }
    }
}

impl ExtractionStrategy for AnchorPatternStrategy {
    fn name(&self) -> &str {
        self.name
    }

    fn tier(&self) -> StrategyTier {
        StrategyTier::Backup
    }

    fn extract(&self, html: &str) -> Vec<RawItem> {
        self.anchor
            .captures_iter(html)
            .filter_map(|caps| {
                let headline = self.headline(caps.get(2)?.as_str())?;
                Some(RawItem {
                    url: caps[1].to_string(),
                    title: normalize_text(headline),
                    ..RawItem::default()
                })
            })
            .collect()
    }
}

/// Join the topic terms so they must appear in order, anything in between.
fn loose_topic_pattern(terms: &[String]) -> Result<String> {
    let escaped: Vec<String> = terms
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(regex::escape)
        .collect();

    if escaped.is_empty() {
        return Err(SoloNewsError::config("topic.loose_terms must not be empty"));
    }
    Ok(format!("(?i){}", escaped.join(r"[\s\S]*?")))
}
