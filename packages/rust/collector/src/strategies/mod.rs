//! Extraction strategies and their ranked registry.
//!
//! Each strategy turns a search-results page into raw (url, title, ...) hits
//! on its own. The registry keeps them in rank order: the precise structural
//! strategy first, then progressively looser anchor patterns that only run
//! when the precise one under-yields.

mod anchor;
mod sds;

use solonews_shared::{Result, TopicConfig};

pub use anchor::AnchorPatternStrategy;
pub use sds::SdsBlockStrategy;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// One item as found on the page, text already normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawItem {
    /// Link target exactly as it appeared in `href`.
    pub url: String,
    /// Headline text.
    pub title: String,
    /// Summary text, when the strategy can see one.
    pub summary: Option<String>,
    /// Press / outlet name.
    pub press: Option<String>,
    /// Thumbnail image reference.
    pub thumbnail_url: Option<String>,
}

/// Where a strategy sits in the cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyTier {
    /// Always runs.
    Primary,
    /// Runs only while the run's yield is below the backup threshold.
    Backup,
}

/// A self-contained way of pulling article hits out of a results page.
pub trait ExtractionStrategy: Send + Sync {
    /// Provenance tag recorded in `raw_meta.scrape_method`.
    fn name(&self) -> &str;

    /// Position in the cascade.
    fn tier(&self) -> StrategyTier;

    /// All hits on the page, in document order.
    fn extract(&self, html: &str) -> Vec<RawItem>;
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Holds registered strategies in rank order.
pub struct StrategyRegistry {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl StrategyRegistry {
    /// Create a registry with the built-in strategies for `topic`.
    pub fn new(topic: &TopicConfig) -> Result<Self> {
        Ok(Self::with_strategies(vec![
            Box::new(SdsBlockStrategy),
            Box::new(AnchorPatternStrategy::news_title()),
            Box::new(AnchorPatternStrategy::blank_target_span(&topic.loose_terms)?),
            Box::new(AnchorPatternStrategy::topic_anchor(&topic.loose_terms)?),
        ]))
    }

    /// Create a registry from an explicit, already ranked list.
    pub fn with_strategies(strategies: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        Self { strategies }
    }

    /// Strategies of the given tier, in rank order.
    pub fn tier(&self, tier: StrategyTier) -> Vec<&dyn ExtractionStrategy> {
        let mut selected: Vec<&dyn ExtractionStrategy> = Vec::new();
        for strategy in &self.strategies {
            if strategy.tier() == tier {
                selected.push(strategy.as_ref());
            }
        }
        selected
    }

    /// Names of all registered strategies, in rank order.
    pub fn names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_order() {
        let registry = StrategyRegistry::new(&TopicConfig::default()).unwrap();
        assert_eq!(
            registry.names(),
            vec![
                "naver_sds_structure_v2",
                "backup_news_tit_v2",
                "backup_sds_span_v2",
                "backup_topic_anchor_v2",
            ]
        );

        let primary: Vec<_> = registry
            .tier(StrategyTier::Primary)
            .iter()
            .map(|s| s.name())
            .collect();
        assert_eq!(primary, vec!["naver_sds_structure_v2"]);
        assert_eq!(registry.tier(StrategyTier::Backup).len(), 3);
    }

    #[test]
    fn backup_names_are_distinct() {
        let registry = StrategyRegistry::new(&TopicConfig::default()).unwrap();
        let backups = registry.tier(StrategyTier::Backup);
        let mut names: Vec<_> = backups.iter().map(|s| s.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 3);
    }

    #[test]
    fn loose_terms_must_not_be_empty() {
        let topic = TopicConfig {
            loose_terms: vec![],
            ..TopicConfig::default()
        };
        assert!(StrategyRegistry::new(&topic).is_err());
    }
}
