//! Turns fetched result pages into validated, fingerprinted candidates.
//!
//! The primary tier always runs. The backup tier runs on a page only while
//! the run as a whole has accepted fewer than [`BACKUP_THRESHOLD`]
//! candidates, so healthy primary extraction is never diluted by noisy
//! anchor matches.

use std::collections::HashSet;

use chrono::Utc;
use tracing::{debug, info};

use solonews_shared::{
    ArticleStatus, CandidateArticle, MAX_AUTHOR_CHARS, MAX_SUMMARY_CHARS, MAX_TITLE_CHARS,
    RawMeta, Result, TopicConfig,
};

use crate::fingerprint::fingerprint;
use crate::relevance::RelevanceValidator;
use crate::strategies::{ExtractionStrategy, RawItem, StrategyRegistry, StrategyTier};
use crate::text::truncate_chars;

/// Backups run while fewer than this many candidates have been accepted.
pub const BACKUP_THRESHOLD: usize = 3;

/// A primary summary shorter than this (in characters) is replaced by the title.
const MIN_SUMMARY_CHARS: usize = 10;

/// Backup hits must have titles strictly shorter than this.
const BACKUP_MAX_TITLE_CHARS: usize = 200;

/// Backup summaries (copied from the title) are cut to this length.
const BACKUP_MAX_SUMMARY_CHARS: usize = 200;

/// Backup hits must have titles strictly longer than this.
const BACKUP_MIN_TITLE_CHARS: usize = 5;

/// The page being extracted and where it sits in the run.
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    /// 1-based page index within the run.
    pub page: usize,
    /// Query that produced the page.
    pub search_keyword: &'a str,
    /// Raw page body.
    pub html: &'a str,
}

/// Run-wide extraction state: accepted count and fingerprints seen so far.
#[derive(Debug, Default)]
pub struct RunLedger {
    accepted: usize,
    seen: HashSet<String>,
}

impl RunLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Candidates accepted so far in this run.
    pub fn accepted(&self) -> usize {
        self.accepted
    }

    fn admit(&mut self, hash: &str) -> bool {
        if self.seen.insert(hash.to_string()) {
            self.accepted += 1;
            true
        } else {
            false
        }
    }
}

/// Applies the strategy cascade, relevance rules and fingerprinting to pages.
pub struct Extractor {
    registry: StrategyRegistry,
    validator: RelevanceValidator,
    default_author: String,
}

impl Extractor {
    /// Create an extractor with the built-in strategies for `topic`.
    pub fn new(topic: &TopicConfig) -> Result<Self> {
        let registry = StrategyRegistry::new(topic)?;
        debug!(strategies = ?registry.names(), "extraction strategies registered");
        Ok(Self::with_registry(registry, topic))
    }

    /// Create an extractor over a custom strategy list.
    pub fn with_registry(registry: StrategyRegistry, topic: &TopicConfig) -> Self {
        Self {
            registry,
            validator: RelevanceValidator::new(topic),
            default_author: topic.default_author.clone(),
        }
    }

    /// Extract at most `budget` new candidates from one page, in discovery order.
    pub fn extract(
        &self,
        page: &PageContext<'_>,
        budget: usize,
        ledger: &mut RunLedger,
    ) -> Vec<CandidateArticle> {
        let mut out = Vec::new();

        for strategy in self.registry.tier(StrategyTier::Primary) {
            self.run_strategy(strategy, page, budget, ledger, &mut out);
        }

        if ledger.accepted() < BACKUP_THRESHOLD {
            debug!(
                page = page.page,
                accepted = ledger.accepted(),
                "low yield, trying backup patterns"
            );
            for strategy in self.registry.tier(StrategyTier::Backup) {
                self.run_strategy(strategy, page, budget, ledger, &mut out);
            }
        }

        info!(page = page.page, extracted = out.len(), "page extracted");
        out
    }

    fn run_strategy(
        &self,
        strategy: &dyn ExtractionStrategy,
        page: &PageContext<'_>,
        budget: usize,
        ledger: &mut RunLedger,
        out: &mut Vec<CandidateArticle>,
    ) {
        if out.len() >= budget {
            return;
        }

        let hits = strategy.extract(page.html);
        debug!(strategy = strategy.name(), hits = hits.len(), "strategy matched");

        for item in hits {
            if out.len() >= budget {
                break;
            }
            let Some(candidate) = self.build_candidate(strategy, item, page) else {
                continue;
            };
            if !ledger.admit(&candidate.hash) {
                debug!(hash = %candidate.hash, "already collected this run");
                continue;
            }
            debug!(
                strategy = strategy.name(),
                title = %truncate_chars(&candidate.title, 60),
                author = %candidate.author,
                "candidate accepted"
            );
            out.push(candidate);
        }
    }

    /// Normalize limits, validate, and stamp one hit. `None` means rejected.
    fn build_candidate(
        &self,
        strategy: &dyn ExtractionStrategy,
        item: RawItem,
        page: &PageContext<'_>,
    ) -> Option<CandidateArticle> {
        let RawItem {
            url,
            title,
            summary,
            press,
            thumbnail_url,
        } = item;

        let (summary, author, press, thumbnail_url) = match strategy.tier() {
            StrategyTier::Primary => {
                let summary = summary
                    .filter(|s| s.chars().count() > MIN_SUMMARY_CHARS)
                    .map(|s| truncate_chars(&s, MAX_SUMMARY_CHARS))
                    .unwrap_or_else(|| title.clone());
                if !self.validator.is_valid(&title, Some(summary.as_str()), &url) {
                    return None;
                }
                let author = press.clone().unwrap_or_else(|| self.default_author.clone());
                (summary, author, press, thumbnail_url)
            }
            StrategyTier::Backup => {
                let title_len = title.chars().count();
                if title_len <= BACKUP_MIN_TITLE_CHARS || title_len >= BACKUP_MAX_TITLE_CHARS {
                    return None;
                }
                if !self.validator.is_valid(&title, Some(title.as_str()), &url) {
                    return None;
                }
                let summary = truncate_chars(&title, BACKUP_MAX_SUMMARY_CHARS);
                (summary, self.default_author.clone(), None, None)
            }
        };

        let hash = fingerprint(&url, &title);
        let now = Utc::now();

        Some(CandidateArticle {
            title: truncate_chars(&title, MAX_TITLE_CHARS),
            summary: truncate_chars(&summary, MAX_SUMMARY_CHARS),
            original_url: url.clone(),
            canonical_url: url,
            author: truncate_chars(&author, MAX_AUTHOR_CHARS),
            published_at: now,
            fetched_at: now,
            status: ArticleStatus::Pending,
            raw_meta: RawMeta {
                scrape_method: strategy.name().to_string(),
                search_keyword: page.search_keyword.to_string(),
                page: page.page,
                press,
                thumbnail_url,
            },
            hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> Extractor {
        Extractor::new(&TopicConfig::default()).unwrap()
    }

    fn sds_block(href: &str, title: &str, extra: &str) -> String {
        format!(
            r#"<div class="news_wrap JYgn_vFQHubpClbvwVL_"><div class="inner"><a nocr="1" href="{href}" target="_blank"><span class="sds-comps-text-type-headline1">{title}</span></a>{extra}</div>"#
        )
    }

    fn page(html: &str) -> PageContext<'_> {
        PageContext {
            page: 1,
            search_keyword: "나는 솔로",
            html,
        }
    }

    fn page_of_blocks(count: usize) -> String {
        let blocks: String = (0..count)
            .map(|i| sds_block(&format!("https://example.com/{i}"), &format!("나는솔로 기사 {i}번"), ""))
            .collect();
        format!("<main>{blocks}</div></div></div></main>")
    }

    #[test]
    fn single_block_scenario() {
        let html = sds_block("https://example.com/a", "나는솔로 출연자 근황 공개", "");
        let mut ledger = RunLedger::new();
        let out = extractor().extract(&page(&html), 20, &mut ledger);

        assert_eq!(out.len(), 1);
        let article = &out[0];
        assert_eq!(article.title, "나는솔로 출연자 근황 공개");
        assert_eq!(article.original_url, "https://example.com/a");
        assert_eq!(article.canonical_url, "https://example.com/a");
        assert_eq!(article.status, ArticleStatus::Pending);
        assert_eq!(article.hash.len(), 64);
        assert_eq!(
            article.hash,
            "1231a9ee14183fd7e087da94f71b036b3c82889fcd782b743e4eac31b9da4027"
        );
        // No summary, no press: both fall back.
        assert_eq!(article.summary, article.title);
        assert_eq!(article.author, "네이버뉴스");
        assert_eq!(article.raw_meta.scrape_method, "naver_sds_structure_v2");
        assert_eq!(article.raw_meta.search_keyword, "나는 솔로");
        assert_eq!(article.raw_meta.page, 1);
        assert_eq!(ledger.accepted(), 1);
    }

    #[test]
    fn short_summary_falls_back_to_title() {
        let html = sds_block(
            "https://example.com/s",
            "나는솔로 22기 방송 리뷰",
            r#"<span class="sds-comps-text-type-body1">짧은 요약</span>"#,
        );
        let out = extractor().extract(&page(&html), 5, &mut RunLedger::new());
        assert_eq!(out[0].summary, "나는솔로 22기 방송 리뷰");
    }

    #[test]
    fn long_summary_is_truncated_and_press_kept() {
        let long_summary = "요약".repeat(200);
        let html = sds_block(
            "https://example.com/l",
            "나는솔로 긴 요약 기사",
            &format!(
                r#"<span class="sds-comps-text-type-body1">{long_summary}</span><span class="sds-comps-text-type-body2 sds-comps-text-weight-sm">텐아시아</span>"#
            ),
        );
        let out = extractor().extract(&page(&html), 5, &mut RunLedger::new());
        assert_eq!(out[0].summary.chars().count(), MAX_SUMMARY_CHARS);
        assert_eq!(out[0].author, "텐아시아");
        assert_eq!(out[0].raw_meta.press.as_deref(), Some("텐아시아"));
    }

    #[test]
    fn summary_can_carry_the_topic() {
        let html = sds_block(
            "https://example.com/t",
            "22기 영숙 결혼 발표",
            r#"<span class="sds-comps-text-type-body1">ENA 나는 솔로 22기 출연자 영숙이 결혼 소식을 전했다</span>"#,
        );
        let out = extractor().extract(&page(&html), 5, &mut RunLedger::new());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "22기 영숙 결혼 발표");
    }

    #[test]
    fn invalid_blocks_are_dropped_silently() {
        let html = [
            sds_block("https://example.com/ok", "나는솔로 정상 기사 제목", ""),
            sds_block("https://example.com/off", "다른 예능 프로그램 소식", ""),
            sds_block("https://search.naver.com/search.naver?q=x", "나는솔로 검색 링크", ""),
            sds_block("https://example.com/ad", "나는솔로 광고 기사 제목", ""),
        ]
        .concat();
        let out = extractor().extract(&page(&html), 20, &mut RunLedger::new());
        let urls: Vec<_> = out.iter().map(|a| a.original_url.as_str()).collect();
        // One valid primary hit leaves the run under the backup threshold, but
        // no backup pattern finds anything new either.
        assert!(urls.contains(&"https://example.com/ok"));
        assert!(!urls.contains(&"https://example.com/off"));
        assert!(!urls.iter().any(|u| u.contains("search.naver.com")));
        assert!(!urls.contains(&"https://example.com/ad"));
    }

    #[test]
    fn budget_is_respected() {
        let html = page_of_blocks(8);
        let out = extractor().extract(&page(&html), 5, &mut RunLedger::new());
        assert_eq!(out.len(), 5);

        let out = extractor().extract(&page(&html), 0, &mut RunLedger::new());
        assert!(out.is_empty());
    }

    #[test]
    fn primary_order_is_document_order() {
        let html = page_of_blocks(4);
        let out = extractor().extract(&page(&html), 10, &mut RunLedger::new());
        let urls: Vec<_> = out.iter().map(|a| a.original_url.clone()).collect();
        assert_eq!(
            urls,
            vec![
                "https://example.com/0",
                "https://example.com/1",
                "https://example.com/2",
                "https://example.com/3",
            ]
        );
        assert!(out.iter().all(|a| a.raw_meta.scrape_method == "naver_sds_structure_v2"));
    }

    #[test]
    fn backup_cascade_when_no_structural_blocks() {
        let html = r#"<html><body><ul>
<li><a href="https://example.com/b">나는솔로 인기 출연자 근황</a></li>
</ul></body></html>"#;
        let mut ledger = RunLedger::new();
        let out = extractor().extract(&page(html), 20, &mut ledger);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].original_url, "https://example.com/b");
        assert_eq!(out[0].raw_meta.scrape_method, "backup_topic_anchor_v2");
        assert_eq!(out[0].summary, out[0].title);
        assert_eq!(out[0].author, "네이버뉴스");
        assert!(out[0].raw_meta.press.is_none());
    }

    #[test]
    fn overlapping_backup_patterns_yield_one_candidate() {
        // Matched by both the blank-target span pattern and the topic anchor pattern.
        let html = r#"<div><a href="https://example.com/c" target="_blank"><span>나는솔로 24기 첫 방송</span></a></div>"#;
        let out = extractor().extract(&page(html), 20, &mut RunLedger::new());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].raw_meta.scrape_method, "backup_sds_span_v2");
    }

    #[test]
    fn backups_skipped_once_run_has_enough() {
        let html = r#"<a href="https://example.com/b">나는솔로 인기 출연자 근황</a>"#;
        let mut ledger = RunLedger::new();
        // Pretend three candidates were accepted on earlier pages.
        for i in 0..BACKUP_THRESHOLD {
            assert!(ledger.admit(&format!("earlier-{i}")));
        }
        let out = extractor().extract(&page(html), 20, &mut ledger);
        assert!(out.is_empty());
    }

    #[test]
    fn backup_titles_have_tighter_bounds() {
        let long_title = format!("나는솔로 {}", "가".repeat(200));
        let html = format!(r#"<a href="https://example.com/long">{long_title}</a>"#);
        let out = extractor().extract(&page(&html), 20, &mut RunLedger::new());
        assert!(out.is_empty());
    }

    #[test]
    fn repeated_page_is_not_collected_twice_in_one_run() {
        let html = page_of_blocks(2);
        let mut ledger = RunLedger::new();
        let first = extractor().extract(&page(&html), 10, &mut ledger);
        let second = extractor().extract(&page(&html), 10, &mut ledger);
        assert_eq!(first.len(), 2);
        assert!(second.is_empty());
        assert_eq!(ledger.accepted(), 2);
    }

    #[test]
    fn extraction_is_deterministic() {
        let html = page_of_blocks(3);
        let run = || {
            extractor()
                .extract(&page(&html), 10, &mut RunLedger::new())
                .into_iter()
                .map(|a| (a.title, a.original_url, a.hash))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }
}
