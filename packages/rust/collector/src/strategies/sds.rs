//! Primary strategy for the current Naver "SDS" results markup.
//!
//! Every news item is rendered inside a `div` whose class list carries the
//! obfuscated wrapper class below. Inside a block the headline sits in an
//! `a[nocr=1][target=_blank]` around a `headline1` span; summary, press and
//! thumbnail are optional.

use regex::Regex;
use std::sync::LazyLock;

use super::{ExtractionStrategy, RawItem, StrategyTier};
use crate::text::normalize_text;

/// Opening tag of one result block.
static BLOCK_START_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<div[^>]*class="[^"]*JYgn_vFQHubpClbvwVL_[^"]*"[^>]*>"#)
        .expect("block start regex")
});

/// Three consecutive closing divs end the block when no next block comes first.
static BLOCK_END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</div>\s*</div>\s*</div>").expect("block end regex"));

/// Headline anchor: captures `href` and the headline span's inner HTML.
static HEADLINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)<a[^>]*nocr="1"[^>]*href="([^"]*)"[^>]*target="_blank"[^>]*>[\s\S]*?<span[^>]*class="[^"]*sds-comps-text-type-headline1[^"]*"[^>]*>([\s\S]*?)</span>"#,
    )
    .expect("headline regex")
});

static SUMMARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<span[^>]*class="[^"]*sds-comps-text-type-body1[^"]*"[^>]*>([\s\S]*?)</span>"#)
        .expect("summary regex")
});

static PRESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)<span[^>]*class="[^"]*sds-comps-text-type-body2[^"]*sds-comps-text-weight-sm[^"]*"[^>]*>([^<]+)</span>"#,
    )
    .expect("press regex")
});

static THUMBNAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img[^>]*width="104"[^>]*src="([^"]*)"[^>]*>"#).expect("thumbnail regex")
});

/// Structural extraction over SDS result blocks.
pub struct SdsBlockStrategy;

impl ExtractionStrategy for SdsBlockStrategy {
    fn name(&self) -> &str {
        "naver_sds_structure_v2"
    }

    fn tier(&self) -> StrategyTier {
        StrategyTier::Primary
    }

    fn extract(&self, html: &str) -> Vec<RawItem> {
        split_blocks(html)
            .into_iter()
            .filter_map(parse_block)
            .collect()
    }
}

/// Slice the page into result blocks, in document order.
///
/// A block runs from the end of its opening tag to whichever comes first:
/// the next block's opening tag or a `</div></div></div>` run. A last block
/// with neither runs to the end of the input.
fn split_blocks(html: &str) -> Vec<&str> {
    let starts: Vec<_> = BLOCK_START_RE.find_iter(html).collect();
    let mut blocks = Vec::with_capacity(starts.len());

    for (i, start) in starts.iter().enumerate() {
        let body_start = start.end();
        let next_block = starts.get(i + 1).map_or(html.len(), |m| m.start());
        let body_end = BLOCK_END_RE
            .find_at(html, body_start)
            .map(|m| m.start())
            .filter(|&end| end < next_block)
            .unwrap_or(next_block);
        blocks.push(&html[body_start..body_end]);
    }

    blocks
}

/// Pull one item out of a block; `None` when the headline anchor is missing.
fn parse_block(block: &str) -> Option<RawItem> {
    let headline = HEADLINE_RE.captures(block)?;
    let url = headline[1].to_string();
    let title = normalize_text(&headline[2]);

    let summary = SUMMARY_RE
        .captures(block)
        .map(|c| normalize_text(&c[1]))
        .filter(|s| !s.is_empty());

    let press = PRESS_RE
        .captures(block)
        .map(|c| normalize_text(&c[1]))
        .filter(|s| !s.is_empty());

    let thumbnail_url = THUMBNAIL_RE
        .captures(block)
        .map(|c| c[1].to_string())
        .filter(|s| !s.is_empty());

    Some(RawItem {
        url,
        title,
        summary,
        press,
        thumbnail_url,
    })
}
