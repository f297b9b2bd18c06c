//! Markup-to-text normalization for extracted fragments.

use regex::Regex;
use std::sync::LazyLock;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag regex"));

static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&[^;]+;").expect("entity regex"));

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Turn a raw HTML fragment into a single line of plain text.
///
/// Tags are dropped, every entity becomes one space, whitespace runs collapse
/// to a single space, and the result is trimmed. Entities are not decoded.
pub fn normalize_text(html: &str) -> String {
    let without_tags = TAG_RE.replace_all(html, "");
    let without_entities = ENTITY_RE.replace_all(&without_tags, " ");
    let collapsed = WHITESPACE_RE.replace_all(&without_entities, " ");
    collapsed.trim().to_string()
}

/// Keep at most `max_chars` characters of `s`.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
