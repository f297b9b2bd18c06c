//! Shared types, error model, and configuration for solonews.
//!
//! This crate is the foundation depended on by all other solonews crates.
//! It provides:
//! - [`SoloNewsError`] — the unified error type
//! - Domain types ([`CandidateArticle`], [`RawMeta`], [`CollectionSummary`])
//! - Configuration ([`AppConfig`], [`CollectConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CollectConfig, CollectionConfig, DEFAULT_URL_TEMPLATE, StorageConfig, TopicConfig,
    config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{Result, SoloNewsError};
pub use types::{
    ArticleStatus, CandidateArticle, CollectionRequest, CollectionSummary, DEFAULT_MAX_ITEMS,
    InsertOutcome, MAX_AUTHOR_CHARS, MAX_ITEMS_CAP, MAX_SUMMARY_CHARS, MAX_TITLE_CHARS, RawMeta,
    SearchTarget, SourceError,
};
