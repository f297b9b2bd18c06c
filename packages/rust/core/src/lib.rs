//! Core pipeline orchestration for solonews.
//!
//! This crate ties together page fetching, article extraction, and storage
//! into the end-to-end `collect` workflow ([`run_collection`]).

pub mod persist;
pub mod pipeline;

pub use persist::{ArticleStore, PersistReport, insert_all};
pub use pipeline::{
    CollectionOutcome, Collector, ProgressReporter, SilentProgress, run_collection,
};
