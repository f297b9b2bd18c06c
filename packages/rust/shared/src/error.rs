//! Error types for solonews.
//!
//! Library crates use [`SoloNewsError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all solonews operations.
#[derive(Debug, thiserror::Error)]
pub enum SoloNewsError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// A single search page could not be fetched.
    #[error("fetch failed for {source_id}: {message}")]
    Fetch { source_id: String, message: String },

    /// Network setup error (client construction and similar).
    #[error("network error: {0}")]
    Network(String),

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SoloNewsError>;

impl SoloNewsError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a fetch failure for the page identified by `source_id`.
    pub fn fetch(source_id: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Fetch {
            source_id: source_id.into(),
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// The page identifier carried by a fetch failure, if this is one.
    pub fn source_id(&self) -> Option<&str> {
        match self {
            Self::Fetch { source_id, .. } => Some(source_id),
            _ => None,
        }
    }
}
