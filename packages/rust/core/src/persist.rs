//! Writing extracted candidates to an article store.

use tracing::{debug, info, warn};

use solonews_shared::{CandidateArticle, InsertOutcome, Result};
use solonews_storage::Storage;

/// Anything that can take a candidate article and report what happened.
#[allow(async_fn_in_trait)]
pub trait ArticleStore {
    /// Insert one article. Duplicates are an outcome, not an error.
    async fn insert_article(&self, article: &CandidateArticle) -> Result<InsertOutcome>;
}

impl ArticleStore for Storage {
    async fn insert_article(&self, article: &CandidateArticle) -> Result<InsertOutcome> {
        Storage::insert_article(self, article).await
    }
}

/// Per-run insert tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistReport {
    pub inserted: usize,
    pub duplicates: usize,
    pub failed: usize,
}

impl PersistReport {
    /// Candidates that did not produce a new row.
    pub fn skipped(&self) -> usize {
        self.duplicates + self.failed
    }
}

/// Insert candidates one at a time, in order. Individual failures are
/// logged and counted; they never abort the batch.
pub async fn insert_all<S: ArticleStore>(
    store: &S,
    candidates: &[CandidateArticle],
) -> PersistReport {
    let mut report = PersistReport::default();

    for candidate in candidates {
        match store.insert_article(candidate).await {
            Ok(InsertOutcome::Inserted) => report.inserted += 1,
            Ok(InsertOutcome::Duplicate) => {
                debug!(hash = %candidate.hash, "duplicate skipped");
                report.duplicates += 1;
            }
            Err(e) => {
                warn!(url = %candidate.original_url, error = %e, "failed to store article");
                report.failed += 1;
            }
        }
    }

    info!(
        inserted = report.inserted,
        duplicates = report.duplicates,
        failed = report.failed,
        "articles persisted"
    );
    report
}
