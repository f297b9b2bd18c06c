//! End-to-end `collect` pipeline: search pages → extract → persist → summary.

use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use solonews_collector::{Extractor, Fetcher, PageContext, PageRequest, RunLedger};
use solonews_shared::{
    CandidateArticle, CollectConfig, CollectionSummary, MAX_ITEMS_CAP, Result, SoloNewsError,
    SourceError,
};

use crate::persist::{ArticleStore, insert_all};

/// Everything a run extracted, before persistence.
#[derive(Debug, Default)]
pub struct CollectionOutcome {
    /// Candidates in discovery order.
    pub candidates: Vec<CandidateArticle>,
    /// One entry per page that could not be fetched.
    pub page_errors: Vec<SourceError>,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each page, fetched or not.
    fn page_done(&self, page: usize, total_pages: usize, found: usize);
    /// Called when the run completes.
    fn done(&self, summary: &CollectionSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn page_done(&self, _page: usize, _total_pages: usize, _found: usize) {}
    fn done(&self, _summary: &CollectionSummary) {}
}

/// Fetches and extracts the configured search pages.
pub struct Collector {
    config: CollectConfig,
    fetcher: Fetcher,
    extractor: Extractor,
}

impl Collector {
    /// Validate `config` and build the HTTP client and strategy cascade.
    pub fn new(config: CollectConfig) -> Result<Self> {
        config.validate()?;
        let fetcher = Fetcher::new(config.timeout)?;
        let extractor = Extractor::new(&config.topic)?;
        Ok(Self {
            config,
            fetcher,
            extractor,
        })
    }

    /// Walk the search pages in order until `max_items` candidates are found.
    ///
    /// Pages are fetched one after another. A failed page is recorded in
    /// `page_errors` and the run moves on to the next one.
    #[instrument(skip_all, fields(max_items = max_items, pages = self.config.targets.len()))]
    pub async fn collect(
        &self,
        max_items: usize,
        progress: &dyn ProgressReporter,
    ) -> CollectionOutcome {
        let started = Instant::now();
        let total_pages = self.config.targets.len();
        let mut ledger = RunLedger::new();
        let mut outcome = CollectionOutcome::default();

        for (idx, target) in self.config.targets.iter().enumerate() {
            let page = idx + 1;

            if outcome.candidates.len() >= max_items {
                debug!(page, "item budget reached");
                break;
            }
            if let Some(deadline) = self.config.run_deadline.filter(|d| started.elapsed() >= *d) {
                warn!(
                    page,
                    skipped_pages = total_pages - idx,
                    deadline_ms = deadline.as_millis() as u64,
                    "run deadline passed, skipping remaining pages"
                );
                break;
            }

            let request = PageRequest::new(page, target.clone(), &self.config.url_template);
            match self.fetcher.fetch(request).await {
                Ok(fetched) => {
                    let context = PageContext {
                        page,
                        search_keyword: &fetched.request.target.query,
                        html: &fetched.body,
                    };
                    let budget = max_items - outcome.candidates.len();
                    let found = self.extractor.extract(&context, budget, &mut ledger);
                    progress.page_done(page, total_pages, found.len());
                    outcome.candidates.extend(found);
                }
                Err(e) => {
                    warn!(page, error = %e, "page failed, continuing with next page");
                    progress.page_done(page, total_pages, 0);
                    outcome.page_errors.push(source_error(page, e));
                }
            }
        }

        info!(
            candidates = outcome.candidates.len(),
            failed_pages = outcome.page_errors.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "collection finished"
        );
        outcome
    }
}

fn source_error(page: usize, err: SoloNewsError) -> SourceError {
    match err {
        SoloNewsError::Fetch { source_id, message } => SourceError { source_id, message },
        other => SourceError {
            source_id: format!("page-{page}"),
            message: other.to_string(),
        },
    }
}

/// Run one collection: fetch, extract, and persist up to `max_items` articles.
///
/// `max_items` is clamped to `1..=100`. Configuration problems fail the run;
/// page and record failures only show up in the summary.
#[instrument(skip_all, fields(requested = max_items))]
pub async fn run_collection<S: ArticleStore>(
    config: CollectConfig,
    max_items: usize,
    store: &S,
    progress: &dyn ProgressReporter,
) -> Result<CollectionSummary> {
    let max_items = max_items.clamp(1, MAX_ITEMS_CAP);
    info!(max_items, "starting collection");

    progress.phase("Preparing collector");
    let collector = Collector::new(config)?;

    progress.phase("Fetching search pages");
    let outcome = collector.collect(max_items, progress).await;

    progress.phase("Saving articles");
    let report = insert_all(store, &outcome.candidates).await;

    let summary = CollectionSummary {
        inserted: report.inserted,
        total: outcome.candidates.len(),
        skipped: report.skipped(),
        errors: outcome.page_errors,
    };

    info!(
        inserted = summary.inserted,
        total = summary.total,
        skipped = summary.skipped,
        errors = summary.errors.len(),
        "collection complete"
    );
    progress.done(&summary);
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::time::Duration;

    use solonews_shared::SearchTarget;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::persist::tests::MemoryStore;

    fn result_page(prefix: &str, count: usize) -> String {
        let blocks: String = (0..count)
            .map(|i| {
                format!(
                    r#"<div class="sds-comps-vertical-layout JYgn_vFQHubpClbvwVL_"><div><a nocr="1" href="https://news.example.com/{prefix}/{i}" target="_blank"><span class="sds-comps-text-type-headline1">나는솔로 {prefix} 소식 {i}</span></a></div>"#
                )
            })
            .collect();
        format!("<html><body>{blocks}</div></div></div></body></html>")
    }

    fn config_for(server: &MockServer) -> CollectConfig {
        CollectConfig {
            url_template: format!("{}/search?query={{query}}&start={{start}}", server.uri()),
            timeout: Duration::from_secs(5),
            ..CollectConfig::default()
        }
    }

    async fn mount_page(server: &MockServer, query: &str, start: &str, body: String) {
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("query", query))
            .and(query_param("start", start))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    async fn mount_failure(server: &MockServer, query: &str, start: &str) {
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("query", query))
            .and(query_param("start", start))
            .respond_with(ResponseTemplate::new(500))
            .mount(server)
            .await;
    }

    /// Default targets: (나솔, 1), (나는 솔로, 1), (나솔, 11). Page 2 fails.
    async fn server_with_failing_middle_page() -> MockServer {
        let server = MockServer::start().await;
        mount_page(&server, "나솔", "1", result_page("p1", 2)).await;
        mount_failure(&server, "나는 솔로", "1").await;
        mount_page(&server, "나솔", "11", result_page("p3", 2)).await;
        server
    }

    #[tokio::test]
    async fn partial_failure_still_collects_other_pages() {
        let server = server_with_failing_middle_page().await;
        let store = MemoryStore::default();

        let summary = run_collection(config_for(&server), 20, &store, &SilentProgress)
            .await
            .unwrap();

        assert_eq!(summary.total, 4);
        assert_eq!(summary.inserted, 4);
        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.errors[0].source_id, "page-2");
        assert!(summary.errors[0].message.contains("500"));
    }

    #[tokio::test]
    async fn second_run_is_idempotent() {
        let server = server_with_failing_middle_page().await;
        let store = MemoryStore::default();

        let first = run_collection(config_for(&server), 20, &store, &SilentProgress)
            .await
            .unwrap();
        let second = run_collection(config_for(&server), 20, &store, &SilentProgress)
            .await
            .unwrap();

        assert_eq!(second.inserted, 0);
        assert_eq!(second.skipped, first.inserted);
        assert_eq!(second.total, first.total);
        assert_eq!(second.inserted + second.skipped, second.total);
    }

    #[tokio::test]
    async fn budget_limits_total() {
        let server = server_with_failing_middle_page().await;
        let store = MemoryStore::default();

        let summary = run_collection(config_for(&server), 3, &store, &SilentProgress)
            .await
            .unwrap();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.inserted, 3);
    }

    #[tokio::test]
    async fn stops_fetching_once_budget_is_met() {
        let server = MockServer::start().await;
        mount_page(&server, "나솔", "1", result_page("p1", 6)).await;

        let collector = Collector::new(config_for(&server)).unwrap();
        let outcome = collector.collect(5, &SilentProgress).await;

        assert_eq!(outcome.candidates.len(), 5);
        // Pages 2 and 3 have no mocks; they were never requested.
        assert!(outcome.page_errors.is_empty());
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn runs_are_deterministic() {
        let server = server_with_failing_middle_page().await;
        let collector = Collector::new(config_for(&server)).unwrap();

        let key = |outcome: CollectionOutcome| {
            outcome
                .candidates
                .into_iter()
                .map(|c| (c.title, c.original_url, c.hash))
                .collect::<Vec<_>>()
        };
        let first = key(collector.collect(20, &SilentProgress).await);
        let second = key(collector.collect(20, &SilentProgress).await);
        assert_eq!(first, second);

        let urls: Vec<_> = first.iter().map(|(_, url, _)| url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://news.example.com/p1/0",
                "https://news.example.com/p1/1",
                "https://news.example.com/p3/0",
                "https://news.example.com/p3/1",
            ]
        );
    }

    #[tokio::test]
    async fn candidates_carry_page_provenance() {
        let server = server_with_failing_middle_page().await;
        let collector = Collector::new(config_for(&server)).unwrap();
        let outcome = collector.collect(20, &SilentProgress).await;

        let last = outcome.candidates.last().unwrap();
        assert_eq!(last.raw_meta.page, 3);
        assert_eq!(last.raw_meta.search_keyword, "나솔");
        let hashes: HashSet<_> = outcome.candidates.iter().map(|c| &c.hash).collect();
        assert_eq!(hashes.len(), outcome.candidates.len());
    }

    #[tokio::test]
    async fn every_page_failing_yields_empty_summary_with_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let store = MemoryStore::default();

        let summary = run_collection(config_for(&server), 20, &store, &SilentProgress)
            .await
            .unwrap();
        assert_eq!((summary.inserted, summary.total, summary.skipped), (0, 0, 0));
        let ids: Vec<_> = summary.errors.iter().map(|e| e.source_id.as_str()).collect();
        assert_eq!(ids, vec!["page-1", "page-2", "page-3"]);
    }

    #[tokio::test]
    async fn elapsed_deadline_skips_remaining_pages() {
        let server = MockServer::start().await;
        let config = CollectConfig {
            run_deadline: Some(Duration::ZERO),
            ..config_for(&server)
        };

        let collector = Collector::new(config).unwrap();
        let outcome = collector.collect(20, &SilentProgress).await;
        assert!(outcome.candidates.is_empty());
        assert!(outcome.page_errors.is_empty());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn max_items_is_clamped() {
        let server = MockServer::start().await;
        mount_page(&server, "나솔", "1", result_page("p1", 3)).await;
        let store = MemoryStore::default();

        let summary = run_collection(config_for(&server), 0, &store, &SilentProgress)
            .await
            .unwrap();
        assert_eq!(summary.total, 1);
    }

    #[tokio::test]
    async fn oversized_config_budget_does_not_block_an_explicit_one() {
        let server = MockServer::start().await;
        mount_page(&server, "나솔", "1", result_page("p1", 8)).await;

        let mut app = solonews_shared::AppConfig::default();
        app.collection.max_items = 500;
        app.collection.url_template =
            format!("{}/search?query={{query}}&start={{start}}", server.uri());

        let budget = app.collection.budget(Some(5));
        let store = MemoryStore::default();
        let summary = run_collection(CollectConfig::from(&app), budget, &store, &SilentProgress)
            .await
            .unwrap();
        assert_eq!(summary.total, 5);
        assert_eq!(summary.inserted, 5);
    }

    #[tokio::test]
    async fn invalid_config_fails_the_run() {
        let config = CollectConfig {
            targets: Vec::<SearchTarget>::new(),
            ..CollectConfig::default()
        };
        let err = run_collection(config, 20, &MemoryStore::default(), &SilentProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, SoloNewsError::Config { .. }));

        let zero_timeout = CollectConfig {
            timeout: Duration::ZERO,
            ..CollectConfig::default()
        };
        assert!(Collector::new(zero_timeout).is_err());
    }
}
