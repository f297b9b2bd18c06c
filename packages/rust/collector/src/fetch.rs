//! Search-page fetcher.
//!
//! One request per page with a browser-like identity and a hard total
//! timeout. Failures are returned to the caller, which decides whether the
//! run continues; nothing is retried here.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, HeaderMap, HeaderValue};
use tracing::{debug, info, instrument};

use solonews_shared::{Result, SearchTarget, SoloNewsError};

/// Desktop Chrome identity; the search frontend serves reduced markup to unknown agents.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/139.0.0.0 Safari/537.36";

/// Maximum number of redirects to follow for a search page.
const MAX_REDIRECTS: usize = 5;

/// One page to fetch within a run.
#[derive(Debug, Clone)]
pub struct PageRequest {
    /// 1-based position of the page in the run.
    pub page: usize,
    /// Query and offset this page was rendered from.
    pub target: SearchTarget,
    /// Fully rendered URL.
    pub url: String,
}

impl PageRequest {
    /// Build the request for `target`, rendering it through `url_template`.
    pub fn new(page: usize, target: SearchTarget, url_template: &str) -> Self {
        let url = target.render(url_template);
        Self { page, target, url }
    }

    /// Identifier used in run summaries and fetch errors.
    pub fn source_id(&self) -> String {
        format!("page-{}", self.page)
    }
}

/// A successfully fetched search page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub request: PageRequest,
    /// Decoded response body.
    pub body: String,
}

/// HTTP client wrapper for search pages.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    timeout: Duration,
}

impl Fetcher {
    /// Build a fetcher whose every request is capped at `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("ko-KR,ko;q=0.9,en;q=0.8"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(timeout)
            .build()
            .map_err(|e| SoloNewsError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, timeout })
    }

    /// Fetch one page. Timeout, transport errors and non-2xx statuses all
    /// surface as [`SoloNewsError::Fetch`] tagged with the page's source id.
    #[instrument(skip_all, fields(page = request.page, url = %request.url))]
    pub async fn fetch(&self, request: PageRequest) -> Result<FetchedPage> {
        let source_id = request.source_id();
        debug!("fetching search page");

        let response = self
            .client
            .get(&request.url)
            .send()
            .await
            .map_err(|e| SoloNewsError::fetch(&source_id, self.describe(&request.url, &e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SoloNewsError::fetch(
                &source_id,
                format!("{}: HTTP {status}", request.url),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SoloNewsError::fetch(&source_id, self.describe(&request.url, &e)))?;

        info!(bytes = body.len(), "search page fetched");
        Ok(FetchedPage { request, body })
    }

    fn describe(&self, url: &str, err: &reqwest::Error) -> String {
        if err.is_timeout() {
            format!("{url}: timed out after {}ms", self.timeout.as_millis())
        } else {
            format!("{url}: {err}")
        }
    }
}
