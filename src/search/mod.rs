//! Multi-page marketplace search
//!
//! Drives paged result collection through the polite fetcher, deduplicates
//! candidates by URL across pages, then hands the raw pool to the ranker.
//! Failure modes mirror the fetcher's: a block on any page aborts the whole
//! search as blocked; an HTTP error aborts as error.

pub mod jiji;
pub mod ranker;

use crate::config::SearchConfig;
use crate::fetch::{BlockReason, FetchError, FetchOutcome, PoliteFetcher};
use crate::types::{Platform, SearchCandidate};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Search failures surfaced to the request state machine
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("empty query")]
    EmptyQuery,
    #[error("platform {0} does not support search")]
    SearchNotSupported(Platform),
    #[error("search blocked: {0}")]
    Blocked(BlockReason),
    #[error("search fetch failed: {0}")]
    Fetch(#[from] FetchError),
}

/// Free-text search over a marketplace's result pages
pub struct SearchEngine {
    fetcher: Arc<PoliteFetcher>,
    config: SearchConfig,
}

impl SearchEngine {
    pub fn new(fetcher: Arc<PoliteFetcher>, config: SearchConfig) -> Self {
        Self { fetcher, config }
    }

    /// Result limit applied when a request does not carry one
    pub fn default_limit(&self) -> usize {
        self.config.default_limit
    }

    /// Collect, dedupe and rank candidates for a query.
    ///
    /// `limit` is clamped to 1..=100; malformed inputs are rejected before
    /// any network traffic.
    pub async fn search(
        &self,
        platform: Platform,
        query: &str,
        location: Option<&str>,
        max_price: Option<f64>,
        limit: usize,
    ) -> Result<Vec<SearchCandidate>, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        let limit = limit.clamp(1, 100);

        match platform {
            Platform::Jiji => self.search_jiji(query, location, max_price, limit).await,
            other => Err(SearchError::SearchNotSupported(other)),
        }
    }

    async fn search_jiji(
        &self,
        query: &str,
        location: Option<&str>,
        max_price: Option<f64>,
        limit: usize,
    ) -> Result<Vec<SearchCandidate>, SearchError> {
        let raw_target = self.config.raw_target(limit);
        let mut seen: HashSet<String> = HashSet::new();
        let mut raw: Vec<SearchCandidate> = Vec::new();

        for page in 1..=self.config.max_pages {
            let url = jiji::build_search_url(query, location, page);
            let body = match self.fetcher.fetch(&url).await {
                FetchOutcome::Success(body) => body,
                FetchOutcome::Blocked(reason) => return Err(SearchError::Blocked(reason)),
                FetchOutcome::Error(e) => return Err(SearchError::Fetch(e)),
            };

            let page_candidates = jiji::parse_search_results(&body);
            if page_candidates.is_empty() {
                debug!(page, "result page yielded no candidates, stopping");
                break;
            }

            for candidate in page_candidates {
                if seen.insert(candidate.url.clone()) {
                    raw.push(candidate);
                }
            }
            debug!(page, collected = raw.len(), "collected search page");

            if raw.len() >= self.config.hard_candidate_cap || raw.len() >= raw_target {
                break;
            }
        }

        let ranked = ranker::rank(raw, query, max_price, limit);
        info!(query, kept = ranked.len(), "search ranked");
        Ok(ranked)
    }
}
