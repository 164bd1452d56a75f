//! Search-request processing and fulfillment

use super::CycleRunner;
use crate::search::SearchError;
use crate::store::SearchRequestUpdate;
use crate::types::{
    JobKind, JobLogEntry, JobOutcome, Platform, RequestId, SearchRequest, TrackedItem,
};
use anyhow::Result;
use chrono::{Duration as ChronoDuration, Utc};
use tracing::{debug, info, warn};

/// Queries shorter than this can't rank anything meaningfully
const MIN_QUERY_LEN: usize = 3;

impl CycleRunner {
    /// Create a search request in `pending` state. It is picked up by the
    /// next cycle's batch, or can be processed immediately via
    /// [`process_one_request`](CycleRunner::process_one_request).
    pub async fn create_search_request(
        &self,
        owner: impl Into<String>,
        platform: Platform,
        query: &str,
        location: Option<String>,
        max_price: Option<f64>,
        limit: Option<usize>,
    ) -> Result<SearchRequest> {
        let query = query.trim();
        if query.len() < MIN_QUERY_LEN {
            anyhow::bail!("query too short");
        }
        let limit = limit.unwrap_or_else(|| self.engine.default_limit());
        let request = SearchRequest::new(owner, platform, query, location, max_price, limit);
        self.store.insert_search_request(request.clone()).await?;
        Ok(request)
    }

    /// Run the search for one request and persist its state transition.
    ///
    /// Requests whose `next_retry_at` lies in the future are left untouched.
    pub async fn process_one_request(&self, request: &SearchRequest) -> Result<()> {
        let now = Utc::now();
        if let Some(retry_at) = request.next_retry_at {
            if retry_at > now {
                debug!(request = %request.id, %retry_at, "retry window not reached");
                return Ok(());
            }
        }

        self.store
            .upsert_search_request_state(&request.id, SearchRequestUpdate::searching(now))
            .await?;

        let outcome = self
            .engine
            .search(
                request.platform,
                &request.query,
                request.location.as_deref(),
                request.max_price,
                request.limit,
            )
            .await;

        let retry_at = Utc::now()
            + ChronoDuration::seconds(self.config.request_retry_cooldown_secs as i64);

        match outcome {
            Ok(ranked) => {
                // an empty ranked list is still options_found: the search
                // worked, nothing survived the relevance filter
                let kept = ranked.len();
                self.store
                    .upsert_search_request_state(
                        &request.id,
                        SearchRequestUpdate::options_found(ranked, Utc::now()),
                    )
                    .await?;
                info!(request = %request.id, kept, "search request resolved");
                self.log_request(request, JobOutcome::Ok, Some(format!("kept={kept}")))
                    .await;
            }
            Err(SearchError::Blocked(reason)) => {
                self.store
                    .upsert_search_request_state(
                        &request.id,
                        SearchRequestUpdate::blocked(reason.as_str(), retry_at, Utc::now()),
                    )
                    .await?;
                self.log_request(request, JobOutcome::Blocked, Some(reason.as_str().to_string()))
                    .await;
            }
            Err(e @ (SearchError::EmptyQuery | SearchError::SearchNotSupported(_))) => {
                // malformed input: no retry will fix it
                self.store
                    .upsert_search_request_state(
                        &request.id,
                        SearchRequestUpdate::errored(e.to_string(), None, Utc::now()),
                    )
                    .await?;
                self.log_request(request, JobOutcome::Error, Some(e.to_string())).await;
            }
            Err(SearchError::Fetch(e)) => {
                self.store
                    .upsert_search_request_state(
                        &request.id,
                        SearchRequestUpdate::errored(e.to_string(), Some(retry_at), Utc::now()),
                    )
                    .await?;
                self.log_request(request, JobOutcome::Error, Some(e.to_string())).await;
            }
        }

        Ok(())
    }

    /// Drain one bounded batch of pending/blocked requests, oldest first.
    /// A failing request never stops the rest of the batch.
    pub async fn process_pending_requests(&self) -> Result<usize> {
        let batch = self
            .store
            .find_pending_search_requests(self.config.search_batch_size)
            .await?;

        let mut processed = 0;
        for request in batch {
            match self.process_one_request(&request).await {
                Ok(()) => processed += 1,
                Err(e) => warn!(request = %request.id, error = %e, "request processing failed"),
            }
        }
        Ok(processed)
    }

    /// Record the user's pick and spawn a tracked item for it. The new item
    /// re-enters the normal tracked-item flow from the next cycle (or an
    /// explicit force recheck by the caller).
    pub async fn fulfill_request(
        &self,
        id: &RequestId,
        selected_url: &str,
    ) -> Result<TrackedItem> {
        let Some(request) = self.store.find_search_request(id).await? else {
            anyhow::bail!("search request {} not found", id);
        };
        let selected_url = selected_url.trim();
        if !selected_url.starts_with("http") {
            anyhow::bail!("invalid selected URL");
        }

        self.store
            .upsert_search_request_state(
                id,
                SearchRequestUpdate::fulfilled(selected_url, Utc::now()),
            )
            .await?;

        self.track_item(request.owner.clone(), request.platform, selected_url)
            .await
    }

    async fn log_request(&self, request: &SearchRequest, outcome: JobOutcome, detail: Option<String>) {
        let entry = JobLogEntry::new(
            JobKind::SearchRequest,
            Some(request.platform),
            Some(request.id.to_string()),
            outcome,
            detail,
        );
        if let Err(e) = self.store.append_job_log(entry).await {
            warn!(request = %request.id, error = %e, "job log append failed");
        }
    }
}
