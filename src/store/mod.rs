//! Persistence collaborator interface
//!
//! The core treats storage as a document store with per-entity upsert and
//! find-by-filter semantics; no transactions are assumed across entities.
//! Updates are expressed as per-transition structs with named constructors
//! so an error path can never clobber an item's last-known-good fields.

pub mod memory;

pub use memory::MemoryStore;

use crate::extract::ProductRecord;
use crate::types::{
    AlertId, AlertRule, ItemId, ItemStatus, JobLogEntry, NotificationEvent, PricePoint,
    RequestId, SearchCandidate, SearchRequest, SearchStatus, TrackedItem,
};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// State written back to a tracked item after one check.
///
/// `status`, `last_checked` and `blocked_reason` are applied on every path
/// (a `None` reason clears any previous one); the product fields are only
/// applied when present, so failures keep the last-known-good data.
#[derive(Debug, Clone)]
pub struct ItemUpdate {
    pub status: ItemStatus,
    pub last_checked: DateTime<Utc>,
    pub blocked_reason: Option<String>,
    pub title: Option<String>,
    pub image: Option<String>,
    pub current_price: Option<f64>,
    pub currency: Option<String>,
    /// `Some(v)` overwrites the stored reference price with `v`
    pub reference_price: Option<Option<f64>>,
}

impl ItemUpdate {
    /// Fetch or pipeline failure: only status and check time move
    pub fn status_only(status: ItemStatus, at: DateTime<Utc>) -> Self {
        Self {
            status,
            last_checked: at,
            blocked_reason: None,
            title: None,
            image: None,
            current_price: None,
            currency: None,
            reference_price: None,
        }
    }

    /// Blocked before anything could be extracted
    pub fn blocked(reason: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            blocked_reason: Some(reason.into()),
            ..Self::status_only(ItemStatus::Blocked, at)
        }
    }

    /// Blocked because no price was detectable; keep whatever metadata the
    /// adapter did manage to find
    pub fn blocked_with_metadata(
        reason: impl Into<String>,
        record: &ProductRecord,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            blocked_reason: Some(reason.into()),
            title: record.title.clone(),
            image: record.image.clone(),
            currency: Some(record.currency.clone()),
            ..Self::status_only(ItemStatus::Blocked, at)
        }
    }

    /// Successful check: full snapshot, clearing any block reason
    pub fn checked(record: &ProductRecord, status: ItemStatus, at: DateTime<Utc>) -> Self {
        Self {
            status,
            last_checked: at,
            blocked_reason: None,
            title: record.title.clone(),
            image: record.image.clone(),
            current_price: record.price,
            currency: Some(record.currency.clone()),
            reference_price: Some(record.reference_price),
        }
    }
}

/// Owner-editable alert fields; `None` leaves a field unchanged, an inner
/// `None` clears it. A patch may never clear both trigger conditions.
#[derive(Debug, Clone, Default)]
pub struct AlertPatch {
    pub target_price: Option<Option<f64>>,
    pub discount_threshold: Option<Option<f64>>,
    pub notify_once: Option<bool>,
    pub is_active: Option<bool>,
}

/// State written back to a search request on each transition.
///
/// `error_message`, `blocked_reason` and `next_retry_at` are applied on
/// every transition so stale reasons never outlive the state they described.
#[derive(Debug, Clone)]
pub struct SearchRequestUpdate {
    pub status: SearchStatus,
    pub updated_at: DateTime<Utc>,
    /// `Some` replaces the ranked results
    pub results: Option<Vec<SearchCandidate>>,
    /// `Some` records the user's pick
    pub selected_url: Option<String>,
    pub error_message: Option<String>,
    pub blocked_reason: Option<String>,
    pub next_retry_at: Option<DateTime<Utc>>,
}

impl SearchRequestUpdate {
    fn bare(status: SearchStatus, at: DateTime<Utc>) -> Self {
        Self {
            status,
            updated_at: at,
            results: None,
            selected_url: None,
            error_message: None,
            blocked_reason: None,
            next_retry_at: None,
        }
    }

    pub fn searching(at: DateTime<Utc>) -> Self {
        Self::bare(SearchStatus::Searching, at)
    }

    pub fn options_found(results: Vec<SearchCandidate>, at: DateTime<Utc>) -> Self {
        Self {
            results: Some(results),
            ..Self::bare(SearchStatus::OptionsFound, at)
        }
    }

    pub fn blocked(
        reason: impl Into<String>,
        retry_at: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            blocked_reason: Some(reason.into()),
            next_retry_at: Some(retry_at),
            ..Self::bare(SearchStatus::Blocked, at)
        }
    }

    pub fn errored(
        message: impl Into<String>,
        retry_at: Option<DateTime<Utc>>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            error_message: Some(message.into()),
            next_retry_at: retry_at,
            ..Self::bare(SearchStatus::Error, at)
        }
    }

    pub fn fulfilled(selected_url: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            selected_url: Some(selected_url.into()),
            ..Self::bare(SearchStatus::Fulfilled, at)
        }
    }
}

/// Document-store collaborator consumed by the pipeline
#[async_trait]
pub trait Store: Send + Sync {
    // -- tracked items ------------------------------------------------------

    /// Insert a new item; fails if the owner already tracks the URL
    async fn insert_item(&self, item: TrackedItem) -> Result<()>;

    async fn find_item(&self, id: &ItemId) -> Result<Option<TrackedItem>>;

    /// All tracked items, every cycle; cooldown filtering is scheduler policy
    async fn find_items_needing_check(&self) -> Result<Vec<TrackedItem>>;

    async fn upsert_item_state(&self, id: &ItemId, update: ItemUpdate) -> Result<()>;

    /// Delete an item and cascade to its price points, alerts and
    /// notifications; no orphans survive
    async fn delete_item(&self, id: &ItemId) -> Result<()>;

    // -- price history ------------------------------------------------------

    async fn append_price_point(&self, point: PricePoint) -> Result<()>;

    /// Observations for an item ordered by timestamp, optionally bounded
    async fn price_history(
        &self,
        item_id: &ItemId,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<PricePoint>>;

    // -- alerts -------------------------------------------------------------

    async fn insert_alert(&self, alert: AlertRule) -> Result<()>;

    async fn find_active_alerts(&self, item_id: &ItemId) -> Result<Vec<AlertRule>>;

    /// Apply an owner's edits; fails if the patch would leave the rule with
    /// neither a target price nor a discount threshold
    async fn update_alert(&self, id: &AlertId, patch: AlertPatch) -> Result<()>;

    async fn mark_alert_notified(&self, id: &AlertId) -> Result<()>;

    /// Re-arm a notify-once rule so it may fire again
    async fn reset_alert_notified(&self, id: &AlertId) -> Result<()>;

    // -- notifications ------------------------------------------------------

    async fn append_notification(&self, event: NotificationEvent) -> Result<()>;

    async fn notifications_for_owner(&self, owner: &str) -> Result<Vec<NotificationEvent>>;

    async fn mark_notifications_read(&self, owner: &str) -> Result<usize>;

    async fn purge_notifications(&self, owner: &str) -> Result<usize>;

    // -- search requests ----------------------------------------------------

    async fn insert_search_request(&self, request: SearchRequest) -> Result<()>;

    async fn find_search_request(&self, id: &RequestId) -> Result<Option<SearchRequest>>;

    /// Pending/blocked requests, oldest update first, at most `limit`
    async fn find_pending_search_requests(&self, limit: usize) -> Result<Vec<SearchRequest>>;

    async fn upsert_search_request_state(
        &self,
        id: &RequestId,
        update: SearchRequestUpdate,
    ) -> Result<()>;

    // -- owners & audit -----------------------------------------------------

    /// Deliverable email address for an owner, when one is on file
    async fn find_owner_email(&self, owner: &str) -> Result<Option<String>>;

    async fn append_job_log(&self, entry: JobLogEntry) -> Result<()>;
}
