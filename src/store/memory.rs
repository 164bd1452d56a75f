//! In-memory reference store
//!
//! Backs the test suite and the demo binary. Deployments plug a real
//! document store behind the same trait.

use super::{AlertPatch, ItemUpdate, SearchRequestUpdate, Store};
use crate::types::{
    AlertId, AlertRule, ItemId, JobLogEntry, NotificationEvent, PricePoint, RequestId,
    SearchRequest, SearchStatus, TrackedItem,
};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Default)]
struct Inner {
    items: HashMap<ItemId, TrackedItem>,
    prices: Vec<PricePoint>,
    alerts: HashMap<AlertId, AlertRule>,
    notifications: Vec<NotificationEvent>,
    requests: HashMap<RequestId, SearchRequest>,
    owner_emails: HashMap<String, String>,
    job_log: Vec<JobLogEntry>,
}

/// Thread-safe in-memory document store
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a deliverable email for an owner
    pub fn set_owner_email(&self, owner: impl Into<String>, email: impl Into<String>) {
        self.inner
            .write()
            .owner_emails
            .insert(owner.into(), email.into());
    }

    /// Job-log snapshot, oldest first (test observability)
    pub fn job_log(&self) -> Vec<JobLogEntry> {
        self.inner.read().job_log.clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_item(&self, item: TrackedItem) -> Result<()> {
        let mut inner = self.inner.write();
        if inner
            .items
            .values()
            .any(|i| i.owner == item.owner && i.url == item.url)
        {
            anyhow::bail!("owner {} is already tracking {}", item.owner, item.url);
        }
        inner.items.insert(item.id, item);
        Ok(())
    }

    async fn find_item(&self, id: &ItemId) -> Result<Option<TrackedItem>> {
        Ok(self.inner.read().items.get(id).cloned())
    }

    async fn find_items_needing_check(&self) -> Result<Vec<TrackedItem>> {
        let inner = self.inner.read();
        let mut items: Vec<TrackedItem> = inner.items.values().cloned().collect();
        items.sort_by_key(|i| i.created_at);
        Ok(items)
    }

    async fn upsert_item_state(&self, id: &ItemId, update: ItemUpdate) -> Result<()> {
        let mut inner = self.inner.write();
        let Some(item) = inner.items.get_mut(id) else {
            anyhow::bail!("tracked item {} not found", id);
        };

        item.status = update.status;
        item.last_checked = Some(update.last_checked);
        item.blocked_reason = update.blocked_reason;
        if let Some(title) = update.title {
            item.title = Some(title);
        }
        if let Some(image) = update.image {
            item.image = Some(image);
        }
        if let Some(price) = update.current_price {
            item.current_price = Some(price);
        }
        if let Some(currency) = update.currency {
            item.currency = Some(currency);
        }
        if let Some(reference) = update.reference_price {
            item.reference_price = reference;
        }
        Ok(())
    }

    async fn delete_item(&self, id: &ItemId) -> Result<()> {
        let mut inner = self.inner.write();
        inner.items.remove(id);
        inner.prices.retain(|p| p.item_id != *id);
        inner.alerts.retain(|_, a| a.item_id != *id);
        inner.notifications.retain(|n| n.item_id != *id);
        Ok(())
    }

    async fn append_price_point(&self, point: PricePoint) -> Result<()> {
        self.inner.write().prices.push(point);
        Ok(())
    }

    async fn price_history(
        &self,
        item_id: &ItemId,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<PricePoint>> {
        let inner = self.inner.read();
        let mut points: Vec<PricePoint> = inner
            .prices
            .iter()
            .filter(|p| p.item_id == *item_id)
            .filter(|p| since.map_or(true, |s| p.timestamp >= s))
            .cloned()
            .collect();
        points.sort_by_key(|p| p.timestamp);
        Ok(points)
    }

    async fn insert_alert(&self, alert: AlertRule) -> Result<()> {
        self.inner.write().alerts.insert(alert.id, alert);
        Ok(())
    }

    async fn find_active_alerts(&self, item_id: &ItemId) -> Result<Vec<AlertRule>> {
        let inner = self.inner.read();
        let mut alerts: Vec<AlertRule> = inner
            .alerts
            .values()
            .filter(|a| a.item_id == *item_id && a.is_active)
            .cloned()
            .collect();
        alerts.sort_by_key(|a| a.created_at);
        Ok(alerts)
    }

    async fn update_alert(&self, id: &AlertId, patch: AlertPatch) -> Result<()> {
        let mut inner = self.inner.write();
        let Some(alert) = inner.alerts.get_mut(id) else {
            anyhow::bail!("alert {} not found", id);
        };

        let target = patch.target_price.unwrap_or(alert.target_price);
        let threshold = patch.discount_threshold.unwrap_or(alert.discount_threshold);
        if target.is_none() && threshold.is_none() {
            anyhow::bail!("alert rule needs a target price and/or a discount threshold");
        }

        alert.target_price = target;
        alert.discount_threshold = threshold;
        if let Some(notify_once) = patch.notify_once {
            alert.notify_once = notify_once;
        }
        if let Some(is_active) = patch.is_active {
            alert.is_active = is_active;
        }
        Ok(())
    }

    async fn mark_alert_notified(&self, id: &AlertId) -> Result<()> {
        if let Some(alert) = self.inner.write().alerts.get_mut(id) {
            alert.has_notified_once = true;
        }
        Ok(())
    }

    async fn reset_alert_notified(&self, id: &AlertId) -> Result<()> {
        if let Some(alert) = self.inner.write().alerts.get_mut(id) {
            alert.has_notified_once = false;
        }
        Ok(())
    }

    async fn append_notification(&self, event: NotificationEvent) -> Result<()> {
        self.inner.write().notifications.push(event);
        Ok(())
    }

    async fn notifications_for_owner(&self, owner: &str) -> Result<Vec<NotificationEvent>> {
        let inner = self.inner.read();
        let mut events: Vec<NotificationEvent> = inner
            .notifications
            .iter()
            .filter(|n| n.owner == owner)
            .cloned()
            .collect();
        events.sort_by_key(|n| std::cmp::Reverse(n.sent_at));
        Ok(events)
    }

    async fn mark_notifications_read(&self, owner: &str) -> Result<usize> {
        let mut inner = self.inner.write();
        let mut updated = 0;
        for event in inner.notifications.iter_mut() {
            if event.owner == owner && !event.read {
                event.read = true;
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn purge_notifications(&self, owner: &str) -> Result<usize> {
        let mut inner = self.inner.write();
        let before = inner.notifications.len();
        inner.notifications.retain(|n| n.owner != owner);
        Ok(before - inner.notifications.len())
    }

    async fn insert_search_request(&self, request: SearchRequest) -> Result<()> {
        self.inner.write().requests.insert(request.id, request);
        Ok(())
    }

    async fn find_search_request(&self, id: &RequestId) -> Result<Option<SearchRequest>> {
        Ok(self.inner.read().requests.get(id).cloned())
    }

    async fn find_pending_search_requests(&self, limit: usize) -> Result<Vec<SearchRequest>> {
        let inner = self.inner.read();
        let mut pending: Vec<SearchRequest> = inner
            .requests
            .values()
            .filter(|r| matches!(r.status, SearchStatus::Pending | SearchStatus::Blocked))
            .cloned()
            .collect();
        pending.sort_by_key(|r| r.updated_at);
        pending.truncate(limit);
        Ok(pending)
    }

    async fn upsert_search_request_state(
        &self,
        id: &RequestId,
        update: SearchRequestUpdate,
    ) -> Result<()> {
        let mut inner = self.inner.write();
        let Some(request) = inner.requests.get_mut(id) else {
            anyhow::bail!("search request {} not found", id);
        };

        request.status = update.status;
        request.updated_at = update.updated_at;
        request.error_message = update.error_message;
        request.blocked_reason = update.blocked_reason;
        request.next_retry_at = update.next_retry_at;
        if let Some(results) = update.results {
            request.results = results;
        }
        if let Some(url) = update.selected_url {
            request.selected_url = Some(url);
        }
        Ok(())
    }

    async fn find_owner_email(&self, owner: &str) -> Result<Option<String>> {
        Ok(self.inner.read().owner_emails.get(owner).cloned())
    }

    async fn append_job_log(&self, entry: JobLogEntry) -> Result<()> {
        self.inner.write().job_log.push(entry);
        Ok(())
    }
}
