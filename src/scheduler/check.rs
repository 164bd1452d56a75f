//! Single-item check pipeline: fetch, extract, record, evaluate

use super::CycleRunner;
use crate::alerts::{evaluate_alerts, record_observation};
use crate::extract::Availability;
use crate::fetch::FetchOutcome;
use crate::store::ItemUpdate;
use crate::types::{ItemStatus, JobKind, JobLogEntry, JobOutcome, TrackedItem};
use anyhow::Result;
use chrono::Utc;
use tracing::{debug, info};
use url::Url;

/// An unparseable price on an otherwise fetchable page usually means an
/// anti-bot interstitial or a silent layout change
const PRICE_NOT_DETECTED: &str = "price not detected (possible anti-bot or layout change)";

impl CycleRunner {
    /// Check one tracked item: fetch its page, extract a product record,
    /// update the item, append a price point, evaluate alerts.
    ///
    /// Failures update the item's status and are logged; they never
    /// propagate past this item, so one bad item cannot abort a cycle.
    pub async fn check_one_item(&self, item: &TrackedItem) -> Result<()> {
        debug!(item = %item.id, url = %item.url, "checking item");

        let url = match Url::parse(&item.url) {
            Ok(url) => url,
            Err(e) => {
                // malformed URL: no network call, the item is parked as error
                self.store
                    .upsert_item_state(
                        &item.id,
                        ItemUpdate::status_only(ItemStatus::Error, Utc::now()),
                    )
                    .await?;
                self.log_check(item, JobOutcome::Error, Some(format!("invalid URL: {e}")))
                    .await;
                return Ok(());
            }
        };

        let body = match self.fetcher.fetch(&url).await {
            FetchOutcome::Success(body) => body,
            FetchOutcome::Blocked(reason) => {
                self.store
                    .upsert_item_state(&item.id, ItemUpdate::blocked(reason.as_str(), Utc::now()))
                    .await?;
                self.log_check(item, JobOutcome::Blocked, Some(reason.as_str().to_string()))
                    .await;
                return Ok(());
            }
            FetchOutcome::Error(e) => {
                self.store
                    .upsert_item_state(
                        &item.id,
                        ItemUpdate::status_only(ItemStatus::Error, Utc::now()),
                    )
                    .await?;
                self.log_check(item, JobOutcome::Error, Some(e.to_string())).await;
                return Ok(());
            }
        };

        let record = item.platform.extract(&body);

        let Some(price) = record.price else {
            // page fetched but no price found; keep whatever metadata the
            // adapter recovered and treat the item as blocked
            self.store
                .upsert_item_state(
                    &item.id,
                    ItemUpdate::blocked_with_metadata(PRICE_NOT_DETECTED, &record, Utc::now()),
                )
                .await?;
            self.log_check(item, JobOutcome::Blocked, Some(PRICE_NOT_DETECTED.to_string()))
                .await;
            return Ok(());
        };

        let status = if record.availability == Availability::Unavailable {
            ItemStatus::Unavailable
        } else {
            ItemStatus::Ok
        };

        self.store
            .upsert_item_state(&item.id, ItemUpdate::checked(&record, status, Utc::now()))
            .await?;

        // the price point lands before any alert is evaluated against it
        record_observation(self.store.as_ref(), item.id, price, &record.currency).await?;

        let snapshot = merge_snapshot(item, &record, status, price);
        evaluate_alerts(
            self.store.as_ref(),
            self.notifier.as_ref(),
            &snapshot,
            price,
            &record.currency,
        )
        .await?;

        info!(item = %item.id, price, currency = %record.currency, %status, "item checked");
        self.log_check(item, JobOutcome::Ok, None).await;
        Ok(())
    }

    async fn log_check(&self, item: &TrackedItem, outcome: JobOutcome, error: Option<String>) {
        let entry = JobLogEntry::new(
            JobKind::CheckItem,
            Some(item.platform),
            Some(item.id.to_string()),
            outcome,
            error,
        );
        if let Err(e) = self.store.append_job_log(entry).await {
            tracing::warn!(item = %item.id, error = %e, "job log append failed");
        }
    }
}

/// Item state as it looks after this observation, for alert evaluation
fn merge_snapshot(
    item: &TrackedItem,
    record: &crate::extract::ProductRecord,
    status: ItemStatus,
    price: f64,
) -> TrackedItem {
    let mut snapshot = item.clone();
    if record.title.is_some() {
        snapshot.title = record.title.clone();
    }
    if record.image.is_some() {
        snapshot.image = record.image.clone();
    }
    snapshot.current_price = Some(price);
    snapshot.currency = Some(record.currency.clone());
    snapshot.reference_price = record.reference_price;
    snapshot.status = status;
    snapshot.blocked_reason = None;
    snapshot.last_checked = Some(Utc::now());
    snapshot
}
