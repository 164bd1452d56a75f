//! Recheck cycle orchestration
//!
//! An explicitly constructed runner owns its policy (interval, cooldown,
//! pacing) and an explicit start/stop lifecycle; there are no process-wide
//! singletons. Items and search requests are processed sequentially within
//! a cycle on purpose: per-origin request concurrency stays low to avoid
//! tripping anti-bot defenses, and each item's processing is independently
//! idempotent so a cycle aborted mid-way needs no recovery logic.

mod check;
mod requests;

use crate::config::SchedulerConfig;
use crate::fetch::PoliteFetcher;
use crate::notify::EmailNotifier;
use crate::search::SearchEngine;
use crate::store::Store;
use crate::types::{ItemId, ItemStatus, JobKind, JobLogEntry, JobOutcome, Platform, TrackedItem};
use anyhow::Result;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{info, warn};
use url::Url;

/// Counters from one completed cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub checked: usize,
    pub skipped: usize,
    pub requests_processed: usize,
}

/// Periodic cycle runner over all tracked items and pending searches
pub struct CycleRunner {
    config: SchedulerConfig,
    store: Arc<dyn Store>,
    fetcher: Arc<PoliteFetcher>,
    engine: SearchEngine,
    notifier: Arc<dyn EmailNotifier>,
    shutdown: broadcast::Sender<()>,
}

impl CycleRunner {
    pub fn new(
        config: SchedulerConfig,
        store: Arc<dyn Store>,
        fetcher: Arc<PoliteFetcher>,
        engine: SearchEngine,
        notifier: Arc<dyn EmailNotifier>,
    ) -> Self {
        let (shutdown, _) = broadcast::channel(4);
        Self {
            config,
            store,
            fetcher,
            engine,
            notifier,
            shutdown,
        }
    }

    /// Ask a running loop (and any in-flight cycle) to stop
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(());
    }

    /// Run cycles until shutdown is requested
    pub async fn run(&self) -> Result<()> {
        // separate subscriptions: an in-flight cycle consuming the shutdown
        // message must not hide it from the outer loop
        let mut shutdown_rx = self.shutdown.subscribe();
        let mut cycle_rx = self.shutdown.subscribe();
        let interval = Duration::from_secs(self.config.check_interval_secs);
        info!(interval_secs = self.config.check_interval_secs, "cycle runner started");

        loop {
            match self.run_cycle_inner(&mut cycle_rx).await {
                Ok(stats) => info!(?stats, "cycle complete"),
                Err(e) => {
                    warn!(error = %e, "cycle failed");
                    let _ = self
                        .store
                        .append_job_log(JobLogEntry::new(
                            JobKind::CheckCycle,
                            None,
                            None,
                            JobOutcome::Error,
                            Some(e.to_string()),
                        ))
                        .await;
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown_rx.recv() => {
                    info!("cycle runner stopped");
                    return Ok(());
                }
            }
        }
    }

    /// Run exactly one cycle (used by tests and the force paths)
    pub async fn run_cycle(&self) -> Result<CycleStats> {
        let mut shutdown_rx = self.shutdown.subscribe();
        self.run_cycle_inner(&mut shutdown_rx).await
    }

    async fn run_cycle_inner(
        &self,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> Result<CycleStats> {
        let items = self.store.find_items_needing_check().await?;
        let cooldown = ChronoDuration::seconds(self.config.blocked_cooldown_secs as i64);
        info!(items = items.len(), "cycle starting");

        let mut stats = CycleStats::default();
        for item in items {
            if !due_for_check(&item, Utc::now(), cooldown) {
                stats.skipped += 1;
                continue;
            }

            // every await below is a clean abort point on shutdown; an
            // unfinished item is simply re-checked next cycle
            tokio::select! {
                _ = shutdown.recv() => break,
                result = self.check_one_item(&item) => {
                    stats.checked += 1;
                    if let Err(e) = result {
                        warn!(item = %item.id, error = %e, "item check failed");
                    }
                }
            }

            tokio::select! {
                _ = shutdown.recv() => break,
                result = self.process_pending_requests() => {
                    match result {
                        Ok(n) => stats.requests_processed += n,
                        Err(e) => warn!(error = %e, "request batch failed"),
                    }
                }
            }

            let pause = self.pacing_delay();
            tokio::select! {
                _ = shutdown.recv() => break,
                _ = tokio::time::sleep(pause) => {}
            }
        }

        Ok(stats)
    }

    /// Start tracking a URL for an owner. The caller decides when to run
    /// the first check (typically immediately via [`force_recheck`]).
    ///
    /// [`force_recheck`]: CycleRunner::force_recheck
    pub async fn track_item(
        &self,
        owner: impl Into<String>,
        platform: Platform,
        url: &str,
    ) -> Result<TrackedItem> {
        Url::parse(url).map_err(|e| anyhow::anyhow!("invalid URL '{}': {}", url, e))?;
        let item = TrackedItem::new(owner, platform, url);
        self.store.insert_item(item.clone()).await?;
        Ok(item)
    }

    /// Check one item immediately, outside the scheduled cycle
    pub async fn force_recheck(&self, id: &ItemId) -> Result<()> {
        let Some(item) = self.store.find_item(id).await? else {
            anyhow::bail!("tracked item {} not found", id);
        };
        self.check_one_item(&item).await
    }

    fn pacing_delay(&self) -> Duration {
        let ms = {
            let mut rng = rand::thread_rng();
            rng.gen_range(self.config.pacing_min_ms..=self.config.pacing_max_ms)
        };
        Duration::from_millis(ms)
    }
}

/// Whether an item participates in this cycle. `ok`/`unavailable`/`error`
/// items are always due; `blocked` items sit out the cooldown window.
pub fn due_for_check(item: &TrackedItem, now: DateTime<Utc>, cooldown: ChronoDuration) -> bool {
    if item.status != ItemStatus::Blocked {
        return true;
    }
    match item.last_checked {
        Some(at) => now - at >= cooldown,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocked_item(checked_secs_ago: i64) -> TrackedItem {
        let mut item = TrackedItem::new("u1", Platform::Jiji, "https://jiji.ng/ad/x");
        item.status = ItemStatus::Blocked;
        item.last_checked = Some(Utc::now() - ChronoDuration::seconds(checked_secs_ago));
        item
    }

    #[test]
    fn blocked_items_sit_out_the_cooldown() {
        let cooldown = ChronoDuration::hours(24);
        let now = Utc::now();

        assert!(!due_for_check(&blocked_item(60 * 60), now, cooldown));
        assert!(due_for_check(&blocked_item(25 * 60 * 60), now, cooldown));
    }

    #[test]
    fn non_blocked_statuses_are_always_due() {
        let cooldown = ChronoDuration::hours(24);
        let now = Utc::now();
        for status in [ItemStatus::Ok, ItemStatus::Unavailable, ItemStatus::Error] {
            let mut item = blocked_item(60);
            item.status = status;
            assert!(due_for_check(&item, now, cooldown), "{status} should be due");
        }
    }

    #[test]
    fn never_checked_blocked_items_are_due() {
        let mut item = blocked_item(0);
        item.last_checked = None;
        assert!(due_for_check(&item, Utc::now(), ChronoDuration::hours(24)));
    }
}
