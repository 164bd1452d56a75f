//! Integration tests for dealwatch
//!
//! These tests exercise the engine end-to-end against the in-memory store.
//! Nothing here touches the network: paths that would fetch are driven
//! through their pre-network validation and state transitions instead.

use dealwatch::{
    config::{Config, FetchConfig, RetryConfig, SchedulerConfig, SearchConfig},
    fetch::PoliteFetcher,
    notify::NullNotifier,
    scheduler::CycleRunner,
    search::SearchEngine,
    store::{MemoryStore, Store},
    types::{ItemStatus, Platform, SearchStatus, TrackedItem},
};
use chrono::{Duration, Utc};
use std::sync::Arc;

fn runner_with(store: Arc<MemoryStore>) -> CycleRunner {
    let config = Config::default();
    let fetcher =
        Arc::new(PoliteFetcher::new(&FetchConfig::default(), &RetryConfig::default()).unwrap());
    let engine = SearchEngine::new(fetcher.clone(), SearchConfig::default());
    CycleRunner::new(
        config.scheduler.clone(),
        store,
        fetcher,
        engine,
        Arc::new(NullNotifier),
    )
}

#[tokio::test]
async fn tracking_enforces_owner_url_uniqueness() {
    let store = Arc::new(MemoryStore::new());
    let runner = runner_with(store.clone());

    let item = runner
        .track_item("alice", Platform::Jumia, "https://jumia.ng/p/phone-1")
        .await
        .unwrap();
    assert!(store.find_item(&item.id).await.unwrap().is_some());

    let dup = runner
        .track_item("alice", Platform::Jumia, "https://jumia.ng/p/phone-1")
        .await;
    assert!(dup.is_err());

    // a different owner may track the same URL
    runner
        .track_item("bob", Platform::Jumia, "https://jumia.ng/p/phone-1")
        .await
        .unwrap();
}

#[tokio::test]
async fn tracking_rejects_malformed_urls_before_any_work() {
    let store = Arc::new(MemoryStore::new());
    let runner = runner_with(store.clone());

    assert!(runner
        .track_item("alice", Platform::Ebay, "not a url")
        .await
        .is_err());
    assert!(store.find_items_needing_check().await.unwrap().is_empty());
}

#[tokio::test]
async fn short_queries_are_rejected_before_any_network_call() {
    let store = Arc::new(MemoryStore::new());
    let runner = runner_with(store.clone());

    assert!(runner
        .create_search_request("alice", Platform::Jiji, "tv", None, None, None)
        .await
        .is_err());
    assert!(store
        .find_pending_search_requests(10)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn unsupported_search_platform_errors_without_fetching() {
    let store = Arc::new(MemoryStore::new());
    let runner = runner_with(store.clone());

    let request = runner
        .create_search_request("alice", Platform::Amazon, "iphone 15", None, None, None)
        .await
        .unwrap();
    runner.process_one_request(&request).await.unwrap();

    let resolved = store
        .find_search_request(&request.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resolved.status, SearchStatus::Error);
    assert!(resolved
        .error_message
        .as_deref()
        .unwrap()
        .contains("does not support search"));
    assert!(resolved.next_retry_at.is_none());
}

#[tokio::test]
async fn blocked_requests_wait_out_their_retry_window() {
    let store = Arc::new(MemoryStore::new());
    let runner = runner_with(store.clone());

    let request = runner
        .create_search_request("alice", Platform::Jiji, "iphone 15", None, None, None)
        .await
        .unwrap();

    // simulate an earlier blocked run with a future retry marker
    store
        .upsert_search_request_state(
            &request.id,
            dealwatch::store::SearchRequestUpdate::blocked(
                "robots.txt disallow",
                Utc::now() + Duration::hours(12),
                Utc::now(),
            ),
        )
        .await
        .unwrap();

    let gated = store
        .find_search_request(&request.id)
        .await
        .unwrap()
        .unwrap();
    runner.process_one_request(&gated).await.unwrap();

    // untouched: still blocked, same reason, no searching transition
    let after = store
        .find_search_request(&request.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.status, SearchStatus::Blocked);
    assert_eq!(after.blocked_reason.as_deref(), Some("robots.txt disallow"));
}

#[tokio::test]
async fn fulfillment_spawns_a_tracked_item() {
    let store = Arc::new(MemoryStore::new());
    let runner = runner_with(store.clone());

    let request = runner
        .create_search_request("alice", Platform::Jiji, "iphone 15", None, None, None)
        .await
        .unwrap();

    let item = runner
        .fulfill_request(&request.id, "https://jiji.ng/ad/apple-iphone-15")
        .await
        .unwrap();

    let resolved = store
        .find_search_request(&request.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resolved.status, SearchStatus::Fulfilled);
    assert_eq!(
        resolved.selected_url.as_deref(),
        Some("https://jiji.ng/ad/apple-iphone-15")
    );

    let item = store.find_item(&item.id).await.unwrap().unwrap();
    assert_eq!(item.owner, "alice");
    assert_eq!(item.platform, Platform::Jiji);

    // garbage selections are rejected
    assert!(runner
        .fulfill_request(&request.id, "javascript:alert(1)")
        .await
        .is_err());
}

#[tokio::test]
async fn cycle_skips_recently_blocked_items() {
    let store = Arc::new(MemoryStore::new());

    let mut blocked = TrackedItem::new("alice", Platform::Jiji, "https://jiji.ng/ad/blocked");
    blocked.status = ItemStatus::Blocked;
    blocked.last_checked = Some(Utc::now() - Duration::hours(2));
    store.insert_item(blocked).await.unwrap();

    // fast pacing so the cycle finishes quickly
    let mut scheduler = SchedulerConfig::default();
    scheduler.pacing_min_ms = 1;
    scheduler.pacing_max_ms = 2;
    let fetcher =
        Arc::new(PoliteFetcher::new(&FetchConfig::default(), &RetryConfig::default()).unwrap());
    let engine = SearchEngine::new(fetcher.clone(), SearchConfig::default());
    let runner = CycleRunner::new(
        scheduler,
        store.clone(),
        fetcher,
        engine,
        Arc::new(NullNotifier),
    );

    let stats = runner.run_cycle().await.unwrap();
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.checked, 0);

    // the item was left exactly as it was
    let items = store.find_items_needing_check().await.unwrap();
    assert_eq!(items[0].status, ItemStatus::Blocked);
}

#[tokio::test]
async fn deleting_an_item_leaves_no_orphans() {
    let store = Arc::new(MemoryStore::new());
    let runner = runner_with(store.clone());

    let item = runner
        .track_item("alice", Platform::Konga, "https://konga.com/p/7")
        .await
        .unwrap();

    dealwatch::alerts::record_observation(store.as_ref(), item.id, 25_000.0, "NGN")
        .await
        .unwrap();
    store
        .insert_alert(dealwatch::types::AlertRule::new("alice", item.id, Some(20_000.0), None).unwrap())
        .await
        .unwrap();

    store.delete_item(&item.id).await.unwrap();

    assert!(store.find_item(&item.id).await.unwrap().is_none());
    assert!(store.price_history(&item.id, None).await.unwrap().is_empty());
    assert!(store.find_active_alerts(&item.id).await.unwrap().is_empty());
}
