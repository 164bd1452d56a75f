//! Price history recording and alert evaluation
//!
//! Recording always precedes evaluation for the same observation, and a
//! notification channel failure never rolls back the other channel or the
//! recorded price point. Losing a notification is acceptable; losing a
//! price point is not.

use crate::notify::EmailNotifier;
use crate::store::Store;
use crate::types::{
    DeliveryStatus, ItemId, NotificationChannel, NotificationEvent, PricePoint, TrackedItem,
};
use crate::util::truncate_str;
use anyhow::Result;
use chrono::Utc;
use tracing::{debug, info, warn};

/// Maximum title length carried into an email subject
const SUBJECT_TITLE_LEN: usize = 50;

/// Discount of `current` against a `reference` baseline, in percent.
/// Zero whenever the baseline is missing or nonsensical.
pub fn compute_discount_percent(reference: f64, current: f64) -> f64 {
    if reference <= 0.0 {
        return 0.0;
    }
    ((reference - current) / reference * 100.0).max(0.0)
}

/// Append one price observation. Valid input (a finite, non-negative price)
/// always succeeds.
pub async fn record_observation(
    store: &dyn Store,
    item_id: ItemId,
    price: f64,
    currency: &str,
) -> Result<()> {
    if !price.is_finite() || price < 0.0 {
        anyhow::bail!("refusing to record invalid price {} for {}", price, item_id);
    }
    store
        .append_price_point(PricePoint {
            item_id,
            timestamp: Utc::now(),
            price,
            currency: currency.to_string(),
        })
        .await
}

/// Evaluate every active alert on an item against its latest observation.
///
/// Each rule triggers independently: a target-price condition, a
/// discount-threshold condition (needs a reference price), or either of a
/// combined rule. Triggered rules emit one in-app event and, when email
/// delivery is configured and the owner has an address, one email event;
/// each channel's outcome is recorded on its own.
pub async fn evaluate_alerts(
    store: &dyn Store,
    notifier: &dyn EmailNotifier,
    item: &TrackedItem,
    latest_price: f64,
    currency: &str,
) -> Result<()> {
    let alerts = store.find_active_alerts(&item.id).await?;
    if alerts.is_empty() {
        return Ok(());
    }

    for alert in alerts {
        let mut reasons: Vec<String> = Vec::new();

        if let Some(target) = alert.target_price {
            if latest_price <= target {
                reasons.push(format!(
                    "Price is now {:.2} {} (at or below target {:.2}).",
                    latest_price, currency, target
                ));
            }
        }

        if let (Some(threshold), Some(reference)) = (alert.discount_threshold, item.reference_price)
        {
            if reference > 0.0 {
                let discount = compute_discount_percent(reference, latest_price);
                if discount >= threshold {
                    reasons.push(format!(
                        "Discount is {:.1}% (threshold {:.1}%).",
                        discount, threshold
                    ));
                }
            }
        }

        if reasons.is_empty() {
            continue;
        }
        if alert.notify_once && alert.has_notified_once {
            debug!(alert = %alert.id, "already notified once, skipping");
            continue;
        }

        info!(alert = %alert.id, item = %item.id, ?reasons, "alert triggered");
        let message = build_message(item, &reasons);

        // in-app channel; failure is recorded as a warning, never unwinds
        if let Err(e) = store
            .append_notification(NotificationEvent::new(
                item.owner.clone(),
                item.id,
                message.clone(),
                NotificationChannel::InApp,
                DeliveryStatus::Sent,
            ))
            .await
        {
            warn!(alert = %alert.id, error = %e, "failed to record in-app notification");
        }

        // email channel, only when deliverable
        if notifier.is_configured() {
            match store.find_owner_email(&item.owner).await {
                Ok(Some(email)) => {
                    deliver_email(store, notifier, item, &email, &message).await;
                }
                Ok(None) => {}
                Err(e) => warn!(owner = %item.owner, error = %e, "owner email lookup failed"),
            }
        }

        if alert.notify_once {
            store.mark_alert_notified(&alert.id).await?;
        }
    }

    Ok(())
}

async fn deliver_email(
    store: &dyn Store,
    notifier: &dyn EmailNotifier,
    item: &TrackedItem,
    email: &str,
    message: &str,
) {
    let title = item.title.as_deref().unwrap_or("Product");
    let subject = format!("Price alert: {}", truncate_str(title, SUBJECT_TITLE_LEN));

    let status = match notifier.send_email(email, &subject, message).await {
        Ok(()) => DeliveryStatus::Sent,
        Err(e) => {
            warn!(item = %item.id, error = %e, "email delivery failed");
            DeliveryStatus::Failed
        }
    };

    if let Err(e) = store
        .append_notification(NotificationEvent::new(
            item.owner.clone(),
            item.id,
            message.to_string(),
            NotificationChannel::Email,
            status,
        ))
        .await
    {
        warn!(item = %item.id, error = %e, "failed to record email notification");
    }
}

fn build_message(item: &TrackedItem, reasons: &[String]) -> String {
    format!(
        "Deal alert for '{}' on {}.\n{}\nURL: {}",
        item.title.as_deref().unwrap_or("(unknown)"),
        item.platform,
        reasons.join("\n"),
        item.url
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NullNotifier;
    use crate::store::MemoryStore;
    use crate::types::{AlertRule, Platform};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Notifier that records sends and can be told to fail
    struct RecordingNotifier {
        sent: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    impl RecordingNotifier {
        fn new(fail: bool) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail,
            }
        }
    }

    #[async_trait]
    impl EmailNotifier for RecordingNotifier {
        fn is_configured(&self) -> bool {
            true
        }

        async fn send_email(&self, to: &str, subject: &str, _body: &str) -> Result<()> {
            if self.fail {
                anyhow::bail!("smtp refused");
            }
            self.sent.lock().push((to.to_string(), subject.to_string()));
            Ok(())
        }
    }

    fn item_with_price(reference: Option<f64>) -> TrackedItem {
        let mut item = TrackedItem::new("u1", Platform::Jumia, "https://jumia.ng/p/1");
        item.title = Some("Infinix Hot 40i".into());
        item.reference_price = reference;
        item
    }

    #[test]
    fn discount_percent_properties() {
        assert_eq!(compute_discount_percent(100.0, 80.0), 20.0);
        assert_eq!(compute_discount_percent(100.0, 100.0), 0.0);
        assert_eq!(compute_discount_percent(0.0, 50.0), 0.0);
        assert_eq!(compute_discount_percent(-10.0, 5.0), 0.0);
        // never negative even when current exceeds the reference
        assert_eq!(compute_discount_percent(100.0, 120.0), 0.0);
        // monotone in falling price
        assert!(
            compute_discount_percent(100.0, 60.0) > compute_discount_percent(100.0, 70.0)
        );
    }

    #[tokio::test]
    async fn record_observation_rejects_negative_prices() {
        let store = MemoryStore::new();
        let item = item_with_price(None);
        store.insert_item(item.clone()).await.unwrap();

        assert!(record_observation(&store, item.id, -1.0, "NGN").await.is_err());
        assert!(record_observation(&store, item.id, 0.0, "NGN").await.is_ok());
        assert_eq!(store.price_history(&item.id, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn notify_once_fires_then_suppresses_until_reset() {
        let store = MemoryStore::new();
        let item = item_with_price(None);
        store.insert_item(item.clone()).await.unwrap();

        let alert = AlertRule::new("u1", item.id, Some(500.0), None).unwrap();
        let alert_id = alert.id;
        store.insert_alert(alert).await.unwrap();

        let notifier = NullNotifier;

        evaluate_alerts(&store, &notifier, &item, 450.0, "NGN").await.unwrap();
        assert_eq!(store.notifications_for_owner("u1").await.unwrap().len(), 1);
        let stored = store.find_active_alerts(&item.id).await.unwrap();
        assert!(stored[0].has_notified_once);

        // further drops do not re-fire
        evaluate_alerts(&store, &notifier, &item, 400.0, "NGN").await.unwrap();
        assert_eq!(store.notifications_for_owner("u1").await.unwrap().len(), 1);

        // resetting re-arms the rule
        store.reset_alert_notified(&alert_id).await.unwrap();
        evaluate_alerts(&store, &notifier, &item, 400.0, "NGN").await.unwrap();
        assert_eq!(store.notifications_for_owner("u1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn above_target_does_not_trigger() {
        let store = MemoryStore::new();
        let item = item_with_price(None);
        store.insert_item(item.clone()).await.unwrap();
        store
            .insert_alert(AlertRule::new("u1", item.id, Some(500.0), None).unwrap())
            .await
            .unwrap();

        evaluate_alerts(&store, &NullNotifier, &item, 600.0, "NGN").await.unwrap();
        assert!(store.notifications_for_owner("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn discount_condition_needs_a_reference_price() {
        let store = MemoryStore::new();

        // no reference price on the item: the rule stays silent
        let item = item_with_price(None);
        store.insert_item(item.clone()).await.unwrap();
        store
            .insert_alert(AlertRule::new("u1", item.id, None, Some(20.0)).unwrap())
            .await
            .unwrap();
        evaluate_alerts(&store, &NullNotifier, &item, 10.0, "NGN").await.unwrap();
        assert!(store.notifications_for_owner("u1").await.unwrap().is_empty());

        // with a reference, a 25% discount crosses the 20% threshold
        let item = {
            let mut i = item_with_price(Some(100_000.0));
            i.owner = "u2".into();
            i.url = "https://jumia.ng/p/2".into();
            i
        };
        store.insert_item(item.clone()).await.unwrap();
        store
            .insert_alert(AlertRule::new("u2", item.id, None, Some(20.0)).unwrap())
            .await
            .unwrap();
        evaluate_alerts(&store, &NullNotifier, &item, 75_000.0, "NGN").await.unwrap();
        assert_eq!(store.notifications_for_owner("u2").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn email_failure_still_records_both_events() {
        let store = MemoryStore::new();
        store.set_owner_email("u1", "deals@example.com");
        let item = item_with_price(None);
        store.insert_item(item.clone()).await.unwrap();
        store
            .insert_alert(AlertRule::new("u1", item.id, Some(500.0), None).unwrap())
            .await
            .unwrap();

        let notifier = RecordingNotifier::new(true);
        evaluate_alerts(&store, &notifier, &item, 450.0, "NGN").await.unwrap();

        let events = store.notifications_for_owner("u1").await.unwrap();
        assert_eq!(events.len(), 2);
        let email = events
            .iter()
            .find(|e| e.channel == NotificationChannel::Email)
            .unwrap();
        assert_eq!(email.status, DeliveryStatus::Failed);
        let in_app = events
            .iter()
            .find(|e| e.channel == NotificationChannel::InApp)
            .unwrap();
        assert_eq!(in_app.status, DeliveryStatus::Sent);
    }

    #[tokio::test]
    async fn email_is_sent_with_truncated_subject() {
        let store = MemoryStore::new();
        store.set_owner_email("u1", "deals@example.com");
        let mut item = item_with_price(None);
        item.title = Some("An exceptionally long product title that would overflow any sane email subject line".into());
        store.insert_item(item.clone()).await.unwrap();
        store
            .insert_alert(AlertRule::new("u1", item.id, Some(500.0), None).unwrap())
            .await
            .unwrap();

        let notifier = RecordingNotifier::new(false);
        evaluate_alerts(&store, &notifier, &item, 450.0, "NGN").await.unwrap();

        let sent = notifier.sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "deals@example.com");
        assert!(sent[0].1.ends_with("..."));
    }
}
