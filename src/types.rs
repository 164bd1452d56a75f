//! Core domain types for the dealwatch pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a tracked item
pub type ItemId = Uuid;

/// Unique identifier for an alert rule
pub type AlertId = Uuid;

/// Unique identifier for a search request
pub type RequestId = Uuid;

/// Opaque owner (user) identifier assigned by the excluded auth layer
pub type OwnerId = String;

// ============================================================================
// Platforms
// ============================================================================

/// Supported marketplaces.
///
/// Adding a marketplace means adding a variant here plus one extraction
/// adapter under `extract/`; nothing else dispatches on strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Jumia,
    Konga,
    Amazon,
    Ebay,
    Jiji,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Jumia,
        Platform::Konga,
        Platform::Amazon,
        Platform::Ebay,
        Platform::Jiji,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jumia => "jumia",
            Self::Konga => "konga",
            Self::Amazon => "amazon",
            Self::Ebay => "ebay",
            Self::Jiji => "jiji",
        }
    }

    /// Whether free-text marketplace search is implemented for this platform
    pub fn supports_search(&self) -> bool {
        matches!(self, Self::Jiji)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = UnsupportedPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "jumia" => Ok(Self::Jumia),
            "konga" => Ok(Self::Konga),
            "amazon" => Ok(Self::Amazon),
            "ebay" => Ok(Self::Ebay),
            "jiji" => Ok(Self::Jiji),
            other => Err(UnsupportedPlatform(other.to_string())),
        }
    }
}

/// Rejected before any network call is made
#[derive(Debug, Clone, thiserror::Error)]
#[error("unsupported platform: {0}")]
pub struct UnsupportedPlatform(pub String);

// ============================================================================
// Tracked items
// ============================================================================

/// Lifecycle status of a tracked item, driven only by the check pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Ok,
    Unavailable,
    Blocked,
    Error,
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ok => "ok",
            Self::Unavailable => "unavailable",
            Self::Blocked => "blocked",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// A user's subscription to monitor one marketplace URL.
///
/// (owner, url) is unique; a blocked or errored item keeps its last-known
/// good product fields so callers can keep displaying them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedItem {
    pub id: ItemId,
    pub owner: OwnerId,
    pub platform: Platform,
    pub url: String,
    pub title: Option<String>,
    pub image: Option<String>,
    pub current_price: Option<f64>,
    pub currency: Option<String>,
    /// Marketplace-displayed "was" price used as the discount baseline
    pub reference_price: Option<f64>,
    pub status: ItemStatus,
    pub blocked_reason: Option<String>,
    pub last_checked: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TrackedItem {
    pub fn new(owner: impl Into<OwnerId>, platform: Platform, url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner: owner.into(),
            platform,
            url: url.into(),
            title: None,
            image: None,
            current_price: None,
            currency: None,
            reference_price: None,
            status: ItemStatus::Ok,
            blocked_reason: None,
            last_checked: None,
            created_at: Utc::now(),
        }
    }
}

/// One immutable, append-only price observation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePoint {
    pub item_id: ItemId,
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub currency: String,
}

// ============================================================================
// Alerts & notifications
// ============================================================================

/// A user-defined trigger condition on a tracked item.
///
/// At least one of `target_price` / `discount_threshold` is always set;
/// `AlertRule::new` enforces this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRule {
    pub id: AlertId,
    pub owner: OwnerId,
    pub item_id: ItemId,
    /// Trigger when the latest price is at or below this
    pub target_price: Option<f64>,
    /// Trigger when the discount vs the reference price reaches this percent
    pub discount_threshold: Option<f64>,
    pub notify_once: bool,
    pub has_notified_once: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl AlertRule {
    pub fn new(
        owner: impl Into<OwnerId>,
        item_id: ItemId,
        target_price: Option<f64>,
        discount_threshold: Option<f64>,
    ) -> anyhow::Result<Self> {
        if target_price.is_none() && discount_threshold.is_none() {
            anyhow::bail!("alert rule needs a target price and/or a discount threshold");
        }
        Ok(Self {
            id: Uuid::new_v4(),
            owner: owner.into(),
            item_id,
            target_price,
            discount_threshold,
            notify_once: true,
            has_notified_once: false,
            is_active: true,
            created_at: Utc::now(),
        })
    }
}

/// Delivery channel for a notification event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    Email,
    InApp,
}

/// Outcome of one delivery attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Failed,
}

/// Append-only record of an alert firing on one channel.
///
/// Reading or purging these never touches the underlying alert state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub id: Uuid,
    pub owner: OwnerId,
    pub item_id: ItemId,
    pub message: String,
    pub channel: NotificationChannel,
    pub status: DeliveryStatus,
    pub sent_at: DateTime<Utc>,
    pub read: bool,
}

impl NotificationEvent {
    pub fn new(
        owner: impl Into<OwnerId>,
        item_id: ItemId,
        message: impl Into<String>,
        channel: NotificationChannel,
        status: DeliveryStatus,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner: owner.into(),
            item_id,
            message: message.into(),
            channel,
            status,
            sent_at: Utc::now(),
            read: false,
        }
    }
}

// ============================================================================
// Search requests
// ============================================================================

/// Lifecycle of a free-text search request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    Pending,
    Searching,
    OptionsFound,
    Blocked,
    Error,
    Fulfilled,
}

/// A ranked candidate emitted by the search engine.
///
/// Not persisted on its own; lives inside its SearchRequest's results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchCandidate {
    pub title: Option<String>,
    pub price: Option<f64>,
    pub currency: String,
    pub url: String,
    pub image: Option<String>,
}

/// A user's free-text marketplace query and its progress toward a pick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub id: RequestId,
    pub owner: OwnerId,
    pub platform: Platform,
    pub query: String,
    pub location: Option<String>,
    pub max_price: Option<f64>,
    /// Desired result count, clamped to 1..=100
    pub limit: usize,
    pub status: SearchStatus,
    pub results: Vec<SearchCandidate>,
    pub selected_url: Option<String>,
    pub error_message: Option<String>,
    pub blocked_reason: Option<String>,
    pub next_retry_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SearchRequest {
    pub fn new(
        owner: impl Into<OwnerId>,
        platform: Platform,
        query: impl Into<String>,
        location: Option<String>,
        max_price: Option<f64>,
        limit: usize,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner: owner.into(),
            platform,
            query: query.into(),
            location,
            max_price,
            limit: limit.clamp(1, 100),
            status: SearchStatus::Pending,
            results: Vec::new(),
            selected_url: None,
            error_message: None,
            blocked_reason: None,
            next_retry_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

// ============================================================================
// Job log
// ============================================================================

/// Kind of pipeline run being recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    CheckItem,
    SearchRequest,
    CheckCycle,
}

/// Outcome of one pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobOutcome {
    Ok,
    Blocked,
    Error,
}

/// Append-only audit entry for observability; never read by the core
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobLogEntry {
    pub kind: JobKind,
    pub platform: Option<Platform>,
    pub subject_id: Option<String>,
    pub outcome: JobOutcome,
    pub error: Option<String>,
    pub ran_at: DateTime<Utc>,
}

impl JobLogEntry {
    pub fn new(
        kind: JobKind,
        platform: Option<Platform>,
        subject_id: Option<String>,
        outcome: JobOutcome,
        error: Option<String>,
    ) -> Self {
        Self {
            kind,
            platform,
            subject_id,
            outcome,
            error,
            ran_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_round_trip() {
        for p in Platform::ALL {
            assert_eq!(p.as_str().parse::<Platform>().unwrap(), p);
        }
        assert!(" EBAY ".parse::<Platform>().is_ok());
        assert!("walmart".parse::<Platform>().is_err());
    }

    #[test]
    fn only_jiji_searches() {
        assert!(Platform::Jiji.supports_search());
        assert!(!Platform::Amazon.supports_search());
    }

    #[test]
    fn alert_rule_requires_a_condition() {
        let item = Uuid::new_v4();
        assert!(AlertRule::new("u1", item, None, None).is_err());
        assert!(AlertRule::new("u1", item, Some(500.0), None).is_ok());
        assert!(AlertRule::new("u1", item, None, Some(20.0)).is_ok());
    }

    #[test]
    fn search_request_clamps_limit() {
        let r = SearchRequest::new("u1", Platform::Jiji, "iphone 15", None, None, 500);
        assert_eq!(r.limit, 100);
        let r = SearchRequest::new("u1", Platform::Jiji, "iphone 15", None, None, 0);
        assert_eq!(r.limit, 1);
    }
}
