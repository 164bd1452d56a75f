//! Recheck cycle configuration

use serde::{Deserialize, Serialize};

/// Cycle runner policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Interval between check cycles (seconds)
    pub check_interval_secs: u64,
    /// Items in `blocked` status are skipped until this much time has
    /// passed since their last check (seconds)
    pub blocked_cooldown_secs: u64,
    /// Lower bound of the randomized pause between items (ms)
    pub pacing_min_ms: u64,
    /// Upper bound of the randomized pause between items (ms)
    pub pacing_max_ms: u64,
    /// Pending/blocked search requests drained after each item
    pub search_batch_size: usize,
    /// How long a blocked/errored search request waits before retry (seconds)
    pub request_retry_cooldown_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: 30 * 60,
            blocked_cooldown_secs: 24 * 60 * 60,
            pacing_min_ms: 800,
            pacing_max_ms: 3_000,
            search_batch_size: 10,
            request_retry_cooldown_secs: 24 * 60 * 60,
        }
    }
}
