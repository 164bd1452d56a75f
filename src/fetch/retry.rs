//! Retry policy shared by the item-check and search fetch paths

use crate::config::RetryConfig;
use std::time::Duration;

/// How a single HTTP response/failure should be treated by the retry loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Success, hand the body to the caller
    Ok,
    /// Timeout, 5xx, 429 or network failure; retry with backoff
    Transient,
    /// 403; retry with backoff, surface as blocked once exhausted
    PossibleBlock,
    /// Any other unexpected status; fail immediately, retrying won't help
    Terminal,
}

/// Classify an HTTP status code
pub fn classify_status(status: u16) -> Disposition {
    match status {
        200..=299 => Disposition::Ok,
        403 => Disposition::PossibleBlock,
        429 => Disposition::Transient,
        500..=599 => Disposition::Transient,
        _ => Disposition::Terminal,
    }
}

/// Bounded exponential backoff
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff_base: Duration,
    backoff_max: Duration,
}

impl RetryPolicy {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff_base: Duration::from_millis(config.backoff_base_ms),
            backoff_max: Duration::from_millis(config.backoff_max_ms),
        }
    }

    /// Total attempts, including the first
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Backoff before the retry following attempt `attempt` (0-based):
    /// base, 2x base, 4x base, ... capped at the configured ceiling
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(16));
        self.backoff_base
            .saturating_mul(factor)
            .min(self.backoff_max)
    }
}
