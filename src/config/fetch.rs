//! Polite fetcher and retry configuration

use serde::{Deserialize, Serialize};

/// One browser identity used for request fingerprint rotation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientIdentity {
    pub user_agent: String,
    pub accept_language: String,
}

impl ClientIdentity {
    fn new(user_agent: &str, accept_language: &str) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            accept_language: accept_language.to_string(),
        }
    }
}

/// Polite fetcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Request timeout (seconds)
    pub request_timeout_secs: u64,
    /// Connection timeout (seconds)
    pub connect_timeout_secs: u64,
    /// Maximum redirects to follow
    pub max_redirects: usize,
    /// Maximum response size (bytes)
    pub max_content_bytes: usize,
    /// Lower bound of the random delay inserted before each attempt (ms)
    pub pre_delay_min_ms: u64,
    /// Upper bound of the random delay inserted before each attempt (ms)
    pub pre_delay_max_ms: u64,
    /// Bodies shorter than this are treated as suspicious (likely interstitial)
    pub min_html_bytes: usize,
    /// robots.txt decision cache TTL per origin (seconds)
    pub robots_cache_ttl_secs: u64,
    /// robots.txt cache size (origins)
    pub robots_cache_size: usize,
    /// Identity pool rotated across attempts
    pub identities: Vec<ClientIdentity>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 20,
            connect_timeout_secs: 10,
            max_redirects: 10,
            max_content_bytes: 5 * 1024 * 1024,
            pre_delay_min_ms: 1_500,
            pre_delay_max_ms: 4_500,
            min_html_bytes: 512,
            robots_cache_ttl_secs: 60 * 60,
            robots_cache_size: 256,
            identities: default_identities(),
        }
    }
}

fn default_identities() -> Vec<ClientIdentity> {
    vec![
        ClientIdentity::new(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
            "en-US,en;q=0.9",
        ),
        ClientIdentity::new(
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
            "en-GB,en;q=0.8",
        ),
        ClientIdentity::new(
            "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0",
            "en-US,en;q=0.7",
        ),
        ClientIdentity::new(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:124.0) Gecko/20100101 Firefox/124.0",
            "en-NG,en;q=0.9",
        ),
    ]
}

/// Retry policy shared by the item-check and search paths
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per fetch, including the first
    pub max_attempts: u32,
    /// Base backoff between attempts (ms); doubles per retry
    pub backoff_base_ms: u64,
    /// Backoff ceiling (ms)
    pub backoff_max_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base_ms: 2_000,
            backoff_max_ms: 30_000,
        }
    }
}
