//! Polite HTTP fetching
//!
//! One fetch path for both the item-check and search pipelines:
//! robots.txt consultation, identity rotation, a randomized pre-request
//! delay, and bounded retry with exponential backoff. Callers receive a
//! three-way outcome and must branch on its kind, not on a boolean.

pub mod identity;
pub mod retry;
pub mod robots;

pub use identity::IdentityPool;
pub use retry::{classify_status, Disposition, RetryPolicy};
pub use robots::{RobotsCache, RobotsRules};

use crate::config::{FetchConfig, RetryConfig, ROBOTS_USER_AGENT};
use rand::Rng;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

/// Why a fetch was classified as blocked rather than failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    RobotsDisallowed,
    ForbiddenExhausted,
    SuspiciousContent,
}

impl BlockReason {
    /// Human-readable reason stored on blocked items/requests
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RobotsDisallowed => "robots.txt disallow",
            Self::ForbiddenExhausted => "repeated 403 responses (possible anti-bot)",
            Self::SuspiciousContent => "suspicious page content (possible captcha)",
        }
    }
}

impl std::fmt::Display for BlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced once the retry budget is exhausted or on terminal responses
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("invalid content type: {0}")]
    InvalidContentType(String),
    #[error("content too large: {0} bytes")]
    ContentTooLarge(usize),
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Result of one polite fetch
#[derive(Debug)]
pub enum FetchOutcome {
    /// Raw markup
    Success(String),
    /// Anti-bot suspected or crawling disallowed; back off for a while
    Blocked(BlockReason),
    /// Network/HTTP failure after retries
    Error(FetchError),
}

/// Outcome of a single attempt inside the retry loop
enum Attempt {
    Body(String),
    Status(u16),
}

/// Polite fetcher shared by every pipeline that touches the network
pub struct PoliteFetcher {
    client: reqwest::Client,
    identities: IdentityPool,
    retry: RetryPolicy,
    robots: Mutex<RobotsCache>,
    config: FetchConfig,
}

impl PoliteFetcher {
    pub fn new(fetch: &FetchConfig, retry: &RetryConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(fetch.request_timeout_secs))
            .connect_timeout(Duration::from_secs(fetch.connect_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(fetch.max_redirects))
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            identities: IdentityPool::new(&fetch.identities),
            retry: RetryPolicy::new(retry),
            robots: Mutex::new(RobotsCache::new(
                fetch.robots_cache_size,
                Duration::from_secs(fetch.robots_cache_ttl_secs),
            )),
            config: fetch.clone(),
        })
    }

    /// Fetch a page politely. Never panics; every failure mode is folded
    /// into the returned outcome.
    pub async fn fetch(&self, url: &Url) -> FetchOutcome {
        if !self.robots_allows(url).await {
            debug!(%url, "robots.txt disallows fetch");
            return FetchOutcome::Blocked(BlockReason::RobotsDisallowed);
        }

        let mut saw_forbidden = false;
        let mut last_error: Option<FetchError> = None;

        for attempt in 0..self.retry.max_attempts() {
            if attempt > 0 {
                tokio::time::sleep(self.retry.backoff(attempt - 1)).await;
            }
            self.pre_request_delay().await;

            match self.attempt(url).await {
                Ok(Attempt::Body(body)) => {
                    if self.looks_suspicious(&body) {
                        warn!(%url, bytes = body.len(), "response looks like an interstitial");
                        return FetchOutcome::Blocked(BlockReason::SuspiciousContent);
                    }
                    return FetchOutcome::Success(body);
                }
                Ok(Attempt::Status(status)) => match classify_status(status) {
                    Disposition::PossibleBlock => {
                        debug!(%url, attempt, "403 response, backing off");
                        saw_forbidden = true;
                        last_error = Some(FetchError::Status(status));
                    }
                    Disposition::Transient => {
                        debug!(%url, attempt, status, "transient HTTP failure");
                        last_error = Some(FetchError::Status(status));
                    }
                    // Ok is handled by Attempt::Body above
                    _ => return FetchOutcome::Error(FetchError::Status(status)),
                },
                // content-type / size guards don't improve on retry
                Err(e @ FetchError::InvalidContentType(_))
                | Err(e @ FetchError::ContentTooLarge(_)) => {
                    return FetchOutcome::Error(e);
                }
                Err(e) => {
                    debug!(%url, attempt, error = %e, "network failure");
                    last_error = Some(e);
                }
            }
        }

        if saw_forbidden {
            FetchOutcome::Blocked(BlockReason::ForbiddenExhausted)
        } else {
            FetchOutcome::Error(
                last_error.unwrap_or_else(|| FetchError::InvalidUrl(url.to_string())),
            )
        }
    }

    /// One HTTP attempt with a freshly drawn identity
    async fn attempt(&self, url: &Url) -> Result<Attempt, FetchError> {
        let id = self.identities.pick();
        let response = self
            .client
            .get(url.as_str())
            .header(reqwest::header::USER_AGENT, &id.user_agent)
            .header(reqwest::header::ACCEPT_LANGUAGE, &id.accept_language)
            .send()
            .await?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Ok(Attempt::Status(status));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/html")
            .to_string();
        if !content_type.contains("text/html")
            && !content_type.contains("application/xhtml")
            && !content_type.contains("text/plain")
        {
            return Err(FetchError::InvalidContentType(content_type));
        }

        if let Some(len) = response.content_length() {
            if len as usize > self.config.max_content_bytes {
                return Err(FetchError::ContentTooLarge(len as usize));
            }
        }

        let body = response.text().await?;
        if body.len() > self.config.max_content_bytes {
            return Err(FetchError::ContentTooLarge(body.len()));
        }

        Ok(Attempt::Body(body))
    }

    /// Consult the cached robots decision for the URL's origin, fetching
    /// robots.txt on a cache miss.
    async fn robots_allows(&self, url: &Url) -> bool {
        let origin = url.origin().ascii_serialization();

        if let Some(rules) = self.robots.lock().await.get(&origin) {
            return rules.is_allowed(url.path());
        }

        // Lock released during the network fetch; a racing caller may fetch
        // the same origin twice and the later entry simply wins.
        let rules = self.fetch_robots(&origin).await;
        let allowed = rules.is_allowed(url.path());
        self.robots.lock().await.put(origin, rules);
        allowed
    }

    /// Fetch and parse robots.txt for an origin. Unreachable or
    /// unparseable files degrade to allow-all.
    async fn fetch_robots(&self, origin: &str) -> RobotsRules {
        let robots_url = format!("{}/robots.txt", origin);
        let response = self
            .client
            .get(&robots_url)
            .header(reqwest::header::USER_AGENT, ROBOTS_USER_AGENT)
            .send()
            .await;

        match response {
            Ok(r) if r.status().is_success() => match r.text().await {
                Ok(body) => RobotsRules::parse(&body, ROBOTS_USER_AGENT),
                Err(_) => RobotsRules::allow_all(),
            },
            _ => RobotsRules::allow_all(),
        }
    }

    /// Short-body and captcha-marker heuristics for anti-bot interstitials
    fn looks_suspicious(&self, body: &str) -> bool {
        if body.len() < self.config.min_html_bytes {
            return true;
        }
        let head = &body[..body.len().min(20_000)];
        let head = head.to_lowercase();
        head.contains("captcha") || head.contains("unusual traffic")
    }

    /// Randomized politeness delay before each attempt
    async fn pre_request_delay(&self) {
        let ms = {
            let mut rng = rand::thread_rng();
            rng.gen_range(self.config.pre_delay_min_ms..=self.config.pre_delay_max_ms)
        };
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FetchConfig, RetryConfig};

    fn fetcher() -> PoliteFetcher {
        PoliteFetcher::new(&FetchConfig::default(), &RetryConfig::default()).unwrap()
    }

    #[test]
    fn short_bodies_are_suspicious() {
        let f = fetcher();
        assert!(f.looks_suspicious("<html></html>"));
    }

    #[test]
    fn captcha_markers_are_suspicious() {
        let f = fetcher();
        let filler = "<p>product description text</p>".repeat(50);
        let body = format!("<html><body>{}<div class=\"g-recaptcha\"></div></body></html>", filler);
        assert!(f.looks_suspicious(&body));
    }

    #[test]
    fn ordinary_pages_are_not_suspicious() {
        let f = fetcher();
        let filler = "<p>product description text</p>".repeat(50);
        let body = format!("<html><body><h1>Phone</h1>{}</body></html>", filler);
        assert!(!f.looks_suspicious(&body));
    }

    #[test]
    fn block_reasons_render_stable_strings() {
        assert_eq!(BlockReason::RobotsDisallowed.as_str(), "robots.txt disallow");
        assert!(BlockReason::ForbiddenExhausted.as_str().contains("403"));
    }
}
