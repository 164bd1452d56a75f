//! Configuration for dealwatch

mod email;
mod fetch;
mod logging;
mod scheduler;
mod search;

pub use email::EmailConfig;
pub use fetch::{ClientIdentity, FetchConfig, RetryConfig};
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use scheduler::SchedulerConfig;
pub use search::SearchConfig;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// User agent announced when fetching robots.txt (the crawler identity
/// robots directives are matched against)
pub const ROBOTS_USER_AGENT: &str = "DealWatchBot/0.1 (+respect-robots)";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration fields.
    ///
    /// Collects all validation errors and reports them together so the user
    /// can fix everything in one pass.
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        if self.retry.max_attempts == 0 {
            errors.push("retry max_attempts must be positive".to_string());
        }
        if self.retry.backoff_base_ms == 0 {
            errors.push("retry backoff_base_ms must be positive".to_string());
        }
        if self.fetch.identities.is_empty() {
            errors.push("fetch identities pool must not be empty".to_string());
        }
        if self.fetch.pre_delay_min_ms > self.fetch.pre_delay_max_ms {
            errors.push("fetch pre_delay_min_ms must be <= pre_delay_max_ms".to_string());
        }
        if self.fetch.robots_cache_size == 0 {
            errors.push("fetch robots_cache_size must be positive".to_string());
        }

        if self.search.max_pages == 0 {
            errors.push("search max_pages must be positive".to_string());
        }
        if self.search.raw_candidate_floor == 0 {
            errors.push("search raw_candidate_floor must be positive".to_string());
        }
        if self.search.hard_candidate_cap < self.search.raw_candidate_floor {
            errors.push("search hard_candidate_cap must be >= raw_candidate_floor".to_string());
        }
        if self.search.default_limit == 0 || self.search.default_limit > 100 {
            errors.push("search default_limit must be in 1..=100".to_string());
        }

        if self.scheduler.check_interval_secs == 0 {
            errors.push("scheduler check_interval_secs must be positive".to_string());
        }
        if self.scheduler.pacing_min_ms > self.scheduler.pacing_max_ms {
            errors.push("scheduler pacing_min_ms must be <= pacing_max_ms".to_string());
        }
        if self.scheduler.search_batch_size == 0 {
            errors.push("scheduler search_batch_size must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            anyhow::bail!("Invalid configuration:\n  - {}", errors.join("\n  - "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn validation_collects_all_errors() {
        let mut config = Config::default();
        config.retry.max_attempts = 0;
        config.search.max_pages = 0;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("max_attempts"));
        assert!(err.contains("max_pages"));
    }

    #[test]
    fn parses_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [scheduler]
            check_interval_secs = 600

            [search]
            max_pages = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.scheduler.check_interval_secs, 600);
        assert_eq!(config.search.max_pages, 4);
        // untouched sections keep defaults
        assert_eq!(config.retry.max_attempts, 3);
    }
}
