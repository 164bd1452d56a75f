//! dealwatch: polite e-commerce price tracking and deal notification
//!
//! A crawl-and-extract pipeline for third-party marketplaces:
//! - Polite fetching (robots.txt compliance, identity rotation, retry/backoff)
//! - Pure per-marketplace extraction adapters over raw markup
//! - Multi-page search with relevance ranking
//! - Price history and alert evaluation with notification events
//! - A recheck scheduler tying cadence to prior outcomes
//!
//! Storage and email delivery are narrow collaborator traits; the crate
//! ships an in-memory store and an unconfigured notifier for tests and
//! demos.

pub mod alerts;
pub mod config;
pub mod extract;
pub mod fetch;
pub mod notify;
pub mod scheduler;
pub mod search;
pub mod store;
pub mod types;
pub mod util;

pub use config::Config;
pub use types::*;
