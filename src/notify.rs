//! Email delivery collaborator interface
//!
//! Actual SMTP transport lives outside the core. The engine only needs to
//! know whether delivery is configured and whether a send succeeded; an
//! unconfigured notifier is a normal condition, not an error.

use anyhow::Result;
use async_trait::async_trait;

/// Outbound email seam
#[async_trait]
pub trait EmailNotifier: Send + Sync {
    /// Whether delivery credentials are present; when false the engine
    /// must not call [`send_email`](Self::send_email)
    fn is_configured(&self) -> bool;

    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

/// Notifier used when no SMTP credentials are configured
pub struct NullNotifier;

#[async_trait]
impl EmailNotifier for NullNotifier {
    fn is_configured(&self) -> bool {
        false
    }

    async fn send_email(&self, _to: &str, _subject: &str, _body: &str) -> Result<()> {
        anyhow::bail!("email delivery is not configured")
    }
}
