//! Email delivery configuration

use serde::{Deserialize, Serialize};

/// SMTP settings for the email notifier collaborator.
///
/// When incomplete, email delivery is considered unconfigured and the
/// notifier must not be invoked.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_user: String,
    pub smtp_pass: String,
    pub smtp_from: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: String::new(),
            smtp_port: 587,
            smtp_user: String::new(),
            smtp_pass: String::new(),
            smtp_from: String::new(),
        }
    }
}

impl EmailConfig {
    /// All credentials present, so delivery may be attempted
    pub fn is_configured(&self) -> bool {
        !self.smtp_host.is_empty()
            && self.smtp_port != 0
            && !self.smtp_user.is_empty()
            && !self.smtp_pass.is_empty()
            && !self.smtp_from.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_by_default() {
        assert!(!EmailConfig::default().is_configured());
    }

    #[test]
    fn configured_when_all_fields_set() {
        let config = EmailConfig {
            smtp_host: "smtp.example.com".into(),
            smtp_port: 587,
            smtp_user: "bot".into(),
            smtp_pass: "secret".into(),
            smtp_from: "alerts@example.com".into(),
        };
        assert!(config.is_configured());
    }
}
