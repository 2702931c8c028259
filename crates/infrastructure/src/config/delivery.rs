//! Notification provider, delayed-callback queue, and webhook configuration.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Notification provider configuration
///
/// Points the HTTP email sender at its provider. An empty API key leaves
/// the sender constructed but unable to deliver; the dispatcher logs and
/// carries on, which is the intended degraded behaviour in development.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Base URL of the email provider API
    #[serde(default = "default_notifier_base_url")]
    pub base_url: String,

    /// Provider API key (sensitive - never serialized back out)
    #[serde(default, skip_serializing)]
    pub api_key: Option<SecretString>,

    /// Sender address for outgoing notifications
    #[serde(default = "default_from_address")]
    pub from_address: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_notifier_base_url() -> String {
    "https://api.mail.example.org".to_string()
}

fn default_from_address() -> String {
    "reminders@localhost".to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            base_url: default_notifier_base_url(),
            api_key: None,
            from_address: default_from_address(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Delayed-callback queue configuration (event mode)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Base URL of the delayed-callback service
    #[serde(default = "default_queue_base_url")]
    pub base_url: String,

    /// API key sent with publish/cancel requests (sensitive)
    #[serde(default, skip_serializing)]
    pub api_key: Option<SecretString>,

    /// Delivery attempts the service should make per callback
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_queue_base_url() -> String {
    "https://queue.example.org".to_string()
}

const fn default_retries() -> u32 {
    3
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            base_url: default_queue_base_url(),
            api_key: None,
            retries: default_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Webhook configuration (event mode)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Public base URL the delayed-callback service POSTs back to
    #[serde(default)]
    pub base_url: String,

    /// Current signing key callbacks are verified against (sensitive)
    #[serde(default, skip_serializing)]
    pub signing_key: Option<SecretString>,

    /// Next signing key, accepted during key rotation (sensitive)
    #[serde(default, skip_serializing)]
    pub next_signing_key: Option<SecretString>,
}

impl WebhookConfig {
    /// Whether signature verification can run at all
    #[must_use]
    pub const fn has_signing_key(&self) -> bool {
        self.signing_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn notifier_defaults() {
        let config = NotifierConfig::default();
        assert!(config.api_key.is_none());
        assert_eq!(config.from_address, "reminders@localhost");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn queue_defaults() {
        let config = QueueConfig::default();
        assert!(config.api_key.is_none());
        assert_eq!(config.retries, 3);
    }

    #[test]
    fn webhook_defaults_have_no_keys() {
        let config = WebhookConfig::default();
        assert!(!config.has_signing_key());
        assert!(config.next_signing_key.is_none());
    }

    #[test]
    fn secrets_deserialize_from_plain_strings() {
        let json = r#"{"api_key":"sk-123","base_url":"https://q.example.org"}"#;
        let config: QueueConfig = serde_json::from_str(json).unwrap();
        assert_eq!(
            config.api_key.as_ref().map(ExposeSecret::expose_secret),
            Some("sk-123")
        );
    }

    #[test]
    fn webhook_with_rotation_pair() {
        let json = r#"{"base_url":"https://r.example.org","signing_key":"current","next_signing_key":"next"}"#;
        let config: WebhookConfig = serde_json::from_str(json).unwrap();
        assert!(config.has_signing_key());
        assert_eq!(
            config
                .next_signing_key
                .as_ref()
                .map(ExposeSecret::expose_secret),
            Some("next")
        );
    }
}
