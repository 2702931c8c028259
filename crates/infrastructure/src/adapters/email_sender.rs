//! HTTP email sender - Implements the notification sender port against a
//! transactional mail provider's REST API.

use std::time::Duration;

use application::ports::{NotificationError, NotificationSenderPort};
use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::{debug, instrument, warn};

use crate::config::NotifierConfig;

/// Configuration for the HTTP email sender
#[derive(Debug, Clone)]
pub struct EmailSenderConfig {
    /// Base URL of the provider API
    pub base_url: String,
    /// Provider API key; without one every send fails locally
    pub api_key: Option<SecretString>,
    /// Sender address
    pub from_address: String,
    /// Request timeout
    pub timeout: Duration,
}

impl From<&NotifierConfig> for EmailSenderConfig {
    fn from(config: &NotifierConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            from_address: config.from_address.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

/// Email sender over a provider's HTTP API
#[derive(Debug)]
pub struct HttpEmailSender {
    client: reqwest::Client,
    config: EmailSenderConfig,
}

impl HttpEmailSender {
    /// Create a sender from its configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: EmailSenderConfig) -> Result<Self, NotificationError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| NotificationError::OperationFailed(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn map_transport_error(e: &reqwest::Error) -> NotificationError {
        if e.is_connect() || e.is_timeout() {
            NotificationError::ServiceUnavailable
        } else {
            NotificationError::OperationFailed(e.to_string())
        }
    }
}

#[async_trait]
impl NotificationSenderPort for HttpEmailSender {
    #[instrument(skip(self, subject, body))]
    async fn send(
        &self,
        address: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), NotificationError> {
        let Some(ref api_key) = self.config.api_key else {
            warn!("Email sender has no API key configured, dropping notification");
            return Err(NotificationError::OperationFailed(
                "no API key configured".to_string(),
            ));
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.config.base_url))
            .bearer_auth(api_key.expose_secret())
            .json(&json!({
                "from": self.config.from_address,
                "to": address,
                "subject": subject,
                "text": body,
            }))
            .send()
            .await
            .map_err(|e| Self::map_transport_error(&e))?;

        match response.status() {
            status if status.is_success() => {
                debug!(to = address, "Email accepted by provider");
                Ok(())
            },
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                Err(NotificationError::InvalidAddress(address.to_string()))
            },
            status if status.is_server_error() => Err(NotificationError::ServiceUnavailable),
            status => Err(NotificationError::OperationFailed(format!(
                "provider returned {status}"
            ))),
        }
    }
}
