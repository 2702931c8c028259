//! Delayed-callback queue client - Implements the alert queue port against
//! the external callback service's REST API.
//!
//! The service accepts one-shot messages and cron schedules, and POSTs the
//! stored body back to the given URL at the right time, signing each
//! callback with the webhook signing keys.

use std::time::Duration;

use application::ApplicationError;
use application::ports::AlertQueuePort;
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument};

use crate::config::QueueConfig;

/// Configuration for the queue client
#[derive(Debug, Clone)]
pub struct QueueClientConfig {
    /// Base URL of the delayed-callback service
    pub base_url: String,
    /// API key sent as bearer auth
    pub api_key: Option<SecretString>,
    /// Delivery attempts the service should make per callback
    pub retries: u32,
    /// Request timeout
    pub timeout: Duration,
}

impl From<&QueueConfig> for QueueClientConfig {
    fn from(config: &QueueConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            retries: config.retries,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PublishResponse {
    id: String,
}

/// Client for the delayed-callback service
#[derive(Debug)]
pub struct HttpCallbackQueue {
    client: reqwest::Client,
    config: QueueClientConfig,
}

impl HttpCallbackQueue {
    /// Create a client from its configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(config: QueueClientConfig) -> Result<Self, ApplicationError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApplicationError::Configuration(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(method, format!("{}{path}", self.config.base_url));
        if let Some(ref api_key) = self.config.api_key {
            builder = builder.bearer_auth(api_key.expose_secret());
        }
        builder
    }

    async fn publish(
        &self,
        path: &str,
        payload: serde_json::Value,
    ) -> Result<String, ApplicationError> {
        let response = self
            .request(reqwest::Method::POST, path)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ApplicationError::ExternalService(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApplicationError::ExternalService(format!(
                "callback queue returned {status}"
            )));
        }

        let parsed: PublishResponse = response
            .json()
            .await
            .map_err(|e| ApplicationError::ExternalService(e.to_string()))?;
        Ok(parsed.id)
    }
}

#[async_trait]
impl AlertQueuePort for HttpCallbackQueue {
    #[instrument(skip(self, body))]
    async fn publish_one_shot(
        &self,
        url: &str,
        body: serde_json::Value,
        delay_seconds: u64,
    ) -> Result<String, ApplicationError> {
        let id = self
            .publish(
                "/v1/messages",
                json!({
                    "url": url,
                    "body": body,
                    "delay_seconds": delay_seconds,
                    "retries": self.config.retries,
                }),
            )
            .await?;
        debug!(message_id = %id, delay_seconds, "Published one-shot callback");
        Ok(id)
    }

    #[instrument(skip(self, body))]
    async fn publish_cron(
        &self,
        url: &str,
        cron: &str,
        body: serde_json::Value,
    ) -> Result<String, ApplicationError> {
        let id = self
            .publish(
                "/v1/schedules",
                json!({
                    "url": url,
                    "cron": cron,
                    "body": body,
                    "retries": self.config.retries,
                }),
            )
            .await?;
        debug!(schedule_id = %id, cron, "Published cron schedule");
        Ok(id)
    }

    #[instrument(skip(self))]
    async fn cancel(&self, id: &str) -> Result<(), ApplicationError> {
        let response = self
            .request(reqwest::Method::DELETE, &format!("/v1/messages/{id}"))
            .send()
            .await
            .map_err(|e| ApplicationError::ExternalService(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApplicationError::ExternalService(format!(
                "cancel returned {status}"
            )));
        }
        debug!(message_id = %id, "Cancelled callback");
        Ok(())
    }
}
