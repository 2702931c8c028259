//! Delayed-callback queue port
//!
//! In event mode the engine does not poll; it registers alert instants with
//! an external service that POSTs a signed webhook back at the right time.
//! This port is the client side of that service.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for the external delayed-callback service
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AlertQueuePort: Send + Sync {
    /// Schedule a single HTTP POST of `body` to `url` after `delay_seconds`
    ///
    /// Returns the service-assigned message id.
    async fn publish_one_shot(
        &self,
        url: &str,
        body: serde_json::Value,
        delay_seconds: u64,
    ) -> Result<String, ApplicationError>;

    /// Install a recurring schedule POSTing `body` to `url` per `cron`
    ///
    /// Returns the service-assigned schedule id.
    async fn publish_cron(
        &self,
        url: &str,
        cron: &str,
        body: serde_json::Value,
    ) -> Result<String, ApplicationError>;

    /// Cancel a one-shot message or a cron schedule by id
    async fn cancel(&self, id: &str) -> Result<(), ApplicationError>;
}
