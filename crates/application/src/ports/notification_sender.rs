//! Notification sender port
//!
//! Transport-agnostic interface for delivering a single notification.
//! The engine never cares whether an SMTP relay or an HTTP mail API sits
//! behind it.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use thiserror::Error;

/// Errors a notification transport can produce
#[derive(Debug, Error)]
pub enum NotificationError {
    /// The address is not valid for this transport
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// The transport is unreachable or refused the connection
    #[error("Notification service unavailable")]
    ServiceUnavailable,

    /// The transport rejected the message
    #[error("Notification failed: {0}")]
    OperationFailed(String),
}

/// Port for sending a single notification to one address
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NotificationSenderPort: Send + Sync {
    /// Deliver `body` with `subject` to `address`
    async fn send(
        &self,
        address: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), NotificationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trait_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn NotificationSenderPort>();
    }

    #[test]
    fn error_messages_are_correct() {
        assert_eq!(
            NotificationError::InvalidAddress("x".to_string()).to_string(),
            "Invalid address: x"
        );
        assert_eq!(
            NotificationError::ServiceUnavailable.to_string(),
            "Notification service unavailable"
        );
        assert_eq!(
            NotificationError::OperationFailed("bounced".to_string()).to_string(),
            "Notification failed: bounced"
        );
    }
}
