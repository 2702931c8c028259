//! Notification dispatcher
//!
//! Fans a firing reminder out to its contacts. Only email contacts are
//! dispatched today; the other modes are accepted and skipped. A failure
//! for one contact never stops the remaining contacts and never reaches
//! the caller - the engine acknowledges the fire regardless.

use std::sync::Arc;

use domain::entities::Reminder;
use tracing::{debug, instrument, warn};

use crate::ports::NotificationSenderPort;

/// Fans out notifications for a firing reminder
#[derive(Clone)]
pub struct NotificationDispatcher {
    sender: Arc<dyn NotificationSenderPort>,
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationDispatcher").finish_non_exhaustive()
    }
}

impl NotificationDispatcher {
    /// Create a dispatcher over a notification transport
    #[must_use]
    pub fn new(sender: Arc<dyn NotificationSenderPort>) -> Self {
        Self { sender }
    }

    /// Notify every contact of the reminder, sequentially
    ///
    /// Per-contact failures are logged and swallowed.
    #[instrument(skip(self, reminder), fields(reminder_id = %reminder.id))]
    pub async fn send(&self, reminder: &Reminder) {
        for contact in &reminder.contacts {
            if !contact.mode.is_dispatchable() {
                debug!(
                    contact_id = contact.id,
                    mode = %contact.mode,
                    "Skipping contact without a dispatch implementation"
                );
                continue;
            }

            match self
                .sender
                .send(&contact.address, &reminder.title, &reminder.description)
                .await
            {
                Ok(()) => {
                    debug!(contact_id = contact.id, "Notification sent");
                },
                Err(e) => {
                    warn!(
                        contact_id = contact.id,
                        error = %e,
                        "Failed to notify contact, continuing with the rest"
                    );
                },
            }
        }
    }
}
