//! Event-mode store decorator
//!
//! Wraps a reminder store and keeps the external delayed-callback service
//! in sync with it: alerts are registered after create/update and
//! cancelled on delete/deactivate. Queue failures never fail the store
//! operation - a missed cancellation is harmless because the callback for
//! a gone or inactive reminder answers with a skip.
//!
//! With no publisher attached the decorator is a pure pass-through, which
//! is what polling mode uses.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::entities::{NewReminder, Reminder, ReminderPatch};
use domain::value_objects::ReminderId;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::error::ApplicationError;
use crate::ports::ReminderStorePort;
use crate::services::AlertSchedulePublisher;

/// Store decorator that mirrors mutations into the delayed-callback queue
pub struct SchedulingReminderStore<S> {
    inner: Arc<S>,
    publisher: Option<Arc<AlertSchedulePublisher>>,
    registrations: RwLock<HashMap<ReminderId, Vec<String>>>,
}

impl<S> std::fmt::Debug for SchedulingReminderStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchedulingReminderStore")
            .field("publisher", &self.publisher.is_some())
            .field("registrations", &self.registrations.read().len())
            .finish_non_exhaustive()
    }
}

impl<S: ReminderStorePort> SchedulingReminderStore<S> {
    /// Wrap a store; pass `None` for polling mode
    #[must_use]
    pub fn new(inner: Arc<S>, publisher: Option<Arc<AlertSchedulePublisher>>) -> Self {
        Self {
            inner,
            publisher,
            registrations: RwLock::new(HashMap::new()),
        }
    }

    /// Register the reminder's alerts with the queue, best-effort
    async fn register(&self, id: ReminderId) {
        let Some(ref publisher) = self.publisher else {
            return;
        };

        let reminder = match self.inner.find_by_id(id).await {
            Ok(Some(reminder)) => reminder,
            Ok(None) => return,
            Err(e) => {
                warn!(reminder_id = %id, error = %e, "Could not load reminder for schedule registration");
                return;
            },
        };
        if !reminder.is_active {
            return;
        }

        match publisher.schedule_alerts(&reminder).await {
            Ok(ids) => {
                if !ids.is_empty() {
                    self.registrations.write().insert(id, ids);
                }
            },
            Err(e) => {
                warn!(reminder_id = %id, error = %e, "Failed to register alert schedules");
            },
        }
    }

    /// Cancel whatever the reminder has registered, best-effort
    async fn cancel_registered(&self, id: ReminderId) {
        let Some(ids) = self.registrations.write().remove(&id) else {
            return;
        };
        let Some(ref publisher) = self.publisher else {
            return;
        };

        if let Err(e) = publisher.cancel_schedules(&ids).await {
            // The leftover callbacks answer with a skip response
            warn!(reminder_id = %id, error = %e, "Failed to cancel alert schedules");
        } else {
            debug!(reminder_id = %id, count = ids.len(), "Cancelled alert schedules");
        }
    }
}

#[async_trait]
impl<S: ReminderStorePort> ReminderStorePort for SchedulingReminderStore<S> {
    async fn find_all(&self) -> Result<Vec<Reminder>, ApplicationError> {
        self.inner.find_all().await
    }

    async fn find_active(&self) -> Result<Vec<Reminder>, ApplicationError> {
        self.inner.find_active().await
    }

    async fn find_by_id(&self, id: ReminderId) -> Result<Option<Reminder>, ApplicationError> {
        self.inner.find_by_id(id).await
    }

    async fn create(&self, input: NewReminder) -> Result<ReminderId, ApplicationError> {
        let id = self.inner.create(input).await?;
        self.register(id).await;
        Ok(id)
    }

    async fn update(
        &self,
        id: ReminderId,
        patch: ReminderPatch,
    ) -> Result<bool, ApplicationError> {
        let existed = self.inner.update(id, patch).await?;
        if existed {
            self.cancel_registered(id).await;
            self.register(id).await;
        }
        Ok(existed)
    }

    async fn delete(&self, id: ReminderId) -> Result<bool, ApplicationError> {
        let existed = self.inner.delete(id).await?;
        if existed {
            self.cancel_registered(id).await;
        }
        Ok(existed)
    }

    async fn delete_bulk(&self, ids: &[ReminderId]) -> Result<u64, ApplicationError> {
        let deleted = self.inner.delete_bulk(ids).await?;
        for id in ids {
            self.cancel_registered(*id).await;
        }
        Ok(deleted)
    }

    async fn deactivate(&self, id: ReminderId) -> Result<(), ApplicationError> {
        self.inner.deactivate(id).await?;
        self.cancel_registered(id).await;
        Ok(())
    }

    async fn set_last_alert_time(
        &self,
        id: ReminderId,
        instant: DateTime<Utc>,
    ) -> Result<(), ApplicationError> {
        self.inner.set_last_alert_time(id, instant).await
    }
}
