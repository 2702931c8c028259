//! Reminder storage port
//!
//! Defines the interface for persisting and querying reminders.
//! The SQLite adapter in the infrastructure layer implements this port.
//! All storage faults surface as `ApplicationError::Storage`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::entities::{NewReminder, Reminder, ReminderPatch};
use domain::value_objects::ReminderId;
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for reminder persistence operations
///
/// Reminders handed out by the port are by-value snapshots; mutations only
/// happen through the port's own operations.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ReminderStorePort: Send + Sync {
    /// Fetch every stored reminder, active or not
    async fn find_all(&self) -> Result<Vec<Reminder>, ApplicationError>;

    /// Fetch the reminders visible to the scheduling loop
    async fn find_active(&self) -> Result<Vec<Reminder>, ApplicationError>;

    /// Fetch a single reminder by id
    async fn find_by_id(&self, id: ReminderId) -> Result<Option<Reminder>, ApplicationError>;

    /// Validate and persist a new reminder; returns the assigned id
    ///
    /// Defaults `is_active` to true and leaves `last_alert_time` unset.
    async fn create(&self, input: NewReminder) -> Result<ReminderId, ApplicationError>;

    /// Apply a partial update; returns whether the row existed
    async fn update(&self, id: ReminderId, patch: ReminderPatch)
    -> Result<bool, ApplicationError>;

    /// Delete a reminder; returns whether the row existed
    async fn delete(&self, id: ReminderId) -> Result<bool, ApplicationError>;

    /// Delete several reminders; returns how many rows existed
    async fn delete_bulk(&self, ids: &[ReminderId]) -> Result<u64, ApplicationError>;

    /// Set `is_active` to false; idempotent
    async fn deactivate(&self, id: ReminderId) -> Result<(), ApplicationError>;

    /// Overwrite the acknowledgement cursor unconditionally
    async fn set_last_alert_time(
        &self,
        id: ReminderId,
        instant: DateTime<Utc>,
    ) -> Result<(), ApplicationError>;
}
