//! Alert value object - an offset-based pre-notification on a reminder

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::DomainError;

/// Smallest accepted alert offset in milliseconds
///
/// Offsets below one tick interval cannot be hit reliably, so creation
/// rejects them outright.
pub const MIN_ALERT_OFFSET_MS: i64 = 3000;

/// An alert on a reminder, expressed as a positive offset before event time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    /// Identifier within the reminder's alert set
    pub id: i64,
    /// Offset in milliseconds before the event time
    #[serde(rename = "offsetMs")]
    pub offset_ms: i64,
}

impl Alert {
    /// Create a new alert, enforcing the offset floor
    ///
    /// # Errors
    ///
    /// Returns a validation error if `offset_ms` is below
    /// [`MIN_ALERT_OFFSET_MS`].
    pub fn new(id: i64, offset_ms: i64) -> Result<Self, DomainError> {
        if offset_ms < MIN_ALERT_OFFSET_MS {
            return Err(DomainError::validation(format!(
                "alert offset must be at least {MIN_ALERT_OFFSET_MS} ms, got {offset_ms}"
            )));
        }
        Ok(Self { id, offset_ms })
    }

    /// The instant at which this alert is due for a given event time
    #[must_use]
    pub fn alert_instant(&self, event_time: DateTime<Utc>) -> DateTime<Utc> {
        event_time - Duration::milliseconds(self.offset_ms)
    }
}
