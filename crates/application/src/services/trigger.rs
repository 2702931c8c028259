//! External-trigger service
//!
//! In event mode the delayed-callback service POSTs back at alert time and
//! this service turns the verified callback into a single-reminder fire
//! decision. Time-window evaluation is skipped entirely: the external
//! scheduler already decided *when*.

use std::sync::Arc;

use domain::value_objects::ReminderId;
use tracing::{debug, info, instrument};

use crate::error::ApplicationError;
use crate::ports::ReminderStorePort;
use crate::services::ReminderEngine;

/// Why a trigger was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No reminder with the given id exists
    ReminderNotFound,
    /// The reminder exists but is no longer active
    Inactive,
}

impl SkipReason {
    /// Wire representation used in webhook responses
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ReminderNotFound => "reminder_not_found",
            Self::Inactive => "inactive",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of handling one external trigger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// The reminder dispatched and was acknowledged
    Fired {
        /// Title of the fired reminder, echoed in the response
        title: String,
    },
    /// Nothing happened
    Skipped {
        /// Why the trigger was a no-op
        reason: SkipReason,
    },
}

/// Handles verified external alert callbacks
pub struct TriggerService<S> {
    engine: Arc<ReminderEngine<S>>,
    store: Arc<S>,
}

impl<S> std::fmt::Debug for TriggerService<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriggerService").finish_non_exhaustive()
    }
}

impl<S: ReminderStorePort> TriggerService<S> {
    /// Create a trigger service sharing the engine's fire primitive
    #[must_use]
    pub fn new(engine: Arc<ReminderEngine<S>>, store: Arc<S>) -> Self {
        Self { engine, store }
    }

    /// Fire one reminder in response to an external callback
    ///
    /// `is_recurring` is the flag carried by the callback body, if any. A
    /// one-time reminder is deactivated right after its fire, but only when
    /// the callback explicitly says `false` and the stored reminder agrees.
    #[instrument(skip(self))]
    pub async fn handle_alert(
        &self,
        id: ReminderId,
        is_recurring: Option<bool>,
    ) -> Result<TriggerOutcome, ApplicationError> {
        let Some(reminder) = self.store.find_by_id(id).await? else {
            debug!(reminder_id = %id, "Trigger for unknown reminder");
            return Ok(TriggerOutcome::Skipped {
                reason: SkipReason::ReminderNotFound,
            });
        };

        if !reminder.is_active {
            debug!(reminder_id = %id, "Trigger for inactive reminder");
            return Ok(TriggerOutcome::Skipped {
                reason: SkipReason::Inactive,
            });
        }

        let now = self.engine.now();
        self.engine.fire(&reminder, now).await?;

        if is_recurring == Some(false) && reminder.is_one_time() {
            self.store.deactivate(id).await?;
            info!(reminder_id = %id, "One-time reminder retired after external fire");
        }

        Ok(TriggerOutcome::Fired {
            title: reminder.title,
        })
    }
}
