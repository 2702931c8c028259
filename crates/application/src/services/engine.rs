//! Scheduling engine
//!
//! Per-tick orchestration over the active reminders: compute each
//! reminder's event time, retire finished lifecycles, select the alert due
//! this tick, dispatch, and record the acknowledgement. The cleanup sweep
//! is the same pipeline with dispatching removed; the external-trigger
//! adapter reuses the `fire` primitive directly.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use domain::entities::Reminder;
use serde::Serialize;
use tracing::{debug, error, info, instrument};

use crate::error::ApplicationError;
use crate::ports::{Clock, ReminderStorePort};
use crate::services::deactivation::DeactivationReason;
use crate::services::{NotificationDispatcher, alert_selector, deactivation, recurrence};

/// Engine timing knobs
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Width of the due window; also the polling cadence
    pub tick_interval: Duration,
    /// How far past its event time an unacknowledged one-time reminder may
    /// drift before it is reaped
    pub stale_threshold: Duration,
}

impl EngineConfig {
    /// Build a config from millisecond values
    #[must_use]
    pub const fn from_millis(tick_interval_ms: i64, stale_threshold_ms: i64) -> Self {
        Self {
            tick_interval: Duration::milliseconds(tick_interval_ms),
            stale_threshold: Duration::milliseconds(stale_threshold_ms),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_millis(3000, 3_600_000)
    }
}

/// Outcome counts of a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TickSummary {
    /// Active reminders examined
    pub checked: usize,
    /// Reminders that dispatched and were acknowledged
    pub fired: usize,
    /// Reminders retired this tick
    pub deactivated: usize,
}

/// Outcome counts of a cleanup sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    /// Active reminders examined
    pub checked: usize,
    /// Reminders retired by the sweep
    pub deactivated: usize,
}

enum TickDecision {
    Skip,
    Deactivate(DeactivationReason),
    Fire(i64),
}

/// The reminder scheduling engine
pub struct ReminderEngine<S> {
    store: Arc<S>,
    dispatcher: NotificationDispatcher,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
}

impl<S> std::fmt::Debug for ReminderEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReminderEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<S: ReminderStorePort> ReminderEngine<S> {
    /// Create a new engine over its collaborators
    #[must_use]
    pub fn new(
        store: Arc<S>,
        dispatcher: NotificationDispatcher,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            dispatcher,
            clock,
            config,
        }
    }

    /// The engine's current instant
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Run one tick over all active reminders
    ///
    /// A failing read of the active list aborts the tick; a failing write
    /// for one reminder is logged and the loop continues.
    #[instrument(skip(self))]
    pub async fn run_tick(&self) -> Result<TickSummary, ApplicationError> {
        let active = self.store.find_active().await?;
        let now = self.clock.now();
        let mut summary = TickSummary::default();

        for reminder in active {
            summary.checked += 1;
            match self.decide(&reminder, now) {
                TickDecision::Skip => {},
                TickDecision::Deactivate(reason) => {
                    info!(reminder_id = %reminder.id, %reason, "Deactivating reminder");
                    if let Err(e) = self.store.deactivate(reminder.id).await {
                        error!(reminder_id = %reminder.id, error = %e, "Failed to deactivate reminder");
                        continue;
                    }
                    summary.deactivated += 1;
                },
                TickDecision::Fire(alert_id) => {
                    debug!(reminder_id = %reminder.id, alert_id, "Alert due this tick");
                    if let Err(e) = self.fire(&reminder, now).await {
                        error!(reminder_id = %reminder.id, error = %e, "Failed to acknowledge fired alert");
                        continue;
                    }
                    summary.fired += 1;
                },
            }
        }

        debug!(
            checked = summary.checked,
            fired = summary.fired,
            deactivated = summary.deactivated,
            "Tick complete"
        );
        Ok(summary)
    }

    /// Batch variant of the tick that only deactivates, never dispatches
    ///
    /// Intended for low-frequency execution to reap reminders the live loop
    /// never saw. In event mode this is the only GC path.
    #[instrument(skip(self))]
    pub async fn cleanup_sweep(&self) -> Result<SweepSummary, ApplicationError> {
        let active = self.store.find_active().await?;
        let now = self.clock.now();
        let mut summary = SweepSummary::default();

        for reminder in active {
            summary.checked += 1;
            let Some(reason) = self.sweep_decision(&reminder, now) else {
                continue;
            };
            info!(reminder_id = %reminder.id, %reason, "Cleanup deactivating reminder");
            if let Err(e) = self.store.deactivate(reminder.id).await {
                error!(reminder_id = %reminder.id, error = %e, "Cleanup failed to deactivate reminder");
                continue;
            }
            summary.deactivated += 1;
        }

        info!(
            checked = summary.checked,
            deactivated = summary.deactivated,
            "Cleanup sweep complete"
        );
        Ok(summary)
    }

    /// Fire one reminder: dispatch, then acknowledge
    ///
    /// The acknowledgement happens after (and regardless of) dispatch
    /// outcomes; per-contact notification failures never block it. Both the
    /// tick loop and the external-trigger adapter use this primitive.
    pub async fn fire(
        &self,
        reminder: &Reminder,
        now: DateTime<Utc>,
    ) -> Result<(), ApplicationError> {
        self.dispatcher.send(reminder).await;
        self.store.set_last_alert_time(reminder.id, now).await?;
        info!(reminder_id = %reminder.id, title = %reminder.title, "Reminder fired");
        Ok(())
    }

    fn decide(&self, reminder: &Reminder, now: DateTime<Utc>) -> TickDecision {
        if !reminder.has_alerts() {
            return TickDecision::Skip;
        }

        let event_time = match reminder
            .recurrence
            .as_deref()
            .filter(|_| reminder.is_recurring)
        {
            Some(expression) => {
                // Parse failure: skip this tick, never deactivate
                let Some(next) = recurrence::next_occurrence(expression, now) else {
                    return TickDecision::Skip;
                };
                if let Some(reason) = deactivation::recurring(reminder, next) {
                    return TickDecision::Deactivate(reason);
                }
                next
            },
            None => {
                // One-time retirement runs before alert selection, so a
                // fired reminder is retired on the tick after its fire.
                if let Some(reason) =
                    deactivation::one_time(reminder, now, self.config.stale_threshold)
                {
                    return TickDecision::Deactivate(reason);
                }
                reminder.date
            },
        };

        match alert_selector::alert_to_fire(reminder, event_time, now, self.config.tick_interval) {
            Some(alert) => TickDecision::Fire(alert.id),
            None => TickDecision::Skip,
        }
    }

    fn sweep_decision(&self, reminder: &Reminder, now: DateTime<Utc>) -> Option<DeactivationReason> {
        if !reminder.has_alerts() {
            return None;
        }
        match reminder
            .recurrence
            .as_deref()
            .filter(|_| reminder.is_recurring)
        {
            Some(expression) => {
                let next = recurrence::next_occurrence(expression, now)?;
                deactivation::recurring(reminder, next)
            },
            None => deactivation::one_time(reminder, now, self.config.stale_threshold),
        }
    }
}
