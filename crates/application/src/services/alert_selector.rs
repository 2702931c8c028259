//! Alert selector
//!
//! Decides which alert of a reminder is due in the current tick. At most
//! one alert fires per reminder per tick: a single acknowledgement covers
//! the tick's work, and the next tick picks up anything still due.

use chrono::{DateTime, Duration, Utc};
use domain::entities::Reminder;
use domain::value_objects::Alert;

/// Select the alert to fire this tick, if any
///
/// An alert is due iff `0 <= now - alert_instant < tick_interval` (the
/// window is half-open so an instant on a tick boundary fires exactly
/// once). For recurring reminders an alert whose instant is already covered
/// by `last_alert_time` counts as acknowledged and is skipped. Iteration
/// order is the stored alert order; the first match wins.
#[must_use]
pub fn alert_to_fire<'a>(
    reminder: &'a Reminder,
    event_time: DateTime<Utc>,
    now: DateTime<Utc>,
    tick_interval: Duration,
) -> Option<&'a Alert> {
    reminder.alerts.iter().find(|alert| {
        let alert_instant = alert.alert_instant(event_time);
        let diff = now - alert_instant;
        if diff < Duration::zero() || diff >= tick_interval {
            return false;
        }
        if reminder.is_recurring
            && reminder
                .last_alert_time
                .is_some_and(|acknowledged| acknowledged >= alert_instant)
        {
            return false;
        }
        true
    })
}
