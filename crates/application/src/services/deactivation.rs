//! Deactivation policy
//!
//! Pure predicates deciding whether a reminder's lifecycle is over.
//! One-time reminders retire once acknowledged or once their event time is
//! more than the stale threshold in the past; recurring reminders retire
//! when their next occurrence leaves the configured window.

use chrono::{DateTime, Duration, Utc};
use domain::entities::Reminder;

/// Why a reminder was deactivated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeactivationReason {
    /// One-time reminder already fired (`last_alert_time` is set)
    AlreadyAlerted,
    /// One-time reminder missed its window by more than the stale threshold
    StaleMissed,
    /// Recurring reminder's next occurrence falls after `end_date`
    PastEndDate,
}

impl DeactivationReason {
    /// Human-readable reason, as recorded in logs
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AlreadyAlerted => "already alerted",
            Self::StaleMissed => "stale/missed",
            Self::PastEndDate => "past end_date",
        }
    }
}

impl std::fmt::Display for DeactivationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Decide whether a one-time reminder should be retired at `now`
#[must_use]
pub fn one_time(
    reminder: &Reminder,
    now: DateTime<Utc>,
    stale_threshold: Duration,
) -> Option<DeactivationReason> {
    if reminder.last_alert_time.is_some() {
        return Some(DeactivationReason::AlreadyAlerted);
    }
    if reminder.date < now - stale_threshold {
        return Some(DeactivationReason::StaleMissed);
    }
    None
}

/// Decide whether a recurring reminder should be retired given its next
/// occurrence
#[must_use]
pub fn recurring(
    reminder: &Reminder,
    next_event_time: DateTime<Utc>,
) -> Option<DeactivationReason> {
    match reminder.end_date {
        Some(end_date) if next_event_time > end_date => Some(DeactivationReason::PastEndDate),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use domain::entities::NewReminder;
    use domain::value_objects::ReminderId;

    use super::*;

    const STALE: Duration = Duration::hours(1);

    fn event_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()
    }

    fn one_time_reminder() -> Reminder {
        Reminder::from_new(
            ReminderId::new(1),
            NewReminder::new("Call mum", "Weekly call", event_time()),
        )
    }

    fn recurring_reminder(end_date: Option<DateTime<Utc>>) -> Reminder {
        let mut input =
            NewReminder::new("Standup", "Daily standup", event_time()).recurring("0 9 * * *", event_time());
        input.end_date = end_date;
        Reminder::from_new(ReminderId::new(2), input)
    }

    #[test]
    fn acknowledged_one_time_retires() {
        let mut reminder = one_time_reminder();
        reminder.last_alert_time = Some(event_time());
        let reason = one_time(&reminder, event_time(), STALE).unwrap();
        assert_eq!(reason, DeactivationReason::AlreadyAlerted);
    }

    #[test]
    fn stale_one_time_retires() {
        // Event at 08:00, now 10:00:01 -> more than an hour past
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 1).unwrap();
        let reason = one_time(&one_time_reminder(), now, STALE).unwrap();
        assert_eq!(reason, DeactivationReason::StaleMissed);
    }

    #[test]
    fn exactly_at_threshold_is_kept() {
        // The window check is strict: date < now - threshold
        let now = event_time() + STALE;
        assert!(one_time(&one_time_reminder(), now, STALE).is_none());
    }

    #[test]
    fn fresh_one_time_is_kept() {
        let now = event_time() - Duration::minutes(5);
        assert!(one_time(&one_time_reminder(), now, STALE).is_none());
    }

    #[test]
    fn already_alerted_wins_over_stale() {
        let mut reminder = one_time_reminder();
        reminder.last_alert_time = Some(event_time());
        let now = Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap();
        assert_eq!(
            one_time(&reminder, now, STALE),
            Some(DeactivationReason::AlreadyAlerted)
        );
    }

    #[test]
    fn recurring_past_end_date_retires() {
        let end = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let next = Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap();
        let reason = recurring(&recurring_reminder(Some(end)), next).unwrap();
        assert_eq!(reason, DeactivationReason::PastEndDate);
    }

    #[test]
    fn recurring_at_end_date_is_kept() {
        // next == end_date is still inside the window
        let end = Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap();
        assert!(recurring(&recurring_reminder(Some(end)), end).is_none());
    }

    #[test]
    fn recurring_without_end_date_lives_forever() {
        let next = Utc.with_ymd_and_hms(2099, 1, 1, 9, 0, 0).unwrap();
        assert!(recurring(&recurring_reminder(None), next).is_none());
    }

    #[test]
    fn reason_strings_are_stable() {
        assert_eq!(DeactivationReason::AlreadyAlerted.to_string(), "already alerted");
        assert_eq!(DeactivationReason::StaleMissed.to_string(), "stale/missed");
        assert_eq!(DeactivationReason::PastEndDate.to_string(), "past end_date");
    }
}
