//! Reminder entity - the aggregate root of the scheduling engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::DomainError;
use crate::value_objects::{Alert, Contact, MIN_ALERT_OFFSET_MS, ReminderId};

/// A stored reminder
///
/// `date` is the one-time fire instant, or the recurrence anchor for
/// recurring reminders. The engine only ever mutates `last_alert_time` and
/// `is_active`; everything else changes through CRUD.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    /// Store-assigned identifier, immutable after creation
    pub id: ReminderId,
    /// Short title, used as the notification subject
    pub title: String,
    /// Detailed description, used as the notification body
    pub description: String,
    /// Event instant (UTC): fire instant for one-time, anchor for recurring
    pub date: DateTime<Utc>,
    /// Optional free-form location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Recipients, in dispatch order
    pub contacts: Vec<Contact>,
    /// Alert offsets before the event time
    pub alerts: Vec<Alert>,
    /// Whether the reminder recurs on a cron schedule
    pub is_recurring: bool,
    /// Cron expression (5-field, UTC); required when `is_recurring`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<String>,
    /// Start of the recurrence window; required when `is_recurring`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    /// End of the recurrence window; passing it retires the reminder
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    /// Acknowledgement cursor, set whenever an alert fires
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_alert_time: Option<DateTime<Utc>>,
    /// Inactive reminders are invisible to the scheduling loop
    pub is_active: bool,
}

impl Reminder {
    /// Materialise a reminder from validated creation input and a fresh id
    #[must_use]
    pub fn from_new(id: ReminderId, input: NewReminder) -> Self {
        Self {
            id,
            title: input.title,
            description: input.description,
            date: input.date,
            location: input.location,
            contacts: input.contacts,
            alerts: input.alerts,
            is_recurring: input.is_recurring,
            recurrence: input.recurrence,
            start_date: input.start_date,
            end_date: input.end_date,
            last_alert_time: None,
            is_active: true,
        }
    }

    /// Whether there is anything to fire at all
    #[must_use]
    pub fn has_alerts(&self) -> bool {
        !self.alerts.is_empty()
    }

    /// Whether this reminder fires exactly once
    #[must_use]
    pub const fn is_one_time(&self) -> bool {
        !self.is_recurring
    }

    /// Re-check the aggregate invariants after a mutation
    ///
    /// # Errors
    ///
    /// Returns a validation error if any creation-time invariant no longer
    /// holds.
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_parts(
            &self.title,
            &self.description,
            &self.alerts,
            self.is_recurring,
            self.recurrence.as_deref(),
            self.start_date,
        )
    }
}

impl std::fmt::Display for Reminder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = if self.is_recurring { "recurring" } else { "one-time" };
        write!(f, "[{}] {} ({kind})", self.id, self.title)
    }
}

/// Creation input for a reminder
///
/// The store assigns the id, defaults `is_active` to true and leaves
/// `last_alert_time` unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReminder {
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub contacts: Vec<Contact>,
    #[serde(default)]
    pub alerts: Vec<Alert>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub recurrence: Option<String>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
}

impl NewReminder {
    /// Create a one-time reminder input
    #[must_use]
    pub fn new(title: impl Into<String>, description: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            date,
            location: None,
            contacts: Vec::new(),
            alerts: Vec::new(),
            is_recurring: false,
            recurrence: None,
            start_date: None,
            end_date: None,
        }
    }

    /// Set a location
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the recipients
    #[must_use]
    pub fn with_contacts(mut self, contacts: Vec<Contact>) -> Self {
        self.contacts = contacts;
        self
    }

    /// Set the alert offsets
    #[must_use]
    pub fn with_alerts(mut self, alerts: Vec<Alert>) -> Self {
        self.alerts = alerts;
        self
    }

    /// Turn this into a recurring reminder anchored at `start_date`
    #[must_use]
    pub fn recurring(mut self, cron: impl Into<String>, start_date: DateTime<Utc>) -> Self {
        self.is_recurring = true;
        self.recurrence = Some(cron.into());
        self.start_date = Some(start_date);
        self
    }

    /// Set the end of the recurrence window
    #[must_use]
    pub const fn with_end_date(mut self, end_date: DateTime<Utc>) -> Self {
        self.end_date = Some(end_date);
        self
    }

    /// Check the creation invariants
    ///
    /// # Errors
    ///
    /// Returns a validation error when the title or description is empty,
    /// an alert offset is below the floor, or a recurring reminder misses
    /// its recurrence or start date.
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_parts(
            &self.title,
            &self.description,
            &self.alerts,
            self.is_recurring,
            self.recurrence.as_deref(),
            self.start_date,
        )
    }
}

/// Partial update for a reminder
///
/// `None` leaves a field untouched; the double-`Option` fields distinguish
/// "leave as is" from "clear".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReminderPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub location: Option<Option<String>>,
    #[serde(default)]
    pub contacts: Option<Vec<Contact>>,
    #[serde(default)]
    pub alerts: Option<Vec<Alert>>,
    #[serde(default)]
    pub is_recurring: Option<bool>,
    #[serde(default)]
    pub recurrence: Option<Option<String>>,
    #[serde(default)]
    pub start_date: Option<Option<DateTime<Utc>>>,
    #[serde(default)]
    pub end_date: Option<Option<DateTime<Utc>>>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl ReminderPatch {
    /// Whether this patch changes anything at all
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.date.is_none()
            && self.location.is_none()
            && self.contacts.is_none()
            && self.alerts.is_none()
            && self.is_recurring.is_none()
            && self.recurrence.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.is_active.is_none()
    }

    /// Apply this patch to a reminder in place
    pub fn apply(self, reminder: &mut Reminder) {
        if let Some(title) = self.title {
            reminder.title = title;
        }
        if let Some(description) = self.description {
            reminder.description = description;
        }
        if let Some(date) = self.date {
            reminder.date = date;
        }
        if let Some(location) = self.location {
            reminder.location = location;
        }
        if let Some(contacts) = self.contacts {
            reminder.contacts = contacts;
        }
        if let Some(alerts) = self.alerts {
            reminder.alerts = alerts;
        }
        if let Some(is_recurring) = self.is_recurring {
            reminder.is_recurring = is_recurring;
        }
        if let Some(recurrence) = self.recurrence {
            reminder.recurrence = recurrence;
        }
        if let Some(start_date) = self.start_date {
            reminder.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            reminder.end_date = end_date;
        }
        if let Some(is_active) = self.is_active {
            reminder.is_active = is_active;
        }
    }
}

fn validate_parts(
    title: &str,
    description: &str,
    alerts: &[Alert],
    is_recurring: bool,
    recurrence: Option<&str>,
    start_date: Option<DateTime<Utc>>,
) -> Result<(), DomainError> {
    if title.trim().is_empty() {
        return Err(DomainError::validation("title must not be empty"));
    }
    if description.trim().is_empty() {
        return Err(DomainError::validation("description must not be empty"));
    }
    for alert in alerts {
        if alert.offset_ms < MIN_ALERT_OFFSET_MS {
            return Err(DomainError::validation(format!(
                "alert {} offset must be at least {MIN_ALERT_OFFSET_MS} ms",
                alert.id
            )));
        }
    }
    if is_recurring {
        if recurrence.is_none_or(|c| c.trim().is_empty()) {
            return Err(DomainError::validation(
                "recurring reminders require a recurrence expression",
            ));
        }
        if start_date.is_none() {
            return Err(DomainError::validation(
                "recurring reminders require a start date",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::value_objects::ContactMode;

    fn sample_date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap()
    }

    fn sample_input() -> NewReminder {
        NewReminder::new("Dentist", "Bring the referral letter", sample_date())
            .with_contacts(vec![Contact::email(1, "anna@example.org")])
            .with_alerts(vec![Alert::new(1, 60_000).unwrap()])
    }

    #[test]
    fn from_new_defaults_lifecycle_fields() {
        let reminder = Reminder::from_new(ReminderId::new(1), sample_input());
        assert!(reminder.is_active);
        assert!(reminder.last_alert_time.is_none());
        assert!(reminder.is_one_time());
        assert!(reminder.has_alerts());
    }

    #[test]
    fn valid_one_time_input_passes() {
        assert!(sample_input().validate().is_ok());
    }

    #[test]
    fn empty_title_is_rejected() {
        let mut input = sample_input();
        input.title = "   ".to_string();
        assert!(input.validate().is_err());
    }

    #[test]
    fn empty_description_is_rejected() {
        let mut input = sample_input();
        input.description = String::new();
        assert!(input.validate().is_err());
    }

    #[test]
    fn alert_offset_below_floor_is_rejected() {
        let mut input = sample_input();
        // Bypass Alert::new to simulate a deserialized payload
        input.alerts = vec![Alert { id: 1, offset_ms: 1000 }];
        let err = input.validate().unwrap_err();
        assert!(err.to_string().contains("at least 3000"));
    }

    #[test]
    fn recurring_requires_recurrence_and_start_date() {
        let mut input = sample_input();
        input.is_recurring = true;
        assert!(input.validate().is_err());

        input.recurrence = Some("*/5 * * * *".to_string());
        assert!(input.validate().is_err());

        input.start_date = Some(sample_date());
        assert!(input.validate().is_ok());
    }

    #[test]
    fn recurring_builder_sets_all_fields() {
        let input = sample_input().recurring("0 9 * * *", sample_date());
        assert!(input.is_recurring);
        assert_eq!(input.recurrence.as_deref(), Some("0 9 * * *"));
        assert_eq!(input.start_date, Some(sample_date()));
        assert!(input.validate().is_ok());
    }

    #[test]
    fn blank_recurrence_is_rejected() {
        let input = sample_input().recurring("  ", sample_date());
        assert!(input.validate().is_err());
    }

    #[test]
    fn empty_patch_is_empty() {
        assert!(ReminderPatch::default().is_empty());
        let patch = ReminderPatch {
            title: Some("New".to_string()),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn patch_applies_only_set_fields() {
        let mut reminder = Reminder::from_new(ReminderId::new(1), sample_input());
        let patch = ReminderPatch {
            title: Some("Orthodontist".to_string()),
            location: Some(Some("Praxis am Markt".to_string())),
            ..Default::default()
        };
        patch.apply(&mut reminder);

        assert_eq!(reminder.title, "Orthodontist");
        assert_eq!(reminder.location.as_deref(), Some("Praxis am Markt"));
        // Untouched fields survive
        assert_eq!(reminder.description, "Bring the referral letter");
        assert_eq!(reminder.date, sample_date());
    }

    #[test]
    fn patch_can_clear_nullable_fields() {
        let mut reminder = Reminder::from_new(
            ReminderId::new(1),
            sample_input()
                .with_location("Berlin")
                .with_end_date(sample_date()),
        );
        let patch = ReminderPatch {
            location: Some(None),
            end_date: Some(None),
            ..Default::default()
        };
        patch.apply(&mut reminder);

        assert!(reminder.location.is_none());
        assert!(reminder.end_date.is_none());
    }

    #[test]
    fn patch_can_deactivate() {
        let mut reminder = Reminder::from_new(ReminderId::new(1), sample_input());
        let patch = ReminderPatch {
            is_active: Some(false),
            ..Default::default()
        };
        patch.apply(&mut reminder);
        assert!(!reminder.is_active);
    }

    #[test]
    fn display_shows_kind() {
        let one_time = Reminder::from_new(ReminderId::new(3), sample_input());
        assert_eq!(one_time.to_string(), "[3] Dentist (one-time)");

        let recurring = Reminder::from_new(
            ReminderId::new(4),
            sample_input().recurring("*/5 * * * *", sample_date()),
        );
        assert!(recurring.to_string().ends_with("(recurring)"));
    }

    #[test]
    fn contacts_preserve_order() {
        let input = sample_input().with_contacts(vec![
            Contact::email(1, "first@example.org"),
            Contact::new(2, ContactMode::Sms, "+491701234567"),
            Contact::email(3, "third@example.org"),
        ]);
        let reminder = Reminder::from_new(ReminderId::new(1), input);
        let ids: Vec<i64> = reminder.contacts.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn serialization_roundtrip() {
        let reminder = Reminder::from_new(
            ReminderId::new(9),
            sample_input()
                .recurring("0 9 * * *", sample_date())
                .with_end_date(Utc.with_ymd_and_hms(2025, 12, 31, 0, 0, 0).unwrap()),
        );
        let json = serde_json::to_string(&reminder).unwrap();
        let back: Reminder = serde_json::from_str(&json).unwrap();
        assert_eq!(back, reminder);
    }
}
