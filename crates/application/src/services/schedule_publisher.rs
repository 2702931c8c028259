//! Event-mode schedule publication
//!
//! Registers a reminder's alerts with the external delayed-callback
//! service: one-shot messages for one-time reminders, a cron schedule for
//! recurring ones. The callbacks land on the webhook endpoints served by
//! the HTTP layer.

use std::sync::Arc;

use chrono::SecondsFormat;
use domain::entities::Reminder;
use serde_json::json;
use tracing::{debug, info, instrument};

use crate::error::ApplicationError;
use crate::ports::{AlertQueuePort, Clock};

/// Webhook path the delayed-callback service POSTs alerts to
pub const ALERT_WEBHOOK_PATH: &str = "/webhooks/reminder-alert";
/// Webhook path that triggers the cleanup sweep
pub const CLEANUP_WEBHOOK_PATH: &str = "/webhooks/cleanup";

/// Publishes reminder schedules to the delayed-callback service
pub struct AlertSchedulePublisher {
    queue: Arc<dyn AlertQueuePort>,
    clock: Arc<dyn Clock>,
    webhook_base_url: String,
}

impl std::fmt::Debug for AlertSchedulePublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertSchedulePublisher")
            .field("webhook_base_url", &self.webhook_base_url)
            .finish_non_exhaustive()
    }
}

impl AlertSchedulePublisher {
    /// Create a publisher targeting `webhook_base_url`
    #[must_use]
    pub fn new(
        queue: Arc<dyn AlertQueuePort>,
        clock: Arc<dyn Clock>,
        webhook_base_url: impl Into<String>,
    ) -> Self {
        Self {
            queue,
            clock,
            webhook_base_url: webhook_base_url.into(),
        }
    }

    /// Register all of a reminder's alerts; returns the schedule ids
    ///
    /// One-time reminders get one delayed message per alert instant still
    /// in the future; past instants are skipped. Recurring reminders get a
    /// single cron schedule - the callback recomputes the occurrence, so
    /// per-occurrence messages are unnecessary.
    #[instrument(skip(self, reminder), fields(reminder_id = %reminder.id))]
    pub async fn schedule_alerts(
        &self,
        reminder: &Reminder,
    ) -> Result<Vec<String>, ApplicationError> {
        let url = self.webhook_url(ALERT_WEBHOOK_PATH);
        let mut ids = Vec::new();

        if reminder.is_recurring {
            let Some(cron) = reminder.recurrence.as_deref() else {
                return Err(ApplicationError::Configuration(format!(
                    "recurring reminder {} has no recurrence expression",
                    reminder.id
                )));
            };
            let body = json!({
                "reminderId": reminder.id,
                "isRecurring": true,
            });
            let id = self.queue.publish_cron(&url, cron, body).await?;
            info!(schedule_id = %id, "Registered recurring alert schedule");
            ids.push(id);
            return Ok(ids);
        }

        let now = self.clock.now();
        for alert in &reminder.alerts {
            let instant = alert.alert_instant(reminder.date);
            if instant <= now {
                debug!(alert_id = alert.id, %instant, "Skipping alert instant in the past");
                continue;
            }
            let delay_seconds = u64::try_from((instant - now).num_seconds()).unwrap_or(0);
            let body = json!({
                "reminderId": reminder.id,
                "alertTime": instant.to_rfc3339_opts(SecondsFormat::Millis, true),
                "isRecurring": false,
            });
            let id = self.queue.publish_one_shot(&url, body, delay_seconds).await?;
            debug!(alert_id = alert.id, schedule_id = %id, delay_seconds, "Registered one-shot alert");
            ids.push(id);
        }

        info!(count = ids.len(), "Registered alert schedules");
        Ok(ids)
    }

    /// Install the recurring cleanup callback; returns the schedule id
    #[instrument(skip(self))]
    pub async fn schedule_cleanup(&self, cron: &str) -> Result<String, ApplicationError> {
        let url = self.webhook_url(CLEANUP_WEBHOOK_PATH);
        let id = self.queue.publish_cron(&url, cron, json!({})).await?;
        info!(schedule_id = %id, cron, "Registered cleanup schedule");
        Ok(id)
    }

    /// Cancel previously registered schedules
    #[instrument(skip(self, ids))]
    pub async fn cancel_schedules(&self, ids: &[String]) -> Result<(), ApplicationError> {
        for id in ids {
            self.queue.cancel(id).await?;
            debug!(schedule_id = %id, "Cancelled schedule");
        }
        Ok(())
    }

    fn webhook_url(&self, path: &str) -> String {
        format!("{}{path}", self.webhook_base_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use domain::entities::{NewReminder, Reminder};
    use domain::value_objects::{Alert, ReminderId};
    use mockall::predicate::{always, eq};

    use super::*;
    use crate::ports::{FixedClock, MockAlertQueuePort};

    fn now() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
    }

    fn publisher(queue: MockAlertQueuePort) -> AlertSchedulePublisher {
        AlertSchedulePublisher::new(
            Arc::new(queue),
            Arc::new(FixedClock::new(now())),
            "https://reminders.example.org/",
        )
    }

    fn one_time(alerts: Vec<Alert>) -> Reminder {
        Reminder::from_new(
            ReminderId::new(5),
            NewReminder::new("Dentist", "Checkup", now() + Duration::hours(1)).with_alerts(alerts),
        )
    }

    #[tokio::test]
    async fn one_time_publishes_a_message_per_future_alert() {
        let mut queue = MockAlertQueuePort::new();
        // Event at 10:00; offsets 1 min and 10 min -> delays 3540 s / 3000 s
        queue
            .expect_publish_one_shot()
            .with(
                eq("https://reminders.example.org/webhooks/reminder-alert"),
                always(),
                eq(3540u64),
            )
            .times(1)
            .returning(|_, _, _| Ok("msg-1".to_string()));
        queue
            .expect_publish_one_shot()
            .with(always(), always(), eq(3000u64))
            .times(1)
            .returning(|_, _, _| Ok("msg-2".to_string()));

        let reminder = one_time(vec![
            Alert { id: 1, offset_ms: 60_000 },
            Alert { id: 2, offset_ms: 600_000 },
        ]);
        let ids = publisher(queue).schedule_alerts(&reminder).await.unwrap();
        assert_eq!(ids, vec!["msg-1".to_string(), "msg-2".to_string()]);
    }

    #[tokio::test]
    async fn past_alert_instants_are_skipped() {
        let mut queue = MockAlertQueuePort::new();
        queue.expect_publish_one_shot().times(0);

        // Event one hour ahead but offset two hours -> instant in the past
        let reminder = one_time(vec![Alert { id: 1, offset_ms: 7_200_000 }]);
        let ids = publisher(queue).schedule_alerts(&reminder).await.unwrap();
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn one_shot_body_carries_the_wire_contract() {
        let mut queue = MockAlertQueuePort::new();
        queue
            .expect_publish_one_shot()
            .withf(|_, body, _| {
                body["reminderId"] == 5
                    && body["isRecurring"] == false
                    && body["alertTime"] == "2025-06-01T09:59:00.000Z"
            })
            .times(1)
            .returning(|_, _, _| Ok("msg-1".to_string()));

        let reminder = one_time(vec![Alert { id: 1, offset_ms: 60_000 }]);
        publisher(queue).schedule_alerts(&reminder).await.unwrap();
    }

    #[tokio::test]
    async fn recurring_publishes_a_single_cron_schedule() {
        let mut queue = MockAlertQueuePort::new();
        queue
            .expect_publish_cron()
            .withf(|url, cron, body| {
                url == "https://reminders.example.org/webhooks/reminder-alert"
                    && cron == "0 9 * * *"
                    && body["reminderId"] == 7
                    && body["isRecurring"] == true
            })
            .times(1)
            .returning(|_, _, _| Ok("sched-1".to_string()));
        queue.expect_publish_one_shot().times(0);

        let reminder = Reminder::from_new(
            ReminderId::new(7),
            NewReminder::new("Standup", "Daily standup", now())
                .recurring("0 9 * * *", now())
                .with_alerts(vec![Alert { id: 1, offset_ms: 3000 }]),
        );
        let ids = publisher(queue).schedule_alerts(&reminder).await.unwrap();
        assert_eq!(ids, vec!["sched-1".to_string()]);
    }

    #[tokio::test]
    async fn recurring_without_expression_is_a_configuration_error() {
        let queue = MockAlertQueuePort::new();
        let mut reminder = Reminder::from_new(
            ReminderId::new(7),
            NewReminder::new("Standup", "Daily standup", now()).recurring("0 9 * * *", now()),
        );
        reminder.recurrence = None;

        let result = publisher(queue).schedule_alerts(&reminder).await;
        assert!(matches!(result, Err(ApplicationError::Configuration(_))));
    }

    #[tokio::test]
    async fn cleanup_schedule_targets_the_cleanup_webhook() {
        let mut queue = MockAlertQueuePort::new();
        queue
            .expect_publish_cron()
            .withf(|url, cron, _| {
                url == "https://reminders.example.org/webhooks/cleanup" && cron == "0 0 0 * * *"
            })
            .times(1)
            .returning(|_, _, _| Ok("sched-gc".to_string()));

        let id = publisher(queue).schedule_cleanup("0 0 0 * * *").await.unwrap();
        assert_eq!(id, "sched-gc");
    }

    #[tokio::test]
    async fn cancel_schedules_cancels_each_id() {
        let mut queue = MockAlertQueuePort::new();
        queue
            .expect_cancel()
            .with(eq("msg-1"))
            .times(1)
            .returning(|_| Ok(()));
        queue
            .expect_cancel()
            .with(eq("msg-2"))
            .times(1)
            .returning(|_| Ok(()));

        publisher(queue)
            .cancel_schedules(&["msg-1".to_string(), "msg-2".to_string()])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn queue_failure_surfaces() {
        let mut queue = MockAlertQueuePort::new();
        queue
            .expect_publish_one_shot()
            .returning(|_, _, _| Err(ApplicationError::ExternalService("queue down".to_string())));

        let reminder = one_time(vec![Alert { id: 1, offset_ms: 60_000 }]);
        let result = publisher(queue).schedule_alerts(&reminder).await;
        assert!(matches!(result, Err(ApplicationError::ExternalService(_))));
    }
}
