//! End-to-end engine lifecycle tests over a real SQLite store
//!
//! Drives the scheduling engine tick by tick with a pinned clock and
//! verifies the full one-time and recurring lifecycles against actual
//! rows, not mocks.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use application::ApplicationError;
use application::ports::{FixedClock, NotificationError, NotificationSenderPort, ReminderStorePort};
use application::services::{EngineConfig, NotificationDispatcher, ReminderEngine, TriggerService};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use domain::entities::NewReminder;
use domain::value_objects::{Alert, Contact, ReminderId};
use infrastructure::config::DatabaseConfig;
use infrastructure::persistence::{SqliteReminderStore, create_pool};

#[derive(Default)]
struct CountingSender {
    sent: AtomicUsize,
}

impl CountingSender {
    fn count(&self) -> usize {
        self.sent.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NotificationSenderPort for CountingSender {
    async fn send(&self, _: &str, _: &str, _: &str) -> Result<(), NotificationError> {
        self.sent.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct Harness {
    store: Arc<SqliteReminderStore>,
    clock: Arc<FixedClock>,
    sender: Arc<CountingSender>,
    engine: Arc<ReminderEngine<SqliteReminderStore>>,
}

fn harness(start: DateTime<Utc>) -> Harness {
    let pool = create_pool(&DatabaseConfig {
        path: ":memory:".to_string(),
        max_connections: 1,
        run_migrations: true,
    })
    .unwrap();
    let store = Arc::new(SqliteReminderStore::new(Arc::new(pool)));
    let clock = Arc::new(FixedClock::new(start));
    let sender = Arc::new(CountingSender::default());
    let engine = Arc::new(ReminderEngine::new(
        Arc::clone(&store),
        NotificationDispatcher::new(Arc::clone(&sender) as Arc<dyn NotificationSenderPort>),
        Arc::clone(&clock) as Arc<dyn application::ports::Clock>,
        EngineConfig::default(),
    ));
    Harness {
        store,
        clock,
        sender,
        engine,
    }
}

fn event_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap()
}

async fn seed_one_time(store: &SqliteReminderStore) -> ReminderId {
    store
        .create(
            NewReminder::new("Dentist", "Checkup at ten", event_time())
                .with_contacts(vec![Contact::email(1, "anna@example.org")])
                .with_alerts(vec![Alert::new(1, 60_000).unwrap()]),
        )
        .await
        .unwrap()
}

// The full one-time lifecycle: idle -> fire -> retire, across three ticks.
#[tokio::test]
async fn one_time_reminder_fires_once_then_retires() {
    // Tick 1: a minute and a half before the alert instant - nothing happens
    let h = harness(event_time() - Duration::milliseconds(90_000));
    let id = seed_one_time(&h.store).await;

    let summary = h.engine.run_tick().await.unwrap();
    assert_eq!(summary.fired, 0);
    assert_eq!(h.sender.count(), 0);

    // Tick 2: inside the due window - fires and acknowledges
    let fire_instant = event_time() - Duration::milliseconds(59_500);
    h.clock.set(fire_instant);
    let summary = h.engine.run_tick().await.unwrap();
    assert_eq!(summary.fired, 1);
    assert_eq!(h.sender.count(), 1);

    let reminder = h.store.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(reminder.last_alert_time, Some(fire_instant));
    assert!(reminder.is_active, "retirement happens on the next tick");

    // Tick 3: the acknowledged reminder is retired, with no second dispatch
    h.clock.advance(Duration::seconds(3));
    let summary = h.engine.run_tick().await.unwrap();
    assert_eq!(summary.fired, 0);
    assert_eq!(summary.deactivated, 1);
    assert_eq!(h.sender.count(), 1);

    let reminder = h.store.find_by_id(id).await.unwrap().unwrap();
    assert!(!reminder.is_active);

    // Tick 4: inactive reminders are invisible to the loop
    h.clock.advance(Duration::seconds(3));
    let summary = h.engine.run_tick().await.unwrap();
    assert_eq!(summary.checked, 0);
    assert_eq!(h.sender.count(), 1);
}

// A reminder created while the engine was asleep is reaped, not fired.
#[tokio::test]
async fn stale_one_time_reminder_is_reaped() {
    let h = harness(event_time() + Duration::hours(2));
    let id = seed_one_time(&h.store).await;

    let summary = h.engine.run_tick().await.unwrap();
    assert_eq!(summary.deactivated, 1);
    assert_eq!(h.sender.count(), 0);

    let reminder = h.store.find_by_id(id).await.unwrap().unwrap();
    assert!(!reminder.is_active);
    assert!(reminder.last_alert_time.is_none());
}

// A recurring reminder fires once per occurrence and stays active.
#[tokio::test]
async fn recurring_reminder_fires_per_occurrence() {
    // Occurrences every 5 minutes, alert right at the occurrence
    let anchor = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
    let h = harness(Utc.with_ymd_and_hms(2025, 6, 1, 10, 5, 0).unwrap());
    let id = h
        .store
        .create(
            NewReminder::new("Stretch", "Stand up and stretch", anchor)
                .recurring("*/5 * * * *", anchor)
                .with_contacts(vec![Contact::email(1, "anna@example.org")])
                .with_alerts(vec![Alert::new(1, 300_000).unwrap()]),
        )
        .await
        .unwrap();

    // now = 10:05:00, next occurrence 10:10:00, alert instant 10:05:00
    // -> diff 0, inside the half-open window
    let summary = h.engine.run_tick().await.unwrap();
    assert_eq!(summary.fired, 1);
    assert_eq!(h.sender.count(), 1);

    // Next tick inside the same occurrence: acknowledged, no re-fire
    h.clock.advance(Duration::seconds(3));
    let summary = h.engine.run_tick().await.unwrap();
    assert_eq!(summary.fired, 0);
    assert_eq!(h.sender.count(), 1);

    let reminder = h.store.find_by_id(id).await.unwrap().unwrap();
    assert!(reminder.is_active, "recurring reminders outlive a fire");

    // Five minutes later the next occurrence's alert is due again
    h.clock.set(Utc.with_ymd_and_hms(2025, 6, 1, 10, 10, 0).unwrap());
    let summary = h.engine.run_tick().await.unwrap();
    assert_eq!(summary.fired, 1);
    assert_eq!(h.sender.count(), 2);
}

// A recurring reminder leaves the loop once its window closes.
#[tokio::test]
async fn recurring_reminder_retires_past_end_date() {
    let anchor = Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap();
    let h = harness(Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap());
    let id = h
        .store
        .create(
            NewReminder::new("Daily report", "Send the numbers", anchor)
                .recurring("0 9 * * *", anchor)
                .with_end_date(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap())
                .with_contacts(vec![Contact::email(1, "team@example.org")])
                .with_alerts(vec![Alert::new(1, 60_000).unwrap()]),
        )
        .await
        .unwrap();

    let summary = h.engine.run_tick().await.unwrap();
    assert_eq!(summary.deactivated, 1);
    assert_eq!(h.sender.count(), 0);
    assert!(!h.store.find_by_id(id).await.unwrap().unwrap().is_active);
}

// The external-trigger path and the tick loop share the same
// acknowledgement semantics.
#[tokio::test]
async fn external_trigger_matches_tick_semantics() {
    let h = harness(event_time());
    let id = seed_one_time(&h.store).await;
    let trigger = TriggerService::new(Arc::clone(&h.engine), Arc::clone(&h.store));

    let outcome = trigger.handle_alert(id, Some(false)).await.unwrap();
    assert!(matches!(
        outcome,
        application::services::TriggerOutcome::Fired { .. }
    ));
    assert_eq!(h.sender.count(), 1);

    let reminder = h.store.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(reminder.last_alert_time, Some(event_time()));
    assert!(!reminder.is_active);

    // Re-triggering the retired reminder is a no-op
    let outcome = trigger.handle_alert(id, Some(false)).await.unwrap();
    assert!(matches!(
        outcome,
        application::services::TriggerOutcome::Skipped { .. }
    ));
    assert_eq!(h.sender.count(), 1);
}

// The cleanup sweep reaps without dispatching, even when alerts are due.
#[tokio::test]
async fn cleanup_sweep_only_deactivates() {
    let h = harness(event_time() - Duration::milliseconds(59_500));
    seed_one_time(&h.store).await;

    let summary = h.engine.cleanup_sweep().await.unwrap();
    assert_eq!(summary.checked, 1);
    assert_eq!(summary.deactivated, 0);
    assert_eq!(h.sender.count(), 0);

    // Jump past the stale threshold; the sweep now reaps it
    h.clock.set(event_time() + Duration::hours(2));
    let summary = h.engine.cleanup_sweep().await.unwrap();
    assert_eq!(summary.deactivated, 1);
    assert_eq!(h.sender.count(), 0);
}

// Store faults surface as the single storage error kind.
#[tokio::test]
async fn store_faults_surface_as_storage_errors() {
    // A fresh pool without migrations has no reminders table
    let pool = create_pool(&DatabaseConfig {
        path: ":memory:".to_string(),
        max_connections: 1,
        run_migrations: false,
    })
    .unwrap();
    let broken = SqliteReminderStore::new(Arc::new(pool));

    let result = broken.find_active().await;
    assert!(matches!(result, Err(ApplicationError::Storage(_))));
}
