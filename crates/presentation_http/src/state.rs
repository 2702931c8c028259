//! Application state shared across handlers

use std::sync::Arc;

use application::services::{ReminderEngine, SchedulingReminderStore, TriggerService};
use infrastructure::persistence::SqliteReminderStore;
use infrastructure::scheduler::SchedulerStatsHandle;

use crate::signature::SigningKeys;

/// The store stack the engine runs on: SQLite behind the event-mode
/// scheduling decorator (a pass-through in polling mode)
pub type EngineStore = SchedulingReminderStore<SqliteReminderStore>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The scheduling engine (drives the cleanup webhook)
    pub engine: Arc<ReminderEngine<EngineStore>>,
    /// External-trigger service (drives the alert webhook)
    pub trigger_service: Arc<TriggerService<EngineStore>>,
    /// Raw SQLite store, for readiness probing
    pub store: Arc<SqliteReminderStore>,
    /// Webhook signing keys; absent when event mode is not configured
    pub signing_keys: Option<SigningKeys>,
    /// Polling loop health counters; absent in event mode
    pub scheduler_stats: Option<SchedulerStatsHandle>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("signing_keys", &self.signing_keys.is_some())
            .field("scheduler_stats", &self.scheduler_stats.is_some())
            .finish_non_exhaustive()
    }
}
