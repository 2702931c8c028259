//! Application services - the scheduling engine and its decision helpers

pub mod alert_selector;
pub mod deactivation;
pub mod recurrence;

mod dispatcher;
mod engine;
mod schedule_publisher;
mod scheduling_store;
mod trigger;

pub use dispatcher::NotificationDispatcher;
pub use engine::{EngineConfig, ReminderEngine, SweepSummary, TickSummary};
pub use schedule_publisher::AlertSchedulePublisher;
pub use scheduling_store::SchedulingReminderStore;
pub use trigger::{SkipReason, TriggerOutcome, TriggerService};
