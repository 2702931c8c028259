#![forbid(unsafe_code)]
//! Infrastructure layer - Adapters for external systems
//!
//! Implements the ports defined in the application layer: SQLite
//! persistence, the HTTP email sender, the delayed-callback queue client,
//! plus configuration loading and the polling scheduler.

pub mod adapters;
pub mod config;
pub mod persistence;
pub mod scheduler;

pub use adapters::{EmailSenderConfig, HttpCallbackQueue, HttpEmailSender, QueueClientConfig};
pub use config::{
    AppConfig, DatabaseConfig, EngineAppConfig, NotifierConfig, QueueConfig, ServerConfig,
    WebhookConfig,
};
pub use persistence::{ConnectionPool, DatabaseError, SqliteReminderStore, create_pool};
pub use scheduler::{
    PollingScheduler, SchedulerError, SchedulerStats, SchedulerStatsHandle, spawn_cleanup_job,
};
