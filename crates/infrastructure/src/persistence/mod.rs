//! Persistence module
//!
//! SQLite-based storage for reminders.

pub mod connection;
pub mod migrations;
pub mod reminder_store;

pub use connection::{ConnectionPool, DatabaseError, create_pool};
pub use reminder_store::SqliteReminderStore;
