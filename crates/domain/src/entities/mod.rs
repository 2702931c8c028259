//! Domain entities - Objects with identity and lifecycle

mod reminder;

pub use reminder::{NewReminder, Reminder, ReminderPatch};
