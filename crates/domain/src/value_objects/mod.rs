//! Value Objects - Immutable, identity-less domain primitives

mod alert;
mod contact;
mod reminder_id;

pub use alert::{Alert, MIN_ALERT_OFFSET_MS};
pub use contact::{Contact, ContactMode};
pub use reminder_id::ReminderId;
