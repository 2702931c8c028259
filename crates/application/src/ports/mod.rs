//! Port definitions for the application layer
//!
//! Ports are interfaces that define how the engine interacts with external
//! systems. Adapters in the infrastructure layer implement these ports.

mod alert_queue;
mod clock;
mod notification_sender;
mod reminder_store;

pub use alert_queue::AlertQueuePort;
#[cfg(test)]
pub use alert_queue::MockAlertQueuePort;
pub use clock::{Clock, FixedClock, SystemClock};
#[cfg(test)]
pub use notification_sender::MockNotificationSenderPort;
pub use notification_sender::{NotificationError, NotificationSenderPort};
#[cfg(test)]
pub use reminder_store::MockReminderStorePort;
pub use reminder_store::ReminderStorePort;
