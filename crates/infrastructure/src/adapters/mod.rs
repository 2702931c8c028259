//! Adapters implementing application ports against external services

mod callback_queue;
mod email_sender;

pub use callback_queue::{HttpCallbackQueue, QueueClientConfig};
pub use email_sender::{EmailSenderConfig, HttpEmailSender};
