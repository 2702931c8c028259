//! Application layer - Use cases and orchestration
//!
//! Contains the scheduling engine, its pure decision helpers, and the port
//! definitions implemented by infrastructure adapters.

pub mod error;
pub mod ports;
pub mod services;

pub use error::ApplicationError;
pub use ports::*;
pub use services::*;
