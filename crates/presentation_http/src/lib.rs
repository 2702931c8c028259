//! remindd HTTP presentation layer
//!
//! Serves the health endpoints and, in event mode, the signed webhook
//! endpoints the delayed-callback service POSTs back to.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod signature;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use signature::{SigningKeys, verify_signature};
pub use state::AppState;
