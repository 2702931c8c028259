//! Route definitions

use axum::{
    Router,
    routing::{get, post},
};

use crate::{handlers, state::AppState};

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health and status endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        // Webhooks (event mode)
        .route(
            "/webhooks/reminder-alert",
            post(handlers::webhooks::reminder_alert),
        )
        .route("/webhooks/cleanup", post(handlers::webhooks::cleanup))
        // Attach state
        .with_state(state)
}
