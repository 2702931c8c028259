//! Health check handlers

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Liveness check - is the server running?
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub database: ServiceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduler: Option<SchedulerStatus>,
}

/// Status of the database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub healthy: bool,
}

/// Polling loop counters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerStatus {
    pub ticks_run: u64,
    pub consecutive_errors: u32,
}

/// Readiness check - can the store answer queries?
pub async fn readiness_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let database_healthy = state.store.ping().await.is_ok();

    let scheduler = state.scheduler_stats.as_ref().map(|stats| {
        let snapshot = stats.snapshot();
        SchedulerStatus {
            ticks_run: snapshot.ticks_run,
            consecutive_errors: snapshot.consecutive_errors,
        }
    });

    let ready = database_healthy;
    let status_code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(ReadinessResponse {
            ready,
            database: ServiceStatus {
                healthy: database_healthy,
            },
            scheduler,
        }),
    )
}
