//! Webhook handlers (event mode)
//!
//! The delayed-callback service POSTs signed callbacks here: alert
//! callbacks fire a single reminder, cleanup callbacks run the reaping
//! sweep. Signature verification happens before anything else - a bad
//! signature produces 401 and zero side effects.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
};
use domain::value_objects::ReminderId;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::error::ApiError;
use crate::signature::verify_signature;
use crate::state::AppState;

/// Header carrying the callback signature
pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

/// Body of an alert callback
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertCallback {
    /// The reminder to fire
    pub reminder_id: i64,
    /// Alert instant the schedule was registered for (informational)
    #[serde(default)]
    pub alert_time: Option<chrono::DateTime<chrono::Utc>>,
    /// Whether the registering side considered the reminder recurring
    #[serde(default)]
    pub is_recurring: Option<bool>,
}

/// Response to an alert callback
#[derive(Debug, Serialize)]
pub struct AlertResponse {
    pub status: &'static str,
    #[serde(rename = "reminderTitle", skip_serializing_if = "Option::is_none")]
    pub reminder_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

/// Response to a cleanup callback
#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    pub status: &'static str,
    pub checked: usize,
    pub deactivated: usize,
}

fn verify(state: &AppState, headers: &HeaderMap, body: &[u8]) -> Result<(), ApiError> {
    let Some(ref keys) = state.signing_keys else {
        warn!("Webhook received but signing keys are not configured");
        return Err(ApiError::ServiceUnavailable(
            "webhook signing keys not configured".to_string(),
        ));
    };

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if !verify_signature(body, signature, keys) {
        warn!("Webhook signature verification failed");
        return Err(ApiError::Unauthorized("invalid signature".to_string()));
    }
    Ok(())
}

/// Alert callback handler (POST /webhooks/reminder-alert)
#[instrument(skip(state, headers, body))]
pub async fn reminder_alert(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    verify(&state, &headers, &body)?;

    let callback: AlertCallback = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("invalid payload: {e}")))?;

    debug!(
        reminder_id = callback.reminder_id,
        alert_time = ?callback.alert_time,
        "Processing alert callback"
    );

    let outcome = state
        .trigger_service
        .handle_alert(ReminderId::new(callback.reminder_id), callback.is_recurring)
        .await?;

    let response = match outcome {
        application::services::TriggerOutcome::Fired { title } => AlertResponse {
            status: "ok",
            reminder_title: Some(title),
            reason: None,
        },
        application::services::TriggerOutcome::Skipped { reason } => AlertResponse {
            status: "skipped",
            reminder_title: None,
            reason: Some(reason.as_str()),
        },
    };
    Ok(Json(response))
}

/// Cleanup callback handler (POST /webhooks/cleanup)
#[instrument(skip(state, headers, body))]
pub async fn cleanup(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    verify(&state, &headers, &body)?;

    let summary = state.engine.cleanup_sweep().await?;
    Ok(Json(CleanupResponse {
        status: "ok",
        checked: summary.checked,
        deactivated: summary.deactivated,
    }))
}
