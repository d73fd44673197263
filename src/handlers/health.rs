use axum::{extract::State, Json};
use tracing::debug;

use crate::models::{HealthResponse, SyncPolicyResponse};
use crate::state::AppState;

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    debug!("Health check requested");
    Json(HealthResponse {
        status: "ok".to_string(),
        service: state.service_name.clone(),
        storage: state.sync.storage_backend().to_string(),
    })
}

/// Readiness check endpoint
pub async fn ready_check(State(state): State<AppState>) -> Json<HealthResponse> {
    debug!("Readiness check requested");
    Json(HealthResponse {
        status: "ready".to_string(),
        service: state.service_name.clone(),
        storage: state.sync.storage_backend().to_string(),
    })
}

/// Recommended client pacing for content saves and presence heartbeats
pub async fn sync_policy(State(state): State<AppState>) -> Json<SyncPolicyResponse> {
    Json(state.sync.sync_policy())
}
