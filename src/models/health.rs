use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// API response for liveness and readiness probes
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    /// Storage backend in use ("postgres" or "memory")
    pub storage: String,
}
