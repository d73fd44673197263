use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Client pacing recommendations
#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncPolicyResponse {
    pub content_debounce_ms: u64,
    pub heartbeat_interval_ms: u64,
    pub staleness_window_secs: u64,
}
