use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Response for a failed operation
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: u16,
    pub status: String,
    /// Machine readable error kind, e.g. `ACCESS_DENIED`
    pub kind: String,
    pub error: String,
}
