use crate::services::SyncService;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub sync: SyncService,
    /// HS256 secret for user tokens. Requests carrying a token are rejected when unset.
    pub jwt_secret: Option<String>,
    pub service_name: String,
}
