use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};

use super::{parse_doc_id, JsonRequest};
use crate::auth::Principal;
use crate::error::ColabError;
use crate::models::{Session, UpdateSessionRequest};
use crate::state::AppState;

/// Presence heartbeat: record the caller's cursor and selection
pub async fn session_update(
    State(state): State<AppState>,
    principal: Option<Extension<Principal>>,
    Path(doc_id): Path<String>,
    JsonRequest(request): JsonRequest<UpdateSessionRequest>,
) -> Result<StatusCode, ColabError> {
    let doc_uuid = parse_doc_id(&doc_id)?;
    let principal = principal.map(|Extension(p)| p);
    state
        .sync
        .update_session(principal.as_ref(), doc_uuid, request.cursor_position, request.selection)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Other users currently active on the document
pub async fn session_list(
    State(state): State<AppState>,
    principal: Option<Extension<Principal>>,
    Path(doc_id): Path<String>,
) -> Result<Json<Vec<Session>>, ColabError> {
    let Ok(doc_uuid) = parse_doc_id(&doc_id) else {
        return Ok(Json(Vec::new()));
    };
    let principal = principal.map(|Extension(p)| p);
    let sessions = state.sync.get_active_sessions(principal.as_ref(), doc_uuid).await?;
    Ok(Json(sessions))
}

/// Drop the caller's presence record. Always succeeds.
pub async fn session_leave(
    State(state): State<AppState>,
    principal: Option<Extension<Principal>>,
    Path(doc_id): Path<String>,
) -> StatusCode {
    if let Ok(doc_uuid) = parse_doc_id(&doc_id) {
        let principal = principal.map(|Extension(p)| p);
        state.sync.leave_session(principal.as_ref(), doc_uuid).await;
    }
    StatusCode::NO_CONTENT
}
