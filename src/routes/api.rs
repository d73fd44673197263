use crate::{
    handlers::{
        doc_add_collaborator, doc_create, doc_delete, doc_get, doc_list, doc_set_public, doc_update_content,
        doc_update_title, health_check, ready_check, session_leave, session_list, session_update, sync_policy,
    },
    routes::auth_middleware::auth_middleware,
    state::AppState,
};
use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

/// Create API routes
pub fn create_api_routes(state: AppState) -> Router {
    Router::<AppState>::new()
        .route("/v1/sync-policy", get(sync_policy))
        .route("/v1/documents", post(doc_create).get(doc_list))
        .route("/v1/documents/:doc_id", get(doc_get).delete(doc_delete))
        .route("/v1/documents/:doc_id/content", put(doc_update_content))
        .route("/v1/documents/:doc_id/title", put(doc_update_title))
        .route("/v1/documents/:doc_id/public", put(doc_set_public))
        .route("/v1/documents/:doc_id/collaborators", post(doc_add_collaborator))
        .route("/v1/documents/:doc_id/session", put(session_update).delete(session_leave))
        .route("/v1/documents/:doc_id/sessions", get(session_list))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)) // Applies to all routes added above
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .with_state(state)
}
