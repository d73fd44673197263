use utoipa::OpenApi;
use crate::models::*;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn health_check_doc() {}

/// Client pacing recommendations
#[utoipa::path(
    get,
    path = "/api/v1/sync-policy",
    responses(
        (status = 200, description = "Debounce, heartbeat and staleness values", body = SyncPolicyResponse)
    )
)]
#[allow(dead_code)]
pub async fn sync_policy_doc() {}

/// Create a document
#[utoipa::path(
    post,
    path = "/api/v1/documents",
    request_body = CreateDocumentRequest,
    responses(
        (status = 201, description = "Document created", body = CreateDocumentResponse),
        (status = 400, description = "Empty title", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn doc_create_doc() {}

/// List owned documents, then shared and public documents
#[utoipa::path(
    get,
    path = "/api/v1/documents",
    responses(
        (status = 200, description = "Documents visible to the caller", body = Vec<Document>)
    )
)]
#[allow(dead_code)]
pub async fn doc_list_doc() {}

/// Get a document
#[utoipa::path(
    get,
    path = "/api/v1/documents/{doc_id}",
    params(("doc_id" = String, Path, description = "Document UUID")),
    responses(
        (status = 200, description = "The document", body = Document),
        (status = 404, description = "Missing or not accessible", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn doc_get_doc() {}

/// Replace document content
#[utoipa::path(
    put,
    path = "/api/v1/documents/{doc_id}/content",
    params(("doc_id" = String, Path, description = "Document UUID")),
    request_body = UpdateContentRequest,
    responses(
        (status = 204, description = "Content saved"),
        (status = 403, description = "No write access", body = ErrorResponse),
        (status = 404, description = "Document not found", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn doc_update_content_doc() {}

/// Rename a document (owner only)
#[utoipa::path(
    put,
    path = "/api/v1/documents/{doc_id}/title",
    params(("doc_id" = String, Path, description = "Document UUID")),
    request_body = UpdateTitleRequest,
    responses(
        (status = 204, description = "Title saved"),
        (status = 400, description = "Empty title", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn doc_update_title_doc() {}

/// Toggle public read access (owner only)
#[utoipa::path(
    put,
    path = "/api/v1/documents/{doc_id}/public",
    params(("doc_id" = String, Path, description = "Document UUID")),
    request_body = SetPublicRequest,
    responses(
        (status = 204, description = "Flag saved"),
        (status = 403, description = "Not the owner", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn doc_set_public_doc() {}

/// Delete a document (owner only)
#[utoipa::path(
    delete,
    path = "/api/v1/documents/{doc_id}",
    params(("doc_id" = String, Path, description = "Document UUID")),
    responses(
        (status = 204, description = "Document and its sessions deleted"),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Document not found", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn doc_delete_doc() {}

/// Add a collaborator by email (owner only)
#[utoipa::path(
    post,
    path = "/api/v1/documents/{doc_id}/collaborators",
    params(("doc_id" = String, Path, description = "Document UUID")),
    request_body = AddCollaboratorRequest,
    responses(
        (status = 204, description = "Collaborator present"),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Document or user not found", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn doc_add_collaborator_doc() {}

/// Presence heartbeat
#[utoipa::path(
    put,
    path = "/api/v1/documents/{doc_id}/session",
    params(("doc_id" = String, Path, description = "Document UUID")),
    request_body = UpdateSessionRequest,
    responses(
        (status = 204, description = "Session refreshed"),
        (status = 400, description = "Malformed selection", body = ErrorResponse),
        (status = 403, description = "No read access", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn session_update_doc() {}

/// Active sessions of other users
#[utoipa::path(
    get,
    path = "/api/v1/documents/{doc_id}/sessions",
    params(("doc_id" = String, Path, description = "Document UUID")),
    responses(
        (status = 200, description = "Fresh sessions, caller excluded", body = Vec<Session>)
    )
)]
#[allow(dead_code)]
pub async fn session_list_doc() {}

/// Leave a document
#[utoipa::path(
    delete,
    path = "/api/v1/documents/{doc_id}/session",
    params(("doc_id" = String, Path, description = "Document UUID")),
    responses(
        (status = 204, description = "Session removed if it existed")
    )
)]
#[allow(dead_code)]
pub async fn session_leave_doc() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check_doc,
        sync_policy_doc,
        doc_create_doc,
        doc_list_doc,
        doc_get_doc,
        doc_update_content_doc,
        doc_update_title_doc,
        doc_set_public_doc,
        doc_delete_doc,
        doc_add_collaborator_doc,
        session_update_doc,
        session_list_doc,
        session_leave_doc,
    ),
    components(
        schemas(
            HealthResponse,
            SyncPolicyResponse,
            ErrorResponse,
            Document,
            CreateDocumentRequest,
            CreateDocumentResponse,
            UpdateContentRequest,
            UpdateTitleRequest,
            SetPublicRequest,
            AddCollaboratorRequest,
            Session,
            Selection,
            UpdateSessionRequest,
        )
    ),
    tags(
        (name = "api", description = "Document sharing and presence endpoints")
    )
)]
pub struct ApiDoc;
