use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use tracing::debug;

use super::{parse_doc_id, JsonRequest};
use crate::auth::Principal;
use crate::error::ColabError;
use crate::models::{
    AddCollaboratorRequest, CreateDocumentRequest, CreateDocumentResponse, Document, SetPublicRequest,
    UpdateContentRequest, UpdateTitleRequest,
};
use crate::state::AppState;

/// Create a document owned by the caller
pub async fn doc_create(
    State(state): State<AppState>,
    principal: Option<Extension<Principal>>,
    JsonRequest(request): JsonRequest<CreateDocumentRequest>,
) -> Result<(StatusCode, Json<CreateDocumentResponse>), ColabError> {
    let principal = principal.map(|Extension(p)| p);
    let id = state.sync.create_document(principal.as_ref(), &request.title).await?;
    Ok((StatusCode::CREATED, Json(CreateDocumentResponse { id })))
}

/// List documents owned by the caller followed by documents shared with them
pub async fn doc_list(
    State(state): State<AppState>,
    principal: Option<Extension<Principal>>,
) -> Result<Json<Vec<Document>>, ColabError> {
    let principal = principal.map(|Extension(p)| p);
    let docs = state.sync.list_documents(principal.as_ref()).await?;
    Ok(Json(docs))
}

/// Get a document. Missing and inaccessible documents look the same.
pub async fn doc_get(
    State(state): State<AppState>,
    principal: Option<Extension<Principal>>,
    Path(doc_id): Path<String>,
) -> Result<Json<Document>, ColabError> {
    let Ok(doc_uuid) = parse_doc_id(&doc_id) else {
        return Err(ColabError::NotFound);
    };
    let principal = principal.map(|Extension(p)| p);
    match state.sync.get_document(principal.as_ref(), doc_uuid).await? {
        Some(doc) => Ok(Json(doc)),
        None => {
            debug!("Document '{}' not visible to caller", doc_id);
            Err(ColabError::NotFound)
        }
    }
}

/// Replace the content of a document (last write wins)
pub async fn doc_update_content(
    State(state): State<AppState>,
    principal: Option<Extension<Principal>>,
    Path(doc_id): Path<String>,
    JsonRequest(request): JsonRequest<UpdateContentRequest>,
) -> Result<StatusCode, ColabError> {
    let doc_uuid = parse_doc_id(&doc_id)?;
    let principal = principal.map(|Extension(p)| p);
    state
        .sync
        .update_document(principal.as_ref(), doc_uuid, &request.content)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Rename a document
pub async fn doc_update_title(
    State(state): State<AppState>,
    principal: Option<Extension<Principal>>,
    Path(doc_id): Path<String>,
    JsonRequest(request): JsonRequest<UpdateTitleRequest>,
) -> Result<StatusCode, ColabError> {
    let doc_uuid = parse_doc_id(&doc_id)?;
    let principal = principal.map(|Extension(p)| p);
    state
        .sync
        .update_document_title(principal.as_ref(), doc_uuid, &request.title)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Grant or revoke public read access
pub async fn doc_set_public(
    State(state): State<AppState>,
    principal: Option<Extension<Principal>>,
    Path(doc_id): Path<String>,
    JsonRequest(request): JsonRequest<SetPublicRequest>,
) -> Result<StatusCode, ColabError> {
    let doc_uuid = parse_doc_id(&doc_id)?;
    let principal = principal.map(|Extension(p)| p);
    state
        .sync
        .set_document_public(principal.as_ref(), doc_uuid, request.is_public)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a document and every presence session on it
pub async fn doc_delete(
    State(state): State<AppState>,
    principal: Option<Extension<Principal>>,
    Path(doc_id): Path<String>,
) -> Result<StatusCode, ColabError> {
    let doc_uuid = parse_doc_id(&doc_id)?;
    let principal = principal.map(|Extension(p)| p);
    state.sync.delete_document(principal.as_ref(), doc_uuid).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Share a document with the user registered under an email address
pub async fn doc_add_collaborator(
    State(state): State<AppState>,
    principal: Option<Extension<Principal>>,
    Path(doc_id): Path<String>,
    JsonRequest(request): JsonRequest<AddCollaboratorRequest>,
) -> Result<StatusCode, ColabError> {
    let doc_uuid = parse_doc_id(&doc_id)?;
    let principal = principal.map(|Extension(p)| p);
    state
        .sync
        .add_collaborator(principal.as_ref(), doc_uuid, &request.collaborator_email)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
