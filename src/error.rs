use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::db::StorageError;
use crate::models::ErrorResponse;
use crate::services::identity::IdentityError;

/// Failure kinds surfaced to callers of the sync service
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColabError {
    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Access denied")]
    AccessDenied,

    #[error("Document not found")]
    NotFound,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("User not found")]
    UserNotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ColabError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ColabError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ColabError::AccessDenied => StatusCode::FORBIDDEN,
            ColabError::NotFound => StatusCode::NOT_FOUND,
            ColabError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ColabError::UserNotFound => StatusCode::NOT_FOUND,
            ColabError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ColabError::Unauthenticated => "UNAUTHENTICATED",
            ColabError::AccessDenied => "ACCESS_DENIED",
            ColabError::NotFound => "NOT_FOUND",
            ColabError::InvalidArgument(_) => "INVALID_ARGUMENT",
            ColabError::UserNotFound => "USER_NOT_FOUND",
            ColabError::Internal(_) => "INTERNAL",
        }
    }
}

impl From<StorageError> for ColabError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound => ColabError::NotFound,
            other => ColabError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ColabError {
    fn from(rejection: JsonRejection) -> Self {
        let message = match &rejection {
            JsonRejection::JsonDataError(_) => "Invalid JSON data",
            JsonRejection::JsonSyntaxError(_) => "Malformed JSON",
            JsonRejection::MissingJsonContentType(_) => {
                "Missing or invalid Content-Type header. Expected 'application/json'"
            }
            JsonRejection::BytesRejection(_) => "Failed to read request body",
            _ => "Invalid JSON request",
        };
        tracing::warn!("Rejected request body: {}", rejection.body_text());
        ColabError::InvalidArgument(format!("{}: {}", message, rejection.body_text()))
    }
}

impl From<IdentityError> for ColabError {
    fn from(e: IdentityError) -> Self {
        ColabError::Internal(e.to_string())
    }
}

impl IntoResponse for ColabError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            code: status.as_u16(),
            status: status.to_string(),
            kind: self.kind().to_string(),
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ColabError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_are_classified() {
        assert_eq!(ColabError::from(StorageError::NotFound), ColabError::NotFound);
        assert!(matches!(
            ColabError::from(StorageError::Backend("connection reset".into())),
            ColabError::Internal(_)
        ));
    }

    #[test]
    fn user_not_found_maps_to_404() {
        let err = ColabError::UserNotFound;
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.kind(), "USER_NOT_FOUND");
    }
}
