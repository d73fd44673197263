use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use utoipa::ToSchema;
use uuid::Uuid;

/// A shared text document together with its access-control metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    /// Stored without surrounding whitespace; never empty
    pub title: String,
    pub content: String,
    pub owner_id: String,
    /// Principals with write access. The owner never needs to be listed here.
    #[schema(value_type = Vec<String>)]
    pub collaborators: BTreeSet<String>,
    pub is_public: bool,
    pub last_modified: DateTime<Utc>,
}

impl Document {
    /// Build a fresh, private and empty document owned by `owner_id`
    pub fn new(owner_id: &str, title: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.to_string(),
            content: String::new(),
            owner_id: owner_id.to_string(),
            collaborators: BTreeSet::new(),
            is_public: false,
            last_modified: now,
        }
    }

    pub fn is_owner(&self, prpl: &str) -> bool {
        self.owner_id == prpl
    }

    pub fn is_collaborator(&self, prpl: &str) -> bool {
        self.collaborators.contains(prpl)
    }
}

/// Request body for creating a document
#[derive(Serialize, Deserialize, ToSchema)]
pub struct CreateDocumentRequest {
    pub title: String,
}

/// Response returned after creating a document
#[derive(Serialize, Deserialize, ToSchema)]
pub struct CreateDocumentResponse {
    pub id: Uuid,
}

/// Request body for replacing the content of a document
#[derive(Serialize, Deserialize, ToSchema)]
pub struct UpdateContentRequest {
    pub content: String,
}

/// Request body for renaming a document
#[derive(Serialize, Deserialize, ToSchema)]
pub struct UpdateTitleRequest {
    pub title: String,
}

/// Request body for toggling public read access
#[derive(Serialize, Deserialize, ToSchema)]
pub struct SetPublicRequest {
    #[serde(rename = "isPublic")]
    pub is_public: bool,
}

/// Request body for sharing a document with another user
#[derive(Serialize, Deserialize, ToSchema)]
pub struct AddCollaboratorRequest {
    #[serde(rename = "collaboratorEmail")]
    pub collaborator_email: String,
}
