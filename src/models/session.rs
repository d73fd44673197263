use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Selected range as character offsets into the document content
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Selection {
    pub start: u32,
    pub end: u32,
}

impl Selection {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Empty range at `pos`
    pub fn collapsed(pos: u32) -> Self {
        Self { start: pos, end: pos }
    }

    pub fn is_ordered(&self) -> bool {
        self.start <= self.end
    }
}

/// Presence record of one user on one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub document_id: Uuid,
    pub user_id: String,
    pub user_name: String,
    pub cursor_position: u32,
    pub selection: Selection,
    pub last_seen: DateTime<Utc>,
}

/// Request body for a presence heartbeat
#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSessionRequest {
    pub cursor_position: u32,
    pub selection: Selection,
}
