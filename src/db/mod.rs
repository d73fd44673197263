pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Document, Session};

pub use memory::MemoryStorage;
pub use postgres::PgStorage;

/// Errors raised by a storage backend
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Record not found")]
    NotFound,

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => StorageError::NotFound,
            sqlx::Error::Decode(inner) => StorageError::Decode(inner.to_string()),
            // A referenced document was deleted concurrently
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => StorageError::NotFound,
            other => StorageError::Backend(other.to_string()),
        }
    }
}

/// Durable storage for documents and presence sessions.
///
/// Every method is atomic with respect to the record it touches. Authorization is not
/// checked here; callers guard with [`crate::auth::policy`] first.
#[async_trait]
pub trait DocStorage: Send + Sync {
    /// Short backend name for logs and health probes
    fn backend_name(&self) -> &'static str;

    async fn insert_document(&self, doc: &Document) -> Result<(), StorageError>;

    async fn get_document(&self, doc_id: Uuid) -> Result<Option<Document>, StorageError>;

    /// Documents owned by `owner`, most recently modified first
    async fn list_owned(&self, owner: &str) -> Result<Vec<Document>, StorageError>;

    /// Documents not owned by `prpl` that are public or list `prpl` as collaborator,
    /// most recently modified first
    async fn list_shared(&self, prpl: &str) -> Result<Vec<Document>, StorageError>;

    async fn update_content(
        &self,
        doc_id: Uuid,
        content: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    async fn update_title(
        &self,
        doc_id: Uuid,
        title: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    async fn set_public(
        &self,
        doc_id: Uuid,
        is_public: bool,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Add `prpl` to the collaborator set. Returns `false` when already present, in
    /// which case nothing (not even `lastModified`) changes.
    async fn add_collaborator(
        &self,
        doc_id: Uuid,
        prpl: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, StorageError>;

    /// Delete the document and every session that references it
    async fn delete_document(&self, doc_id: Uuid) -> Result<(), StorageError>;

    /// Insert the session, or when one exists for the same (user, document) update
    /// only cursor, selection and `lastSeen`. The stored `userName` is kept.
    /// Fails with [`StorageError::NotFound`] when the document no longer exists.
    async fn upsert_session(&self, session: &Session) -> Result<(), StorageError>;

    /// Sessions of `doc_id` with `lastSeen` strictly after `since`
    async fn list_sessions_since(
        &self,
        doc_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<Session>, StorageError>;

    async fn get_session(
        &self,
        user_id: &str,
        doc_id: Uuid,
    ) -> Result<Option<Session>, StorageError>;

    /// Returns whether a record was removed
    async fn delete_session(&self, user_id: &str, doc_id: Uuid) -> Result<bool, StorageError>;

    /// Remove sessions with `lastSeen` at or before `cutoff`. Returns the count removed.
    async fn evict_sessions_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StorageError>;
}
