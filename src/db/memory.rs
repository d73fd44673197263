use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{DocStorage, StorageError};
use crate::models::{Document, Session};

#[derive(Default)]
struct Tables {
    documents: HashMap<Uuid, Document>,
    sessions: HashMap<(String, Uuid), Session>,
}

/// In-process storage. Each call holds the lock for its whole read-modify-write, so
/// record updates never interleave.
#[derive(Default)]
pub struct MemoryStorage {
    tables: RwLock<Tables>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn session_count(&self) -> usize {
        self.tables.read().await.sessions.len()
    }
}

fn by_recency(mut docs: Vec<Document>) -> Vec<Document> {
    docs.sort_by(|a, b| b.last_modified.cmp(&a.last_modified).then(a.id.cmp(&b.id)));
    docs
}

#[async_trait]
impl DocStorage for MemoryStorage {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn insert_document(&self, doc: &Document) -> Result<(), StorageError> {
        let mut tables = self.tables.write().await;
        if tables.documents.contains_key(&doc.id) {
            return Err(StorageError::Backend(format!("Duplicate document id {}", doc.id)));
        }
        tables.documents.insert(doc.id, doc.clone());
        Ok(())
    }

    async fn get_document(&self, doc_id: Uuid) -> Result<Option<Document>, StorageError> {
        Ok(self.tables.read().await.documents.get(&doc_id).cloned())
    }

    async fn list_owned(&self, owner: &str) -> Result<Vec<Document>, StorageError> {
        let tables = self.tables.read().await;
        let docs = tables
            .documents
            .values()
            .filter(|d| d.is_owner(owner))
            .cloned()
            .collect();
        Ok(by_recency(docs))
    }

    async fn list_shared(&self, prpl: &str) -> Result<Vec<Document>, StorageError> {
        let tables = self.tables.read().await;
        let docs = tables
            .documents
            .values()
            .filter(|d| !d.is_owner(prpl) && (d.is_public || d.is_collaborator(prpl)))
            .cloned()
            .collect();
        Ok(by_recency(docs))
    }

    async fn update_content(
        &self,
        doc_id: Uuid,
        content: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut tables = self.tables.write().await;
        let doc = tables.documents.get_mut(&doc_id).ok_or(StorageError::NotFound)?;
        doc.content = content.to_string();
        doc.last_modified = at;
        Ok(())
    }

    async fn update_title(
        &self,
        doc_id: Uuid,
        title: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut tables = self.tables.write().await;
        let doc = tables.documents.get_mut(&doc_id).ok_or(StorageError::NotFound)?;
        doc.title = title.to_string();
        doc.last_modified = at;
        Ok(())
    }

    async fn set_public(
        &self,
        doc_id: Uuid,
        is_public: bool,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut tables = self.tables.write().await;
        let doc = tables.documents.get_mut(&doc_id).ok_or(StorageError::NotFound)?;
        doc.is_public = is_public;
        doc.last_modified = at;
        Ok(())
    }

    async fn add_collaborator(
        &self,
        doc_id: Uuid,
        prpl: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        let mut tables = self.tables.write().await;
        let doc = tables.documents.get_mut(&doc_id).ok_or(StorageError::NotFound)?;
        let added = doc.collaborators.insert(prpl.to_string());
        if added {
            doc.last_modified = at;
        }
        Ok(added)
    }

    async fn delete_document(&self, doc_id: Uuid) -> Result<(), StorageError> {
        let mut tables = self.tables.write().await;
        tables.documents.remove(&doc_id).ok_or(StorageError::NotFound)?;
        let before = tables.sessions.len();
        tables.sessions.retain(|(_, d), _| *d != doc_id);
        debug!(
            "Removed {} sessions of deleted document {}",
            before - tables.sessions.len(),
            doc_id
        );
        Ok(())
    }

    async fn upsert_session(&self, session: &Session) -> Result<(), StorageError> {
        let mut tables = self.tables.write().await;
        if !tables.documents.contains_key(&session.document_id) {
            return Err(StorageError::NotFound);
        }
        let key = (session.user_id.clone(), session.document_id);
        match tables.sessions.get_mut(&key) {
            Some(existing) => {
                existing.cursor_position = session.cursor_position;
                existing.selection = session.selection;
                existing.last_seen = session.last_seen;
            }
            None => {
                tables.sessions.insert(key, session.clone());
            }
        }
        Ok(())
    }

    async fn list_sessions_since(
        &self,
        doc_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<Session>, StorageError> {
        let tables = self.tables.read().await;
        let mut sessions: Vec<Session> = tables
            .sessions
            .values()
            .filter(|s| s.document_id == doc_id && s.last_seen > since)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        Ok(sessions)
    }

    async fn get_session(
        &self,
        user_id: &str,
        doc_id: Uuid,
    ) -> Result<Option<Session>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables.sessions.get(&(user_id.to_string(), doc_id)).cloned())
    }

    async fn delete_session(&self, user_id: &str, doc_id: Uuid) -> Result<bool, StorageError> {
        let mut tables = self.tables.write().await;
        Ok(tables.sessions.remove(&(user_id.to_string(), doc_id)).is_some())
    }

    async fn evict_sessions_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StorageError> {
        let mut tables = self.tables.write().await;
        let before = tables.sessions.len();
        tables.sessions.retain(|_, s| s.last_seen > cutoff);
        Ok((before - tables.sessions.len()) as u64)
    }
}
