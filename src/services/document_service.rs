use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::policy;
use crate::clock::Clock;
use crate::db::DocStorage;
use crate::error::ColabError;
use crate::models::Document;
use crate::services::identity::IdentityProvider;

/// Document lifecycle and sharing rules on top of the storage service
#[derive(Clone)]
pub struct DocumentService {
    storage: Arc<dyn DocStorage>,
    identity: Arc<dyn IdentityProvider>,
    clock: Arc<dyn Clock>,
}

/// Titles are normalized to their trimmed form before they are stored
fn non_empty_title(title: &str) -> Result<&str, ColabError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ColabError::InvalidArgument("Title must not be empty".to_string()));
    }
    Ok(trimmed)
}

impl DocumentService {
    pub fn new(
        storage: Arc<dyn DocStorage>,
        identity: Arc<dyn IdentityProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            storage,
            identity,
            clock,
        }
    }

    async fn load(&self, doc_id: Uuid) -> Result<Document, ColabError> {
        self.storage.get_document(doc_id).await?.ok_or(ColabError::NotFound)
    }

    pub async fn create(&self, prpl: &str, title: &str) -> Result<Uuid, ColabError> {
        let title = non_empty_title(title)?;
        let doc = Document::new(prpl, title, self.clock.now());
        self.storage.insert_document(&doc).await?;
        info!("Document '{}' created by {}", doc.id, prpl);
        Ok(doc.id)
    }

    pub async fn get(&self, prpl: &str, doc_id: Uuid) -> Result<Document, ColabError> {
        let doc = self.load(doc_id).await?;
        policy::ensure_read(prpl, &doc)?;
        Ok(doc)
    }

    /// Owned documents first, then documents shared with `prpl` or public. Each group is
    /// ordered by recency on its own; the groups are never interleaved.
    pub async fn list(&self, prpl: &str) -> Result<Vec<Document>, ColabError> {
        let mut docs = self.storage.list_owned(prpl).await?;
        docs.extend(self.storage.list_shared(prpl).await?);
        Ok(docs)
    }

    pub async fn update_content(
        &self,
        prpl: &str,
        doc_id: Uuid,
        content: &str,
    ) -> Result<(), ColabError> {
        let doc = self.load(doc_id).await?;
        policy::ensure_write(prpl, &doc)?;
        self.storage
            .update_content(doc_id, content, self.clock.now())
            .await?;
        Ok(())
    }

    pub async fn update_title(&self, prpl: &str, doc_id: Uuid, title: &str) -> Result<(), ColabError> {
        let title = non_empty_title(title)?;
        let doc = self.load(doc_id).await?;
        policy::ensure_admin(prpl, &doc)?;
        self.storage.update_title(doc_id, title, self.clock.now()).await?;
        info!("Document '{}' renamed by {}", doc_id, prpl);
        Ok(())
    }

    pub async fn set_public(&self, prpl: &str, doc_id: Uuid, is_public: bool) -> Result<(), ColabError> {
        let doc = self.load(doc_id).await?;
        policy::ensure_admin(prpl, &doc)?;
        if doc.is_public == is_public {
            return Ok(());
        }
        self.storage
            .set_public(doc_id, is_public, self.clock.now())
            .await?;
        info!("Document '{}' public flag set to {} by {}", doc_id, is_public, prpl);
        Ok(())
    }

    /// Deletes the document together with its presence sessions
    pub async fn delete(&self, prpl: &str, doc_id: Uuid) -> Result<(), ColabError> {
        let doc = self.load(doc_id).await?;
        policy::ensure_admin(prpl, &doc)?;
        self.storage.delete_document(doc_id).await?;
        info!("Document '{}' deleted by {}", doc_id, prpl);
        Ok(())
    }

    pub async fn add_collaborator(
        &self,
        prpl: &str,
        doc_id: Uuid,
        email: &str,
    ) -> Result<(), ColabError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ColabError::InvalidArgument("Collaborator email must not be empty".to_string()));
        }

        let doc = self.load(doc_id).await?;
        policy::ensure_admin(prpl, &doc)?;

        let collaborator = match self.identity.resolve_by_email(email).await? {
            Some(id) => id,
            None => {
                warn!("No user registered for collaborator email on document '{}'", doc_id);
                return Err(ColabError::UserNotFound);
            }
        };

        let added = self
            .storage
            .add_collaborator(doc_id, &collaborator, self.clock.now())
            .await?;
        if added {
            info!("User {} added as collaborator on '{}'", collaborator, doc_id);
        }
        Ok(())
    }
}
