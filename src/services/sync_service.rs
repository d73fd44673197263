use chrono::Duration;
use std::sync::Arc;
use tracing::{error, warn};
use uuid::Uuid;

use crate::auth::Principal;
use crate::clock::Clock;
use crate::db::DocStorage;
use crate::error::ColabError;
use crate::models::{Document, Selection, Session, SyncPolicyResponse};
use crate::services::document_service::DocumentService;
use crate::services::identity::IdentityProvider;
use crate::services::presence_service::PresenceService;

/// Pacing values handed to clients and the staleness window used by presence
#[derive(Debug, Clone, Copy)]
pub struct SyncSettings {
    pub staleness_secs: u64,
    pub content_debounce_ms: u64,
    pub heartbeat_interval_ms: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            staleness_secs: crate::services::presence_service::DEFAULT_STALENESS_SECS,
            content_debounce_ms: 1000,
            heartbeat_interval_ms: 500,
        }
    }
}

/// Operation surface used by editor clients.
///
/// Mutations require a principal and report every failure. Reads (`get_document`,
/// `list_documents`, `get_active_sessions`) answer unauthenticated or unauthorized
/// callers with an empty result so document existence is not leaked; only storage
/// failures come back as errors. `leave_session` never fails.
#[derive(Clone)]
pub struct SyncService {
    documents: DocumentService,
    presence: PresenceService,
    settings: SyncSettings,
    backend: &'static str,
}

fn require(principal: Option<&Principal>) -> Result<&str, ColabError> {
    principal.map(|p| p.id.as_str()).ok_or(ColabError::Unauthenticated)
}

/// Turn "you may not see this" into "there is nothing here"
fn hide_denied<T>(result: Result<T, ColabError>, empty: T) -> Result<T, ColabError> {
    match result {
        Err(ColabError::AccessDenied) | Err(ColabError::NotFound) => Ok(empty),
        other => other,
    }
}

impl SyncService {
    pub fn new(
        storage: Arc<dyn DocStorage>,
        identity: Arc<dyn IdentityProvider>,
        clock: Arc<dyn Clock>,
        settings: SyncSettings,
    ) -> Self {
        let backend = storage.backend_name();
        let staleness = Duration::seconds(settings.staleness_secs.min(u64::from(u32::MAX)) as i64);
        Self {
            documents: DocumentService::new(storage.clone(), identity.clone(), clock.clone()),
            presence: PresenceService::new(storage, identity, clock, staleness),
            settings,
            backend,
        }
    }

    pub fn storage_backend(&self) -> &'static str {
        self.backend
    }

    pub fn presence(&self) -> &PresenceService {
        &self.presence
    }

    pub fn sync_policy(&self) -> SyncPolicyResponse {
        SyncPolicyResponse {
            content_debounce_ms: self.settings.content_debounce_ms,
            heartbeat_interval_ms: self.settings.heartbeat_interval_ms,
            staleness_window_secs: self.settings.staleness_secs,
        }
    }

    pub async fn create_document(&self, principal: Option<&Principal>, title: &str) -> Result<Uuid, ColabError> {
        let prpl = require(principal)?;
        self.documents.create(prpl, title).await
    }

    pub async fn list_documents(&self, principal: Option<&Principal>) -> Result<Vec<Document>, ColabError> {
        match principal {
            Some(p) => self.documents.list(&p.id).await,
            None => Ok(Vec::new()),
        }
    }

    pub async fn get_document(
        &self,
        principal: Option<&Principal>,
        doc_id: Uuid,
    ) -> Result<Option<Document>, ColabError> {
        let Some(p) = principal else {
            return Ok(None);
        };
        hide_denied(self.documents.get(&p.id, doc_id).await.map(Some), None)
    }

    pub async fn update_document(
        &self,
        principal: Option<&Principal>,
        doc_id: Uuid,
        content: &str,
    ) -> Result<(), ColabError> {
        let prpl = require(principal)?;
        self.documents.update_content(prpl, doc_id, content).await
    }

    pub async fn update_document_title(
        &self,
        principal: Option<&Principal>,
        doc_id: Uuid,
        title: &str,
    ) -> Result<(), ColabError> {
        let prpl = require(principal)?;
        self.documents.update_title(prpl, doc_id, title).await
    }

    pub async fn set_document_public(
        &self,
        principal: Option<&Principal>,
        doc_id: Uuid,
        is_public: bool,
    ) -> Result<(), ColabError> {
        let prpl = require(principal)?;
        self.documents.set_public(prpl, doc_id, is_public).await
    }

    pub async fn delete_document(&self, principal: Option<&Principal>, doc_id: Uuid) -> Result<(), ColabError> {
        let prpl = require(principal)?;
        self.documents.delete(prpl, doc_id).await
    }

    pub async fn add_collaborator(
        &self,
        principal: Option<&Principal>,
        doc_id: Uuid,
        collaborator_email: &str,
    ) -> Result<(), ColabError> {
        let prpl = require(principal)?;
        self.documents.add_collaborator(prpl, doc_id, collaborator_email).await
    }

    pub async fn update_session(
        &self,
        principal: Option<&Principal>,
        doc_id: Uuid,
        cursor_position: u32,
        selection: Selection,
    ) -> Result<(), ColabError> {
        let prpl = require(principal)?;
        self.presence.heartbeat(prpl, doc_id, cursor_position, selection).await
    }

    pub async fn get_active_sessions(
        &self,
        principal: Option<&Principal>,
        doc_id: Uuid,
    ) -> Result<Vec<Session>, ColabError> {
        let Some(p) = principal else {
            return Ok(Vec::new());
        };
        hide_denied(self.presence.active_sessions(&p.id, doc_id).await, Vec::new())
    }

    pub async fn leave_session(&self, principal: Option<&Principal>, doc_id: Uuid) {
        let Some(p) = principal else {
            warn!("Ignoring leave for document '{}' without a principal", doc_id);
            return;
        };
        if let Err(e) = self.presence.leave(&p.id, doc_id).await {
            error!("Failed to remove session of {} on '{}': {}", p.id, doc_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::db::MemoryStorage;
    use crate::services::identity::{MemoryIdentity, UserProfile};
    use chrono::Utc;

    async fn service() -> (SyncService, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let identity = Arc::new(MemoryIdentity::new());
        for id in ["alice", "bob", "carol"] {
            identity
                .register(
                    id,
                    UserProfile {
                        name: Some(id.to_uppercase()),
                        email: Some(format!("{}@example.com", id)),
                    },
                )
                .await;
        }
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let svc = SyncService::new(storage.clone(), identity, clock, SyncSettings::default());
        (svc, storage)
    }

    #[tokio::test]
    async fn presence_works_without_a_user_directory() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let svc = SyncService::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(MemoryIdentity::new()),
            clock,
            SyncSettings::default(),
        );
        let alice = Principal::new("alice");
        let bob = Principal::new("bob");
        let id = svc.create_document(Some(&alice), "Doc").await.unwrap();
        svc.set_document_public(Some(&alice), id, true).await.unwrap();

        svc.update_session(Some(&alice), id, 0, Selection::default()).await.unwrap();
        let sessions = svc.get_active_sessions(Some(&bob), id).await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].user_name, "Anonymous");
    }

    #[tokio::test]
    async fn anonymous_callers() {
        let (svc, _) = service().await;
        let alice = Principal::new("alice");
        let id = svc.create_document(Some(&alice), "Doc").await.unwrap();

        assert_eq!(svc.create_document(None, "Doc").await, Err(ColabError::Unauthenticated));
        assert_eq!(svc.update_document(None, id, "x").await, Err(ColabError::Unauthenticated));
        assert_eq!(svc.delete_document(None, id).await, Err(ColabError::Unauthenticated));
        assert_eq!(
            svc.update_session(None, id, 0, Selection::default()).await,
            Err(ColabError::Unauthenticated)
        );
        assert!(svc.list_documents(None).await.unwrap().is_empty());
        assert_eq!(svc.get_document(None, id).await, Ok(None));
        assert!(svc.get_active_sessions(None, id).await.unwrap().is_empty());
        svc.leave_session(None, id).await;
    }

    #[tokio::test]
    async fn reads_do_not_leak_existence() {
        let (svc, _) = service().await;
        let alice = Principal::new("alice");
        let bob = Principal::new("bob");
        let id = svc.create_document(Some(&alice), "Private").await.unwrap();
        svc.update_session(Some(&alice), id, 0, Selection::default()).await.unwrap();

        assert_eq!(svc.get_document(Some(&bob), id).await, Ok(None));
        assert_eq!(svc.get_document(Some(&bob), Uuid::new_v4()).await, Ok(None));
        assert!(svc.get_active_sessions(Some(&bob), id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_cascades_sessions() {
        let (svc, storage) = service().await;
        let alice = Principal::new("alice");
        let id = svc.create_document(Some(&alice), "Doc").await.unwrap();
        svc.add_collaborator(Some(&alice), id, "bob@example.com").await.unwrap();
        svc.update_session(Some(&alice), id, 0, Selection::default()).await.unwrap();
        svc.update_session(Some(&Principal::new("bob")), id, 4, Selection::new(1, 4))
            .await
            .unwrap();
        assert_eq!(storage.session_count().await, 2);

        svc.delete_document(Some(&alice), id).await.unwrap();
        assert_eq!(storage.session_count().await, 0);
    }

    #[tokio::test]
    async fn concurrent_writers_last_write_wins() {
        let (svc, _) = service().await;
        let alice = Principal::new("alice");
        let bob = Principal::new("bob");
        let id = svc.create_document(Some(&alice), "Doc").await.unwrap();
        svc.add_collaborator(Some(&alice), id, "bob@example.com").await.unwrap();

        let (a, b) = tokio::join!(
            svc.update_document(Some(&alice), id, "from alice"),
            svc.update_document(Some(&bob), id, "from bob"),
        );
        a.unwrap();
        b.unwrap();

        let content = svc.get_document(Some(&alice), id).await.unwrap().unwrap().content;
        assert!(content == "from alice" || content == "from bob");
    }

    #[tokio::test]
    async fn mutation_errors_are_reported() {
        let (svc, _) = service().await;
        let alice = Principal::new("alice");
        let carol = Principal::new("carol");
        let id = svc.create_document(Some(&alice), "Doc").await.unwrap();
        svc.set_document_public(Some(&alice), id, true).await.unwrap();

        assert_eq!(svc.update_document(Some(&carol), id, "x").await, Err(ColabError::AccessDenied));
        assert_eq!(
            svc.update_document(Some(&carol), Uuid::new_v4(), "x").await,
            Err(ColabError::NotFound)
        );
        assert!(svc.get_document(Some(&carol), id).await.unwrap().is_some());
    }

    #[test]
    fn sync_policy_reflects_settings() {
        let storage = Arc::new(MemoryStorage::new());
        let svc = SyncService::new(
            storage,
            Arc::new(MemoryIdentity::new()),
            Arc::new(ManualClock::new(Utc::now())),
            SyncSettings {
                staleness_secs: 60,
                content_debounce_ms: 250,
                heartbeat_interval_ms: 100,
            },
        );
        let policy = svc.sync_policy();
        assert_eq!(policy.staleness_window_secs, 60);
        assert_eq!(policy.content_debounce_ms, 250);
        assert_eq!(policy.heartbeat_interval_ms, 100);
        assert_eq!(svc.storage_backend(), "memory");
    }
}
