use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::policy;
use crate::clock::Clock;
use crate::db::DocStorage;
use crate::error::ColabError;
use crate::models::{Selection, Session};
use crate::services::identity::IdentityProvider;

/// Default time after which a silent session no longer counts as active
pub const DEFAULT_STALENESS_SECS: u64 = 5 * 60;

/// Tracks who is looking at which document and where their cursor is.
///
/// A session is active while its `lastSeen` is strictly newer than `now - staleness`.
/// A record exactly on the window edge is stale. Stale records are filtered on read
/// and only removed by [`PresenceService::evict_stale`].
#[derive(Clone)]
pub struct PresenceService {
    storage: Arc<dyn DocStorage>,
    identity: Arc<dyn IdentityProvider>,
    clock: Arc<dyn Clock>,
    staleness: Duration,
}

impl PresenceService {
    pub fn new(
        storage: Arc<dyn DocStorage>,
        identity: Arc<dyn IdentityProvider>,
        clock: Arc<dyn Clock>,
        staleness: Duration,
    ) -> Self {
        Self {
            storage,
            identity,
            clock,
            staleness,
        }
    }

    pub fn staleness(&self) -> Duration {
        self.staleness
    }

    async fn ensure_readable(&self, prpl: &str, doc_id: Uuid) -> Result<(), ColabError> {
        let doc = self
            .storage
            .get_document(doc_id)
            .await?
            .ok_or(ColabError::NotFound)?;
        policy::ensure_read(prpl, &doc)
    }

    /// Principals without a directory profile show up as "Anonymous"
    async fn display_name(&self, prpl: &str) -> Result<String, ColabError> {
        let profile = self.identity.profile(prpl).await?.unwrap_or_default();
        Ok(profile.display_name())
    }

    pub async fn heartbeat(
        &self,
        prpl: &str,
        doc_id: Uuid,
        cursor_position: u32,
        selection: Selection,
    ) -> Result<(), ColabError> {
        if !selection.is_ordered() {
            return Err(ColabError::InvalidArgument(format!(
                "Selection start {} is after end {}",
                selection.start, selection.end
            )));
        }
        self.ensure_readable(prpl, doc_id).await?;

        // The display name is captured once, when the record is first inserted
        let user_name = match self.storage.get_session(prpl, doc_id).await? {
            Some(existing) => existing.user_name,
            None => {
                let name = self.display_name(prpl).await?;
                info!("User {} joined document '{}'", prpl, doc_id);
                name
            }
        };

        let session = Session {
            document_id: doc_id,
            user_id: prpl.to_string(),
            user_name,
            cursor_position,
            selection,
            last_seen: self.clock.now(),
        };
        self.storage.upsert_session(&session).await?;
        Ok(())
    }

    /// Fresh sessions of other users on the document
    pub async fn active_sessions(&self, prpl: &str, doc_id: Uuid) -> Result<Vec<Session>, ColabError> {
        self.ensure_readable(prpl, doc_id).await?;
        let since = self.clock.now() - self.staleness;
        let sessions = self.storage.list_sessions_since(doc_id, since).await?;
        Ok(sessions.into_iter().filter(|s| s.user_id != prpl).collect())
    }

    /// Returns whether a record was removed
    pub async fn leave(&self, prpl: &str, doc_id: Uuid) -> Result<bool, ColabError> {
        let removed = self.storage.delete_session(prpl, doc_id).await?;
        if removed {
            info!("User {} left document '{}'", prpl, doc_id);
        }
        Ok(removed)
    }

    /// Physically remove sessions that are already invisible to readers
    pub async fn evict_stale(&self) -> Result<u64, ColabError> {
        let cutoff = self.clock.now() - self.staleness;
        let evicted = self.storage.evict_sessions_before(cutoff).await?;
        debug!("Evicted {} stale sessions", evicted);
        Ok(evicted)
    }
}
