use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

const ANONYMOUS: &str = "Anonymous";

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Identity service unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid identity service response: {0}")]
    InvalidResponse(String),
}

/// Public profile of a user as known by the user directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl UserProfile {
    /// Name to show next to a cursor: profile name, then email, then "Anonymous"
    pub fn display_name(&self) -> String {
        [self.name.as_deref(), self.email.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
            .unwrap_or(ANONYMOUS)
            .to_string()
    }
}

/// Lookups against the user directory. Authentication itself happens in the auth
/// middleware; this only answers questions about already known principals.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Principal id registered for `email`, if any
    async fn resolve_by_email(&self, email: &str) -> Result<Option<String>, IdentityError>;

    /// Profile of `prpl`, `None` when the principal is unknown
    async fn profile(&self, prpl: &str) -> Result<Option<UserProfile>, IdentityError>;
}

/// Directory kept in memory. Used by tests and by local development when no
/// identity service is configured.
#[derive(Default)]
pub struct MemoryIdentity {
    users: RwLock<HashMap<String, UserProfile>>,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, prpl: &str, profile: UserProfile) {
        self.users.write().await.insert(prpl.to_string(), profile);
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn resolve_by_email(&self, email: &str) -> Result<Option<String>, IdentityError> {
        let users = self.users.read().await;
        Ok(users
            .iter()
            .find(|(_, p)| p.email.as_deref().is_some_and(|e| e.eq_ignore_ascii_case(email)))
            .map(|(prpl, _)| prpl.clone()))
    }

    async fn profile(&self, prpl: &str) -> Result<Option<UserProfile>, IdentityError> {
        Ok(self.users.read().await.get(prpl).cloned())
    }
}
