use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use moka::future::Cache;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::services::identity::{IdentityError, IdentityProvider, UserProfile};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    #[serde(rename = "type")]
    type_: String,
    exp: usize,
}

#[derive(Debug, Deserialize)]
struct UserLookupResponse {
    id: String,
}

/// HTTP client for the user directory of the app service. Lookups are cached for a
/// few minutes of inactivity.
pub struct AppServiceClient {
    client: Client,
    base_url: String,
    jwt_secret: String,
    service_name: String,
    profiles: Cache<String, UserProfile>,
    emails: Cache<String, String>,
}

impl AppServiceClient {
    pub fn new(base_url: String, jwt_secret: String, service_name: String) -> Result<Self, IdentityError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| IdentityError::Unavailable(format!("Failed to build HTTP client: {}", e)))?;

        let cache_ttl = std::time::Duration::from_secs(5 * 60);
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            jwt_secret,
            service_name,
            profiles: Cache::builder().max_capacity(100_000).time_to_idle(cache_ttl).build(),
            emails: Cache::builder().max_capacity(100_000).time_to_idle(cache_ttl).build(),
        })
    }

    fn generate_token(&self) -> Result<String, IdentityError> {
        let expiration = Utc::now()
            .checked_add_signed(Duration::seconds(60)) // 1 minute expiration
            .map(|t| t.timestamp())
            .unwrap_or_default();

        let claims = Claims {
            sub: self.service_name.clone(),
            type_: "service".to_string(),
            exp: expiration as usize,
        };

        encode(&Header::default(), &claims, &EncodingKey::from_secret(self.jwt_secret.as_bytes()))
            .map_err(|e| IdentityError::Unavailable(format!("Failed to sign service token: {}", e)))
    }

    /// GET `path` and decode the JSON body, mapping 404 to `None`
    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<T>, IdentityError> {
        let token = self.generate_token()?;
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(query)
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .map_err(|e| {
                error!("Request to {} failed: {}", url, e);
                IdentityError::Unavailable(e.to_string())
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = response
            .error_for_status()
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;
        let body = response
            .json::<T>()
            .await
            .map_err(|e| IdentityError::InvalidResponse(e.to_string()))?;
        Ok(Some(body))
    }
}

#[async_trait]
impl IdentityProvider for AppServiceClient {
    async fn resolve_by_email(&self, email: &str) -> Result<Option<String>, IdentityError> {
        let key = email.to_lowercase();
        if let Some(id) = self.emails.get(&key).await {
            return Ok(Some(id));
        }

        let found: Option<UserLookupResponse> = self.get_json("/users/lookup", &[("email", email)]).await?;
        if let Some(user) = &found {
            self.emails.insert(key, user.id.clone()).await;
        }
        Ok(found.map(|u| u.id))
    }

    async fn profile(&self, prpl: &str) -> Result<Option<UserProfile>, IdentityError> {
        if let Some(profile) = self.profiles.get(prpl).await {
            return Ok(Some(profile));
        }

        info!("User profile cache miss for {}. Fetching from app service.", prpl);
        let path = format!("/users/{}", prpl);
        let profile: Option<UserProfile> = self.get_json(&path, &[]).await?;
        if let Some(p) = &profile {
            self.profiles.insert(prpl.to_string(), p.clone()).await;
        }
        Ok(profile)
    }
}
