use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info};

use crate::services::SyncSettings;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Environment (dev, staging, prod)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// CORS allowed origins, comma separated
    pub cors_origins: Option<String>,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_service_name")]
    pub cloud_service_name: String,

    /// JWT secret key shared with the auth service
    pub cloud_auth_jwt_secret: Option<String>,

    /// Database URL. Documents are kept in memory when absent.
    pub db_url: Option<String>,

    /// Base URL of the user directory used for email and profile lookups
    pub identity_service_url: Option<String>,

    /// Seconds after the last heartbeat before a session stops counting as active
    #[serde(default = "default_session_staleness_secs")]
    pub session_staleness_secs: u64,

    /// Period of the stale session sweeper. No sweeper runs when unset.
    pub session_eviction_interval_secs: Option<u64>,

    /// Recommended client delay between the last edit and saving content
    #[serde(default = "default_content_debounce_ms")]
    pub content_debounce_ms: u64,

    /// Recommended client presence heartbeat interval
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
}

impl Config {
    /// Load configuration from environment variables or app.env file
    pub fn load() -> Result<Self, ConfigError> {
        // Try to load from app.env file first
        if std::path::Path::new("app.env").exists() {
            dotenvy::from_filename("app.env").ok();
        } else {
            // Fallback to .env file
            dotenvy::dotenv().ok();
        }

        match envy::from_env::<Config>() {
            Ok(config) => {
                info!("Configuration loaded successfully");
                Ok(config)
            }
            Err(e) => {
                error!("Failed to load configuration: {}", e);
                Err(ConfigError::EnvError(e))
            }
        }
    }

    /// Get the full server address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if running in development mode
    pub fn is_development(&self) -> bool {
        self.environment.to_lowercase() == "dev" || self.environment.to_lowercase() == "development"
    }

    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            staleness_secs: self.session_staleness_secs,
            content_debounce_ms: self.content_debounce_ms,
            heartbeat_interval_ms: self.heartbeat_interval_ms,
        }
    }

    pub fn session_eviction_interval(&self) -> Option<Duration> {
        self.session_eviction_interval_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn cors_origin_list(&self) -> Vec<String> {
        self.cors_origins
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Identity directory URL and signing secret, or `None` when no directory is configured.
    /// A directory without a secret cannot sign its lookups and is rejected.
    pub fn identity_service(&self) -> Result<Option<(String, String)>, ConfigError> {
        match (&self.identity_service_url, &self.cloud_auth_jwt_secret) {
            (Some(url), Some(secret)) => Ok(Some((url.clone(), secret.clone()))),
            (Some(url), None) => Err(ConfigError::MissingSecret(url.clone())),
            (None, _) => Ok(None),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            log_level: default_log_level(),
            cors_origins: None,
            cloud_service_name: default_service_name(),
            cloud_auth_jwt_secret: None,
            db_url: None,
            identity_service_url: None,
            session_staleness_secs: default_session_staleness_secs(),
            session_eviction_interval_secs: None,
            content_debounce_ms: default_content_debounce_ms(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvError(#[from] envy::Error),

    #[error("Identity service {0} configured without CLOUD_AUTH_JWT_SECRET")]
    MissingSecret(String),
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "colabri-share".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_session_staleness_secs() -> u64 {
    crate::services::presence_service::DEFAULT_STALENESS_SECS
}

fn default_content_debounce_ms() -> u64 {
    1000
}

fn default_heartbeat_interval_ms() -> u64 {
    500
}
