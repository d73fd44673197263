use axum::http::{HeaderValue, Method};
use colabri_share::{
    build_app,
    clients::AppServiceClient,
    clock::SystemClock,
    config::Config,
    db::{DocStorage, MemoryStorage, PgStorage},
    services::{
        identity::{IdentityProvider, MemoryIdentity},
        session_sweeper::spawn_session_sweeper,
        SyncService,
    },
    state::AppState,
};
use std::panic;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    // Set panic hook for better error messages
    panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
    }));

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            // Default to info level, but allow debug for our app
            "colabri_share=debug,tower_http=debug,axum::rejection=trace,info".into()
        }))
        .init();

    info!("Starting server...");

    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        warn!("Using default configuration");
        Config::default()
    });

    // Storage: Postgres when configured, in-memory otherwise
    let storage: Arc<dyn DocStorage> = match &config.db_url {
        Some(db_url) => match PgStorage::connect(db_url).await {
            Ok(pg) => {
                info!("Database initialized successfully");
                Arc::new(pg)
            }
            Err(e) => {
                error!("Failed to initialize database: {}", e);
                std::process::exit(1);
            }
        },
        None => {
            warn!("No database URL configured - documents are kept in memory only");
            Arc::new(MemoryStorage::new())
        }
    };

    // Identity: app service directory when configured
    let identity: Arc<dyn IdentityProvider> = match config.identity_service() {
        Ok(Some((url, secret))) => {
            match AppServiceClient::new(url, secret, config.cloud_service_name.clone()) {
                Ok(client) => Arc::new(client),
                Err(e) => {
                    error!("Failed to create identity client: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Ok(None) => {
            warn!("No identity service configured - collaborator and profile lookups will find nobody");
            Arc::new(MemoryIdentity::new())
        }
        Err(e) => {
            error!("Invalid identity configuration: {}", e);
            std::process::exit(1);
        }
    };

    if config.cloud_auth_jwt_secret.is_none() {
        warn!("No JWT secret configured - all requests are anonymous");
    }

    let sync = SyncService::new(storage, identity, Arc::new(SystemClock), config.sync_settings());

    if let Some(every) = config.session_eviction_interval() {
        spawn_session_sweeper(sync.presence().clone(), every);
    }

    let state = AppState {
        sync,
        jwt_secret: config.cloud_auth_jwt_secret.clone(),
        service_name: config.cloud_service_name.clone(),
    };

    let mut app = build_app(state);

    let origins = config.cors_origin_list();
    if !origins.is_empty() {
        let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        app = app.layer(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers(Any),
        );
    } else if config.is_development() {
        app = app.layer(CorsLayer::permissive());
    }

    // Start the HTTP/API server
    let listener = tokio::net::TcpListener::bind(config.server_address())
        .await
        .unwrap_or_else(|_| panic!("Failed to bind to {}", config.server_address()));

    info!("Server running on http://{}", config.server_address());
    info!("Swagger UI available at http://{}/swagger", config.server_address());

    axum::serve(listener, app)
        .await
        .expect("Server failed to start");
}
