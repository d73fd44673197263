//! Access control and presence engine for collaborative text documents.
//!
//! Documents have one owner, a set of collaborators with write access and an optional
//! public read flag. Presence sessions track each viewer's cursor and expire softly
//! after a staleness window. Concurrent content writes resolve as last write wins.

pub mod auth;
pub mod clients;
pub mod clock;
pub mod config;
pub mod db;
pub mod docs;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::Router;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use docs::ApiDoc;
use routes::create_api_routes;
use state::AppState;

/// Full HTTP application: API routes, Swagger UI and request tracing
pub fn build_app(state: AppState) -> Router {
    Router::new()
        // Mount API routes
        .nest("/api", create_api_routes(state))
        // Mount Swagger UI
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add tracing layer
        .layer(TraceLayer::new_for_http())
}
