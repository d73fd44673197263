use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::services::auth_service::{get_auth_token, principal_from_token};
use crate::state::AppState;

/// Attach the caller's [`crate::auth::Principal`] to the request when a valid user
/// token is present. Requests without one continue anonymously; handlers decide what an
/// anonymous caller may do.
pub async fn auth_middleware(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    // 1. Get the auth token from the request
    let token = match get_auth_token(&req) {
        Ok(Some(token)) => token,
        Ok(None) => return next.run(req).await,
        Err(e) => {
            warn!("Unreadable credentials: {}", e);
            return next.run(req).await;
        }
    };

    // 2. Validate the token; without a secret every token is ignored
    let Some(secret) = state.jwt_secret.as_deref() else {
        warn!("JWT secret not configured, treating request as anonymous");
        return next.run(req).await;
    };

    // 3. Extract the principal and pass it to downstream handlers
    match principal_from_token(&token, secret) {
        Ok(Some(principal)) => {
            req.extensions_mut().insert(principal);
        }
        Ok(None) => {}
        Err(e) => warn!("Ignoring invalid token: {}", e),
    }

    next.run(req).await
}
