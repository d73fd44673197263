use axum::http::{self};
use jsonwebtoken::{decode, Algorithm, DecodingKey, TokenData, Validation};
use tracing::debug;

use crate::auth::Principal;

const AUTH_COOKIE: &str = "auth_token";

/// Get the auth token from the Authorization header, falling back to the auth cookie.
/// Returns `None` when the request carries neither.
pub fn get_auth_token<B>(req: &http::Request<B>) -> Result<Option<String>, String> {
    if let Some(auth_header) = req.headers().get(http::header::AUTHORIZATION) {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| "Invalid Authorization header".to_string())?;
        return Ok(Some(
            auth_str.strip_prefix("Bearer ").unwrap_or(auth_str).trim().to_string(),
        ));
    }

    let Some(cookie_header) = req.headers().get(http::header::COOKIE) else {
        return Ok(None);
    };
    let cookie_header = cookie_header
        .to_str()
        .map_err(|_| "Invalid Cookie header".to_string())?;

    for c in cookie::Cookie::split_parse(cookie_header).flatten() {
        if c.name() == AUTH_COOKIE {
            return Ok(Some(c.value().to_string()));
        }
    }
    Ok(None)
}

/// Validate a JWT token and return the token data
pub fn validate_jwt(token: &str, secret: &str) -> Result<TokenData<serde_json::Value>, jsonwebtoken::errors::Error> {
    let validation = Validation::new(Algorithm::HS256);
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    decode::<serde_json::Value>(token, &decoding_key, &validation)
}

/// Resolve the principal of a user token. Service tokens and tokens without a
/// subject carry no principal.
pub fn principal_from_token(token: &str, secret: &str) -> Result<Option<Principal>, String> {
    let token_data = validate_jwt(token, secret).map_err(|e| format!("JWT validation failed: {}", e))?;

    let token_type = token_data
        .claims
        .get("type")
        .and_then(|v| v.as_str())
        .unwrap_or("user");
    if token_type != "user" {
        debug!("Token of type '{}' carries no user principal", token_type);
        return Ok(None);
    }

    match token_data.claims.get("sub").and_then(|v| v.as_str()) {
        Some(sub) if !sub.is_empty() => Ok(Some(Principal::new(sub))),
        _ => Err("JWT token does not contain 'sub' claim".to_string()),
    }
}
