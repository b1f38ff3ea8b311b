//! Authentication Middleware
//!
//! The gate in front of protected routes. A request is admitted only when it
//! carries a valid access token for a user that still exists:
//!
//! 1. take the `accessToken` cookie, or failing that an
//!    `Authorization: Bearer <token>` header (neither: `NoToken`)
//! 2. verify it as an access token (`InvalidToken` or `Expired`)
//! 3. load the user (`UserNotFound`)
//! 4. store the [`UserProfile`] in request extensions and continue
//!
//! Every rejection is a 401; store failures become a generic 500.

use crate::error::AuthError;
use crate::handlers::AuthState;
use crate::models::UserProfile;
use crate::session::ACCESS_TOKEN_COOKIE;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

/// Pick the candidate access token, cookie first
pub fn extract_access_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(ACCESS_TOKEN_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
}

/// Require authenticated user
///
/// Validates the access token and stores the loaded user in request
/// extensions for the [`AuthUser`](crate::extractors::AuthUser) extractor.
pub async fn require_auth(
    State(auth): State<AuthState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = extract_access_token(&jar, req.headers()).ok_or(AuthError::NoToken)?;

    let user: UserProfile = auth.authenticate(&token).await.map_err(|e| {
        tracing::debug!(path = %req.uri().path(), "Request rejected: {}", e);
        e
    })?;

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
