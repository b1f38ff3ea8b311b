//! Authentication Extractors
//!
//! Axum extractors for the authenticated user and request metadata.

use crate::error::AuthError;
use crate::models::UserProfile;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// The user admitted by [`require_auth`](crate::middleware::require_auth)
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserProfile);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Only the gate puts a user here; a route without it is unauthenticated
        parts
            .extensions
            .get::<UserProfile>()
            .cloned()
            .map(AuthUser)
            .ok_or(AuthError::NoToken)
    }
}

/// Client information (IP, user agent)
#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ip = parts
            .headers
            .get("X-Forwarded-For")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.split(',').next())
            .map(|s| s.trim().to_string())
            .or_else(|| {
                parts
                    .headers
                    .get("X-Real-IP")
                    .and_then(|h| h.to_str().ok())
                    .map(String::from)
            });

        let user_agent = parts
            .headers
            .get("User-Agent")
            .and_then(|h| h.to_str().ok())
            .map(String::from);

        Ok(ClientInfo { ip, user_agent })
    }
}
