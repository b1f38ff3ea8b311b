//! Authentication Error Types
//!
//! Centralized error handling for all authentication operations.
//! Client-facing messages are short and fixed; internal detail is only
//! ever written to the log.

use crate::store::StoreError;
use crate::token::TokenError;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Authentication errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    #[error("User already exists")]
    Conflict,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Access denied, no token provided")]
    NoToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    Expired,

    #[error("User not found")]
    UserNotFound,

    #[error("Refresh token not found")]
    MissingRefreshToken,

    #[error("Invalid or expired refresh token")]
    InvalidRefreshToken,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error")]
    Internal,
}

impl AuthError {
    /// HTTP status and machine-readable code for this error
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AuthError::Conflict => (StatusCode::BAD_REQUEST, "user_exists"),
            AuthError::InvalidCredentials => (StatusCode::BAD_REQUEST, "invalid_credentials"),
            AuthError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            AuthError::NoToken => (StatusCode::UNAUTHORIZED, "no_token"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token"),
            AuthError::Expired => (StatusCode::UNAUTHORIZED, "token_expired"),
            AuthError::UserNotFound => (StatusCode::UNAUTHORIZED, "user_not_found"),
            AuthError::MissingRefreshToken => (StatusCode::UNAUTHORIZED, "no_refresh_token"),
            AuthError::InvalidRefreshToken => (StatusCode::UNAUTHORIZED, "invalid_refresh_token"),
            AuthError::Database(_) | AuthError::Config(_) | AuthError::Internal => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();

        let message = match &self {
            AuthError::Validation(msg) => msg.clone(),
            AuthError::Database(_) | AuthError::Config(_) | AuthError::Internal => {
                "Server error".to_string()
            }
            _ => self.to_string(),
        };

        let body = if matches!(self, AuthError::Expired) {
            serde_json::json!({
                "error": error_code,
                "message": message,
                "expired": true
            })
        } else {
            serde_json::json!({
                "error": error_code,
                "message": message
            })
        };

        (status, Json(body)).into_response()
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AuthError::Expired,
            TokenError::Malformed => AuthError::InvalidToken,
            TokenError::Signing(_) => AuthError::Internal,
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => AuthError::Conflict,
            StoreError::NotFound => AuthError::UserNotFound,
            StoreError::Database(msg) => {
                tracing::error!("Credential store error: {}", msg);
                AuthError::Database(msg)
            }
        }
    }
}

impl From<argon2::password_hash::Error> for AuthError {
    fn from(err: argon2::password_hash::Error) -> Self {
        tracing::error!("Password hashing error: {:?}", err);
        AuthError::Internal
    }
}

impl From<JsonRejection> for AuthError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected request body: {}", rejection.body_text());
        AuthError::Validation("Invalid request body".to_string())
    }
}
