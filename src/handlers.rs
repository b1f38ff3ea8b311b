//! Authentication HTTP Handlers
//!
//! REST API endpoints for account operations.

use crate::error::AuthError;
use crate::extractors::{AuthUser, ClientInfo};
use crate::middleware;
use crate::models::*;
use crate::service::AuthService;
use crate::session::{self, REFRESH_TOKEN_COOKIE};

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    middleware as axum_middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::{CookieJar, WithRejection};
use std::sync::Arc;
use validator::Validate;

/// Shared auth service state
pub type AuthState = Arc<AuthService>;

// ============================================
// Route Builder
// ============================================

/// Create authentication routes
pub fn create_routes(auth_service: Arc<AuthService>) -> Router {
    // Public routes (no authentication required)
    let public = Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh-token", post(refresh_token))
        .route("/auth/logout", post(logout));

    // Protected routes (require authentication)
    let protected = Router::new()
        .route("/auth/me", get(get_current_user))
        .layer(axum_middleware::from_fn_with_state(
            auth_service.clone(),
            middleware::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .with_state(auth_service)
}

// ============================================
// Registration
// ============================================

/// POST /auth/register
///
/// Register a new user account and start a session
pub async fn register(
    State(auth): State<AuthState>,
    jar: CookieJar,
    WithRejection(Json(req), _): WithRejection<Json<RegisterRequest>, AuthError>,
) -> Result<impl IntoResponse, AuthError> {
    req.validate()
        .map_err(|e| AuthError::Validation(e.to_string()))?;

    let (user, tokens) = auth.register(req).await?;
    let (jar, body) = session::attach(jar, auth.cookie_policy(), &tokens);

    Ok((
        StatusCode::CREATED,
        jar,
        Json(AuthResponse {
            message: "User registered successfully".to_string(),
            user: UserResponse::from(&user),
            tokens: body,
        }),
    ))
}

// ============================================
// Login / Logout
// ============================================

/// POST /auth/login
///
/// Authenticate user and return access/refresh tokens
pub async fn login(
    State(auth): State<AuthState>,
    ClientInfo { ip, user_agent }: ClientInfo,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AuthError> {
    // A malformed body fails like a wrong password
    let Json(req) = payload.map_err(|e| {
        tracing::debug!("Rejected login body: {}", e.body_text());
        AuthError::InvalidCredentials
    })?;
    req.validate()
        .map_err(|_| AuthError::InvalidCredentials)?;

    let (user, tokens) = auth.login(req).await?;
    let (jar, body) = session::attach(jar, auth.cookie_policy(), &tokens);

    tracing::info!(
        user_id = %user.id,
        ip = ip.as_deref().unwrap_or("unknown"),
        user_agent = user_agent.as_deref().unwrap_or("unknown"),
        "User logged in"
    );

    Ok((
        jar,
        Json(AuthResponse {
            message: "Login successful".to_string(),
            user: UserResponse::from(&user),
            tokens: body,
        }),
    ))
}

/// POST /auth/logout
///
/// Clear the token cookies. No credential check; issued tokens stay valid
/// until they expire.
pub async fn logout(State(auth): State<AuthState>, jar: CookieJar) -> impl IntoResponse {
    tracing::info!("User logged out");

    (
        session::clear(jar, auth.cookie_policy()),
        Json(MessageResponse::new("Logged out successfully")),
    )
}

// ============================================
// Token Refresh
// ============================================

/// POST /auth/refresh-token
///
/// Issue a new token pair from the refresh token cookie
pub async fn refresh_token(
    State(auth): State<AuthState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AuthError> {
    let presented = jar
        .get(REFRESH_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(AuthError::MissingRefreshToken)?;

    let tokens = auth.refresh(&presented).await?;
    let (jar, body) = session::attach(jar, auth.cookie_policy(), &tokens);

    Ok((
        jar,
        Json(RefreshResponse {
            message: "Token refreshed successfully".to_string(),
            tokens: body,
        }),
    ))
}

// ============================================
// User Profile
// ============================================

/// GET /auth/me
///
/// Get current user profile
pub async fn get_current_user(AuthUser(user): AuthUser) -> Json<UserProfile> {
    Json(user)
}
