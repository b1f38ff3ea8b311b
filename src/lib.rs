//! Expense Tracker Authentication Service
//!
//! Session lifecycle for the expense tracker API:
//! - User registration and login
//! - Argon2id password hashing
//! - Stateless JWT access (15 min) and refresh (7 day) tokens, each with its own secret
//! - Token delivery through HTTP-only cookies and the JSON body
//! - Auth middleware accepting the cookie or an `Authorization: Bearer` header
//!
//! Tokens are never stored server-side. Logout clears the client's cookies
//! only, and refreshing does not retire the refresh token that was used.
//!
//! # Configuration
//!
//! All configuration is loaded from environment variables at startup:
//! - `JWT_SECRET` - Secret for access tokens (required, min 32 chars)
//! - `JWT_REFRESH_SECRET` - Secret for refresh tokens (required, min 32 chars)
//! - `JWT_ACCESS_EXPIRATION` - Access token lifetime in seconds (default: 900)
//! - `JWT_REFRESH_EXPIRATION` - Refresh token lifetime in seconds (default: 604800)
//! - `APP_ENV` - `production` enables `Secure` / `SameSite=None` cookies
//! - `NODE_ENV` - Read in place of `APP_ENV` when that is unset
//! - `DATABASE_URL` - PostgreSQL connection string (required by the server binary)
//!
//! # Usage
//!
//! ```rust,ignore
//! use expense_auth::{build_router, AuthConfig, AuthService, PgUserStore};
//!
//! let config = AuthConfig::from_env()?;
//! config.validate()?;
//!
//! let store = Arc::new(PgUserStore::new(pool));
//! let auth = Arc::new(AuthService::new(store, config));
//! let app = build_router(auth);
//! ```

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod service;
pub mod session;
pub mod store;
pub mod token;

// Re-export commonly used types
pub use config::{AuthConfig, Environment, ServerConfig};
pub use error::AuthError;
pub use extractors::{AuthUser, ClientInfo};
pub use handlers::AuthState;
pub use models::*;
pub use service::AuthService;
pub use store::{MemoryUserStore, PgUserStore, StoreError, UserStore};
pub use token::{TokenError, TokenKind, TokenPair, TokenService};

use axum::{
    http::{header, Method},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

/// Create authentication routes only
pub fn create_routes(auth_service: Arc<AuthService>) -> Router {
    handlers::create_routes(auth_service)
}

/// Full application router: auth routes, service endpoints, CORS and tracing
pub fn build_router(auth_service: Arc<AuthService>) -> Router {
    // Any origin is reflected so the browser UI can send cookies cross-site
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(create_routes(auth_service))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn root() -> &'static str {
    "Backend is running!"
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
