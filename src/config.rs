//! Service Configuration
//!
//! All configuration values are loaded from environment variables once at
//! startup and passed by reference into the services that need them.
//! Request-handling code never reads the environment.

use crate::error::AuthError;
use std::env;

/// Deployment mode, controls cookie security attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Development,
}

impl Environment {
    /// Only `production` selects production mode.
    pub fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    /// `APP_ENV` wins; `NODE_ENV` is honored when it is unset
    pub fn from_vars(app_env: Option<&str>, node_env: Option<&str>) -> Self {
        app_env
            .or(node_env)
            .map(Environment::from_name)
            .unwrap_or(Environment::Development)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Production => "production",
            Environment::Development => "development",
        }
    }
}

/// Authentication configuration loaded from environment
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Secret for signing access tokens (from JWT_SECRET env var)
    pub access_token_secret: String,

    /// Secret for signing refresh tokens (from JWT_REFRESH_SECRET env var)
    pub refresh_token_secret: String,

    /// Access token lifetime in seconds (from JWT_ACCESS_EXPIRATION env var)
    pub access_token_expiration: i64,

    /// Refresh token lifetime in seconds (from JWT_REFRESH_EXPIRATION env var)
    pub refresh_token_expiration: i64,

    /// Deployment mode (from APP_ENV, falling back to NODE_ENV)
    pub environment: Environment,

    /// Argon2 memory cost in KiB (from ARGON2_MEMORY_COST env var)
    pub argon2_memory_cost: u32,

    /// Argon2 time cost (iterations) (from ARGON2_TIME_COST env var)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (from ARGON2_PARALLELISM env var)
    pub argon2_parallelism: u32,
}

impl AuthConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AuthError> {
        Ok(Self {
            access_token_secret: required("JWT_SECRET")?,

            refresh_token_secret: required("JWT_REFRESH_SECRET")?,

            access_token_expiration: parsed_or("JWT_ACCESS_EXPIRATION", 900), // 15 minutes

            refresh_token_expiration: parsed_or("JWT_REFRESH_EXPIRATION", 604_800), // 7 days

            environment: Environment::from_vars(
                env::var("APP_ENV").ok().as_deref(),
                env::var("NODE_ENV").ok().as_deref(),
            ),

            // argon2 crate defaults, comparable in cost to bcrypt at 10 rounds
            argon2_memory_cost: parsed_or("ARGON2_MEMORY_COST", argon2::Params::DEFAULT_M_COST),

            argon2_time_cost: parsed_or("ARGON2_TIME_COST", argon2::Params::DEFAULT_T_COST),

            argon2_parallelism: parsed_or("ARGON2_PARALLELISM", argon2::Params::DEFAULT_P_COST),
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.access_token_secret.len() < 32 {
            return Err(AuthError::Config(
                "JWT_SECRET must be at least 32 characters".to_string(),
            ));
        }

        if self.refresh_token_secret.len() < 32 {
            return Err(AuthError::Config(
                "JWT_REFRESH_SECRET must be at least 32 characters".to_string(),
            ));
        }

        if self.access_token_secret == self.refresh_token_secret {
            return Err(AuthError::Config(
                "JWT_SECRET and JWT_REFRESH_SECRET must differ".to_string(),
            ));
        }

        if self.access_token_expiration <= 0 {
            return Err(AuthError::Config(
                "JWT_ACCESS_EXPIRATION must be positive".to_string(),
            ));
        }

        if self.refresh_token_expiration <= self.access_token_expiration {
            return Err(AuthError::Config(
                "JWT_REFRESH_EXPIRATION must be greater than JWT_ACCESS_EXPIRATION".to_string(),
            ));
        }

        argon2::Params::new(
            self.argon2_memory_cost,
            self.argon2_time_cost,
            self.argon2_parallelism,
            None,
        )
        .map_err(|e| AuthError::Config(format!("Invalid Argon2 parameters: {e}")))?;

        Ok(())
    }
}

/// HTTP server and database settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// PostgreSQL connection string (from DATABASE_URL env var)
    pub database_url: String,

    /// Listen port (from PORT env var)
    pub port: u16,

    /// Pool size (from DATABASE_MAX_CONNECTIONS env var)
    pub max_connections: u32,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, AuthError> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            port: parsed_or("PORT", 5000),
            max_connections: parsed_or("DATABASE_MAX_CONNECTIONS", 5),
        })
    }
}

/// Log which variables are present without revealing their values
pub fn log_environment_status() {
    for name in [
        "APP_ENV",
        "NODE_ENV",
        "DATABASE_URL",
        "JWT_SECRET",
        "JWT_REFRESH_SECRET",
        "PORT",
    ] {
        let status = if env::var(name).is_ok() { "set" } else { "not set" };
        tracing::info!(variable = name, status, "Environment check");
    }
}

fn required(name: &str) -> Result<String, AuthError> {
    env::var(name)
        .map_err(|_| AuthError::Config(format!("{name} environment variable must be set")))
}

fn parsed_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
