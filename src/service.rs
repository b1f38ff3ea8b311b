//! Authentication Service
//!
//! Core account logic: password hashing, registration, login, token
//! refresh and current-user lookup. Cookie and body delivery is left to the
//! HTTP handlers.

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::models::*;
use crate::session::CookiePolicy;
use crate::store::UserStore;
use crate::token::{TokenKind, TokenPair, TokenService};

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params,
};
use std::sync::Arc;
use uuid::Uuid;

/// Authentication service
pub struct AuthService {
    store: Arc<dyn UserStore>,
    config: AuthConfig,
    tokens: TokenService,
    cookies: CookiePolicy,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(store: Arc<dyn UserStore>, config: AuthConfig) -> Self {
        let tokens = TokenService::new(&config);
        let cookies = CookiePolicy::from_config(&config);

        Self {
            store,
            config,
            tokens,
            cookies,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn cookie_policy(&self) -> &CookiePolicy {
        &self.cookies
    }

    // ============================================
    // Password Hashing
    // ============================================

    fn argon2(&self) -> Result<Argon2<'static>, AuthError> {
        let params = Params::new(
            self.config.argon2_memory_cost,
            self.config.argon2_time_cost,
            self.config.argon2_parallelism,
            None,
        )
        .map_err(|_| AuthError::Internal)?;

        Ok(Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params))
    }

    /// Hash a password using Argon2id with a random salt.
    ///
    /// Runs on the blocking pool so request workers are not stalled.
    pub async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let argon2 = self.argon2()?;
        let password = password.to_owned();

        tokio::task::spawn_blocking(move || -> Result<String, AuthError> {
            let salt = SaltString::generate(&mut OsRng);
            Ok(argon2.hash_password(password.as_bytes(), &salt)?.to_string())
        })
        .await
        .map_err(|e| {
            tracing::error!("Password hashing task failed: {}", e);
            AuthError::Internal
        })?
    }

    /// Verify a password against a stored hash
    pub async fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let argon2 = self.argon2()?;
        let password = password.to_owned();
        let hash = hash.to_owned();

        tokio::task::spawn_blocking(move || -> Result<bool, AuthError> {
            let parsed_hash = PasswordHash::new(&hash).map_err(|_| AuthError::Internal)?;
            Ok(argon2
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok())
        })
        .await
        .map_err(|e| {
            tracing::error!("Password verification task failed: {}", e);
            AuthError::Internal
        })?
    }

    // ============================================
    // Account Operations
    // ============================================

    /// Register a new user and issue their first token pair
    pub async fn register(&self, req: RegisterRequest) -> Result<(User, TokenPair), AuthError> {
        if self.store.find_by_email(&req.email).await?.is_some() {
            return Err(AuthError::Conflict);
        }

        let password_hash = self.hash_password(&req.password).await?;

        let user = self
            .store
            .create(NewUser {
                first_name: req.first_name,
                last_name: req.last_name,
                email: req.email,
                password_hash,
            })
            .await?;

        let tokens = self.tokens.issue_pair(user.id)?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok((user, tokens))
    }

    /// Check credentials and issue a fresh token pair.
    ///
    /// An unknown email and a wrong password fail identically.
    pub async fn login(&self, req: LoginRequest) -> Result<(User, TokenPair), AuthError> {
        let user = self
            .store
            .find_by_email(&req.email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.verify_password(&req.password, &user.password_hash).await? {
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.tokens.issue_pair(user.id)?;
        Ok((user, tokens))
    }

    /// Exchange a refresh token for a new pair.
    ///
    /// The presented refresh token is not invalidated and stays usable until
    /// its own expiry.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let user_id = self
            .tokens
            .verify(refresh_token, TokenKind::Refresh)
            .map_err(|e| {
                tracing::debug!("Refresh token rejected: {}", e);
                AuthError::InvalidRefreshToken
            })?;

        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let tokens = self.tokens.issue_pair(user.id)?;

        tracing::info!(user_id = %user.id, "Tokens refreshed");
        Ok(tokens)
    }

    /// Verify an access token and load its user, without the password hash
    pub async fn authenticate(&self, access_token: &str) -> Result<UserProfile, AuthError> {
        let user_id = self.tokens.verify(access_token, TokenKind::Access)?;
        self.current_user(user_id).await
    }

    /// Load a user by id, without the password hash
    pub async fn current_user(&self, user_id: Uuid) -> Result<UserProfile, AuthError> {
        self.store
            .find_by_id(user_id)
            .await?
            .map(UserProfile::from)
            .ok_or(AuthError::UserNotFound)
    }
}
