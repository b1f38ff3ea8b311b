//! Token Service
//!
//! Stateless signing and verification of access and refresh tokens.
//! Each kind has its own secret, so a token of one kind never verifies as
//! the other. Nothing is persisted: a token stays valid until it expires.

use crate::config::AuthConfig;
use crate::models::TokenClaims;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

/// Which class of token is being issued or verified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Verification failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,

    #[error("token malformed or signature mismatch")]
    Malformed,

    #[error("token signing failed: {0}")]
    Signing(String),
}

/// A freshly issued access/refresh pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime: Duration,
}

impl KeyPair {
    fn new(secret: &str, lifetime_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime: Duration::seconds(lifetime_secs),
        }
    }
}

/// Signs and verifies JWTs with one key per token kind
pub struct TokenService {
    access: KeyPair,
    refresh: KeyPair,
    validation: Validation,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        // Expiry is checked against the caller's clock in `verify_at`, with no leeway.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();

        Self {
            access: KeyPair::new(&config.access_token_secret, config.access_token_expiration),
            refresh: KeyPair::new(&config.refresh_token_secret, config.refresh_token_expiration),
            validation,
        }
    }

    fn keys(&self, kind: TokenKind) -> &KeyPair {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    /// Lifetime of a token kind
    pub fn lifetime(&self, kind: TokenKind) -> Duration {
        self.keys(kind).lifetime
    }

    pub fn issue_pair(&self, user_id: Uuid) -> Result<TokenPair, TokenError> {
        self.issue_pair_at(user_id, Utc::now())
    }

    /// Issue both tokens as if the current time were `now`
    pub fn issue_pair_at(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.sign(TokenKind::Access, user_id, now)?,
            refresh_token: self.sign(TokenKind::Refresh, user_id, now)?,
        })
    }

    fn sign(
        &self,
        kind: TokenKind,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let keys = self.keys(kind);
        let claims = TokenClaims {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + keys.lifetime).timestamp(),
            jti: Uuid::new_v4(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<Uuid, TokenError> {
        self.verify_at(token, kind, Utc::now())
    }

    /// Verify a token against the clock value `now`, returning its subject
    pub fn verify_at(
        &self,
        token: &str,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<Uuid, TokenError> {
        let data = decode::<TokenClaims>(token, &self.keys(kind).decoding, &self.validation)
            .map_err(|e| {
                tracing::debug!(?kind, "JWT validation failed: {:?}", e);
                TokenError::Malformed
            })?;

        // `exp` is the first second at which the token is no longer accepted
        if now.timestamp() >= data.claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(data.claims.sub)
    }
}
