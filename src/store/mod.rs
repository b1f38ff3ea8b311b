//! Credential Store
//!
//! The persistence boundary for user records. The auth core only needs four
//! lookups, expressed by [`UserStore`]. Email uniqueness is enforced here,
//! not by callers, so concurrent registrations for one email cannot both
//! succeed.

mod memory;
mod postgres;

pub use memory::MemoryUserStore;
pub use postgres::PgUserStore;

use crate::models::{NewUser, User};

use async_trait::async_trait;
use uuid::Uuid;

/// Store failures
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,

    #[error("user not found")]
    NotFound,

    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                StoreError::DuplicateEmail
            }
            other => StoreError::Database(other.to_string()),
        }
    }
}

/// User persistence operations used by the auth core
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Insert a new user. Fails with [`StoreError::DuplicateEmail`] if the
    /// email is taken.
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;

    /// Overwrite names, email and password hash of an existing user
    async fn update(&self, user: &User) -> Result<User, StoreError>;
}
