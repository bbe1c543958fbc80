//! Credential store: user identities and salted password hashes.
//!
//! The store is a capability interface so the auth endpoints stay
//! storage-agnostic; the in-memory implementation stands in for a durable
//! backend behind the same trait.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

mod memory;

pub use memory::MemoryUserStore;

/// Public user identity, safe to return to clients.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

/// Server-only record; the password hash never leaves the store module
/// except through `find_by_email`.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user: User,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create a new user. Returns `Ok(None)` when the email is already
    /// registered; the plaintext password is hashed before storage and is
    /// never persisted.
    async fn create(&self, email: &str, password: &str, name: &str) -> Result<Option<User>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>>;

    /// Look up by id with the password redacted.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Verify credentials against the stored hash. The same `None` covers
    /// unknown email and wrong password so callers cannot tell them apart.
    async fn verify(&self, email: &str, password: &str) -> Result<Option<User>>;
}
