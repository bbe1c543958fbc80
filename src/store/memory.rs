//! In-memory `UserStore` used for local runs and tests.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tokio::task;
use uuid::Uuid;

use super::{User, UserRecord, UserStore};

/// bcrypt work factor for new accounts. 2^12 rounds, above the floor of 10
/// required for stored credentials.
const BCRYPT_COST: u32 = 12;

pub struct MemoryUserStore {
    users: RwLock<HashMap<String, UserRecord>>,
    bcrypt_cost: u32,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            bcrypt_cost: BCRYPT_COST,
        }
    }

    /// Lower the work factor for tests; production callers use `new`.
    #[must_use]
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }
}

impl Default for MemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, email: &str, password: &str, name: &str) -> Result<Option<User>> {
        // Hash off the async runtime; bcrypt is deliberately slow.
        let cost = self.bcrypt_cost;
        let password = password.to_string();
        let password_hash = task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .context("password hashing task failed")?
            .context("failed to hash password")?;

        // Check-then-insert under a single write lock so two concurrent
        // registrations for the same email cannot both succeed.
        let mut users = self.users.write().await;
        if users.contains_key(email) {
            return Ok(None);
        }

        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: name.to_string(),
        };
        users.insert(
            email.to_string(),
            UserRecord {
                user: user.clone(),
                password_hash,
                created_at: Utc::now(),
            },
        );

        Ok(Some(user))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let users = self.users.read().await;
        Ok(users.get(email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|record| record.user.id == id)
            .map(|record| record.user.clone()))
    }

    async fn verify(&self, email: &str, password: &str) -> Result<Option<User>> {
        let Some(record) = self.find_by_email(email).await? else {
            return Ok(None);
        };

        let password = password.to_string();
        let password_hash = record.password_hash.clone();
        let matches = task::spawn_blocking(move || bcrypt::verify(password, &password_hash))
            .await
            .context("password verification task failed")?
            .context("failed to verify password")?;

        Ok(matches.then_some(record.user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> MemoryUserStore {
        // Minimum bcrypt cost keeps the tests fast.
        MemoryUserStore::new().with_bcrypt_cost(4)
    }

    #[tokio::test]
    async fn create_and_verify_round_trip() -> Result<()> {
        let store = test_store();
        let created = store
            .create("ann@example.com", "secret1", "Ann")
            .await?
            .context("expected user")?;
        assert_eq!(created.email, "ann@example.com");
        assert_eq!(created.name, "Ann");

        let verified = store.verify("ann@example.com", "secret1").await?;
        assert_eq!(verified, Some(created));
        Ok(())
    }

    #[tokio::test]
    async fn create_rejects_duplicate_email() -> Result<()> {
        let store = test_store();
        assert!(store.create("ann@example.com", "secret1", "Ann").await?.is_some());
        assert!(store.create("ann@example.com", "other", "Imposter").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_creates_yield_exactly_one_user() -> Result<()> {
        let store = test_store();
        let (first, second) = tokio::join!(
            store.create("race@example.com", "secret1", "First"),
            store.create("race@example.com", "secret2", "Second"),
        );
        let outcomes = [first?, second?];
        assert_eq!(outcomes.iter().filter(|user| user.is_some()).count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn verify_is_uniform_for_unknown_email_and_wrong_password() -> Result<()> {
        let store = test_store();
        store.create("ann@example.com", "secret1", "Ann").await?;

        assert!(store.verify("ann@example.com", "wrong").await?.is_none());
        assert!(store.verify("ghost@example.com", "secret1").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn stored_hash_is_not_the_plaintext() -> Result<()> {
        let store = test_store();
        store.create("ann@example.com", "secret1", "Ann").await?;

        let record = store
            .find_by_email("ann@example.com")
            .await?
            .context("expected record")?;
        assert_ne!(record.password_hash, "secret1");
        assert!(record.password_hash.starts_with("$2"));
        Ok(())
    }

    #[tokio::test]
    async fn find_by_id_redacts_password() -> Result<()> {
        let store = test_store();
        let created = store
            .create("ann@example.com", "secret1", "Ann")
            .await?
            .context("expected user")?;

        let found = store.find_by_id(created.id).await?;
        assert_eq!(found, Some(created));
        assert!(store.find_by_id(Uuid::new_v4()).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn emails_are_case_sensitive() -> Result<()> {
        let store = test_store();
        store.create("ann@example.com", "secret1", "Ann").await?;
        assert!(store.verify("Ann@Example.com", "secret1").await?.is_none());
        Ok(())
    }
}
