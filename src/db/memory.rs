//! In-memory credential store.
//!
//! Accounts live in a `HashMap` keyed by normalized email behind a
//! `tokio::sync::RwLock`; the write lock makes the uniqueness check and the
//! insert a single atomic step, which is this backend's version of a
//! storage-level unique constraint. State is lost on process exit; durable
//! backends implement the same [`CredentialStore`] trait.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use super::{normalize_email, Account, CredentialStore, StoreBackend, StoreError};
use crate::auth::password::PasswordHasher;

/// Credential store holding one tenant's accounts in process memory.
pub struct InMemoryStore {
    hasher: PasswordHasher,
    accounts: Arc<RwLock<HashMap<String, Account>>>,
}

impl InMemoryStore {
    pub fn new(hasher: PasswordHasher) -> Self {
        Self {
            hasher,
            accounts: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl CredentialStore for InMemoryStore {
    async fn create(&self, email: &str, password: &str) -> Result<Account, StoreError> {
        let email = normalize_email(email);

        // Hash before taking the write lock; the derivation is the expensive
        // part and must not serialize unrelated creates.
        let hasher = self.hasher.clone();
        let password = password.to_owned();
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| StoreError::Unavailable(format!("hashing task failed: {}", e)))??;

        let now = Utc::now();
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&email) {
            return Err(StoreError::DuplicateEmail);
        }

        let account = Account {
            id: Uuid::new_v4(),
            email: email.clone(),
            password_hash,
            locked: false,
            created_at: now,
            updated_at: now,
        };
        accounts.insert(email, account.clone());

        info!(account_id = %account.id, "created account");
        Ok(account)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.get(&normalize_email(email)).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.values().find(|a| a.id == id).cloned())
    }

    async fn set_locked(&self, id: Uuid, locked: bool) -> Result<(), StoreError> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .values_mut()
            .find(|a| a.id == id)
            .ok_or(StoreError::NotFound)?;

        if account.locked != locked {
            account.locked = locked;
            account.updated_at = Utc::now();
            info!(account_id = %account.id, locked, "account lock state changed");
        }
        Ok(())
    }
}

/// Backend that opens a fresh [`InMemoryStore`] per tenant.
pub struct InMemoryBackend {
    hasher: PasswordHasher,
}

impl InMemoryBackend {
    pub fn new(hasher: PasswordHasher) -> Self {
        Self { hasher }
    }
}

#[async_trait]
impl StoreBackend for InMemoryBackend {
    async fn open(&self, tenant_id: &str) -> Result<Arc<dyn CredentialStore>, StoreError> {
        debug!(%tenant_id, "opening in-memory credential store");
        Ok(Arc::new(InMemoryStore::new(self.hasher.clone())))
    }
}
