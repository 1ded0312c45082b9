//! Credential storage layer.
//!
//! Defines the per-tenant account model and the store traits the rest of the
//! engine is written against. A store owns the only copy of an account's
//! password hash; nothing above this layer ever serializes it.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::password::HashError;

pub mod memory;

/// One registered credential record within a tenant.
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    /// Assigned at creation, immutable.
    pub id: Uuid,
    /// Normalized (lowercased, trimmed); unique within the tenant's store.
    pub email: String,
    /// Salted one-way hash of the password. Never serialized.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Set through [`CredentialStore::set_locked`] only.
    pub locked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Canonical form of an email for uniqueness and lookup.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Error types for store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email is already registered")]
    DuplicateEmail,

    #[error("account not found")]
    NotFound,

    #[error("tenant storage unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Hash(#[from] HashError),
}

/// Per-tenant persistent table of accounts.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Normalizes the email, hashes the password and persists a new account
    /// with `locked = false`. The uniqueness check and the insert are atomic:
    /// of two concurrent creates for one email, exactly one succeeds.
    ///
    /// # Errors
    /// * `StoreError::DuplicateEmail` - the normalized email already exists
    /// * `StoreError::Hash` - the password failed the hasher's input check
    async fn create(&self, email: &str, password: &str) -> Result<Account, StoreError>;

    /// Looks up an account by email, normalizing before the comparison.
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError>;

    /// Idempotent lock-state mutation; `updated_at` is bumped only when the
    /// value actually changes.
    async fn set_locked(&self, id: Uuid, locked: bool) -> Result<(), StoreError>;
}

/// Opens the credential store backing a tenant.
///
/// One backend serves the whole process; the tenant registry caches what it
/// returns, so `open` runs at most once per tenant unless it fails.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StoreBackend: Send + Sync {
    async fn open(&self, tenant_id: &str) -> Result<Arc<dyn CredentialStore>, StoreError>;
}
