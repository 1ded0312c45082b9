//! Authentication orchestration.
//!
//! `AuthService` wires the tenant registry, the password hasher and the
//! token issuer into the register / authenticate / profile operations. Every
//! call arrives already rate-limited and tenant-resolved; the typed result
//! goes back to the caller for wire serialization.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::password::{PasswordHasher, MIN_PASSWORD_CHARS};
use crate::db::Account;
use crate::error::AuthError;
use crate::tenant::TenantRegistry;
use crate::token::TokenIssuer;

/// Account fields safe to return to callers. Never carries the hash.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub id: Uuid,
    pub email: String,
    pub locked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Account> for ProfileView {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            email: account.email,
            locked: account.locked,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

/// Orchestrates credential lifecycle and session issuance per tenant.
pub struct AuthService {
    registry: TenantRegistry,
    hasher: PasswordHasher,
    tokens: TokenIssuer,
}

impl AuthService {
    pub fn new(registry: TenantRegistry, hasher: PasswordHasher, tokens: TokenIssuer) -> Self {
        Self {
            registry,
            hasher,
            tokens,
        }
    }

    /// Registers a new account and returns a session token for it.
    ///
    /// # Errors
    /// * `AuthError::InvalidInput` - malformed email or password under 12 characters
    /// * `AuthError::DuplicateEmail` - the email is already registered in this tenant
    /// * `AuthError::TenantUnavailable` - the tenant's storage could not be reached
    pub async fn register(
        &self,
        tenant_id: &str,
        email: &str,
        password: &str,
    ) -> Result<String, AuthError> {
        validate_email(email)?;
        if password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(AuthError::InvalidInput(format!(
                "password must be at least {MIN_PASSWORD_CHARS} characters"
            )));
        }

        let store = self.registry.resolve(tenant_id).await?;
        let account = store.create(email, password).await?;
        info!(%tenant_id, account_id = %account.id, "registered account");

        let token = self.tokens.issue(&account.id.to_string())?;
        Ok(token)
    }

    /// Verifies credentials and returns a fresh session token.
    ///
    /// Unknown email and wrong password fail identically; only a locked
    /// account is reported as its own kind. Success has no side effects.
    pub async fn authenticate(
        &self,
        tenant_id: &str,
        email: &str,
        password: &str,
    ) -> Result<String, AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::InvalidInput(
                "email and password are required".to_string(),
            ));
        }

        let store = self.registry.resolve(tenant_id).await?;
        let Some(account) = store.find_by_email(email).await? else {
            debug!(%tenant_id, "authentication failed: unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if account.locked {
            warn!(%tenant_id, account_id = %account.id, "authentication rejected: account locked");
            return Err(AuthError::AccountLocked);
        }

        let hasher = self.hasher.clone();
        let candidate = password.to_owned();
        let stored = account.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || hasher.verify(&candidate, &stored))
            .await
            .map_err(|_| AuthError::Internal)?;

        if !matches {
            debug!(%tenant_id, account_id = %account.id, "authentication failed: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(&account.id.to_string())?;
        debug!(%tenant_id, account_id = %account.id, "issued session token");
        Ok(token)
    }

    /// Returns the profile for `account_id`, without the password hash.
    pub async fn profile(
        &self,
        tenant_id: &str,
        account_id: Uuid,
    ) -> Result<ProfileView, AuthError> {
        let store = self.registry.resolve(tenant_id).await?;
        let account = store
            .find_by_id(account_id)
            .await?
            .ok_or(AuthError::NotFound)?;
        Ok(ProfileView::from(account))
    }

    /// Verifies a bearer token and returns the profile it identifies.
    ///
    /// Expired and malformed tokens keep their distinct kinds so callers can
    /// answer one with a re-authentication prompt and the other with a plain
    /// rejection.
    pub async fn profile_for_token(
        &self,
        tenant_id: &str,
        token: &str,
    ) -> Result<ProfileView, AuthError> {
        let claims = self.tokens.verify(token)?;
        let account_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::MalformedToken)?;
        self.profile(tenant_id, account_id).await
    }
}

/// Minimal shape check: something@something.something, no whitespace.
fn validate_email(raw: &str) -> Result<(), AuthError> {
    let email = raw.trim();
    let well_formed = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if well_formed {
        Ok(())
    } else {
        Err(AuthError::InvalidInput(
            "a valid email address is required".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthSettings;
    use crate::db::memory::InMemoryBackend;
    use crate::db::{CredentialStore, MockStoreBackend, StoreError};
    use std::sync::Arc;

    fn settings(ttl_secs: u64) -> AuthSettings {
        AuthSettings {
            signing_secret: "service-test-signing-secret".to_string(),
            token_ttl_secs: ttl_secs,
        }
    }

    fn service() -> AuthService {
        service_with_ttl(3600)
    }

    fn service_with_ttl(ttl_secs: u64) -> AuthService {
        let hasher = PasswordHasher::new();
        let backend = Arc::new(InMemoryBackend::new(hasher.clone()));
        AuthService::new(
            TenantRegistry::new(backend),
            hasher,
            TokenIssuer::new(&settings(ttl_secs)),
        )
    }

    /// Service plus a pre-resolved handle to tenant `t1`'s store, for tests
    /// that need to reach behind the service (lockout, row inspection).
    async fn service_with_store() -> (AuthService, Arc<dyn CredentialStore>) {
        let hasher = PasswordHasher::new();
        let backend = Arc::new(InMemoryBackend::new(hasher.clone()));
        let registry = TenantRegistry::new(backend);
        let store = registry.resolve("t1").await.unwrap();
        let service = AuthService::new(registry, hasher, TokenIssuer::new(&settings(3600)));
        (service, store)
    }

    #[tokio::test]
    async fn register_then_authenticate_yields_same_account_id() {
        let service = service();
        let issuer = TokenIssuer::new(&settings(3600));

        let registered = service
            .register("t1", "A@Ex.com", "correcthorsebattery")
            .await
            .unwrap();
        // Email matching is case-insensitive.
        let authenticated = service
            .authenticate("t1", "a@ex.com", "correcthorsebattery")
            .await
            .unwrap();

        let first = issuer.verify(&registered).unwrap();
        let second = issuer.verify(&authenticated).unwrap();
        assert_eq!(first.sub, second.sub);
    }

    #[tokio::test]
    async fn short_password_is_invalid_input() {
        let service = service();
        let result = service.register("t1", "user@example.com", "elevenchars").await;

        assert!(matches!(result, Err(AuthError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn malformed_email_is_invalid_input() {
        let service = service();

        for email in ["", "not-an-email", "@example.com", "user@", "user@nodot", "a b@c.d"] {
            let result = service.register("t1", email, "correcthorsebattery").await;
            assert!(
                matches!(result, Err(AuthError::InvalidInput(_))),
                "expected rejection for {email:?}"
            );
        }
    }

    #[tokio::test]
    async fn duplicate_email_fails_within_tenant_but_not_across() {
        let service = service();

        service
            .register("t1", "user@example.com", "correcthorsebattery")
            .await
            .unwrap();

        let same_tenant = service
            .register("t1", "USER@example.com", "anotherlongpassword")
            .await;
        assert!(matches!(same_tenant, Err(AuthError::DuplicateEmail)));

        // The same email is free in a different tenant.
        service
            .register("t2", "user@example.com", "anotherlongpassword")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_are_indistinguishable() {
        let service = service();
        service
            .register("t1", "user@example.com", "correcthorsebattery")
            .await
            .unwrap();

        let wrong_password = service
            .authenticate("t1", "user@example.com", "wrongpassword!")
            .await
            .unwrap_err();
        let unknown_email = service
            .authenticate("t1", "ghost@example.com", "correcthorsebattery")
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_email, AuthError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn locked_account_is_rejected_despite_correct_credentials() {
        let (service, store) = service_with_store().await;

        let token = service
            .register("t1", "user@example.com", "correcthorsebattery")
            .await
            .unwrap();
        let profile = service.profile_for_token("t1", &token).await.unwrap();

        store.set_locked(profile.id, true).await.unwrap();

        let result = service
            .authenticate("t1", "user@example.com", "correcthorsebattery")
            .await;
        assert!(matches!(result, Err(AuthError::AccountLocked)));

        // An explicit unlock restores access.
        store.set_locked(profile.id, false).await.unwrap();
        service
            .authenticate("t1", "user@example.com", "correcthorsebattery")
            .await
            .unwrap();
    }

    #[test_log::test(tokio::test(flavor = "multi_thread"))]
    async fn concurrent_registration_admits_exactly_one() {
        let (service, store) = service_with_store().await;
        let service = Arc::new(service);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                service
                    .register("t1", "race@example.com", "correcthorsebattery")
                    .await
            }));
        }

        let mut tokens = 0;
        let mut duplicates = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => tokens += 1,
                Err(AuthError::DuplicateEmail) => duplicates += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(tokens, 1);
        assert_eq!(duplicates, 7);
        assert!(store.find_by_email("race@example.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn backend_failure_surfaces_as_tenant_unavailable() {
        let mut backend = MockStoreBackend::new();
        backend
            .expect_open()
            .returning(|_| Err(StoreError::Unavailable("connection refused".to_string())));

        let hasher = PasswordHasher::new();
        let service = AuthService::new(
            TenantRegistry::new(Arc::new(backend)),
            hasher,
            TokenIssuer::new(&settings(3600)),
        );

        let result = service
            .register("t1", "user@example.com", "correcthorsebattery")
            .await;
        assert!(matches!(result, Err(AuthError::TenantUnavailable)));
    }

    #[tokio::test]
    async fn profile_excludes_password_hash() {
        let service = service();
        let token = service
            .register("t1", "user@example.com", "correcthorsebattery")
            .await
            .unwrap();

        let profile = service.profile_for_token("t1", &token).await.unwrap();
        assert_eq!(profile.email, "user@example.com");
        assert!(!profile.locked);

        let json = serde_json::to_value(&profile).unwrap();
        let fields = json.as_object().unwrap();
        assert!(fields.contains_key("id"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("created_at"));
        assert!(!fields.contains_key("password_hash"));
        assert!(!json.to_string().contains("argon2"));
    }

    #[tokio::test]
    async fn profile_for_missing_account_is_not_found() {
        let service = service();

        let result = service.profile("t1", Uuid::new_v4()).await;
        assert!(matches!(result, Err(AuthError::NotFound)));
    }

    #[tokio::test]
    async fn expired_and_malformed_tokens_keep_their_kinds() {
        let expired_service = service_with_ttl(0);
        let token = expired_service
            .register("t1", "user@example.com", "correcthorsebattery")
            .await
            .unwrap();

        let expired = expired_service.profile_for_token("t1", &token).await;
        assert!(matches!(expired, Err(AuthError::ExpiredToken)));

        let malformed = expired_service
            .profile_for_token("t1", "not.a.token")
            .await;
        assert!(matches!(malformed, Err(AuthError::MalformedToken)));
    }

    #[tokio::test]
    async fn empty_credentials_are_invalid_input() {
        let service = service();

        let no_email = service.authenticate("t1", "  ", "correcthorsebattery").await;
        assert!(matches!(no_email, Err(AuthError::InvalidInput(_))));

        let no_password = service.authenticate("t1", "user@example.com", "").await;
        assert!(matches!(no_password, Err(AuthError::InvalidInput(_))));
    }
}
