/// Tenant Auth Service Library
///
/// Core engine for a multi-tenant credential and session-issuance service:
/// account registration, password authentication, lockout enforcement and
/// bearer-token issuance, each scoped to an isolated per-tenant credential
/// store.
///
/// Transport, rate limiting and tenant resolution live upstream. Callers
/// hand every operation an already-resolved tenant id and serialize the
/// typed results themselves; this crate never binds a socket.
///
/// # Modules
/// - `auth`: password hashing and the `AuthService` orchestration
/// - `db`: account model, store traits and the in-memory backend
/// - `tenant`: per-tenant store registry
/// - `token`: session-token issuance and verification
/// - `config`: startup configuration
/// - `error`: the service error taxonomy
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use tenant_auth_service::auth::password::PasswordHasher;
/// use tenant_auth_service::auth::service::AuthService;
/// use tenant_auth_service::config::Settings;
/// use tenant_auth_service::db::memory::InMemoryBackend;
/// use tenant_auth_service::tenant::TenantRegistry;
/// use tenant_auth_service::token::TokenIssuer;
///
/// async fn setup() -> anyhow::Result<()> {
///     let settings = Settings::new()?;
///     let hasher = PasswordHasher::new();
///     let backend = Arc::new(InMemoryBackend::new(hasher.clone()));
///     let service = AuthService::new(
///         TenantRegistry::new(backend),
///         hasher,
///         TokenIssuer::new(&settings.auth),
///     );
///
///     let _token = service
///         .register("acme", "user@example.com", "correcthorsebattery")
///         .await?;
///     Ok(())
/// }
/// ```

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod tenant;
pub mod token;
