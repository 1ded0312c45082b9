//! Per-tenant store resolution.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::db::{CredentialStore, StoreBackend, StoreError};

/// Resolves tenant identifiers to their isolated credential stores.
///
/// Stores are created lazily on first access and cached for the process
/// lifetime. The cache lock is held across construction, so concurrent first
/// access to one tenant yields a single store: the winner constructs, the
/// others wait on the lock and reuse the cached handle. A failed open caches
/// nothing; the next resolve retries.
pub struct TenantRegistry {
    backend: Arc<dyn StoreBackend>,
    stores: Mutex<HashMap<String, Arc<dyn CredentialStore>>>,
}

impl TenantRegistry {
    pub fn new(backend: Arc<dyn StoreBackend>) -> Self {
        Self {
            backend,
            stores: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the store for `tenant_id`, opening and caching it on first use.
    ///
    /// # Errors
    /// * `StoreError::Unavailable` - the backend could not reach the tenant's storage
    pub async fn resolve(&self, tenant_id: &str) -> Result<Arc<dyn CredentialStore>, StoreError> {
        let mut stores = self.stores.lock().await;
        if let Some(store) = stores.get(tenant_id) {
            return Ok(Arc::clone(store));
        }

        debug!(%tenant_id, "first access, opening tenant store");
        let store = self.backend.open(tenant_id).await?;
        stores.insert(tenant_id.to_owned(), Arc::clone(&store));
        info!(%tenant_id, "tenant store ready");
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::PasswordHasher;
    use crate::db::memory::InMemoryBackend;
    use crate::db::MockStoreBackend;
    use tokio_test::assert_ok;
    use tracing_test::traced_test;

    fn registry() -> TenantRegistry {
        TenantRegistry::new(Arc::new(InMemoryBackend::new(PasswordHasher::new())))
    }

    #[tokio::test]
    async fn resolve_caches_one_store_per_tenant() {
        let registry = registry();

        let first = tokio_test::assert_ok!(registry.resolve("t1").await);
        let second = tokio_test::assert_ok!(registry.resolve("t1").await);
        let other = tokio_test::assert_ok!(registry.resolve("t2").await);

        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &other));
    }

    #[traced_test]
    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_first_access_yields_one_store() {
        let registry = Arc::new(registry());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move { registry.resolve("t1").await.unwrap() }));
        }

        let mut stores = Vec::new();
        for handle in handles {
            stores.push(handle.await.unwrap());
        }
        for store in &stores[1..] {
            assert!(Arc::ptr_eq(&stores[0], store));
        }
    }

    #[tokio::test]
    async fn tenant_stores_are_isolated() {
        let registry = registry();

        let t1 = registry.resolve("t1").await.unwrap();
        let t2 = registry.resolve("t2").await.unwrap();

        t1.create("user@example.com", "correcthorsebattery").await.unwrap();

        assert!(t1.find_by_email("user@example.com").await.unwrap().is_some());
        assert!(t2.find_by_email("user@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_open_is_not_cached() {
        let mut backend = MockStoreBackend::new();
        backend
            .expect_open()
            .times(2)
            .returning(|_| Err(StoreError::Unavailable("connection refused".to_string())));

        let registry = TenantRegistry::new(Arc::new(backend));

        assert!(matches!(
            registry.resolve("t1").await,
            Err(StoreError::Unavailable(_))
        ));
        // The failure was not cached; resolve hits the backend again.
        assert!(matches!(
            registry.resolve("t1").await,
            Err(StoreError::Unavailable(_))
        ));
    }
}
