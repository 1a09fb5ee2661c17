//! Application state shared across commands.

use std::sync::Arc;

use crate::auth::{AuthProvider, IdentityToolkitAuth, MemoryAuth};
use crate::cart::{CartRepository, CartStore, CartSync, CartSyncHandle};
use crate::catalog::{CatalogClient, CatalogError};
use crate::config::StorefrontConfig;
use crate::documents::{DocumentError, DocumentStore, FirestoreClient, MemoryDocumentStore};
use crate::services::{
    AccountService, CatalogService, CheckoutService, OrderService, ProductService,
};
use crate::storage::{FileSessionStorage, SessionStorage};

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("catalog client: {0}")]
    Catalog(#[from] CatalogError),
    #[error("document store: {0}")]
    Documents(#[from] DocumentError),
}

/// Application state shared across all commands.
///
/// This struct is cheaply cloneable via `Arc` and is the only place backends
/// are chosen; services are built from it on demand.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: CatalogService,
    documents: Arc<dyn DocumentStore>,
    auth: Arc<dyn AuthProvider>,
    cart: CartStore,
}

impl AppState {
    /// Create application state from configuration.
    ///
    /// With Firebase configured this talks to Firestore and Identity Toolkit;
    /// otherwise it runs on in-memory backends. The cart is restored from the
    /// session directory either way.
    ///
    /// # Errors
    ///
    /// Returns an error if a client cannot be constructed.
    pub fn new(config: StorefrontConfig) -> Result<Self, StateError> {
        let (documents, auth): (Arc<dyn DocumentStore>, Arc<dyn AuthProvider>) =
            match &config.firebase {
                Some(firebase) => {
                    let auth = IdentityToolkitAuth::new(firebase);
                    let documents = FirestoreClient::new(firebase)?.with_session(auth.subscribe());
                    (Arc::new(documents), Arc::new(auth))
                }
                None => {
                    tracing::info!("Firebase not configured, using in-memory backends");
                    (
                        Arc::new(MemoryDocumentStore::new()),
                        Arc::new(MemoryAuth::new()),
                    )
                }
            };
        let storage = Arc::new(FileSessionStorage::new(config.session_dir.clone()));
        Self::with_backends(config, documents, auth, storage)
    }

    /// Create application state over explicit backends.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog client cannot be constructed.
    pub fn with_backends(
        config: StorefrontConfig,
        documents: Arc<dyn DocumentStore>,
        auth: Arc<dyn AuthProvider>,
        storage: Arc<dyn SessionStorage>,
    ) -> Result<Self, StateError> {
        let client = CatalogClient::new(&config.catalog)?;
        let catalog = CatalogService::new(
            client,
            ProductService::new(Arc::clone(&documents)),
            config.catalog.cache_ttl,
        );
        let cart = CartStore::load(storage);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                documents,
                auth,
                cart,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the catalog service.
    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    /// Get a reference to the document store.
    #[must_use]
    pub fn documents(&self) -> &Arc<dyn DocumentStore> {
        &self.inner.documents
    }

    /// Get a reference to the auth provider.
    #[must_use]
    pub fn auth(&self) -> &Arc<dyn AuthProvider> {
        &self.inner.auth
    }

    /// Get a reference to the cart store.
    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    #[must_use]
    pub fn accounts(&self) -> AccountService {
        AccountService::new(Arc::clone(&self.inner.documents), Arc::clone(&self.inner.auth))
    }

    #[must_use]
    pub fn orders(&self) -> OrderService {
        OrderService::new(Arc::clone(&self.inner.documents))
    }

    #[must_use]
    pub fn products(&self) -> ProductService {
        ProductService::new(Arc::clone(&self.inner.documents))
    }

    #[must_use]
    pub fn checkout(&self) -> CheckoutService {
        CheckoutService::new(
            Arc::clone(&self.inner.documents),
            Arc::clone(&self.inner.auth),
            self.inner.cart.clone(),
        )
    }

    /// Start syncing the cart with the signed-in user's saved cart.
    #[must_use]
    pub fn start_cart_sync(&self) -> CartSyncHandle {
        CartSync::new(
            self.inner.cart.clone(),
            CartRepository::new(Arc::clone(&self.inner.documents)),
        )
        .spawn(self.inner.auth.subscribe())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemorySessionStorage;

    #[test]
    fn test_offline_state_uses_memory_backends() {
        let tmp = tempfile::tempdir().unwrap();
        let state = AppState::new(StorefrontConfig::offline(tmp.path())).unwrap();
        assert!(state.auth().current_user().is_none());
        assert!(state.cart().snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_services_share_backends() {
        let documents = MemoryDocumentStore::new();
        let state = AppState::with_backends(
            StorefrontConfig::offline("/unused"),
            Arc::new(documents.clone()),
            Arc::new(MemoryAuth::new()),
            Arc::new(MemorySessionStorage::new()),
        )
        .unwrap();

        let draft = fakestore_core::ProductDraft {
            title: "Mug".to_string(),
            price: rust_decimal::Decimal::new(500, 2),
            category: "home".to_string(),
            description: String::new(),
            image: String::new(),
        };
        state.products().add(&draft).await.unwrap();
        assert_eq!(documents.write_count(), 1);
        assert_eq!(state.catalog().products().await.len(), 1);
    }
}
