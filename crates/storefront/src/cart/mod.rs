//! Observable cart store.
//!
//! [`CartStore`] owns the [`CartState`] reducer behind a `watch` channel.
//! Every dispatched action notifies subscribers when the cart changed and then
//! writes the full snapshot to session storage under [`CART_STORAGE_KEY`].
//! Storage failures are logged and never surface to the caller.

mod repository;
mod sync;

pub use repository::CartRepository;
pub use sync::{CartSync, CartSyncHandle, SAVE_DEBOUNCE};

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use fakestore_core::{CartLine, CartState, Product, ProductId};

use crate::error::add_breadcrumb;
use crate::storage::SessionStorage;

/// Session storage key holding the serialized cart.
pub const CART_STORAGE_KEY: &str = "cart";

/// Shared cart store.
///
/// Cheap to clone; clones share the same cart.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    state: watch::Sender<CartState>,
    storage: Arc<dyn SessionStorage>,
}

impl CartStore {
    /// Restore the cart from session storage.
    ///
    /// A missing, unreadable or malformed snapshot yields an empty cart.
    #[must_use]
    pub fn load(storage: Arc<dyn SessionStorage>) -> Self {
        let initial = match storage.get(CART_STORAGE_KEY) {
            Ok(Some(raw)) => serde_json::from_str::<CartState>(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "Discarding malformed cart snapshot");
                CartState::new()
            }),
            Ok(None) => CartState::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read cart snapshot");
                CartState::new()
            }
        };
        debug!(lines = initial.items.len(), "Cart restored");

        let (state, _rx) = watch::channel(initial);
        Self {
            inner: Arc::new(CartStoreInner { state, storage }),
        }
    }

    /// Current cart contents.
    #[must_use]
    pub fn snapshot(&self) -> CartState {
        self.inner.state.borrow().clone()
    }

    /// Observe cart changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.inner.state.subscribe()
    }

    /// Add one unit of `product`.
    pub fn add(&self, product: &Product) {
        add_breadcrumb(
            "cart",
            "Added product",
            Some(&[("product_id", product.id.to_string().as_str())]),
        );
        self.dispatch(|cart| cart.add(product));
    }

    /// Remove the line for `id`.
    pub fn remove(&self, id: ProductId) {
        add_breadcrumb(
            "cart",
            "Removed product",
            Some(&[("product_id", id.to_string().as_str())]),
        );
        self.dispatch(|cart| cart.remove(id));
    }

    /// Set the quantity for `id`; zero or less removes the line.
    pub fn set_quantity(&self, id: ProductId, quantity: i64) {
        self.dispatch(|cart| cart.set_quantity(id, quantity));
    }

    /// Empty the cart.
    pub fn clear(&self) {
        add_breadcrumb("cart", "Cleared cart", None);
        self.dispatch(CartState::clear);
    }

    /// Overwrite the cart wholesale (hydration).
    pub fn replace_all(&self, lines: Vec<CartLine>) {
        self.dispatch(|cart| cart.replace_all(lines));
    }

    /// Remove the persisted snapshot without touching the in-memory cart.
    pub fn discard_persisted(&self) {
        if let Err(e) = self.inner.storage.remove(CART_STORAGE_KEY) {
            warn!(error = %e, "Failed to remove cart snapshot");
        }
    }

    fn dispatch(&self, action: impl FnOnce(&mut CartState) -> bool) {
        self.inner.state.send_if_modified(action);
        self.persist();
    }

    fn persist(&self) {
        let snapshot = self.snapshot();
        let result = serde_json::to_string(&snapshot)
            .map_err(|e| e.to_string())
            .and_then(|json| {
                self.inner
                    .storage
                    .set(CART_STORAGE_KEY, &json)
                    .map_err(|e| e.to_string())
            });
        if let Err(error) = result {
            warn!(%error, "Failed to persist cart snapshot");
        }
    }
}
