//! Background bridge between the local cart and `carts/{uid}`.
//!
//! One task per store selects over sign-in changes and cart changes:
//!
//! - sign-in (or a different user): load the saved cart and, when it has
//!   lines, replace the local cart with it
//! - cart change while signed in: save after [`SAVE_DEBOUNCE`] of quiet; a
//!   newer change aborts the pending save and starts a new one
//!
//! Remote failures are logged and swallowed; the local cart always wins.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use fakestore_core::{CartLine, UserId};

use super::{CartRepository, CartStore};
use crate::auth::AuthUser;

/// Quiet period before a cart change is written remotely.
pub const SAVE_DEBOUNCE: Duration = Duration::from_secs(1);

/// Configures and starts the sync task.
pub struct CartSync {
    store: CartStore,
    repository: CartRepository,
    debounce: Duration,
}

/// Handle to a running sync task.
///
/// Dropping the handle stops the task after flushing a pending save.
pub struct CartSyncHandle {
    stop: watch::Sender<bool>,
    ready: watch::Receiver<bool>,
    task: JoinHandle<()>,
}

impl CartSyncHandle {
    /// Wait until the sign-in state at spawn time has been handled,
    /// including hydration of a saved cart.
    pub async fn ready(&self) {
        let mut ready = self.ready.clone();
        // An exited task has nothing left to wait for.
        let _ = ready.wait_for(|done| *done).await;
    }

    /// Stop the task, writing any pending save immediately.
    pub async fn shutdown(self) {
        self.stop.send_replace(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "Cart sync task ended abnormally");
        }
    }

    /// Whether the task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// A scheduled save; aborted when dropped.
struct PendingWrite {
    uid: UserId,
    items: Vec<CartLine>,
    handle: JoinHandle<()>,
}

impl Drop for PendingWrite {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl CartSync {
    /// Sync `store` with the saved carts in `repository`.
    #[must_use]
    pub const fn new(store: CartStore, repository: CartRepository) -> Self {
        Self {
            store,
            repository,
            debounce: SAVE_DEBOUNCE,
        }
    }

    /// Override the quiet period.
    #[must_use]
    pub const fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Start the task, following sign-in state from `auth`.
    #[must_use]
    pub fn spawn(self, auth: watch::Receiver<Option<AuthUser>>) -> CartSyncHandle {
        let (stop, stop_rx) = watch::channel(false);
        let (ready_tx, ready) = watch::channel(false);
        let cart = self.store.subscribe();
        let task = tokio::spawn(self.run(auth, cart, stop_rx, ready_tx));
        CartSyncHandle { stop, ready, task }
    }

    async fn run(
        self,
        mut auth: watch::Receiver<Option<AuthUser>>,
        mut cart: watch::Receiver<fakestore_core::CartState>,
        mut stop: watch::Receiver<bool>,
        ready: watch::Sender<bool>,
    ) {
        let mut current: Option<UserId> = None;
        let mut pending: Option<PendingWrite> = None;

        let initial = auth.borrow_and_update().as_ref().map(|u| u.uid.clone());
        self.user_changed(initial, &mut current, &mut pending).await;
        cart.mark_unchanged();
        ready.send_replace(true);

        loop {
            // Pending auth and cart changes are handled before a stop request.
            tokio::select! {
                biased;
                changed = auth.changed() => {
                    if changed.is_err() {
                        debug!("Auth provider dropped, stopping cart sync");
                        break;
                    }
                    let next = auth.borrow_and_update().as_ref().map(|u| u.uid.clone());
                    // A repeated sign-in as the same user leaves cart edits pending.
                    if self.user_changed(next, &mut current, &mut pending).await {
                        cart.mark_unchanged();
                    }
                }
                changed = cart.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let items = cart.borrow_and_update().items.clone();
                    if let Some(uid) = &current {
                        pending = Some(self.schedule_save(uid.clone(), items));
                    }
                }
                _ = stop.changed() => {
                    self.flush(pending.take()).await;
                    break;
                }
            }
        }
    }

    /// React to a sign-in state change; returns whether the user changed.
    async fn user_changed(
        &self,
        next: Option<UserId>,
        current: &mut Option<UserId>,
        pending: &mut Option<PendingWrite>,
    ) -> bool {
        if next == *current {
            return false;
        }
        // A save captured for the previous user must not land.
        *pending = None;
        current.clone_from(&next);

        let Some(uid) = next else {
            debug!("Signed out, cart sync idle");
            return true;
        };

        self.hydrate(&uid).await;
        let items = self.store.snapshot().items;
        *pending = Some(self.schedule_save(uid, items));
        true
    }

    #[instrument(skip(self), fields(uid = %uid))]
    async fn hydrate(&self, uid: &UserId) {
        match self.repository.load(uid).await {
            Ok(items) if !items.is_empty() => {
                info!(lines = items.len(), "Restored saved cart");
                self.store.replace_all(items);
            }
            Ok(_) => debug!("No saved cart"),
            Err(e) => warn!(error = %e, "Failed to load saved cart, keeping local cart"),
        }
    }

    fn schedule_save(&self, uid: UserId, items: Vec<CartLine>) -> PendingWrite {
        let repository = self.repository.clone();
        let debounce = self.debounce;
        let task_uid = uid.clone();
        let task_items = items.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            save(&repository, &task_uid, &task_items).await;
        });

        PendingWrite { uid, items, handle }
    }

    async fn flush(&self, pending: Option<PendingWrite>) {
        let Some(write) = pending else {
            return;
        };
        if write.handle.is_finished() {
            return;
        }
        write.handle.abort();
        save(&self.repository, &write.uid, &write.items).await;
    }
}

async fn save(repository: &CartRepository, uid: &UserId, items: &[CartLine]) {
    if items.is_empty() {
        debug!(uid = %uid, "Cart empty, skipping save");
        return;
    }
    match repository.save(uid, items).await {
        Ok(()) => debug!(uid = %uid, lines = items.len(), "Cart saved"),
        Err(e) => warn!(uid = %uid, error = %e, "Failed to save cart"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use super::*;
    use crate::documents::MemoryDocumentStore;
    use crate::storage::MemorySessionStorage;
    use fakestore_core::{Email, Product, ProductId, Rating};

    struct Harness {
        documents: MemoryDocumentStore,
        store: CartStore,
        auth: watch::Sender<Option<AuthUser>>,
        handle: CartSyncHandle,
    }

    fn harness() -> Harness {
        let documents = MemoryDocumentStore::new();
        let store = CartStore::load(Arc::new(MemorySessionStorage::new()));
        let (auth, auth_rx) = watch::channel(None);
        let handle = CartSync::new(store.clone(), CartRepository::new(Arc::new(documents.clone())))
            .spawn(auth_rx);
        Harness {
            documents,
            store,
            auth,
            handle,
        }
    }

    fn user(uid: &str) -> AuthUser {
        AuthUser {
            uid: UserId::new(uid),
            email: Email::parse("ada@example.com").unwrap(),
            id_token: None,
        }
    }

    fn product(id: i32) -> Product {
        Product {
            id: ProductId::new(id),
            title: format!("Product {id}"),
            price: Decimal::new(2999, 2),
            category: "electronics".to_string(),
            description: String::new(),
            image_ref: String::new(),
            rating: Rating::default(),
            external_store_id: None,
        }
    }

    fn line(id: i32, quantity: u32) -> CartLine {
        CartLine {
            quantity,
            ..CartLine::from(&product(id))
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_sign_in_hydrates_from_saved_cart() {
        let h = harness();
        let repo = CartRepository::new(Arc::new(h.documents.clone()));
        repo.save(&UserId::new("uid-1"), &[line(1, 2), line(2, 1)])
            .await
            .unwrap();

        h.auth.send_replace(Some(user("uid-1")));
        settle().await;

        assert_eq!(h.store.snapshot().items, vec![line(1, 2), line(2, 1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_waits_for_initial_hydration() {
        let documents = MemoryDocumentStore::new();
        let repo = CartRepository::new(Arc::new(documents.clone()));
        repo.save(&UserId::new("uid-1"), &[line(4, 3)]).await.unwrap();

        let store = CartStore::load(Arc::new(MemorySessionStorage::new()));
        let (_auth, auth_rx) = watch::channel(Some(user("uid-1")));
        let handle = CartSync::new(store.clone(), repo).spawn(auth_rx);

        handle.ready().await;
        assert_eq!(store.snapshot().items, vec![line(4, 3)]);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_saved_cart_keeps_local_lines() {
        let h = harness();
        h.store.add(&product(5));

        h.auth.send_replace(Some(user("uid-1")));
        settle().await;

        assert_eq!(h.store.snapshot().items, vec![line(5, 1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_changes_are_debounced_into_one_write() {
        let h = harness();
        h.auth.send_replace(Some(user("uid-1")));
        settle().await;
        let baseline = h.documents.write_count();

        h.store.add(&product(1));
        tokio::time::sleep(Duration::from_millis(500)).await;
        h.store.add(&product(2));

        tokio::time::sleep(Duration::from_millis(900)).await;
        assert_eq!(h.documents.write_count(), baseline);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(h.documents.write_count(), baseline + 1);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(h.documents.write_count(), baseline + 1);

        let repo = CartRepository::new(Arc::new(h.documents.clone()));
        let saved = repo.load(&UserId::new("uid-1")).await.unwrap();
        assert_eq!(saved, vec![line(1, 1), line(2, 1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_signed_out_changes_are_not_written() {
        let h = harness();
        h.store.add(&product(1));
        h.store.add(&product(2));
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(h.documents.write_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_cart_is_not_written() {
        let h = harness();
        h.auth.send_replace(Some(user("uid-1")));
        settle().await;

        h.store.add(&product(1));
        h.store.remove(ProductId::new(1));
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(h.documents.write_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sign_out_cancels_pending_write() {
        let h = harness();
        h.auth.send_replace(Some(user("uid-1")));
        settle().await;

        h.store.add(&product(1));
        settle().await;
        h.auth.send_replace(None);
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(h.documents.write_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_user_republished_keeps_pending_change() {
        let h = harness();
        h.auth.send_replace(Some(user("uid-1")));
        settle().await;

        h.store.add(&product(1));
        h.auth.send_replace(Some(user("uid-1")));
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(h.documents.write_count(), 1);

        let repo = CartRepository::new(Arc::new(h.documents.clone()));
        let saved = repo.load(&UserId::new("uid-1")).await.unwrap();
        assert_eq!(saved, vec![line(1, 1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_flushes_pending_write() {
        let h = harness();
        h.auth.send_replace(Some(user("uid-1")));
        settle().await;

        h.store.add(&product(3));
        settle().await;
        h.handle.shutdown().await;
        assert_eq!(h.documents.write_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_hydration_keeps_local_cart() {
        let h = harness();
        h.store.add(&product(9));
        h.documents.set_available(false);

        h.auth.send_replace(Some(user("uid-1")));
        settle().await;

        assert_eq!(h.store.snapshot().items, vec![line(9, 1)]);
        assert!(!h.handle.is_finished());
    }
}
