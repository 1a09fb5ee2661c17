//! Cart persistence and hydration through the application state.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::path::Path;
use std::sync::Arc;

use secrecy::SecretString;

use fakestore_core::{ProductId, UserId};
use fakestore_integration_tests::product;
use fakestore_storefront::auth::{AuthProvider, MemoryAuth};
use fakestore_storefront::cart::CartRepository;
use fakestore_storefront::config::StorefrontConfig;
use fakestore_storefront::documents::{DocumentStore, MemoryDocumentStore};
use fakestore_storefront::services::Registration;
use fakestore_storefront::state::AppState;
use fakestore_storefront::storage::FileSessionStorage;

/// One "device": its own session directory over shared backends.
fn device(session_dir: &Path, documents: &MemoryDocumentStore, auth: &Arc<dyn AuthProvider>) -> AppState {
    AppState::with_backends(
        StorefrontConfig::offline(session_dir),
        Arc::new(documents.clone()),
        Arc::clone(auth),
        Arc::new(FileSessionStorage::new(session_dir)),
    )
    .unwrap()
}

fn password() -> SecretString {
    SecretString::from("correct horse battery".to_string())
}

#[tokio::test]
async fn test_guest_cart_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let documents = MemoryDocumentStore::new();
    let auth: Arc<dyn AuthProvider> = Arc::new(MemoryAuth::new());

    let first = device(dir.path(), &documents, &auth);
    first.cart().add(&product(1, "Backpack", 10995));
    first.cart().add(&product(1, "Backpack", 10995));
    first.cart().add(&product(9, "Hard Drive", 6400));
    drop(first);

    let second = device(dir.path(), &documents, &auth);
    let cart = second.cart().snapshot();
    assert_eq!(cart.item_count(), 3);
    assert_eq!(cart.line(ProductId::new(1)).unwrap().quantity, 2);
    assert_eq!(documents.write_count(), 0);
}

#[tokio::test]
async fn test_cart_follows_user_to_another_device() {
    let laptop_dir = tempfile::tempdir().unwrap();
    let phone_dir = tempfile::tempdir().unwrap();
    let documents = MemoryDocumentStore::new();
    let auth: Arc<dyn AuthProvider> = Arc::new(MemoryAuth::new());

    let laptop = device(laptop_dir.path(), &documents, &auth);
    let user = laptop
        .accounts()
        .register(&Registration {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password: password(),
        })
        .await
        .unwrap();

    let sync = laptop.start_cart_sync();
    sync.ready().await;
    laptop.cart().add(&product(9, "Hard Drive", 6400));
    laptop.cart().set_quantity(ProductId::new(9), 4);
    sync.shutdown().await;
    laptop.accounts().sign_out().await.unwrap();

    let saved = CartRepository::new(Arc::new(documents.clone()))
        .load(&user.uid)
        .await
        .unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].quantity, 4);

    let phone = device(phone_dir.path(), &documents, &auth);
    assert!(phone.cart().snapshot().is_empty());
    phone
        .accounts()
        .sign_in("ada@example.com", &password())
        .await
        .unwrap();
    let sync = phone.start_cart_sync();
    sync.ready().await;

    let cart = phone.cart().snapshot();
    assert_eq!(cart.items, saved);
    sync.shutdown().await;
}

#[tokio::test]
async fn test_signed_out_edits_stay_local() {
    let dir = tempfile::tempdir().unwrap();
    let documents = MemoryDocumentStore::new();
    let auth: Arc<dyn AuthProvider> = Arc::new(MemoryAuth::new());
    let state = device(dir.path(), &documents, &auth);

    let sync = state.start_cart_sync();
    sync.ready().await;
    state.cart().add(&product(2, "Mug", 899));
    sync.shutdown().await;

    assert_eq!(documents.write_count(), 0);
    let carts = documents.list("carts").await.unwrap();
    assert!(carts.is_empty());
    assert!(
        CartRepository::new(Arc::new(documents.clone()))
            .load(&UserId::new("nobody"))
            .await
            .unwrap()
            .is_empty()
    );
}
