//! Registration through checkout and order history.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use rust_decimal::Decimal;
use secrecy::SecretString;

use fakestore_core::{OrderStatus, ShippingInfo};
use fakestore_integration_tests::product;
use fakestore_storefront::auth::MemoryAuth;
use fakestore_storefront::cart::{CART_STORAGE_KEY, CartRepository};
use fakestore_storefront::config::StorefrontConfig;
use fakestore_storefront::documents::MemoryDocumentStore;
use fakestore_storefront::error::{ErrorKind, StoreError};
use fakestore_storefront::services::{CheckoutStep, Registration};
use fakestore_storefront::state::AppState;
use fakestore_storefront::storage::{FileSessionStorage, SessionStorage};

struct Shop {
    _dir: tempfile::TempDir,
    storage: Arc<FileSessionStorage>,
    documents: MemoryDocumentStore,
    state: AppState,
}

fn shop() -> Shop {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(FileSessionStorage::new(dir.path()));
    let documents = MemoryDocumentStore::new();
    let state = AppState::with_backends(
        StorefrontConfig::offline(dir.path()),
        Arc::new(documents.clone()),
        Arc::new(MemoryAuth::new()),
        Arc::clone(&storage) as Arc<dyn SessionStorage>,
    )
    .unwrap();
    Shop {
        _dir: dir,
        storage,
        documents,
        state,
    }
}

fn shipping(email: &str) -> ShippingInfo {
    ShippingInfo {
        customer_name: "Ada Lovelace".to_string(),
        email: email.to_string(),
        address: "12 Analytical Way".to_string(),
        city: "London".to_string(),
        zip_code: "N1 9GU".to_string(),
    }
}

async fn register(state: &AppState) -> fakestore_storefront::auth::AuthUser {
    state
        .accounts()
        .register(&Registration {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password: SecretString::from("difference engine".to_string()),
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn test_checkout_places_order_and_clears_everything() {
    let shop = shop();
    let user = register(&shop.state).await;

    let sync = shop.state.start_cart_sync();
    sync.ready().await;
    shop.state.cart().add(&product(1, "Backpack", 10995));
    shop.state.cart().add(&product(9, "Hard Drive", 6400));
    shop.state.cart().add(&product(9, "Hard Drive", 6400));

    let checkout = shop.state.checkout();
    let mut session = checkout.begin().unwrap();
    assert_eq!(session.step(), CheckoutStep::AddressForm);
    assert_eq!(session.shipping_template().email, "ada@example.com");

    let order = checkout
        .submit(&mut session, shipping("ada@example.com"))
        .await
        .unwrap();
    sync.shutdown().await;

    assert_eq!(session.step(), CheckoutStep::CartCleared);
    assert_eq!(order.total, Decimal::new(23795, 2));
    assert_eq!(order.status, OrderStatus::Pending);
    assert!(shop.state.cart().snapshot().is_empty());
    assert!(shop.storage.get(CART_STORAGE_KEY).unwrap().is_none());
    assert!(
        CartRepository::new(Arc::new(shop.documents.clone()))
            .load(&user.uid)
            .await
            .unwrap()
            .is_empty()
    );

    let history = shop.state.orders().history(&user.uid).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, order.id);
    assert_eq!(history[0].items.len(), 2);
    assert_eq!(history[0].shipping.city, "London");
}

#[tokio::test]
async fn test_checkout_requires_sign_in() {
    let shop = shop();
    shop.state.cart().add(&product(1, "Backpack", 10995));

    let err = shop.state.checkout().begin().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AuthFailure);
}

#[tokio::test]
async fn test_invalid_address_keeps_cart() {
    let shop = shop();
    register(&shop.state).await;
    shop.state.cart().add(&product(1, "Backpack", 10995));

    let checkout = shop.state.checkout();
    let mut session = checkout.begin().unwrap();
    let mut form = shipping("ada@example.com");
    form.zip_code = "  ".to_string();

    let err = checkout.submit(&mut session, form).await.unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
    assert_eq!(session.step(), CheckoutStep::AddressForm);
    assert_eq!(shop.state.cart().snapshot().item_count(), 1);
    assert!(shop.state.orders().history(&session.user().uid).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_order_write_keeps_cart() {
    let shop = shop();
    register(&shop.state).await;
    shop.state.cart().add(&product(1, "Backpack", 10995));

    let checkout = shop.state.checkout();
    let mut session = checkout.begin().unwrap();
    shop.documents.set_available(false);

    let err = checkout
        .submit(&mut session, shipping("ada@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Documents(_)));
    assert_eq!(session.step(), CheckoutStep::AddressForm);
    assert_eq!(shop.state.cart().snapshot().item_count(), 1);
    assert!(shop.storage.get(CART_STORAGE_KEY).unwrap().is_some());
}

#[tokio::test]
async fn test_profile_rename_and_account_deletion() {
    let shop = shop();
    let user = register(&shop.state).await;
    let accounts = shop.state.accounts();

    let profile = accounts.update_name(&user.uid, "  Countess  ").await.unwrap();
    assert_eq!(profile.name, "Countess");
    assert_eq!(accounts.profile(&user.uid).await.unwrap().name, "Countess");

    accounts.delete_account().await.unwrap();
    assert!(accounts.current_user().is_none());
    assert!(matches!(
        accounts.profile(&user.uid).await.unwrap_err(),
        StoreError::NotFound(_)
    ));
}
