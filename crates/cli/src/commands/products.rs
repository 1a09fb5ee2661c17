//! Custom product administration.
//!
//! Writes need a signed-in user when the document store enforces rules, so
//! every command signs in first when credentials are given.

use tracing::info;

use fakestore_core::{DocumentId, ProductDraft};
use fakestore_storefront::services::ProductPatch;
use fakestore_storefront::state::AppState;

use super::{CommandError, Credentials, product_line};

/// List custom products with their document ids.
///
/// # Errors
///
/// Returns an error if signing in fails or the document store cannot be read.
pub async fn list(state: &AppState, credentials: &Credentials) -> Result<(), CommandError> {
    credentials.sign_in(state).await?;
    let products = state.products().list_custom().await?;
    if products.is_empty() {
        info!("No custom products");
    }
    for product in &products {
        let id = product
            .external_store_id
            .as_ref()
            .map_or("", |id| id.as_str());
        info!("{:<22} {}", id, product_line(product));
    }
    Ok(())
}

/// Add a custom product.
///
/// # Errors
///
/// Returns an error if signing in fails, or the draft is invalid or cannot
/// be written.
pub async fn add(
    state: &AppState,
    credentials: &Credentials,
    draft: &ProductDraft,
) -> Result<(), CommandError> {
    credentials.sign_in(state).await?;
    let id = state.products().add(draft).await?;
    state.catalog().invalidate().await;
    info!(id = %id, "Product added");
    Ok(())
}

/// Update fields of a custom product.
///
/// # Errors
///
/// Returns an error if signing in fails, the patch is invalid, or the product
/// does not exist.
pub async fn update(
    state: &AppState,
    credentials: &Credentials,
    id: &str,
    patch: &ProductPatch,
) -> Result<(), CommandError> {
    credentials.sign_in(state).await?;
    let id = DocumentId::new(id);
    state.products().update(&id, patch).await?;
    state.catalog().invalidate().await;
    info!(id = %id, "Product updated");
    Ok(())
}

/// Delete a custom product.
///
/// # Errors
///
/// Returns an error if signing in or the delete fails.
pub async fn delete(
    state: &AppState,
    credentials: &Credentials,
    id: &str,
) -> Result<(), CommandError> {
    credentials.sign_in(state).await?;
    let id = DocumentId::new(id);
    state.products().delete(&id).await?;
    state.catalog().invalidate().await;
    info!(id = %id, "Product deleted");
    Ok(())
}
