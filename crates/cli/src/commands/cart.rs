//! Cart inspection and editing.
//!
//! The cart lives in the session directory. With credentials the saved cart
//! is restored first and edits are written back before the command exits.

use tracing::info;

use fakestore_core::{CartState, ProductId, format_usd};
use fakestore_storefront::state::AppState;

use super::{CommandError, Credentials};

/// A single cart edit.
pub enum Edit {
    Show,
    Add(i32),
    Remove(i32),
    SetQuantity(i32, i64),
    Clear,
}

/// Apply `edit` and print the resulting cart.
///
/// # Errors
///
/// Returns an error if signing in fails or the product to add is unknown.
pub async fn run(state: &AppState, credentials: &Credentials, edit: Edit) -> Result<(), CommandError> {
    let user = credentials.sign_in(state).await?;
    let sync = user.is_some().then(|| state.start_cart_sync());
    if let Some(sync) = &sync {
        sync.ready().await;
    }

    let result = apply(state, edit).await;

    if let Some(sync) = sync {
        sync.shutdown().await;
    }
    result?;

    show(&state.cart().snapshot());
    Ok(())
}

async fn apply(state: &AppState, edit: Edit) -> Result<(), CommandError> {
    let cart = state.cart();
    match edit {
        Edit::Show => {}
        Edit::Add(id) => {
            let product = state
                .catalog()
                .product(ProductId::new(id))
                .await
                .ok_or(CommandError::UnknownProduct(id))?;
            cart.add(&product);
        }
        Edit::Remove(id) => cart.remove(ProductId::new(id)),
        Edit::SetQuantity(id, quantity) => cart.set_quantity(ProductId::new(id), quantity),
        Edit::Clear => cart.clear(),
    }
    Ok(())
}

fn show(cart: &CartState) {
    if cart.is_empty() {
        info!("Cart is empty");
        return;
    }
    for line in &cart.items {
        info!(
            "{:>3} x #{:<5} {:<40} {:>9}",
            line.quantity,
            line.id.as_i32(),
            line.title,
            format_usd(line.total())
        );
    }
    info!(items = cart.item_count(), "Total {}", format_usd(cart.total()));
}
