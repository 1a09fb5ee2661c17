//! Checkout.

use tracing::info;

use fakestore_core::{Order, ShippingInfo, format_usd};
use fakestore_storefront::state::AppState;

use super::{CommandError, Credentials};

/// Address form fields from the command line.
pub struct AddressForm {
    pub name: String,
    pub address: String,
    pub city: String,
    pub zip: String,
    pub contact_email: Option<String>,
}

/// Sign in, restore the saved cart, and place an order for it.
///
/// # Errors
///
/// Returns an error if signing in fails, the cart is empty, the form is
/// invalid, or the order cannot be written.
pub async fn run(
    state: &AppState,
    credentials: &Credentials,
    form: AddressForm,
) -> Result<(), CommandError> {
    credentials.require(state).await?;

    let sync = state.start_cart_sync();
    sync.ready().await;
    let result = place(state, form).await;
    sync.shutdown().await;

    let order = result?;
    info!(
        order_id = order.id.as_ref().map_or("", |id| id.as_str()),
        items = order.items.len(),
        "Order placed, total {}",
        format_usd(order.total)
    );
    Ok(())
}

async fn place(state: &AppState, form: AddressForm) -> Result<Order, CommandError> {
    let checkout = state.checkout();
    let mut session = checkout.begin()?;
    let template = session.shipping_template();

    let shipping = ShippingInfo {
        customer_name: form.name,
        email: form.contact_email.unwrap_or(template.email),
        address: form.address,
        city: form.city,
        zip_code: form.zip,
    };
    Ok(checkout.submit(&mut session, shipping).await?)
}
