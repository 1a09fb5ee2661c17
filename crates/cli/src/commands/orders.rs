//! Order history.

use tracing::info;

use fakestore_core::format_usd;
use fakestore_storefront::state::AppState;

use super::{CommandError, Credentials};

/// Print the signed-in user's orders, newest first.
///
/// # Errors
///
/// Returns an error if signing in or the query fails.
pub async fn history(state: &AppState, credentials: &Credentials) -> Result<(), CommandError> {
    let user = credentials.require(state).await?;
    let orders = state.orders().history(&user.uid).await?;

    if orders.is_empty() {
        info!("No orders yet");
        return Ok(());
    }
    for order in &orders {
        info!(
            "{} {:<22} {:<8} {:>9}  {} item(s)",
            order.created_at.format("%Y-%m-%d %H:%M"),
            order.id.as_ref().map_or("", |id| id.as_str()),
            order.status,
            format_usd(order.total),
            order.items.iter().map(|line| line.quantity).sum::<u32>()
        );
    }
    Ok(())
}
