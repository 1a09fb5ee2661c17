//! Checkout flow.
//!
//! `Cart -> AddressForm -> OrderCreated -> CartCleared`. A session is opened
//! from a signed-in user with a non-empty cart, and submitting a valid
//! shipping form writes exactly one order document. There is no payment,
//! inventory check or duplicate-submission guard.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use fakestore_core::{Order, ShippingInfo};

use crate::auth::{AuthError, AuthProvider, AuthUser};
use crate::cart::{CartRepository, CartStore};
use crate::documents::{DocumentStore, collections, to_fields};
use crate::error::{Result, StoreError, add_breadcrumb};

/// Position in the checkout flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutStep {
    Cart,
    AddressForm,
    OrderCreated,
    CartCleared,
}

/// One pass through checkout.
#[derive(Debug)]
pub struct CheckoutSession {
    step: CheckoutStep,
    user: AuthUser,
    order: Option<Order>,
}

impl CheckoutSession {
    /// Current step.
    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        self.step
    }

    /// The buyer.
    #[must_use]
    pub const fn user(&self) -> &AuthUser {
        &self.user
    }

    /// The placed order, once submitted.
    #[must_use]
    pub const fn order(&self) -> Option<&Order> {
        self.order.as_ref()
    }

    /// Shipping form pre-filled with the buyer's email.
    #[must_use]
    pub fn shipping_template(&self) -> ShippingInfo {
        ShippingInfo {
            email: self.user.email.to_string(),
            ..ShippingInfo::default()
        }
    }
}

/// Turns the cart into an order.
#[derive(Clone)]
pub struct CheckoutService {
    documents: Arc<dyn DocumentStore>,
    auth: Arc<dyn AuthProvider>,
    cart: CartStore,
    carts: CartRepository,
}

impl CheckoutService {
    /// Create a new checkout service.
    #[must_use]
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        auth: Arc<dyn AuthProvider>,
        cart: CartStore,
    ) -> Self {
        let carts = CartRepository::new(Arc::clone(&documents));
        Self {
            documents,
            auth,
            cart,
            carts,
        }
    }

    /// Open a session at the address form.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotSignedIn` when nobody is signed in, and
    /// `StoreError::Validation` when the cart is empty.
    pub fn begin(&self) -> Result<CheckoutSession> {
        let user = self.auth.current_user().ok_or(AuthError::NotSignedIn)?;
        if self.cart.snapshot().is_empty() {
            return Err(StoreError::Validation("cart is empty".to_string()));
        }
        add_breadcrumb("checkout", "Opened checkout", None);
        Ok(CheckoutSession {
            step: CheckoutStep::AddressForm,
            user,
            order: None,
        })
    }

    /// Place the order and clear the cart.
    ///
    /// On failure the session stays at the address form and the cart is
    /// untouched, so the form can be submitted again.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` for an invalid form, an empty cart or
    /// a session that already placed its order, or a store error if the order
    /// cannot be written.
    #[instrument(skip(self, session, shipping), fields(uid = %session.user.uid))]
    pub async fn submit(
        &self,
        session: &mut CheckoutSession,
        shipping: ShippingInfo,
    ) -> Result<Order> {
        if session.step != CheckoutStep::AddressForm {
            return Err(StoreError::Validation(
                "order already placed for this checkout".to_string(),
            ));
        }
        shipping.validate()?;

        let cart = self.cart.snapshot();
        if cart.is_empty() {
            return Err(StoreError::Validation("cart is empty".to_string()));
        }

        let order = Order::pending(
            session.user.uid.clone(),
            session.user.email.clone(),
            shipping,
            cart.items,
            Utc::now(),
        );
        let id = self
            .documents
            .add(collections::ORDERS, to_fields(&order)?)
            .await?;
        let order = order.with_id(id);
        info!(order_id = ?order.id, total = %order.total, "Order placed");
        add_breadcrumb("checkout", "Placed order", None);
        session.order = Some(order.clone());
        session.step = CheckoutStep::OrderCreated;

        self.cart.clear();
        self.cart.discard_persisted();
        if let Err(e) = self.carts.clear(&session.user.uid).await {
            warn!(error = %e, "Failed to delete saved cart after checkout");
        }
        session.step = CheckoutStep::CartCleared;

        Ok(order)
    }
}
