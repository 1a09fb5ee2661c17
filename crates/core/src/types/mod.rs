//! Core types for the FakeStore storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod email;
pub mod id;
pub mod money;
pub mod order;
pub mod product;
pub mod profile;
pub mod status;

pub use cart::{CartLine, CartState};
pub use email::{Email, EmailError};
pub use id::*;
pub use money::{format_usd, line_total, saturating_sum};
pub use order::{Order, ShippingInfo, ShippingInfoError};
pub use product::{CUSTOM_PRODUCT_ID_OFFSET, Product, ProductDraft, ProductDraftError, Rating};
pub use profile::UserProfile;
pub use status::OrderStatus;
