//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `catalog` - Product listing with custom/remote/sample fallback
//! - `checkout` - Cart to order
//! - `accounts` - Registration, sign-in, profiles
//! - `orders` - Order history
//! - `products` - Custom product administration

pub mod accounts;
pub mod catalog;
pub mod checkout;
pub mod orders;
pub mod products;

pub use accounts::{AccountService, Registration};
pub use catalog::{CatalogService, CatalogSource, ResolvedCatalog};
pub use checkout::{CheckoutService, CheckoutSession, CheckoutStep};
pub use orders::OrderService;
pub use products::{ProductPatch, ProductService};
