//! FakeStore Core - Shared types and the cart state machine.
//!
//! This crate provides the domain types used across the workspace:
//! - `storefront` - Catalog, cart sync, checkout and account services
//! - `cli` - Command-line storefront client
//!
//! # Architecture
//!
//! The core crate contains only types and pure state transitions - no I/O,
//! no HTTP clients, no storage. The cart reducer lives here so it can be
//! exercised without a runtime.
//!
//! # Modules
//!
//! - [`types`] - IDs, emails, money helpers, products, cart, orders and profiles

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
