//! `FakeStore` storefront library.
//!
//! Client-side services for a small shop: catalog browsing with fallback
//! data, a persistent cart that follows the signed-in user, checkout, and
//! account management. The `fakestore` CLI is a thin shell over this crate.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod documents;
pub mod error;
pub mod services;
pub mod state;
pub mod storage;
