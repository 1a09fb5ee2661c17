//! Catalog products.
//!
//! The JSON shape matches the public catalog API (`id`, `title`, `price`,
//! `category`, `description`, `image`, `rating`). Products that come from the
//! document store additionally carry their document id as `firestoreId`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{DocumentId, ProductId};

/// Offset added to numeric ids of document-store products so they never
/// collide with remote catalog ids.
pub const CUSTOM_PRODUCT_ID_OFFSET: i32 = 1000;

/// Review summary for a product.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Rating {
    /// Average rating (0.0 - 5.0).
    pub rate: f64,
    /// Number of reviews.
    pub count: u32,
}

/// A product as shown in the storefront.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub category: String,
    #[serde(default)]
    pub description: String,
    /// Image URL.
    #[serde(rename = "image", default)]
    pub image_ref: String,
    #[serde(default)]
    pub rating: Rating,
    /// Document id when the product is stored in the document store.
    #[serde(
        rename = "firestoreId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub external_store_id: Option<DocumentId>,
}

impl Product {
    /// Whether this product is a custom product from the document store.
    #[must_use]
    pub const fn is_custom(&self) -> bool {
        self.external_store_id.is_some()
    }
}

/// Errors when validating a [`ProductDraft`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProductDraftError {
    #[error("product title is required")]
    MissingTitle,
    #[error("product category is required")]
    MissingCategory,
    #[error("product price cannot be negative")]
    NegativePrice,
}

/// Input for creating a custom product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub title: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub category: String,
    pub description: String,
    pub image: String,
}

impl ProductDraft {
    /// Check required fields.
    ///
    /// # Errors
    ///
    /// Returns the first failing rule: empty title, empty category, or a
    /// negative price.
    pub fn validate(&self) -> Result<(), ProductDraftError> {
        if self.title.trim().is_empty() {
            return Err(ProductDraftError::MissingTitle);
        }
        if self.category.trim().is_empty() {
            return Err(ProductDraftError::MissingCategory);
        }
        if self.price.is_sign_negative() && !self.price.is_zero() {
            return Err(ProductDraftError::NegativePrice);
        }
        Ok(())
    }
}
