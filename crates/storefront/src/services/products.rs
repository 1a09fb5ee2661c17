//! Custom products stored in the `products` collection.
//!
//! Stored products get a storefront id derived only from their document id,
//! so it survives other products being added or deleted:
//!
//! - canonical numeric ids `0..=999_999` map to `1000 + id`
//! - every other id hashes into `1_001_000..=i32::MAX`
//!
//! Both ranges sit above the remote catalog's ids and do not overlap.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, instrument, warn};

use fakestore_core::{
    CUSTOM_PRODUCT_ID_OFFSET, DocumentId, Product, ProductDraft, ProductId, Rating,
};

use crate::documents::{Document, DocumentStore, collections, to_fields};
use crate::error::{Result, StoreError};

/// Largest numeric document id mapped directly to `1000 + id`.
const MAX_DIRECT_DOCUMENT_ID: i32 = 999_999;

/// First storefront id of the hashed range.
const HASHED_ID_BASE: i32 = CUSTOM_PRODUCT_ID_OFFSET + MAX_DIRECT_DOCUMENT_ID + 1;

/// Stored product body; every field is optional on read.
#[derive(Debug, Deserialize)]
struct StoredProduct {
    #[serde(default)]
    title: String,
    #[serde(default, with = "rust_decimal::serde::float")]
    price: Decimal,
    #[serde(default)]
    category: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    image: String,
    #[serde(default)]
    rating: Rating,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewProduct<'a> {
    #[serde(flatten)]
    draft: &'a ProductDraft,
    rating: Rating,
    created_at: DateTime<Utc>,
}

/// Partial product update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PatchBody<'a> {
    #[serde(flatten)]
    patch: &'a ProductPatch,
    updated_at: DateTime<Utc>,
}

/// Product administration over the document store.
#[derive(Clone)]
pub struct ProductService {
    documents: Arc<dyn DocumentStore>,
}

impl ProductService {
    /// Create a new product service.
    #[must_use]
    pub fn new(documents: Arc<dyn DocumentStore>) -> Self {
        Self { documents }
    }

    /// All custom products, in store order (by document id).
    ///
    /// Documents that do not decode are skipped with a warning, as is any
    /// product whose storefront id is already taken by an earlier document.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be listed.
    #[instrument(skip(self))]
    pub async fn list_custom(&self) -> Result<Vec<Product>> {
        let docs = self.documents.list(collections::PRODUCTS).await?;
        let products = docs
            .iter()
            .filter_map(|doc| match to_product(doc) {
                Ok(product) => Some(product),
                Err(e) => {
                    warn!(id = %doc.id, error = %e, "Skipping malformed product document");
                    None
                }
            })
            .collect();
        Ok(dedupe_ids(products))
    }

    /// Create a custom product.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` for an invalid draft, or a store error.
    #[instrument(skip(self, draft), fields(title = %draft.title))]
    pub async fn add(&self, draft: &ProductDraft) -> Result<DocumentId> {
        draft.validate()?;
        let body = NewProduct {
            draft,
            rating: Rating::default(),
            created_at: Utc::now(),
        };
        let id = self
            .documents
            .add(collections::PRODUCTS, to_fields(&body)?)
            .await?;
        info!(id = %id, "Product created");
        Ok(id)
    }

    /// Apply a partial update and stamp `updatedAt`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` for a negative price or blank
    /// title/category, `StoreError::NotFound` if the product does not exist.
    #[instrument(skip(self, patch), fields(id = %id))]
    pub async fn update(&self, id: &DocumentId, patch: &ProductPatch) -> Result<()> {
        if patch.price.is_some_and(|p| p < Decimal::ZERO) {
            return Err(StoreError::Validation(
                "product price cannot be negative".to_string(),
            ));
        }
        if patch.title.as_deref().is_some_and(|t| t.trim().is_empty())
            || patch.category.as_deref().is_some_and(|c| c.trim().is_empty())
        {
            return Err(StoreError::Validation(
                "product title and category cannot be blank".to_string(),
            ));
        }

        let body = PatchBody {
            patch,
            updated_at: Utc::now(),
        };
        self.documents
            .update(collections::PRODUCTS, id, to_fields(&body)?)
            .await
            .map_err(|e| match e {
                crate::documents::DocumentError::NotFound(what) => StoreError::NotFound(what),
                other => other.into(),
            })?;
        info!("Product updated");
        Ok(())
    }

    /// Delete a custom product.
    ///
    /// # Errors
    ///
    /// Returns an error if the store call fails.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete(&self, id: &DocumentId) -> Result<()> {
        self.documents.delete(collections::PRODUCTS, id).await?;
        info!("Product deleted");
        Ok(())
    }
}

fn to_product(doc: &Document) -> Result<Product> {
    let stored: StoredProduct = doc.decode()?;
    Ok(Product {
        id: custom_product_id(&doc.id),
        title: stored.title,
        price: stored.price,
        category: stored.category,
        description: stored.description,
        image_ref: stored.image,
        rating: stored.rating,
        external_store_id: Some(doc.id.clone()),
    })
}

/// Storefront id for a stored product.
fn custom_product_id(id: &DocumentId) -> ProductId {
    if let Ok(numeric) = id.as_str().parse::<i32>()
        && (0..=MAX_DIRECT_DOCUMENT_ID).contains(&numeric)
        && numeric.to_string() == id.as_str()
    {
        return ProductId::new(CUSTOM_PRODUCT_ID_OFFSET + numeric);
    }

    let digest = Sha256::digest(id.as_str().as_bytes());
    let prefix = digest
        .iter()
        .take(8)
        .fold(0_u64, |acc, byte| (acc << 8) | u64::from(*byte));
    let span = u64::from(i32::MAX.unsigned_abs()) - u64::from(HASHED_ID_BASE.unsigned_abs()) + 1;
    let offset = i64::try_from(prefix % span).unwrap_or_default();
    let hashed = i64::from(HASHED_ID_BASE) + offset;
    ProductId::new(i32::try_from(hashed).unwrap_or(i32::MAX))
}

/// Keep the first product for each storefront id.
fn dedupe_ids(products: Vec<Product>) -> Vec<Product> {
    let mut seen = HashSet::new();
    products
        .into_iter()
        .filter(|product| {
            let fresh = seen.insert(product.id);
            if !fresh {
                warn!(
                    id = %product.id,
                    document = ?product.external_store_id,
                    "Skipping product with duplicate storefront id"
                );
            }
            fresh
        })
        .collect()
}
