//! Per-user saved carts in the `carts` collection.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use fakestore_core::{CartLine, DocumentId, UserId};

use crate::documents::{DocumentError, DocumentStore, collections, to_fields};

/// Stored cart document: `{ items, updatedAt }`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SavedCart {
    #[serde(default)]
    items: Vec<CartLine>,
    #[serde(default, skip_deserializing)]
    updated_at: Option<DateTime<Utc>>,
}

/// Reads and writes `carts/{uid}`.
#[derive(Clone)]
pub struct CartRepository {
    documents: Arc<dyn DocumentStore>,
}

impl CartRepository {
    /// Create a repository over a document store.
    #[must_use]
    pub fn new(documents: Arc<dyn DocumentStore>) -> Self {
        Self { documents }
    }

    fn doc_id(uid: &UserId) -> DocumentId {
        DocumentId::new(uid.as_str())
    }

    /// Load the saved cart; a missing document is an empty cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the store call fails or the document is malformed.
    #[instrument(skip(self), fields(uid = %uid))]
    pub async fn load(&self, uid: &UserId) -> Result<Vec<CartLine>, DocumentError> {
        let Some(doc) = self.documents.get(collections::CARTS, &Self::doc_id(uid)).await? else {
            return Ok(Vec::new());
        };
        Ok(doc.decode::<SavedCart>()?.items)
    }

    /// Overwrite the saved cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the store call fails.
    #[instrument(skip(self, items), fields(uid = %uid, lines = items.len()))]
    pub async fn save(&self, uid: &UserId, items: &[CartLine]) -> Result<(), DocumentError> {
        let body = SavedCart {
            items: items.to_vec(),
            updated_at: Some(Utc::now()),
        };
        self.documents
            .set(collections::CARTS, &Self::doc_id(uid), to_fields(&body)?)
            .await
    }

    /// Delete the saved cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the store call fails.
    #[instrument(skip(self), fields(uid = %uid))]
    pub async fn clear(&self, uid: &UserId) -> Result<(), DocumentError> {
        self.documents
            .delete(collections::CARTS, &Self::doc_id(uid))
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::documents::MemoryDocumentStore;
    use fakestore_core::ProductId;

    fn line(id: i32, quantity: u32) -> CartLine {
        CartLine {
            id: ProductId::new(id),
            title: format!("Product {id}"),
            price: Decimal::new(1999, 2),
            image: String::new(),
            quantity,
        }
    }

    #[tokio::test]
    async fn test_save_load_clear() {
        let store = MemoryDocumentStore::new();
        let repo = CartRepository::new(Arc::new(store.clone()));
        let uid = UserId::new("uid-1");

        assert!(repo.load(&uid).await.unwrap().is_empty());

        repo.save(&uid, &[line(1, 2), line(2, 1)]).await.unwrap();
        let loaded = repo.load(&uid).await.unwrap();
        assert_eq!(loaded, vec![line(1, 2), line(2, 1)]);

        let doc = store
            .get(collections::CARTS, &DocumentId::new("uid-1"))
            .await
            .unwrap()
            .unwrap();
        assert!(doc.fields.contains_key("updatedAt"));

        repo.clear(&uid).await.unwrap();
        assert!(repo.load(&uid).await.unwrap().is_empty());
    }
}
