//! In-memory document store.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use fakestore_core::DocumentId;

use super::{Document, DocumentError, DocumentStore, Fields};

type Collection = BTreeMap<String, Fields>;

/// Document store held in process memory.
///
/// Cheap to clone; clones share the same data. The availability switch makes
/// every call fail with [`DocumentError::Unavailable`], which is how offline
/// behaviour is exercised.
#[derive(Clone, Default)]
pub struct MemoryDocumentStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    collections: RwLock<HashMap<String, Collection>>,
    unavailable: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle simulated outage.
    pub fn set_available(&self, available: bool) {
        self.inner.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Number of successful writes (set, update, delete, add) so far.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), DocumentError> {
        if self.inner.unavailable.load(Ordering::SeqCst) {
            return Err(DocumentError::Unavailable(
                "in-memory store is offline".to_string(),
            ));
        }
        Ok(())
    }

    fn record_write(&self) {
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(
        &self,
        collection: &str,
        id: &DocumentId,
    ) -> Result<Option<Document>, DocumentError> {
        self.check_available()?;
        let collections = self.inner.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id.as_str()))
            .map(|fields| Document {
                id: id.clone(),
                fields: fields.clone(),
            }))
    }

    async fn set(
        &self,
        collection: &str,
        id: &DocumentId,
        fields: Fields,
    ) -> Result<(), DocumentError> {
        self.check_available()?;
        let mut collections = self.inner.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.as_str().to_string(), fields);
        self.record_write();
        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        id: &DocumentId,
        fields: Fields,
    ) -> Result<(), DocumentError> {
        self.check_available()?;
        let mut collections = self.inner.collections.write().await;
        let existing = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id.as_str()))
            .ok_or_else(|| DocumentError::NotFound(format!("{collection}/{id}")))?;
        existing.extend(fields);
        self.record_write();
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &DocumentId) -> Result<(), DocumentError> {
        self.check_available()?;
        let mut collections = self.inner.collections.write().await;
        if let Some(docs) = collections.get_mut(collection) {
            docs.remove(id.as_str());
        }
        self.record_write();
        Ok(())
    }

    async fn add(&self, collection: &str, fields: Fields) -> Result<DocumentId, DocumentError> {
        self.check_available()?;
        let id = uuid::Uuid::new_v4().simple().to_string();
        let mut collections = self.inner.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields);
        self.record_write();
        Ok(DocumentId::new(id))
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, DocumentError> {
        self.check_available()?;
        let collections = self.inner.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| Document {
                        id: DocumentId::new(id.clone()),
                        fields: fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: Value,
    ) -> Result<Vec<Document>, DocumentError> {
        let docs = self.list(collection).await?;
        Ok(docs
            .into_iter()
            .filter(|doc| doc.fields.get(field) == Some(&value))
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use serde_json::json;

    use super::*;

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => Fields::new(),
        }
    }

    #[tokio::test]
    async fn test_set_get_delete() {
        let store = MemoryDocumentStore::new();
        let id = DocumentId::new("uid-1");

        assert!(store.get("carts", &id).await.unwrap().is_none());
        store
            .set("carts", &id, fields(json!({"items": []})))
            .await
            .unwrap();
        let doc = store.get("carts", &id).await.unwrap().unwrap();
        assert_eq!(doc.fields["items"], json!([]));

        store.delete("carts", &id).await.unwrap();
        assert!(store.get("carts", &id).await.unwrap().is_none());
        assert_eq!(store.write_count(), 2);
    }

    #[tokio::test]
    async fn test_update_merges_and_requires_existing() {
        let store = MemoryDocumentStore::new();
        let id = DocumentId::new("u");
        let missing = store.update("users", &id, fields(json!({"name": "x"}))).await;
        assert!(matches!(missing, Err(DocumentError::NotFound(_))));

        store
            .set("users", &id, fields(json!({"name": "Ada", "email": "a@b.c"})))
            .await
            .unwrap();
        store
            .update("users", &id, fields(json!({"name": "Ada L."})))
            .await
            .unwrap();
        let doc = store.get("users", &id).await.unwrap().unwrap();
        assert_eq!(doc.fields["name"], "Ada L.");
        assert_eq!(doc.fields["email"], "a@b.c");
    }

    #[tokio::test]
    async fn test_add_and_query_eq() {
        let store = MemoryDocumentStore::new();
        store
            .add("orders", fields(json!({"userId": "a", "total": 1})))
            .await
            .unwrap();
        store
            .add("orders", fields(json!({"userId": "b", "total": 2})))
            .await
            .unwrap();
        store
            .add("orders", fields(json!({"userId": "a", "total": 3})))
            .await
            .unwrap();

        let mine = store
            .query_eq("orders", "userId", json!("a"))
            .await
            .unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(store.list("orders").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_unavailable_fails_every_call() {
        let store = MemoryDocumentStore::new();
        store.set_available(false);
        let err = store.list("products").await.unwrap_err();
        assert!(err.is_network());

        store.set_available(true);
        assert!(store.list("products").await.unwrap().is_empty());
    }
}
