//! Remote document store.
//!
//! # Architecture
//!
//! Collections of JSON documents keyed by a string id. The storefront only
//! needs whole-document reads and writes plus a single equality filter, so
//! the [`DocumentStore`] trait stays that small.
//!
//! # Collections
//!
//! - `products` - custom products managed from the admin commands
//! - `users` - profiles keyed by auth uid
//! - `orders` - orders, queried by `userId`
//! - `carts` - saved carts keyed by auth uid
//!
//! # Backends
//!
//! - [`FirestoreClient`] - Firestore REST v1
//! - [`MemoryDocumentStore`] - offline runs and tests

mod firestore;
mod memory;

pub use firestore::FirestoreClient;
pub use memory::MemoryDocumentStore;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use fakestore_core::DocumentId;

/// Collection names.
pub mod collections {
    pub const PRODUCTS: &str = "products";
    pub const USERS: &str = "users";
    pub const ORDERS: &str = "orders";
    pub const CARTS: &str = "carts";
}

/// Top-level fields of a document.
pub type Fields = Map<String, Value>;

/// Errors that can occur when talking to the document store.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("document store returned {status}: {message}")]
    Service { status: u16, message: String },

    /// JSON parsing or document decoding failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value could not be mapped to or from the wire format.
    #[error("unsupported document value: {0}")]
    Encoding(String),

    /// Document does not exist.
    #[error("document not found: {0}")]
    NotFound(String),

    /// Store is unreachable (used by the in-memory store's fault switch).
    #[error("document store unavailable: {0}")]
    Unavailable(String),
}

impl DocumentError {
    /// Whether this is a connectivity problem rather than a store response.
    #[must_use]
    pub fn is_network(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Unavailable(_) => true,
            _ => false,
        }
    }
}

/// A stored document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub fields: Fields,
}

impl Document {
    /// Deserialize the document body.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::Parse` if the fields do not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, DocumentError> {
        Ok(serde_json::from_value(Value::Object(self.fields.clone()))?)
    }
}

/// Serialize `value` into document fields.
///
/// # Errors
///
/// Returns an error if `value` does not serialize to a JSON object.
pub fn to_fields<T: Serialize>(value: &T) -> Result<Fields, DocumentError> {
    match serde_json::to_value(value)? {
        Value::Object(fields) => Ok(fields),
        other => Err(DocumentError::Encoding(format!(
            "document body must be an object, got {other}"
        ))),
    }
}

/// Per-collection document storage.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read one document; `None` if it does not exist.
    async fn get(&self, collection: &str, id: &DocumentId)
    -> Result<Option<Document>, DocumentError>;

    /// Create or overwrite a document.
    async fn set(&self, collection: &str, id: &DocumentId, fields: Fields)
    -> Result<(), DocumentError>;

    /// Merge `fields` into an existing document.
    ///
    /// Fails with `DocumentError::NotFound` if the document is missing.
    async fn update(
        &self,
        collection: &str,
        id: &DocumentId,
        fields: Fields,
    ) -> Result<(), DocumentError>;

    /// Delete a document; deleting a missing document succeeds.
    async fn delete(&self, collection: &str, id: &DocumentId) -> Result<(), DocumentError>;

    /// Create a document with a store-generated id.
    async fn add(&self, collection: &str, fields: Fields) -> Result<DocumentId, DocumentError>;

    /// Every document in a collection, ordered by id.
    async fn list(&self, collection: &str) -> Result<Vec<Document>, DocumentError>;

    /// Documents whose top-level `field` equals `value`.
    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: Value,
    ) -> Result<Vec<Document>, DocumentError>;
}
