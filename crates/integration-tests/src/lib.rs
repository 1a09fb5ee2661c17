//! Integration tests for `FakeStore`.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p fakestore-integration-tests
//! ```
//!
//! Everything runs offline: the catalog API is replaced by [`MockCatalog`],
//! a local axum server with scripted replies, and accounts and documents use
//! the in-memory backends.
//!
//! # Test Categories
//!
//! - `catalog_retry` - Retry and fallback against the mock catalog
//! - `cart_sync` - Cart persistence and hydration across devices
//! - `checkout_flow` - Registration through order history

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use url::Url;

use fakestore_core::{Product, ProductId, Rating};
use fakestore_storefront::config::CatalogConfig;

/// One scripted HTTP reply.
#[derive(Debug, Clone)]
pub struct Reply {
    status: StatusCode,
    body: String,
}

impl Reply {
    /// 200 with a JSON body.
    #[must_use]
    pub fn json(body: &Value) -> Self {
        Self {
            status: StatusCode::OK,
            body: body.to_string(),
        }
    }

    /// Bare status with an empty body.
    #[must_use]
    pub const fn status(status: StatusCode) -> Self {
        Self {
            status,
            body: String::new(),
        }
    }

    /// 200 with a body that is not valid JSON.
    #[must_use]
    pub fn garbage() -> Self {
        Self {
            status: StatusCode::OK,
            body: "<html>maintenance</html>".to_string(),
        }
    }
}

#[derive(Clone, Default)]
struct Script {
    replies: Arc<Mutex<HashMap<String, VecDeque<Reply>>>>,
    hits: Arc<Mutex<HashMap<String, usize>>>,
}

/// Local stand-in for the catalog API.
///
/// Each path answers with its queued replies in order; the last one repeats.
/// Unscripted paths answer 404.
pub struct MockCatalog {
    base_url: Url,
    script: Script,
    task: JoinHandle<()>,
}

impl MockCatalog {
    /// Bind to an ephemeral port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        let script = Script::default();
        let app = Router::new().fallback(reply).with_state(script.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock catalog");
        let addr = listener.local_addr().expect("mock catalog address");
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let base_url = Url::parse(&format!("http://{addr}")).expect("mock catalog url");
        Self {
            base_url,
            script,
            task,
        }
    }

    /// Queue replies for `path` (for example `/products`).
    pub fn respond(&self, path: &str, replies: impl IntoIterator<Item = Reply>) {
        self.script
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(path.to_string())
            .or_default()
            .extend(replies);
    }

    /// Requests received for `path`.
    #[must_use]
    pub fn hits(&self, path: &str) -> usize {
        self.script
            .hits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .copied()
            .unwrap_or(0)
    }

    /// Catalog configuration pointing at this server, without caching.
    #[must_use]
    pub fn config(&self) -> CatalogConfig {
        CatalogConfig {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(5),
            cache_ttl: None,
        }
    }
}

impl Drop for MockCatalog {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn reply(State(script): State<Script>, uri: Uri) -> Response {
    let path = uri.path().to_string();
    *script
        .hits
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .entry(path.clone())
        .or_default() += 1;

    let next = {
        let mut replies = script
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        replies.get_mut(&path).and_then(|queue| {
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        })
    };

    match next {
        Some(r) => (r.status, [(header::CONTENT_TYPE, "application/json")], r.body).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Catalog API JSON for a product.
#[must_use]
pub fn product_json(id: i32, title: &str, price: f64, category: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "price": price,
        "description": format!("{title} description"),
        "category": category,
        "image": format!("https://img.example.com/{id}.jpg"),
        "rating": { "rate": 4.2, "count": 17 }
    })
}

/// A product that can go straight into a cart.
#[must_use]
pub fn product(id: i32, title: &str, cents: i64) -> Product {
    Product {
        id: ProductId::new(id),
        title: title.to_string(),
        price: Decimal::new(cents, 2),
        category: "electronics".to_string(),
        description: String::new(),
        image_ref: format!("https://img.example.com/{id}.jpg"),
        rating: Rating::default(),
        external_store_id: None,
    }
}
