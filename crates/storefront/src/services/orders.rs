//! Order history.

use std::sync::Arc;

use serde_json::Value;
use tracing::{instrument, warn};

use fakestore_core::{Order, UserId};

use crate::documents::{DocumentStore, collections};
use crate::error::Result;

/// Reads a user's orders.
#[derive(Clone)]
pub struct OrderService {
    documents: Arc<dyn DocumentStore>,
}

impl OrderService {
    /// Create a new order service.
    #[must_use]
    pub fn new(documents: Arc<dyn DocumentStore>) -> Self {
        Self { documents }
    }

    /// Orders placed by `uid`, newest first.
    ///
    /// Documents that do not decode as orders are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    #[instrument(skip(self), fields(uid = %uid))]
    pub async fn history(&self, uid: &UserId) -> Result<Vec<Order>> {
        let docs = self
            .documents
            .query_eq(
                collections::ORDERS,
                "userId",
                Value::String(uid.as_str().to_string()),
            )
            .await?;

        let mut orders: Vec<Order> = docs
            .iter()
            .filter_map(|doc| match doc.decode::<Order>() {
                Ok(order) => Some(order.with_id(doc.id.clone())),
                Err(e) => {
                    warn!(id = %doc.id, error = %e, "Skipping malformed order document");
                    None
                }
            })
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;
    use crate::documents::{MemoryDocumentStore, to_fields};
    use fakestore_core::{CartLine, Email, ProductId, ShippingInfo};

    fn order(uid: &str, hours: i64) -> Order {
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        Order::pending(
            UserId::new(uid),
            Email::parse("ada@example.com").unwrap(),
            ShippingInfo {
                customer_name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                address: "1 Main St".to_string(),
                city: "Springfield".to_string(),
                zip_code: "12345".to_string(),
            },
            vec![CartLine {
                id: ProductId::new(1),
                title: "Backpack".to_string(),
                price: Decimal::new(2999, 2),
                image: String::new(),
                quantity: 1,
            }],
            base + Duration::hours(hours),
        )
    }

    #[tokio::test]
    async fn test_history_is_filtered_and_newest_first() {
        let store = MemoryDocumentStore::new();
        for o in [order("a", 1), order("b", 2), order("a", 5), order("a", 3)] {
            store
                .add(collections::ORDERS, to_fields(&o).unwrap())
                .await
                .unwrap();
        }
        let Value::Object(junk) = json!({"userId": "a", "total": "lots"}) else {
            unreachable!()
        };
        store.add(collections::ORDERS, junk).await.unwrap();

        let history = OrderService::new(Arc::new(store))
            .history(&UserId::new("a"))
            .await
            .unwrap();
        assert_eq!(history.len(), 3);
        assert!(history.windows(2).all(|w| w[0].created_at >= w[1].created_at));
        assert!(history.iter().all(|o| o.id.is_some()));
    }
}
