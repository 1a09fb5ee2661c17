//! Orders placed at checkout.
//!
//! An order document is written once and never updated by this client. The
//! field names follow the stored document (`userId`, `userEmail`, `customer`)
//! so order history can be read back with a single equality query.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::cart::CartLine;
use super::email::{Email, EmailError};
use super::id::{DocumentId, UserId};
use super::money::saturating_sum;
use super::status::OrderStatus;

/// Errors when validating [`ShippingInfo`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ShippingInfoError {
    /// A required field is blank.
    #[error("{0} is required")]
    MissingField(&'static str),
    /// The contact email is malformed.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),
}

/// Shipping address form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfo {
    pub customer_name: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub zip_code: String,
}

impl ShippingInfo {
    /// Check that every field is filled in and the email parses.
    ///
    /// # Errors
    ///
    /// Returns the first missing field in form order, or the email parse
    /// error.
    pub fn validate(&self) -> Result<(), ShippingInfoError> {
        let fields = [
            ("customer name", &self.customer_name),
            ("email", &self.email),
            ("address", &self.address),
            ("city", &self.city),
            ("zip code", &self.zip_code),
        ];
        if let Some((name, _)) = fields.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(ShippingInfoError::MissingField(*name));
        }
        Email::parse(&self.email)?;
        Ok(())
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Document id; not part of the stored body.
    #[serde(skip)]
    pub id: Option<DocumentId>,
    #[serde(rename = "userId")]
    pub owner_id: UserId,
    #[serde(rename = "userEmail")]
    pub owner_email: Email,
    #[serde(rename = "customer")]
    pub shipping: ShippingInfo,
    pub items: Vec<CartLine>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    #[serde(default)]
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Build a pending order from the current cart lines.
    #[must_use]
    pub fn pending(
        owner_id: UserId,
        owner_email: Email,
        shipping: ShippingInfo,
        items: Vec<CartLine>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let total = saturating_sum(items.iter().map(CartLine::total));
        Self {
            id: None,
            owner_id,
            owner_email,
            shipping,
            items,
            total,
            status: OrderStatus::Pending,
            created_at,
        }
    }

    /// Attach the document id assigned by the store.
    #[must_use]
    pub fn with_id(mut self, id: DocumentId) -> Self {
        self.id = Some(id);
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::id::ProductId;

    fn shipping() -> ShippingInfo {
        ShippingInfo {
            customer_name: "Ada Shopper".to_string(),
            email: "ada@example.com".to_string(),
            address: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            zip_code: "12345".to_string(),
        }
    }

    #[test]
    fn test_shipping_validation() {
        assert!(shipping().validate().is_ok());

        let mut info = shipping();
        info.city = "   ".to_string();
        assert_eq!(
            info.validate(),
            Err(ShippingInfoError::MissingField("city"))
        );

        let mut info = shipping();
        info.email = "not-an-email".to_string();
        assert!(matches!(
            info.validate(),
            Err(ShippingInfoError::InvalidEmail(_))
        ));
    }

    #[test]
    fn test_pending_order_document_shape() {
        let items = vec![CartLine {
            id: ProductId::new(1),
            title: "Backpack".to_string(),
            price: Decimal::new(2999, 2),
            image: String::new(),
            quantity: 2,
        }];
        let order = Order::pending(
            UserId::new("uid-1"),
            Email::parse("ada@example.com").unwrap(),
            shipping(),
            items,
            DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        )
        .with_id(DocumentId::new("order-1"));

        assert_eq!(order.total, Decimal::new(5998, 2));

        let value = serde_json::to_value(&order).unwrap();
        assert_eq!(value["userId"], "uid-1");
        assert_eq!(value["userEmail"], "ada@example.com");
        assert_eq!(value["customer"]["zipCode"], "12345");
        assert_eq!(value["status"], "pending");
        assert!(value.get("id").is_none());

        let back: Order = serde_json::from_value(value).unwrap();
        assert_eq!(back.id, None);
        assert_eq!(back.items, order.items);
        assert_eq!(back.created_at, order.created_at);
    }
}
