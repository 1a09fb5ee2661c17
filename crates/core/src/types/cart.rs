//! Cart state machine.
//!
//! [`CartState`] is a plain reducer: every transition is synchronous,
//! infallible, and reports whether it changed anything so an owning store
//! can decide whether observers need to hear about it.
//!
//! The serialized form is `{"items": [...]}`, the same document shape used for
//! the local session snapshot and the remote per-user cart.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::money::{line_total, saturating_sum};
use super::product::Product;

/// One product entry in the cart with its quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Product id (unique within a cart).
    pub id: ProductId,
    pub title: String,
    /// Unit price at the time the product was added.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Image URL.
    #[serde(default)]
    pub image: String,
    /// Always at least 1 while the line is in a cart.
    pub quantity: u32,
}

impl CartLine {
    /// Price of this line (unit price times quantity).
    #[must_use]
    pub fn total(&self) -> Decimal {
        line_total(self.price, self.quantity)
    }
}

impl From<&Product> for CartLine {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            title: product.title.clone(),
            price: product.price,
            image: product.image_ref.clone(),
            quantity: 1,
        }
    }
}

/// Ordered cart contents; insertion order is add order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CartState {
    #[serde(default)]
    pub items: Vec<CartLine>,
}

impl CartState {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Add one unit of `product`.
    ///
    /// Increments the existing line or appends a new line with quantity 1.
    pub fn add(&mut self, product: &Product) -> bool {
        if let Some(line) = self.line_mut(product.id) {
            line.quantity = line.quantity.saturating_add(1);
        } else {
            self.items.push(CartLine::from(product));
        }
        true
    }

    /// Remove the line for `id`. Returns `false` if there was none.
    pub fn remove(&mut self, id: ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|line| line.id != id);
        self.items.len() != before
    }

    /// Set the quantity of the line for `id`.
    ///
    /// Negative quantities clamp to zero, and zero removes the line. Unknown
    /// ids are ignored.
    pub fn set_quantity(&mut self, id: ProductId, quantity: i64) -> bool {
        let clamped = u32::try_from(quantity.max(0)).unwrap_or(u32::MAX);
        if clamped == 0 {
            return self.remove(id);
        }
        match self.line_mut(id) {
            Some(line) if line.quantity != clamped => {
                line.quantity = clamped;
                true
            }
            _ => false,
        }
    }

    /// Empty the cart.
    pub fn clear(&mut self) -> bool {
        let changed = !self.items.is_empty();
        self.items.clear();
        changed
    }

    /// Replace the contents wholesale (hydration).
    ///
    /// Lines with a zero quantity are dropped so the invariant holds even for
    /// malformed remote copies; later duplicates of an id are merged into the
    /// first occurrence.
    pub fn replace_all(&mut self, lines: Vec<CartLine>) -> bool {
        let mut next: Vec<CartLine> = Vec::with_capacity(lines.len());
        for line in lines.into_iter().filter(|line| line.quantity > 0) {
            if let Some(existing) = next.iter_mut().find(|l| l.id == line.id) {
                existing.quantity = existing.quantity.saturating_add(line.quantity);
            } else {
                next.push(line);
            }
        }
        let changed = next != self.items;
        self.items = next;
        changed
    }

    /// Look up the line for `id`.
    #[must_use]
    pub fn line(&self, id: ProductId) -> Option<&CartLine> {
        self.items.iter().find(|line| line.id == id)
    }

    fn line_mut(&mut self, id: ProductId) -> Option<&mut CartLine> {
        self.items.iter_mut().find(|line| line.id == id)
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |acc, line| acc.saturating_add(line.quantity))
    }

    /// Sum of all line totals, saturating at the `Decimal` bounds.
    #[must_use]
    pub fn total(&self) -> Decimal {
        saturating_sum(self.items.iter().map(CartLine::total))
    }
}
