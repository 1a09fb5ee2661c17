//! Embedded sample catalog served when every remote source fails.

use rust_decimal::Decimal;

use fakestore_core::{Product, ProductId, Rating};

fn sample(
    id: i32,
    title: &str,
    cents: i64,
    category: &str,
    description: &str,
    rating: Rating,
) -> Product {
    Product {
        id: ProductId::new(id),
        title: title.to_string(),
        price: Decimal::new(cents, 2),
        category: category.to_string(),
        description: description.to_string(),
        image_ref: format!("https://via.placeholder.com/300x300?text=Product+{id}"),
        rating,
        external_store_id: None,
    }
}

/// The three sample products.
#[must_use]
pub fn sample_products() -> Vec<Product> {
    vec![
        sample(
            1,
            "Sample Product 1",
            2999,
            "electronics",
            "This is a sample product description.",
            Rating {
                rate: 4.5,
                count: 120,
            },
        ),
        sample(
            2,
            "Sample Product 2",
            3999,
            "clothing",
            "This is another sample product description.",
            Rating {
                rate: 4.2,
                count: 89,
            },
        ),
        sample(
            3,
            "Sample Product 3",
            1999,
            "books",
            "Sample book product description.",
            Rating {
                rate: 4.8,
                count: 203,
            },
        ),
    ]
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_catalog() {
        let products = sample_products();
        assert_eq!(products.len(), 3);
        assert_eq!(products[0].price, Decimal::new(2999, 2));
        assert!(products.iter().all(|p| !p.is_custom()));
        assert_eq!(
            products.iter().map(|p| p.category.as_str()).collect::<Vec<_>>(),
            ["electronics", "clothing", "books"]
        );
    }
}
