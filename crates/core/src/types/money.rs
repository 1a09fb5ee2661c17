//! Decimal money helpers.
//!
//! Prices are plain [`Decimal`] amounts in US dollars. The remote catalog and
//! the document store both carry prices as JSON numbers, so price fields use
//! `rust_decimal::serde::float` for (de)serialization.

use rust_decimal::{Decimal, RoundingStrategy};

/// Price of `quantity` units at `unit_price`, saturating at the `Decimal`
/// bounds.
#[must_use]
pub fn line_total(unit_price: Decimal, quantity: u32) -> Decimal {
    unit_price.saturating_mul(Decimal::from(quantity))
}

/// Sum of `amounts`, saturating at the `Decimal` bounds.
#[must_use]
pub fn saturating_sum(amounts: impl IntoIterator<Item = Decimal>) -> Decimal {
    amounts
        .into_iter()
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Format an amount for display (e.g., `$19.99`).
#[must_use]
pub fn format_usd(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("${rounded:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total() {
        assert_eq!(line_total(Decimal::new(2999, 2), 3), Decimal::new(8997, 2));
        assert_eq!(line_total(Decimal::new(2999, 2), 0), Decimal::ZERO);
        assert_eq!(line_total(Decimal::MAX, u32::MAX), Decimal::MAX);
    }

    #[test]
    fn test_saturating_sum() {
        assert_eq!(saturating_sum([]), Decimal::ZERO);
        assert_eq!(
            saturating_sum([Decimal::new(150, 2), Decimal::new(250, 2)]),
            Decimal::new(4, 0)
        );
        assert_eq!(saturating_sum([Decimal::MAX, Decimal::ONE]), Decimal::MAX);
    }

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(Decimal::new(2999, 2)), "$29.99");
        assert_eq!(format_usd(Decimal::new(5, 0)), "$5.00");
        assert_eq!(format_usd(Decimal::new(12345, 3)), "$12.35");
    }
}
