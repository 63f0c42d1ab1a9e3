//! Line-level price arithmetic.
//!
//! Nothing here rounds. Rounding happens once, through [`round_money`], when a
//! value is persisted or shown, so aggregating many lines never compounds
//! rounding error.

use bigdecimal::{BigDecimal, RoundingMode};

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBreakdown {
    pub original_price: BigDecimal,
    /// Amount taken off by the percentage discount, before tax.
    pub discount: BigDecimal,
    pub final_price: BigDecimal,
}

fn percent_of(value: &BigDecimal, percent: &BigDecimal) -> BigDecimal {
    value * percent / BigDecimal::from(100)
}

/// `final = base × (1 − discount/100) × (1 + tax/100)`.
///
/// Inputs are expected in range (`base ≥ 0`, percentages in `0..=100`) and are
/// not checked here.
pub fn calculate_price(
    base_price: &BigDecimal,
    discount_percent: &BigDecimal,
    tax_rate: &BigDecimal,
) -> PriceBreakdown {
    let discount = percent_of(base_price, discount_percent);
    let discounted = base_price - &discount;
    let tax = percent_of(&discounted, tax_rate);

    PriceBreakdown {
        original_price: base_price.clone(),
        discount,
        final_price: discounted + tax,
    }
}

pub fn line_total(breakdown: &PriceBreakdown, quantity: i32) -> BigDecimal {
    &breakdown.final_price * BigDecimal::from(quantity)
}

/// Half-up rounding to cents.
pub fn round_money(value: &BigDecimal) -> BigDecimal {
    value.with_scale_round(2, RoundingMode::HalfUp)
}
