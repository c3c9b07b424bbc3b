//! Price resolution for catalog products.

use rust_decimal::{prelude::ToPrimitive, Decimal};
use rust_decimal_macros::dec;

use crate::entities::ProductModel;

/// Unit price a customer pays right now: the discounted price whenever one
/// is set, whatever its value, otherwise the list price.
pub fn resolve_unit_price(product: &ProductModel) -> Decimal {
    product.discounted_price.unwrap_or(product.price)
}

/// Whole-number discount percentage, or `None` without a non-zero discount
/// or a positive list price. Halves round to even.
pub fn discount_percentage(product: &ProductModel) -> Option<i64> {
    let discounted = product.discounted_price?;
    if discounted.is_zero() || product.price <= Decimal::ZERO {
        return None;
    }
    ((product.price - discounted) / product.price * dec!(100))
        .round()
        .to_i64()
}

pub fn line_total(unit_price: Decimal, quantity: i32) -> Decimal {
    unit_price * Decimal::from(quantity)
}
