use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::entities::coupon::{self, CouponType};
use crate::entities::gift_card;

use super::PromoCode;

/// Computes the discount a code grants against a cart total, in minor units.
///
/// Pure function, no I/O. The result never exceeds the cart total and is
/// never negative. Deterministic for a given (record, total) pair, so the
/// amount quoted at validation matches the amount applied at checkout as
/// long as the stored record has not changed in between.
pub fn compute_discount(promo: &PromoCode, cart_total: i64) -> i64 {
    match promo {
        PromoCode::GiftCard(card) => gift_card_discount(card, cart_total),
        PromoCode::Coupon(coupon) => coupon_discount(coupon, cart_total),
    }
}

/// A gift card covers as much of the order as its balance allows.
pub fn gift_card_discount(card: &gift_card::Model, cart_total: i64) -> i64 {
    card.remaining_amount.max(0).min(cart_total.max(0))
}

/// Percentage or fixed-amount discount, then the optional max-discount cap,
/// then clamped to the cart total.
pub fn coupon_discount(coupon: &coupon::Model, cart_total: i64) -> i64 {
    let cart_total = cart_total.max(0);

    let raw = match coupon.discount_type {
        CouponType::Percent => percent_of(cart_total, coupon.discount_value),
        CouponType::FixedAmount => coupon.discount_value.to_i64().unwrap_or(0),
    };

    let capped = match coupon.max_discount_amount {
        Some(cap) => raw.min(cap),
        None => raw,
    };

    capped.max(0).min(cart_total)
}

/// Percentage of an amount in minor units, rounded half-up to the nearest
/// minor unit.
fn percent_of(amount: i64, percent: Decimal) -> i64 {
    (Decimal::from(amount) * percent / Decimal::from(100))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(0)
}
