//! Promotion domain logic shared by the validation and application paths.
//!
//! Everything in this module is pure: eligibility rules and discount
//! arithmetic take already-loaded records plus the clock and cart total, so
//! the read-only quote and the transactional apply run exactly the same
//! checks on the same inputs.

pub mod discount;
pub mod eligibility;

use serde::{Deserialize, Serialize};

use crate::entities::{coupon, gift_card, PromoCodeKind};

pub use discount::compute_discount;
pub use eligibility::{Eligibility, Identity, IneligibleReason};

/// Normalizes a raw user-supplied code: surrounding whitespace trimmed,
/// upper-cased. Codes are stored and compared in this form.
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// A promotional code record: a prepaid gift card or a reusable coupon.
///
/// Both variants flow through the same lookup -> eligibility -> discount
/// pipeline and differ only in field shape and rule set.
#[derive(Debug, Clone)]
pub enum PromoCode {
    GiftCard(gift_card::Model),
    Coupon(coupon::Model),
}

impl PromoCode {
    pub fn code(&self) -> &str {
        match self {
            PromoCode::GiftCard(card) => &card.code,
            PromoCode::Coupon(coupon) => &coupon.code,
        }
    }

    pub fn kind(&self) -> PromoCodeKind {
        match self {
            PromoCode::GiftCard(_) => PromoCodeKind::GiftCard,
            PromoCode::Coupon(_) => PromoCodeKind::Coupon,
        }
    }
}

/// Named boolean rules attached to a coupon.
///
/// Stored as JSON so new rule names can ship without a schema change;
/// unknown keys deserialize away silently. The only rule currently
/// evaluated is `firstPurchaseOnly`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct CouponConditions {
    pub first_purchase_only: bool,
}

impl CouponConditions {
    /// Parses the `conditions` column, treating an absent or malformed value
    /// as "no conditions".
    pub fn parse(value: Option<&serde_json::Value>) -> Self {
        value
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_uppercases() {
        assert_eq!(normalize_code("  gc100 \n"), "GC100");
        assert_eq!(normalize_code("Save20"), "SAVE20");
        assert_eq!(normalize_code(""), "");
    }

    #[test]
    fn conditions_parse_first_purchase_only() {
        let value = serde_json::json!({ "firstPurchaseOnly": true });
        let conditions = CouponConditions::parse(Some(&value));
        assert!(conditions.first_purchase_only);
    }

    #[test]
    fn conditions_default_when_absent_or_unknown() {
        assert_eq!(CouponConditions::parse(None), CouponConditions::default());

        // Unknown rule names are carried in the column but not evaluated.
        let value = serde_json::json!({ "someFutureRule": true });
        let conditions = CouponConditions::parse(Some(&value));
        assert!(!conditions.first_purchase_only);
    }
}
