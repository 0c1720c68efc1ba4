use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::coupon;
use crate::entities::gift_card::{self, GiftCardStatus};

/// Buyer identity used for per-user checks. When both fields are present the
/// user id wins; redemptions recorded by email only are matched by email.
#[derive(Debug, Clone, Default)]
pub struct Identity {
    pub user_id: Option<Uuid>,
    pub email: Option<String>,
}

impl Identity {
    pub fn new(user_id: Option<Uuid>, email: Option<String>) -> Self {
        Self { user_id, email }
    }

    /// Guest checkouts may arrive with no identity at all; per-user rules are
    /// then skipped entirely.
    pub fn is_present(&self) -> bool {
        self.user_id.is_some() || self.email.is_some()
    }
}

/// Outcome of the eligibility evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    Ineligible(IneligibleReason),
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Eligibility::Eligible)
    }
}

impl From<Result<(), IneligibleReason>> for Eligibility {
    fn from(result: Result<(), IneligibleReason>) -> Self {
        match result {
            Ok(()) => Eligibility::Eligible,
            Err(reason) => Eligibility::Ineligible(reason),
        }
    }
}

/// Why a code that exists may not be used right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IneligibleReason {
    GiftCardExpired,
    GiftCardDepleted,
    GiftCardBlocked,
    GiftCardNoBalance,
    CouponInactive,
    NotYetActive,
    Expired,
    BelowMinimum { minimum: i64 },
    UsageLimitReached,
    PerUserLimitReached,
    FirstPurchaseOnly,
}

impl IneligibleReason {
    /// Human-readable message surfaced to the checkout client.
    pub fn user_message(&self) -> String {
        match self {
            IneligibleReason::GiftCardExpired => "This gift card has expired.".to_string(),
            IneligibleReason::GiftCardDepleted => {
                "This gift card has been fully used.".to_string()
            }
            IneligibleReason::GiftCardBlocked => "This gift card is blocked.".to_string(),
            IneligibleReason::GiftCardNoBalance => {
                "This gift card has no remaining balance.".to_string()
            }
            IneligibleReason::CouponInactive => "This code is not active.".to_string(),
            IneligibleReason::NotYetActive => "This code is not active yet.".to_string(),
            IneligibleReason::Expired => "This code has expired.".to_string(),
            IneligibleReason::BelowMinimum { minimum } => format!(
                "The order total does not reach the minimum of {} required for this code.",
                minimum
            ),
            IneligibleReason::UsageLimitReached => {
                "This code has reached its usage limit.".to_string()
            }
            IneligibleReason::PerUserLimitReached => {
                "You have already used this code the maximum number of times.".to_string()
            }
            IneligibleReason::FirstPurchaseOnly => {
                "This code is only valid on a first purchase.".to_string()
            }
        }
    }
}

impl std::fmt::Display for IneligibleReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

/// Gift card checks, in order: stored status, authoritative expiration date,
/// remaining balance. The expiration date is checked even when the stored
/// status still reads `active`.
pub fn check_gift_card(
    card: &gift_card::Model,
    now: DateTime<Utc>,
) -> Result<(), IneligibleReason> {
    match card.status {
        GiftCardStatus::Active => {}
        GiftCardStatus::Depleted => return Err(IneligibleReason::GiftCardDepleted),
        GiftCardStatus::Expired => return Err(IneligibleReason::GiftCardExpired),
        GiftCardStatus::Blocked => return Err(IneligibleReason::GiftCardBlocked),
    }

    if let Some(expires_at) = card.expires_at {
        if expires_at < now {
            return Err(IneligibleReason::GiftCardExpired);
        }
    }

    if card.remaining_amount <= 0 {
        return Err(IneligibleReason::GiftCardNoBalance);
    }

    Ok(())
}

/// Coupon checks that need no redemption counts: active flag, date window,
/// minimum order amount, aggregate usage cap. Runs before any per-user count
/// queries so trivially ineligible codes never reach the database counters.
pub fn check_coupon_window(
    coupon: &coupon::Model,
    cart_total: i64,
    now: DateTime<Utc>,
) -> Result<(), IneligibleReason> {
    if !coupon.is_active {
        return Err(IneligibleReason::CouponInactive);
    }

    if let Some(starts_at) = coupon.starts_at {
        if now < starts_at {
            return Err(IneligibleReason::NotYetActive);
        }
    }

    if let Some(ends_at) = coupon.ends_at {
        if now > ends_at {
            return Err(IneligibleReason::Expired);
        }
    }

    if let Some(minimum) = coupon.min_order_amount {
        if cart_total < minimum {
            return Err(IneligibleReason::BelowMinimum { minimum });
        }
    }

    if let Some(limit) = coupon.usage_limit_total {
        if coupon.times_used >= limit {
            return Err(IneligibleReason::UsageLimitReached);
        }
    }

    Ok(())
}

/// Per-user cap against the identity's prior redemptions of this coupon.
pub fn check_per_user_limit(limit: i32, prior_uses: u64) -> Result<(), IneligibleReason> {
    if prior_uses >= limit.max(0) as u64 {
        return Err(IneligibleReason::PerUserLimitReached);
    }
    Ok(())
}

/// `firstPurchaseOnly` rule: any prior coupon redemption by this identity
/// disqualifies the code.
pub fn check_first_purchase(prior_redemptions: u64) -> Result<(), IneligibleReason> {
    if prior_redemptions > 0 {
        return Err(IneligibleReason::FirstPurchaseOnly);
    }
    Ok(())
}
