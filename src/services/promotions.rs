use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    entities::{
        coupon, gift_card, redemption, Coupon, CouponType, GiftCard, GiftCardStatus,
        PromoCodeKind, Redemption,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    promo::{
        self, eligibility, normalize_code, CouponConditions, Eligibility, Identity, PromoCode,
    },
};

/// Message surfaced when a code matches neither namespace. Deliberately does
/// not reveal whether the gift-card or coupon table was searched.
pub const INVALID_CODE_MESSAGE: &str = "This code is not valid.";

/// Promotion code service: lookup, eligibility evaluation, and the read-only
/// validation path shared with checkout, plus gift-card issuance and coupon
/// creation for the seller console.
#[derive(Clone)]
pub struct PromotionService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl PromotionService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Resolves a raw code string to a gift card or coupon.
    ///
    /// Gift cards are searched first: when the same code exists in both
    /// namespaces the gift card wins. A miss in both tables is a normal
    /// outcome, not an error.
    #[instrument(skip(self))]
    pub async fn lookup(&self, raw_code: &str) -> Result<Option<PromoCode>, ServiceError> {
        self.lookup_on(&*self.db, raw_code).await
    }

    /// Lookup over an explicit connection so the apply path can resolve the
    /// code inside its transaction.
    pub(crate) async fn lookup_on<C: ConnectionTrait>(
        &self,
        conn: &C,
        raw_code: &str,
    ) -> Result<Option<PromoCode>, ServiceError> {
        let code = normalize_code(raw_code);
        if code.is_empty() {
            return Ok(None);
        }

        if let Some(card) = GiftCard::find()
            .filter(gift_card::Column::Code.eq(&code))
            .one(conn)
            .await?
        {
            return Ok(Some(PromoCode::GiftCard(card)));
        }

        if let Some(coupon) = Coupon::find()
            .filter(coupon::Column::Code.eq(&code))
            .one(conn)
            .await?
        {
            return Ok(Some(PromoCode::Coupon(coupon)));
        }

        Ok(None)
    }

    /// Runs the full eligibility pipeline for a resolved code.
    ///
    /// Flag and date checks run first; the redemption-count queries behind
    /// per-user caps and the first-purchase rule only run when the coupon
    /// actually carries those rules and an identity was supplied. Guest
    /// checkouts without identity skip the per-user dimensions entirely.
    pub(crate) async fn evaluate_on<C: ConnectionTrait>(
        &self,
        conn: &C,
        promo: &PromoCode,
        cart_total: i64,
        identity: &Identity,
        now: DateTime<Utc>,
    ) -> Result<Eligibility, ServiceError> {
        match promo {
            PromoCode::GiftCard(card) => Ok(eligibility::check_gift_card(card, now).into()),
            PromoCode::Coupon(coupon) => {
                if let Err(reason) = eligibility::check_coupon_window(coupon, cart_total, now) {
                    return Ok(Eligibility::Ineligible(reason));
                }

                if let Some(limit) = coupon.usage_limit_per_user {
                    if identity.is_present() {
                        let prior = self
                            .count_redemptions(conn, Some(&coupon.code), identity)
                            .await?;
                        if let Err(reason) = eligibility::check_per_user_limit(limit, prior) {
                            return Ok(Eligibility::Ineligible(reason));
                        }
                    }
                }

                let conditions = CouponConditions::parse(coupon.conditions.as_ref());
                if conditions.first_purchase_only && identity.is_present() {
                    let prior = self.count_redemptions(conn, None, identity).await?;
                    if let Err(reason) = eligibility::check_first_purchase(prior) {
                        return Ok(Eligibility::Ineligible(reason));
                    }
                }

                Ok(Eligibility::Eligible)
            }
        }
    }

    /// Counts prior redemptions by an identity, optionally restricted to one
    /// coupon code. The user id is authoritative when present; redemptions
    /// recorded by email only are matched by email.
    async fn count_redemptions<C: ConnectionTrait>(
        &self,
        conn: &C,
        code: Option<&str>,
        identity: &Identity,
    ) -> Result<u64, ServiceError> {
        let mut query = Redemption::find();

        if let Some(code) = code {
            query = query.filter(redemption::Column::Code.eq(code));
        } else {
            // First-purchase counts look across coupons only; gift-card use
            // does not make a buyer a repeat customer.
            query = query.filter(redemption::Column::Kind.eq(PromoCodeKind::Coupon));
        }

        query = match (&identity.user_id, &identity.email) {
            (Some(user_id), _) => query.filter(redemption::Column::UserId.eq(*user_id)),
            (None, Some(email)) => query.filter(redemption::Column::UserEmail.eq(email.clone())),
            (None, None) => return Ok(0),
        };

        Ok(query.count(conn).await?)
    }

    /// Read-only validation path: quotes the discount a code would grant
    /// against the given cart. Never mutates state, so it is always safe to
    /// retry.
    #[instrument(skip(self, input), fields(code = %input.code))]
    pub async fn validate(&self, input: ValidateCodeInput) -> Result<CodeValidation, ServiceError> {
        let identity = Identity::new(input.user_id, normalize_email(input.user_email));

        let Some(promo) = self.lookup(&input.code).await? else {
            return Ok(CodeValidation::Invalid {
                error: INVALID_CODE_MESSAGE.to_string(),
            });
        };

        let now = Utc::now();
        match self
            .evaluate_on(&*self.db, &promo, input.cart_total, &identity, now)
            .await?
        {
            Eligibility::Ineligible(reason) => Ok(CodeValidation::Invalid {
                error: reason.user_message(),
            }),
            Eligibility::Eligible => {
                let discount_amount = promo::compute_discount(&promo, input.cart_total);
                let quote = QuotedDiscount::new(&promo, input.cart_total, discount_amount);
                info!(
                    "Validated code {}: kind={:?}, discount={}",
                    promo.code(),
                    quote.kind,
                    discount_amount
                );
                Ok(CodeValidation::Valid(quote))
            }
        }
    }

    /// Issues a gift card. Issuance proper lives in the seller console; this
    /// covers the service side of that flow.
    #[instrument(skip(self, input), fields(code = %input.code))]
    pub async fn create_gift_card(
        &self,
        input: CreateGiftCardInput,
    ) -> Result<gift_card::Model, ServiceError> {
        let code = normalize_code(&input.code);
        if code.is_empty() {
            return Err(ServiceError::ValidationError(
                "gift card code must not be empty".to_string(),
            ));
        }
        if input.amount <= 0 {
            return Err(ServiceError::ValidationError(
                "gift card amount must be positive".to_string(),
            ));
        }

        // Codes share one namespace across both tables.
        if self.lookup(&code).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Code {} already exists",
                code
            )));
        }

        let now = Utc::now();
        let card = gift_card::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(code),
            status: Set(GiftCardStatus::Active),
            original_amount: Set(input.amount),
            remaining_amount: Set(input.amount),
            expires_at: Set(input.expires_at),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let card = card.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::GiftCardIssued(card.id))
            .await;

        info!("Issued gift card {} for {}", card.code, card.original_amount);
        Ok(card)
    }

    /// Creates a coupon.
    #[instrument(skip(self, input), fields(code = %input.code))]
    pub async fn create_coupon(
        &self,
        input: CreateCouponInput,
    ) -> Result<coupon::Model, ServiceError> {
        let code = normalize_code(&input.code);
        if code.is_empty() {
            return Err(ServiceError::ValidationError(
                "coupon code must not be empty".to_string(),
            ));
        }

        match input.discount_type {
            CouponType::Percent => {
                if input.discount_value <= Decimal::ZERO
                    || input.discount_value > Decimal::from(100)
                {
                    return Err(ServiceError::ValidationError(
                        "percentage discounts must be between 0 and 100".to_string(),
                    ));
                }
            }
            CouponType::FixedAmount => {
                if input.discount_value <= Decimal::ZERO {
                    return Err(ServiceError::ValidationError(
                        "fixed discounts must be positive".to_string(),
                    ));
                }
            }
        }

        if self.lookup(&code).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Code {} already exists",
                code
            )));
        }

        let conditions = input
            .conditions
            .map(|c| serde_json::to_value(c))
            .transpose()
            .map_err(|e| ServiceError::InternalError(format!("Failed to encode conditions: {e}")))?;

        let now = Utc::now();
        let coupon = coupon::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(code),
            is_active: Set(input.is_active.unwrap_or(true)),
            starts_at: Set(input.starts_at),
            ends_at: Set(input.ends_at),
            discount_type: Set(input.discount_type),
            discount_value: Set(input.discount_value),
            max_discount_amount: Set(input.max_discount_amount),
            min_order_amount: Set(input.min_order_amount),
            usage_limit_total: Set(input.usage_limit_total),
            usage_limit_per_user: Set(input.usage_limit_per_user),
            times_used: Set(0),
            conditions: Set(conditions),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let coupon = coupon.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CouponCreated(coupon.id))
            .await;

        info!("Created coupon {}", coupon.code);
        Ok(coupon)
    }

    pub async fn get_gift_card(&self, raw_code: &str) -> Result<gift_card::Model, ServiceError> {
        let code = normalize_code(raw_code);
        GiftCard::find()
            .filter(gift_card::Column::Code.eq(&code))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Gift card {} not found", code)))
    }

    pub async fn get_coupon(&self, raw_code: &str) -> Result<coupon::Model, ServiceError> {
        let code = normalize_code(raw_code);
        Coupon::find()
            .filter(coupon::Column::Code.eq(&code))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Coupon {} not found", code)))
    }

    /// Redemption history for a code, newest first.
    pub async fn list_redemptions(
        &self,
        raw_code: &str,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<redemption::Model>, u64), ServiceError> {
        let code = normalize_code(raw_code);
        let paginator = Redemption::find()
            .filter(redemption::Column::Code.eq(&code))
            .order_by_desc(redemption::Column::CreatedAt)
            .paginate(&*self.db, per_page.max(1));

        let total = paginator.num_items().await?;
        let data = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((data, total))
    }
}

/// Lower-cases and trims an email so per-user counts match regardless of how
/// the checkout form capitalized it.
pub(crate) fn normalize_email(email: Option<String>) -> Option<String> {
    email
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
}

/// Input for the validation path
#[derive(Debug, Deserialize)]
pub struct ValidateCodeInput {
    pub code: String,
    pub cart_total: i64,
    pub user_id: Option<Uuid>,
    pub user_email: Option<String>,
}

/// Outcome of validating a code against a cart
#[derive(Debug, Clone)]
pub enum CodeValidation {
    Valid(QuotedDiscount),
    Invalid { error: String },
}

/// A quoted discount for an eligible code
#[derive(Debug, Clone, Serialize)]
pub struct QuotedDiscount {
    pub kind: PromoCodeKind,
    pub discount_amount: i64,
    pub new_total: i64,
    pub message: String,
    pub remaining_balance_after_use: Option<i64>,
}

impl QuotedDiscount {
    fn new(promo: &PromoCode, cart_total: i64, discount_amount: i64) -> Self {
        let new_total = (cart_total - discount_amount).max(0);
        match promo {
            PromoCode::GiftCard(card) => Self {
                kind: PromoCodeKind::GiftCard,
                discount_amount,
                new_total,
                message: format!("Gift card accepted: {} will be deducted.", discount_amount),
                remaining_balance_after_use: Some(card.remaining_amount - discount_amount),
            },
            PromoCode::Coupon(_) => Self {
                kind: PromoCodeKind::Coupon,
                discount_amount,
                new_total,
                message: format!("Coupon accepted: {} off.", discount_amount),
                remaining_balance_after_use: None,
            },
        }
    }
}

/// Input for issuing a gift card
#[derive(Debug, Deserialize)]
pub struct CreateGiftCardInput {
    pub code: String,
    pub amount: i64,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Input for creating a coupon
#[derive(Debug, Deserialize)]
pub struct CreateCouponInput {
    pub code: String,
    pub discount_type: CouponType,
    pub discount_value: Decimal,
    pub max_discount_amount: Option<i64>,
    pub min_order_amount: Option<i64>,
    pub usage_limit_total: Option<i32>,
    pub usage_limit_per_user: Option<i32>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
    pub conditions: Option<CouponConditions>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_normalization() {
        assert_eq!(
            normalize_email(Some("  Buyer@Example.COM ".to_string())),
            Some("buyer@example.com".to_string())
        );
        assert_eq!(normalize_email(Some("   ".to_string())), None);
        assert_eq!(normalize_email(None), None);
    }

    #[test]
    fn quoted_discount_for_gift_card_reports_remaining_balance() {
        let card = gift_card::Model {
            id: Uuid::new_v4(),
            code: "GC100".to_string(),
            status: GiftCardStatus::Active,
            original_amount: 10_000,
            remaining_amount: 10_000,
            expires_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let promo = PromoCode::GiftCard(card);

        let quote = QuotedDiscount::new(&promo, 15_000, 10_000);
        assert_eq!(quote.kind, PromoCodeKind::GiftCard);
        assert_eq!(quote.discount_amount, 10_000);
        assert_eq!(quote.new_total, 5_000);
        assert_eq!(quote.remaining_balance_after_use, Some(0));
    }
}
