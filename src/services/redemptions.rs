use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, SqlErr, TransactionTrait,
};
use sea_orm::sea_query::Expr;
use serde::Deserialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    entities::{coupon, gift_card, redemption, Coupon, GiftCard, GiftCardStatus, PromoCodeKind, Redemption},
    errors::ServiceError,
    events::{Event, EventSender},
    promo::{self, normalize_code, Eligibility, Identity, PromoCode},
    services::promotions::{normalize_email, PromotionService, INVALID_CODE_MESSAGE},
};

/// Redemption recorder: the side-effecting application path, invoked once per
/// completed order.
///
/// The whole apply runs in one transaction. Counter changes are conditional
/// column-expression updates guarded on the current value, so two concurrent
/// checkouts can never overdraw a gift card or push a coupon past its cap;
/// the loser of the race gets a `Conflict`. The unique `(code, order_id)`
/// index plus a pre-insert replay check make the operation idempotent per
/// order: webhook retries get the recorded result back, not a second
/// decrement.
#[derive(Clone)]
pub struct RedemptionService {
    db: Arc<DatabaseConnection>,
    promotions: PromotionService,
    event_sender: Arc<EventSender>,
}

impl RedemptionService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        promotions: PromotionService,
        event_sender: Arc<EventSender>,
    ) -> Self {
        Self {
            db,
            promotions,
            event_sender,
        }
    }

    /// Applies a code to a completed order.
    ///
    /// The discount is re-derived from current persisted state; a quote from
    /// an earlier validation call is never trusted, since balances and
    /// counters may have moved in between.
    #[instrument(skip(self, input), fields(code = %input.code, order_id = %input.order_id))]
    pub async fn apply(&self, input: ApplyCodeInput) -> Result<ApplyOutcome, ServiceError> {
        let code = normalize_code(&input.code);
        if input.order_id.trim().is_empty() {
            return Err(ServiceError::InvalidInput(
                "order_id must not be empty".to_string(),
            ));
        }

        let identity = Identity::new(input.user_id, normalize_email(input.user_email.clone()));
        if !identity.is_present() {
            return Err(ServiceError::InvalidInput(
                "either user_id or user_email is required to apply a code".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        // Replay check: a second Apply for the same (code, order) answers
        // from the recorded redemption without touching any counter.
        if let Some(existing) = Redemption::find()
            .filter(redemption::Column::Code.eq(&code))
            .filter(redemption::Column::OrderId.eq(input.order_id.as_str()))
            .one(&txn)
            .await?
        {
            let applied = self
                .replayed_outcome(&txn, existing, input.cart_total)
                .await?;
            txn.commit().await?;
            info!("Replayed redemption for order {}", input.order_id);
            return Ok(ApplyOutcome::Applied(applied));
        }

        let Some(promo) = self.promotions.lookup_on(&txn, &code).await? else {
            txn.commit().await?;
            return Ok(ApplyOutcome::Rejected {
                error: INVALID_CODE_MESSAGE.to_string(),
            });
        };

        let now = Utc::now();
        match self
            .promotions
            .evaluate_on(&txn, &promo, input.cart_total, &identity, now)
            .await?
        {
            Eligibility::Ineligible(reason) => {
                txn.commit().await?;
                return Ok(ApplyOutcome::Rejected {
                    error: reason.user_message(),
                });
            }
            Eligibility::Eligible => {}
        }

        let amount = promo::compute_discount(&promo, input.cart_total);

        let (kind, remaining_balance) = match &promo {
            PromoCode::GiftCard(card) => {
                let remaining = self.debit_gift_card(&txn, card, amount).await?;
                (PromoCodeKind::GiftCard, Some(remaining))
            }
            PromoCode::Coupon(coupon) => {
                self.consume_coupon_use(&txn, coupon).await?;
                (PromoCodeKind::Coupon, None)
            }
        };

        let record = redemption::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(code.clone()),
            kind: Set(kind),
            order_id: Set(input.order_id.clone()),
            user_id: Set(identity.user_id),
            user_email: Set(identity.email.clone()),
            amount: Set(amount),
            created_at: Set(now),
        };

        let record = record.insert(&txn).await.map_err(|err| {
            if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                ServiceError::Conflict(
                    "A redemption for this order is already recorded".to_string(),
                )
            } else {
                ServiceError::DatabaseError(err)
            }
        })?;

        txn.commit().await?;

        match kind {
            PromoCodeKind::GiftCard => {
                let remaining = remaining_balance.unwrap_or(0);
                self.event_sender
                    .send_or_log(Event::GiftCardRedeemed {
                        code: code.clone(),
                        order_id: input.order_id.clone(),
                        amount,
                        remaining_balance: remaining,
                    })
                    .await;
                if remaining == 0 {
                    self.event_sender
                        .send_or_log(Event::GiftCardDepleted { code: code.clone() })
                        .await;
                }
            }
            PromoCodeKind::Coupon => {
                self.event_sender
                    .send_or_log(Event::CouponRedeemed {
                        code: code.clone(),
                        order_id: input.order_id.clone(),
                        amount,
                    })
                    .await;
            }
        }

        info!(
            "Applied code {} to order {}: discount={}",
            code, input.order_id, amount
        );

        Ok(ApplyOutcome::Applied(AppliedRedemption {
            kind,
            discount_applied: amount,
            new_total: (input.cart_total - amount).max(0),
            remaining_balance,
            replayed: false,
            redemption: record,
        }))
    }

    /// Builds the response for an idempotent replay from the stored record.
    async fn replayed_outcome<C: ConnectionTrait>(
        &self,
        conn: &C,
        existing: redemption::Model,
        cart_total: i64,
    ) -> Result<AppliedRedemption, ServiceError> {
        let remaining_balance = match existing.kind {
            PromoCodeKind::GiftCard => GiftCard::find()
                .filter(gift_card::Column::Code.eq(existing.code.as_str()))
                .one(conn)
                .await?
                .map(|card| card.remaining_amount),
            PromoCodeKind::Coupon => None,
        };

        Ok(AppliedRedemption {
            kind: existing.kind,
            discount_applied: existing.amount,
            new_total: (cart_total - existing.amount).max(0),
            remaining_balance,
            replayed: true,
            redemption: existing,
        })
    }

    /// Decrements a gift card balance with a guard on the current value and
    /// flips the card to depleted when the balance reaches zero.
    async fn debit_gift_card<C: ConnectionTrait>(
        &self,
        conn: &C,
        card: &gift_card::Model,
        amount: i64,
    ) -> Result<i64, ServiceError> {
        let now = Utc::now();
        let updated = GiftCard::update_many()
            .col_expr(
                gift_card::Column::RemainingAmount,
                Expr::col(gift_card::Column::RemainingAmount).sub(amount),
            )
            .col_expr(gift_card::Column::UpdatedAt, Expr::value(now))
            .filter(gift_card::Column::Id.eq(card.id))
            .filter(gift_card::Column::Status.eq(GiftCardStatus::Active))
            .filter(gift_card::Column::RemainingAmount.gte(amount))
            .exec(conn)
            .await?;

        if updated.rows_affected == 0 {
            warn!("Concurrent update lost on gift card {}", card.code);
            return Err(ServiceError::Conflict(
                "Gift card balance changed concurrently, please retry".to_string(),
            ));
        }

        let refreshed = GiftCard::find_by_id(card.id)
            .one(conn)
            .await?
            .ok_or_else(|| {
                ServiceError::InternalError(format!("Gift card {} vanished mid-apply", card.code))
            })?;

        let remaining = refreshed.remaining_amount;
        if remaining == 0 {
            let mut active: gift_card::ActiveModel = refreshed.into();
            active.status = Set(GiftCardStatus::Depleted);
            active.updated_at = Set(now);
            active.update(conn).await?;
        }

        Ok(remaining)
    }

    /// Increments a coupon's usage counter, refusing to pass the aggregate
    /// cap when one is set.
    async fn consume_coupon_use<C: ConnectionTrait>(
        &self,
        conn: &C,
        coupon: &coupon::Model,
    ) -> Result<(), ServiceError> {
        let mut update = Coupon::update_many()
            .col_expr(
                coupon::Column::TimesUsed,
                Expr::col(coupon::Column::TimesUsed).add(1),
            )
            .col_expr(coupon::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(coupon::Column::Id.eq(coupon.id));

        if let Some(limit) = coupon.usage_limit_total {
            update = update.filter(coupon::Column::TimesUsed.lt(limit));
        }

        let updated = update.exec(conn).await?;
        if updated.rows_affected == 0 {
            warn!("Concurrent update lost on coupon {}", coupon.code);
            return Err(ServiceError::Conflict(
                "Coupon usage limit reached concurrently, please retry".to_string(),
            ));
        }

        Ok(())
    }
}

/// Input for the application path
#[derive(Debug, Deserialize)]
pub struct ApplyCodeInput {
    pub code: String,
    pub order_id: String,
    pub cart_total: i64,
    pub user_id: Option<Uuid>,
    pub user_email: Option<String>,
}

/// Outcome of applying a code to an order
#[derive(Debug)]
pub enum ApplyOutcome {
    Applied(AppliedRedemption),
    Rejected { error: String },
}

/// A recorded (or replayed) redemption
#[derive(Debug)]
pub struct AppliedRedemption {
    pub kind: PromoCodeKind,
    pub discount_applied: i64,
    pub new_total: i64,
    pub remaining_balance: Option<i64>,
    pub replayed: bool,
    pub redemption: redemption::Model,
}
