use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Append-only record of a code applied to a completed order.
///
/// The unique index on `(code, order_id)` is the idempotency boundary:
/// replaying Apply for the same pair answers from this row instead of
/// touching the counters again. Rows are never updated or deleted.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "redemptions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub code: String,
    pub kind: PromoCodeKind,
    pub order_id: String,
    #[sea_orm(nullable)]
    pub user_id: Option<Uuid>,
    #[sea_orm(nullable)]
    pub user_email: Option<String>,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Which namespace a code resolved to. Serialized in API payloads exactly as
/// the checkout clients expect (`GIFTCARD` / `COUPON`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum PromoCodeKind {
    #[sea_orm(string_value = "GIFTCARD")]
    #[serde(rename = "GIFTCARD")]
    GiftCard,
    #[sea_orm(string_value = "COUPON")]
    #[serde(rename = "COUPON")]
    Coupon,
}
