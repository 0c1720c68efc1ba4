use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reusable promotional code granting a percentage or fixed-amount discount.
///
/// Monetary columns (`min_order_amount`, `max_discount_amount`) are integer
/// minor units. `discount_value` is a decimal so percentage coupons can carry
/// fractional rates; fixed-amount coupons store whole minor units in it.
/// `conditions` is an open set of named boolean rules stored as JSON.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "coupons")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    pub is_active: bool,
    #[sea_orm(nullable)]
    pub starts_at: Option<DateTime<Utc>>,
    #[sea_orm(nullable)]
    pub ends_at: Option<DateTime<Utc>>,
    pub discount_type: CouponType,
    pub discount_value: Decimal,
    #[sea_orm(nullable)]
    pub max_discount_amount: Option<i64>,
    #[sea_orm(nullable)]
    pub min_order_amount: Option<i64>,
    #[sea_orm(nullable)]
    pub usage_limit_total: Option<i32>,
    #[sea_orm(nullable)]
    pub usage_limit_per_user: Option<i32>,
    pub times_used: i32,
    #[sea_orm(column_type = "Json", nullable)]
    pub conditions: Option<Json>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum CouponType {
    #[sea_orm(string_value = "percent")]
    Percent,
    #[sea_orm(string_value = "fixed_amount")]
    FixedAmount,
}
