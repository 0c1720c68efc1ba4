use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prepaid gift card with a depletable balance in minor units.
///
/// The `code` column is stored upper-cased; lookups normalize input the same
/// way. `remaining_amount` only ever decreases and stays within
/// `0..=original_amount`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "gift_cards")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    pub status: GiftCardStatus,
    pub original_amount: i64,
    pub remaining_amount: i64,
    #[sea_orm(nullable)]
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Gift card lifecycle status. The stored status is advisory for expiration:
/// eligibility re-checks `expires_at` against the clock regardless of what
/// this column says.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum GiftCardStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "depleted")]
    Depleted,
    #[sea_orm(string_value = "expired")]
    Expired,
    #[sea_orm(string_value = "blocked")]
    Blocked,
}
