use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::handlers::common::{created_response, success_response, validate_input};
use crate::promo::CouponConditions;
use crate::services::promotions::CreateCouponInput;
use crate::{
    entities::{coupon, CouponType},
    errors::ServiceError,
    ApiResponse, AppState,
};

/// Creates the router for coupon endpoints
pub fn coupon_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_coupon))
        .route("/:code", get(get_coupon))
}

/// Create a coupon
#[utoipa::path(
    post,
    path = "/api/v1/coupons",
    summary = "Create coupon",
    description = "Creates a percentage or fixed-amount coupon. Monetary fields are minor units.",
    request_body = CreateCouponRequest,
    responses(
        (status = 201, description = "Coupon created", body = ApiResponse<CouponResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 409, description = "Code already exists", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Coupons"
)]
pub async fn create_coupon(
    State(state): State<AppState>,
    Json(payload): Json<CreateCouponRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let coupon = state
        .promotions
        .create_coupon(CreateCouponInput {
            code: payload.code,
            discount_type: payload.discount_type,
            discount_value: payload.discount_value,
            max_discount_amount: payload.max_discount_amount,
            min_order_amount: payload.min_order_amount,
            usage_limit_total: payload.usage_limit_total,
            usage_limit_per_user: payload.usage_limit_per_user,
            starts_at: payload.starts_at,
            ends_at: payload.ends_at,
            is_active: payload.is_active,
            conditions: payload.conditions,
        })
        .await?;

    Ok(created_response(ApiResponse::success(CouponResponse::from(
        coupon,
    ))))
}

/// Get a coupon by code
#[utoipa::path(
    get,
    path = "/api/v1/coupons/{code}",
    summary = "Get coupon",
    params(
        ("code" = String, Path, description = "Coupon code"),
    ),
    responses(
        (status = 200, description = "Coupon found", body = ApiResponse<CouponResponse>),
        (status = 404, description = "Coupon not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Coupons"
)]
pub async fn get_coupon(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let coupon = state.promotions.get_coupon(&code).await?;
    Ok(success_response(ApiResponse::success(CouponResponse::from(
        coupon,
    ))))
}

// Request/Response DTOs

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCouponRequest {
    #[validate(length(min = 2, max = 64))]
    pub code: String,
    pub discount_type: CouponType,
    /// Percentage (0-100) for percent coupons, minor units for fixed-amount
    pub discount_value: Decimal,
    #[validate(range(min = 1))]
    pub max_discount_amount: Option<i64>,
    #[validate(range(min = 1))]
    pub min_order_amount: Option<i64>,
    #[validate(range(min = 1))]
    pub usage_limit_total: Option<i32>,
    #[validate(range(min = 1))]
    pub usage_limit_per_user: Option<i32>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
    pub conditions: Option<CouponConditions>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CouponResponse {
    pub id: Uuid,
    pub code: String,
    pub is_active: bool,
    pub discount_type: CouponType,
    pub discount_value: Decimal,
    pub max_discount_amount: Option<i64>,
    pub min_order_amount: Option<i64>,
    pub usage_limit_total: Option<i32>,
    pub usage_limit_per_user: Option<i32>,
    pub times_used: i32,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<coupon::Model> for CouponResponse {
    fn from(model: coupon::Model) -> Self {
        Self {
            id: model.id,
            code: model.code,
            is_active: model.is_active,
            discount_type: model.discount_type,
            discount_value: model.discount_value,
            max_discount_amount: model.max_discount_amount,
            min_order_amount: model.min_order_amount,
            usage_limit_total: model.usage_limit_total,
            usage_limit_per_user: model.usage_limit_per_user,
            times_used: model.times_used,
            starts_at: model.starts_at,
            ends_at: model.ends_at,
            created_at: model.created_at,
        }
    }
}
