use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::handlers::common::{success_response, validate_input};
use crate::services::promotions::{CodeValidation, ValidateCodeInput};
use crate::services::redemptions::{ApplyCodeInput, ApplyOutcome};
use crate::{
    entities::{redemption, PromoCodeKind},
    errors::ServiceError,
    ApiResponse, AppState, ListQuery, PaginatedResponse,
};

/// Creates the router for promo code endpoints
pub fn promo_code_routes() -> Router<AppState> {
    Router::new()
        .route("/validate", post(validate_code))
        .route("/apply", post(apply_code))
        .route("/:code/redemptions", get(list_redemptions))
}

/// Validate a code against a cart without side effects
#[utoipa::path(
    post,
    path = "/api/v1/promo-codes/validate",
    summary = "Validate promo code",
    description = "Checks a gift card or coupon against a cart total and quotes the discount. Read-only; validation failures come back as a 200 payload with valid=false.",
    request_body = ValidateCodeRequest,
    responses(
        (status = 200, description = "Validation outcome", body = ValidateCodeResponse),
        (status = 400, description = "Malformed request", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Promo Codes"
)]
pub async fn validate_code(
    State(state): State<AppState>,
    Json(payload): Json<ValidateCodeRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let outcome = state
        .promotions
        .validate(ValidateCodeInput {
            code: payload.code,
            cart_total: payload.cart_total,
            user_id: payload.user_id,
            user_email: payload.user_email,
        })
        .await?;

    Ok(success_response(ValidateCodeResponse::from(outcome)))
}

/// Apply a code to a completed order
#[utoipa::path(
    post,
    path = "/api/v1/promo-codes/apply",
    summary = "Apply promo code",
    description = "Records a redemption and updates the code's balance or usage counter. Idempotent per (code, order_id): replays return the recorded result.",
    request_body = ApplyCodeRequest,
    responses(
        (status = 200, description = "Application outcome", body = ApplyCodeResponse),
        (status = 400, description = "Malformed request", body = crate::errors::ErrorResponse),
        (status = 409, description = "Concurrent update conflict", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Promo Codes"
)]
pub async fn apply_code(
    State(state): State<AppState>,
    Json(payload): Json<ApplyCodeRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let outcome = state
        .redemptions
        .apply(ApplyCodeInput {
            code: payload.code,
            order_id: payload.order_id,
            cart_total: payload.cart_total,
            user_id: payload.user_id,
            user_email: payload.user_email,
        })
        .await?;

    Ok(success_response(ApplyCodeResponse::from(outcome)))
}

/// Redemption history for a code
#[utoipa::path(
    get,
    path = "/api/v1/promo-codes/{code}/redemptions",
    summary = "List redemptions",
    description = "Paginated redemption history for a code, newest first",
    params(
        ("code" = String, Path, description = "Promo code"),
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page (default: 20)"),
    ),
    responses(
        (status = 200, description = "Redemptions retrieved", body = ApiResponse<PaginatedResponse<RedemptionResponse>>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Promo Codes"
)]
pub async fn list_redemptions(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (items, total) = state
        .promotions
        .list_redemptions(&code, query.page, query.limit)
        .await?;

    let items: Vec<RedemptionResponse> = items.into_iter().map(RedemptionResponse::from).collect();
    let total_pages = total.div_ceil(query.limit.max(1));

    Ok(success_response(ApiResponse::success(PaginatedResponse {
        items,
        total,
        page: query.page,
        limit: query.limit,
        total_pages,
    })))
}

// Request/Response DTOs

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ValidateCodeRequest {
    /// Code as typed by the buyer; normalized before lookup
    #[validate(length(min = 1))]
    pub code: String,
    /// Pre-discount order value in minor units
    #[validate(range(min = 0))]
    pub cart_total: i64,
    pub user_id: Option<Uuid>,
    #[validate(email)]
    pub user_email: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ApplyCodeRequest {
    #[validate(length(min = 1))]
    pub code: String,
    /// Identifier of the completed order; the idempotency key together with the code
    #[validate(length(min = 1))]
    pub order_id: String,
    #[validate(range(min = 0))]
    pub cart_total: i64,
    pub user_id: Option<Uuid>,
    #[validate(email)]
    pub user_email: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ValidateCodeResponse {
    pub valid: bool,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<PromoCodeKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_total: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_balance_after_use: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<CodeValidation> for ValidateCodeResponse {
    fn from(outcome: CodeValidation) -> Self {
        match outcome {
            CodeValidation::Valid(quote) => Self {
                valid: true,
                kind: Some(quote.kind),
                discount_amount: Some(quote.discount_amount),
                new_total: Some(quote.new_total),
                message: Some(quote.message),
                remaining_balance_after_use: quote.remaining_balance_after_use,
                error: None,
            },
            CodeValidation::Invalid { error } => Self {
                valid: false,
                kind: None,
                discount_amount: None,
                new_total: None,
                message: None,
                remaining_balance_after_use: None,
                error: Some(error),
            },
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApplyCodeResponse {
    pub success: bool,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<PromoCodeKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_applied: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_total: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_balance: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<ApplyOutcome> for ApplyCodeResponse {
    fn from(outcome: ApplyOutcome) -> Self {
        match outcome {
            ApplyOutcome::Applied(applied) => Self {
                success: true,
                kind: Some(applied.kind),
                discount_applied: Some(applied.discount_applied),
                new_total: Some(applied.new_total),
                remaining_balance: applied.remaining_balance,
                error: None,
            },
            ApplyOutcome::Rejected { error } => Self {
                success: false,
                kind: None,
                discount_applied: None,
                new_total: None,
                remaining_balance: None,
                error: Some(error),
            },
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RedemptionResponse {
    pub id: Uuid,
    pub code: String,
    #[serde(rename = "type")]
    pub kind: PromoCodeKind,
    pub order_id: String,
    pub user_id: Option<Uuid>,
    pub user_email: Option<String>,
    pub amount: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<redemption::Model> for RedemptionResponse {
    fn from(model: redemption::Model) -> Self {
        Self {
            id: model.id,
            code: model.code,
            kind: model.kind,
            order_id: model.order_id,
            user_id: model.user_id,
            user_email: model.user_email,
            amount: model.amount,
            created_at: model.created_at,
        }
    }
}
