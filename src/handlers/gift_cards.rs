use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::handlers::common::{created_response, success_response, validate_input};
use crate::services::promotions::CreateGiftCardInput;
use crate::{
    entities::{gift_card, GiftCardStatus},
    errors::ServiceError,
    ApiResponse, AppState,
};

/// Creates the router for gift card endpoints
pub fn gift_card_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_gift_card))
        .route("/:code", get(get_gift_card))
}

/// Issue a gift card
#[utoipa::path(
    post,
    path = "/api/v1/gift-cards",
    summary = "Issue gift card",
    description = "Creates an active gift card with the given balance in minor units",
    request_body = CreateGiftCardRequest,
    responses(
        (status = 201, description = "Gift card issued", body = ApiResponse<GiftCardResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 409, description = "Code already exists", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Gift Cards"
)]
pub async fn create_gift_card(
    State(state): State<AppState>,
    Json(payload): Json<CreateGiftCardRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let card = state
        .promotions
        .create_gift_card(CreateGiftCardInput {
            code: payload.code,
            amount: payload.amount,
            expires_at: payload.expires_at,
        })
        .await?;

    Ok(created_response(ApiResponse::success(
        GiftCardResponse::from(card),
    )))
}

/// Get a gift card by code
#[utoipa::path(
    get,
    path = "/api/v1/gift-cards/{code}",
    summary = "Get gift card",
    params(
        ("code" = String, Path, description = "Gift card code"),
    ),
    responses(
        (status = 200, description = "Gift card found", body = ApiResponse<GiftCardResponse>),
        (status = 404, description = "Gift card not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Gift Cards"
)]
pub async fn get_gift_card(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let card = state.promotions.get_gift_card(&code).await?;
    Ok(success_response(ApiResponse::success(
        GiftCardResponse::from(card),
    )))
}

// Request/Response DTOs

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateGiftCardRequest {
    #[validate(length(min = 4, max = 64))]
    pub code: String,
    /// Balance in minor units
    #[validate(range(min = 1))]
    pub amount: i64,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GiftCardResponse {
    pub id: Uuid,
    pub code: String,
    pub status: GiftCardStatus,
    pub original_amount: i64,
    pub remaining_amount: i64,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<gift_card::Model> for GiftCardResponse {
    fn from(model: gift_card::Model) -> Self {
        Self {
            id: model.id,
            code: model.code,
            status: model.status,
            original_amount: model.original_amount,
            remaining_amount: model.remaining_amount,
            expires_at: model.expires_at,
            created_at: model.created_at,
        }
    }
}
