use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Promotions API",
        version = "0.1.0",
        description = r#"
# Promotion Redemption Service

Validates promotional codes (gift cards and coupons) against carts and
records redemptions at checkout.

## Concepts

- **Gift card**: prepaid code with a depletable balance, tracked in minor units
- **Coupon**: reusable code granting a percentage or fixed discount, subject to usage caps and conditions
- **Redemption**: immutable record of a code applied to a specific order

## Idempotency

`POST /promo-codes/apply` is idempotent per `(code, order_id)`: replaying the
call (e.g., a retried payment webhook) returns the recorded result without a
second balance decrement.

## Money

All monetary values are integers in minor units (e.g., cents).
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Promo Codes", description = "Validation and redemption endpoints"),
        (name = "Gift Cards", description = "Gift card issuance and inspection"),
        (name = "Coupons", description = "Coupon creation and inspection"),
    ),
    paths(
        crate::handlers::promo_codes::validate_code,
        crate::handlers::promo_codes::apply_code,
        crate::handlers::promo_codes::list_redemptions,
        crate::handlers::gift_cards::create_gift_card,
        crate::handlers::gift_cards::get_gift_card,
        crate::handlers::coupons::create_coupon,
        crate::handlers::coupons::get_coupon,
    ),
    components(
        schemas(
            // Common types
            crate::ApiResponse<serde_json::Value>,
            crate::PaginatedResponse<serde_json::Value>,

            crate::handlers::promo_codes::ValidateCodeRequest,
            crate::handlers::promo_codes::ValidateCodeResponse,
            crate::handlers::promo_codes::ApplyCodeRequest,
            crate::handlers::promo_codes::ApplyCodeResponse,
            crate::handlers::promo_codes::RedemptionResponse,
            crate::handlers::gift_cards::CreateGiftCardRequest,
            crate::handlers::gift_cards::GiftCardResponse,
            crate::handlers::coupons::CreateCouponRequest,
            crate::handlers::coupons::CouponResponse,
            crate::entities::PromoCodeKind,
            crate::entities::GiftCardStatus,
            crate::entities::CouponType,
            crate::promo::CouponConditions,
            crate::errors::ErrorResponse,
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_includes_core_paths() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string(&openapi).unwrap();
        assert!(json.contains("Promotions API"));
        assert!(json.contains("/api/v1/promo-codes/validate"));
        assert!(json.contains("/api/v1/promo-codes/apply"));
    }
}
