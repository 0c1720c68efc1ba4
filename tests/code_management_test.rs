mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{gift_card_fixture, TestApp};

#[tokio::test]
async fn issued_gift_card_is_immediately_redeemable() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post_json(
            "/api/v1/gift-cards",
            json!({ "code": "spring-gift", "amount": 20_000 }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    // Codes are stored normalized.
    assert_eq!(body["data"]["code"], json!("SPRING-GIFT"));
    assert_eq!(body["data"]["status"], json!("active"));
    assert_eq!(body["data"]["remaining_amount"], json!(20_000));

    let (_, quote) = app
        .post_json(
            "/api/v1/promo-codes/validate",
            json!({ "code": "SPRING-GIFT", "cart_total": 5_000 }),
        )
        .await;
    assert_eq!(quote["valid"], json!(true));
    assert_eq!(quote["discount_amount"], json!(5_000));
}

#[tokio::test]
async fn created_coupon_carries_its_rules() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post_json(
            "/api/v1/coupons",
            json!({
                "code": "WELCOME15",
                "discount_type": "percent",
                "discount_value": "15",
                "min_order_amount": 10_000,
                "usage_limit_per_user": 1,
                "conditions": { "firstPurchaseOnly": true },
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["code"], json!("WELCOME15"));
    assert_eq!(body["data"]["times_used"], json!(0));
    assert_eq!(body["data"]["is_active"], json!(true));

    // Below the minimum the coupon is refused.
    let (_, quote) = app
        .post_json(
            "/api/v1/promo-codes/validate",
            json!({ "code": "WELCOME15", "cart_total": 9_999 }),
        )
        .await;
    assert_eq!(quote["valid"], json!(false));

    // At the minimum it quotes 15%.
    let (_, quote) = app
        .post_json(
            "/api/v1/promo-codes/validate",
            json!({ "code": "WELCOME15", "cart_total": 10_000 }),
        )
        .await;
    assert_eq!(quote["valid"], json!(true));
    assert_eq!(quote["discount_amount"], json!(1_500));
}

#[tokio::test]
async fn duplicate_codes_are_rejected_across_namespaces() {
    let app = TestApp::new().await;
    app.insert_gift_card(gift_card_fixture("TAKEN", 1_000)).await;

    // Same code as an existing gift card.
    let (status, _) = app
        .post_json(
            "/api/v1/coupons",
            json!({
                "code": "TAKEN",
                "discount_type": "percent",
                "discount_value": "10",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // And gift cards cannot reuse it either.
    let (status, _) = app
        .post_json(
            "/api/v1/gift-cards",
            json!({ "code": "TAKEN", "amount": 5_000 }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn coupon_validation_rules_are_enforced_at_creation() {
    let app = TestApp::new().await;

    // Percentage over 100 makes no sense.
    let (status, _) = app
        .post_json(
            "/api/v1/coupons",
            json!({
                "code": "TOOBIG",
                "discount_type": "percent",
                "discount_value": "150",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Zero-value gift cards are refused.
    let (status, _) = app
        .post_json(
            "/api/v1/gift-cards",
            json!({ "code": "EMPTYCARD", "amount": 0 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_endpoints_return_404_for_unknown_codes() {
    let app = TestApp::new().await;

    let (status, _) = app.get_json("/api/v1/gift-cards/MISSING").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get_json("/api/v1/coupons/MISSING").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
