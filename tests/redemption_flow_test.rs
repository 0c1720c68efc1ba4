mod common;

use axum::http::StatusCode;
use rust_decimal_macros::dec;
use sea_orm::Set;
use serde_json::json;
use uuid::Uuid;

use common::{coupon_fixture, gift_card_fixture, TestApp};
use promotions_api::entities::CouponType;

#[tokio::test]
async fn gift_card_apply_decrements_balance_and_depletes_at_zero() {
    let app = TestApp::new().await;
    app.insert_gift_card(gift_card_fixture("GC100", 10_000)).await;

    let (status, body) = app
        .post_json(
            "/api/v1/promo-codes/apply",
            json!({
                "code": "GC100",
                "order_id": "order-x",
                "cart_total": 15_000,
                "user_email": "buyer@example.com",
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["type"], json!("GIFTCARD"));
    assert_eq!(body["discount_applied"], json!(10_000));
    assert_eq!(body["new_total"], json!(5_000));
    assert_eq!(body["remaining_balance"], json!(0));

    let (_, card) = app.get_json("/api/v1/gift-cards/GC100").await;
    assert_eq!(card["data"]["remaining_amount"], json!(0));
    assert_eq!(card["data"]["status"], json!("depleted"));
}

#[tokio::test]
async fn gift_card_apply_twice_for_same_order_is_idempotent() {
    let app = TestApp::new().await;
    app.insert_gift_card(gift_card_fixture("GC100", 10_000)).await;

    let request = json!({
        "code": "GC100",
        "order_id": "order-x",
        "cart_total": 15_000,
        "user_email": "buyer@example.com",
    });

    let (_, first) = app.post_json("/api/v1/promo-codes/apply", request.clone()).await;
    let (status, second) = app.post_json("/api/v1/promo-codes/apply", request).await;

    // The replay returns the recorded result without a second decrement.
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["success"], json!(true));
    assert_eq!(second["discount_applied"], first["discount_applied"]);
    assert_eq!(second["remaining_balance"], json!(0));

    let (_, card) = app.get_json("/api/v1/gift-cards/GC100").await;
    assert_eq!(card["data"]["remaining_amount"], json!(0));

    let (_, history) = app.get_json("/api/v1/promo-codes/GC100/redemptions").await;
    assert_eq!(history["data"]["total"], json!(1));
}

#[tokio::test]
async fn gift_card_partial_use_keeps_card_active() {
    let app = TestApp::new().await;
    app.insert_gift_card(gift_card_fixture("GC100", 10_000)).await;

    let (_, body) = app
        .post_json(
            "/api/v1/promo-codes/apply",
            json!({
                "code": "GC100",
                "order_id": "order-1",
                "cart_total": 4_000,
                "user_email": "buyer@example.com",
            }),
        )
        .await;

    assert_eq!(body["discount_applied"], json!(4_000));
    assert_eq!(body["remaining_balance"], json!(6_000));

    let (_, card) = app.get_json("/api/v1/gift-cards/GC100").await;
    assert_eq!(card["data"]["status"], json!("active"));

    // A later order draws down the rest.
    let (_, body) = app
        .post_json(
            "/api/v1/promo-codes/apply",
            json!({
                "code": "GC100",
                "order_id": "order-2",
                "cart_total": 9_000,
                "user_email": "buyer@example.com",
            }),
        )
        .await;
    assert_eq!(body["discount_applied"], json!(6_000));
    assert_eq!(body["remaining_balance"], json!(0));
}

#[tokio::test]
async fn depleted_gift_card_rejects_new_orders() {
    let app = TestApp::new().await;
    app.insert_gift_card(gift_card_fixture("GC100", 3_000)).await;

    let (_, body) = app
        .post_json(
            "/api/v1/promo-codes/apply",
            json!({
                "code": "GC100",
                "order_id": "order-1",
                "cart_total": 5_000,
                "user_email": "buyer@example.com",
            }),
        )
        .await;
    assert_eq!(body["success"], json!(true));

    let (status, body) = app
        .post_json(
            "/api/v1/promo-codes/apply",
            json!({
                "code": "GC100",
                "order_id": "order-2",
                "cart_total": 5_000,
                "user_email": "buyer@example.com",
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(false));
    assert!(body["error"].as_str().unwrap().contains("fully used"));
}

#[tokio::test]
async fn coupon_apply_increments_usage_counter() {
    let app = TestApp::new().await;
    app.insert_coupon(coupon_fixture("SAVE10", CouponType::Percent, dec!(10)))
        .await;

    let (_, body) = app
        .post_json(
            "/api/v1/promo-codes/apply",
            json!({
                "code": "SAVE10",
                "order_id": "order-1",
                "cart_total": 20_000,
                "user_id": Uuid::new_v4(),
            }),
        )
        .await;

    assert_eq!(body["success"], json!(true));
    assert_eq!(body["type"], json!("COUPON"));
    assert_eq!(body["discount_applied"], json!(2_000));
    assert_eq!(body["new_total"], json!(18_000));
    assert!(body.get("remaining_balance").is_none());

    let (_, coupon) = app.get_json("/api/v1/coupons/SAVE10").await;
    assert_eq!(coupon["data"]["times_used"], json!(1));
}

#[tokio::test]
async fn coupon_total_usage_cap_blocks_later_orders() {
    let app = TestApp::new().await;
    let mut coupon = coupon_fixture("ONCE", CouponType::FixedAmount, dec!(1000));
    coupon.usage_limit_total = Set(Some(1));
    app.insert_coupon(coupon).await;

    let (_, first) = app
        .post_json(
            "/api/v1/promo-codes/apply",
            json!({
                "code": "ONCE",
                "order_id": "order-1",
                "cart_total": 5_000,
                "user_id": Uuid::new_v4(),
            }),
        )
        .await;
    assert_eq!(first["success"], json!(true));

    let (_, second) = app
        .post_json(
            "/api/v1/promo-codes/apply",
            json!({
                "code": "ONCE",
                "order_id": "order-2",
                "cart_total": 5_000,
                "user_id": Uuid::new_v4(),
            }),
        )
        .await;
    assert_eq!(second["success"], json!(false));
    assert!(second["error"].as_str().unwrap().contains("usage limit"));
}

#[tokio::test]
async fn per_user_cap_applies_across_orders() {
    let app = TestApp::new().await;
    let mut coupon = coupon_fixture("ONEEACH", CouponType::Percent, dec!(10));
    coupon.usage_limit_per_user = Set(Some(1));
    app.insert_coupon(coupon).await;

    let buyer = Uuid::new_v4();

    let (_, first) = app
        .post_json(
            "/api/v1/promo-codes/apply",
            json!({
                "code": "ONEEACH",
                "order_id": "order-1",
                "cart_total": 10_000,
                "user_id": buyer,
            }),
        )
        .await;
    assert_eq!(first["success"], json!(true));

    let (_, second) = app
        .post_json(
            "/api/v1/promo-codes/apply",
            json!({
                "code": "ONEEACH",
                "order_id": "order-2",
                "cart_total": 10_000,
                "user_id": buyer,
            }),
        )
        .await;
    assert_eq!(second["success"], json!(false));
    assert!(second["error"].as_str().unwrap().contains("already used"));
}

#[tokio::test]
async fn email_identity_matching_is_case_insensitive() {
    let app = TestApp::new().await;
    let mut coupon = coupon_fixture("ONEEACH", CouponType::Percent, dec!(10));
    coupon.usage_limit_per_user = Set(Some(1));
    app.insert_coupon(coupon).await;

    let (_, first) = app
        .post_json(
            "/api/v1/promo-codes/apply",
            json!({
                "code": "ONEEACH",
                "order_id": "order-1",
                "cart_total": 10_000,
                "user_email": "Buyer@Example.com",
            }),
        )
        .await;
    assert_eq!(first["success"], json!(true));

    let (_, second) = app
        .post_json(
            "/api/v1/promo-codes/apply",
            json!({
                "code": "ONEEACH",
                "order_id": "order-2",
                "cart_total": 10_000,
                "user_email": "buyer@example.com",
            }),
        )
        .await;
    assert_eq!(second["success"], json!(false));
}

#[tokio::test]
async fn apply_requires_an_identity() {
    let app = TestApp::new().await;
    app.insert_coupon(coupon_fixture("SAVE10", CouponType::Percent, dec!(10)))
        .await;

    let (status, _) = app
        .post_json(
            "/api/v1/promo-codes/apply",
            json!({
                "code": "SAVE10",
                "order_id": "order-1",
                "cart_total": 10_000,
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn apply_rejects_unknown_codes_without_leaking_namespace() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post_json(
            "/api/v1/promo-codes/apply",
            json!({
                "code": "NOSUCHCODE",
                "order_id": "order-1",
                "cart_total": 10_000,
                "user_email": "buyer@example.com",
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("This code is not valid."));
}

#[tokio::test]
async fn apply_rederives_discount_from_current_state() {
    let app = TestApp::new().await;
    app.insert_gift_card(gift_card_fixture("GC100", 10_000)).await;

    // Another checkout drains most of the card between validate and apply.
    let (_, quote) = app
        .post_json(
            "/api/v1/promo-codes/validate",
            json!({ "code": "GC100", "cart_total": 8_000 }),
        )
        .await;
    assert_eq!(quote["discount_amount"], json!(8_000));

    let (_, other) = app
        .post_json(
            "/api/v1/promo-codes/apply",
            json!({
                "code": "GC100",
                "order_id": "order-other",
                "cart_total": 9_000,
                "user_email": "other@example.com",
            }),
        )
        .await;
    assert_eq!(other["discount_applied"], json!(9_000));

    // The original order now gets only what is left, not the stale quote.
    let (_, body) = app
        .post_json(
            "/api/v1/promo-codes/apply",
            json!({
                "code": "GC100",
                "order_id": "order-mine",
                "cart_total": 8_000,
                "user_email": "buyer@example.com",
            }),
        )
        .await;
    assert_eq!(body["discount_applied"], json!(1_000));
    assert_eq!(body["remaining_balance"], json!(0));
}

#[tokio::test]
async fn redemption_history_lists_newest_first() {
    let app = TestApp::new().await;
    app.insert_gift_card(gift_card_fixture("GC100", 10_000)).await;

    for order in ["order-1", "order-2"] {
        let (_, body) = app
            .post_json(
                "/api/v1/promo-codes/apply",
                json!({
                    "code": "GC100",
                    "order_id": order,
                    "cart_total": 3_000,
                    "user_email": "buyer@example.com",
                }),
            )
            .await;
        assert_eq!(body["success"], json!(true));
    }

    let (status, body) = app.get_json("/api/v1/promo-codes/GC100/redemptions").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], json!(2));
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|r| r["code"] == json!("GC100")));
}

#[tokio::test]
async fn empty_order_id_is_a_bad_request() {
    let app = TestApp::new().await;

    let (status, _) = app
        .post_json(
            "/api/v1/promo-codes/apply",
            json!({
                "code": "ANY",
                "order_id": "",
                "cart_total": 1_000,
                "user_email": "buyer@example.com",
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}
