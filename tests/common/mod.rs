// Not every test binary uses every helper.
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use promotions_api::{
    config::AppConfig,
    db,
    entities::{coupon, gift_card, CouponType, GiftCardStatus},
    events::{self, EventSender},
    services::{PromotionService, RedemptionService},
    AppState,
};

/// Helper harness for spinning up an application state backed by an
/// in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        // Single connection so the in-memory database is shared across the app.
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");

        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let promotions =
            PromotionService::new(db_arc.clone(), Arc::new(event_sender.clone()));
        let redemptions = RedemptionService::new(
            db_arc.clone(),
            promotions.clone(),
            Arc::new(event_sender.clone()),
        );

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            promotions,
            redemptions,
        };

        let router = Router::new()
            .nest("/api/v1", promotions_api::api_v1_routes())
            .with_state(state.clone());

        Self {
            router,
            state,
            _event_task: event_task,
        }
    }

    /// POSTs a JSON body and returns (status, parsed response body).
    pub async fn post_json(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("failed to build request");

        self.send(request).await
    }

    /// GETs a path and returns (status, parsed response body).
    pub async fn get_json(&self, path: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::GET)
            .uri(path)
            .body(Body::empty())
            .expect("failed to build request");

        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("request failed");

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("response body is not JSON")
        };

        (status, body)
    }

    pub async fn insert_gift_card(&self, model: gift_card::ActiveModel) -> gift_card::Model {
        model
            .insert(&*self.state.db)
            .await
            .expect("failed to seed gift card")
    }

    pub async fn insert_coupon(&self, model: coupon::ActiveModel) -> coupon::Model {
        model
            .insert(&*self.state.db)
            .await
            .expect("failed to seed coupon")
    }
}

/// Active gift card fixture with the given balance; tests adjust fields
/// before inserting.
pub fn gift_card_fixture(code: &str, amount: i64) -> gift_card::ActiveModel {
    let now = Utc::now();
    gift_card::ActiveModel {
        id: Set(Uuid::new_v4()),
        code: Set(code.to_string()),
        status: Set(GiftCardStatus::Active),
        original_amount: Set(amount),
        remaining_amount: Set(amount),
        expires_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
}

/// Active coupon fixture with no window, caps, or conditions.
pub fn coupon_fixture(
    code: &str,
    discount_type: CouponType,
    discount_value: Decimal,
) -> coupon::ActiveModel {
    let now = Utc::now();
    coupon::ActiveModel {
        id: Set(Uuid::new_v4()),
        code: Set(code.to_string()),
        is_active: Set(true),
        starts_at: Set(None),
        ends_at: Set(None),
        discount_type: Set(discount_type),
        discount_value: Set(discount_value),
        max_discount_amount: Set(None),
        min_order_amount: Set(None),
        usage_limit_total: Set(None),
        usage_limit_per_user: Set(None),
        times_used: Set(0),
        conditions: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
}
