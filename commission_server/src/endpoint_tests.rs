//! Endpoint tests against a file-backed test database.
//!
//! Each test spins up its own store via the engine's test utilities and exercises the routes through
//! `actix_web::test`, so the full path from HTTP payload to SQLite row is covered.
use actix_web::{http::StatusCode, test, test::TestRequest, web, App};
use commission_engine::{
    events::EventProducers,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    MerchantApi,
    OrderFlowApi,
    PayoutApi,
    SqliteDatabase,
};
use serde_json::{json, Value};

use crate::{
    data_objects::JsonResponse,
    routes::{health, merchant_by_email, order_created_webhook, order_stats, payout, register_merchant, update_merchant},
};

async fn new_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

/// Builds a test service with the same route table as the real server. The `App` type cannot be named, so this is
/// a macro rather than a function.
macro_rules! test_service {
    ($db:expr) => {{
        let orders_api = OrderFlowApi::new($db.clone());
        let merchants_api = MerchantApi::new($db.clone());
        let payouts_api = PayoutApi::new($db.clone(), EventProducers::default());
        test::init_service(
            App::new()
                .app_data(web::Data::new(orders_api))
                .app_data(web::Data::new(merchants_api))
                .app_data(web::Data::new(payouts_api))
                .service(health)
                .route("/webhook/order_created", web::post().to(order_created_webhook::<SqliteDatabase>))
                .service(
                    web::scope("/api")
                        .route("/merchants", web::post().to(register_merchant::<SqliteDatabase>))
                        .route("/merchants", web::get().to(merchant_by_email::<SqliteDatabase>))
                        .route("/merchants/{user_id}", web::post().to(update_merchant::<SqliteDatabase>))
                        .route("/orders/stats", web::get().to(order_stats::<SqliteDatabase>))
                        .route("/payouts/{affiliate_id}", web::post().to(payout::<SqliteDatabase>)),
                ),
        )
        .await
    }};
}

fn order_payload(order_id: &str, subtotal: f64) -> Value {
    json!({
        "order_id": order_id,
        "subtotal": subtotal,
        "domain": "shop.example.com",
        "discount_code": "SAVE10",
        "commission_rate": 12.5,
        "email": "affiliate@example.com",
        "name": "Jo Affiliate",
    })
}

#[actix_web::test]
async fn health_check() {
    let db = new_db().await;
    let service = test_service!(db);
    let req = TestRequest::get().uri("/health").to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[actix_web::test]
async fn the_webhook_acknowledges_new_and_replayed_orders() {
    let db = new_db().await;
    let service = test_service!(db.clone());

    let req = TestRequest::post().uri("/webhook/order_created").set_json(order_payload("wh-1", 200.0)).to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: JsonResponse = test::read_body_json(res).await;
    assert!(body.success);
    assert!(body.message.contains("$20.00"), "got: {}", body.message);

    // A replayed delivery is acknowledged, not retried, and writes nothing.
    let req = TestRequest::post().uri("/webhook/order_created").set_json(order_payload("wh-1", 999.0)).to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: JsonResponse = test::read_body_json(res).await;
    assert!(body.success);
    assert_eq!(body.message, "Order already processed.");
    let (commissions,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM commissions").fetch_one(db.pool()).await.unwrap();
    assert_eq!(commissions, 1);
}

#[actix_web::test]
async fn undeserializable_webhook_bodies_are_rejected() {
    let db = new_db().await;
    let service = test_service!(db);
    let req = TestRequest::post()
        .uri("/webhook/order_created")
        .insert_header(("content-type", "application/json"))
        .set_payload("not json at all")
        .to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(res).await;
    assert!(body["error"].as_str().unwrap().contains("Could not read request body"));
}

#[actix_web::test]
async fn bad_webhook_payloads_still_get_a_200() {
    let db = new_db().await;
    let service = test_service!(db);
    let mut payload = order_payload("", 10.0);
    payload["order_id"] = json!("  ");
    let req = TestRequest::post().uri("/webhook/order_created").set_json(payload).to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: JsonResponse = test::read_body_json(res).await;
    assert!(!body.success);
}

#[actix_web::test]
async fn merchants_can_be_registered_and_looked_up() {
    let db = new_db().await;
    let service = test_service!(db);
    let registration = json!({
        "domain": "shop.example.com",
        "name": "Example Shop",
        "email": "owner@example.com",
        "api_key": "key-123",
    });
    let req = TestRequest::post().uri("/api/merchants").set_json(registration).to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let merchant: Value = test::read_body_json(res).await;
    assert_eq!(merchant["domain"], "shop.example.com");
    assert_eq!(merchant["display_name"], "Example Shop");

    let req = TestRequest::get().uri("/api/merchants?email=owner@example.com").to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let found: Value = test::read_body_json(res).await;
    assert_eq!(found["id"], merchant["id"]);

    let req = TestRequest::get().uri("/api/merchants?email=nobody@example.com").to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn merchant_updates_are_validated() {
    let db = new_db().await;
    let service = test_service!(db);
    let registration = json!({
        "domain": "shop.example.com",
        "name": "Example Shop",
        "email": "owner@example.com",
        "api_key": "key-123",
    });
    let req = TestRequest::post().uri("/api/merchants").set_json(registration).to_request();
    let merchant: Value = test::call_and_read_body_json(&service, req).await;
    let user_id = merchant["user_id"].as_i64().unwrap();

    let update = json!({
        "domain": "shop.example.com",
        "name": "Example Shop",
        "email": "not-an-email",
        "api_key": "key-123",
    });
    let req = TestRequest::post().uri(&format!("/api/merchants/{user_id}")).set_json(update).to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(res).await;
    assert!(body["error"].as_str().unwrap().contains("email"));
}

#[actix_web::test]
async fn statistics_are_served_over_an_inclusive_date_range() {
    let db = new_db().await;
    let service = test_service!(db);
    let req = TestRequest::post().uri("/webhook/order_created").set_json(order_payload("st-1", 100.0)).to_request();
    test::call_service(&service, req).await;

    let today = chrono::Utc::now().date_naive();
    let uri = format!("/api/orders/stats?from={today}&to={today}");
    let req = TestRequest::get().uri(&uri).to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let stats: Value = test::read_body_json(res).await;
    assert_eq!(stats["count"], 1);
    assert_eq!(stats["revenue"], 10_000);
    // 12.5% of $100 per the affiliate's stored rate
    assert_eq!(stats["commission_owed"], 1_250);

    let req = TestRequest::get().uri("/api/orders/stats?from=2024&to=2024-01-01").to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn a_payout_settles_all_unpaid_orders() {
    let db = new_db().await;
    let service = test_service!(db.clone());
    for (oid, amount) in [("po-1", 100.0), ("po-2", 60.0)] {
        let req = TestRequest::post().uri("/webhook/order_created").set_json(order_payload(oid, amount)).to_request();
        test::call_service(&service, req).await;
    }
    let (affiliate_id,): (i64,) = sqlx::query_as("SELECT id FROM affiliates LIMIT 1").fetch_one(db.pool()).await.unwrap();

    let req = TestRequest::post().uri(&format!("/api/payouts/{affiliate_id}")).to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let result: Value = test::read_body_json(res).await;
    assert_eq!(result["orders_paid"].as_array().unwrap().len(), 2);

    // A second run has nothing left to settle.
    let req = TestRequest::post().uri(&format!("/api/payouts/{affiliate_id}")).to_request();
    let result: Value = test::call_and_read_body_json(&service, req).await;
    assert_eq!(result["orders_paid"].as_array().unwrap().len(), 0);

    let req = TestRequest::post().uri("/api/payouts/99999").to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
