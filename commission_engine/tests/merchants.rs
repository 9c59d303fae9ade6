use acs_common::Money;
use chrono::{Duration, Utc};
use commission_engine::{
    db_types::{IncomingOrder, MerchantRegistration, MerchantUpdate, OrderId, UserType},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    AffiliateManagement,
    MerchantApi,
    MerchantApiError,
    MerchantManagement,
    OrderFlowApi,
    PayoutManagement,
    SqliteDatabase,
};

async fn new_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

fn registration(domain: &str, email: &str) -> MerchantRegistration {
    MerchantRegistration {
        domain: domain.to_string(),
        name: "Example Shop".to_string(),
        email: email.to_string(),
        api_key: "key-123".to_string(),
    }
}

#[tokio::test]
async fn registering_a_merchant_creates_user_and_merchant_rows() {
    let db = new_db().await;
    let api = MerchantApi::new(db.clone());
    let merchant = api.register(registration("shop.example.com", "owner@example.com")).await.unwrap();
    assert_eq!(merchant.domain, "shop.example.com");
    assert_eq!(merchant.display_name, "Example Shop");

    let user = db.fetch_user(merchant.user_id).await.unwrap().unwrap();
    assert_eq!(user.email, "owner@example.com");
    assert_eq!(user.user_type, UserType::Merchant);
    assert_eq!(user.api_key, "key-123");

    let found = api.merchant_by_email("owner@example.com").await.unwrap().unwrap();
    assert_eq!(found.id, merchant.id);
}

#[tokio::test]
async fn merchant_lookup_ignores_non_merchant_users() {
    let db = new_db().await;
    let api = MerchantApi::new(db.clone());
    sqlx::query("INSERT INTO users (name, email, user_type, password) VALUES ('Jo', 'jo@example.com', 'Customer', '')")
        .execute(db.pool())
        .await
        .unwrap();
    assert!(api.merchant_by_email("jo@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn updating_a_merchant_rewrites_both_records() {
    let db = new_db().await;
    let api = MerchantApi::new(db.clone());
    let merchant = api.register(registration("old.example.com", "old@example.com")).await.unwrap();
    let update = MerchantUpdate {
        domain: "new.example.com".to_string(),
        name: "New Shop".to_string(),
        email: "new@example.com".to_string(),
        api_key: "key-456".to_string(),
    };
    let updated = api.update_merchant(merchant.user_id, update).await.unwrap();
    assert_eq!(updated.id, merchant.id);
    assert_eq!(updated.domain, "new.example.com");
    assert_eq!(updated.display_name, "New Shop");
    let user = db.fetch_user(merchant.user_id).await.unwrap().unwrap();
    assert_eq!(user.email, "new@example.com");
    assert_eq!(user.api_key, "key-456");
}

#[tokio::test]
async fn an_update_may_not_claim_another_users_email() {
    let db = new_db().await;
    let api = MerchantApi::new(db.clone());
    api.register(registration("first.example.com", "first@example.com")).await.unwrap();
    let second = api.register(registration("second.example.com", "second@example.com")).await.unwrap();
    let update = MerchantUpdate {
        domain: "second.example.com".to_string(),
        name: "Second Shop".to_string(),
        email: "first@example.com".to_string(),
        api_key: "key-456".to_string(),
    };
    let err = api.update_merchant(second.user_id, update).await.unwrap_err();
    let MerchantApiError::ValidationError(v) = err else {
        panic!("expected a validation error");
    };
    assert_eq!(v.field, "email");
    assert_eq!(v.message, "has already been taken");
}

#[tokio::test]
async fn updating_an_unknown_user_fails() {
    let db = new_db().await;
    let api = MerchantApi::new(db);
    let update = MerchantUpdate {
        domain: "shop.example.com".to_string(),
        name: "Shop".to_string(),
        email: "owner@example.com".to_string(),
        api_key: "key".to_string(),
    };
    let err = api.update_merchant(404, update).await.unwrap_err();
    assert!(matches!(err, MerchantApiError::UserNotFound(404)));
}

#[tokio::test]
async fn invalid_updates_are_rejected_before_touching_the_database() {
    let db = new_db().await;
    let api = MerchantApi::new(db.clone());
    let merchant = api.register(registration("shop.example.com", "owner@example.com")).await.unwrap();
    let update = MerchantUpdate {
        domain: String::new(),
        name: "Shop".to_string(),
        email: "owner@example.com".to_string(),
        api_key: "key".to_string(),
    };
    let err = api.update_merchant(merchant.user_id, update).await.unwrap_err();
    let MerchantApiError::ValidationError(v) = err else {
        panic!("expected a validation error");
    };
    assert_eq!(v.field, "domain");
    let unchanged = api.merchant_by_email("owner@example.com").await.unwrap().unwrap();
    assert_eq!(unchanged.domain, "shop.example.com");
}

#[tokio::test]
async fn statistics_aggregate_revenue_and_affiliate_rate_commissions() {
    let db = new_db().await;
    let orders = OrderFlowApi::new(db.clone());
    let merchants = MerchantApi::new(db.clone());

    // Order A: $100, referred by an affiliate with a 10% rate.
    let referred =
        IncomingOrder::new(OrderId::from("oid-s1"), Money::from_dollars(100), "ref@affiliates.example".to_string())
            .with_referral("shop.example.com", "SAVE10", 10.0);
    orders.process_order(referred).await.unwrap();
    // Order B: $50, no affiliate attached.
    sqlx::query("INSERT INTO orders (order_id, subtotal) VALUES ('oid-s2', 5000)").execute(db.pool()).await.unwrap();

    let today = Utc::now().date_naive();
    let stats = merchants.order_stats(today - Duration::days(1), today + Duration::days(1)).await.unwrap();
    assert_eq!(stats.count, 2);
    assert_eq!(stats.revenue, Money::from_dollars(150));
    // Owed commission uses the affiliate's own rate over unpaid referred orders only.
    assert_eq!(stats.commission_owed, Money::from_dollars(10));

    // Outside the window, nothing matches.
    let empty = merchants.order_stats(today - Duration::days(30), today - Duration::days(20)).await.unwrap();
    assert_eq!(empty.count, 0);
    assert_eq!(empty.revenue, Money::default());
    assert_eq!(empty.commission_owed, Money::default());
}

#[tokio::test]
async fn paid_orders_drop_out_of_the_owed_commission() {
    let db = new_db().await;
    let orders = OrderFlowApi::new(db.clone());
    let merchants = MerchantApi::new(db.clone());
    let referred =
        IncomingOrder::new(OrderId::from("oid-t1"), Money::from_dollars(200), "paid@affiliates.example".to_string())
            .with_referral("shop.example.com", "SAVE10", 10.0);
    orders.process_order(referred).await.unwrap();

    let before =
        merchants.order_stats_between(Utc::now() - Duration::hours(1), Utc::now() + Duration::hours(1)).await.unwrap();
    assert_eq!(before.commission_owed, Money::from_dollars(20));

    let affiliate = db.affiliate_by_email("paid@affiliates.example").await.unwrap().unwrap();
    let unpaid = db.fetch_unpaid_orders(affiliate.id).await.unwrap();
    db.mark_order_paid(unpaid[0].id).await.unwrap();

    let today = Utc::now().date_naive();
    let after = merchants.order_stats(today - Duration::days(1), today + Duration::days(1)).await.unwrap();
    assert_eq!(after.count, 1, "settled orders still count towards revenue");
    assert_eq!(after.revenue, Money::from_dollars(200));
    assert_eq!(after.commission_owed, Money::default());
}
