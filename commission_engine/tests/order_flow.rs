use acs_common::Money;
use commission_engine::{
    db_types::{IncomingOrder, OrderId},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    OrderFlowApi,
    OrderProcessed,
    SqliteDatabase,
};

async fn new_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

fn referred_order(order_id: &str, subtotal_dollars: i64, email: &str) -> IncomingOrder {
    IncomingOrder::new(OrderId::from(order_id), Money::from_dollars(subtotal_dollars), email.to_string())
        .with_referral("shop.example.com", "SAVE10", 25.0)
}

#[tokio::test]
async fn processing_an_order_logs_a_fixed_rate_commission() {
    let db = new_db().await;
    let api = OrderFlowApi::new(db);
    let result = api.process_order(referred_order("oid-1001", 200, "jo@affiliates.example")).await.unwrap();
    let OrderProcessed::Processed { order, affiliate, commission, new_affiliate } = result else {
        panic!("expected a freshly processed order");
    };
    // The engine applies its flat 10% rate; the 25% referral rate on the payload is only stored on the affiliate.
    assert_eq!(commission.commission, Money::from_dollars(20));
    assert_eq!(commission.order_id, order.order_id);
    assert_eq!(commission.affiliate_id, affiliate.id);
    assert!(new_affiliate);
    assert_eq!(affiliate.email, "jo@affiliates.example");
    assert_eq!(affiliate.discount_code, "SAVE10");
    assert_eq!(affiliate.commission_rate, 25.0);
    assert_eq!(order.subtotal, Money::from_dollars(200));
    assert_eq!(order.affiliate_id, Some(affiliate.id));
}

#[tokio::test]
async fn reprocessing_the_same_order_is_a_noop() {
    let db = new_db().await;
    let api = OrderFlowApi::new(db.clone());
    let first = api.process_order(referred_order("oid-2001", 150, "dup@affiliates.example")).await.unwrap();
    assert!(!first.is_duplicate());

    // Same order id, different particulars. Nothing may change.
    let replay = referred_order("oid-2001", 999, "dup@affiliates.example");
    let second = api.process_order(replay).await.unwrap();
    assert!(matches!(second, OrderProcessed::AlreadyProcessed(ref oid) if oid.as_str() == "oid-2001"));

    let (commissions,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM commissions").fetch_one(db.pool()).await.unwrap();
    assert_eq!(commissions, 1);
    let order = api.order_by_id(&OrderId::from("oid-2001")).await.unwrap().unwrap();
    assert_eq!(order.subtotal, Money::from_dollars(150));
}

#[tokio::test]
async fn replays_do_not_register_affiliates() {
    let db = new_db().await;
    let api = OrderFlowApi::new(db.clone());
    api.process_order(referred_order("oid-3001", 100, "once@affiliates.example")).await.unwrap();
    // Replay with an unseen email. The rollback must undo the affiliate registration too.
    let mut replay = referred_order("oid-3001", 100, "never@affiliates.example");
    replay.discount_code = "OTHER".to_string();
    let result = api.process_order(replay).await.unwrap();
    assert!(result.is_duplicate());
    let (affiliates,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM affiliates").fetch_one(db.pool()).await.unwrap();
    assert_eq!(affiliates, 1);
}

#[tokio::test]
async fn orders_from_a_known_email_reuse_the_affiliate() {
    let db = new_db().await;
    let api = OrderFlowApi::new(db.clone());
    let first = api.process_order(referred_order("oid-4001", 80, "repeat@affiliates.example")).await.unwrap();
    let second = api.process_order(referred_order("oid-4002", 120, "repeat@affiliates.example")).await.unwrap();
    let (OrderProcessed::Processed { affiliate: a1, .. }, OrderProcessed::Processed { affiliate: a2, new_affiliate, .. }) =
        (first, second)
    else {
        panic!("both orders should have been processed");
    };
    assert_eq!(a1.id, a2.id);
    assert!(!new_affiliate);
    let (affiliates,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM affiliates").fetch_one(db.pool()).await.unwrap();
    assert_eq!(affiliates, 1);
}

#[tokio::test]
async fn commissions_can_be_looked_up_by_order_id() {
    let db = new_db().await;
    let api = OrderFlowApi::new(db);
    let recorded = api
        .process_order(referred_order("oid-5001", 60, "lookup@affiliates.example"))
        .await
        .unwrap()
        .into_commission()
        .unwrap();
    let commission = api.commission_for_order(&OrderId::from("oid-5001")).await.unwrap().unwrap();
    assert_eq!(commission.id, recorded.id);
    assert_eq!(commission.commission, Money::from_dollars(6));
    assert!(api.commission_for_order(&OrderId::from("oid-nope")).await.unwrap().is_none());
}
