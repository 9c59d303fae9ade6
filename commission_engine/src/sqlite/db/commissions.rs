use acs_common::Money;
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Commission, OrderId},
    traits::CommissionGatewayError,
};

/// Records the commission for an order. The unique constraint on `order_id` guarantees at most one commission per
/// order; hitting it is reported as [`CommissionGatewayError::CommissionAlreadyRecorded`] so that callers can treat
/// it as the idempotent no-op signal.
pub async fn insert_commission(
    affiliate_id: i64,
    order_id: &OrderId,
    amount: Money,
    conn: &mut SqliteConnection,
) -> Result<Commission, CommissionGatewayError> {
    let result: Result<Commission, sqlx::Error> = sqlx::query_as(
        r#"
            INSERT INTO commissions (affiliate_id, order_id, commission)
            VALUES ($1, $2, $3)
            RETURNING *;
        "#,
    )
    .bind(affiliate_id)
    .bind(order_id.as_str())
    .bind(amount.value())
    .fetch_one(conn)
    .await;
    match result {
        Ok(commission) => {
            debug!("🗃️ Commission of {amount} logged for order [{order_id}], affiliate #{affiliate_id}");
            Ok(commission)
        },
        Err(sqlx::Error::Database(de)) if de.is_unique_violation() => {
            Err(CommissionGatewayError::CommissionAlreadyRecorded(order_id.clone()))
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn commission_for_order(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Commission>, sqlx::Error> {
    let commission = sqlx::query_as("SELECT * FROM commissions WHERE order_id = $1")
        .bind(order_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(commission)
}
