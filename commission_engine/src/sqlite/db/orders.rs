use acs_common::Money;
use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{Order, OrderId},
    traits::{OrderStatistics, PayoutError},
};

/// Inserts the order into the database, returning `None` if an order with this `order_id` already exists.
///
/// Idempotency is enforced by the unique constraint on `order_id` rather than a check-then-act existence query, so
/// two near-simultaneous deliveries for the same order cannot both insert. Run this inside a transaction (pass
/// `&mut *tx`) when the insert must be atomic with other writes.
pub async fn idempotent_insert(
    order_id: &OrderId,
    subtotal: Money,
    affiliate_id: Option<i64>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order: Option<Order> = sqlx::query_as(
        r#"
            INSERT INTO orders (order_id, subtotal, affiliate_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (order_id) DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(order_id.as_str())
    .bind(subtotal.value())
    .bind(affiliate_id)
    .fetch_optional(conn)
    .await?;
    match &order {
        Some(o) => debug!("🗃️ Order [{}] inserted with id {}", o.order_id, o.id),
        None => trace!("🗃️ Order [{order_id}] already exists. Nothing inserted."),
    }
    Ok(order)
}

pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE order_id = $1").bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

/// Fetches all unpaid orders attributed to the given affiliate, oldest first.
pub async fn fetch_unpaid_orders_for_affiliate(
    affiliate_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as(
        "SELECT * FROM orders WHERE affiliate_id = $1 AND payout_status = 'Unpaid' ORDER BY created_at ASC, id ASC",
    )
    .bind(affiliate_id)
    .fetch_all(conn)
    .await?;
    Ok(orders)
}

/// Transitions a single order from `Unpaid` to `Paid`. The `payout_status` guard in the WHERE clause makes the
/// transition one-way at the store level.
pub async fn mark_order_paid(id: i64, conn: &mut SqliteConnection) -> Result<Order, PayoutError> {
    let updated: Option<Order> = sqlx::query_as(
        "UPDATE orders SET payout_status = 'Paid', updated_at = CURRENT_TIMESTAMP \
         WHERE id = $1 AND payout_status = 'Unpaid' RETURNING *",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    match updated {
        Some(order) => {
            debug!("🗃️ Order [{}] marked as paid", order.order_id);
            Ok(order)
        },
        None => {
            let existing: Option<Order> =
                sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await?;
            match existing {
                Some(_) => Err(PayoutError::AlreadyPaid(id)),
                None => Err(PayoutError::OrderIdNotFound(id)),
            }
        },
    }
}

/// Aggregates order statistics over the inclusive `[from, to]` range.
///
/// Comparisons go through `unixepoch` so that the bounds are compared as instants rather than as strings.
/// `commission_owed` uses each affiliate's own commission rate and only counts attributed, unpaid orders.
pub async fn order_statistics(
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<OrderStatistics, sqlx::Error> {
    let (count, revenue): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COALESCE(SUM(subtotal), 0) FROM orders \
         WHERE unixepoch(created_at) >= $1 AND unixepoch(created_at) <= $2",
    )
    .bind(from.timestamp())
    .bind(to.timestamp())
    .fetch_one(&mut *conn)
    .await?;
    let (owed,): (f64,) = sqlx::query_as(
        "SELECT COALESCE(SUM(orders.subtotal * affiliates.commission_rate / 100.0), 0.0) \
         FROM orders JOIN affiliates ON orders.affiliate_id = affiliates.id \
         WHERE orders.payout_status = 'Unpaid' \
           AND unixepoch(orders.created_at) >= $1 AND unixepoch(orders.created_at) <= $2",
    )
    .bind(from.timestamp())
    .bind(to.timestamp())
    .fetch_one(conn)
    .await?;
    trace!("🗃️ Statistics query complete. {count} orders in range.");
    #[allow(clippy::cast_possible_truncation)]
    Ok(OrderStatistics {
        count,
        commission_owed: Money::from_cents(owed.round() as i64),
        revenue: Money::from_cents(revenue),
    })
}
