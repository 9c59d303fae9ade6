use thiserror::Error;

use crate::db_types::Order;

#[derive(Debug, Clone, Error)]
pub enum PayoutError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The requested order (internal id {0}) does not exist")]
    OrderIdNotFound(i64),
    #[error("Order (internal id {0}) has already been paid out")]
    AlreadyPaid(i64),
    #[error("The requested affiliate (id {0}) does not exist")]
    AffiliateNotFound(i64),
}

impl From<sqlx::Error> for PayoutError {
    fn from(e: sqlx::Error) -> Self {
        PayoutError::DatabaseError(e.to_string())
    }
}

/// Backend support for the payout processor.
#[allow(async_fn_in_trait)]
pub trait PayoutManagement {
    /// All orders attributed to the affiliate that are still `Unpaid`, oldest first.
    async fn fetch_unpaid_orders(&self, affiliate_id: i64) -> Result<Vec<Order>, PayoutError>;

    /// Transitions a single order `Unpaid` -> `Paid`. The transition is one-way: an order that is already `Paid`
    /// is left untouched and reported as [`PayoutError::AlreadyPaid`].
    async fn mark_order_paid(&self, order_id: i64) -> Result<Order, PayoutError>;
}
