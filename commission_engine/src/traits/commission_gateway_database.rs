use acs_common::Money;
use thiserror::Error;

use crate::{
    db_types::{IncomingOrder, Order, OrderId},
    traits::{AffiliateApiError, AffiliateManagement, OrderProcessed},
};

/// This trait defines the highest level of behaviour for backends supporting the commission engine: ingesting
/// order-created events and recording the resulting commissions exactly once.
#[allow(async_fn_in_trait)]
pub trait CommissionGatewayDatabase: Clone + AffiliateManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Takes an incoming order and, in a single atomic transaction:
    /// * resolves the affiliate by email, registering a new one (seeded from the order's `discount_code` and
    ///   `commission_rate`) if the email is unknown;
    /// * inserts the order row. Idempotency is enforced by the unique constraint on `order_id`: a constraint hit
    ///   rolls the whole transaction back (including any affiliate registration) and reports
    ///   [`OrderProcessed::AlreadyProcessed`];
    /// * records the commission row for the given, pre-computed `commission` amount.
    async fn process_incoming_order(
        &self,
        order: IncomingOrder,
        commission: Money,
    ) -> Result<OrderProcessed, CommissionGatewayError>;

    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, CommissionGatewayError>;

    async fn fetch_commission_for_order(
        &self,
        order_id: &OrderId,
    ) -> Result<Option<crate::db_types::Commission>, CommissionGatewayError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), CommissionGatewayError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum CommissionGatewayError {
    #[error("We have an internal database engine (configuration/uptime etc.) error: {0}")]
    DatabaseError(String),
    #[error("A commission has already been recorded for order {0}")]
    CommissionAlreadyRecorded(OrderId),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("{0}")]
    AffiliateError(#[from] AffiliateApiError),
}

impl From<sqlx::Error> for CommissionGatewayError {
    fn from(e: sqlx::Error) -> Self {
        CommissionGatewayError::DatabaseError(e.to_string())
    }
}
