use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Commission, IncomingOrder, Order, OrderId},
    traits::{CommissionGatewayDatabase, CommissionGatewayError, OrderProcessed},
};

/// The commission rate the engine applies to every order, as a percentage of the subtotal.
///
/// Note that this is deliberately *not* the affiliate's own `commission_rate`: the engine records commissions at a
/// flat house rate, while the statistics aggregation reports owed amounts at per-affiliate rates.
pub const FIXED_COMMISSION_RATE: f64 = 10.0;

/// `OrderFlowApi` is the primary API for handling order-created events: affiliate attribution, commission
/// calculation and idempotent recording.
pub struct OrderFlowApi<B> {
    db: B,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> OrderFlowApi<B>
where B: CommissionGatewayDatabase
{
    /// Process an order-created event and log any commission.
    ///
    /// A new affiliate is registered if the order's email is not already associated with one. Deliveries for an
    /// `order_id` that has been seen before are reported as [`OrderProcessed::AlreadyProcessed`] and record
    /// nothing; webhook retries are therefore safe.
    ///
    /// The commission amount is `subtotal` x [`FIXED_COMMISSION_RATE`]. The order's `domain` and `discount_code`
    /// do not enter the calculation.
    pub async fn process_order(&self, order: IncomingOrder) -> Result<OrderProcessed, CommissionGatewayError> {
        trace!("🔄️📦️ Processing incoming order {order}");
        let commission = order.subtotal.apply_rate(FIXED_COMMISSION_RATE);
        let result = self.db.process_incoming_order(order, commission).await?;
        match &result {
            OrderProcessed::Processed { order, affiliate, commission, new_affiliate } => {
                if *new_affiliate {
                    info!("🔄️📦️ New affiliate #{} registered for {}", affiliate.id, affiliate.email);
                }
                debug!(
                    "🔄️📦️ Order [{}] processing complete. {} owed to affiliate #{}",
                    order.order_id, commission.commission, affiliate.id
                );
            },
            OrderProcessed::AlreadyProcessed(oid) => {
                info!("🔄️📦️ Order [{oid}] has already been processed. Skipping.");
            },
        }
        Ok(result)
    }

    pub async fn order_by_id(&self, order_id: &OrderId) -> Result<Option<Order>, CommissionGatewayError> {
        self.db.fetch_order_by_order_id(order_id).await
    }

    pub async fn commission_for_order(&self, order_id: &OrderId) -> Result<Option<Commission>, CommissionGatewayError> {
        self.db.fetch_commission_for_order(order_id).await
    }
}
