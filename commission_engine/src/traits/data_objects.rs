use acs_common::Money;
use serde::{Deserialize, Serialize};

use crate::db_types::{Affiliate, Commission, Order, OrderId};

/// Outcome of the order-ingestion transaction.
///
/// A replayed delivery for a known `order_id` is not an error; it is reported as [`OrderProcessed::AlreadyProcessed`]
/// so that the ingress layer can acknowledge the webhook without recording anything twice.
#[derive(Debug, Clone, Serialize)]
pub enum OrderProcessed {
    Processed {
        order: Order,
        affiliate: Affiliate,
        commission: Commission,
        /// True if the affiliate record was created as part of this transaction.
        new_affiliate: bool,
    },
    AlreadyProcessed(OrderId),
}

impl OrderProcessed {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, OrderProcessed::AlreadyProcessed(_))
    }

    /// Converts this result into the recorded commission, if one was recorded.
    pub fn into_commission(self) -> Option<Commission> {
        match self {
            OrderProcessed::Processed { commission, .. } => Some(commission),
            OrderProcessed::AlreadyProcessed(_) => None,
        }
    }
}

/// Result of a payout run for a single affiliate.
#[derive(Debug, Clone, Serialize)]
pub struct PayoutResult {
    pub affiliate_id: i64,
    pub orders_paid: Vec<Order>,
}

impl PayoutResult {
    pub fn new(affiliate_id: i64, orders_paid: Vec<Order>) -> Self {
        Self { affiliate_id, orders_paid }
    }

    pub fn order_count(&self) -> usize {
        self.orders_paid.len()
    }

    pub fn total(&self) -> Money {
        self.orders_paid.iter().map(|o| o.subtotal).sum()
    }
}

/// Aggregate order statistics over an inclusive date range.
///
/// `commission_owed` only counts orders that have an affiliate and are still unpaid, and is computed from each
/// affiliate's own `commission_rate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderStatistics {
    pub count: i64,
    pub commission_owed: Money,
    pub revenue: Money,
}
