//! Payout job dispatch.
//!
//! The payout processor does not settle commissions itself; it hands each unpaid order to an asynchronous job via
//! the hook system in this module and moves on. Dispatch is fire-and-forget: the order's status transition is not
//! conditioned on the job's outcome, and a failed job is an operational concern, not a state rollback.
mod channel;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use hooks::{EventHandlers, EventHooks, EventProducers};

use crate::db_types::{Affiliate, Order};

/// A payout task for one order, carrying everything the job runner needs to settle the affiliate's commission.
#[derive(Debug, Clone)]
pub struct PayoutEvent {
    pub order: Order,
    pub affiliate: Affiliate,
}

impl PayoutEvent {
    pub fn new(order: Order, affiliate: Affiliate) -> Self {
        Self { order, affiliate }
    }
}
