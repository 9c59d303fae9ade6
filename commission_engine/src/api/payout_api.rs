use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Affiliate, Order},
    events::{EventProducers, PayoutEvent},
    traits::{AffiliateApiError, AffiliateManagement, PayoutError, PayoutManagement, PayoutResult},
};

/// `PayoutApi` settles an affiliate's unpaid commissions: each unpaid order is handed to the asynchronous payout
/// job and then marked as paid.
pub struct PayoutApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for PayoutApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PayoutApi")
    }
}

impl<B> PayoutApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> PayoutApi<B>
where B: PayoutManagement + AffiliateManagement
{
    /// Pay out all of an affiliate's unpaid orders.
    ///
    /// For each order, a [`PayoutEvent`] is published to the job runner and the order is then marked `Paid`.
    /// Dispatch is fire-and-forget: the status transition does not wait for the job's outcome. Orders that are
    /// already `Paid` are never touched, since only unpaid orders are fetched.
    pub async fn payout(&self, affiliate: &Affiliate) -> Result<PayoutResult, PayoutError> {
        let orders = self.db.fetch_unpaid_orders(affiliate.id).await?;
        debug!("💸️ {} unpaid orders found for affiliate #{}", orders.len(), affiliate.id);
        let mut paid = Vec::with_capacity(orders.len());
        for order in orders {
            self.dispatch_payout_job(&order, affiliate).await;
            let order = self.db.mark_order_paid(order.id).await?;
            paid.push(order);
        }
        let result = PayoutResult::new(affiliate.id, paid);
        info!(
            "💸️ Payout for affiliate #{} complete. {} orders paid for a total of {}",
            affiliate.id,
            result.order_count(),
            result.total()
        );
        Ok(result)
    }

    /// As [`PayoutApi::payout`], starting from the affiliate id.
    pub async fn payout_by_affiliate_id(&self, affiliate_id: i64) -> Result<PayoutResult, PayoutError> {
        let affiliate = self
            .db
            .affiliate_by_id(affiliate_id)
            .await
            .map_err(|e| match e {
                AffiliateApiError::DatabaseError(msg) => PayoutError::DatabaseError(msg),
                AffiliateApiError::AffiliateNotFound(id) => PayoutError::AffiliateNotFound(id),
            })?
            .ok_or(PayoutError::AffiliateNotFound(affiliate_id))?;
        self.payout(&affiliate).await
    }

    async fn dispatch_payout_job(&self, order: &Order, affiliate: &Affiliate) {
        for producer in &self.producers.payout_producer {
            trace!("💸️ Dispatching payout job for order [{}]", order.order_id);
            let event = PayoutEvent::new(order.clone(), affiliate.clone());
            producer.publish_event(event).await;
        }
    }
}
