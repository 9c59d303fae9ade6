use std::fmt::Display;

use acs_common::Money;
use commission_engine::db_types::{IncomingOrder, OrderId};
use serde::{Deserialize, Serialize};

use crate::errors::OrderConversionError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// The order-created webhook payload, as delivered by the storefront. Monetary values arrive as decimal dollar
/// amounts and are converted to cents on ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    pub order_id: String,
    pub subtotal: f64,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub discount_code: String,
    #[serde(default)]
    pub commission_rate: f64,
    pub email: String,
    #[serde(default)]
    pub name: String,
}

impl TryFrom<OrderCreatedEvent> for IncomingOrder {
    type Error = OrderConversionError;

    fn try_from(event: OrderCreatedEvent) -> Result<Self, Self::Error> {
        if event.order_id.trim().is_empty() {
            return Err(OrderConversionError("order_id must not be empty".to_string()));
        }
        if event.email.trim().is_empty() {
            return Err(OrderConversionError("email must not be empty".to_string()));
        }
        let subtotal = Money::try_from(event.subtotal).map_err(|e| OrderConversionError(e.to_string()))?;
        let order = IncomingOrder::new(OrderId::from(event.order_id), subtotal, event.email).with_referral(
            event.domain,
            event.discount_code,
            event.commission_rate,
        );
        Ok(IncomingOrder { name: event.name, ..order })
    }
}

/// Date bounds for the statistics query. Both are `YYYY-MM-DD` and the range is inclusive of both days.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsPeriod {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantEmailQuery {
    pub email: String,
}
