//! Request handler definitions
//!
//! Define each route and its handler here. Handlers are generic over the backend traits; `server.rs` registers
//! them against the concrete database type. Keep this module neat and tidy 🙏
//!
//! Since each worker thread processes its requests sequentially, handlers that block the current thread will stall
//! the worker. All database work goes through async sqlx calls, so handlers stay non-blocking.
use actix_web::{get, web, HttpResponse, Responder};
use chrono::NaiveDate;
use commission_engine::{
    db_types::{IncomingOrder, Merchant, MerchantRegistration, MerchantUpdate},
    traits::{
        AffiliateManagement,
        CommissionGatewayDatabase,
        CommissionGatewayError,
        MerchantManagement,
        OrderProcessed,
        PayoutManagement,
    },
    MerchantApi,
    OrderFlowApi,
    PayoutApi,
};
use log::*;

use crate::{
    data_objects::{JsonResponse, MerchantEmailQuery, OrderCreatedEvent, StatsPeriod},
    errors::ServerError,
};

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Webhook  ----------------------------------------------------
/// Route handler for the order-created webhook.
///
/// Webhook responses for deliveries we can read must be in the 200 range, otherwise the storefront will retry
/// them. A replayed delivery for a known order id is therefore acknowledged as a success, and payload-level
/// problems are reported inside a 200 body rather than as an HTTP error. Bodies that cannot be deserialized at
/// all are rejected with a 400; retrying those cannot succeed either, but there is no payload to acknowledge.
pub async fn order_created_webhook<B: CommissionGatewayDatabase>(
    body: web::Bytes,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let payload =
        std::str::from_utf8(body.as_ref()).map_err(|e| ServerError::InvalidRequestBody(e.to_string()))?;
    let event: OrderCreatedEvent = serde_json::from_str(payload).map_err(|e| {
        warn!("🛍️️ Could not deserialize order payload. {e}");
        ServerError::InvalidRequestBody(e.to_string())
    })?;
    trace!("🛍️️ Received order-created webhook for order {}", event.order_id);
    let result = match IncomingOrder::try_from(event) {
        Err(e) => {
            warn!("🛍️️ Could not convert order. {e}");
            JsonResponse::failure(e)
        },
        Ok(order) => match api.process_order(order).await {
            Ok(OrderProcessed::Processed { order, commission, .. }) => {
                info!("🛍️️ Order {} processed successfully.", order.order_id);
                JsonResponse::success(format!("Order processed. Commission of {} logged.", commission.commission))
            },
            Ok(OrderProcessed::AlreadyProcessed(oid)) => {
                info!("🛍️️ Order {oid} has already been processed.");
                JsonResponse::success("Order already processed.")
            },
            Err(CommissionGatewayError::DatabaseError(e)) => {
                warn!("🛍️️ Could not process order. {e}");
                JsonResponse::failure(e)
            },
            Err(e) => {
                warn!("🛍️️ Unexpected error while handling incoming order notification. {e}");
                JsonResponse::failure("Unexpected error handling order.")
            },
        },
    };
    Ok(HttpResponse::Ok().json(result))
}

//----------------------------------------------  Merchants  ----------------------------------------------------
pub async fn register_merchant<B: MerchantManagement>(
    body: web::Json<MerchantRegistration>,
    api: web::Data<MerchantApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let registration = body.into_inner();
    debug!("💻️ POST merchant registration for {}", registration.domain);
    let merchant = api.register(registration).await?;
    Ok(HttpResponse::Ok().json(merchant))
}

pub async fn update_merchant<B: MerchantManagement>(
    path: web::Path<i64>,
    body: web::Json<MerchantUpdate>,
    api: web::Data<MerchantApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = path.into_inner();
    debug!("💻️ POST merchant update for user #{user_id}");
    let merchant = api.update_merchant(user_id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(merchant))
}

pub async fn merchant_by_email<B: MerchantManagement>(
    query: web::Query<MerchantEmailQuery>,
    api: web::Data<MerchantApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let email = query.into_inner().email;
    let merchant: Merchant =
        api.merchant_by_email(&email).await?.ok_or_else(|| ServerError::NoRecordFound(format!("Merchant {email}")))?;
    Ok(HttpResponse::Ok().json(merchant))
}

//----------------------------------------------  Statistics  ----------------------------------------------------
/// Order statistics for the merchant API.
///
/// `from` and `to` are `YYYY-MM-DD` dates and the filter is inclusive of both days. The response is
/// `{count, commission_owed, revenue}`.
pub async fn order_stats<B: MerchantManagement>(
    query: web::Query<StatsPeriod>,
    api: web::Data<MerchantApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let period = query.into_inner();
    let from = parse_date("from", &period.from)?;
    let to = parse_date("to", &period.to)?;
    debug!("💻️ GET order statistics for {from} - {to}");
    let stats = api.order_stats(from, to).await?;
    Ok(HttpResponse::Ok().json(stats))
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, ServerError> {
    value
        .parse::<NaiveDate>()
        .map_err(|e| ServerError::InvalidRequestPath(format!("{field} must be a YYYY-MM-DD date. {e}")))
}

//----------------------------------------------   Payouts  ----------------------------------------------------
/// Trigger a payout run for an affiliate. Each unpaid order is handed to the asynchronous payout job and marked
/// paid; the response reports how many orders were settled.
pub async fn payout<B: PayoutManagement + AffiliateManagement>(
    path: web::Path<i64>,
    api: web::Data<PayoutApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let affiliate_id = path.into_inner();
    debug!("💻️ POST payout for affiliate #{affiliate_id}");
    let result = api.payout_by_affiliate_id(affiliate_id).await?;
    Ok(HttpResponse::Ok().json(result))
}
