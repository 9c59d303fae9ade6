use acs_common::CURRENCY_CODE;
use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use commission_engine::{
    events::{EventHandlers, EventHooks, EventProducers, PayoutEvent},
    run_migrations,
    MerchantApi,
    OrderFlowApi,
    PayoutApi,
    SqliteDatabase,
};
use log::*;
use std::time::Duration;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    routes::{health, merchant_by_email, order_created_webhook, order_stats, payout, register_merchant, update_merchant},
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.auto_migrate {
        info!("🛢️ Applying pending database migrations");
        run_migrations(db.pool()).await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    }
    let mut hooks = EventHooks::default();
    hooks.on_payout(payout_job);
    let handlers = EventHandlers::new(config.payout_buffer_size, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// The payout job. This is the asynchronous boundary the payout processor hands settled orders to; it runs
/// independently of the triggering request, which completes regardless of the job's outcome. A production
/// deployment replaces the body with the actual settlement (bank transfer, affiliate notification mail).
fn payout_job(event: PayoutEvent) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>> {
    Box::pin(async move {
        info!(
            "📬️💸️ Payout job: settle {} {CURRENCY_CODE} against order [{}] for affiliate #{} <{}>",
            event.order.subtotal, event.order.order_id, event.affiliate.id, event.affiliate.email
        );
    })
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone());
        let merchants_api = MerchantApi::new(db.clone());
        let payouts_api = PayoutApi::new(db.clone(), producers.clone());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("acs::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(merchants_api))
            .app_data(web::Data::new(payouts_api))
            .service(health)
            .route("/webhook/order_created", web::post().to(order_created_webhook::<SqliteDatabase>))
            .service(
                web::scope("/api")
                    .route("/merchants", web::post().to(register_merchant::<SqliteDatabase>))
                    .route("/merchants", web::get().to(merchant_by_email::<SqliteDatabase>))
                    .route("/merchants/{user_id}", web::post().to(update_merchant::<SqliteDatabase>))
                    .route("/orders/stats", web::get().to(order_stats::<SqliteDatabase>))
                    .route("/payouts/{affiliate_id}", web::post().to(payout::<SqliteDatabase>)),
            )
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
