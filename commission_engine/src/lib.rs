//! Affiliate Commission Engine
//!
//! The commission engine is the core of the affiliate commission server: it ingests order-created events from a
//! storefront, attributes them to affiliates via discount codes and email, records commissions exactly once per
//! order, and settles unpaid commissions through asynchronous payout jobs.
//!
//! The library is divided into three main sections:
//! 1. Database management and control ([`mod@sqlite`] behind the [`traits`] contracts). SQLite is the supported
//!    backend. You should never need to access the database directly; use the public API instead. The exception is
//!    the data types used in the database, which are defined in the [`db_types`] module and are public.
//! 2. The engine public API ([`OrderFlowApi`], [`MerchantApi`], [`PayoutApi`]). These provide the public-facing
//!    functionality: order processing, merchant management and payouts. Backends implement the traits in
//!    [`traits`] to power them.
//! 3. The payout job boundary ([`mod@events`]). The payout processor dispatches one event per settled order; hook
//!    into it to run the actual settlement job.
mod api;
mod sqlite;

pub mod db_types;
pub mod events;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use api::{
    merchant_api::MerchantApi,
    order_flow_api::{OrderFlowApi, FIXED_COMMISSION_RATE},
    payout_api::PayoutApi,
};
pub use sqlite::{run_migrations, SqliteDatabase};
pub use traits::{
    AffiliateApiError,
    AffiliateManagement,
    CommissionGatewayDatabase,
    CommissionGatewayError,
    MerchantApiError,
    MerchantManagement,
    OrderProcessed,
    OrderStatistics,
    PayoutError,
    PayoutManagement,
    PayoutResult,
    ValidationError,
};
