//! # Backend interface contracts.
//!
//! This module defines the traits a database backend must implement in order to power the commission engine. The
//! concrete SQLite backend lives in [`crate::SqliteDatabase`]; everything above it is backend-agnostic.
//!
//! * [`CommissionGatewayDatabase`] is the top-level behaviour: the atomic order-ingestion transaction that records
//!   commissions exactly once per external order id.
//! * [`AffiliateManagement`] is the affiliate registry: lookup by the email business key, and registration.
//! * [`MerchantManagement`] covers merchant registration, updates, lookup and order statistics.
//! * [`PayoutManagement`] exposes the unpaid-order scan and the one-way `Unpaid` -> `Paid` transition.
mod affiliate_management;
mod commission_gateway_database;
mod data_objects;
mod merchant_management;
mod payout_management;

pub use affiliate_management::{AffiliateApiError, AffiliateManagement};
pub use commission_gateway_database::{CommissionGatewayDatabase, CommissionGatewayError};
pub use data_objects::{OrderProcessed, OrderStatistics, PayoutResult};
pub use merchant_management::{MerchantApiError, MerchantManagement, ValidationError};
pub use payout_management::{PayoutError, PayoutManagement};
