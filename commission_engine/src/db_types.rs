//! Data types that are shared between the database backends and the public API.
use std::{fmt::Display, str::FromStr};

use acs_common::Money;
use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------        OrderId        -------------------------------------------------------
/// The external order identifier, as assigned by the storefront. This is the idempotency key for commission
/// recording.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------     PayoutStatus      -------------------------------------------------------
/// Settlement state of an order's commission. The only legal transition is `Unpaid` -> `Paid`, and only the payout
/// processor makes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PayoutStatus {
    Unpaid,
    Paid,
}

impl Display for PayoutStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayoutStatus::Unpaid => write!(f, "Unpaid"),
            PayoutStatus::Paid => write!(f, "Paid"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion: {0}")]
pub struct ConversionError(String);

impl FromStr for PayoutStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Unpaid" => Ok(Self::Unpaid),
            "Paid" => Ok(Self::Paid),
            s => Err(ConversionError(format!("Invalid payout status: {s}"))),
        }
    }
}

impl From<String> for PayoutStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid payout status: {value}. But this conversion cannot fail. Defaulting to Unpaid");
            PayoutStatus::Unpaid
        })
    }
}

//--------------------------------------       UserType        -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum UserType {
    Merchant,
    Customer,
}

impl Display for UserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserType::Merchant => write!(f, "Merchant"),
            UserType::Customer => write!(f, "Customer"),
        }
    }
}

impl FromStr for UserType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Merchant" => Ok(Self::Merchant),
            "Customer" => Ok(Self::Customer),
            s => Err(ConversionError(format!("Invalid user type: {s}"))),
        }
    }
}

//--------------------------------------         User          -------------------------------------------------------
/// Identity record backing a merchant login. The storefront API key is stored in the legacy `password` column.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub user_type: UserType,
    #[sqlx(rename = "password")]
    #[serde(skip_serializing)]
    pub api_key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub user_type: UserType,
    pub api_key: String,
}

//--------------------------------------       Merchant        -------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Merchant {
    pub id: i64,
    pub user_id: i64,
    pub domain: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for the two-record (User + Merchant) registration flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantRegistration {
    pub domain: String,
    pub name: String,
    pub email: String,
    pub api_key: String,
}

/// Input for a merchant update. All fields are required; see [`crate::MerchantApi::update_merchant`] for the
/// validation rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantUpdate {
    pub domain: String,
    pub name: String,
    pub email: String,
    pub api_key: String,
}

//--------------------------------------       Affiliate       -------------------------------------------------------
/// A referring party. Looked up by email (the business key); created lazily when the first order referencing an
/// unknown email arrives.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Affiliate {
    pub id: i64,
    pub email: String,
    pub discount_code: String,
    /// Percentage, 0-100 semantics. Used by the statistics aggregation, *not* by the commission engine, which
    /// applies its own fixed rate.
    pub commission_rate: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAffiliate {
    pub email: String,
    pub discount_code: String,
    pub commission_rate: f64,
}

impl NewAffiliate {
    pub fn new<S1: Into<String>, S2: Into<String>>(email: S1, discount_code: S2, commission_rate: f64) -> Self {
        Self { email: email.into(), discount_code: discount_code.into(), commission_rate }
    }
}

//--------------------------------------         Order         -------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Order {
    pub id: i64,
    pub order_id: OrderId,
    pub subtotal: Money,
    pub affiliate_id: Option<i64>,
    pub payout_status: PayoutStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------     IncomingOrder     -------------------------------------------------------
/// The normalized order-created event as delivered by the webhook ingress.
///
/// `domain` and `discount_code` are part of the wire contract but do not enter the commission formula.
/// `discount_code` and `commission_rate` seed a new affiliate record when `email` is not yet known.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingOrder {
    pub order_id: OrderId,
    pub subtotal: Money,
    pub domain: String,
    pub discount_code: String,
    pub commission_rate: f64,
    pub email: String,
    pub name: String,
}

impl IncomingOrder {
    pub fn new(order_id: OrderId, subtotal: Money, email: String) -> Self {
        Self {
            order_id,
            subtotal,
            domain: String::default(),
            discount_code: String::default(),
            commission_rate: 0.0,
            email,
            name: String::default(),
        }
    }

    pub fn with_referral<S1: Into<String>, S2: Into<String>>(mut self, domain: S1, discount_code: S2, rate: f64) -> Self {
        self.domain = domain.into();
        self.discount_code = discount_code.into();
        self.commission_rate = rate;
        self
    }
}

impl Display for IncomingOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Order {} for {} referred by {} ({})", self.order_id, self.subtotal, self.email, self.discount_code)
    }
}

//--------------------------------------      Commission       -------------------------------------------------------
/// A recorded monetary credit owed to an affiliate for one order. Written once, never mutated.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Commission {
    pub id: i64,
    pub affiliate_id: i64,
    pub order_id: OrderId,
    pub commission: Money,
    pub created_at: DateTime<Utc>,
}
