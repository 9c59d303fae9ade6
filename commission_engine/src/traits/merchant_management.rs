use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    db_types::{Merchant, MerchantRegistration, MerchantUpdate, User},
    traits::OrderStatistics,
};

#[derive(Debug, Clone, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new<S: Into<String>>(field: &'static str, message: S) -> Self {
        Self { field, message: message.into() }
    }
}

#[derive(Debug, Clone, Error)]
pub enum MerchantApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid merchant data. {0}")]
    ValidationError(#[from] ValidationError),
    #[error("The requested user (id {0}) does not exist")]
    UserNotFound(i64),
    #[error("User {0} has no merchant record")]
    MerchantRecordMissing(i64),
}

impl From<sqlx::Error> for MerchantApiError {
    fn from(e: sqlx::Error) -> Self {
        MerchantApiError::DatabaseError(e.to_string())
    }
}

/// Merchant registration, maintenance and order statistics.
///
/// Input validation is *not* this trait's concern; it happens in [`crate::MerchantApi`] before the backend is
/// called. Backends only enforce relational integrity.
#[allow(async_fn_in_trait)]
pub trait MerchantManagement {
    /// Creates the backing user (type `Merchant`, API key stored in the password column) and the linked merchant
    /// record in a single atomic transaction, so a partial failure cannot leave an orphaned user behind.
    async fn register_merchant(&self, registration: MerchantRegistration) -> Result<Merchant, MerchantApiError>;

    /// Applies a pre-validated update to both the user and the merchant records, atomically.
    async fn update_merchant(&self, user_id: i64, update: MerchantUpdate) -> Result<Merchant, MerchantApiError>;

    /// Resolves the user by email and returns the linked merchant record, but only when the user is
    /// merchant-typed. A matching email on a non-merchant user yields `None`.
    async fn merchant_by_email(&self, email: &str) -> Result<Option<Merchant>, MerchantApiError>;

    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, MerchantApiError>;

    /// True when `email` is already used by a user other than `user_id`.
    async fn email_taken_by_other(&self, email: &str, user_id: i64) -> Result<bool, MerchantApiError>;

    /// Aggregates orders with `created_at` within `[from, to]` (inclusive bounds).
    async fn order_statistics(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<OrderStatistics, MerchantApiError>;
}
