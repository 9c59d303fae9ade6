use thiserror::Error;

use crate::db_types::{Affiliate, NewAffiliate};

#[derive(Debug, Clone, Error)]
pub enum AffiliateApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The requested affiliate (id {0}) does not exist")]
    AffiliateNotFound(i64),
}

impl From<sqlx::Error> for AffiliateApiError {
    fn from(e: sqlx::Error) -> Self {
        AffiliateApiError::DatabaseError(e.to_string())
    }
}

/// The affiliate registry.
///
/// Lookups key on the email business key. Uniqueness of emails is *not* enforced at this layer; when duplicates
/// exist, [`AffiliateManagement::affiliate_by_email`] returns the earliest record so that attribution is stable.
#[allow(async_fn_in_trait)]
pub trait AffiliateManagement {
    /// Look up an affiliate by email. No side effects.
    async fn affiliate_by_email(&self, email: &str) -> Result<Option<Affiliate>, AffiliateApiError>;

    async fn affiliate_by_id(&self, id: i64) -> Result<Option<Affiliate>, AffiliateApiError>;

    /// Constructs and persists a new affiliate record. No uniqueness validation on email is performed.
    async fn register_affiliate(&self, affiliate: NewAffiliate) -> Result<Affiliate, AffiliateApiError>;
}
