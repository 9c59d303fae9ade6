use std::{fmt::Debug, sync::OnceLock};

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use log::*;
use regex::Regex;

use crate::{
    db_types::{Merchant, MerchantRegistration, MerchantUpdate},
    traits::{MerchantApiError, MerchantManagement, OrderStatistics, ValidationError},
};

const MAX_FIELD_LEN: usize = 255;

fn email_regex() -> &'static Regex {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    EMAIL_RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex is valid"))
}

/// `MerchantApi` covers merchant registration, maintenance and order statistics.
pub struct MerchantApi<B> {
    db: B,
}

impl<B> Debug for MerchantApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MerchantApi")
    }
}

impl<B> MerchantApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> MerchantApi<B>
where B: MerchantManagement
{
    /// Register a new merchant and its backing user. The user is created with type `Merchant` and the storefront
    /// API key is kept on the user record. Both rows are written atomically by the backend.
    pub async fn register(&self, registration: MerchantRegistration) -> Result<Merchant, MerchantApiError> {
        let merchant = self.db.register_merchant(registration).await?;
        info!("🧾️ Merchant {} registered with id {}", merchant.domain, merchant.id);
        Ok(merchant)
    }

    /// Update a merchant and its backing user.
    ///
    /// Validation rules (first violation is reported):
    /// * `domain` and `name`: required, at most 255 characters;
    /// * `email`: required, well-formed, and not in use by any *other* user;
    /// * `api_key`: required.
    pub async fn update_merchant(&self, user_id: i64, update: MerchantUpdate) -> Result<Merchant, MerchantApiError> {
        let user = self.db.fetch_user(user_id).await?.ok_or(MerchantApiError::UserNotFound(user_id))?;
        validate_update(&update)?;
        if self.db.email_taken_by_other(&update.email, user.id).await? {
            return Err(ValidationError::new("email", "has already been taken").into());
        }
        let merchant = self.db.update_merchant(user.id, update).await?;
        debug!("🧾️ Merchant record for user #{user_id} updated");
        Ok(merchant)
    }

    /// Find a merchant by the backing user's email. Returns `None` when the email belongs to a non-merchant user.
    pub async fn merchant_by_email(&self, email: &str) -> Result<Option<Merchant>, MerchantApiError> {
        self.db.merchant_by_email(email).await
    }

    /// Order statistics over the inclusive date range `[from, to]`. Both bounds are whole days: `from` starts at
    /// midnight and `to` runs to the last second of that day.
    pub async fn order_stats(&self, from: NaiveDate, to: NaiveDate) -> Result<OrderStatistics, MerchantApiError> {
        let start = from.and_time(NaiveTime::MIN).and_utc();
        let end = (to.and_time(NaiveTime::MIN) + Duration::days(1) - Duration::seconds(1)).and_utc();
        trace!("🧾️ Aggregating order statistics for {start} - {end}");
        self.db.order_statistics(start, end).await
    }

    /// As [`MerchantApi::order_stats`], but with explicit instants for both bounds.
    pub async fn order_stats_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<OrderStatistics, MerchantApiError> {
        self.db.order_statistics(from, to).await
    }
}

fn validate_update(update: &MerchantUpdate) -> Result<(), ValidationError> {
    validate_required_str("domain", &update.domain)?;
    validate_required_str("name", &update.name)?;
    if update.email.trim().is_empty() {
        return Err(ValidationError::new("email", "is required"));
    }
    if !email_regex().is_match(update.email.trim()) {
        return Err(ValidationError::new("email", "must be a valid email address"));
    }
    if update.api_key.trim().is_empty() {
        return Err(ValidationError::new("api_key", "is required"));
    }
    Ok(())
}

fn validate_required_str(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "is required"));
    }
    if value.chars().count() > MAX_FIELD_LEN {
        return Err(ValidationError::new(field, format!("must not be longer than {MAX_FIELD_LEN} characters")));
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    fn update() -> MerchantUpdate {
        MerchantUpdate {
            domain: "shop.example.com".into(),
            name: "Example Shop".into(),
            email: "owner@example.com".into(),
            api_key: "key-123".into(),
        }
    }

    #[test]
    fn a_valid_update_passes() {
        assert!(validate_update(&update()).is_ok());
    }

    #[test]
    fn the_first_violation_is_reported() {
        let mut u = update();
        u.domain = "  ".into();
        u.email = "not-an-email".into();
        let err = validate_update(&u).unwrap_err();
        assert_eq!(err.field, "domain");
    }

    #[test]
    fn overlong_fields_are_rejected() {
        let mut u = update();
        u.name = "x".repeat(256);
        let err = validate_update(&u).unwrap_err();
        assert_eq!(err.field, "name");
        u.name = "x".repeat(255);
        assert!(validate_update(&u).is_ok());
    }

    #[test]
    fn malformed_emails_are_rejected() {
        for bad in ["plainaddress", "missing@tld", "two words@example.com", "@example.com"] {
            let mut u = update();
            u.email = bad.into();
            let err = validate_update(&u).unwrap_err();
            assert_eq!(err.field, "email", "expected {bad} to be rejected");
        }
    }

    #[test]
    fn api_key_is_required() {
        let mut u = update();
        u.api_key = String::new();
        let err = validate_update(&u).unwrap_err();
        assert_eq!(err.field, "api_key");
    }
}
