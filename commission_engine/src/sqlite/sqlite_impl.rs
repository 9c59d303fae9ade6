//! `SqliteDatabase` is a concrete implementation of a commission engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use acs_common::Money;
use chrono::{DateTime, Utc};
use log::*;
use sqlx::SqlitePool;

use super::db::{affiliates, commissions, db_url, merchants, new_pool, orders};
use crate::{
    db_types::{
        Affiliate,
        Commission,
        IncomingOrder,
        Merchant,
        MerchantRegistration,
        MerchantUpdate,
        NewAffiliate,
        NewUser,
        Order,
        OrderId,
        User,
        UserType,
    },
    traits::{
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
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new connection pool using the `ACS_DATABASE_URL` environment variable, or the default URL.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        Self::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl CommissionGatewayDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    /// In a single atomic transaction:
    /// * the affiliate is resolved by email, registering a new record seeded from the order's referral data if the
    ///   email is unknown;
    /// * the order row is inserted. If the unique constraint on `order_id` is hit, the transaction is rolled back
    ///   (undoing any affiliate registration) and the call reports `AlreadyProcessed`;
    /// * the commission row is recorded.
    async fn process_incoming_order(
        &self,
        order: IncomingOrder,
        commission: Money,
    ) -> Result<OrderProcessed, CommissionGatewayError> {
        let mut tx = self.pool.begin().await?;
        let referral = NewAffiliate::new(order.email.clone(), order.discount_code.clone(), order.commission_rate);
        let (affiliate, new_affiliate) = affiliates::fetch_or_create_affiliate(referral, &mut tx).await?;
        let inserted = orders::idempotent_insert(&order.order_id, order.subtotal, Some(affiliate.id), &mut tx).await?;
        let Some(stored) = inserted else {
            tx.rollback().await?;
            debug!("🗃️ Order [{}] has already been processed. No commission recorded.", order.order_id);
            return Ok(OrderProcessed::AlreadyProcessed(order.order_id));
        };
        let commission = commissions::insert_commission(affiliate.id, &stored.order_id, commission, &mut tx).await?;
        tx.commit().await?;
        debug!(
            "🗃️ Order [{}] saved with id {}. Commission of {} owed to affiliate #{}",
            stored.order_id, stored.id, commission.commission, affiliate.id
        );
        Ok(OrderProcessed::Processed { order: stored, affiliate, commission, new_affiliate })
    }

    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, CommissionGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_commission_for_order(
        &self,
        order_id: &OrderId,
    ) -> Result<Option<Commission>, CommissionGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let commission = commissions::commission_for_order(order_id, &mut conn).await?;
        Ok(commission)
    }

    async fn close(&mut self) -> Result<(), CommissionGatewayError> {
        self.pool.close().await;
        Ok(())
    }
}

impl AffiliateManagement for SqliteDatabase {
    async fn affiliate_by_email(&self, email: &str) -> Result<Option<Affiliate>, AffiliateApiError> {
        let mut conn = self.pool.acquire().await?;
        let affiliate = affiliates::affiliate_by_email(email, &mut conn).await?;
        Ok(affiliate)
    }

    async fn affiliate_by_id(&self, id: i64) -> Result<Option<Affiliate>, AffiliateApiError> {
        let mut conn = self.pool.acquire().await?;
        let affiliate = affiliates::affiliate_by_id(id, &mut conn).await?;
        Ok(affiliate)
    }

    async fn register_affiliate(&self, affiliate: NewAffiliate) -> Result<Affiliate, AffiliateApiError> {
        let mut conn = self.pool.acquire().await?;
        let affiliate = affiliates::insert_affiliate(affiliate, &mut conn).await?;
        Ok(affiliate)
    }
}

impl MerchantManagement for SqliteDatabase {
    /// The user and merchant rows are written in one transaction. A failure on the second insert rolls back the
    /// first, so registration can never leave an orphaned merchant-typed user behind.
    async fn register_merchant(&self, registration: MerchantRegistration) -> Result<Merchant, MerchantApiError> {
        let mut tx = self.pool.begin().await?;
        let user = NewUser {
            name: registration.name.clone(),
            email: registration.email,
            user_type: UserType::Merchant,
            api_key: registration.api_key,
        };
        let user = merchants::insert_user(user, &mut tx).await?;
        let merchant = merchants::insert_merchant(user.id, &registration.domain, &registration.name, &mut tx).await?;
        tx.commit().await?;
        Ok(merchant)
    }

    async fn update_merchant(&self, user_id: i64, update: MerchantUpdate) -> Result<Merchant, MerchantApiError> {
        let mut tx = self.pool.begin().await?;
        let user = merchants::update_user(user_id, &update.name, &update.email, &update.api_key, &mut tx).await?;
        if user.is_none() {
            return Err(MerchantApiError::UserNotFound(user_id));
        }
        let merchant = merchants::update_merchant(user_id, &update.domain, &update.name, &mut tx)
            .await?
            .ok_or(MerchantApiError::MerchantRecordMissing(user_id))?;
        tx.commit().await?;
        Ok(merchant)
    }

    async fn merchant_by_email(&self, email: &str) -> Result<Option<Merchant>, MerchantApiError> {
        let mut conn = self.pool.acquire().await?;
        let merchant = merchants::merchant_by_email(email, &mut conn).await?;
        Ok(merchant)
    }

    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, MerchantApiError> {
        let mut conn = self.pool.acquire().await?;
        let user = merchants::user_by_id(user_id, &mut conn).await?;
        Ok(user)
    }

    async fn email_taken_by_other(&self, email: &str, user_id: i64) -> Result<bool, MerchantApiError> {
        let mut conn = self.pool.acquire().await?;
        let taken = merchants::email_taken_by_other(email, user_id, &mut conn).await?;
        Ok(taken)
    }

    async fn order_statistics(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<OrderStatistics, MerchantApiError> {
        let mut conn = self.pool.acquire().await?;
        let stats = orders::order_statistics(from, to, &mut conn).await?;
        Ok(stats)
    }
}

impl PayoutManagement for SqliteDatabase {
    async fn fetch_unpaid_orders(&self, affiliate_id: i64) -> Result<Vec<Order>, PayoutError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_unpaid_orders_for_affiliate(affiliate_id, &mut conn).await?;
        Ok(orders)
    }

    async fn mark_order_paid(&self, order_id: i64) -> Result<Order, PayoutError> {
        let mut conn = self.pool.acquire().await?;
        orders::mark_order_paid(order_id, &mut conn).await
    }
}
