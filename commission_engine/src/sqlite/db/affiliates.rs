use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{Affiliate, NewAffiliate};

/// Returns the affiliate record for the given email. When duplicate emails exist, the earliest record wins so that
/// attribution is stable.
pub async fn affiliate_by_email(email: &str, conn: &mut SqliteConnection) -> Result<Option<Affiliate>, sqlx::Error> {
    let affiliate = sqlx::query_as("SELECT * FROM affiliates WHERE email = $1 ORDER BY id ASC LIMIT 1")
        .bind(email)
        .fetch_optional(conn)
        .await?;
    Ok(affiliate)
}

pub async fn affiliate_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Affiliate>, sqlx::Error> {
    let affiliate = sqlx::query_as("SELECT * FROM affiliates WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(affiliate)
}

pub async fn insert_affiliate(affiliate: NewAffiliate, conn: &mut SqliteConnection) -> Result<Affiliate, sqlx::Error> {
    let affiliate: Affiliate = sqlx::query_as(
        r#"
            INSERT INTO affiliates (email, discount_code, commission_rate)
            VALUES ($1, $2, $3)
            RETURNING *;
        "#,
    )
    .bind(affiliate.email)
    .bind(affiliate.discount_code)
    .bind(affiliate.commission_rate)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Affiliate {} registered with id {}", affiliate.email, affiliate.id);
    Ok(affiliate)
}

/// Looks the affiliate up by email, registering a new record if the email is unknown. The second element of the
/// returned pair is `true` when a new record was created.
pub async fn fetch_or_create_affiliate(
    affiliate: NewAffiliate,
    conn: &mut SqliteConnection,
) -> Result<(Affiliate, bool), sqlx::Error> {
    match affiliate_by_email(&affiliate.email, &mut *conn).await? {
        Some(existing) => Ok((existing, false)),
        None => {
            let created = insert_affiliate(affiliate, conn).await?;
            Ok((created, true))
        },
    }
}
