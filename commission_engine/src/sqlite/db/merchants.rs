//! Queries for the `users` and `merchants` tables. They are kept together because merchant management always
//! touches both: a merchant is a 1:1 extension of a merchant-typed user.
use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{Merchant, NewUser, User, UserType};

pub async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<User, sqlx::Error> {
    let user: User = sqlx::query_as(
        r#"
            INSERT INTO users (name, email, user_type, password)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(user.name)
    .bind(user.email)
    .bind(user.user_type.to_string())
    .bind(user.api_key)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ User {} created with id {}", user.email, user.id);
    Ok(user)
}

pub async fn user_by_id(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(user_id).fetch_optional(conn).await?;
    Ok(user)
}

pub async fn user_by_email(email: &str, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as("SELECT * FROM users WHERE email = $1").bind(email).fetch_optional(conn).await?;
    Ok(user)
}

/// True when the email is already used by a user other than `user_id`. Backs the uniqueness rule of the merchant
/// update validation, which excludes the user being updated.
pub async fn email_taken_by_other(email: &str, user_id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1 AND id != $2 LIMIT 1")
        .bind(email)
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(row.is_some())
}

pub async fn update_user(
    user_id: i64,
    name: &str,
    email: &str,
    api_key: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as(
        "UPDATE users SET name = $1, email = $2, password = $3, updated_at = CURRENT_TIMESTAMP \
         WHERE id = $4 RETURNING *",
    )
    .bind(name)
    .bind(email)
    .bind(api_key)
    .bind(user_id)
    .fetch_optional(conn)
    .await?;
    Ok(user)
}

pub async fn insert_merchant(
    user_id: i64,
    domain: &str,
    display_name: &str,
    conn: &mut SqliteConnection,
) -> Result<Merchant, sqlx::Error> {
    let merchant: Merchant = sqlx::query_as(
        r#"
            INSERT INTO merchants (user_id, domain, display_name)
            VALUES ($1, $2, $3)
            RETURNING *;
        "#,
    )
    .bind(user_id)
    .bind(domain)
    .bind(display_name)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Merchant {} created for user #{user_id}", merchant.domain);
    Ok(merchant)
}

pub async fn merchant_by_user_id(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<Merchant>, sqlx::Error> {
    let merchant =
        sqlx::query_as("SELECT * FROM merchants WHERE user_id = $1").bind(user_id).fetch_optional(conn).await?;
    Ok(merchant)
}

pub async fn update_merchant(
    user_id: i64,
    domain: &str,
    display_name: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Merchant>, sqlx::Error> {
    let merchant = sqlx::query_as(
        "UPDATE merchants SET domain = $1, display_name = $2, updated_at = CURRENT_TIMESTAMP \
         WHERE user_id = $3 RETURNING *",
    )
    .bind(domain)
    .bind(display_name)
    .bind(user_id)
    .fetch_optional(conn)
    .await?;
    Ok(merchant)
}

/// Resolves a user by email and returns the linked merchant record if, and only if, the user is merchant-typed.
pub async fn merchant_by_email(email: &str, conn: &mut SqliteConnection) -> Result<Option<Merchant>, sqlx::Error> {
    let user = user_by_email(email, &mut *conn).await?;
    match user {
        Some(user) if user.user_type == UserType::Merchant => merchant_by_user_id(user.id, conn).await,
        _ => Ok(None),
    }
}
