//! SQLite backend for the commission engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
use sqlx::SqlitePool;

/// Applies any pending schema migrations. The migration scripts are embedded in the binary.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./src/sqlite/migrations").run(pool).await
}
