//! SQLite pool setup, schema migrations and the initial admin account.

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use uuid::Uuid;

use crate::auth::hash_password;
use crate::config::Config;
use crate::error::AppError;
use crate::models::Role;

/// Opens the database at `url` (created if missing, foreign keys on) and applies migrations.
pub async fn connect(url: &str) -> Result<SqlitePool, AppError> {
    let opts = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await?;

    log::info!("SQLite pool opened at {}", url);
    migrate(&pool).await?;
    Ok(pool)
}

/// In-memory database for tests.
///
/// The store lives as long as its single connection, so that connection is never reaped.
pub async fn connect_in_memory() -> Result<SqlitePool, AppError> {
    let opts = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(opts)
        .await?;

    migrate(&pool).await?;
    Ok(pool)
}

pub async fn migrate(pool: &SqlitePool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    log::info!("Database migrations applied");
    Ok(())
}

/// Creates the configured admin account when the users table is empty.
///
/// Returns whether an account was created.
pub async fn seed_admin(pool: &SqlitePool, config: &Config) -> Result<bool, AppError> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        return Ok(false);
    }

    let now = Utc::now();
    let password_hash = hash_password(&config.seed_admin_password, config.bcrypt_cost)?;
    sqlx::query(
        "INSERT INTO users (id, name, email, password_hash, role, is_active, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, 1, ?, ?)",
    )
    .bind(Uuid::new_v4())
    .bind("Administrator")
    .bind(&config.seed_admin_email)
    .bind(password_hash)
    .bind(Role::Admin)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    log::info!("Seeded admin account {}", config.seed_admin_email);
    Ok(true)
}
