//! Revocation ledger: the set of `jti`s that must no longer authenticate.
//!
//! Entries are only ever added while the token they name can still verify;
//! `prune_expired` drops entries whose token is past its own expiry.

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::RevokedToken;

/// Records `jti` as revoked. Revoking an already revoked token is a no-op.
pub async fn revoke(pool: &SqlitePool, jti: &str, expires_at: i64) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO revoked_tokens (id, jti, expires_at, created_at)
         VALUES (?, ?, ?, ?)
         ON CONFLICT(jti) DO NOTHING",
    )
    .bind(Uuid::new_v4())
    .bind(jti)
    .bind(expires_at)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find(pool: &SqlitePool, jti: &str) -> Result<Option<RevokedToken>, AppError> {
    let entry = sqlx::query_as::<_, RevokedToken>(
        "SELECT id, jti, expires_at, created_at FROM revoked_tokens WHERE jti = ?",
    )
    .bind(jti)
    .fetch_optional(pool)
    .await?;
    Ok(entry)
}

pub async fn is_revoked(pool: &SqlitePool, jti: &str) -> Result<bool, AppError> {
    Ok(find(pool, jti).await?.is_some())
}

/// Removes entries whose token expired before `now` (unix seconds).
///
/// Only sound because `TokenIssuer::verify` validates expiry without leeway.
pub async fn prune_expired(pool: &SqlitePool, now: i64) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < ?")
        .bind(now)
        .execute(pool)
        .await?;
    if result.rows_affected() > 0 {
        log::info!("Pruned {} expired ledger entries", result.rows_affected());
    }
    Ok(result.rows_affected())
}
