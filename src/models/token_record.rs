use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Single-use token issued by `POST /auth/forgot-password`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PasswordResetToken {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

impl PasswordResetToken {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.used && now < self.expires_at
    }
}

/// Ledger entry for a revoked JWT. `expires_at` is the token's own `exp`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RevokedToken {
    pub id: Uuid,
    pub jti: String,
    pub expires_at: i64,
    pub created_at: DateTime<Utc>,
}
