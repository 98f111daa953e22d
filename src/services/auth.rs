//! Credential checks, token lifecycle and the password reset flow.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{Duration, Utc};
use rand::RngCore;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{revocation, users};
use crate::auth::{hash_password, verify_password, AuthError, Claims, TokenType};
use crate::error::AppError;
use crate::mailer;
use crate::models::{PasswordResetToken, Role, User};
use crate::state::AppState;

/// Looks up the active user with exactly this email and checks the password.
pub async fn verify_credentials(
    pool: &SqlitePool,
    email: &str,
    password: &str,
) -> Result<User, AppError> {
    let user = match users::find_by_email(pool, email).await? {
        Some(user) if user.is_active => user,
        _ => return Err(AuthError::UserNotFound.into()),
    };

    if !verify_password(password, &user.password_hash)? {
        log::warn!("Failed login for {}", email);
        return Err(AuthError::InvalidCredential.into());
    }
    Ok(user)
}

/// Self-service registration. New accounts always start as contributors.
pub async fn register(
    state: &AppState,
    name: &str,
    email: &str,
    password: &str,
) -> Result<User, AppError> {
    users::create(
        &state.pool,
        state.config.bcrypt_cost,
        name,
        email,
        password,
        Role::Contributor,
    )
    .await
}

/// Mints a new access token for the subject of an already verified refresh token.
pub async fn refresh(state: &AppState, claims: &Claims) -> Result<String, AppError> {
    match users::find_by_id(&state.pool, claims.sub).await? {
        Some(user) if user.is_active => state.tokens.issue(user.id, TokenType::Access),
        Some(_) => Err(AuthError::InactiveUser.into()),
        None => Err(AuthError::UserNotFound.into()),
    }
}

/// Revokes the presented access token and, when given, the caller's refresh token.
pub async fn logout(
    state: &AppState,
    claims: &Claims,
    refresh_token: Option<&str>,
) -> Result<(), AppError> {
    revocation::revoke(&state.pool, &claims.jti, claims.exp).await?;

    if let Some(token) = refresh_token {
        match state.tokens.verify_as(token, TokenType::Refresh) {
            Ok(refresh) if refresh.sub == claims.sub => {
                revocation::revoke(&state.pool, &refresh.jti, refresh.exp).await?;
            }
            Ok(_) => log::warn!("Ignoring refresh token of another user on logout"),
            Err(err) => log::debug!("Ignoring refresh token on logout: {}", err),
        }
    }

    revocation::prune_expired(&state.pool, Utc::now().timestamp()).await?;
    log::info!("User {} logged out", claims.sub);
    Ok(())
}

fn generate_reset_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Issues a reset token and mails the link when an active account has this email.
///
/// Unknown emails are silently accepted so the response never reveals which accounts exist.
pub async fn forgot_password(state: &AppState, email: &str) -> Result<(), AppError> {
    let user = match users::find_by_email(&state.pool, email).await? {
        Some(user) if user.is_active => user,
        _ => {
            log::info!("Password reset requested for unknown email");
            return Ok(());
        }
    };

    let now = Utc::now();
    let token = generate_reset_token();
    sqlx::query(
        "INSERT INTO password_reset_tokens (id, token, user_id, expires_at, used, created_at)
         VALUES (?, ?, ?, ?, 0, ?)",
    )
    .bind(Uuid::new_v4())
    .bind(&token)
    .bind(user.id)
    .bind(now + Duration::hours(state.config.reset_token_ttl_hours))
    .bind(now)
    .execute(&state.pool)
    .await?;

    let link = mailer::reset_link(&state.config.frontend_url, &token);
    state
        .mailer
        .send_password_reset(&user.email, &user.name, &link)?;
    log::info!("Issued password reset token for user {}", user.id);
    Ok(())
}

async fn find_reset_token<'e, E>(executor: E, token: &str) -> Result<PasswordResetToken, AppError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query_as::<_, PasswordResetToken>(
        "SELECT id, token, user_id, expires_at, used, created_at
         FROM password_reset_tokens WHERE token = ?",
    )
    .bind(token)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| AuthError::InvalidResetToken("token not found".into()).into())
}

fn expired_or_used() -> AppError {
    AuthError::InvalidResetToken("token expired or already used".into()).into()
}

pub async fn verify_reset_token(
    pool: &SqlitePool,
    token: &str,
) -> Result<PasswordResetToken, AppError> {
    let record = find_reset_token(pool, token).await?;
    if !record.is_valid_at(Utc::now()) {
        return Err(expired_or_used());
    }
    Ok(record)
}

/// Consumes the token and stores the new password hash in one transaction.
pub async fn reset_password(
    state: &AppState,
    token: &str,
    new_password: &str,
) -> Result<(), AppError> {
    let mut tx = state.pool.begin().await?;

    let record = find_reset_token(&mut *tx, token).await?;
    if !record.is_valid_at(Utc::now()) {
        return Err(expired_or_used());
    }

    // Guarded flip: a concurrent consumer leaves zero rows for us.
    let flipped = sqlx::query("UPDATE password_reset_tokens SET used = 1 WHERE id = ? AND used = 0")
        .bind(record.id)
        .execute(&mut *tx)
        .await?;
    if flipped.rows_affected() != 1 {
        return Err(expired_or_used());
    }

    let password_hash = hash_password(new_password, state.config.bcrypt_cost)?;
    let updated = sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
        .bind(password_hash)
        .bind(Utc::now())
        .bind(record.user_id)
        .execute(&mut *tx)
        .await?;
    if updated.rows_affected() != 1 {
        return Err(AppError::NotFound("User not found".into()));
    }

    tx.commit().await?;
    log::info!("Password reset completed for user {}", record.user_id);
    Ok(())
}
