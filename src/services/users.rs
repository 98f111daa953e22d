use chrono::Utc;
use sqlx::SqlitePool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::auth::{hash_password, verify_password};
use crate::error::AppError;
use crate::models::{ChangePasswordInput, Role, UpdateUserInput, User};

const USER_COLUMNS: &str =
    "id, name, email, password_hash, role, is_active, created_at, updated_at";

pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE id = ?",
        USER_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

/// The stored form of an email address. Every lookup and write goes through it.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_string()
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE email = ?",
        USER_COLUMNS
    ))
    .bind(normalize_email(email))
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn get(pool: &SqlitePool, id: Uuid) -> Result<User, AppError> {
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

pub async fn list_active(pool: &SqlitePool) -> Result<Vec<User>, AppError> {
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE is_active = 1 ORDER BY name",
        USER_COLUMNS
    ))
    .fetch_all(pool)
    .await?;
    Ok(users)
}

/// Display names of every user, active or not, keyed by id.
pub async fn name_map(pool: &SqlitePool) -> Result<HashMap<Uuid, String>, AppError> {
    let rows: Vec<(Uuid, String)> = sqlx::query_as("SELECT id, name FROM users")
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().collect())
}

async fn ensure_email_free(
    pool: &SqlitePool,
    email: &str,
    except: Option<Uuid>,
) -> Result<(), AppError> {
    match find_by_email(pool, email).await? {
        Some(existing) if Some(existing.id) != except => {
            Err(AppError::BadRequest("Email already registered".into()))
        }
        _ => Ok(()),
    }
}

pub async fn create(
    pool: &SqlitePool,
    bcrypt_cost: u32,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
) -> Result<User, AppError> {
    let email = normalize_email(email);
    ensure_email_free(pool, &email, None).await?;

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        name: name.trim().to_string(),
        email,
        password_hash: hash_password(password, bcrypt_cost)?,
        role,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        "INSERT INTO users (id, name, email, password_hash, role, is_active, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(user.id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role)
    .bind(user.is_active)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(pool)
    .await?;

    log::info!("Created user {} ({})", user.email, user.role.as_str());
    Ok(user)
}

/// Applies a partial update. `is_active` is only honoured when `allow_status` is set.
pub async fn update(
    pool: &SqlitePool,
    bcrypt_cost: u32,
    id: Uuid,
    input: UpdateUserInput,
    allow_status: bool,
) -> Result<User, AppError> {
    if input.is_empty() {
        return Err(AppError::BadRequest("No fields to update".into()));
    }

    let mut user = get(pool, id).await?;

    if let Some(email) = input.email.as_deref().map(normalize_email) {
        if email != user.email {
            ensure_email_free(pool, &email, Some(user.id)).await?;
            user.email = email;
        }
    }
    if let Some(name) = input.name {
        user.name = name;
    }
    if let Some(password) = input.password {
        user.password_hash = hash_password(&password, bcrypt_cost)?;
    }
    if allow_status {
        if let Some(is_active) = input.is_active {
            user.is_active = is_active;
        }
    }
    user.updated_at = Utc::now();

    sqlx::query(
        "UPDATE users SET name = ?, email = ?, password_hash = ?, is_active = ?, updated_at = ?
         WHERE id = ?",
    )
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.is_active)
    .bind(user.updated_at)
    .bind(user.id)
    .execute(pool)
    .await?;

    Ok(user)
}

pub async fn set_role(pool: &SqlitePool, id: Uuid, role: Role) -> Result<User, AppError> {
    let result = sqlx::query("UPDATE users SET role = ?, updated_at = ? WHERE id = ?")
        .bind(role)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".into()));
    }
    log::info!("User {} is now {}", id, role.as_str());
    get(pool, id).await
}

/// Marks the user inactive. Projects, tasks and comments referencing the user stay intact.
pub async fn deactivate(pool: &SqlitePool, id: Uuid) -> Result<(), AppError> {
    let result = sqlx::query("UPDATE users SET is_active = 0, updated_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".into()));
    }
    log::info!("Deactivated user {}", id);
    Ok(())
}

pub async fn change_password(
    pool: &SqlitePool,
    bcrypt_cost: u32,
    user: &User,
    input: &ChangePasswordInput,
) -> Result<(), AppError> {
    if !verify_password(&input.current_password, &user.password_hash)? {
        return Err(AppError::BadRequest("Current password is incorrect".into()));
    }
    sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
        .bind(hash_password(&input.new_password, bcrypt_cost)?)
        .bind(Utc::now())
        .bind(user.id)
        .execute(pool)
        .await?;
    Ok(())
}
