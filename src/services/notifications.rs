use serde::Serialize;
use sqlx::{Executor, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Notification, NotificationQuery};

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, title, message, kind, category, unread, created_at";

#[derive(Debug, Serialize)]
pub struct NotificationPage {
    pub notifications: Vec<Notification>,
    pub unread_count: i64,
    pub total: i64,
}

/// Inserts `notification`, on the pool or inside a caller's transaction.
pub async fn create<'e, E>(executor: E, notification: &Notification) -> Result<(), AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "INSERT INTO notifications (id, user_id, title, message, kind, category, unread, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(notification.id)
    .bind(notification.user_id)
    .bind(&notification.title)
    .bind(&notification.message)
    .bind(notification.kind)
    .bind(notification.category)
    .bind(notification.unread)
    .bind(notification.created_at)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn list(
    pool: &SqlitePool,
    user_id: Uuid,
    query: &NotificationQuery,
) -> Result<NotificationPage, AppError> {
    let limit = query.limit.clamp(1, 100);
    let offset = query.offset.max(0);
    let unread_filter = if query.unread_only { " AND unread = 1" } else { "" };

    let notifications = sqlx::query_as::<_, Notification>(&format!(
        "SELECT {} FROM notifications WHERE user_id = ?{} ORDER BY created_at DESC LIMIT ? OFFSET ?",
        NOTIFICATION_COLUMNS, unread_filter
    ))
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let (total,): (i64,) = sqlx::query_as(&format!(
        "SELECT COUNT(*) FROM notifications WHERE user_id = ?{}",
        unread_filter
    ))
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(NotificationPage {
        notifications,
        unread_count: unread_count(pool, user_id).await?,
        total,
    })
}

pub async fn unread_count(pool: &SqlitePool, user_id: Uuid) -> Result<i64, AppError> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM notifications WHERE user_id = ? AND unread = 1")
            .bind(user_id)
            .fetch_one(pool)
            .await?;
    Ok(count)
}

pub async fn mark_read(pool: &SqlitePool, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
    let result = sqlx::query("UPDATE notifications SET unread = 0 WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Notification not found".into()));
    }
    Ok(())
}

pub async fn mark_all_read(pool: &SqlitePool, user_id: Uuid) -> Result<u64, AppError> {
    let result =
        sqlx::query("UPDATE notifications SET unread = 0 WHERE user_id = ? AND unread = 1")
            .bind(user_id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected())
}

pub async fn delete(pool: &SqlitePool, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM notifications WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Notification not found".into()));
    }
    Ok(())
}

pub async fn delete_all(pool: &SqlitePool, user_id: Uuid) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM notifications WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
