use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::tasks;
use crate::error::AppError;
use crate::models::{Comment, CommentInput, Role, User};

const COMMENT_SELECT: &str = "SELECT c.id, c.content, c.task_id, c.author_id, u.name AS author_name, \
                              c.is_deleted, c.created_at, c.updated_at \
                              FROM comments c LEFT JOIN users u ON u.id = c.author_id";

/// Visible comments of a task, oldest first.
pub async fn list_for_task(pool: &SqlitePool, task_id: Uuid) -> Result<Vec<Comment>, AppError> {
    let comments = sqlx::query_as::<_, Comment>(&format!(
        "{} WHERE c.task_id = ? AND c.is_deleted = 0 ORDER BY c.created_at ASC",
        COMMENT_SELECT
    ))
    .bind(task_id)
    .fetch_all(pool)
    .await?;
    Ok(comments)
}

async fn get_visible(pool: &SqlitePool, id: Uuid) -> Result<Comment, AppError> {
    sqlx::query_as::<_, Comment>(&format!(
        "{} WHERE c.id = ? AND c.is_deleted = 0",
        COMMENT_SELECT
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Comment not found".into()))
}

pub async fn create(
    pool: &SqlitePool,
    task_id: Uuid,
    author_id: Uuid,
    input: CommentInput,
) -> Result<Comment, AppError> {
    tasks::get(pool, task_id).await?;

    let id = Uuid::new_v4();
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO comments (id, content, task_id, author_id, is_deleted, created_at, updated_at)
         VALUES (?, ?, ?, ?, 0, ?, ?)",
    )
    .bind(id)
    .bind(input.content.trim())
    .bind(task_id)
    .bind(author_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    get_visible(pool, id).await
}

/// Only the author may edit a comment.
pub async fn update(
    pool: &SqlitePool,
    id: Uuid,
    editor: &User,
    input: CommentInput,
) -> Result<Comment, AppError> {
    let comment = get_visible(pool, id).await?;
    if comment.author_id != editor.id {
        return Err(AppError::Forbidden(
            "Only the author can edit this comment".into(),
        ));
    }

    sqlx::query("UPDATE comments SET content = ?, updated_at = ? WHERE id = ?")
        .bind(input.content.trim())
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;

    get_visible(pool, id).await
}

/// Soft delete by the author or an admin.
pub async fn delete(pool: &SqlitePool, id: Uuid, actor: &User) -> Result<(), AppError> {
    let comment = get_visible(pool, id).await?;
    if comment.author_id != actor.id && actor.role != Role::Admin {
        return Err(AppError::Forbidden(
            "Only the author or an admin can delete this comment".into(),
        ));
    }

    sqlx::query("UPDATE comments SET is_deleted = 1, updated_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
