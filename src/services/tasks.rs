use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::{comments, notifications, projects, users};
use crate::error::AppError;
use crate::models::{
    Notification, NotificationCategory, NotificationKind, Task, TaskDetail, TaskInput,
    TaskPriority, TaskQuery, TaskStatus, TaskUpdate,
};

const TASK_COLUMNS: &str = "id, title, description, status, priority, project_id, assigned_to, \
                            due_date, created_at, updated_at";

/// Task counts for a filtered set of tasks.
#[derive(Debug, Default, Serialize, PartialEq)]
pub struct TaskCounts {
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub in_progress_tasks: i64,
    pub pending_tasks: i64,
    pub review_tasks: i64,
    pub tasks_by_status: BTreeMap<&'static str, i64>,
    pub tasks_by_priority: BTreeMap<&'static str, i64>,
    /// Share of done tasks, in percent.
    pub completion_rate: f64,
}

impl TaskCounts {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut tasks_by_status: BTreeMap<&'static str, i64> =
            TaskStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect();
        let mut tasks_by_priority: BTreeMap<&'static str, i64> =
            TaskPriority::ALL.iter().map(|p| (p.as_str(), 0)).collect();

        for task in tasks {
            *tasks_by_status.entry(task.status.as_str()).or_default() += 1;
            *tasks_by_priority.entry(task.priority.as_str()).or_default() += 1;
        }

        let count = |status: TaskStatus| tasks_by_status[status.as_str()];
        let total_tasks = tasks.len() as i64;
        let completed_tasks = count(TaskStatus::Done);

        Self {
            total_tasks,
            completed_tasks,
            in_progress_tasks: count(TaskStatus::InProgress),
            pending_tasks: count(TaskStatus::Todo),
            review_tasks: count(TaskStatus::Review),
            completion_rate: percentage(completed_tasks, total_tasks),
            tasks_by_status,
            tasks_by_priority,
        }
    }
}

pub fn percentage(part: i64, total: i64) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64 * 1000.0).round() / 10.0
    }
}

/// Lists tasks matching every filter that is set, newest first.
pub async fn list(pool: &SqlitePool, query: &TaskQuery) -> Result<Vec<Task>, AppError> {
    let mut sql = format!("SELECT {} FROM tasks", TASK_COLUMNS);
    let mut conditions: Vec<&str> = Vec::new();

    if query.project_id.is_some() {
        conditions.push("project_id = ?");
    }
    if query.assigned_to.is_some() {
        conditions.push("assigned_to = ?");
    }
    if query.status.is_some() {
        conditions.push("status = ?");
    }
    if query.priority.is_some() {
        conditions.push("priority = ?");
    }
    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    if search.is_some() {
        // LIKE is case-insensitive for ASCII in SQLite.
        conditions.push("(title LIKE ? OR description LIKE ?)");
    }

    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
    sql.push_str(" ORDER BY created_at DESC");

    let mut query_builder = sqlx::query_as::<_, Task>(&sql);
    if let Some(project_id) = query.project_id {
        query_builder = query_builder.bind(project_id);
    }
    if let Some(assigned_to) = query.assigned_to {
        query_builder = query_builder.bind(assigned_to);
    }
    if let Some(status) = query.status {
        query_builder = query_builder.bind(status);
    }
    if let Some(priority) = query.priority {
        query_builder = query_builder.bind(priority);
    }
    if let Some(search) = search {
        let pattern = format!("%{}%", search);
        query_builder = query_builder.bind(pattern.clone()).bind(pattern);
    }

    Ok(query_builder.fetch_all(pool).await?)
}

pub async fn list_for_project(pool: &SqlitePool, project_id: Uuid) -> Result<Vec<Task>, AppError> {
    let filter = TaskQuery {
        project_id: Some(project_id),
        ..Default::default()
    };
    list(pool, &filter).await
}

pub async fn counts(pool: &SqlitePool, query: &TaskQuery) -> Result<TaskCounts, AppError> {
    Ok(TaskCounts::from_tasks(&list(pool, query).await?))
}

pub async fn get(pool: &SqlitePool, id: Uuid) -> Result<Task, AppError> {
    sqlx::query_as::<_, Task>(&format!("SELECT {} FROM tasks WHERE id = ?", TASK_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))
}

pub async fn detail(pool: &SqlitePool, id: Uuid) -> Result<TaskDetail, AppError> {
    let task = get(pool, id).await?;
    let comments = comments::list_for_task(pool, id).await?;
    Ok(TaskDetail { task, comments })
}

async fn ensure_assignee(pool: &SqlitePool, assigned_to: Option<Uuid>) -> Result<(), AppError> {
    if let Some(user_id) = assigned_to {
        match users::find_by_id(pool, user_id).await? {
            Some(user) if user.is_active => {}
            _ => return Err(AppError::BadRequest("Assigned user not found".into())),
        }
    }
    Ok(())
}

async fn notify_assignee(conn: &mut SqliteConnection, task: &Task) -> Result<(), AppError> {
    if let Some(user_id) = task.assigned_to {
        let notification = Notification::new(
            user_id,
            "New task assigned",
            format!("You have been assigned the task \"{}\"", task.title),
            NotificationKind::Info,
            NotificationCategory::Task,
        );
        notifications::create(conn, &notification).await?;
    }
    Ok(())
}

/// Creates a task inside `project_id`. The project and the assignee must exist.
///
/// The task and the assignee's notification commit together.
pub async fn create(
    pool: &SqlitePool,
    input: TaskInput,
    project_id: Uuid,
) -> Result<Task, AppError> {
    projects::get(pool, project_id).await?;
    ensure_assignee(pool, input.assigned_to).await?;

    let task = Task::new(input, project_id);
    let mut tx = pool.begin().await?;
    sqlx::query(
        "INSERT INTO tasks (id, title, description, status, priority, project_id, assigned_to, due_date, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(task.id)
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.status)
    .bind(task.priority)
    .bind(task.project_id)
    .bind(task.assigned_to)
    .bind(task.due_date)
    .bind(task.created_at)
    .bind(task.updated_at)
    .execute(&mut *tx)
    .await?;

    notify_assignee(&mut *tx, &task).await?;
    tx.commit().await?;
    Ok(task)
}

async fn save(conn: &mut SqliteConnection, task: &Task) -> Result<(), AppError> {
    sqlx::query(
        "UPDATE tasks
         SET title = ?, description = ?, status = ?, priority = ?, assigned_to = ?, due_date = ?, updated_at = ?
         WHERE id = ?",
    )
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.status)
    .bind(task.priority)
    .bind(task.assigned_to)
    .bind(task.due_date)
    .bind(task.updated_at)
    .bind(task.id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Applies a partial update. A changed assignee receives a notification.
pub async fn update(pool: &SqlitePool, id: Uuid, input: TaskUpdate) -> Result<Task, AppError> {
    let mut task = get(pool, id).await?;
    let previous_assignee = task.assigned_to;
    ensure_assignee(pool, input.assigned_to.flatten()).await?;

    task.apply(input);
    let mut tx = pool.begin().await?;
    save(&mut *tx, &task).await?;
    if task.assigned_to != previous_assignee {
        notify_assignee(&mut *tx, &task).await?;
    }
    tx.commit().await?;
    Ok(task)
}

pub async fn set_status(pool: &SqlitePool, id: Uuid, status: TaskStatus) -> Result<Task, AppError> {
    update(
        pool,
        id,
        TaskUpdate {
            status: Some(status),
            ..Default::default()
        },
    )
    .await
}

/// Deletes the task and its comments.
pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    let comments = sqlx::query("DELETE FROM comments WHERE task_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    let task = sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if task.rows_affected() == 0 {
        return Err(AppError::NotFound("Task not found".into()));
    }

    tx.commit().await?;
    log::info!(
        "Deleted task {} with {} comments",
        id,
        comments.rows_affected()
    );
    Ok(())
}
