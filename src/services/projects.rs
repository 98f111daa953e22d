use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::tasks::{self, TaskCounts};
use crate::error::AppError;
use crate::models::{Project, ProjectDetail, ProjectInput, ProjectStatus, ProjectUpdate};

const PROJECT_COLUMNS: &str =
    "id, name, description, status, priority, end_date, created_by, created_at, updated_at";

#[derive(Debug, Serialize)]
pub struct ProjectStats {
    pub project_id: Uuid,
    #[serde(flatten)]
    pub tasks: TaskCounts,
}

pub async fn list(pool: &SqlitePool) -> Result<Vec<Project>, AppError> {
    let projects = sqlx::query_as::<_, Project>(&format!(
        "SELECT {} FROM projects ORDER BY created_at DESC",
        PROJECT_COLUMNS
    ))
    .fetch_all(pool)
    .await?;
    Ok(projects)
}

pub async fn get(pool: &SqlitePool, id: Uuid) -> Result<Project, AppError> {
    sqlx::query_as::<_, Project>(&format!(
        "SELECT {} FROM projects WHERE id = ?",
        PROJECT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Project not found".into()))
}

pub async fn detail(pool: &SqlitePool, id: Uuid) -> Result<ProjectDetail, AppError> {
    let project = get(pool, id).await?;
    let tasks = tasks::list_for_project(pool, id).await?;
    Ok(ProjectDetail { project, tasks })
}

pub async fn create(
    pool: &SqlitePool,
    input: ProjectInput,
    created_by: Uuid,
) -> Result<Project, AppError> {
    let project = Project::new(input, created_by);

    sqlx::query(
        "INSERT INTO projects (id, name, description, status, priority, end_date, created_by, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(project.id)
    .bind(&project.name)
    .bind(&project.description)
    .bind(project.status)
    .bind(project.priority)
    .bind(project.end_date)
    .bind(project.created_by)
    .bind(project.created_at)
    .bind(project.updated_at)
    .execute(pool)
    .await?;

    log::info!("Project {} created by {}", project.id, created_by);
    Ok(project)
}

pub async fn update(pool: &SqlitePool, id: Uuid, input: ProjectUpdate) -> Result<Project, AppError> {
    let mut project = get(pool, id).await?;
    project.apply(input);

    sqlx::query(
        "UPDATE projects
         SET name = ?, description = ?, status = ?, priority = ?, end_date = ?, updated_at = ?
         WHERE id = ?",
    )
    .bind(&project.name)
    .bind(&project.description)
    .bind(project.status)
    .bind(project.priority)
    .bind(project.end_date)
    .bind(project.updated_at)
    .bind(project.id)
    .execute(pool)
    .await?;

    Ok(project)
}

/// Deletes the project together with its tasks and their comments.
pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    let comments = sqlx::query(
        "DELETE FROM comments WHERE task_id IN (SELECT id FROM tasks WHERE project_id = ?)",
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;
    let tasks = sqlx::query("DELETE FROM tasks WHERE project_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    let project = sqlx::query("DELETE FROM projects WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    if project.rows_affected() == 0 {
        return Err(AppError::NotFound("Project not found".into()));
    }

    tx.commit().await?;
    log::info!(
        "Deleted project {} with {} tasks and {} comments",
        id,
        tasks.rows_affected(),
        comments.rows_affected()
    );
    Ok(())
}

pub async fn stats(pool: &SqlitePool, id: Uuid) -> Result<ProjectStats, AppError> {
    get(pool, id).await?;
    let filter = crate::models::TaskQuery {
        project_id: Some(id),
        ..Default::default()
    };
    Ok(ProjectStats {
        project_id: id,
        tasks: tasks::counts(pool, &filter).await?,
    })
}

/// Number of projects per status, every status present.
pub async fn count_by_status(pool: &SqlitePool) -> Result<Vec<(ProjectStatus, i64)>, AppError> {
    let rows: Vec<(ProjectStatus, i64)> =
        sqlx::query_as("SELECT status, COUNT(*) FROM projects GROUP BY status")
            .fetch_all(pool)
            .await?;

    Ok(ProjectStatus::ALL
        .iter()
        .map(|status| {
            let count = rows
                .iter()
                .find(|(s, _)| s == status)
                .map(|(_, n)| *n)
                .unwrap_or(0);
            (*status, count)
        })
        .collect())
}
