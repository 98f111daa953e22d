//! Aggregated counts for dashboards and reports.

use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::projects;
use super::tasks::{self, percentage, TaskCounts};
use crate::error::AppError;
use crate::models::{ProjectStatus, TaskQuery, TaskStatus};

pub const DEFAULT_TIMELINE_DAYS: i64 = 30;
const MAX_TIMELINE_DAYS: i64 = 365;

#[derive(Debug, Serialize)]
pub struct ProjectMetrics {
    pub total_projects: i64,
    pub projects_by_status: BTreeMap<&'static str, i64>,
    #[serde(flatten)]
    pub tasks: TaskCounts,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Summary {
    pub total_projects: i64,
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub in_progress_tasks: i64,
    pub pending_tasks: i64,
}

#[derive(Debug, Serialize)]
pub struct GeneralMetrics {
    pub projects: ProjectMetrics,
    pub summary: Summary,
}

/// Parallel label/value series for a bar or pie chart.
#[derive(Debug, Serialize, PartialEq)]
pub struct ChartData {
    pub labels: Vec<&'static str>,
    pub values: Vec<i64>,
}

impl ChartData {
    fn from_counts(counts: &BTreeMap<&'static str, i64>, order: &[&'static str]) -> Self {
        Self {
            labels: order.to_vec(),
            values: order
                .iter()
                .map(|label| counts.get(label).copied().unwrap_or(0))
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProjectProgress {
    pub project_id: Uuid,
    pub name: String,
    pub status: ProjectStatus,
    pub total_tasks: i64,
    pub completed_tasks: i64,
    /// Percentage of done tasks.
    pub progress: f64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct TimelinePoint {
    pub date: NaiveDate,
    pub created: i64,
    /// Tasks in `done` whose last change fell on this day.
    pub completed: i64,
}

pub async fn all_projects(pool: &SqlitePool) -> Result<ProjectMetrics, AppError> {
    let by_status = projects::count_by_status(pool).await?;
    let total_projects = by_status.iter().map(|(_, n)| n).sum();
    Ok(ProjectMetrics {
        total_projects,
        projects_by_status: by_status
            .into_iter()
            .map(|(status, n)| (status.as_str(), n))
            .collect(),
        tasks: tasks::counts(pool, &TaskQuery::default()).await?,
    })
}

pub async fn general(pool: &SqlitePool) -> Result<GeneralMetrics, AppError> {
    let projects = all_projects(pool).await?;
    let summary = Summary {
        total_projects: projects.total_projects,
        total_tasks: projects.tasks.total_tasks,
        completed_tasks: projects.tasks.completed_tasks,
        in_progress_tasks: projects.tasks.in_progress_tasks,
        pending_tasks: projects.tasks.pending_tasks,
    };
    Ok(GeneralMetrics { projects, summary })
}

pub async fn project(pool: &SqlitePool, id: Uuid) -> Result<projects::ProjectStats, AppError> {
    projects::stats(pool, id).await
}

pub async fn task_metrics(pool: &SqlitePool, filter: &TaskQuery) -> Result<TaskCounts, AppError> {
    tasks::counts(pool, filter).await
}

fn project_filter(project_id: Option<Uuid>) -> TaskQuery {
    TaskQuery {
        project_id,
        ..Default::default()
    }
}

pub async fn tasks_by_status(
    pool: &SqlitePool,
    project_id: Option<Uuid>,
) -> Result<ChartData, AppError> {
    let counts = tasks::counts(pool, &project_filter(project_id)).await?;
    let order: Vec<&'static str> = TaskStatus::ALL.iter().map(|s| s.as_str()).collect();
    Ok(ChartData::from_counts(&counts.tasks_by_status, &order))
}

pub async fn tasks_by_priority(
    pool: &SqlitePool,
    project_id: Option<Uuid>,
) -> Result<ChartData, AppError> {
    let counts = tasks::counts(pool, &project_filter(project_id)).await?;
    Ok(ChartData::from_counts(
        &counts.tasks_by_priority,
        &["high", "medium", "low"],
    ))
}

pub async fn projects_progress(pool: &SqlitePool) -> Result<Vec<ProjectProgress>, AppError> {
    let mut progress = Vec::new();
    for project in projects::list(pool).await? {
        let counts = tasks::counts(pool, &project_filter(Some(project.id))).await?;
        progress.push(ProjectProgress {
            project_id: project.id,
            name: project.name,
            status: project.status,
            total_tasks: counts.total_tasks,
            completed_tasks: counts.completed_tasks,
            progress: percentage(counts.completed_tasks, counts.total_tasks),
        });
    }
    Ok(progress)
}

/// Per-day created and completed counts for the last `days` days, oldest first.
///
/// `days` is clamped to 1..=365.
pub async fn tasks_timeline(
    pool: &SqlitePool,
    project_id: Option<Uuid>,
    days: i64,
) -> Result<Vec<TimelinePoint>, AppError> {
    let days = days.clamp(1, MAX_TIMELINE_DAYS);
    let today = Utc::now().date_naive();
    let start = today - Duration::days(days - 1);

    let mut points: BTreeMap<NaiveDate, TimelinePoint> = (0..days)
        .map(|offset| {
            let date = start + Duration::days(offset);
            (
                date,
                TimelinePoint {
                    date,
                    created: 0,
                    completed: 0,
                },
            )
        })
        .collect();

    for task in tasks::list(pool, &project_filter(project_id)).await? {
        if let Some(point) = points.get_mut(&task.created_at.date_naive()) {
            point.created += 1;
        }
        if task.status == TaskStatus::Done {
            if let Some(point) = points.get_mut(&task.updated_at.date_naive()) {
                point.completed += 1;
            }
        }
    }

    Ok(points.into_values().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{ProjectInput, Role, TaskInput, TaskPriority};
    use crate::services::users;

    async fn seeded() -> (SqlitePool, Uuid) {
        let pool = db::connect_in_memory().await.unwrap();
        let owner = users::create(&pool, 4, "Owner", "o@example.com", "secret1", Role::Admin)
            .await
            .unwrap();
        let project = projects::create(
            &pool,
            ProjectInput {
                name: "Metrics".to_string(),
                description: None,
                status: Some(ProjectStatus::Active),
                priority: None,
                end_date: None,
            },
            owner.id,
        )
        .await
        .unwrap();

        for (title, status, priority) in [
            ("a", TaskStatus::Done, TaskPriority::High),
            ("b", TaskStatus::Todo, TaskPriority::High),
            ("c", TaskStatus::InProgress, TaskPriority::Low),
            ("d", TaskStatus::Done, TaskPriority::Medium),
        ] {
            tasks::create(
                &pool,
                TaskInput {
                    title: title.to_string(),
                    description: None,
                    project_id: None,
                    assigned_to: None,
                    status: Some(status),
                    priority: Some(priority),
                    due_date: None,
                },
                project.id,
            )
            .await
            .unwrap();
        }
        (pool, project.id)
    }

    #[actix_rt::test]
    async fn test_general_summary() {
        let (pool, _) = seeded().await;
        let metrics = general(&pool).await.unwrap();
        assert_eq!(
            metrics.summary,
            Summary {
                total_projects: 1,
                total_tasks: 4,
                completed_tasks: 2,
                in_progress_tasks: 1,
                pending_tasks: 1,
            }
        );
        assert_eq!(metrics.projects.projects_by_status["active"], 1);
    }

    #[actix_rt::test]
    async fn test_charts() {
        let (pool, project_id) = seeded().await;

        let by_status = tasks_by_status(&pool, Some(project_id)).await.unwrap();
        assert_eq!(by_status.labels, vec!["todo", "in_progress", "review", "done"]);
        assert_eq!(by_status.values, vec![1, 1, 0, 2]);

        let by_priority = tasks_by_priority(&pool, None).await.unwrap();
        assert_eq!(by_priority.values, vec![2, 1, 1]);

        let progress = projects_progress(&pool).await.unwrap();
        assert_eq!(progress.len(), 1);
        assert_eq!(progress[0].progress, 50.0);
    }

    #[actix_rt::test]
    async fn test_timeline_covers_requested_days() {
        let (pool, _) = seeded().await;
        let timeline = tasks_timeline(&pool, None, 7).await.unwrap();
        assert_eq!(timeline.len(), 7);
        let today = timeline.last().unwrap();
        assert_eq!(today.date, Utc::now().date_naive());
        assert_eq!(today.created, 4);
        assert_eq!(today.completed, 2);

        assert_eq!(tasks_timeline(&pool, None, 0).await.unwrap().len(), 1);
        assert_eq!(tasks_timeline(&pool, None, 5000).await.unwrap().len(), 365);
    }
}
