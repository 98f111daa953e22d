//! PDF reports.
//!
//! A report is first assembled into a [`ReportDocument`] from storage, then
//! handed to [`render::render`] which lays it out on A4 pages.

pub mod render;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::SqlitePool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Project, Task, TaskQuery};
use crate::services::metrics::{self, ProjectProgress};
use crate::services::tasks::TaskCounts;
use crate::services::{projects, tasks, users};

pub use render::render;

/// Tasks listed in a custom report before the remainder is summarised.
pub const CUSTOM_REPORT_TASK_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    fn row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading(String),
    Paragraph(String),
    Table(Table),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    pub title: String,
    pub subtitle: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub blocks: Vec<Block>,
}

impl ReportDocument {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: None,
            generated_at: Utc::now(),
            blocks: Vec::new(),
        }
    }

    pub fn subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn heading(&mut self, text: impl Into<String>) {
        self.blocks.push(Block::Heading(text.into()));
    }

    pub fn paragraph(&mut self, text: impl Into<String>) {
        self.blocks.push(Block::Paragraph(text.into()));
    }

    pub fn table(&mut self, table: Table) {
        self.blocks.push(Block::Table(table));
    }

    /// `{prefix}_{YYYYmmdd_HHMMSS}.pdf`, stamped with the generation time.
    pub fn file_name(&self, prefix: &str) -> String {
        format!(
            "{}_{}.pdf",
            prefix,
            self.generated_at.format("%Y%m%d_%H%M%S")
        )
    }
}

/// Body of `POST /pdf/report/custom`.
#[derive(Debug, Deserialize)]
pub struct CustomReportRequest {
    pub title: Option<String>,
    #[serde(default = "enabled")]
    pub include_projects: bool,
    #[serde(default = "enabled")]
    pub include_tasks: bool,
    #[serde(default = "enabled")]
    pub include_metrics: bool,
    #[serde(default)]
    pub filters: TaskQuery,
}

fn enabled() -> bool {
    true
}

fn or_dash(value: Option<impl ToString>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn summary_table(counts: &TaskCounts) -> Table {
    let mut table = Table::new(&["Metric", "Value"]);
    table.row(["Total tasks".to_string(), counts.total_tasks.to_string()]);
    table.row(["Completed".to_string(), counts.completed_tasks.to_string()]);
    table.row(["In progress".to_string(), counts.in_progress_tasks.to_string()]);
    table.row(["In review".to_string(), counts.review_tasks.to_string()]);
    table.row(["Pending".to_string(), counts.pending_tasks.to_string()]);
    table.row([
        "Completion rate".to_string(),
        format!("{:.1}%", counts.completion_rate),
    ]);
    table
}

fn breakdown_table(label: &str, counts: &TaskCounts) -> Table {
    let mut table = Table::new(&[label, "Tasks"]);
    for (status, n) in &counts.tasks_by_status {
        table.row([status.to_string(), n.to_string()]);
    }
    table
}

fn priority_table(counts: &TaskCounts) -> Table {
    let mut table = Table::new(&["Priority", "Tasks"]);
    for (priority, n) in &counts.tasks_by_priority {
        table.row([priority.to_string(), n.to_string()]);
    }
    table
}

fn project_table(projects: &[Project]) -> Table {
    let mut table = Table::new(&["Name", "Status", "Priority", "End date"]);
    for project in projects {
        table.row([
            project.name.clone(),
            project.status.as_str().to_string(),
            project.priority.as_str().to_string(),
            or_dash(project.end_date),
        ]);
    }
    table
}

fn progress_table(progress: &[ProjectProgress]) -> Table {
    let mut table = Table::new(&["Project", "Status", "Done", "Total", "Progress"]);
    for entry in progress {
        table.row([
            entry.name.clone(),
            entry.status.as_str().to_string(),
            entry.completed_tasks.to_string(),
            entry.total_tasks.to_string(),
            format!("{:.1}%", entry.progress),
        ]);
    }
    table
}

fn task_table(
    tasks: &[Task],
    users: &HashMap<Uuid, String>,
    projects: Option<&HashMap<Uuid, String>>,
) -> Table {
    let mut headers = vec!["Title", "Status", "Priority", "Assignee", "Due"];
    if projects.is_some() {
        headers.insert(1, "Project");
    }
    let mut table = Table::new(&headers);

    for task in tasks {
        let mut cells = vec![
            task.title.clone(),
            task.status.as_str().to_string(),
            task.priority.as_str().to_string(),
            task.assigned_to
                .and_then(|id| users.get(&id).cloned())
                .unwrap_or_else(|| "Unassigned".to_string()),
            or_dash(task.due_date),
        ];
        if let Some(projects) = projects {
            cells.insert(1, or_dash(projects.get(&task.project_id)));
        }
        table.row(cells);
    }
    table
}

async fn project_names(pool: &SqlitePool) -> Result<HashMap<Uuid, String>, AppError> {
    Ok(projects::list(pool)
        .await?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect())
}

fn describe_filter(filter: &TaskQuery, projects: &HashMap<Uuid, String>) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(id) = filter.project_id {
        parts.push(format!("project: {}", or_dash(projects.get(&id))));
    }
    if let Some(status) = filter.status {
        parts.push(format!("status: {}", status.as_str()));
    }
    if let Some(priority) = filter.priority {
        parts.push(format!("priority: {}", priority.as_str()));
    }
    if let Some(search) = &filter.search {
        parts.push(format!("search: \"{}\"", search));
    }
    if parts.is_empty() {
        None
    } else {
        Some(format!("Filters: {}", parts.join(", ")))
    }
}

pub async fn project_report(pool: &SqlitePool, id: Uuid) -> Result<ReportDocument, AppError> {
    let detail = projects::detail(pool, id).await?;
    let users = users::name_map(pool).await?;
    let counts = TaskCounts::from_tasks(&detail.tasks);
    let project = detail.project;

    let mut doc = ReportDocument::new(format!("Project Report: {}", project.name))
        .subtitle(format!(
            "Status: {} | Priority: {}",
            project.status.as_str(),
            project.priority.as_str()
        ));

    doc.heading("Overview");
    if let Some(description) = project.description.as_deref().filter(|d| !d.is_empty()) {
        doc.paragraph(description);
    }
    let mut overview = Table::new(&["Field", "Value"]);
    overview.row(["Created by".to_string(), or_dash(users.get(&project.created_by))]);
    overview.row([
        "Created".to_string(),
        project.created_at.format("%Y-%m-%d").to_string(),
    ]);
    overview.row(["End date".to_string(), or_dash(project.end_date)]);
    doc.table(overview);

    doc.heading("Task summary");
    doc.table(summary_table(&counts));

    doc.heading("Tasks");
    if detail.tasks.is_empty() {
        doc.paragraph("No tasks in this project.");
    } else {
        doc.table(task_table(&detail.tasks, &users, None));
    }
    Ok(doc)
}

pub async fn tasks_report(
    pool: &SqlitePool,
    filter: &TaskQuery,
) -> Result<ReportDocument, AppError> {
    let tasks = tasks::list(pool, filter).await?;
    let users = users::name_map(pool).await?;
    let projects = project_names(pool).await?;

    let mut doc = ReportDocument::new("Tasks Report");
    if let Some(description) = describe_filter(filter, &projects) {
        doc = doc.subtitle(description);
    }

    doc.heading("Summary");
    doc.table(summary_table(&TaskCounts::from_tasks(&tasks)));

    doc.heading(format!("Tasks ({})", tasks.len()));
    if tasks.is_empty() {
        doc.paragraph("No tasks match the selected filters.");
    } else {
        doc.table(task_table(&tasks, &users, Some(&projects)));
    }
    Ok(doc)
}

pub async fn general_report(pool: &SqlitePool) -> Result<ReportDocument, AppError> {
    let general = metrics::general(pool).await?;
    let projects = projects::list(pool).await?;

    let mut doc = ReportDocument::new("General Report").subtitle(format!(
        "{} projects, {} tasks",
        general.summary.total_projects, general.summary.total_tasks
    ));

    doc.heading("Task summary");
    doc.table(summary_table(&general.projects.tasks));

    doc.heading("Projects by status");
    let mut by_status = Table::new(&["Status", "Projects"]);
    for (status, n) in &general.projects.projects_by_status {
        by_status.row([status.to_string(), n.to_string()]);
    }
    doc.table(by_status);

    doc.heading("Projects");
    if projects.is_empty() {
        doc.paragraph("No projects yet.");
    } else {
        doc.table(project_table(&projects));
    }
    Ok(doc)
}

pub async fn metrics_report(
    pool: &SqlitePool,
    project_id: Option<Uuid>,
) -> Result<ReportDocument, AppError> {
    let filter = TaskQuery {
        project_id,
        ..Default::default()
    };
    let counts = metrics::task_metrics(pool, &filter).await?;

    let mut doc = ReportDocument::new("Metrics Report");
    if let Some(id) = project_id {
        let project = projects::get(pool, id).await?;
        doc = doc.subtitle(format!("Project: {}", project.name));
    }

    doc.heading("Task summary");
    doc.table(summary_table(&counts));
    doc.heading("Tasks by status");
    doc.table(breakdown_table("Status", &counts));
    doc.heading("Tasks by priority");
    doc.table(priority_table(&counts));

    if project_id.is_none() {
        doc.heading("Project progress");
        let progress = metrics::projects_progress(pool).await?;
        if progress.is_empty() {
            doc.paragraph("No projects yet.");
        } else {
            doc.table(progress_table(&progress));
        }
    }
    Ok(doc)
}

pub async fn custom_report(
    pool: &SqlitePool,
    request: &CustomReportRequest,
) -> Result<ReportDocument, AppError> {
    let title = request
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or("Custom Report");
    let projects = projects::list(pool).await?;
    let names: HashMap<Uuid, String> = projects.iter().map(|p| (p.id, p.name.clone())).collect();

    let mut doc = ReportDocument::new(title);
    if let Some(description) = describe_filter(&request.filters, &names) {
        doc = doc.subtitle(description);
    }

    if request.include_metrics {
        doc.heading("Metrics");
        doc.table(summary_table(
            &metrics::task_metrics(pool, &request.filters).await?,
        ));
    }

    if request.include_projects {
        doc.heading(format!("Projects ({})", projects.len()));
        if projects.is_empty() {
            doc.paragraph("No projects yet.");
        } else {
            doc.table(project_table(&projects));
        }
    }

    if request.include_tasks {
        let tasks = tasks::list(pool, &request.filters).await?;
        let users = users::name_map(pool).await?;
        doc.heading(format!("Tasks ({})", tasks.len()));
        if tasks.is_empty() {
            doc.paragraph("No tasks match the selected filters.");
        } else {
            let shown = tasks.len().min(CUSTOM_REPORT_TASK_LIMIT);
            doc.table(task_table(&tasks[..shown], &users, Some(&names)));
            if tasks.len() > shown {
                doc.paragraph(format!("... and {} more tasks", tasks.len() - shown));
            }
        }
    }

    if doc.blocks.is_empty() {
        doc.paragraph("No sections selected.");
    }
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{ProjectInput, Role, TaskInput, TaskStatus};
    use pretty_assertions::assert_eq;

    async fn seeded(task_count: usize) -> (SqlitePool, Uuid) {
        let pool = db::connect_in_memory().await.unwrap();
        let owner = users::create(&pool, 4, "Owner", "o@example.com", "secret1", Role::Admin)
            .await
            .unwrap();
        let project = projects::create(
            &pool,
            ProjectInput {
                name: "Apollo".to_string(),
                description: Some("Moonshot".to_string()),
                status: None,
                priority: None,
                end_date: None,
            },
            owner.id,
        )
        .await
        .unwrap();
        for i in 0..task_count {
            tasks::create(
                &pool,
                TaskInput {
                    title: format!("Task {}", i),
                    description: None,
                    project_id: None,
                    assigned_to: Some(owner.id),
                    status: Some(if i % 2 == 0 { TaskStatus::Done } else { TaskStatus::Todo }),
                    priority: None,
                    due_date: None,
                },
                project.id,
            )
            .await
            .unwrap();
        }
        (pool, project.id)
    }

    fn tables(doc: &ReportDocument) -> Vec<&Table> {
        doc.blocks
            .iter()
            .filter_map(|b| match b {
                Block::Table(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    #[actix_rt::test]
    async fn test_project_report_lists_tasks_with_assignee() {
        let (pool, project_id) = seeded(2).await;
        let doc = project_report(&pool, project_id).await.unwrap();

        assert_eq!(doc.title, "Project Report: Apollo");
        assert!(doc.blocks.contains(&Block::Paragraph("Moonshot".to_string())));
        let task_table = tables(&doc).into_iter().last().unwrap().clone();
        assert_eq!(task_table.rows.len(), 2);
        assert_eq!(task_table.rows[0][3], "Owner");
    }

    #[actix_rt::test]
    async fn test_custom_report_caps_task_list() {
        let (pool, _) = seeded(23).await;
        let request = CustomReportRequest {
            title: Some("Weekly".to_string()),
            include_projects: false,
            include_tasks: true,
            include_metrics: false,
            filters: TaskQuery::default(),
        };
        let doc = custom_report(&pool, &request).await.unwrap();

        assert_eq!(doc.title, "Weekly");
        assert_eq!(tables(&doc)[0].rows.len(), CUSTOM_REPORT_TASK_LIMIT);
        assert_eq!(
            doc.blocks.last(),
            Some(&Block::Paragraph("... and 3 more tasks".to_string()))
        );
    }

    #[actix_rt::test]
    async fn test_tasks_report_describes_filter() {
        let (pool, project_id) = seeded(4).await;
        let filter = TaskQuery {
            project_id: Some(project_id),
            status: Some(TaskStatus::Done),
            ..Default::default()
        };
        let doc = tasks_report(&pool, &filter).await.unwrap();
        assert_eq!(
            doc.subtitle.as_deref(),
            Some("Filters: project: Apollo, status: done")
        );
        assert!(doc.blocks.contains(&Block::Heading("Tasks (2)".to_string())));
    }

    #[actix_rt::test]
    async fn test_metrics_report_unknown_project() {
        let (pool, _) = seeded(0).await;
        let err = metrics_report(&pool, Some(Uuid::new_v4())).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_file_name_is_timestamped() {
        let mut doc = ReportDocument::new("x");
        doc.generated_at = chrono::DateTime::parse_from_rfc3339("2024-03-05T07:08:09Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(doc.file_name("general_report"), "general_report_20240305_070809.pdf");
    }
}
