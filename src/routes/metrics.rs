use crate::{
    auth::CurrentUser,
    error::AppError,
    models::TaskQuery,
    services::metrics::{self, DEFAULT_TIMELINE_DAYS},
    state::AppState,
};
use actix_web::{get, web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct ProjectFilter {
    pub project_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct TimelineQuery {
    pub project_id: Option<Uuid>,
    pub days: Option<i64>,
}

fn ok<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "success": true, "data": data }))
}

#[get("/general")]
pub async fn general(
    state: web::Data<AppState>,
    _user: CurrentUser,
) -> Result<impl Responder, AppError> {
    Ok(ok(metrics::general(&state.pool).await?))
}

#[get("/projects")]
pub async fn projects(
    state: web::Data<AppState>,
    _user: CurrentUser,
) -> Result<impl Responder, AppError> {
    Ok(ok(metrics::all_projects(&state.pool).await?))
}

#[get("/projects/{id}")]
pub async fn project(
    state: web::Data<AppState>,
    _user: CurrentUser,
    id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    Ok(ok(metrics::project(&state.pool, id.into_inner()).await?))
}

/// Task counts, optionally narrowed by `project_id` and `assigned_to`.
#[get("/tasks")]
pub async fn tasks(
    state: web::Data<AppState>,
    _user: CurrentUser,
    filter: web::Query<TaskQuery>,
) -> Result<impl Responder, AppError> {
    Ok(ok(metrics::task_metrics(&state.pool, &filter).await?))
}

#[get("/charts/tasks-by-status")]
pub async fn tasks_by_status(
    state: web::Data<AppState>,
    _user: CurrentUser,
    filter: web::Query<ProjectFilter>,
) -> Result<impl Responder, AppError> {
    Ok(ok(metrics::tasks_by_status(&state.pool, filter.project_id).await?))
}

#[get("/charts/tasks-by-priority")]
pub async fn tasks_by_priority(
    state: web::Data<AppState>,
    _user: CurrentUser,
    filter: web::Query<ProjectFilter>,
) -> Result<impl Responder, AppError> {
    Ok(ok(metrics::tasks_by_priority(&state.pool, filter.project_id).await?))
}

#[get("/charts/projects-progress")]
pub async fn projects_progress(
    state: web::Data<AppState>,
    _user: CurrentUser,
) -> Result<impl Responder, AppError> {
    Ok(ok(metrics::projects_progress(&state.pool).await?))
}

/// Daily created/completed counts. `days` defaults to 30.
#[get("/charts/tasks-timeline")]
pub async fn tasks_timeline(
    state: web::Data<AppState>,
    _user: CurrentUser,
    query: web::Query<TimelineQuery>,
) -> Result<impl Responder, AppError> {
    let days = query.days.unwrap_or(DEFAULT_TIMELINE_DAYS);
    Ok(ok(
        metrics::tasks_timeline(&state.pool, query.project_id, days).await?,
    ))
}
