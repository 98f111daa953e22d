use crate::{
    auth::{policy, CurrentUser},
    error::AppError,
    models::{ProjectInput, ProjectUpdate, TaskInput},
    services::{projects, tasks},
    state::AppState,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

/// Lists every project, newest first. Any authenticated user.
#[get("")]
pub async fn list_projects(
    state: web::Data<AppState>,
    _user: CurrentUser,
) -> Result<impl Responder, AppError> {
    let projects = projects::list(&state.pool).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "total": projects.len(),
        "data": projects
    })))
}

/// Creates a project owned by the caller.
///
/// ## Responses:
/// - `201 Created`: the new project.
/// - `400 Bad Request`: invalid input.
/// - `403 Forbidden`: caller is a contributor.
#[post("")]
pub async fn create_project(
    state: web::Data<AppState>,
    user: CurrentUser,
    body: web::Json<ProjectInput>,
) -> Result<impl Responder, AppError> {
    policy::MANAGE_PROJECTS.check(&user)?;
    body.validate()?;
    let project = projects::create(&state.pool, body.into_inner(), user.id).await?;
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Project created successfully",
        "data": project
    })))
}

/// A project with its tasks.
#[get("/{id}")]
pub async fn get_project(
    state: web::Data<AppState>,
    _user: CurrentUser,
    id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let detail = projects::detail(&state.pool, id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "data": detail })))
}

#[put("/{id}")]
pub async fn update_project(
    state: web::Data<AppState>,
    user: CurrentUser,
    id: web::Path<Uuid>,
    body: web::Json<ProjectUpdate>,
) -> Result<impl Responder, AppError> {
    policy::MANAGE_PROJECTS.check(&user)?;
    body.validate()?;
    let project = projects::update(&state.pool, id.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Project updated successfully",
        "data": project
    })))
}

/// Deletes the project together with its tasks and their comments.
#[delete("/{id}")]
pub async fn delete_project(
    state: web::Data<AppState>,
    user: CurrentUser,
    id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    policy::MANAGE_PROJECTS.check(&user)?;
    projects::delete(&state.pool, id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Project deleted successfully"
    })))
}

#[get("/{id}/stats")]
pub async fn project_stats(
    state: web::Data<AppState>,
    _user: CurrentUser,
    id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let stats = projects::stats(&state.pool, id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "data": stats })))
}

#[get("/{id}/tasks")]
pub async fn project_tasks(
    state: web::Data<AppState>,
    _user: CurrentUser,
    id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let id = id.into_inner();
    projects::get(&state.pool, id).await?;
    let tasks = tasks::list_for_project(&state.pool, id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "total": tasks.len(),
        "data": tasks
    })))
}

/// Creates a task inside the project named by the path. Any `project_id` in the body is ignored.
#[post("/{id}/tasks")]
pub async fn create_project_task(
    state: web::Data<AppState>,
    user: CurrentUser,
    id: web::Path<Uuid>,
    body: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    policy::WRITE_TASKS.check(&user)?;
    body.validate()?;
    let task = tasks::create(&state.pool, body.into_inner(), id.into_inner()).await?;
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Task created successfully",
        "data": task
    })))
}
