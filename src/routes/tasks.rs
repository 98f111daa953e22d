use crate::{
    auth::{policy, CurrentUser},
    error::AppError,
    models::{CommentInput, TaskInput, TaskQuery, TaskStatusInput, TaskUpdate},
    services::{comments, tasks},
    state::AppState,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

/// Retrieves tasks, newest first.
///
/// ## Query Parameters:
/// - `project_id` (optional): only tasks of this project.
/// - `assigned_to` (optional): only tasks assigned to this user.
/// - `status` (optional): `todo`, `in_progress`, `review` or `done`.
/// - `priority` (optional): `low`, `medium` or `high`.
/// - `search` (optional): case-insensitive match on title and description.
///
/// ## Responses:
/// - `200 OK`: `{success, total, data}`.
/// - `400 Bad Request`: unparseable query string.
/// - `401 Unauthorized`: missing or invalid token.
#[get("")]
pub async fn get_tasks(
    state: web::Data<AppState>,
    _user: CurrentUser,
    query_params: web::Query<TaskQuery>,
) -> Result<impl Responder, AppError> {
    let tasks = tasks::list(&state.pool, &query_params).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "total": tasks.len(),
        "data": tasks
    })))
}

/// Creates a task. `project_id` is required in the body.
///
/// ## Responses:
/// - `201 Created`: the new task.
/// - `400 Bad Request`: invalid input, missing `project_id` or unknown assignee.
/// - `404 Not Found`: the project does not exist.
#[post("")]
pub async fn create_task(
    state: web::Data<AppState>,
    user: CurrentUser,
    task_data: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    policy::WRITE_TASKS.check(&user)?;
    task_data.validate()?;

    let project_id = task_data
        .project_id
        .ok_or_else(|| AppError::BadRequest("project_id is required".into()))?;
    let task = tasks::create(&state.pool, task_data.into_inner(), project_id).await?;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Task created successfully",
        "data": task
    })))
}

/// A task with its visible comments.
#[get("/{id}")]
pub async fn get_task(
    state: web::Data<AppState>,
    _user: CurrentUser,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let detail = tasks::detail(&state.pool, task_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "data": detail })))
}

#[put("/{id}")]
pub async fn update_task(
    state: web::Data<AppState>,
    user: CurrentUser,
    task_id: web::Path<Uuid>,
    task_data: web::Json<TaskUpdate>,
) -> Result<impl Responder, AppError> {
    policy::WRITE_TASKS.check(&user)?;
    task_data.validate()?;
    let task = tasks::update(&state.pool, task_id.into_inner(), task_data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Task updated successfully",
        "data": task
    })))
}

#[put("/{id}/status")]
pub async fn update_task_status(
    state: web::Data<AppState>,
    user: CurrentUser,
    task_id: web::Path<Uuid>,
    body: web::Json<TaskStatusInput>,
) -> Result<impl Responder, AppError> {
    policy::WRITE_TASKS.check(&user)?;
    let task = tasks::set_status(&state.pool, task_id.into_inner(), body.status).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Task status updated successfully",
        "data": task
    })))
}

/// Deletes the task and its comments. Admins and managers only.
#[delete("/{id}")]
pub async fn delete_task(
    state: web::Data<AppState>,
    user: CurrentUser,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    policy::DELETE_TASKS.check(&user)?;
    tasks::delete(&state.pool, task_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Task deleted successfully"
    })))
}

#[get("/{id}/comments")]
pub async fn list_comments(
    state: web::Data<AppState>,
    _user: CurrentUser,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task_id = task_id.into_inner();
    tasks::get(&state.pool, task_id).await?;
    let comments = comments::list_for_task(&state.pool, task_id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "total": comments.len(),
        "data": comments
    })))
}

#[post("/{id}/comments")]
pub async fn create_comment(
    state: web::Data<AppState>,
    user: CurrentUser,
    task_id: web::Path<Uuid>,
    body: web::Json<CommentInput>,
) -> Result<impl Responder, AppError> {
    body.validate()?;
    let comment =
        comments::create(&state.pool, task_id.into_inner(), user.id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Comment added successfully",
        "data": comment
    })))
}

/// Edits a comment. Only its author may do so.
#[put("/comments/{id}")]
pub async fn update_comment(
    state: web::Data<AppState>,
    user: CurrentUser,
    comment_id: web::Path<Uuid>,
    body: web::Json<CommentInput>,
) -> Result<impl Responder, AppError> {
    body.validate()?;
    let comment =
        comments::update(&state.pool, comment_id.into_inner(), &user, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Comment updated successfully",
        "data": comment
    })))
}

/// Soft-deletes a comment. Its author or an admin.
#[delete("/comments/{id}")]
pub async fn delete_comment(
    state: web::Data<AppState>,
    user: CurrentUser,
    comment_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    comments::delete(&state.pool, comment_id.into_inner(), &user).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Comment deleted successfully"
    })))
}
