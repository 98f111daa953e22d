//! Notification routes. Every operation is scoped to the caller's own notifications.

use crate::{
    auth::CurrentUser,
    error::AppError,
    models::{Notification, NotificationInput, NotificationQuery},
    services::notifications,
    state::AppState,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

#[get("")]
pub async fn list_notifications(
    state: web::Data<AppState>,
    user: CurrentUser,
    query: web::Query<NotificationQuery>,
) -> Result<impl Responder, AppError> {
    let page = notifications::list(&state.pool, user.id, &query).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "data": page })))
}

#[get("/unread-count")]
pub async fn unread_count(
    state: web::Data<AppState>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    let count = notifications::unread_count(&state.pool, user.id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": { "unread_count": count }
    })))
}

#[put("/mark-all-read")]
pub async fn mark_all_read(
    state: web::Data<AppState>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    let updated = notifications::mark_all_read(&state.pool, user.id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": format!("{} notifications marked as read", updated)
    })))
}

#[delete("/delete-all")]
pub async fn delete_all(
    state: web::Data<AppState>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    let deleted = notifications::delete_all(&state.pool, user.id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": format!("{} notifications deleted", deleted)
    })))
}

/// Creates a notification addressed to the caller.
#[post("/create")]
pub async fn create_notification(
    state: web::Data<AppState>,
    user: CurrentUser,
    body: web::Json<NotificationInput>,
) -> Result<impl Responder, AppError> {
    body.validate()?;
    let input = body.into_inner();
    let notification = Notification::new(
        user.id,
        input.title,
        input.message,
        input.kind,
        input.category,
    );
    notifications::create(&state.pool, &notification).await?;
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Notification created",
        "data": notification
    })))
}

#[put("/{id}/read")]
pub async fn mark_read(
    state: web::Data<AppState>,
    user: CurrentUser,
    id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    notifications::mark_read(&state.pool, user.id, id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Notification marked as read"
    })))
}

#[delete("/{id}")]
pub async fn delete_notification(
    state: web::Data<AppState>,
    user: CurrentUser,
    id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    notifications::delete(&state.pool, user.id, id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Notification deleted"
    })))
}
