use crate::{
    auth::{policy, CurrentUser},
    error::AppError,
    models::{ChangePasswordInput, CreateUserInput, UpdateRoleInput, UpdateUserInput},
    services::users,
    state::AppState,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

#[get("/profile")]
pub async fn profile(user: CurrentUser) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "success": true,
        "data": user.into_inner()
    }))
}

#[put("/profile")]
pub async fn update_profile(
    state: web::Data<AppState>,
    user: CurrentUser,
    body: web::Json<UpdateUserInput>,
) -> Result<impl Responder, AppError> {
    body.validate()?;
    let updated = users::update(
        &state.pool,
        state.config.bcrypt_cost,
        user.id,
        body.into_inner(),
        false,
    )
    .await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Profile updated successfully",
        "data": updated
    })))
}

/// Change the caller's password. Requires the current password.
#[post("/change-password")]
pub async fn change_password(
    state: web::Data<AppState>,
    user: CurrentUser,
    body: web::Json<ChangePasswordInput>,
) -> Result<impl Responder, AppError> {
    body.validate()?;
    users::change_password(&state.pool, state.config.bcrypt_cost, &user, &body).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Password changed successfully"
    })))
}

/// Lists active users. Admin only.
#[get("")]
pub async fn list_users(
    state: web::Data<AppState>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    policy::LIST_USERS.check(&user)?;
    let users = users::list_active(&state.pool).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "total": users.len(),
        "data": users
    })))
}

/// Creates a user with an explicit role. Admin only.
#[post("")]
pub async fn create_user(
    state: web::Data<AppState>,
    user: CurrentUser,
    body: web::Json<CreateUserInput>,
) -> Result<impl Responder, AppError> {
    policy::MANAGE_USERS.check(&user)?;
    body.validate()?;
    let created = users::create(
        &state.pool,
        state.config.bcrypt_cost,
        &body.name,
        &body.email,
        &body.password,
        body.role,
    )
    .await?;
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "User created successfully",
        "data": created
    })))
}

#[get("/{id}")]
pub async fn get_user(
    state: web::Data<AppState>,
    user: CurrentUser,
    id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    policy::VIEW_USER.check(&user)?;
    let found = users::get(&state.pool, id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "data": found })))
}

#[put("/{id}")]
pub async fn update_user(
    state: web::Data<AppState>,
    user: CurrentUser,
    id: web::Path<Uuid>,
    body: web::Json<UpdateUserInput>,
) -> Result<impl Responder, AppError> {
    policy::MANAGE_USERS.check(&user)?;
    body.validate()?;
    let updated = users::update(
        &state.pool,
        state.config.bcrypt_cost,
        id.into_inner(),
        body.into_inner(),
        true,
    )
    .await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "User updated successfully",
        "data": updated
    })))
}

#[put("/{id}/role")]
pub async fn update_role(
    state: web::Data<AppState>,
    user: CurrentUser,
    id: web::Path<Uuid>,
    body: web::Json<UpdateRoleInput>,
) -> Result<impl Responder, AppError> {
    policy::MANAGE_USERS.check(&user)?;
    let updated = users::set_role(&state.pool, id.into_inner(), body.role).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Role updated successfully",
        "data": updated
    })))
}

/// Deactivates the user. Their projects, tasks and comments are kept.
#[delete("/{id}")]
pub async fn deactivate_user(
    state: web::Data<AppState>,
    user: CurrentUser,
    id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    policy::MANAGE_USERS.check(&user)?;
    let id = id.into_inner();
    if id == user.id {
        return Err(AppError::BadRequest("You cannot deactivate your own account".into()));
    }
    users::deactivate(&state.pool, id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "User deactivated successfully"
    })))
}
