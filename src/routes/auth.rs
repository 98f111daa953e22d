use crate::{
    auth::{
        AuthResponse, Claims, CurrentUser, ForgotPasswordRequest, LoginRequest, LogoutRequest,
        RegisterRequest, ResetPasswordRequest, VerifyResetTokenRequest,
    },
    error::AppError,
    models::UpdateUserInput,
    services::{auth as auth_service, users},
    state::AppState,
};
use actix_web::{get, post, put, web, HttpResponse, Responder};
use serde_json::json;
use validator::Validate;

/// Register a new user
///
/// Creates a contributor account and returns a token pair.
///
/// ## Responses:
/// - `201 Created`: `AuthResponse`.
/// - `400 Bad Request`: invalid input or email already registered.
#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;

    let user = auth_service::register(
        &state,
        &register_data.name,
        &register_data.email,
        &register_data.password,
    )
    .await?;
    let tokens = state.tokens.issue_pair(user.id)?;

    Ok(HttpResponse::Created().json(AuthResponse::new(
        "Registration successful",
        user,
        tokens,
    )))
}

/// Login user
///
/// Authenticates an active user by email and password and returns a token pair.
///
/// ## Responses:
/// - `200 OK`: `AuthResponse`.
/// - `401 Unauthorized`: unknown email, wrong password or inactive account.
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let user =
        auth_service::verify_credentials(&state.pool, &login_data.email, &login_data.password)
            .await?;
    let tokens = state.tokens.issue_pair(user.id)?;
    log::info!("User {} logged in", user.id);

    Ok(HttpResponse::Ok().json(AuthResponse::new("Login successful", user, tokens)))
}

/// Exchange a refresh token (sent as the bearer token) for a new access token.
#[post("/refresh")]
pub async fn refresh(
    state: web::Data<AppState>,
    claims: Claims,
) -> Result<impl Responder, AppError> {
    let token = auth_service::refresh(&state, &claims).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Token refreshed",
        "token": token
    })))
}

/// Revoke the presented access token and, if supplied, the refresh token.
///
/// The body is optional. Logging out twice with the same token succeeds.
#[post("/logout")]
pub async fn logout(
    state: web::Data<AppState>,
    claims: Claims,
    body: Option<web::Json<LogoutRequest>>,
) -> Result<impl Responder, AppError> {
    let body = body.map(web::Json::into_inner).unwrap_or_default();
    auth_service::logout(&state, &claims, body.refresh_token.as_deref()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Logged out successfully"
    })))
}

/// Start the password reset flow.
///
/// The response is the same whether or not the email belongs to an account.
#[post("/forgot-password")]
pub async fn forgot_password(
    state: web::Data<AppState>,
    body: web::Json<ForgotPasswordRequest>,
) -> Result<impl Responder, AppError> {
    body.validate()?;
    auth_service::forgot_password(&state, &body.email).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "If an account with that email exists, a password reset link has been sent"
    })))
}

#[post("/verify-reset-token")]
pub async fn verify_reset_token(
    state: web::Data<AppState>,
    body: web::Json<VerifyResetTokenRequest>,
) -> Result<impl Responder, AppError> {
    body.validate()?;
    auth_service::verify_reset_token(&state.pool, &body.token).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Token is valid"
    })))
}

/// Consume a reset token and set a new password. A token works once.
#[post("/reset-password")]
pub async fn reset_password(
    state: web::Data<AppState>,
    body: web::Json<ResetPasswordRequest>,
) -> Result<impl Responder, AppError> {
    body.validate()?;
    auth_service::reset_password(&state, &body.token, &body.password).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Password has been reset successfully"
    })))
}

#[get("/me")]
pub async fn me(user: CurrentUser) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "success": true,
        "user": user.into_inner()
    }))
}

/// Update the caller's own name, email or password. `is_active` is ignored.
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
        "user": updated
    })))
}
