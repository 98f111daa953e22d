#![allow(dead_code)]

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{test, web};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use std::sync::Arc;
use workboard::config::Config;
use workboard::db;
use workboard::mailer::Mailer;
use workboard::state::AppState;

pub const ADMIN_EMAIL: &str = "admin@x.com";
pub const ADMIN_PASSWORD: &str = "admin123";

/// Builds the same app as `main`, over the given `web::Data<AppState>`.
macro_rules! test_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($state.clone())
                .wrap(
                    actix_cors::Cors::default()
                        .allow_any_origin()
                        .allow_any_method()
                        .allow_any_header()
                        .max_age(3600),
                )
                .wrap(actix_web::middleware::Logger::default())
                .service(workboard::routes::health::health)
                .service(
                    actix_web::web::scope("")
                        .wrap(workboard::auth::AuthMiddleware)
                        .configure(workboard::routes::config),
                ),
        )
        .await
    };
}

async fn seeded_pool(config: &Config) -> SqlitePool {
    let pool = db::connect_in_memory()
        .await
        .expect("Failed to open in-memory database");
    db::seed_admin(&pool, config)
        .await
        .expect("Failed to seed admin");
    pool
}

/// Fresh in-memory store with the seeded admin account.
pub async fn test_state() -> web::Data<AppState> {
    let config = Config::for_tests();
    let pool = seeded_pool(&config).await;
    web::Data::new(AppState::new(pool, config))
}

pub async fn test_state_with_mailer(mailer: Arc<dyn Mailer>) -> web::Data<AppState> {
    let config = Config::for_tests();
    let pool = seeded_pool(&config).await;
    web::Data::new(AppState::with_mailer(pool, config, mailer))
}

/// Sends the request and returns the status with the body parsed as JSON (`Null` if it is not JSON).
pub async fn send<S, B>(app: &S, req: Request) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

/// Logs in and returns `(access_token, refresh_token)`.
pub async fn login<S, B>(app: &S, email: &str, password: &str) -> (String, String)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({ "email": email, "password": password }))
        .to_request();
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::OK, "Login failed: {}", body);
    (
        body["token"].as_str().unwrap().to_string(),
        body["refresh_token"].as_str().unwrap().to_string(),
    )
}

pub async fn admin_token<S, B>(app: &S) -> String
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    login(app, ADMIN_EMAIL, ADMIN_PASSWORD).await.0
}

/// Creates a user through the admin API and returns `(user_id, access_token)`.
pub async fn user_with_role<S, B>(
    app: &S,
    admin_token: &str,
    email: &str,
    role: &str,
) -> (String, String)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/users")
        .insert_header(bearer(admin_token))
        .set_json(json!({
            "name": format!("{} user", role),
            "email": email,
            "password": "secret123",
            "role": role
        }))
        .to_request();
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::CREATED, "Create user failed: {}", body);
    let id = body["data"]["id"].as_str().unwrap().to_string();
    let (token, _) = login(app, email, "secret123").await;
    (id, token)
}

/// Creates a project as `token` and returns its id.
pub async fn create_project<S, B>(app: &S, token: &str, name: &str) -> String
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/projects")
        .insert_header(bearer(token))
        .set_json(json!({ "name": name, "status": "active" }))
        .to_request();
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::CREATED, "Create project failed: {}", body);
    body["data"]["id"].as_str().unwrap().to_string()
}

/// Creates a task in `project_id` and returns its id.
pub async fn create_task<S, B>(app: &S, token: &str, project_id: &str, payload: Value) -> String
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri(&format!("/projects/{}/tasks", project_id))
        .insert_header(bearer(token))
        .set_json(payload)
        .to_request();
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::CREATED, "Create task failed: {}", body);
    body["data"]["id"].as_str().unwrap().to_string()
}
