pub mod auth;
pub mod health;
pub mod metrics;
pub mod notifications;
pub mod projects;
pub mod reports;
pub mod tasks;
pub mod users;

use actix_web::{error, web, HttpRequest};

use crate::error::AppError;

fn bad_json(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(format!("Invalid JSON body: {}", err)).into()
}

fn bad_query(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(format!("Invalid query string: {}", err)).into()
}

fn bad_path(err: error::PathError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(format!("Invalid path parameter: {}", err)).into()
}

/// Registers every protected route. The caller wraps the result in `AuthMiddleware`.
///
/// Static segments (`/users/profile`, `/notifications/unread-count`, ...) are
/// registered before their `{id}` siblings so they are matched first.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(bad_json))
        .app_data(web::QueryConfig::default().error_handler(bad_query))
        .app_data(web::PathConfig::default().error_handler(bad_path))
        .service(
            web::scope("/auth")
                .service(auth::login)
                .service(auth::register)
                .service(auth::refresh)
                .service(auth::logout)
                .service(auth::forgot_password)
                .service(auth::verify_reset_token)
                .service(auth::reset_password)
                .service(auth::me)
                .service(auth::update_profile),
        )
        .service(
            web::scope("/users")
                .service(users::profile)
                .service(users::update_profile)
                .service(users::change_password)
                .service(users::list_users)
                .service(users::create_user)
                .service(users::get_user)
                .service(users::update_user)
                .service(users::update_role)
                .service(users::deactivate_user),
        )
        .service(
            web::scope("/projects")
                .service(projects::list_projects)
                .service(projects::create_project)
                .service(projects::get_project)
                .service(projects::update_project)
                .service(projects::delete_project)
                .service(projects::project_stats)
                .service(projects::project_tasks)
                .service(projects::create_project_task),
        )
        .service(
            web::scope("/tasks")
                .service(tasks::update_comment)
                .service(tasks::delete_comment)
                .service(tasks::get_tasks)
                .service(tasks::create_task)
                .service(tasks::get_task)
                .service(tasks::update_task)
                .service(tasks::update_task_status)
                .service(tasks::delete_task)
                .service(tasks::list_comments)
                .service(tasks::create_comment),
        )
        .service(
            web::scope("/notifications")
                .service(notifications::unread_count)
                .service(notifications::mark_all_read)
                .service(notifications::delete_all)
                .service(notifications::create_notification)
                .service(notifications::list_notifications)
                .service(notifications::mark_read)
                .service(notifications::delete_notification),
        )
        .service(
            web::scope("/metrics")
                .service(metrics::general)
                .service(metrics::projects)
                .service(metrics::project)
                .service(metrics::tasks)
                .service(metrics::tasks_by_status)
                .service(metrics::tasks_by_priority)
                .service(metrics::projects_progress)
                .service(metrics::tasks_timeline),
        )
        .service(
            web::scope("/pdf/report")
                .service(reports::project_report)
                .service(reports::tasks_report)
                .service(reports::general_report)
                .service(reports::metrics_report)
                .service(reports::custom_report),
        );
}
