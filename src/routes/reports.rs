//! PDF report downloads.

use crate::{
    auth::CurrentUser,
    error::AppError,
    models::TaskQuery,
    reports::{self, CustomReportRequest, ReportDocument},
    routes::metrics::ProjectFilter,
    state::AppState,
};
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{get, post, web, HttpResponse, Responder};
use uuid::Uuid;

/// Renders `doc` and wraps it as a PDF attachment.
fn attachment(doc: &ReportDocument, prefix: &str) -> Result<HttpResponse, AppError> {
    let bytes = reports::render(doc)?;
    let file_name = doc.file_name(prefix);
    log::info!("Generated {} ({} bytes)", file_name, bytes.len());

    Ok(HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(file_name)],
        })
        .body(bytes))
}

#[get("/project/{id}")]
pub async fn project_report(
    state: web::Data<AppState>,
    _user: CurrentUser,
    id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let id = id.into_inner();
    let doc = reports::project_report(&state.pool, id).await?;
    attachment(&doc, &format!("project_report_{}", id))
}

#[get("/tasks")]
pub async fn tasks_report(
    state: web::Data<AppState>,
    _user: CurrentUser,
    filter: web::Query<TaskQuery>,
) -> Result<impl Responder, AppError> {
    let doc = reports::tasks_report(&state.pool, &filter).await?;
    attachment(&doc, "tasks_report")
}

#[get("/general")]
pub async fn general_report(
    state: web::Data<AppState>,
    _user: CurrentUser,
) -> Result<impl Responder, AppError> {
    let doc = reports::general_report(&state.pool).await?;
    attachment(&doc, "general_report")
}

#[get("/metrics")]
pub async fn metrics_report(
    state: web::Data<AppState>,
    _user: CurrentUser,
    filter: web::Query<ProjectFilter>,
) -> Result<impl Responder, AppError> {
    let doc = reports::metrics_report(&state.pool, filter.project_id).await?;
    attachment(&doc, "metrics_report")
}

#[post("/custom")]
pub async fn custom_report(
    state: web::Data<AppState>,
    _user: CurrentUser,
    body: web::Json<CustomReportRequest>,
) -> Result<impl Responder, AppError> {
    let doc = reports::custom_report(&state.pool, &body).await?;
    attachment(&doc, "custom_report")
}
