use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{FacultyInputs, FacultyKey, FormKind, ReviewContext};
use super::interaction::{InteractionError, InteractionSheet};
use super::repository::{AppraisalRepository, RepositoryError};
use super::service::{AppraisalService, AppraisalServiceError};
use super::verification::VerificationError;

#[derive(Debug, Deserialize)]
pub(crate) struct SaveInputsRequest {
    pub(crate) actor: ReviewContext,
    pub(crate) inputs: FacultyInputs,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActorRequest {
    pub(crate) actor: ReviewContext,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScoreRequest {
    pub(crate) actor: ReviewContext,
    pub(crate) score: f64,
}

/// Interaction spreadsheet posted as CSV text (`department,faculty_id,role,marks`).
#[derive(Debug, Deserialize)]
pub(crate) struct ImportRequest {
    pub(crate) actor: ReviewContext,
    pub(crate) sheet: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ReportQuery {
    #[serde(default)]
    pub(crate) format: Option<String>,
}

/// Router exposing scoring, verification and interaction endpoints.
pub fn appraisal_router<R>(service: Arc<AppraisalService<R>>) -> Router
where
    R: AppraisalRepository + 'static,
{
    Router::new()
        .route("/api/v1/scorecards/preview", post(preview_handler::<R>))
        .route(
            "/api/v1/appraisals/:department/:faculty_id",
            get(summary_handler::<R>),
        )
        .route(
            "/api/v1/appraisals/:department/:faculty_id/inputs",
            put(save_inputs_handler::<R>),
        )
        .route(
            "/api/v1/appraisals/:department/:faculty_id/advance",
            post(advance_handler::<R>),
        )
        .route(
            "/api/v1/appraisals/:department/:faculty_id/verification/:form/:section",
            put(verify_handler::<R>),
        )
        .route(
            "/api/v1/appraisals/:department/:faculty_id/interaction",
            put(interaction_handler::<R>),
        )
        .route(
            "/api/v1/departments/:department/interactions",
            post(import_handler::<R>),
        )
        .route(
            "/api/v1/departments/:department/report",
            get(report_handler::<R>),
        )
        .with_state(service)
}

pub(crate) async fn preview_handler<R>(
    State(service): State<Arc<AppraisalService<R>>>,
    axum::Json(inputs): axum::Json<FacultyInputs>,
) -> Response
where
    R: AppraisalRepository + 'static,
{
    match service.preview(&inputs) {
        Ok(scorecard) => (StatusCode::OK, axum::Json(scorecard)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn summary_handler<R>(
    State(service): State<Arc<AppraisalService<R>>>,
    Path((department, faculty_id)): Path<(String, String)>,
) -> Response
where
    R: AppraisalRepository + 'static,
{
    let key = FacultyKey::new(department, faculty_id);
    match service.summary(&key) {
        Ok(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn save_inputs_handler<R>(
    State(service): State<Arc<AppraisalService<R>>>,
    Path((department, faculty_id)): Path<(String, String)>,
    axum::Json(request): axum::Json<SaveInputsRequest>,
) -> Response
where
    R: AppraisalRepository + 'static,
{
    let key = FacultyKey::new(department, faculty_id);
    match service.save_inputs(&request.actor, &key, request.inputs) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn advance_handler<R>(
    State(service): State<Arc<AppraisalService<R>>>,
    Path((department, faculty_id)): Path<(String, String)>,
    axum::Json(request): axum::Json<ActorRequest>,
) -> Response
where
    R: AppraisalRepository + 'static,
{
    let key = FacultyKey::new(department, faculty_id);
    match service.advance(&request.actor, &key) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn verify_handler<R>(
    State(service): State<Arc<AppraisalService<R>>>,
    Path((department, faculty_id, form, section)): Path<(String, String, String, String)>,
    axum::Json(request): axum::Json<ScoreRequest>,
) -> Response
where
    R: AppraisalRepository + 'static,
{
    let form = match form.parse::<FormKind>() {
        Ok(form) => form,
        Err(error) => {
            let payload = json!({ "error": error.to_string() });
            return (StatusCode::NOT_FOUND, axum::Json(payload)).into_response();
        }
    };

    let key = FacultyKey::new(department, faculty_id);
    match service.verify_section(&request.actor, &key, form, &section, request.score) {
        Ok(total) => (StatusCode::OK, axum::Json(total)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn interaction_handler<R>(
    State(service): State<Arc<AppraisalService<R>>>,
    Path((department, faculty_id)): Path<(String, String)>,
    axum::Json(request): axum::Json<ScoreRequest>,
) -> Response
where
    R: AppraisalRepository + 'static,
{
    let key = FacultyKey::new(department, faculty_id);
    match service.record_interaction(&request.actor, &key, request.score) {
        Ok(average) => (StatusCode::OK, axum::Json(average)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn import_handler<R>(
    State(service): State<Arc<AppraisalService<R>>>,
    Path(department): Path<String>,
    axum::Json(request): axum::Json<ImportRequest>,
) -> Response
where
    R: AppraisalRepository + 'static,
{
    let sheet = match InteractionSheet::from_reader(request.sheet.as_bytes()) {
        Ok(sheet) => sheet,
        Err(error) => {
            let payload = json!({ "error": error.to_string() });
            return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
        }
    };

    if let Some(row) = sheet.rows.iter().find(|row| row.key.department != department) {
        let payload = json!({
            "error": format!("row for {} does not belong to department {department}", row.key),
        });
        return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
    }

    match service.import_interactions(&request.actor, &sheet) {
        Ok(rows) => (StatusCode::OK, axum::Json(json!({ "imported": rows }))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn report_handler<R>(
    State(service): State<Arc<AppraisalService<R>>>,
    Path(department): Path<String>,
    Query(query): Query<ReportQuery>,
) -> Response
where
    R: AppraisalRepository + 'static,
{
    let report = match service.department_report(&department) {
        Ok(report) => report,
        Err(error) => return error_response(error),
    };

    if query.format.as_deref() == Some("csv") {
        return match report.to_csv_string() {
            Ok(body) => (StatusCode::OK, [(header::CONTENT_TYPE, "text/csv")], body).into_response(),
            Err(error) => {
                let payload = json!({ "error": error.to_string() });
                (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
            }
        };
    }

    (StatusCode::OK, axum::Json(report)).into_response()
}

pub(crate) fn status_code(error: &AppraisalServiceError) -> StatusCode {
    match error {
        AppraisalServiceError::Scoring(_) | AppraisalServiceError::Configuration(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        AppraisalServiceError::Verification(VerificationError::NotVerifier(_))
        | AppraisalServiceError::Interaction(InteractionError::NotAReviewer(_))
        | AppraisalServiceError::Forbidden { .. }
        | AppraisalServiceError::ImportForbidden { .. } => StatusCode::FORBIDDEN,
        AppraisalServiceError::Verification(VerificationError::UnknownSection(_)) => {
            StatusCode::NOT_FOUND
        }
        AppraisalServiceError::Verification(_) | AppraisalServiceError::Interaction(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        AppraisalServiceError::Status(_) => StatusCode::CONFLICT,
        AppraisalServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        AppraisalServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        AppraisalServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(error: AppraisalServiceError) -> Response {
    let payload = json!({
        "error": error.to_string(),
    });
    (status_code(&error), axum::Json(payload)).into_response()
}
