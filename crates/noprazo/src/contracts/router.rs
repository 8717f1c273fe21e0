use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use super::domain::{ContractDraft, ContractId};
use super::repository::{ContractRepository, NotificationSender, RepositoryError};
use super::service::{ContractService, ContractServiceError};

/// Router builder exposing the contract CRUD endpoints plus the two batch
/// job triggers used by the scheduler.
pub fn contract_router<R, S>(service: Arc<ContractService<R, S>>) -> Router
where
    R: ContractRepository + 'static,
    S: NotificationSender + 'static,
{
    Router::new()
        .route(
            "/api/v1/contracts",
            get(list_handler::<R, S>).post(create_handler::<R, S>),
        )
        .route(
            "/api/v1/contracts/:contract_id",
            get(get_handler::<R, S>)
                .put(update_handler::<R, S>)
                .delete(delete_handler::<R, S>),
        )
        .route(
            "/api/v1/contracts/:contract_id/history",
            get(history_handler::<R, S>),
        )
        .route(
            "/api/v1/contracts/jobs/notifications",
            post(notifications_job_handler::<R, S>),
        )
        .route(
            "/api/v1/contracts/jobs/renewals",
            post(renewals_job_handler::<R, S>),
        )
        .with_state(service)
}

/// Optional evaluation-date override for the batch job endpoints; defaults
/// to the service clock. Cron triggers post without a body, so the whole
/// payload is optional at the route.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct JobRequest {
    pub(crate) today: Option<NaiveDate>,
}

fn error_response(error: ContractServiceError) -> Response {
    let status = match &error {
        ContractServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ContractServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        ContractServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}

pub(crate) async fn list_handler<R, S>(
    State(service): State<Arc<ContractService<R, S>>>,
) -> Response
where
    R: ContractRepository + 'static,
    S: NotificationSender + 'static,
{
    match service.list() {
        Ok(contracts) => (StatusCode::OK, axum::Json(contracts)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn create_handler<R, S>(
    State(service): State<Arc<ContractService<R, S>>>,
    axum::Json(draft): axum::Json<ContractDraft>,
) -> Response
where
    R: ContractRepository + 'static,
    S: NotificationSender + 'static,
{
    match service.create(draft, None) {
        Ok(contract) => (StatusCode::CREATED, axum::Json(contract)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn get_handler<R, S>(
    State(service): State<Arc<ContractService<R, S>>>,
    Path(contract_id): Path<String>,
) -> Response
where
    R: ContractRepository + 'static,
    S: NotificationSender + 'static,
{
    match service.get(&ContractId(contract_id)) {
        Ok(contract) => (StatusCode::OK, axum::Json(contract)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_handler<R, S>(
    State(service): State<Arc<ContractService<R, S>>>,
    Path(contract_id): Path<String>,
    axum::Json(draft): axum::Json<ContractDraft>,
) -> Response
where
    R: ContractRepository + 'static,
    S: NotificationSender + 'static,
{
    match service.update(&ContractId(contract_id), draft, None) {
        Ok(contract) => (StatusCode::OK, axum::Json(contract)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_handler<R, S>(
    State(service): State<Arc<ContractService<R, S>>>,
    Path(contract_id): Path<String>,
) -> Response
where
    R: ContractRepository + 'static,
    S: NotificationSender + 'static,
{
    match service.delete(&ContractId(contract_id), None) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn history_handler<R, S>(
    State(service): State<Arc<ContractService<R, S>>>,
    Path(contract_id): Path<String>,
) -> Response
where
    R: ContractRepository + 'static,
    S: NotificationSender + 'static,
{
    match service.history(&ContractId(contract_id)) {
        Ok(entries) => (StatusCode::OK, axum::Json(entries)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn notifications_job_handler<R, S>(
    State(service): State<Arc<ContractService<R, S>>>,
    request: Option<axum::Json<JobRequest>>,
) -> Response
where
    R: ContractRepository + 'static,
    S: NotificationSender + 'static,
{
    let today = request.and_then(|axum::Json(request)| request.today);
    let report = service.run_notifications(today);
    (StatusCode::OK, axum::Json(report)).into_response()
}

pub(crate) async fn renewals_job_handler<R, S>(
    State(service): State<Arc<ContractService<R, S>>>,
    request: Option<axum::Json<JobRequest>>,
) -> Response
where
    R: ContractRepository + 'static,
    S: NotificationSender + 'static,
{
    let today = request.and_then(|axum::Json(request)| request.today);
    let report = service.run_renewals(today);
    (StatusCode::OK, axum::Json(report)).into_response()
}
