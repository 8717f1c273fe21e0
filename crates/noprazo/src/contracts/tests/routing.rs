use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use super::common::*;
use crate::contracts::router::{
    contract_router, create_handler, delete_handler, get_handler, history_handler,
    notifications_job_handler, JobRequest,
};
use crate::contracts::service::ContractService;
use crate::contracts::status::FixedClock;

fn service_with(
    repository: Arc<MemoryRepository>,
) -> Arc<ContractService<MemoryRepository, MemorySender>> {
    Arc::new(ContractService::with_clock(
        repository,
        Arc::new(MemorySender::default()),
        notifier_config(),
        Arc::new(FixedClock(date(2024, 1, 24))),
    ))
}

#[tokio::test]
async fn create_handler_returns_created() {
    let service = service_with(Arc::new(MemoryRepository::default()));
    let draft = draft_from(&january_contract("seed"));

    let response =
        create_handler::<MemoryRepository, MemorySender>(State(service), axum::Json(draft)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn create_handler_rejects_invalid_dates_as_unprocessable() {
    let service = service_with(Arc::new(MemoryRepository::default()));
    let mut draft = draft_from(&january_contract("seed"));
    draft.start_date = date(2024, 3, 1);

    let response =
        create_handler::<MemoryRepository, MemorySender>(State(service), axum::Json(draft)).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn get_handler_returns_not_found_for_unknown_contract() {
    let service = service_with(Arc::new(MemoryRepository::default()));

    let response = get_handler::<MemoryRepository, MemorySender>(
        State(service),
        Path("ct-missing".to_string()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_handler_returns_no_content_and_history_survives() {
    let repository = Arc::new(MemoryRepository::default());
    repository.seed(january_contract("ct-1"));
    let service = service_with(repository);

    let response = delete_handler::<MemoryRepository, MemorySender>(
        State(service.clone()),
        Path("ct-1".to_string()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = history_handler::<MemoryRepository, MemorySender>(
        State(service),
        Path("ct-1".to_string()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn notifications_job_handler_reports_the_run() {
    let repository = Arc::new(MemoryRepository::default());
    repository.seed(january_contract("ct-1"));
    let service = service_with(repository);

    let response = notifications_job_handler::<MemoryRepository, MemorySender>(
        State(service),
        Some(axum::Json(JobRequest { today: None })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn job_endpoints_accept_an_absent_body() {
    let repository = Arc::new(MemoryRepository::default());
    let mut contract = january_contract("ct-1");
    contract.auto_renewal = true;
    contract.end_date = date(2024, 1, 20); // already lapsed at the pinned clock
    contract.renewal_date = contract.end_date;
    repository.seed(contract);
    let app = contract_router(service_with(repository.clone()));

    // Schedulers fire these as bare POSTs with no payload at all.
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/contracts/jobs/renewals")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    let report: Value = serde_json::from_slice(&bytes).expect("valid json");
    assert_eq!(report["renewed"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn routed_list_request_returns_contracts_with_derived_status() {
    let repository = Arc::new(MemoryRepository::default());
    repository.seed(january_contract("ct-1")); // clock pinned inside the window
    let app = contract_router(service_with(repository));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/contracts")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    let contracts: Value = serde_json::from_slice(&bytes).expect("valid json");
    assert_eq!(contracts[0]["status"], "expiring_soon");
}

#[tokio::test]
async fn repository_outage_maps_to_internal_error() {
    let service = Arc::new(ContractService::with_clock(
        Arc::new(UnavailableRepository),
        Arc::new(MemorySender::default()),
        notifier_config(),
        Arc::new(FixedClock(date(2024, 1, 24))),
    ));

    let response = get_handler::<UnavailableRepository, MemorySender>(
        State(service),
        Path("ct-1".to_string()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
