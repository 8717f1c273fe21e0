use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryContractRepository, RecordingSender};
use crate::routes::with_contract_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Local;
use noprazo::config::AppConfig;
use noprazo::contracts::ContractService;
use noprazo::error::AppError;
use noprazo::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let today = Local::now().date_naive();
    let repository = Arc::new(InMemoryContractRepository::seeded(today));
    let sender = Arc::new(RecordingSender::new(config.notifier.sender_address.clone()));
    let contract_service = Arc::new(ContractService::new(
        repository,
        sender,
        config.notifier.clone(),
    ));

    let app = with_contract_routes(contract_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "contract control service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
