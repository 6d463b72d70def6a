use crate::cli::ServeArgs;
use crate::infra::{file_snapshot_service, AppState};
use crate::routes::with_feasibility_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use feasibility_engine::cashflow::{FeasibilityService, InMemoryCashflowRepository, ScenarioBuilder};
use feasibility_engine::config::AppConfig;
use feasibility_engine::error::AppError;
use feasibility_engine::telemetry;
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

    let builder = ScenarioBuilder::new(config.engine.build_settings());
    let cashflow_service = Arc::new(FeasibilityService::new(
        Arc::new(InMemoryCashflowRepository::default()),
        builder.clone(),
    ));
    let snapshot_service = Arc::new(file_snapshot_service(
        &config.snapshots.directory,
        builder,
    )?);

    let app = with_feasibility_routes(cashflow_service, snapshot_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        snapshots = %config.snapshots.directory.display(),
        "feasibility engine ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
