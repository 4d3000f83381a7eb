use crate::cli::ServeArgs;
use crate::infra::{AppState, PlannerBackend};
use crate::routes::with_planner_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use degree_planner::config::AppConfig;
use degree_planner::error::AppError;
use degree_planner::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
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

    let backend = PlannerBackend::load(&args.catalog, &config.planner)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        records: backend.records.clone(),
    };

    let planner_service = Arc::new(backend.service(&config.planner));
    info!(
        max_prerequisite_depth = planner_service.max_prerequisite_depth(),
        "planner service configured"
    );

    let app = with_planner_routes(planner_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "degree planner ready");

    axum::serve(listener, app).await?;
    Ok(())
}
