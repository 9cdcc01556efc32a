use crate::cli::ServeArgs;
use crate::infra::{
    AppState, ConfigSettings, InMemoryAuditLog, InMemoryBalanceStore, InMemoryRequestStore,
    InMemoryShiftStore,
};
use crate::routes::with_request_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use crewline::config::AppConfig;
use crewline::error::AppError;
use crewline::telemetry;
use crewline::workflows::requests::RequestLifecycleService;
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

    let requests = Arc::new(InMemoryRequestStore::default());
    let shifts = Arc::new(InMemoryShiftStore::default());
    let balances = Arc::new(InMemoryBalanceStore::default());
    let audit = Arc::new(InMemoryAuditLog::default());
    let service = Arc::new(RequestLifecycleService::new(
        requests,
        shifts.clone(),
        balances,
        audit,
    ));
    let settings = Arc::new(ConfigSettings(config.approvals.settings()));

    let app = with_request_routes(service, settings)
        .layer(Extension(app_state))
        .layer(Extension(shifts))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "workforce request engine ready");

    axum::serve(listener, app).await?;
    Ok(())
}
