use crate::infra::{AppState, ConfigSettings, InMemoryShiftStore};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use crewline::error::AppError;
use crewline::workflows::requests::{
    request_router, AuditSink, BalanceStore, RequestLifecycleService, RequestStore, ShiftStore,
};
use crewline::workflows::roster::{ImportSummary, RosterCsvImporter};
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;

pub(crate) fn with_request_routes<R, S, B, A>(
    service: Arc<RequestLifecycleService<R, S, B, A>>,
    settings: Arc<ConfigSettings>,
) -> axum::Router
where
    R: RequestStore + 'static,
    S: ShiftStore + 'static,
    B: BalanceStore + 'static,
    A: AuditSink + 'static,
{
    request_router(service, settings)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/roster/import",
            axum::routing::post(roster_import_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Accepts a raw CSV body and upserts it into the shift store with merge
/// semantics (blank shift cells leave the roster untouched).
pub(crate) async fn roster_import_endpoint(
    Extension(shifts): Extension<Arc<InMemoryShiftStore>>,
    body: String,
) -> Result<Json<ImportSummary>, AppError> {
    let reader = Cursor::new(body.into_bytes());
    let summary = RosterCsvImporter::from_reader(reader, shifts.as_ref())?;
    Ok(Json(summary))
}
