use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{Actor, RequestAction, RequestId, RequestStatus};
use super::repository::{
    AuditSink, BalanceStore, RequestStore, SettingsProvider, ShiftStore, StoreError,
};
use super::service::{EngineError, LeaveSubmission, RequestLifecycleService, SwapSubmission};

/// Shared router state: the service facade plus the per-decision settings
/// source.
pub struct RequestRoutes<R, S, B, A, P> {
    service: Arc<RequestLifecycleService<R, S, B, A>>,
    settings: Arc<P>,
}

impl<R, S, B, A, P> Clone for RequestRoutes<R, S, B, A, P> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            settings: self.settings.clone(),
        }
    }
}

/// Router builder exposing HTTP endpoints for request intake and the
/// approval chain.
pub fn request_router<R, S, B, A, P>(
    service: Arc<RequestLifecycleService<R, S, B, A>>,
    settings: Arc<P>,
) -> Router
where
    R: RequestStore + 'static,
    S: ShiftStore + 'static,
    B: BalanceStore + 'static,
    A: AuditSink + 'static,
    P: SettingsProvider + 'static,
{
    Router::new()
        .route(
            "/api/v1/requests/leave",
            post(create_leave_handler::<R, S, B, A, P>),
        )
        .route(
            "/api/v1/requests/swap",
            post(create_swap_handler::<R, S, B, A, P>),
        )
        .route(
            "/api/v1/requests/:request_id",
            get(status_handler::<R, S, B, A, P>),
        )
        .route(
            "/api/v1/requests/:request_id/transition",
            post(transition_handler::<R, S, B, A, P>),
        )
        .with_state(RequestRoutes { service, settings })
}

/// Body of a transition call: the status the caller last saw, the action,
/// and the acting user as resolved by the identity provider.
#[derive(Debug, Deserialize)]
pub struct TransitionBody {
    pub expected_status: RequestStatus,
    pub action: RequestAction,
    pub actor: Actor,
}

pub(crate) async fn create_leave_handler<R, S, B, A, P>(
    State(state): State<RequestRoutes<R, S, B, A, P>>,
    axum::Json(submission): axum::Json<LeaveSubmission>,
) -> Response
where
    R: RequestStore + 'static,
    S: ShiftStore + 'static,
    B: BalanceStore + 'static,
    A: AuditSink + 'static,
    P: SettingsProvider + 'static,
{
    match state.service.create_leave(submission) {
        Ok(record) => (StatusCode::ACCEPTED, axum::Json(record.status_view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn create_swap_handler<R, S, B, A, P>(
    State(state): State<RequestRoutes<R, S, B, A, P>>,
    axum::Json(submission): axum::Json<SwapSubmission>,
) -> Response
where
    R: RequestStore + 'static,
    S: ShiftStore + 'static,
    B: BalanceStore + 'static,
    A: AuditSink + 'static,
    P: SettingsProvider + 'static,
{
    match state.service.create_swap(submission) {
        Ok(record) => (StatusCode::ACCEPTED, axum::Json(record.status_view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn status_handler<R, S, B, A, P>(
    State(state): State<RequestRoutes<R, S, B, A, P>>,
    Path(request_id): Path<String>,
) -> Response
where
    R: RequestStore + 'static,
    S: ShiftStore + 'static,
    B: BalanceStore + 'static,
    A: AuditSink + 'static,
    P: SettingsProvider + 'static,
{
    let id = RequestId(request_id);
    match state.service.get(&id) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn transition_handler<R, S, B, A, P>(
    State(state): State<RequestRoutes<R, S, B, A, P>>,
    Path(request_id): Path<String>,
    axum::Json(body): axum::Json<TransitionBody>,
) -> Response
where
    R: RequestStore + 'static,
    S: ShiftStore + 'static,
    B: BalanceStore + 'static,
    A: AuditSink + 'static,
    P: SettingsProvider + 'static,
{
    let id = RequestId(request_id);
    let settings = state.settings.approval_settings();
    match state
        .service
        .transition(&id, body.expected_status, body.action, &body.actor, settings)
    {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: EngineError) -> Response {
    match &err {
        EngineError::Concurrency { expected, actual } => {
            let payload = json!({
                "error": err.to_string(),
                "expected_status": expected.label(),
                "actual_status": actual.label(),
                "hint": "refresh the request and retry",
            });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        EngineError::Validation(_)
        | EngineError::Transition(_)
        | EngineError::SelfSwap
        | EngineError::ShiftMissing { .. } => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        EngineError::Store(StoreError::NotFound) => {
            let payload = json!({ "error": "request not found" });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        EngineError::Store(StoreError::Conflict) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        EngineError::Exchange(_) | EngineError::Debit(_) | EngineError::Store(_) => {
            let payload = json!({
                "error": err.to_string(),
                "hint": "the approval was not completed",
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
