//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use fxrates_types::{
    AppError, InstanceRepository, RateFetcher, RateStoreConnector, SecretStore,
    StartWorkflowRequest, StartWorkflowResponse, WorkflowId, WorkflowStatusResponse,
    normalize_codes,
};

use crate::engine::WorkflowEngine;

/// Application state shared across handlers.
pub struct AppState<F, S, C, I>
where
    F: RateFetcher,
    S: SecretStore,
    C: RateStoreConnector,
    I: InstanceRepository,
{
    pub engine: Arc<WorkflowEngine<F, S, C, I>>,
}

/// Wrapper to implement IntoResponse for AppError (orphan rule workaround).
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = serde_json::json!({
            "error": message,
            "code": status.as_u16()
        });

        (status, Json(body)).into_response()
    }
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// Start a new rate workflow.
///
/// Validates the currency list, registers the instance and returns `202
/// Accepted` immediately; the background runner does the actual work.
#[tracing::instrument(skip(state, req), fields(currencies = ?req.currencies))]
pub async fn start_workflow<F, S, C, I>(
    State(state): State<Arc<AppState<F, S, C, I>>>,
    Json(req): Json<StartWorkflowRequest>,
) -> Result<impl IntoResponse, ApiError>
where
    F: RateFetcher,
    S: SecretStore,
    C: RateStoreConnector,
    I: InstanceRepository,
{
    let currencies = normalize_codes(&req.currencies).map_err(AppError::from)?;
    let instance = state
        .engine
        .start_workflow(currencies)
        .await
        .map_err(AppError::from)?;

    let response = StartWorkflowResponse {
        id: instance.id,
        status: instance.status,
        status_url: format!("/api/workflows/{}", instance.id),
    };
    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// Get the current state of a workflow instance.
#[tracing::instrument(skip(state), fields(workflow_id = %id))]
pub async fn get_workflow<F, S, C, I>(
    State(state): State<Arc<AppState<F, S, C, I>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    F: RateFetcher,
    S: SecretStore,
    C: RateStoreConnector,
    I: InstanceRepository,
{
    let workflow_id: WorkflowId = id
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid workflow ID".into()))?;

    let instance = state
        .engine
        .get_status(workflow_id)
        .await
        .map_err(AppError::from)?;
    Ok(Json(WorkflowStatusResponse::from(&instance)))
}
