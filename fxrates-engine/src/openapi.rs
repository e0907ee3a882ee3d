//! OpenAPI specification and documentation.

#![allow(dead_code)] // Path functions are only used by utoipa for documentation generation

use fxrates_types::domain::{CurrencyCode, FailureReason, WorkflowId, WorkflowStatus};
use fxrates_types::dto::{StartWorkflowRequest, StartWorkflowResponse, WorkflowStatusResponse};
use utoipa::OpenApi;

// Dummy functions to generate path documentation
// These are not the actual handlers, just for OpenAPI path generation

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = inline(serde_json::Value), example = json!({"status": "healthy"}))
    )
)]
async fn health() {}

/// Start a rate workflow
#[utoipa::path(
    post,
    path = "/api/workflows",
    tag = "workflows",
    request_body = StartWorkflowRequest,
    responses(
        (status = 202, description = "Workflow accepted; poll the status URL for progress", body = StartWorkflowResponse),
        (status = 400, description = "Unknown currency code or empty currency list")
    )
)]
async fn start_workflow() {}

/// Get workflow instance status
#[utoipa::path(
    get,
    path = "/api/workflows/{id}",
    tag = "workflows",
    params(
        ("id" = WorkflowId, Path, description = "Workflow instance ID (UUID)")
    ),
    responses(
        (status = 200, description = "Current instance state", body = WorkflowStatusResponse),
        (status = 400, description = "Malformed workflow ID"),
        (status = 404, description = "Workflow instance not found")
    )
)]
async fn get_workflow() {}

/// OpenAPI documentation for the FX Rates Workflow API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "FX Rates Workflow Service API",
        version = "1.0.0",
        description = "Durable workflow service that fetches FX rates for a set of currencies and persists every unique pairwise rate.\n\nStarting a workflow returns `202 Accepted` immediately; the instance is then advanced step by step in the background. Poll the returned status URL to observe progress and the terminal outcome.",
        license(name = "MIT"),
    ),
    paths(health, start_workflow, get_workflow),
    components(
        schemas(
            StartWorkflowRequest,
            StartWorkflowResponse,
            WorkflowStatusResponse,
            WorkflowStatus,
            FailureReason,
            CurrencyCode,
            WorkflowId,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "workflows", description = "Rate workflow lifecycle operations"),
    )
)]
pub struct ApiDoc;
