//! Data Transfer Objects (DTOs) for requests and responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{CurrencyCode, FailureReason, WorkflowId, WorkflowInstance, WorkflowStatus};

// ─────────────────────────────────────────────────────────────────────────────
// Workflow DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to start a rate workflow for a list of currency codes.
///
/// Codes are normalized (uppercased, deduplicated) and validated against the
/// allow-list before any instance is created.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StartWorkflowRequest {
    #[schema(example = json!(["EUR", "USD", "GBP"]))]
    pub currencies: Vec<String>,
}

/// Response after accepting a workflow start.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StartWorkflowResponse {
    /// Identifier for polling the instance
    pub id: WorkflowId,
    pub status: WorkflowStatus,
    /// Relative URL of the status endpoint for this instance
    #[schema(example = "/api/workflows/7f6b9bc4-7d2e-4f05-9f5e-1df61b2a6a15")]
    pub status_url: String,
}

/// Current state of a workflow instance.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WorkflowStatusResponse {
    pub id: WorkflowId,
    pub status: WorkflowStatus,
    /// Classified reason, present only when the instance failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<FailureReason>,
    /// Human-readable failure detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The validated input, first-appearance order
    pub currencies: Vec<CurrencyCode>,
    /// Unique pair quotes gathered so far
    #[schema(example = 3)]
    pub rates_fetched: usize,
    /// Records already written to the rate store
    #[schema(example = 3)]
    pub rates_persisted: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&WorkflowInstance> for WorkflowStatusResponse {
    fn from(instance: &WorkflowInstance) -> Self {
        Self {
            id: instance.id,
            status: instance.status,
            failure_reason: instance.failure,
            error: instance.last_error.clone(),
            currencies: instance.currencies.clone(),
            rates_fetched: instance.merged_quotes().len(),
            rates_persisted: instance.persisted,
            created_at: instance.created_at,
            updated_at: instance.updated_at,
        }
    }
}
