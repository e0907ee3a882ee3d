//! Error types for the FX rates workflow service.

use crate::domain::{WorkflowId, WorkflowStatus};

/// Domain-level errors (validation and business-rule violations).
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    #[error("Currency list must not be empty")]
    EmptyCurrencyList,

    #[error("Invalid workflow transition: {from} -> {to}")]
    InvalidTransition {
        from: WorkflowStatus,
        to: WorkflowStatus,
    },
}

/// Errors resolving named secrets from the credential store.
///
/// Secret-resolution failures are always fatal to the workflow instance that
/// needed the secret; they are never retried by the engine.
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("Secret not found: {0}")]
    NotFound(String),

    #[error("Secret store unavailable: {0}")]
    Unavailable(String),
}

/// Unrecoverable errors from a rate fetch.
///
/// Provider outages and non-success responses are *not* errors at this level:
/// the fetcher absorbs them and reports an empty quote list for the group.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Credential resolution failed: {0}")]
    Credential(#[from] SecretError),
}

/// Errors from the rate document store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The record or connection parameters are invalid. Non-retryable.
    #[error("Malformed store request: {0}")]
    MalformedRequest(String),

    /// Connectivity or throttling trouble. The orchestration layer may retry.
    #[error("Transient store error: {0}")]
    Transient(String),

    /// Anything else. Treated as fatal, like `MalformedRequest`.
    #[error("Store error: {0}")]
    Internal(String),
}

/// Errors from the workflow-instance repository (the engine's own state).
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A compare-and-swap update lost the race against another worker.
    #[error("Instance was modified concurrently")]
    Conflict,
}

/// Errors surfaced by the workflow engine itself.
///
/// Fatal *workflow* outcomes (bad secret, storage failure, nothing fetched)
/// are not represented here - those are recorded on the instance as a
/// `Failed` status with a [`FailureReason`](crate::domain::FailureReason).
/// `WorkflowError` covers only the engine's inability to advance at all.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Workflow instance not found: {0}")]
    NotFound(WorkflowId),

    #[error("Workflow instance was advanced by another worker")]
    Conflict,

    #[error("Transient failure, instance will be retried: {0}")]
    Transient(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RepoError> for WorkflowError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Conflict => WorkflowError::Conflict,
            RepoError::Database(e) => WorkflowError::Transient(e),
            RepoError::Serialization(e) => WorkflowError::Transient(e),
        }
    }
}

/// Application-level errors (for HTTP responses).
///
/// Maps cleanly to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::NotFound(id) => {
                AppError::NotFound(format!("Workflow instance not found: {}", id))
            }
            WorkflowError::Conflict => {
                AppError::Internal("Workflow instance was advanced concurrently".into())
            }
            WorkflowError::Transient(e) => AppError::Internal(e),
            WorkflowError::Internal(e) => AppError::Internal(e),
        }
    }
}
