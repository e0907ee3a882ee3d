//! Workflow-instance repository port.

use crate::domain::{WorkflowId, WorkflowInstance};
use crate::error::RepoError;

/// Port trait for the engine's own durable state.
///
/// This is the substrate that makes the workflow resumable: the engine saves
/// the instance record after every completed step and reloads it on every
/// `advance` call, so any worker can pick an instance up after a crash.
#[async_trait::async_trait]
pub trait InstanceRepository: Send + Sync + 'static {
    // ─────────────────────────────────────────────────────────────────────────────
    // Instance lifecycle
    // ─────────────────────────────────────────────────────────────────────────────

    /// Persists a brand-new instance. The id must be unused.
    async fn create_instance(&self, instance: &WorkflowInstance) -> Result<(), RepoError>;

    /// Loads an instance by id.
    async fn get_instance(&self, id: WorkflowId) -> Result<Option<WorkflowInstance>, RepoError>;

    /// Saves an updated instance, but only if the stored version still equals
    /// `expected_version` (compare-and-swap). A stale writer gets
    /// [`RepoError::Conflict`](crate::error::RepoError::Conflict) and must
    /// abandon its copy of the record.
    async fn update_instance(
        &self,
        instance: &WorkflowInstance,
        expected_version: i64,
    ) -> Result<(), RepoError>;

    // ─────────────────────────────────────────────────────────────────────────────
    // Scheduling
    // ─────────────────────────────────────────────────────────────────────────────

    /// Lists ids of non-terminal instances, oldest update first, for the
    /// runner to claim.
    async fn list_active_instances(&self, limit: i64) -> Result<Vec<WorkflowId>, RepoError>;
}
