//! Background Workflow Runner
//!
//! The external scheduler that drives workflow instances to completion. The
//! engine itself only ever performs one step per call; this runner supplies
//! the repetition, polling the instance repository for non-terminal
//! instances and driving each claimed one in its own task. Retry policy
//! lives here: an instance that hit a transient error stays non-terminal
//! and is simply picked up again on a later poll.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashSet;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

use fxrates_types::{
    InstanceRepository, RateFetcher, RateStoreConnector, SecretStore, WorkflowError, WorkflowId,
    WorkflowStatus,
};

use crate::engine::WorkflowEngine;

/// Tuning for the polling loop.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Delay between repository polls.
    pub poll_interval: Duration,
    /// Maximum instances claimed per poll.
    pub batch_size: i64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            batch_size: 10,
        }
    }
}

pub struct WorkflowRunner<F, S, C, I>
where
    F: RateFetcher,
    S: SecretStore,
    C: RateStoreConnector,
    I: InstanceRepository,
{
    engine: Arc<WorkflowEngine<F, S, C, I>>,
    config: RunnerConfig,
    /// Instances currently being driven by this runner, so a slow instance
    /// is not claimed twice across polls.
    in_flight: Arc<DashSet<WorkflowId>>,
}

impl<F, S, C, I> WorkflowRunner<F, S, C, I>
where
    F: RateFetcher,
    S: SecretStore,
    C: RateStoreConnector,
    I: InstanceRepository,
{
    pub fn new(engine: Arc<WorkflowEngine<F, S, C, I>>) -> Self {
        Self::with_config(engine, RunnerConfig::default())
    }

    pub fn with_config(engine: Arc<WorkflowEngine<F, S, C, I>>, config: RunnerConfig) -> Self {
        Self {
            engine,
            config,
            in_flight: Arc::new(DashSet::new()),
        }
    }

    #[instrument(skip(self))]
    pub async fn run(self) {
        info!(
            "Starting workflow runner (poll every {:?}, batch {})",
            self.config.poll_interval, self.config.batch_size
        );
        loop {
            match self
                .engine
                .instances()
                .list_active_instances(self.config.batch_size)
                .await
            {
                Ok(ids) => {
                    for id in ids {
                        if !self.in_flight.insert(id) {
                            continue;
                        }
                        let engine = Arc::clone(&self.engine);
                        let in_flight = Arc::clone(&self.in_flight);
                        tokio::spawn(async move {
                            drive(engine, id).await;
                            in_flight.remove(&id);
                        });
                    }
                }
                Err(e) => {
                    error!("Failed to list active workflow instances: {}", e);
                }
            }
            sleep(self.config.poll_interval).await;
        }
    }
}

#[instrument(skip(engine, id), fields(workflow_id = %id))]
async fn drive<F, S, C, I>(engine: Arc<WorkflowEngine<F, S, C, I>>, id: WorkflowId)
where
    F: RateFetcher,
    S: SecretStore,
    C: RateStoreConnector,
    I: InstanceRepository,
{
    match engine.run(id).await {
        Ok(WorkflowStatus::Completed) => info!("Workflow {} completed", id),
        Ok(WorkflowStatus::Failed) => warn!("Workflow {} failed", id),
        Ok(status) => debug!("Workflow {} paused in {}", id, status),
        Err(WorkflowError::Conflict) => {
            debug!("Workflow {} was advanced by another worker", id);
        }
        Err(WorkflowError::Transient(e)) => {
            warn!("Workflow {} hit a transient error, will retry: {}", id, e);
        }
        Err(e) => error!("Workflow {} could not be advanced: {}", id, e),
    }
}
