//! Durable Workflow Engine
//!
//! Orchestrates rate workflow instances through their state machine.
//! The engine holds no instance state in memory between calls: `advance`
//! loads the durable record, performs exactly one step, and saves the
//! record back under a version compare-and-swap. Any worker holding the
//! same capabilities can therefore resume any instance, and a crashed
//! step is simply run again without repeating completed work.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::task::JoinSet;

use fxrates_types::{
    CurrencyCode, FailureReason, FetchError, InstanceRepository, RateFetcher, RateStore,
    RateStoreConnector, SECRET_DB_CONNECTION, SecretStore, StoreError, WorkflowError, WorkflowId,
    WorkflowInstance, WorkflowStatus,
};

/// Workflow engine for the rate pipeline.
///
/// Generic over its four capability ports - every external effect the engine
/// can perform is injected at construction. This enables:
/// - Swapping adapters without code changes
/// - Testing with in-memory fakes
/// - Compile-time checks for port implementation
///
/// The engine never calls into a statically configured collaborator; the rate
/// store in particular is built through the [`RateStoreConnector`] capability
/// from a connection string the instance resolved as a workflow step.
pub struct WorkflowEngine<F, S, C, I>
where
    F: RateFetcher,
    S: SecretStore,
    C: RateStoreConnector,
    I: InstanceRepository,
{
    fetcher: Arc<F>,
    secrets: Arc<S>,
    connector: Arc<C>,
    instances: Arc<I>,
    /// Stores already opened for in-flight instances, keyed by instance id.
    /// The connection string is resolved at most once per instance; this
    /// cache makes repeat persist steps reuse the live handle too.
    connections: DashMap<WorkflowId, Arc<C::Store>>,
}

impl<F, S, C, I> WorkflowEngine<F, S, C, I>
where
    F: RateFetcher,
    S: SecretStore,
    C: RateStoreConnector,
    I: InstanceRepository,
{
    /// Creates a new engine with the given capabilities.
    pub fn new(fetcher: Arc<F>, secrets: Arc<S>, connector: Arc<C>, instances: Arc<I>) -> Self {
        Self {
            fetcher,
            secrets,
            connector,
            instances,
            connections: DashMap::new(),
        }
    }

    /// Returns a reference to the instance repository.
    pub fn instances(&self) -> &I {
        &self.instances
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Instance lifecycle
    // ─────────────────────────────────────────────────────────────────────────────

    /// Creates and durably registers a new workflow instance in `Started`.
    ///
    /// The instance performs no work until a scheduler calls [`advance`]
    /// (or [`run`]) on it.
    ///
    /// [`advance`]: WorkflowEngine::advance
    /// [`run`]: WorkflowEngine::run
    pub async fn start_workflow(
        &self,
        currencies: Vec<CurrencyCode>,
    ) -> Result<WorkflowInstance, WorkflowError> {
        let instance = WorkflowInstance::new(currencies);
        self.instances.create_instance(&instance).await?;
        tracing::info!(
            "Workflow {} started for {} currencies",
            instance.id,
            instance.currencies.len()
        );
        Ok(instance)
    }

    /// Loads the current durable state of an instance.
    pub async fn get_status(&self, id: WorkflowId) -> Result<WorkflowInstance, WorkflowError> {
        self.instances
            .get_instance(id)
            .await?
            .ok_or(WorkflowError::NotFound(id))
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Step execution
    // ─────────────────────────────────────────────────────────────────────────────

    /// Performs exactly one step of the instance's state machine and returns
    /// the status afterwards.
    ///
    /// Safe to call repeatedly and from competing workers: the record is
    /// reloaded on every call and saved under compare-and-swap, so a stale
    /// worker gets [`WorkflowError::Conflict`] instead of clobbering progress.
    /// Calling `advance` on a terminal instance is a no-op.
    pub async fn advance(&self, id: WorkflowId) -> Result<WorkflowStatus, WorkflowError> {
        let mut instance = self.get_status(id).await?;
        if instance.is_terminal() {
            self.connections.remove(&id);
            return Ok(instance.status);
        }

        match instance.status {
            WorkflowStatus::Started => self.begin(&mut instance).await?,
            WorkflowStatus::FetchingRates => self.fetch_step(&mut instance).await?,
            WorkflowStatus::ResolvingConnection => self.resolve_step(&mut instance).await?,
            WorkflowStatus::PersistingRates => self.persist_step(&mut instance).await?,
            // Terminal states returned above.
            WorkflowStatus::Completed | WorkflowStatus::Failed => {}
        }

        if instance.is_terminal() {
            self.connections.remove(&id);
        }
        Ok(instance.status)
    }

    /// Drives an instance until it reaches a terminal state.
    ///
    /// Convenience wrapper over [`advance`](WorkflowEngine::advance); errors
    /// (including transient ones) surface to the caller, which decides the
    /// retry policy.
    pub async fn run(&self, id: WorkflowId) -> Result<WorkflowStatus, WorkflowError> {
        loop {
            let status = self.advance(id).await?;
            if status.is_terminal() {
                return Ok(status);
            }
        }
    }

    /// Saves the instance under compare-and-swap, bumping its version.
    async fn save(&self, instance: &mut WorkflowInstance) -> Result<(), WorkflowError> {
        let expected = instance.version;
        instance.version += 1;
        instance.updated_at = Utc::now();
        self.instances.update_instance(instance, expected).await?;
        Ok(())
    }

    async fn begin(&self, instance: &mut WorkflowInstance) -> Result<(), WorkflowError> {
        instance
            .transition_to(WorkflowStatus::FetchingRates)
            .map_err(|e| WorkflowError::Internal(e.to_string()))?;
        self.save(instance).await
    }

    /// Fetches every pending group concurrently behind a single join barrier.
    ///
    /// Each group's result is recorded durably as it lands, so a crash midway
    /// re-fetches only the groups that never finished. A fatal error in one
    /// group does not cancel its siblings and discards none of their results;
    /// the instance fails only after the barrier.
    async fn fetch_step(&self, instance: &mut WorkflowInstance) -> Result<(), WorkflowError> {
        let pending = instance.pending_groups();
        if !pending.is_empty() {
            tracing::info!(
                "Workflow {}: fetching {} rate groups",
                instance.id,
                pending.len()
            );

            let mut tasks = JoinSet::new();
            for group in pending {
                let fetcher = Arc::clone(&self.fetcher);
                tasks.spawn(async move {
                    let result = fetcher.fetch_rates(&group).await;
                    (group.base, result)
                });
            }

            let mut fatal: Option<(FailureReason, String)> = None;
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((base, Ok(quotes))) => {
                        tracing::info!(
                            "Workflow {}: group {} returned {} quotes",
                            instance.id,
                            base,
                            quotes.len()
                        );
                        instance.record_group(base, quotes);
                        self.save(instance).await?;
                    }
                    Ok((base, Err(e))) => {
                        tracing::warn!("Workflow {}: group {} failed: {}", instance.id, base, e);
                        if fatal.is_none() {
                            let reason = match &e {
                                FetchError::Credential(_) => FailureReason::SecretResolution,
                            };
                            fatal = Some((reason, e.to_string()));
                        }
                    }
                    Err(e) => {
                        tracing::error!(
                            "Workflow {}: fetch task panicked: {}",
                            instance.id,
                            e
                        );
                        if fatal.is_none() {
                            fatal =
                                Some((FailureReason::Internal, format!("fetch task failed: {e}")));
                        }
                    }
                }
            }

            if let Some((reason, detail)) = fatal {
                instance.fail(reason, detail);
                return self.save(instance).await;
            }
        }

        // Planned work that produced nothing at all is a failure; an instance
        // with no pairs to price (a single currency) is simply complete-able.
        if !instance.fetch_groups().is_empty() && instance.merged_quotes().is_empty() {
            instance.fail(
                FailureReason::NoRatesFetched,
                "no rates fetched from any group",
            );
            return self.save(instance).await;
        }

        instance
            .transition_to(WorkflowStatus::ResolvingConnection)
            .map_err(|e| WorkflowError::Internal(e.to_string()))?;
        self.save(instance).await
    }

    /// Resolves the store connection string (at most once per instance) and
    /// freezes the logical timestamp for every record this instance writes.
    async fn resolve_step(&self, instance: &mut WorkflowInstance) -> Result<(), WorkflowError> {
        if instance.connection.is_none() {
            match self.secrets.get_secret(SECRET_DB_CONNECTION).await {
                Ok(connection) => instance.connection = Some(connection),
                Err(e) => {
                    tracing::warn!(
                        "Workflow {}: store connection secret unavailable: {}",
                        instance.id,
                        e
                    );
                    instance.fail(FailureReason::SecretResolution, e.to_string());
                    return self.save(instance).await;
                }
            }
        }

        if instance.stamped_at_ms.is_none() {
            instance.stamped_at_ms = Some(Utc::now().timestamp_millis());
        }

        instance
            .transition_to(WorkflowStatus::PersistingRates)
            .map_err(|e| WorkflowError::Internal(e.to_string()))?;
        self.save(instance).await
    }

    /// Writes the merged record sequence one document at a time, advancing
    /// the durable cursor after every acknowledged upsert.
    ///
    /// Transient store errors leave the instance in `PersistingRates` for the
    /// scheduler to retry; the idempotent upsert makes replaying the current
    /// record harmless. Fatal store errors terminate the instance.
    async fn persist_step(&self, instance: &mut WorkflowInstance) -> Result<(), WorkflowError> {
        let store = match self.store_for(instance).await {
            Ok(store) => store,
            Err(StoreError::Transient(e)) => {
                tracing::warn!(
                    "Workflow {}: store connection failed, will retry: {}",
                    instance.id,
                    e
                );
                return Err(WorkflowError::Transient(e));
            }
            Err(e) => {
                tracing::warn!("Workflow {}: store connection rejected: {}", instance.id, e);
                instance.fail(FailureReason::Storage, e.to_string());
                return self.save(instance).await;
            }
        };

        let records = instance.rate_records();
        while instance.persisted < records.len() {
            let record = &records[instance.persisted];
            match store.upsert_rate(record).await {
                Ok(()) => {
                    instance.persisted += 1;
                    self.save(instance).await?;
                }
                Err(StoreError::Transient(e)) => {
                    tracing::warn!(
                        "Workflow {}: transient store error on {}, will retry: {}",
                        instance.id,
                        record.id,
                        e
                    );
                    return Err(WorkflowError::Transient(e));
                }
                Err(e) => {
                    tracing::warn!(
                        "Workflow {}: store rejected record {}: {}",
                        instance.id,
                        record.id,
                        e
                    );
                    instance.fail(FailureReason::Storage, e.to_string());
                    return self.save(instance).await;
                }
            }
        }

        tracing::info!(
            "Workflow {}: persisted {} rate records",
            instance.id,
            instance.persisted
        );
        instance
            .transition_to(WorkflowStatus::Completed)
            .map_err(|e| WorkflowError::Internal(e.to_string()))?;
        self.save(instance).await
    }

    /// Returns the live store for this instance, connecting on first use.
    async fn store_for(&self, instance: &WorkflowInstance) -> Result<Arc<C::Store>, StoreError> {
        if let Some(store) = self.connections.get(&instance.id) {
            return Ok(Arc::clone(store.value()));
        }

        let connection = instance.connection.as_deref().ok_or_else(|| {
            StoreError::Internal("persist step reached without a resolved connection".into())
        })?;
        let store = Arc::new(self.connector.connect(connection).await?);
        self.connections.insert(instance.id, Arc::clone(&store));
        Ok(store)
    }
}
