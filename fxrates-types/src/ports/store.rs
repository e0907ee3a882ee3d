//! Rate document-store ports.

use crate::domain::RateRecord;
use crate::error::StoreError;

/// Port trait for the rate document store.
///
/// `upsert_rate` must be idempotent: writing the same canonical id twice
/// overwrites in place, never accumulates, so the engine is free to replay
/// a persistence step after a crash or a transient error.
#[async_trait::async_trait]
pub trait RateStore: Send + Sync + 'static {
    /// Upserts one normalized record, keyed by its canonical pair id.
    ///
    /// Non-canonical records are rejected with
    /// [`StoreError::MalformedRequest`](crate::error::StoreError::MalformedRequest).
    async fn upsert_rate(&self, record: &RateRecord) -> Result<(), StoreError>;
}

/// Builds a [`RateStore`] from a connection string resolved at workflow
/// runtime.
///
/// The store's connection handle is a workflow-step output (resolved from the
/// secret store once per instance), not bootstrap configuration, so the
/// engine needs a capability for turning the resolved string into a live
/// store rather than a pre-built store.
#[async_trait::async_trait]
pub trait RateStoreConnector: Send + Sync + 'static {
    type Store: RateStore;

    /// Connects to the store addressed by `connection_string`.
    ///
    /// Invalid connection parameters are `MalformedRequest`; an unreachable
    /// store is `Transient`.
    async fn connect(&self, connection_string: &str) -> Result<Self::Store, StoreError>;
}
