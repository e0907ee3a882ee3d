//! Durable workflow-instance state.
//!
//! A [`WorkflowInstance`] is the versioned record the engine persists after
//! every completed step. Everything a resumed instance needs is either stored
//! here (fetch results, connection handle, logical timestamp, persist cursor)
//! or deterministically recomputable from the input list (fetch groups, the
//! merged record sequence). No in-memory state survives a suspension.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::currency::CurrencyCode;
use super::pairs::{FetchGroup, plan_fetch_groups};
use super::rate::{RateQuote, RateRecord};
use crate::error::DomainError;

/// Unique identifier for a workflow instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct WorkflowId(Uuid);

impl WorkflowId {
    /// Creates a new random WorkflowId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a WorkflowId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for WorkflowId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for WorkflowId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// The per-instance state machine.
///
/// `Started -> FetchingRates -> ResolvingConnection -> PersistingRates ->
/// Completed`, with `Failed` reachable from any non-terminal state. Each
/// variant names the step currently in progress (or the terminal outcome).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStatus {
    Started,
    FetchingRates,
    ResolvingConnection,
    PersistingRates,
    Completed,
    Failed,
}

impl WorkflowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStatus::Started => "STARTED",
            WorkflowStatus::FetchingRates => "FETCHING_RATES",
            WorkflowStatus::ResolvingConnection => "RESOLVING_CONNECTION",
            WorkflowStatus::PersistingRates => "PERSISTING_RATES",
            WorkflowStatus::Completed => "COMPLETED",
            WorkflowStatus::Failed => "FAILED",
        }
    }

    /// Terminal states accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowStatus::Completed | WorkflowStatus::Failed)
    }

    /// Whether the machine may move from `self` to `next`.
    pub fn can_transition_to(&self, next: WorkflowStatus) -> bool {
        use WorkflowStatus::*;
        matches!(
            (self, next),
            (Started, FetchingRates)
                | (FetchingRates, ResolvingConnection)
                | (ResolvingConnection, PersistingRates)
                | (PersistingRates, Completed)
        ) || (!self.is_terminal() && next == Failed)
    }
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WorkflowStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STARTED" => Ok(WorkflowStatus::Started),
            "FETCHING_RATES" => Ok(WorkflowStatus::FetchingRates),
            "RESOLVING_CONNECTION" => Ok(WorkflowStatus::ResolvingConnection),
            "PERSISTING_RATES" => Ok(WorkflowStatus::PersistingRates),
            "COMPLETED" => Ok(WorkflowStatus::Completed),
            "FAILED" => Ok(WorkflowStatus::Failed),
            other => Err(format!("unknown workflow status: {other}")),
        }
    }
}

/// Why a workflow instance failed. Every fatal path is classified; callers
/// never see an unexplained crash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureReason {
    /// At least one fetch group was planned but no rate came back from any.
    NoRatesFetched,
    /// A named secret could not be resolved.
    SecretResolution,
    /// The rate store rejected a record or connection fatally.
    Storage,
    /// An engine invariant broke (for example a panicked fetch task).
    Internal,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::NoRatesFetched => "NO_RATES_FETCHED",
            FailureReason::SecretResolution => "SECRET_RESOLUTION",
            FailureReason::Storage => "STORAGE",
            FailureReason::Internal => "INTERNAL",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FailureReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NO_RATES_FETCHED" => Ok(FailureReason::NoRatesFetched),
            "SECRET_RESOLUTION" => Ok(FailureReason::SecretResolution),
            "STORAGE" => Ok(FailureReason::Storage),
            "INTERNAL" => Ok(FailureReason::Internal),
            other => Err(format!("unknown failure reason: {other}")),
        }
    }
}

/// The durable record for one workflow execution.
///
/// Owned entirely by the engine: it loads the record, performs one step's
/// work, and saves the record under a compare-and-swap on `version`. A base
/// currency present in `fetched` counts as fetched even when its quote list
/// is empty (a tolerated provider outage).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowInstance {
    pub id: WorkflowId,
    pub status: WorkflowStatus,
    pub failure: Option<FailureReason>,
    /// Human-readable detail for the failure, when failed.
    pub last_error: Option<String>,
    /// Validated input, first-appearance order. Immutable after creation.
    pub currencies: Vec<CurrencyCode>,
    /// Completed fetch groups keyed by base currency.
    pub fetched: BTreeMap<CurrencyCode, Vec<RateQuote>>,
    /// Store connection handle, resolved at most once per instance.
    pub connection: Option<String>,
    /// Logical clock frozen when the instance enters the persist phase;
    /// stamped onto every record it writes.
    pub stamped_at_ms: Option<i64>,
    /// How many merged records have been durably upserted (the persist cursor).
    pub persisted: usize,
    /// Monotonic save counter; guards concurrent workers via CAS updates.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowInstance {
    /// Creates a fresh instance in `Started`, deduplicating the input while
    /// preserving first appearance.
    pub fn new(currencies: Vec<CurrencyCode>) -> Self {
        let mut distinct = Vec::with_capacity(currencies.len());
        for code in currencies {
            if !distinct.contains(&code) {
                distinct.push(code);
            }
        }
        let now = Utc::now();
        Self {
            id: WorkflowId::new(),
            status: WorkflowStatus::Started,
            failure: None,
            last_error: None,
            currencies: distinct,
            fetched: BTreeMap::new(),
            connection: None,
            stamped_at_ms: None,
            persisted: 0,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Moves the machine to `next`, rejecting illegal transitions.
    pub fn transition_to(&mut self, next: WorkflowStatus) -> Result<(), DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Terminates the instance with a classified failure.
    pub fn fail(&mut self, reason: FailureReason, detail: impl Into<String>) {
        self.status = WorkflowStatus::Failed;
        self.failure = Some(reason);
        self.last_error = Some(detail.into());
    }

    /// The fetch plan, recomputed deterministically from the input list.
    pub fn fetch_groups(&self) -> Vec<FetchGroup> {
        plan_fetch_groups(&self.currencies)
    }

    /// Groups whose result is not yet durably recorded.
    pub fn pending_groups(&self) -> Vec<FetchGroup> {
        self.fetch_groups()
            .into_iter()
            .filter(|group| !self.fetched.contains_key(&group.base))
            .collect()
    }

    pub fn all_groups_fetched(&self) -> bool {
        self.pending_groups().is_empty()
    }

    /// Records one completed fetch group. An empty quote list still marks the
    /// group as done.
    pub fn record_group(&mut self, base: CurrencyCode, quotes: Vec<RateQuote>) {
        self.fetched.insert(base, quotes);
    }

    /// Merges every group's quotes into one ordered sequence: groups in plan
    /// order, quotes in recorded order, deduplicated by canonical pair id.
    /// Deterministic for a given durable record, which is what makes the
    /// persist cursor a sufficient resume point.
    pub fn merged_quotes(&self) -> Vec<RateQuote> {
        let mut seen = std::collections::BTreeSet::new();
        let mut quotes = Vec::new();
        for group in self.fetch_groups() {
            if let Some(group_quotes) = self.fetched.get(&group.base) {
                for quote in group_quotes {
                    if quote.base == quote.target {
                        continue;
                    }
                    if seen.insert(RateRecord::canonical_id(quote.base, quote.target)) {
                        quotes.push(*quote);
                    }
                }
            }
        }
        quotes
    }

    /// The full normalized record sequence for the persist phase. Empty until
    /// the logical timestamp has been stamped.
    pub fn rate_records(&self) -> Vec<RateRecord> {
        let Some(stamp) = self.stamped_at_ms else {
            return Vec::new();
        };
        self.merged_quotes()
            .iter()
            .map(|quote| RateRecord::from_quote(quote, stamp))
            .collect()
    }
}
