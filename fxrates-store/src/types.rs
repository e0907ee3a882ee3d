//! Database row types shared by the store backends.
//!
//! Column representations differ per driver (TEXT identifiers and
//! RFC 3339 strings on SQLite, native UUID/JSONB/TIMESTAMPTZ on
//! Postgres), so the affected fields are feature-gated and
//! `into_domain` hides the difference from callers.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use fxrates_types::{
    CurrencyCode, FailureReason, RateQuote, RateRecord, RepoError, StoreError, WorkflowId,
    WorkflowInstance, WorkflowStatus,
};

#[cfg(feature = "postgres")]
use uuid::Uuid;

// ────────────────────────────── Rates ──────────────────────────────

/// Row shape of the `rates` table; identical on both backends.
#[derive(Debug, Clone, FromRow)]
pub struct DbRateRecord {
    pub id: String,
    pub from_code: String,
    pub to_code: String,
    pub rate: f64,
    pub timestamp: String,
}

impl DbRateRecord {
    pub fn into_domain(self) -> Result<RateRecord, StoreError> {
        let from = self
            .from_code
            .parse::<CurrencyCode>()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        let to = self
            .to_code
            .parse::<CurrencyCode>()
            .map_err(|e| StoreError::Internal(e.to_string()))?;

        Ok(RateRecord {
            id: self.id,
            from,
            to,
            rate: self.rate,
            timestamp: self.timestamp,
        })
    }
}

// ──────────────────────── Workflow instances ────────────────────────

/// Row shape of the `workflow_instances` table.
#[derive(Debug, Clone, FromRow)]
pub struct DbWorkflowInstance {
    #[cfg(all(feature = "sqlite", not(feature = "postgres")))]
    pub id: String,
    #[cfg(feature = "postgres")]
    pub id: Uuid,

    pub status: String,
    pub failure_reason: Option<String>,
    pub last_error: Option<String>,

    #[cfg(all(feature = "sqlite", not(feature = "postgres")))]
    pub currencies: String,
    #[cfg(feature = "postgres")]
    pub currencies: serde_json::Value,

    #[cfg(all(feature = "sqlite", not(feature = "postgres")))]
    pub fetched: String,
    #[cfg(feature = "postgres")]
    pub fetched: serde_json::Value,

    pub connection: Option<String>,
    pub stamped_at_ms: Option<i64>,
    pub persisted: i64,
    pub version: i64,

    #[cfg(all(feature = "sqlite", not(feature = "postgres")))]
    pub created_at: String,
    #[cfg(feature = "postgres")]
    pub created_at: DateTime<Utc>,

    #[cfg(all(feature = "sqlite", not(feature = "postgres")))]
    pub updated_at: String,
    #[cfg(feature = "postgres")]
    pub updated_at: DateTime<Utc>,
}

impl DbWorkflowInstance {
    pub fn into_domain(self) -> Result<WorkflowInstance, RepoError> {
        #[cfg(all(feature = "sqlite", not(feature = "postgres")))]
        let id = WorkflowId::from_uuid(
            uuid::Uuid::parse_str(&self.id).map_err(|e| RepoError::Serialization(e.to_string()))?,
        );
        #[cfg(feature = "postgres")]
        let id = WorkflowId::from_uuid(self.id);

        let status = self
            .status
            .parse::<WorkflowStatus>()
            .map_err(RepoError::Serialization)?;
        let failure = self
            .failure_reason
            .map(|r| r.parse::<FailureReason>())
            .transpose()
            .map_err(RepoError::Serialization)?;

        #[cfg(all(feature = "sqlite", not(feature = "postgres")))]
        let currencies: Vec<CurrencyCode> = serde_json::from_str(&self.currencies)
            .map_err(|e| RepoError::Serialization(e.to_string()))?;
        #[cfg(feature = "postgres")]
        let currencies: Vec<CurrencyCode> = serde_json::from_value(self.currencies)
            .map_err(|e| RepoError::Serialization(e.to_string()))?;

        #[cfg(all(feature = "sqlite", not(feature = "postgres")))]
        let fetched: BTreeMap<CurrencyCode, Vec<RateQuote>> = serde_json::from_str(&self.fetched)
            .map_err(|e| RepoError::Serialization(e.to_string()))?;
        #[cfg(feature = "postgres")]
        let fetched: BTreeMap<CurrencyCode, Vec<RateQuote>> = serde_json::from_value(self.fetched)
            .map_err(|e| RepoError::Serialization(e.to_string()))?;

        #[cfg(all(feature = "sqlite", not(feature = "postgres")))]
        let created_at = parse_timestamp(&self.created_at)?;
        #[cfg(feature = "postgres")]
        let created_at = self.created_at;

        #[cfg(all(feature = "sqlite", not(feature = "postgres")))]
        let updated_at = parse_timestamp(&self.updated_at)?;
        #[cfg(feature = "postgres")]
        let updated_at = self.updated_at;

        Ok(WorkflowInstance {
            id,
            status,
            failure,
            last_error: self.last_error,
            currencies,
            fetched,
            connection: self.connection,
            stamped_at_ms: self.stamped_at_ms,
            persisted: self.persisted as usize,
            version: self.version,
            created_at,
            updated_at,
        })
    }
}

#[cfg(all(feature = "sqlite", not(feature = "postgres")))]
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, RepoError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepoError::Serialization(e.to_string()))
}
