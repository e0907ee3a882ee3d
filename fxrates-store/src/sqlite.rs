//! SQLite store adapter.
//!
//! Backs both the rate-document store and the workflow-instance
//! repository with a single pool. Intended for local development and
//! tests; the Postgres adapter is the production path.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use fxrates_types::{
    InstanceRepository, RateRecord, RateStore, RepoError, StoreError, WorkflowId, WorkflowInstance,
};

use crate::classify;
use crate::types::{DbRateRecord, DbWorkflowInstance};

/// SQLite-backed store.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connects, creating the database file if needed, and runs the
    /// schema migrations. Failures are classified per the store error
    /// taxonomy so callers can tell retryable from fatal.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        // `sqlite://path/to.db` needs the parent directory to exist
        // before create_if_missing can create the file.
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        StoreError::Transient(format!("create database directory: {e}"))
                    })?;
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| StoreError::MalformedRequest(format!("invalid connection string: {e}")))?
            .create_if_missing(true);

        // An in-memory database lives inside its single connection; a
        // wider pool would hand out blank databases.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(classify)?;

        let store = Self { pool };
        store.create_schema().await?;
        Ok(store)
    }

    /// Bootstrap entry point: connect and migrate, surfacing any
    /// failure as a plain error for startup code.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        Ok(Self::connect(database_url).await?)
    }

    /// Access the underlying pool (mainly for tests).
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn create_schema(&self) -> Result<(), StoreError> {
        let rates_ddl = include_str!("../migrations/0001_create_rates.sql");
        sqlx::query(rates_ddl)
            .execute(&self.pool)
            .await
            .map_err(classify)?;

        let instances_ddl = include_str!("../migrations/0002_create_workflow_instances.sql");
        sqlx::query(instances_ddl)
            .execute(&self.pool)
            .await
            .map_err(classify)?;

        tracing::debug!("sqlite schema ready");
        Ok(())
    }

    /// Reads a stored rate document back by canonical id.
    pub async fn get_rate(&self, id: &str) -> Result<Option<RateRecord>, StoreError> {
        let row: Option<DbRateRecord> = sqlx::query_as(
            r#"
            SELECT id, from_code, to_code, rate, timestamp
            FROM rates
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?;

        row.map(DbRateRecord::into_domain).transpose()
    }

    /// Number of stored rate documents.
    pub async fn count_rates(&self) -> Result<i64, StoreError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM rates")
            .fetch_one(&self.pool)
            .await
            .map_err(classify)?;
        Ok(count)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// RateStore
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl RateStore for SqliteStore {
    async fn upsert_rate(&self, record: &RateRecord) -> Result<(), StoreError> {
        if !record.is_canonical() {
            return Err(StoreError::MalformedRequest(format!(
                "record {} is not canonical ({} -> {})",
                record.id, record.from, record.to
            )));
        }

        sqlx::query(
            r#"
            INSERT INTO rates (id, from_code, to_code, rate, timestamp)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                rate = excluded.rate,
                timestamp = excluded.timestamp
            "#,
        )
        .bind(&record.id)
        .bind(record.from.as_str())
        .bind(record.to.as_str())
        .bind(record.rate)
        .bind(&record.timestamp)
        .execute(&self.pool)
        .await
        .map_err(classify)?;

        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// InstanceRepository
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl InstanceRepository for SqliteStore {
    async fn create_instance(&self, instance: &WorkflowInstance) -> Result<(), RepoError> {
        let currencies = serde_json::to_string(&instance.currencies)
            .map_err(|e| RepoError::Serialization(e.to_string()))?;
        let fetched = serde_json::to_string(&instance.fetched)
            .map_err(|e| RepoError::Serialization(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO workflow_instances
                (id, status, failure_reason, last_error, currencies, fetched,
                 connection, stamped_at_ms, persisted, version, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(instance.id.to_string())
        .bind(instance.status.as_str())
        .bind(instance.failure.map(|r| r.as_str()))
        .bind(&instance.last_error)
        .bind(&currencies)
        .bind(&fetched)
        .bind(&instance.connection)
        .bind(instance.stamped_at_ms)
        .bind(instance.persisted as i64)
        .bind(instance.version)
        .bind(instance.created_at.to_rfc3339())
        .bind(instance.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.kind() == sqlx::error::ErrorKind::UniqueViolation => {
                RepoError::Conflict
            }
            _ => RepoError::Database(e.to_string()),
        })?;

        Ok(())
    }

    async fn get_instance(&self, id: WorkflowId) -> Result<Option<WorkflowInstance>, RepoError> {
        let row: Option<DbWorkflowInstance> = sqlx::query_as(
            r#"
            SELECT id, status, failure_reason, last_error, currencies, fetched,
                   connection, stamped_at_ms, persisted, version, created_at, updated_at
            FROM workflow_instances
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbWorkflowInstance::into_domain).transpose()
    }

    async fn update_instance(
        &self,
        instance: &WorkflowInstance,
        expected_version: i64,
    ) -> Result<(), RepoError> {
        let currencies = serde_json::to_string(&instance.currencies)
            .map_err(|e| RepoError::Serialization(e.to_string()))?;
        let fetched = serde_json::to_string(&instance.fetched)
            .map_err(|e| RepoError::Serialization(e.to_string()))?;

        let result = sqlx::query(
            r#"
            UPDATE workflow_instances
            SET status = ?, failure_reason = ?, last_error = ?, currencies = ?,
                fetched = ?, connection = ?, stamped_at_ms = ?, persisted = ?,
                version = ?, updated_at = ?
            WHERE id = ? AND version = ?
            "#,
        )
        .bind(instance.status.as_str())
        .bind(instance.failure.map(|r| r.as_str()))
        .bind(&instance.last_error)
        .bind(&currencies)
        .bind(&fetched)
        .bind(&instance.connection)
        .bind(instance.stamped_at_ms)
        .bind(instance.persisted as i64)
        .bind(instance.version)
        .bind(instance.updated_at.to_rfc3339())
        .bind(instance.id.to_string())
        .bind(expected_version)
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        // Zero rows means another worker advanced this instance first.
        if result.rows_affected() == 0 {
            return Err(RepoError::Conflict);
        }

        Ok(())
    }

    async fn list_active_instances(&self, limit: i64) -> Result<Vec<WorkflowId>, RepoError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT id
            FROM workflow_instances
            WHERE status NOT IN ('COMPLETED', 'FAILED')
            ORDER BY updated_at ASC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter()
            .map(|(id,)| {
                id.parse::<WorkflowId>()
                    .map_err(|e| RepoError::Serialization(e.to_string()))
            })
            .collect()
    }
}
