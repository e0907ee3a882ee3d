//! PostgreSQL store adapter.

use async_trait::async_trait;
use sqlx::PgPool;

use fxrates_types::{
    InstanceRepository, RateRecord, RateStore, RepoError, StoreError, WorkflowId, WorkflowInstance,
};

use crate::classify;
use crate::types::{DbRateRecord, DbWorkflowInstance};

// ─────────────────────────────────────────────────────────────────────────────
// PostgreSQL store
// ─────────────────────────────────────────────────────────────────────────────

/// Postgres-backed store.
pub struct PostgresStore {
    pool: PgPool,
}

/// Executes SQL statements from a migration file, splitting by semicolons.
async fn execute_migration(pool: &PgPool, sql: &str, name: &str) -> Result<(), StoreError> {
    for statement in sql.split(';') {
        let stmt = statement.trim();
        if !stmt.is_empty() {
            sqlx::query(stmt)
                .execute(pool)
                .await
                .map_err(|e| StoreError::Internal(format!("migration {name} failed: {e}")))?;
        }
    }
    Ok(())
}

/// Runs all database migrations.
async fn run_migrations(pool: &PgPool) -> Result<(), StoreError> {
    execute_migration(
        pool,
        include_str!("../migrations/0001_create_rates_pg.sql"),
        "0001",
    )
    .await?;

    execute_migration(
        pool,
        include_str!("../migrations/0002_create_workflow_instances_pg.sql"),
        "0002",
    )
    .await?;

    Ok(())
}

impl PostgresStore {
    /// Connects and runs the schema migrations. Failures are
    /// classified per the store error taxonomy so callers can tell
    /// retryable from fatal.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url).await.map_err(classify)?;
        run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Bootstrap entry point: connect and migrate, surfacing any
    /// failure as a plain error for startup code.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        Ok(Self::connect(database_url).await?)
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Reads a stored rate document back by canonical id.
    pub async fn get_rate(&self, id: &str) -> Result<Option<RateRecord>, StoreError> {
        let row: Option<DbRateRecord> = sqlx::query_as(
            r#"
            SELECT id, from_code, to_code, rate, timestamp
            FROM rates
            WHERE id = $1
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
impl RateStore for PostgresStore {
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
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                rate = EXCLUDED.rate,
                timestamp = EXCLUDED.timestamp
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
impl InstanceRepository for PostgresStore {
    async fn create_instance(&self, instance: &WorkflowInstance) -> Result<(), RepoError> {
        let currencies = serde_json::to_value(&instance.currencies)
            .map_err(|e| RepoError::Serialization(e.to_string()))?;
        let fetched = serde_json::to_value(&instance.fetched)
            .map_err(|e| RepoError::Serialization(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO workflow_instances
                (id, status, failure_reason, last_error, currencies, fetched,
                 connection, stamped_at_ms, persisted, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(instance.id.as_uuid())
        .bind(instance.status.as_str())
        .bind(instance.failure.map(|r| r.as_str()))
        .bind(&instance.last_error)
        .bind(&currencies)
        .bind(&fetched)
        .bind(&instance.connection)
        .bind(instance.stamped_at_ms)
        .bind(instance.persisted as i64)
        .bind(instance.version)
        .bind(instance.created_at)
        .bind(instance.updated_at)
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
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
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
        let currencies = serde_json::to_value(&instance.currencies)
            .map_err(|e| RepoError::Serialization(e.to_string()))?;
        let fetched = serde_json::to_value(&instance.fetched)
            .map_err(|e| RepoError::Serialization(e.to_string()))?;

        let result = sqlx::query(
            r#"
            UPDATE workflow_instances
            SET status = $1, failure_reason = $2, last_error = $3, currencies = $4,
                fetched = $5, connection = $6, stamped_at_ms = $7, persisted = $8,
                version = $9, updated_at = $10
            WHERE id = $11 AND version = $12
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
        .bind(instance.updated_at)
        .bind(instance.id.as_uuid())
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
        let rows: Vec<(uuid::Uuid,)> = sqlx::query_as(
            r#"
            SELECT id
            FROM workflow_instances
            WHERE status NOT IN ('COMPLETED', 'FAILED')
            ORDER BY updated_at ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(id,)| WorkflowId::from_uuid(id))
            .collect())
    }
}
