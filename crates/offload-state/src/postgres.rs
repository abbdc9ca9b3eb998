//! Postgres-backed engine state store.
//!
//! Persists the two durable records the engine owns: the singleton
//! job-progress row (`offload_job_state`, constrained to a single row) and
//! the pending set (`offload_pending`, keyed by media id). The host's media
//! metadata store is not modeled here; hosts adapt their own persistence to
//! `MediaStore`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use offload_core::models::{JobState, JobStatus};
use offload_core::OffloadError;

use crate::store::{OffloadStateStore, StateResult};

#[derive(Clone)]
pub struct PgStateStore {
    pool: PgPool,
}

impl PgStateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the engine's tables if they do not exist yet.
    pub async fn ensure_schema(&self) -> StateResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS offload_job_state (
                id SMALLINT PRIMARY KEY DEFAULT 1 CHECK (id = 1),
                status TEXT NOT NULL,
                processed BIGINT NOT NULL DEFAULT 0,
                total BIGINT NOT NULL DEFAULT 0,
                errors BIGINT NOT NULL DEFAULT 0,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS offload_pending (
                media_id UUID PRIMARY KEY,
                deferred_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        tracing::debug!("Offload state schema ensured");
        Ok(())
    }
}

#[async_trait]
impl OffloadStateStore for PgStateStore {
    async fn load_job(&self) -> StateResult<Option<JobState>> {
        let row = sqlx::query(
            "SELECT status, processed, total, errors FROM offload_job_state WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        match row {
            None => Ok(None),
            Some(row) => {
                let status: String = row.try_get("status")?;
                let status = status.parse::<JobStatus>().map_err(|e| {
                    OffloadError::State(format!("Corrupt job status in store: {}", e))
                })?;
                let processed: i64 = row.try_get("processed")?;
                let total: i64 = row.try_get("total")?;
                let errors: i64 = row.try_get("errors")?;
                Ok(Some(JobState {
                    status,
                    processed: processed.max(0) as u64,
                    total: total.max(0) as u64,
                    errors: errors.max(0) as u64,
                }))
            }
        }
    }

    async fn save_job(&self, state: &JobState) -> StateResult<()> {
        sqlx::query(
            r#"
            INSERT INTO offload_job_state (id, status, processed, total, errors, updated_at)
            VALUES (1, $1, $2, $3, $4, now())
            ON CONFLICT (id) DO UPDATE SET
                status = EXCLUDED.status,
                processed = EXCLUDED.processed,
                total = EXCLUDED.total,
                errors = EXCLUDED.errors,
                updated_at = now()
            "#,
        )
        .bind(state.status.to_string())
        .bind(state.processed as i64)
        .bind(state.total as i64)
        .bind(state.errors as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn clear_job(&self) -> StateResult<()> {
        sqlx::query("DELETE FROM offload_job_state WHERE id = 1")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn pending_upsert(&self, id: Uuid, deferred_at: DateTime<Utc>) -> StateResult<()> {
        sqlx::query(
            r#"
            INSERT INTO offload_pending (media_id, deferred_at)
            VALUES ($1, $2)
            ON CONFLICT (media_id) DO UPDATE SET deferred_at = EXCLUDED.deferred_at
            "#,
        )
        .bind(id)
        .bind(deferred_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn pending_get(&self, id: Uuid) -> StateResult<Option<DateTime<Utc>>> {
        let row = sqlx::query("SELECT deferred_at FROM offload_pending WHERE media_id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            None => Ok(None),
            Some(row) => Ok(Some(row.try_get("deferred_at")?)),
        }
    }

    async fn pending_remove(&self, id: Uuid) -> StateResult<bool> {
        let result = sqlx::query("DELETE FROM offload_pending WHERE media_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
