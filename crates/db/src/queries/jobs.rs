// crates/db/src/queries/jobs.rs
// Job store: create, atomic claim, terminal writers, point lookup.

use super::row_types::{format_created_at, JobRow, JOB_COLUMNS};
use crate::{Database, DbResult};
use chrono::Utc;
use dah_core::{Job, JobCounts, JobId, JobStatus};
use uuid::Uuid;

impl Database {
    /// Insert a new job in `queued` state. Returns the new job ID.
    ///
    /// No validation happens here; callers reject bad input before it
    /// reaches the queue.
    pub async fn create_job(
        &self,
        space_id: Option<Uuid>,
        selected_page_ids: &[Uuid],
        message: &str,
    ) -> DbResult<JobId> {
        let id = Uuid::new_v4();
        let pages = serde_json::to_string(selected_page_ids)?;
        let created_at = format_created_at(Utc::now());

        sqlx::query(
            r#"
            INSERT INTO dah_jobs (id, status, space_id, selected_page_ids, message, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(id.to_string())
        .bind(JobStatus::Queued.as_str())
        .bind(space_id.map(|s| s.to_string()))
        .bind(&pages)
        .bind(message)
        .bind(&created_at)
        .execute(self.pool())
        .await?;

        tracing::debug!(job_id = %id, pages = selected_page_ids.len(), "job created");
        Ok(id)
    }

    /// Atomically move the oldest job in `from` to `to` and return it.
    ///
    /// Oldest means smallest `created_at`, ties broken by insertion order.
    /// The select and the update are one statement inside one transaction;
    /// SQLite holds the write lock for the whole statement, so two claimers
    /// can never receive the same row. Returns `None` when nothing is
    /// eligible.
    ///
    /// There is no lease: a job left `running` by a worker that died is
    /// never handed out again.
    pub async fn claim_next_job(&self, from: JobStatus, to: JobStatus) -> DbResult<Option<Job>> {
        let sql = format!(
            r#"
            UPDATE dah_jobs SET status = ?2
            WHERE seq = (
                SELECT seq FROM dah_jobs
                WHERE status = ?1
                ORDER BY created_at ASC, seq ASC
                LIMIT 1
            )
            AND status = ?1
            RETURNING {JOB_COLUMNS}
            "#
        );

        let mut tx = self.pool().begin().await?;
        let row: Option<JobRow> = sqlx::query_as(&sql)
            .bind(from.as_str())
            .bind(to.as_str())
            .fetch_optional(&mut *tx)
            .await?;
        tx.commit().await?;

        row.map(JobRow::into_job).transpose()
    }

    /// Mark a job `done` with its answer. Clears any error text.
    ///
    /// Terminal rows are left alone (logged, not an error).
    pub async fn set_job_done(&self, id: JobId, final_text: &str) -> DbResult<()> {
        let mut tx = self.pool().begin().await?;
        let result = sqlx::query(
            r#"
            UPDATE dah_jobs SET
                status = ?2,
                final_text = ?3,
                error_text = NULL
            WHERE id = ?1 AND status IN (?4, ?5)
            "#,
        )
        .bind(id.to_string())
        .bind(JobStatus::Done.as_str())
        .bind(final_text)
        .bind(JobStatus::Queued.as_str())
        .bind(JobStatus::Running.as_str())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        if result.rows_affected() == 0 {
            tracing::warn!(job_id = %id, "set_job_done matched no open job");
        }
        Ok(())
    }

    /// Mark a job `failed` with a diagnostic. `final_text` is left untouched.
    ///
    /// Terminal rows are left alone (logged, not an error).
    pub async fn set_job_failed(&self, id: JobId, error_text: &str) -> DbResult<()> {
        let mut tx = self.pool().begin().await?;
        let result = sqlx::query(
            r#"
            UPDATE dah_jobs SET
                status = ?2,
                error_text = ?3
            WHERE id = ?1 AND status IN (?4, ?5)
            "#,
        )
        .bind(id.to_string())
        .bind(JobStatus::Failed.as_str())
        .bind(error_text)
        .bind(JobStatus::Queued.as_str())
        .bind(JobStatus::Running.as_str())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        if result.rows_affected() == 0 {
            tracing::warn!(job_id = %id, "set_job_failed matched no open job");
        }
        Ok(())
    }

    /// Read-only point lookup.
    pub async fn get_job(&self, id: JobId) -> DbResult<Option<Job>> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM dah_jobs WHERE id = ?1 LIMIT 1");
        let row: Option<JobRow> = sqlx::query_as(&sql)
            .bind(id.to_string())
            .fetch_optional(self.pool())
            .await?;
        row.map(JobRow::into_job).transpose()
    }

    /// Number of jobs in each status.
    pub async fn count_jobs_by_status(&self) -> DbResult<JobCounts> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM dah_jobs GROUP BY status")
                .fetch_all(self.pool())
                .await?;

        let mut counts = JobCounts::default();
        for (status, n) in rows {
            match status.parse::<JobStatus>() {
                Ok(status) => counts.add(status, n as u64),
                Err(e) => tracing::warn!(error = %e, "skipping unknown status in counts"),
            }
        }
        Ok(counts)
    }
}
