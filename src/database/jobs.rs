//! Typed access to the `jobs` table (spec §4.5).
//!
//! The claim operation is a single atomic `UPDATE ... RETURNING` statement:
//! under SQLite's single-writer WAL discipline this is race-free without an
//! explicit transaction (spec §4.5, §9 "writer-connection funnel
//! semantics").

use chrono::{DateTime, Utc};
use sqlx::{Pool, Row, Sqlite};

use crate::errors::InsertJobError;
use crate::models::{Job, JobStatus};

/// Typed accessor for job rows.
pub struct JobQueue {
    pool: Pool<Sqlite>,
}

fn row_to_job(row: &sqlx::sqlite::SqliteRow) -> Result<Job, sqlx::Error> {
    let status: String = row.try_get("status")?;
    let scheduled_for: String = row.try_get("scheduled_for")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;
    let parse_ts = |s: &str, col: &'static str| -> Result<DateTime<Utc>, sqlx::Error> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: col.into(),
                source: Box::new(e),
            })
    };
    Ok(Job {
        id: row.try_get("id")?,
        job_type: row.try_get("job_type")?,
        payload: row.try_get("payload")?,
        payload_extra: row.try_get("payload_extra")?,
        status: JobStatus::from_str(&status).ok_or_else(|| sqlx::Error::ColumnDecode {
            index: "status".into(),
            source: format!("unknown job status {status}").into(),
        })?,
        attempts: row.try_get("attempts")?,
        max_attempts: row.try_get("max_attempts")?,
        scheduled_for: parse_ts(&scheduled_for, "scheduled_for")?,
        recurrent: row.try_get("recurrent")?,
        interval_secs: row.try_get("interval_secs")?,
        last_error: row.try_get("last_error")?,
        created_at: parse_ts(&created_at, "created_at")?,
        updated_at: parse_ts(&updated_at, "updated_at")?,
    })
}

/// Fields needed to enqueue a new job. `scheduled_for` defaults to "now"
/// at the call site; callers needing a future schedule set it explicitly.
pub struct NewJob<'a> {
    /// Handler dispatch tag.
    pub job_type: &'a str,
    /// Fingerprint-contributing payload.
    pub payload: &'a [u8],
    /// Non-fingerprint payload (spec §4.4 "split payload" rationale).
    pub payload_extra: &'a [u8],
    /// Attempts after which the job is terminally failed.
    pub max_attempts: i64,
    /// Earliest claimable time.
    pub scheduled_for: DateTime<Utc>,
}

impl JobQueue {
    pub(crate) const fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Inserts a new pending job.
    ///
    /// # Errors
    /// Returns [`InsertJobError::ConstraintUnique`] when `(job_type,
    /// payload)` already exists (the cooldown-bucket dedup mechanism,
    /// spec §4.5), or [`InsertJobError::Other`] for any other failure.
    pub async fn insert(&self, job: NewJob<'_>) -> Result<i64, InsertJobError> {
        let now = Utc::now();
        let result = sqlx::query(
            r"
            INSERT INTO jobs (job_type, payload, payload_extra, status, attempts, max_attempts,
                               scheduled_for, recurrent, interval_secs, created_at, updated_at)
            VALUES (?, ?, ?, 'pending', 0, ?, ?, 0, NULL, ?, ?)
            ",
        )
        .bind(job.job_type)
        .bind(job.payload)
        .bind(job.payload_extra)
        .bind(job.max_attempts)
        .bind(job.scheduled_for.to_rfc3339())
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(res) => Ok(res.last_insert_rowid()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(InsertJobError::ConstraintUnique)
            }
            Err(_) => Err(InsertJobError::Other),
        }
    }

    /// Atomically claims up to `limit` pending/failed jobs whose attempts
    /// remain below `max_attempts` and whose `scheduled_for` has passed,
    /// oldest first, marking them `processing` in the same statement.
    ///
    /// # Errors
    /// Returns [`sqlx::Error`] on a database failure.
    pub async fn claim(&self, limit: i64) -> Result<Vec<Job>, sqlx::Error> {
        let now = Utc::now().to_rfc3339();
        let rows = sqlx::query(
            r"
            UPDATE jobs
            SET status = 'processing', updated_at = ?
            WHERE id IN (
                SELECT id FROM jobs
                WHERE status IN ('pending', 'failed')
                  AND attempts < max_attempts
                  AND scheduled_for <= ?
                ORDER BY created_at, id
                LIMIT ?
            )
            RETURNING *
            ",
        )
        .bind(&now)
        .bind(&now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_job).collect()
    }

    /// Marks a job terminally completed.
    ///
    /// # Errors
    /// Returns [`sqlx::Error`] on a database failure.
    pub async fn mark_completed(&self, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE jobs SET status = 'completed', updated_at = ? WHERE id = ?")
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Records a failed attempt, incrementing `attempts` and storing
    /// `err` (truncated) for operator visibility. The row remains
    /// retryable until `attempts >= max_attempts`.
    ///
    /// # Errors
    /// Returns [`sqlx::Error`] on a database failure.
    pub async fn mark_failed(&self, id: i64, err: &str) -> Result<(), sqlx::Error> {
        const MAX_ERROR_LEN: usize = 2000;
        let truncated: String = err.chars().take(MAX_ERROR_LEN).collect();
        sqlx::query(
            r"
            UPDATE jobs
            SET status = 'failed', attempts = attempts + 1, last_error = ?, updated_at = ?
            WHERE id = ?
            ",
        )
        .bind(truncated)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Marks a job terminally failed in one step, setting `attempts =
    /// max_attempts` directly. Used when the executor has no handler
    /// registered for a job's type (spec §4.6: a fatal error "causes the
    /// scheduler to mark the job failed with max-attempts to prevent
    /// infinite redispatch"), as opposed to [`Self::mark_failed`]'s
    /// one-attempt-at-a-time retry bookkeeping.
    ///
    /// # Errors
    /// Returns [`sqlx::Error`] on a database failure.
    pub async fn mark_fatal(&self, id: i64, err: &str) -> Result<(), sqlx::Error> {
        const MAX_ERROR_LEN: usize = 2000;
        let truncated: String = err.chars().take(MAX_ERROR_LEN).collect();
        sqlx::query(
            r"
            UPDATE jobs
            SET status = 'failed', attempts = max_attempts, last_error = ?, updated_at = ?
            WHERE id = ?
            ",
        )
        .bind(truncated)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Completes `id` and inserts its next occurrence in the same writer
    /// turn (spec §4.5 `MarkRecurrentCompleted`).
    ///
    /// # Errors
    /// Returns [`sqlx::Error`] on a database failure.
    pub async fn mark_recurrent_completed(
        &self,
        id: i64,
        next_run: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        let row = sqlx::query("SELECT * FROM jobs WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        let job = row_to_job(&row)?;

        self.mark_completed(id).await?;

        let now = Utc::now();
        sqlx::query(
            r"
            INSERT INTO jobs (job_type, payload, payload_extra, status, attempts, max_attempts,
                               scheduled_for, recurrent, interval_secs, created_at, updated_at)
            VALUES (?, ?, ?, 'pending', 0, ?, ?, 1, ?, ?, ?)
            ",
        )
        .bind(&job.job_type)
        .bind(&job.payload)
        .bind(&job.payload_extra)
        .bind(job.max_attempts)
        .bind(next_run.to_rfc3339())
        .bind(job.interval_secs)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> Pool<Sqlite> {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .expect("in-memory pool");
        sqlx::query(
            r"
            CREATE TABLE jobs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                job_type TEXT NOT NULL,
                payload BLOB NOT NULL,
                payload_extra BLOB NOT NULL DEFAULT x'',
                status TEXT NOT NULL DEFAULT 'pending',
                attempts INTEGER NOT NULL DEFAULT 0,
                max_attempts INTEGER NOT NULL,
                scheduled_for TEXT NOT NULL,
                recurrent BOOLEAN NOT NULL DEFAULT 0,
                interval_secs INTEGER,
                last_error TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(job_type, payload)
            )
            ",
        )
        .execute(&pool)
        .await
        .expect("create jobs table");
        pool
    }

    #[tokio::test]
    async fn duplicate_fingerprint_rejected() {
        let queue = JobQueue::new(test_db().await);
        let now = Utc::now();
        let new_job = NewJob {
            job_type: "email_verification",
            payload: b"a@b.co:1",
            payload_extra: b"",
            max_attempts: 3,
            scheduled_for: now,
        };
        assert!(queue.insert(new_job).await.is_ok());
        let dup = NewJob {
            job_type: "email_verification",
            payload: b"a@b.co:1",
            payload_extra: b"",
            max_attempts: 3,
            scheduled_for: now,
        };
        assert_eq!(queue.insert(dup).await, Err(InsertJobError::ConstraintUnique));
    }

    #[tokio::test]
    async fn claim_is_exclusive_until_terminal() {
        let queue = JobQueue::new(test_db().await);
        queue
            .insert(NewJob {
                job_type: "email_verification",
                payload: b"a@b.co:1",
                payload_extra: b"",
                max_attempts: 3,
                scheduled_for: Utc::now(),
            })
            .await
            .expect("insert");

        let claimed = queue.claim(10).await.expect("claim");
        assert_eq!(claimed.len(), 1);
        assert_eq!(claimed[0].status, JobStatus::Processing);

        let claimed_again = queue.claim(10).await.expect("claim again");
        assert!(claimed_again.is_empty());
    }

    #[tokio::test]
    async fn exhausted_attempts_stop_being_claimable() {
        let queue = JobQueue::new(test_db().await);
        let id = queue
            .insert(NewJob {
                job_type: "email_verification",
                payload: b"a@b.co:1",
                payload_extra: b"",
                max_attempts: 3,
                scheduled_for: Utc::now(),
            })
            .await
            .expect("insert");

        for _ in 0..3 {
            let claimed = queue.claim(10).await.expect("claim");
            assert_eq!(claimed.len(), 1);
            queue.mark_failed(id, "boom").await.expect("mark failed");
        }

        let claimed = queue.claim(10).await.expect("final claim");
        assert!(claimed.is_empty());
    }
}
